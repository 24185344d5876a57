//! Vault service: validation, store mutation and file durability.

pub mod service;

pub use service::VaultService;
