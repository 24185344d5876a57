//! Domain types for the vault: the flat record schema, the storage map,
//! and the pure validation rules applied before anything touches the store.

pub mod errors;
pub mod record;
pub mod validation;

pub use record::{Record, Storage};
