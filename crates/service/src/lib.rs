//! Service layer: the record store and the vault service on top of it.
//! - `repository` defines the store contract (presence-based success/failure).
//! - `storage` holds the in-memory implementation behind a single RwLock.
//! - `vault` sequences validate -> mutate -> persist against the backing JSON file.

pub mod errors;
pub mod repository;
pub mod storage;
pub mod vault;
