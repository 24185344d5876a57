use std::sync::Arc;

use service::{storage::InMemoryRecordRepository, vault::VaultService};

pub type Vault = VaultService<InMemoryRecordRepository>;

#[derive(Clone)]
pub struct ServerState {
    pub vault: Arc<Vault>,
}
