use async_trait::async_trait;
use models::{Record, Storage};

/// Store contract. Mutations report success as `bool` rather than erroring:
/// `insert` needs the key absent, `update`/`delete` need it present, and a
/// `false` result leaves the store untouched.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Replace the whole map. Used at load time.
    async fn set_all(&self, storage: Storage);
    async fn get(&self, name: &str) -> Option<Record>;
    /// Owned copy of the current map, taken under a single read lock.
    async fn get_all(&self) -> Storage;
    async fn insert(&self, name: String, record: Record) -> bool;
    async fn update(&self, name: &str, record: Record) -> bool;
    async fn delete(&self, name: &str) -> bool;
}
