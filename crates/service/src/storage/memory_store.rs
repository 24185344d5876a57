use std::collections::hash_map::Entry;

use async_trait::async_trait;
use models::{Record, Storage};
use tokio::sync::RwLock;

use crate::repository::RecordRepository;

/// In-memory record map guarded by one reader/writer lock.
///
/// Reads run concurrently; every write is exclusive. Callers only ever get
/// clones out, so nothing outside sees the map mid-mutation.
#[derive(Default)]
pub struct InMemoryRecordRepository {
    inner: RwLock<Storage>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self { Self::default() }

    pub fn with_storage(storage: Storage) -> Self {
        Self { inner: RwLock::new(storage) }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn set_all(&self, storage: Storage) {
        let mut map = self.inner.write().await;
        *map = storage;
    }

    async fn get(&self, name: &str) -> Option<Record> {
        let map = self.inner.read().await;
        map.get(name).cloned()
    }

    async fn get_all(&self) -> Storage {
        let map = self.inner.read().await;
        map.clone()
    }

    async fn insert(&self, name: String, record: Record) -> bool {
        let mut map = self.inner.write().await;
        match map.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    async fn update(&self, name: &str, record: Record) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(name) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }

    async fn delete(&self, name: &str) -> bool {
        let mut map = self.inner.write().await;
        map.remove(name).is_some()
    }
}
