use std::path::PathBuf;
use std::sync::Arc;

use models::validation::{validate_name, validate_record, validate_type};
use models::{Record, Storage};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::repository::RecordRepository;

/// Vault operations on top of a record repository.
///
/// Every mutating call runs validate -> mutate -> persist and stops at the
/// first failure. Persisting writes the whole map to `file_path` from a fresh
/// snapshot, after the repository lock has been released. File writes are
/// serialized among themselves and land via temp file + rename, so the file
/// always holds one complete snapshot. A failed write is reported but the
/// in-memory change stays: the file catches up on the next successful persist.
pub struct VaultService<R: RecordRepository> {
    repo: Arc<R>,
    file_path: PathBuf,
    record_types: Vec<String>,
    // held only around file I/O, never together with the repository lock
    write_guard: Mutex<()>,
}

impl<R: RecordRepository> VaultService<R> {
    pub fn new<P: Into<PathBuf>>(repo: Arc<R>, file_path: P, record_types: Vec<String>) -> Self {
        Self { repo, file_path: file_path.into(), record_types, write_guard: Mutex::new(()) }
    }

    /// Configured allow-list of record types.
    pub fn record_types(&self) -> &[String] { &self.record_types }

    async fn read_file(&self) -> Result<Storage, ServiceError> {
        let bytes = fs::read(&self.file_path)
            .await
            .map_err(|e| ServiceError::Read(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Parse(e.to_string()))
    }

    /// Replace the store contents with the backing file. On error the store
    /// is left as it was.
    #[instrument(skip(self), fields(path = %self.file_path.display()))]
    pub async fn load_from_file(&self) -> Result<(), ServiceError> {
        let data = self.read_file().await?;
        let count = data.len();
        self.repo.set_all(data).await;
        info!(records = count, "storage loaded from file");
        Ok(())
    }

    /// Overwrite the backing file with the current snapshot, creating it
    /// (and its directory) when absent.
    ///
    /// The snapshot is taken after acquiring the write guard, so a later
    /// writer never puts an older snapshot on disk than an earlier one.
    #[instrument(skip(self), fields(path = %self.file_path.display()))]
    pub async fn persist_to_file(&self) -> Result<(), ServiceError> {
        let _guard = self.write_guard.lock().await;
        let snapshot = self.repo.get_all().await;
        let data = serde_json::to_vec(&snapshot).map_err(|e| ServiceError::Write(e.to_string()))?;
        if let Some(parent) = self.file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| ServiceError::Write(e.to_string()))?;
        }

        let tmp = self.temp_path();
        if let Err(e) = fs::write(&tmp, data).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::Write(e.to_string()));
        }
        if let Err(e) = fs::rename(&tmp, &self.file_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::Write(e.to_string()));
        }
        debug!(records = snapshot.len(), "storage written to file");
        Ok(())
    }

    // sibling of the target so the rename stays on one filesystem
    fn temp_path(&self) -> PathBuf {
        let name = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "storage".to_string());
        self.file_path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4()))
    }

    pub async fn get_all(&self) -> Storage {
        self.repo.get_all().await
    }

    pub async fn get_by_type(&self, record_type: &str) -> Result<Storage, ServiceError> {
        validate_type(record_type, &self.record_types)?;
        let mut storage = self.repo.get_all().await;
        storage.retain(|_, rec| rec.record_type == record_type);
        Ok(storage)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Record, ServiceError> {
        let key = validate_name(name)?;
        self.repo.get(&key).await.ok_or_else(|| ServiceError::not_found("element"))
    }

    #[instrument(skip(self, record))]
    pub async fn append(&self, name: &str, record: Record) -> Result<(), ServiceError> {
        let key = validate_name(name)?;
        validate_record(&record, &self.record_types)?;

        if !self.repo.insert(key.clone(), record).await {
            info!(%key, "append rejected: element already exists");
            return Err(ServiceError::already_exists("element"));
        }
        self.persist_after("append", &key).await
    }

    #[instrument(skip(self, record))]
    pub async fn update_by_name(&self, name: &str, record: Record) -> Result<(), ServiceError> {
        let key = validate_name(name)?;
        validate_record(&record, &self.record_types)?;

        if !self.repo.update(&key, record).await {
            info!(%key, "update rejected: element not found");
            return Err(ServiceError::not_found("element"));
        }
        self.persist_after("update", &key).await
    }

    #[instrument(skip(self))]
    pub async fn delete_by_name(&self, name: &str) -> Result<(), ServiceError> {
        let key = validate_name(name)?;

        if !self.repo.delete(&key).await {
            info!(%key, "delete rejected: element not found");
            return Err(ServiceError::not_found("element"));
        }
        self.persist_after("delete", &key).await
    }

    // no rollback here: the mutation already landed in memory
    async fn persist_after(&self, op: &'static str, key: &str) -> Result<(), ServiceError> {
        if let Err(e) = self.persist_to_file().await {
            error!(op, %key, error = %e, "mutation applied in memory but file update failed");
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRecordRepository;
    use std::path::Path;

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vault_{}_{}.json", tag, Uuid::new_v4()))
    }

    fn service_at(path: &Path, types: &[&str]) -> VaultService<InMemoryRecordRepository> {
        let repo = Arc::new(InMemoryRecordRepository::new());
        VaultService::new(repo, path, types.iter().map(|t| t.to_string()).collect())
    }

    async fn file_storage(path: &Path) -> anyhow::Result<Storage> {
        let bytes = fs::read(path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn login_scenario_end_to_end() -> anyhow::Result<()> {
        let tmp = temp_file("scenario");
        let svc = service_at(&tmp, &["login"]);

        let short = svc.append("ab", Record::new("login", "x")).await;
        assert!(matches!(short, Err(ServiceError::Validation(_))));
        assert!(svc.get_all().await.is_empty());

        svc.append("github ", Record::new("login", "x")).await?;
        let all = svc.get_all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all["github"].password, "x");

        let dup = svc.append("GitHub", Record::new("login", "y")).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));
        assert_eq!(svc.get_all().await["github"].password, "x");

        let logins = svc.get_by_type("login").await?;
        assert_eq!(logins.len(), 1);
        assert!(logins.contains_key("github"));
        assert!(matches!(svc.get_by_type("email").await, Err(ServiceError::Validation(_))));

        svc.delete_by_name("github").await?;
        assert!(svc.get_all().await.is_empty());
        assert!(file_storage(&tmp).await?.is_empty());

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn each_mutation_rewrites_the_file() -> anyhow::Result<()> {
        let tmp = temp_file("rewrite");
        let svc = service_at(&tmp, &["login", "card"]);

        svc.append("Bank Card", Record::new("card", "1234")).await?;
        assert_eq!(file_storage(&tmp).await?["bank card"].password, "1234");

        let mut changed = Record::new("card", "9999");
        changed.favorite = true;
        svc.update_by_name("BANK CARD", changed.clone()).await?;
        assert_eq!(file_storage(&tmp).await?["bank card"], changed);

        svc.append("mailbox", Record::new("login", "m")).await?;
        assert_eq!(file_storage(&tmp).await?.len(), 2);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejected_mutations_leave_store_and_file_alone() -> anyhow::Result<()> {
        let tmp = temp_file("rejected");
        let svc = service_at(&tmp, &["login"]);
        svc.append("github", Record::new("login", "x")).await?;
        let before = fs::read(&tmp).await?;

        let missing = svc.update_by_name("gitlab", Record::new("login", "y")).await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.delete_by_name("gitlab").await, Err(ServiceError::NotFound(_))));
        let bad_type = svc.update_by_name("github", Record::new("note", "y")).await;
        assert!(matches!(bad_type, Err(ServiceError::Validation(_))));
        let bad_name = svc.delete_by_name("").await;
        assert!(matches!(bad_name, Err(ServiceError::Validation(_))));

        assert_eq!(svc.get_all().await["github"].password, "x");
        assert_eq!(fs::read(&tmp).await?, before);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() -> anyhow::Result<()> {
        let tmp = temp_file("roundtrip");
        let svc = service_at(&tmp, &["login", "card"]);
        svc.append("github", Record::new("login", "a")).await?;
        svc.append("visa card", Record { favorite: true, ..Record::new("card", "b") }).await?;
        svc.persist_to_file().await?;
        let before = svc.get_all().await;

        let fresh = service_at(&tmp, &["login", "card"]);
        fresh.load_from_file().await?;
        assert_eq!(fresh.get_all().await, before);

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn load_reports_read_and_parse_failures() -> anyhow::Result<()> {
        let missing = temp_file("missing");
        let svc = service_at(&missing, &["login"]);
        assert!(matches!(svc.load_from_file().await, Err(ServiceError::Read(_))));

        let garbage = temp_file("garbage");
        fs::write(&garbage, b"{not json").await?;
        let repo = Arc::new(InMemoryRecordRepository::new());
        repo.insert("keepme".into(), Record::new("login", "k")).await;
        let svc = VaultService::new(Arc::clone(&repo), &garbage, vec!["login".into()]);
        assert!(matches!(svc.load_from_file().await, Err(ServiceError::Parse(_))));
        // existing state is untouched by a failed load
        assert_eq!(repo.len().await, 1);

        let _ = fs::remove_file(&garbage).await;
        Ok(())
    }

    #[tokio::test]
    async fn write_failure_keeps_in_memory_mutation() -> anyhow::Result<()> {
        // a directory where the file should be makes every write fail
        let dir = std::env::temp_dir().join(format!("vault_dir_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        let svc = service_at(&dir, &["login"]);

        let res = svc.append("github", Record::new("login", "x")).await;
        assert!(matches!(res, Err(ServiceError::Write(_))));
        assert_eq!(svc.get_all().await["github"].password, "x");

        // the record is there, so a retry is a conflict rather than a second write
        let again = svc.append("github", Record::new("login", "x")).await;
        assert!(matches!(again, Err(ServiceError::Conflict(_))));

        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutations_keep_file_parseable() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("vault_race_{}", Uuid::new_v4()));
        let path = root.join("storage.json");
        let svc = Arc::new(service_at(&path, &["login"]));

        // large records make a torn write easy to produce
        let big = "x".repeat(20_000);
        for i in 0..20 {
            svc.append(&format!("seed{i:02}"), Record::new("login", big.as_str())).await?;
        }

        let mut tasks = Vec::new();
        for i in 0..20 {
            let svc = Arc::clone(&svc);
            let big = big.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    svc.delete_by_name(&format!("seed{i:02}")).await
                } else {
                    svc.append(&format!("fresh{i:02}"), Record::new("login", big)).await
                }
            }));
        }
        for t in tasks {
            t.await??;
        }

        let on_disk = file_storage(&path).await?;
        assert_eq!(on_disk, svc.get_all().await);
        assert_eq!(on_disk.len(), 20);

        // no temp files left next to the target
        let mut entries = fs::read_dir(&root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["storage.json".to_string()]);

        let _ = fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn persist_creates_missing_directory() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("vault_nested_{}", Uuid::new_v4()));
        let path = root.join("a").join("storage.json");
        let svc = service_at(&path, &["login"]);

        svc.persist_to_file().await?;
        assert!(file_storage(&path).await?.is_empty());

        let _ = fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn get_by_type_filters_and_get_by_name_normalizes() -> anyhow::Result<()> {
        let tmp = temp_file("filter");
        let svc = service_at(&tmp, &["login", "card", "note"]);
        svc.append("github", Record::new("login", "a")).await?;
        svc.append("gitlab", Record::new("login", "b")).await?;
        svc.append("visa card", Record::new("card", "c")).await?;

        let logins = svc.get_by_type("login").await?;
        assert_eq!(logins.len(), 2);
        assert!(logins.values().all(|r| r.record_type == "login"));
        assert!(svc.get_by_type("note").await?.is_empty());

        assert_eq!(svc.get_by_name("  GitLab ").await?.password, "b");
        assert!(matches!(svc.get_by_name("bitbucket").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(svc.get_by_name("x").await, Err(ServiceError::Validation(_))));

        let _ = fs::remove_file(&tmp).await;
        Ok(())
    }
}
