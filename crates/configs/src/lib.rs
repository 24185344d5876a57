use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vault: VaultConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Backing file location and the allow-list of record types.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    #[serde(default = "default_file_path")]
    pub file_path: String,
    #[serde(default)]
    pub record_types: Vec<String>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self { file_path: default_file_path(), record_types: Vec::new() }
    }
}

fn default_file_path() -> String { "data/storage.json".to_string() }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// `Ok(None)` only when the file does not exist; unreadable or malformed
/// files are errors.
pub fn load_optional(path: &str) -> Result<Option<AppConfig>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(anyhow!("cannot read config {path}: {e}")),
    };
    let cfg: AppConfig = toml::from_str(&content).map_err(|e| anyhow!("invalid config {path}: {e}"))?;
    Ok(Some(cfg))
}

impl AppConfig {
    /// Config file first; only when it is absent, fall back to process env vars.
    pub fn load_and_validate() -> Result<Self> {
        Self::load_or_env(&config_path(), |key| std::env::var(key).ok())
    }

    pub fn load_or_env<F>(path: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match load_optional(path)? {
            Some(cfg) => cfg,
            None => Self::from_env_with(lookup)?,
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Build a config from `SERVER_HOST`, `SERVER_PORT`, `TOKIO_WORKER_THREADS`,
    /// `VAULT_FILE_PATH` and `VAULT_RECORD_TYPES` (comma separated).
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = AppConfig::default();
        if let Some(host) = lookup("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            cfg.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow!("SERVER_PORT is not a valid port: {e}"))?;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.trim().parse().ok()) {
            cfg.server.worker_threads = Some(w);
        }
        if let Some(path) = lookup("VAULT_FILE_PATH") {
            cfg.vault.file_path = path;
        }
        if let Some(types) = lookup("VAULT_RECORD_TYPES") {
            cfg.vault.record_types = types.split(',').map(str::to_string).collect();
        }
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.vault.normalize_and_validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl VaultConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        if self.file_path.trim().is_empty() {
            return Err(anyhow!("vault.file_path must not be empty"));
        }
        let mut types: Vec<String> = Vec::with_capacity(self.record_types.len());
        for t in self.record_types.iter().map(|t| t.trim()) {
            if !t.is_empty() && !types.iter().any(|seen| seen == t) {
                types.push(t.to_string());
            }
        }
        self.record_types = types;
        Ok(())
    }
}
