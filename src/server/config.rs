use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("Unknown storage backend '{0}', expected 'postgres' or 'memory'")]
    InvalidStorage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidStorage(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_port: u16,
    /// Takes precedence over the individual `db_*` settings when present.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub db_connect_retry_interval_secs: u64,
    pub listen_addr: String,
    pub log_dir: String,
    pub storage: StorageBackend,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
pub struct PartialServerConfig {
    db_host: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_name: Option<String>,
    db_port: Option<u16>,
    database_url: Option<String>,
    db_max_connections: Option<u32>,
    db_connect_retries: Option<u32>,
    db_connect_retry_interval_secs: Option<u64>,
    listen_addr: Option<String>,
    log_dir: Option<String>,
    storage: Option<String>,
}

impl PartialServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env::<PartialServerConfig>()?)
    }
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "todos".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_RETRIES: u32 = 10;
const DEFAULT_CONNECT_RETRY_INTERVAL_SECS: u64 = 5;

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config = match config_path {
            Some(path_str) => PartialServerConfig::from_file(Path::new(path_str))?,
            None => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config = PartialServerConfig::from_env()?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    pub fn merge(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, ConfigError> {
        let storage = match env_config.storage.or(file_config.storage) {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Postgres,
        };

        Ok(ServerConfig {
            db_host: env_config
                .db_host
                .or(file_config.db_host)
                .unwrap_or_else(default_db_host),
            db_user: env_config
                .db_user
                .or(file_config.db_user)
                .unwrap_or_else(default_db_user),
            db_password: env_config
                .db_password
                .or(file_config.db_password)
                .unwrap_or_default(),
            db_name: env_config
                .db_name
                .or(file_config.db_name)
                .unwrap_or_else(default_db_name),
            db_port: env_config
                .db_port
                .or(file_config.db_port)
                .unwrap_or(DEFAULT_DB_PORT),
            database_url: env_config.database_url.or(file_config.database_url),
            db_max_connections: env_config
                .db_max_connections
                .or(file_config.db_max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            db_connect_retries: env_config
                .db_connect_retries
                .or(file_config.db_connect_retries)
                .unwrap_or(DEFAULT_CONNECT_RETRIES)
                .max(1),
            db_connect_retry_interval_secs: env_config
                .db_connect_retry_interval_secs
                .or(file_config.db_connect_retry_interval_secs)
                .unwrap_or(DEFAULT_CONNECT_RETRY_INTERVAL_SECS),
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            storage,
        })
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.db_user),
            urlencoding::encode(&self.db_password),
            self.db_host,
            self.db_port,
            self.db_name
        )
    }

    pub fn connect_retry_interval(&self) -> Duration {
        Duration::from_secs(self.db_connect_retry_interval_secs)
    }
}
