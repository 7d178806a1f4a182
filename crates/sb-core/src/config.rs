//! Configuration types and loading

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Working-copy store and its durable mirror
    pub store: StoreConfig,

    /// Object storage for photos and documents
    pub storage: StorageConfig,

    /// Persistence backend
    pub backend: BackendConfig,

    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// File holding the serialized working copy
    pub mirror_path: PathBuf,
    /// When false the store keeps the working copy in memory only
    pub mirror_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Local object storage root
    pub local_path: PathBuf,
    /// Base URL prepended to object keys when building retrieval links
    pub public_base_url: String,
    /// Lifetime of generated retrieval links
    pub url_expiry_seconds: u64,
    /// Maximum accepted photo size in bytes
    pub max_photo_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Directory where the local backend keeps one document per project
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                mirror_path: PathBuf::from(".sitebook/working-copy.json"),
                mirror_enabled: true,
            },
            storage: StorageConfig {
                local_path: PathBuf::from(".sitebook/objects"),
                public_base_url: "/objects".to_string(),
                url_expiry_seconds: 3600, // 1 hour
                max_photo_size: 20 * 1024 * 1024, // 20MB
            },
            backend: BackendConfig {
                data_dir: PathBuf::from(".sitebook/projects"),
            },
            logging: LoggingConfig {
                filter: "info,sb_store=debug,sb_services=debug".to_string(),
                json: false,
            },
        }
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl AppConfig {
    /// Load configuration from `SITEBOOK_*` environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Store
        if let Some(path) = lookup("SITEBOOK_MIRROR_PATH") {
            config.store.mirror_path = PathBuf::from(path);
        }
        if let Some(v) = lookup("SITEBOOK_MIRROR_ENABLED") {
            config.store.mirror_enabled = parse_bool("SITEBOOK_MIRROR_ENABLED", &v)?;
        }

        // Storage
        if let Some(path) = lookup("SITEBOOK_STORAGE_PATH") {
            config.storage.local_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("SITEBOOK_STORAGE_BASE_URL") {
            config.storage.public_base_url = url;
        }
        if let Some(v) = lookup("SITEBOOK_URL_EXPIRY_SECONDS") {
            config.storage.url_expiry_seconds = parse_num("SITEBOOK_URL_EXPIRY_SECONDS", &v)?;
        }
        if let Some(v) = lookup("SITEBOOK_MAX_PHOTO_SIZE") {
            config.storage.max_photo_size = parse_num("SITEBOOK_MAX_PHOTO_SIZE", &v)?;
        }

        // Backend
        if let Some(dir) = lookup("SITEBOOK_DATA_DIR") {
            config.backend.data_dir = PathBuf::from(dir);
        }

        // Logging
        if let Some(filter) = lookup("SITEBOOK_LOG") {
            config.logging.filter = filter;
        }
        if let Some(v) = lookup("SITEBOOK_LOG_JSON") {
            config.logging.json = parse_bool("SITEBOOK_LOG_JSON", &v)?;
        }

        Ok(config)
    }

    pub fn url_expiry(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.storage.url_expiry_seconds)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {:?}", other),
        }),
    }
}

fn parse_num<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
}
