use std::path::PathBuf;

use crate::error::ConfigError;
use crate::store::DEFAULT_STORE_DIR;
use crate::transform::BatchPolicy;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 20;

/// Runtime configuration loaded from environment variables.
///
/// Every field has a default suitable for local use; CLI flags override
/// individual values after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Directory of the mapping store.
    pub store_dir: PathBuf,
    /// Policy used when a request does not name one.
    pub batch_policy: BatchPolicy,
    /// Upload body limit in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            batch_policy: BatchPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default              |
    /// |--------------------------|----------------------|
    /// | `SHEETMAP_HOST`          | `0.0.0.0`            |
    /// | `SHEETMAP_PORT`          | `3000`               |
    /// | `SHEETMAP_STORE_DIR`     | `.sheetmap/mappings` |
    /// | `SHEETMAP_BATCH_POLICY`  | `fail-fast`          |
    /// | `SHEETMAP_MAX_UPLOAD_MB` | `20`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("SHEETMAP_HOST").unwrap_or(defaults.host);

        let port = match get("SHEETMAP_PORT") {
            Some(value) => value.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "SHEETMAP_PORT",
                value,
                message: e.to_string(),
            })?,
            None => defaults.port,
        };

        let store_dir = get("SHEETMAP_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_dir);

        let batch_policy = match get("SHEETMAP_BATCH_POLICY") {
            Some(value) => value
                .parse::<BatchPolicy>()
                .map_err(|message| ConfigError::Invalid {
                    var: "SHEETMAP_BATCH_POLICY",
                    value,
                    message,
                })?,
            None => defaults.batch_policy,
        };

        let max_upload_bytes = match get("SHEETMAP_MAX_UPLOAD_MB") {
            Some(value) => match value.parse::<usize>() {
                Ok(mb) if mb > 0 => match mb.checked_mul(1024 * 1024) {
                    Some(bytes) => bytes,
                    None => {
                        return Err(ConfigError::Invalid {
                            var: "SHEETMAP_MAX_UPLOAD_MB",
                            value,
                            message: "too large".to_string(),
                        })
                    }
                },
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        var: "SHEETMAP_MAX_UPLOAD_MB",
                        value,
                        message: "must be at least 1".to_string(),
                    })
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "SHEETMAP_MAX_UPLOAD_MB",
                        value,
                        message: e.to_string(),
                    })
                }
            },
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            host,
            port,
            store_dir,
            batch_policy,
            max_upload_bytes,
        })
    }

    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
