//! Configuration for the sandbox account pool.
//!
//! Two layers, later wins:
//!
//! 1. `~/.sandpool/config.toml` (or an explicit path), with `${VAR}`
//!    expansion in the database path.
//! 2. Environment overrides: `ACCOUNT_DB`, `LEASE_DB`, `SANDPOOL_DB_PATH`,
//!    `SANDPOOL_SCAN_PAGE_SIZE`, `SANDPOOL_BUSY_TIMEOUT_MS`.
//!
//! The result is plain data injected into `sandpool_db::Db`; nothing below
//! this crate reads the environment.

mod env;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sandpool_db::DbSettings;
use sandpool_store::SqliteOptions;
use serde::Deserialize;
use thiserror::Error;

pub use env::{EnvConfig, EnvSource, ProcessEnv};

pub const ACCOUNT_DB_VAR: &str = "ACCOUNT_DB";
pub const LEASE_DB_VAR: &str = "LEASE_DB";
pub const DB_PATH_VAR: &str = "SANDPOOL_DB_PATH";
pub const SCAN_PAGE_SIZE_VAR: &str = "SANDPOOL_SCAN_PAGE_SIZE";
pub const BUSY_TIMEOUT_VAR: &str = "SANDPOOL_BUSY_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("environment variable {name} is not set")]
    MissingEnvVar { name: String },
    #[error("environment variable {name} must be {expected} (got {value:?})")]
    InvalidEnvVar {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("no home directory; set SANDPOOL_DB_PATH to choose a database path")]
    NoHomeDir,
}

impl ConfigError {
    /// The config file involved, for file errors.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub backend: Option<BackendKind>,
    /// Database file; `${VAR}` references are expanded.
    pub path: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TablesConfig {
    pub accounts: Option<String>,
    pub leases: Option<String>,
    pub scan_page_size: Option<usize>,
}

/// Contents of `config.toml`.
///
/// ```toml
/// [store]
/// backend = "sqlite"
/// path = "${HOME}/pools/dev.db"
/// busy_timeout_ms = 2000
///
/// [tables]
/// accounts = "Accounts"
/// leases = "Leases"
/// scan_page_size = 100
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct PoolConfig {
    pub store: Option<StoreConfig>,
    pub tables: Option<TablesConfig>,
}

/// Where records live once configuration is resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Memory,
    Sqlite { path: PathBuf, options: SqliteOptions },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db: DbSettings,
    pub backend: Backend,
}

impl PoolConfig {
    /// Load the default config file. `Ok(None)` when there is none.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path).map(Some),
            _ => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read config");
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to parse config");
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// Apply environment overrides and defaults.
    pub fn resolve<S: EnvSource>(&self, env: &EnvConfig<S>) -> Result<Settings, ConfigError> {
        let store = self.store.as_ref();
        let tables = self.tables.as_ref();

        let account_table = tables
            .and_then(|t| t.accounts.clone())
            .unwrap_or_else(|| DbSettings::DEFAULT_ACCOUNT_TABLE.to_string());
        let lease_table = tables
            .and_then(|t| t.leases.clone())
            .unwrap_or_else(|| DbSettings::DEFAULT_LEASE_TABLE.to_string());
        let scan_page_size = env_count::<_, usize>(env, SCAN_PAGE_SIZE_VAR)?
            .or_else(|| tables.and_then(|t| t.scan_page_size))
            .unwrap_or(DbSettings::DEFAULT_SCAN_PAGE_SIZE)
            .max(1);

        let db = DbSettings {
            account_table: env.get_env_var(ACCOUNT_DB_VAR, &account_table),
            lease_table: env.get_env_var(LEASE_DB_VAR, &lease_table),
            scan_page_size,
        };

        let backend = match store.and_then(|s| s.backend).unwrap_or_default() {
            BackendKind::Memory => Backend::Memory,
            BackendKind::Sqlite => {
                let path = match env.require_env_var(DB_PATH_VAR) {
                    Ok(path) => PathBuf::from(path),
                    Err(_) => match store.and_then(|s| s.path.as_deref()) {
                        Some(raw) => PathBuf::from(expand_env_vars(raw, env.source())),
                        None => default_db_path().ok_or(ConfigError::NoHomeDir)?,
                    },
                };
                let mut options = SqliteOptions::default();
                let timeout_ms = env_count::<_, u64>(env, BUSY_TIMEOUT_VAR)?
                    .or_else(|| store.and_then(|s| s.busy_timeout_ms));
                if let Some(ms) = timeout_ms {
                    options.busy_timeout = Duration::from_millis(ms);
                }
                Backend::Sqlite { path, options }
            }
        };

        Ok(Settings { db, backend })
    }
}

/// A non-negative integer override; unset is `None`.
fn env_count<S: EnvSource, T: TryFrom<i64>>(
    env: &EnvConfig<S>,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    env.optional_env_int_var(name)?
        .map(|value| {
            T::try_from(value).map_err(|_| ConfigError::InvalidEnvVar {
                name: name.to_string(),
                value: value.to_string(),
                expected: "a non-negative integer",
            })
        })
        .transpose()
}

/// Expand `${VAR}` references; unset variables become empty.
pub fn expand_env_vars(value: &str, source: &impl EnvSource) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                if !name.is_empty() {
                    out.push_str(&source.var(name).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".sandpool"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

#[must_use]
pub fn default_db_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("pool.db"))
}
