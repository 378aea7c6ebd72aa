use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by a [`RecordStore`](crate::RecordStore).
///
/// `ConditionFailed` is the only variant that carries domain meaning; every
/// other variant is a transport or data problem and is passed through untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conditional check failed on table {table}")]
    ConditionFailed { table: String },
    #[error("record in table {table} is missing string key attribute {attribute}")]
    MissingKeyAttribute { table: String, attribute: String },
    #[error("attribute {attribute} is neither the partition key nor an index of table {table}")]
    NotIndexed { table: String, attribute: String },
    #[error("attribute name {0:?} may only contain ASCII letters, digits and underscores")]
    InvalidAttributeName(String),
    #[error("record body is not valid JSON for this item: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store lock poisoned by a panicked writer")]
    Poisoned,
}

impl StoreError {
    #[must_use]
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, StoreError::ConditionFailed { .. })
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
