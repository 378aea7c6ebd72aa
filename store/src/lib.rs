//! Conditional key-value store contract for the account pool.
//!
//! This crate knows keys and attributes, nothing about accounts or leases.
//! Every guarded state change in `sandpool-db` is built on one primitive:
//! a write that applies only if the live record satisfies a [`Condition`],
//! evaluated atomically with the write itself.
//!
//! # Backends
//!
//! ```text
//! RecordStore (trait, Send + Sync)
//! ├── MemoryStore  one mutex over BTreeMap tables
//! └── SqliteStore  IMMEDIATE transactions over a shared `records` table
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod condition;
mod error;
mod memory;
mod record;
mod scan;
mod sqlite;
mod sqlite_security;
mod table;

use serde_json::Value;

pub use condition::{Clause, Condition};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{Record, Update};
pub use scan::{RecordStoreExt, Scan, ScanPage, ScanRequest};
pub use sqlite::{SqliteOptions, SqliteStore};
pub use table::{Key, TableSpec};

/// Equality lookup served by the partition key or a secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPredicate {
    pub attribute: String,
    pub value: Value,
}

impl IndexPredicate {
    #[must_use]
    pub fn new(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Keyed record collections with atomic conditional writes.
///
/// Implementations must apply a conditioned `put`, `update` or `delete` as
/// a single atomic step: either the condition held against the live record
/// and the write happened, or [`StoreError::ConditionFailed`] is returned
/// and nothing changed. Results of `query` and `scan_page` are ordered by
/// primary key.
pub trait RecordStore: Send + Sync {
    fn get(&self, table: &TableSpec, key: &Key) -> Result<Option<Record>, StoreError>;

    /// Insert or replace the record at its key, returning the previous one.
    fn put(
        &self,
        table: &TableSpec,
        record: Record,
        condition: Option<&Condition>,
    ) -> Result<Option<Record>, StoreError>;

    /// Apply `update` to the record at `key` and return the record as stored.
    ///
    /// Without a condition, an absent record is created from the key
    /// attributes plus the assignments.
    fn update(
        &self,
        table: &TableSpec,
        key: &Key,
        update: &Update,
        condition: Option<&Condition>,
    ) -> Result<Record, StoreError>;

    /// Remove the record at `key`, returning it if it existed.
    fn delete(
        &self,
        table: &TableSpec,
        key: &Key,
        condition: Option<&Condition>,
    ) -> Result<Option<Record>, StoreError>;

    /// All records whose `predicate.attribute` equals `predicate.value`.
    ///
    /// Fails with [`StoreError::NotIndexed`] unless the attribute is the
    /// partition key or a declared index of `table`.
    fn query(&self, table: &TableSpec, predicate: &IndexPredicate)
    -> Result<Vec<Record>, StoreError>;

    fn scan_page(&self, table: &TableSpec, request: &ScanRequest) -> Result<ScanPage, StoreError>;
}
