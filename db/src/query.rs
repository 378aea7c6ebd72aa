//! Lookups that prefer an index and fall back to a filtered scan.
//!
//! Every function here drains the store completely before returning, and
//! results come back in primary-key order.

use sandpool_store::{IndexPredicate, Record, RecordStore, RecordStoreExt, StoreError, TableSpec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::DbError;

pub(crate) fn find_where(
    store: &dyn RecordStore,
    table: &TableSpec,
    page_size: usize,
    attribute: &str,
    value: impl Into<Value>,
) -> Result<Vec<Record>, StoreError> {
    let value = value.into();
    if table.is_queryable(attribute) {
        return store.query(table, &IndexPredicate::new(attribute, value));
    }
    trace!(table = table.name(), attribute, "no index for attribute, scanning");
    scan_filter(store, table, page_size, |record| record.get(attribute) == Some(&value))
}

pub(crate) fn scan_filter(
    store: &dyn RecordStore,
    table: &TableSpec,
    page_size: usize,
    keep: impl Fn(&Record) -> bool,
) -> Result<Vec<Record>, StoreError> {
    let mut matched = Vec::new();
    for record in store.scan_all(table, page_size) {
        let record = record?;
        if keep(&record) {
            matched.push(record);
        }
    }
    Ok(matched)
}

pub(crate) fn decode<T: DeserializeOwned>(table: &TableSpec, record: Record) -> Result<T, DbError> {
    record.into_item().map_err(|source| DbError::Decode {
        table: table.name().to_string(),
        source,
    })
}

pub(crate) fn decode_all<T: DeserializeOwned>(
    table: &TableSpec,
    records: Vec<Record>,
) -> Result<Vec<T>, DbError> {
    records.into_iter().map(|record| decode(table, record)).collect()
}

pub(crate) fn encode<T: Serialize>(table: &TableSpec, item: &T) -> Result<Record, DbError> {
    Record::from_item(item).map_err(|source| DbError::Encode {
        table: table.name().to_string(),
        source,
    })
}
