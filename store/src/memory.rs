//! Process-local store used by tests and single-process tooling.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Mutex, MutexGuard};

use crate::condition::satisfied;
use crate::{
    Condition, IndexPredicate, Key, Record, RecordStore, ScanPage, ScanRequest, StoreError,
    TableSpec, Update,
};

type Table = BTreeMap<Key, Record>;

/// In-memory [`RecordStore`].
///
/// All tables sit behind one mutex, so a conditional write observes and
/// replaces the live record without interleaving.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Table>>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn condition_failed(table: &TableSpec) -> StoreError {
    StoreError::ConditionFailed {
        table: table.name().to_string(),
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, table: &TableSpec, key: &Key) -> Result<Option<Record>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.get(table.name()).and_then(|rows| rows.get(key)).cloned())
    }

    fn put(
        &self,
        table: &TableSpec,
        record: Record,
        condition: Option<&Condition>,
    ) -> Result<Option<Record>, StoreError> {
        let key = table.key_of(&record)?;
        let mut tables = self.lock()?;
        let rows = tables.entry(table.name().to_string()).or_default();
        if !satisfied(condition, rows.get(&key)) {
            return Err(condition_failed(table));
        }
        Ok(rows.insert(key, record))
    }

    fn update(
        &self,
        table: &TableSpec,
        key: &Key,
        update: &Update,
        condition: Option<&Condition>,
    ) -> Result<Record, StoreError> {
        let mut tables = self.lock()?;
        let rows = tables.entry(table.name().to_string()).or_default();
        let current = rows.get(key);
        if !satisfied(condition, current) {
            return Err(condition_failed(table));
        }
        let mut next = current.cloned().unwrap_or_else(|| table.key_record(key));
        next.apply(update);
        rows.insert(key.clone(), next.clone());
        Ok(next)
    }

    fn delete(
        &self,
        table: &TableSpec,
        key: &Key,
        condition: Option<&Condition>,
    ) -> Result<Option<Record>, StoreError> {
        let mut tables = self.lock()?;
        let Some(rows) = tables.get_mut(table.name()) else {
            return if satisfied(condition, None) {
                Ok(None)
            } else {
                Err(condition_failed(table))
            };
        };
        if !satisfied(condition, rows.get(key)) {
            return Err(condition_failed(table));
        }
        Ok(rows.remove(key))
    }

    fn query(
        &self,
        table: &TableSpec,
        predicate: &IndexPredicate,
    ) -> Result<Vec<Record>, StoreError> {
        if !table.is_queryable(&predicate.attribute) {
            return Err(StoreError::NotIndexed {
                table: table.name().to_string(),
                attribute: predicate.attribute.clone(),
            });
        }
        let tables = self.lock()?;
        let Some(rows) = tables.get(table.name()) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .filter(|(key, record)| table.matches(key, record, &predicate.attribute, &predicate.value))
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn scan_page(&self, table: &TableSpec, request: &ScanRequest) -> Result<ScanPage, StoreError> {
        let tables = self.lock()?;
        let Some(rows) = tables.get(table.name()) else {
            return Ok(ScanPage::default());
        };
        let lower = match &request.exclusive_start_key {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let limit = request.limit.max(1);
        let page: Vec<(&Key, &Record)> = rows.range((lower, Bound::Unbounded)).take(limit).collect();
        let last_evaluated_key = if page.len() == limit {
            page.last().map(|(key, _)| (*key).clone())
        } else {
            None
        };
        Ok(ScanPage {
            records: page.into_iter().map(|(_, record)| record.clone()).collect(),
            last_evaluated_key,
        })
    }
}
