use std::fmt;

use serde_json::Value;

use crate::{Record, StoreError};

/// Primary key of a record: a partition value plus an optional sort value.
///
/// Ordering is (partition, sort), which is also the order every backend
/// returns query and scan results in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key {
    partition: String,
    sort: Option<String>,
}

impl Key {
    #[must_use]
    pub fn partition(value: impl Into<String>) -> Self {
        Self {
            partition: value.into(),
            sort: None,
        }
    }

    #[must_use]
    pub fn composite(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: Some(sort.into()),
        }
    }

    #[must_use]
    pub fn partition_value(&self) -> &str {
        &self.partition
    }

    #[must_use]
    pub fn sort_value(&self) -> Option<&str> {
        self.sort.as_deref()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sort {
            Some(sort) => write!(f, "{}/{}", self.partition, sort),
            None => f.write_str(&self.partition),
        }
    }
}

/// Key layout and secondary indexes of one record collection.
///
/// The table name is supplied by the caller; attribute names are fixed by
/// whoever owns the record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    name: String,
    partition_key: &'static str,
    sort_key: Option<&'static str>,
    indexes: Vec<&'static str>,
}

impl TableSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, partition_key: &'static str) -> Self {
        Self {
            name: name.into(),
            partition_key,
            sort_key: None,
            indexes: Vec::new(),
        }
    }

    pub fn with_sort_key(mut self, sort_key: &'static str) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn with_index(mut self, attribute: &'static str) -> Self {
        if !self.indexes.contains(&attribute) {
            self.indexes.push(attribute);
        }
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn partition_key(&self) -> &'static str {
        self.partition_key
    }

    #[must_use]
    pub fn sort_key(&self) -> Option<&'static str> {
        self.sort_key
    }

    #[must_use]
    pub fn indexes(&self) -> &[&'static str] {
        &self.indexes
    }

    /// Whether `query` can serve `attribute` without a full scan.
    #[must_use]
    pub fn is_queryable(&self, attribute: &str) -> bool {
        attribute == self.partition_key || self.indexes.contains(&attribute)
    }

    /// Extract the primary key from a full record.
    pub fn key_of(&self, record: &Record) -> Result<Key, StoreError> {
        let partition = self.key_attribute(record, self.partition_key)?;
        match self.sort_key {
            Some(sort_key) => Ok(Key::composite(partition, self.key_attribute(record, sort_key)?)),
            None => Ok(Key::partition(partition)),
        }
    }

    /// The key attributes of `key` as a bare record.
    #[must_use]
    pub fn key_record(&self, key: &Key) -> Record {
        let mut record = Record::new().with(self.partition_key, key.partition_value());
        if let (Some(sort_key), Some(sort)) = (self.sort_key, key.sort_value()) {
            record.insert(sort_key, sort);
        }
        record
    }

    pub(crate) fn matches(&self, key: &Key, record: &Record, attribute: &str, value: &Value) -> bool {
        if attribute == self.partition_key {
            return value.as_str() == Some(key.partition_value());
        }
        record.get(attribute) == Some(value)
    }

    fn key_attribute(&self, record: &Record, attribute: &str) -> Result<String, StoreError> {
        record
            .get_str(attribute)
            .map(str::to_owned)
            .ok_or_else(|| StoreError::MissingKeyAttribute {
                table: self.name.clone(),
                attribute: attribute.to_string(),
            })
    }
}
