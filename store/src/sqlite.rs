//! SQLite-backed [`RecordStore`].
//!
//! Every logical table shares one `records` table keyed by
//! (table name, partition key, sort key) with the record as a JSON body.
//! Declared indexes become expression indexes over `json_extract`, created
//! the first time an attribute is queried.
//!
//! Conditional writes run in an `IMMEDIATE` transaction: SQLite takes the
//! write lock before the live record is read, so the condition check and the
//! write are atomic with respect to every other connection on the file,
//! including connections in other processes.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde_json::Value;

use crate::condition::satisfied;
use crate::sqlite_security::prepare_db_path;
use crate::{
    Condition, IndexPredicate, Key, Record, RecordStore, ScanPage, ScanRequest, StoreError,
    TableSpec, Update,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    /// How long a writer waits on another connection's lock before failing.
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
        }
    }
}

struct Inner {
    conn: Connection,
    indexed: HashSet<String>,
}

pub struct SqliteStore {
    inner: Mutex<Inner>,
}

impl SqliteStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS records (
            table_name TEXT NOT NULL,
            partition_key TEXT NOT NULL,
            sort_key TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL,
            PRIMARY KEY (table_name, partition_key, sort_key)
        ) WITHOUT ROWID;
    ";

    /// Open or create the store database at `path`.
    pub fn open(path: impl AsRef<Path>, options: &SqliteOptions) -> Result<Self, StoreError> {
        let path = path.as_ref();
        prepare_db_path(path)?;
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened sqlite record store");
        Self::initialize(conn, options)
    }

    /// Open a private in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn, &SqliteOptions::default())
    }

    fn initialize(conn: Connection, options: &SqliteOptions) -> Result<Self, StoreError> {
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=FULL;")?;
        conn.execute_batch(Self::SCHEMA)?;
        Ok(Self {
            inner: Mutex::new(Inner {
                conn,
                indexed: HashSet::new(),
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Run `write` inside an `IMMEDIATE` transaction; an `Err` rolls back.
    fn atomically<T>(
        &self,
        write: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self.lock()?;
        let tx = inner
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = write(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn sort_value(key: &Key) -> &str {
    key.sort_value().unwrap_or("")
}

fn key_from_row(table: &TableSpec, partition: String, sort: String) -> Key {
    match table.sort_key() {
        Some(_) => Key::composite(partition, sort),
        None => Key::partition(partition),
    }
}

fn condition_failed(table: &TableSpec) -> StoreError {
    StoreError::ConditionFailed {
        table: table.name().to_string(),
    }
}

fn read_record(conn: &Connection, table: &TableSpec, key: &Key) -> Result<Option<Record>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM records
             WHERE table_name = ?1 AND partition_key = ?2 AND sort_key = ?3",
            params![table.name(), key.partition_value(), sort_value(key)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(body.map(|body| serde_json::from_str(&body)).transpose()?)
}

fn write_record(
    conn: &Connection,
    table: &TableSpec,
    key: &Key,
    record: &Record,
) -> Result<(), StoreError> {
    let body = serde_json::to_string(record)?;
    conn.execute(
        "INSERT INTO records (table_name, partition_key, sort_key, body)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(table_name, partition_key, sort_key) DO UPDATE SET body = excluded.body",
        params![table.name(), key.partition_value(), sort_value(key), body],
    )?;
    Ok(())
}

/// Rejects anything that could break out of the quoted JSON path.
fn json_path_expr(attribute: &str) -> Result<String, StoreError> {
    let valid = !attribute.is_empty()
        && attribute
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(StoreError::InvalidAttributeName(attribute.to_string()));
    }
    Ok(format!("json_extract(body, '$.{attribute}')"))
}

/// The SQL value `json_extract` yields for a JSON value.
fn extracted_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

fn body_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn collect_bodies(
    rows: impl Iterator<Item = rusqlite::Result<(String, String, String)>>,
) -> Result<Vec<(String, String, Record)>, StoreError> {
    rows.map(|row| -> Result<_, StoreError> {
        let (partition, sort, body) = row?;
        Ok((partition, sort, serde_json::from_str::<Record>(&body)?))
    })
    .collect()
}

impl RecordStore for SqliteStore {
    fn get(&self, table: &TableSpec, key: &Key) -> Result<Option<Record>, StoreError> {
        let inner = self.lock()?;
        read_record(&inner.conn, table, key)
    }

    fn put(
        &self,
        table: &TableSpec,
        record: Record,
        condition: Option<&Condition>,
    ) -> Result<Option<Record>, StoreError> {
        let key = table.key_of(&record)?;
        self.atomically(|conn| {
            let previous = read_record(conn, table, &key)?;
            if !satisfied(condition, previous.as_ref()) {
                return Err(condition_failed(table));
            }
            write_record(conn, table, &key, &record)?;
            Ok(previous)
        })
    }

    fn update(
        &self,
        table: &TableSpec,
        key: &Key,
        update: &Update,
        condition: Option<&Condition>,
    ) -> Result<Record, StoreError> {
        self.atomically(|conn| {
            let current = read_record(conn, table, key)?;
            if !satisfied(condition, current.as_ref()) {
                return Err(condition_failed(table));
            }
            let mut next = current.unwrap_or_else(|| table.key_record(key));
            next.apply(update);
            write_record(conn, table, key, &next)?;
            Ok(next)
        })
    }

    fn delete(
        &self,
        table: &TableSpec,
        key: &Key,
        condition: Option<&Condition>,
    ) -> Result<Option<Record>, StoreError> {
        self.atomically(|conn| {
            let current = read_record(conn, table, key)?;
            if !satisfied(condition, current.as_ref()) {
                return Err(condition_failed(table));
            }
            if current.is_some() {
                conn.execute(
                    "DELETE FROM records
                     WHERE table_name = ?1 AND partition_key = ?2 AND sort_key = ?3",
                    params![table.name(), key.partition_value(), sort_value(key)],
                )?;
            }
            Ok(current)
        })
    }

    fn query(
        &self,
        table: &TableSpec,
        predicate: &IndexPredicate,
    ) -> Result<Vec<Record>, StoreError> {
        let attribute = predicate.attribute.as_str();
        if !table.is_queryable(attribute) {
            return Err(StoreError::NotIndexed {
                table: table.name().to_string(),
                attribute: attribute.to_string(),
            });
        }

        let mut inner = self.lock()?;

        if attribute == table.partition_key() {
            let Some(partition) = predicate.value.as_str() else {
                return Ok(Vec::new());
            };
            let mut stmt = inner.conn.prepare(
                "SELECT partition_key, sort_key, body FROM records
                 WHERE table_name = ?1 AND partition_key = ?2
                 ORDER BY partition_key, sort_key",
            )?;
            let rows = stmt.query_map(params![table.name(), partition], body_row)?;
            return Ok(collect_bodies(rows)?
                .into_iter()
                .map(|(_, _, record)| record)
                .collect());
        }

        let expr = json_path_expr(attribute)?;
        if !inner.indexed.contains(attribute) {
            inner.conn.execute_batch(&format!(
                "CREATE INDEX IF NOT EXISTS idx_records_{attribute} ON records(table_name, {expr});"
            ))?;
            inner.indexed.insert(attribute.to_string());
        }

        let mut stmt = inner.conn.prepare(&format!(
            "SELECT partition_key, sort_key, body FROM records
             WHERE table_name = ?1 AND {expr} = ?2
             ORDER BY partition_key, sort_key"
        ))?;
        let rows = stmt.query_map(
            params![table.name(), extracted_value(&predicate.value)],
            body_row,
        )?;
        // SQL equality is looser than JSON equality for nested values.
        Ok(collect_bodies(rows)?
            .into_iter()
            .map(|(_, _, record)| record)
            .filter(|record| record.get(attribute) == Some(&predicate.value))
            .collect())
    }

    fn scan_page(&self, table: &TableSpec, request: &ScanRequest) -> Result<ScanPage, StoreError> {
        let limit = request.limit.max(1);
        let sql_limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let inner = self.lock()?;

        let page = match &request.exclusive_start_key {
            Some(start) => {
                let mut stmt = inner.conn.prepare(
                    "SELECT partition_key, sort_key, body FROM records
                     WHERE table_name = ?1 AND (partition_key, sort_key) > (?2, ?3)
                     ORDER BY partition_key, sort_key
                     LIMIT ?4",
                )?;
                let rows = stmt.query_map(
                    params![table.name(), start.partition_value(), sort_value(start), sql_limit],
                    body_row,
                )?;
                collect_bodies(rows)?
            }
            None => {
                let mut stmt = inner.conn.prepare(
                    "SELECT partition_key, sort_key, body FROM records
                     WHERE table_name = ?1
                     ORDER BY partition_key, sort_key
                     LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![table.name(), sql_limit], body_row)?;
                collect_bodies(rows)?
            }
        };

        let full = page.len() == limit;
        let mut records = Vec::with_capacity(page.len());
        let mut last_evaluated_key = None;
        for (partition, sort, record) in page {
            if full {
                last_evaluated_key = Some((partition, sort));
            }
            records.push(record);
        }
        Ok(ScanPage {
            records,
            last_evaluated_key: last_evaluated_key
                .map(|(partition, sort)| key_from_row(table, partition, sort)),
        })
    }
}
