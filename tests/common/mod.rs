//! Shared fixtures: a `Db` per backend with a deterministic clock.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sandpool_db::{Db, DbSettings, ManualClock};
use sandpool_store::{MemoryStore, RecordStore, SqliteOptions, SqliteStore};
use sandpool_types::{Account, AccountStatus, Lease, LeaseStatus};
use tempfile::TempDir;

/// Clock start for every fixture; writes through `Db` stamp values above it.
pub const EPOCH: i64 = 1_561_382_309;

/// A `Db` plus whatever keeps its backend alive.
pub struct TestDb {
    pub name: &'static str,
    pub db: Db,
    dir: Option<TempDir>,
}

impl TestDb {
    pub fn memory() -> Self {
        Self {
            name: "memory",
            db: db_on(Arc::new(MemoryStore::new())),
            dir: None,
        }
    }

    pub fn sqlite() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteStore::open(dir.path().join("pool.db"), &SqliteOptions::default())
            .expect("open sqlite store");
        Self {
            name: "sqlite",
            db: db_on(Arc::new(store)),
            dir: Some(dir),
        }
    }

    /// Database file for the sqlite fixture.
    pub fn path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.path().join("pool.db"))
    }
}

pub fn settings() -> DbSettings {
    DbSettings {
        account_table: "Accounts".into(),
        lease_table: "Leases".into(),
        // Small pages so scans always cross page boundaries.
        scan_page_size: 2,
    }
}

pub fn db_on(store: Arc<dyn RecordStore>) -> Db {
    Db::with_clock(store, Arc::new(ManualClock::new(EPOCH)), &settings())
}

/// One fixture per backend.
pub fn backends() -> Vec<TestDb> {
    vec![TestDb::memory(), TestDb::sqlite()]
}

/// Open another connection to an existing sqlite file.
pub fn reopen(path: &Path) -> Db {
    let store = SqliteStore::open(path, &SqliteOptions::default()).expect("reopen sqlite store");
    db_on(Arc::new(store))
}

pub fn seed_accounts(db: &Db, accounts: &[(&str, AccountStatus)]) {
    for (id, status) in accounts {
        let account = Account::new(*id, *status).with_last_modified_on(EPOCH - 100);
        db.accounts().put(&account).expect("seed account");
    }
}

pub fn seed_leases(db: &Db, leases: &[(&str, &str, LeaseStatus)]) {
    for (account, principal, status) in leases {
        let lease = Lease::new(*account, *principal, *status).created_at(EPOCH - 100);
        db.leases().put(&lease).expect("seed lease");
    }
}

pub fn account_ids(accounts: &[Account]) -> Vec<&str> {
    accounts.iter().map(|a| a.id.as_str()).collect()
}

pub fn lease_keys(leases: &[Lease]) -> Vec<String> {
    leases
        .iter()
        .map(|l| format!("{}/{}", l.account_id, l.principal_id))
        .collect()
}
