//! Account and lease repositories for the sandbox account pool.
//!
//! Every state change here is a single conditional write against a
//! [`RecordStore`]; this crate holds no locks and keeps no state beyond the
//! injected store, clock and table names.
//!
//! ```text
//! Db ─┬─ Accounts ─┐
//!     └─ Leases ───┼─ transition (compare-and-swap) ─┐
//!                  └─ query (index or scan) ─────────┴─ RecordStore
//! ```

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod account;
mod clock;
mod error;
mod lease;
mod query;
mod schema;
mod transition;

use std::fmt;
use std::sync::Arc;

use sandpool_store::{RecordStore, TableSpec};

pub use account::Accounts;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AccountLeasedError, AccountNotFoundError, DbError, StatusTransitionError};
pub use lease::Leases;

/// Names and tunables injected by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub account_table: String,
    pub lease_table: String,
    /// Records fetched per page when a lookup has to scan.
    pub scan_page_size: usize,
}

impl DbSettings {
    pub const DEFAULT_ACCOUNT_TABLE: &'static str = "Accounts";
    pub const DEFAULT_LEASE_TABLE: &'static str = "Leases";
    pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            account_table: Self::DEFAULT_ACCOUNT_TABLE.to_string(),
            lease_table: Self::DEFAULT_LEASE_TABLE.to_string(),
            scan_page_size: Self::DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

/// Entry point: a store handle plus the two table layouts.
///
/// Cheap to clone; clones share the store and clock.
#[derive(Clone)]
pub struct Db {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    account_table: TableSpec,
    lease_table: TableSpec,
    scan_page_size: usize,
}

impl Db {
    pub fn new(store: Arc<dyn RecordStore>, settings: &DbSettings) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), settings)
    }

    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        settings: &DbSettings,
    ) -> Self {
        Self {
            store,
            clock,
            account_table: schema::account_table(&settings.account_table),
            lease_table: schema::lease_table(&settings.lease_table),
            scan_page_size: settings.scan_page_size.max(1),
        }
    }

    #[must_use]
    pub fn accounts(&self) -> Accounts<'_> {
        Accounts::new(self)
    }

    #[must_use]
    pub fn leases(&self) -> Leases<'_> {
        Leases::new(self)
    }

    #[must_use]
    pub fn account_table(&self) -> &TableSpec {
        &self.account_table
    }

    #[must_use]
    pub fn lease_table(&self) -> &TableSpec {
        &self.lease_table
    }

    fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    fn now(&self) -> i64 {
        self.clock.now()
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("account_table", &self.account_table.name())
            .field("lease_table", &self.lease_table.name())
            .field("scan_page_size", &self.scan_page_size)
            .finish_non_exhaustive()
    }
}
