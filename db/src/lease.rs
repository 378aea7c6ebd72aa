use sandpool_store::Key;
use sandpool_types::{Lease, LeaseStatus};
use tracing::debug;

use crate::query::{decode, decode_all, encode, find_where, scan_filter};
use crate::schema::{
    ACCOUNT_ID, LAST_MODIFIED_ON, LEASE_STATUS, LEASE_STATUS_MODIFIED_ON, PRINCIPAL_ID,
};
use crate::transition::Transition;
use crate::{Db, DbError};

/// Lease repository, borrowed from a [`Db`].
#[derive(Debug, Clone, Copy)]
pub struct Leases<'db> {
    db: &'db Db,
}

impl<'db> Leases<'db> {
    pub(crate) fn new(db: &'db Db) -> Self {
        Self { db }
    }

    fn key(account_id: &str, principal_id: &str) -> Key {
        Key::composite(account_id, principal_id)
    }

    pub fn get(&self, account_id: &str, principal_id: &str) -> Result<Option<Lease>, DbError> {
        let table = &self.db.lease_table;
        self.db
            .store()
            .get(table, &Self::key(account_id, principal_id))?
            .map(|record| decode(table, record))
            .transpose()
    }

    pub fn list(&self) -> Result<Vec<Lease>, DbError> {
        let table = &self.db.lease_table;
        let records = scan_filter(self.db.store(), table, self.db.scan_page_size, |_| true)?;
        decode_all(table, records)
    }

    /// Upsert keyed by (account, principal). Returns the replaced lease, `None` if new.
    pub fn put(&self, lease: &Lease) -> Result<Option<Lease>, DbError> {
        let table = &self.db.lease_table;
        let record = encode(table, lease)?;
        self.db
            .store()
            .put(table, record, None)?
            .map(|previous| decode(table, previous))
            .transpose()
    }

    /// All leases on one account, ordered by principal.
    pub fn find_by_account(&self, account_id: &str) -> Result<Vec<Lease>, DbError> {
        self.find(ACCOUNT_ID, account_id)
    }

    /// All leases held by one principal. Empty when there are none.
    pub fn find_by_principal(&self, principal_id: &str) -> Result<Vec<Lease>, DbError> {
        self.find(PRINCIPAL_ID, principal_id)
    }

    pub fn find_by_status(&self, status: LeaseStatus) -> Result<Vec<Lease>, DbError> {
        self.find(LEASE_STATUS, status.as_str())
    }

    fn find(&self, attribute: &str, value: &str) -> Result<Vec<Lease>, DbError> {
        let table = &self.db.lease_table;
        let records = find_where(
            self.db.store(),
            table,
            self.db.scan_page_size,
            attribute,
            value,
        )?;
        decode_all(table, records)
    }

    /// Move the lease from `from` to `to` if, and only if, it is in `from`.
    ///
    /// Refreshes both `LastModifiedOn` and `LeaseStatusModifiedOn`.
    pub fn transition_status(
        &self,
        account_id: &str,
        principal_id: &str,
        from: LeaseStatus,
        to: LeaseStatus,
    ) -> Result<Lease, DbError> {
        let table = &self.db.lease_table;
        let key = Self::key(account_id, principal_id);
        let record = Transition {
            entity: "lease",
            label: "status",
            target: key.to_string(),
            field: "Status",
            attribute: LEASE_STATUS,
            from: Some(from.as_str()),
            to: to.as_str(),
            touched: &[LAST_MODIFIED_ON, LEASE_STATUS_MODIFIED_ON],
        }
        .apply(self.db.store(), table, &key, self.db.now())?;
        decode(table, record)
    }

    /// Remove a lease outright. Absence is `Ok(None)`.
    pub fn delete(&self, account_id: &str, principal_id: &str) -> Result<Option<Lease>, DbError> {
        let table = &self.db.lease_table;
        let removed = self
            .db
            .store()
            .delete(table, &Self::key(account_id, principal_id), None)?;
        if removed.is_some() {
            debug!(table = table.name(), account_id, principal_id, "lease deleted");
        }
        removed.map(|record| decode(table, record)).transpose()
    }
}
