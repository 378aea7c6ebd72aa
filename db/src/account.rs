use sandpool_store::{Condition, Key, StoreError, Update};
use sandpool_types::{Account, AccountStatus, Metadata};
use serde_json::Value;
use tracing::debug;

use crate::query::{decode, decode_all, encode, find_where, scan_filter};
use crate::schema::{
    ACCOUNT_STATUS, LAST_MODIFIED_ON, METADATA, PRINCIPAL_POLICY_HASH, PRINCIPAL_ROLE_ARN,
};
use crate::transition::Transition;
use crate::{AccountLeasedError, AccountNotFoundError, Db, DbError};

/// Account repository, borrowed from a [`Db`].
#[derive(Debug, Clone, Copy)]
pub struct Accounts<'db> {
    db: &'db Db,
}

impl<'db> Accounts<'db> {
    pub(crate) fn new(db: &'db Db) -> Self {
        Self { db }
    }

    fn key(id: &str) -> Key {
        Key::partition(id)
    }

    /// Point lookup. Absence is `Ok(None)`.
    pub fn get(&self, id: &str) -> Result<Option<Account>, DbError> {
        let table = &self.db.account_table;
        self.db
            .store()
            .get(table, &Self::key(id))?
            .map(|record| decode(table, record))
            .transpose()
    }

    /// Every account, drained from a full scan.
    pub fn list(&self) -> Result<Vec<Account>, DbError> {
        let table = &self.db.account_table;
        let records = scan_filter(self.db.store(), table, self.db.scan_page_size, |_| true)?;
        decode_all(table, records)
    }

    /// Some Ready account in store order, or `None` when the pool is empty.
    pub fn get_first_ready(&self) -> Result<Option<Account>, DbError> {
        Ok(self.find_by_status(AccountStatus::Ready)?.into_iter().next())
    }

    /// Accounts that are not Ready (NotReady or Leased): reset candidates.
    pub fn list_non_ready(&self) -> Result<Vec<Account>, DbError> {
        let table = &self.db.account_table;
        let ready = Value::from(AccountStatus::Ready.as_str());
        let records = scan_filter(self.db.store(), table, self.db.scan_page_size, |record| {
            record.get(ACCOUNT_STATUS) != Some(&ready)
        })?;
        decode_all(table, records)
    }

    pub fn find_by_status(&self, status: AccountStatus) -> Result<Vec<Account>, DbError> {
        self.find(ACCOUNT_STATUS, status.as_str())
    }

    /// Accounts whose `PrincipalRoleArn` equals `principal_role_arn`.
    pub fn find_by_principal(&self, principal_role_arn: &str) -> Result<Vec<Account>, DbError> {
        self.find(PRINCIPAL_ROLE_ARN, principal_role_arn)
    }

    fn find(&self, attribute: &str, value: &str) -> Result<Vec<Account>, DbError> {
        let table = &self.db.account_table;
        let records = find_where(
            self.db.store(),
            table,
            self.db.scan_page_size,
            attribute,
            value,
        )?;
        decode_all(table, records)
    }

    /// Unconditioned upsert. Returns the account it replaced, `None` if new.
    ///
    /// Last writer wins; use [`Accounts::transition_status`] to change
    /// status safely.
    pub fn put(&self, account: &Account) -> Result<Option<Account>, DbError> {
        let table = &self.db.account_table;
        let record = encode(table, account)?;
        self.db
            .store()
            .put(table, record, None)?
            .map(|previous| decode(table, previous))
            .transpose()
    }

    /// Replace `Metadata` wholesale and refresh `LastModifiedOn`.
    pub fn update_metadata(&self, id: &str, metadata: Metadata) -> Result<Account, DbError> {
        let table = &self.db.account_table;
        let update = Update::new()
            .set(METADATA, Value::Object(metadata))
            .set(LAST_MODIFIED_ON, self.db.now());
        let record = match self.db.store().update(
            table,
            &Self::key(id),
            &update,
            Some(&Condition::exists()),
        ) {
            Ok(record) => record,
            Err(StoreError::ConditionFailed { .. }) => {
                return Err(AccountNotFoundError { id: id.to_string() }.into());
            }
            Err(err) => return Err(err.into()),
        };
        debug!(table = table.name(), id, "account metadata replaced");
        decode(table, record)
    }

    /// Move the account from `from` to `to` if, and only if, it is in `from`.
    pub fn transition_status(
        &self,
        id: &str,
        from: AccountStatus,
        to: AccountStatus,
    ) -> Result<Account, DbError> {
        self.transition(
            id,
            "status",
            "Status",
            ACCOUNT_STATUS,
            Some(from.as_str()),
            to.as_str(),
        )
    }

    /// Swap `PrincipalPolicyHash` from `previous` to `next`.
    ///
    /// `previous = None` requires the account to carry no hash yet.
    pub fn update_principal_policy_hash(
        &self,
        id: &str,
        previous: Option<&str>,
        next: &str,
    ) -> Result<Account, DbError> {
        self.transition(
            id,
            "policy hash",
            PRINCIPAL_POLICY_HASH,
            PRINCIPAL_POLICY_HASH,
            previous,
            next,
        )
    }

    fn transition(
        &self,
        id: &str,
        label: &'static str,
        field: &'static str,
        attribute: &'static str,
        from: Option<&str>,
        to: &str,
    ) -> Result<Account, DbError> {
        let table = &self.db.account_table;
        let record = Transition {
            entity: "account",
            label,
            target: format!("account {id}"),
            field,
            attribute,
            from,
            to,
            touched: &[LAST_MODIFIED_ON],
        }
        .apply(self.db.store(), table, &Self::key(id), self.db.now())?;
        decode(table, record)
    }

    /// Delete an account that is not leased, returning it.
    ///
    /// The leased check is part of the conditional delete itself. After a
    /// refusal the account is read back to report which case applied. If it
    /// has since left Leased, the delete is tried once more; a second
    /// refusal surfaces as [`StoreError::ConditionFailed`].
    pub fn delete(&self, id: &str) -> Result<Account, DbError> {
        let table = &self.db.account_table;
        let key = Self::key(id);
        let guard =
            Condition::exists().and_not_equals(ACCOUNT_STATUS, AccountStatus::Leased.as_str());
        for attempt in 0..2 {
            match self.db.store().delete(table, &key, Some(&guard)) {
                Ok(removed) => {
                    // The guard requires existence, so a granted delete returns the record.
                    let record =
                        removed.ok_or_else(|| AccountNotFoundError { id: id.to_string() })?;
                    debug!(table = table.name(), id, "account deleted");
                    return decode(table, record);
                }
                Err(StoreError::ConditionFailed { .. }) => match self.get(id)? {
                    None => return Err(AccountNotFoundError { id: id.to_string() }.into()),
                    Some(account) if account.is_leased() => {
                        return Err(AccountLeasedError {
                            account: Box::new(account),
                        }
                        .into());
                    }
                    Some(account) => debug!(
                        table = table.name(),
                        id,
                        attempt,
                        status = account.account_status.as_str(),
                        "account no longer leased, retrying delete"
                    ),
                },
                Err(err) => return Err(err.into()),
            }
        }
        Err(StoreError::ConditionFailed {
            table: table.name().to_string(),
        }
        .into())
    }
}
