use std::fmt;

use sandpool_store::StoreError;
use sandpool_types::Account;
use thiserror::Error;

/// A guarded write found the record absent or holding another value.
///
/// The two cases are deliberately indistinguishable: the conditional write
/// only reports that its precondition did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct StatusTransitionError {
    /// `"account"` or `"lease"`.
    pub entity: &'static str,
    /// What was being changed, e.g. `"status"`.
    pub label: &'static str,
    /// Human-readable identity of the record, e.g. `account 111` or `111/222`.
    pub target: String,
    /// Field name used in the precondition part of the message.
    pub field: &'static str,
    /// Expected current value; `None` when the field had to be unset.
    pub from: Option<String>,
    pub to: String,
}

impl fmt::Display for StatusTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from.as_deref().unwrap_or("");
        write!(
            f,
            "unable to update {} {} from \"{from}\" to \"{}\" for {}: ",
            self.entity, self.label, self.to, self.target
        )?;
        match &self.from {
            Some(_) => write!(f, "no {} exists with {}=\"{from}\"", self.entity, self.field),
            None => write!(f, "no {} exists without {}", self.entity, self.field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No account found with ID \"{id}\".")]
pub struct AccountNotFoundError {
    pub id: String,
}

/// Delete refused because the account is leased. Carries the account as stored.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unable to delete account \"{}\": account is leased.", .account.id)]
pub struct AccountLeasedError {
    pub account: Box<Account>,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    StatusTransition(#[from] StatusTransitionError),
    #[error(transparent)]
    AccountNotFound(#[from] AccountNotFoundError),
    #[error(transparent)]
    AccountLeased(#[from] AccountLeasedError),
    #[error("failed to decode record from table {table}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record for table {table}")]
    Encode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DbError {
    #[must_use]
    pub fn is_status_transition(&self) -> bool {
        matches!(self, DbError::StatusTransition(_))
    }

    #[must_use]
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, DbError::AccountNotFound(_))
    }

    #[must_use]
    pub fn is_account_leased(&self) -> bool {
        matches!(self, DbError::AccountLeased(_))
    }
}
