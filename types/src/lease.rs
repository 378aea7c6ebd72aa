use serde::{Deserialize, Serialize};

use crate::LeaseStatus;

/// Assignment of an account to a principal.
///
/// Keyed by (`account_id`, `principal_id`); at most one row exists per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lease {
    #[serde(rename = "AccountId")]
    pub account_id: String,
    #[serde(rename = "PrincipalId")]
    pub principal_id: String,
    pub lease_status: LeaseStatus,
    #[serde(default)]
    pub created_on: i64,
    #[serde(default)]
    pub last_modified_on: i64,
    /// Refreshed only when `lease_status` changes.
    #[serde(default)]
    pub lease_status_modified_on: i64,
}

impl Lease {
    #[must_use]
    pub fn new(
        account_id: impl Into<String>,
        principal_id: impl Into<String>,
        lease_status: LeaseStatus,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            principal_id: principal_id.into(),
            lease_status,
            created_on: 0,
            last_modified_on: 0,
            lease_status_modified_on: 0,
        }
    }

    /// Sets all three timestamps to `now`.
    pub fn created_at(mut self, now: i64) -> Self {
        self.created_on = now;
        self.last_modified_on = now;
        self.lease_status_modified_on = now;
        self
    }
}
