use serde::{Deserialize, Serialize};

use crate::{AccountStatus, Metadata};

/// A pooled, reusable cloud account.
///
/// Serialized with the attribute names used by the persisted record layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(rename = "Id")]
    pub id: String,
    pub account_status: AccountStatus,
    /// Principal currently authorized against this account while leased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_role_arn: Option<String>,
    /// Hash of the policy last applied to the principal role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_policy_hash: Option<String>,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub last_modified_on: i64,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Account {
    #[must_use]
    pub fn new(id: impl Into<String>, account_status: AccountStatus) -> Self {
        Self {
            id: id.into(),
            account_status,
            principal_role_arn: None,
            principal_policy_hash: None,
            last_modified_on: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_principal_role_arn(mut self, arn: impl Into<String>) -> Self {
        self.principal_role_arn = Some(arn.into());
        self
    }

    pub fn with_last_modified_on(mut self, last_modified_on: i64) -> Self {
        self.last_modified_on = last_modified_on;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn is_leased(&self) -> bool {
        self.account_status == AccountStatus::Leased
    }
}
