//! Persisted attribute names and table layouts.

use sandpool_store::TableSpec;

pub(crate) const ID: &str = "Id";
pub(crate) const ACCOUNT_STATUS: &str = "AccountStatus";
pub(crate) const PRINCIPAL_ROLE_ARN: &str = "PrincipalRoleArn";
pub(crate) const PRINCIPAL_POLICY_HASH: &str = "PrincipalPolicyHash";
pub(crate) const METADATA: &str = "Metadata";

pub(crate) const ACCOUNT_ID: &str = "AccountId";
pub(crate) const PRINCIPAL_ID: &str = "PrincipalId";
pub(crate) const LEASE_STATUS: &str = "LeaseStatus";
pub(crate) const LEASE_STATUS_MODIFIED_ON: &str = "LeaseStatusModifiedOn";

pub(crate) const LAST_MODIFIED_ON: &str = "LastModifiedOn";

/// Accounts: keyed by `Id`, indexed by status.
pub(crate) fn account_table(name: &str) -> TableSpec {
    TableSpec::new(name, ID).with_index(ACCOUNT_STATUS)
}

/// Leases: keyed by (`AccountId`, `PrincipalId`), indexed by status and principal.
pub(crate) fn lease_table(name: &str) -> TableSpec {
    TableSpec::new(name, ACCOUNT_ID)
        .with_sort_key(PRINCIPAL_ID)
        .with_index(LEASE_STATUS)
        .with_index(PRINCIPAL_ID)
}
