//! Availability and lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which status enum a parse failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Account,
    Lease,
}

impl StatusKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusKind::Account => "account status",
            StatusKind::Lease => "lease status",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value '{raw}'; expected one of: {expected:?}")]
pub struct StatusParseError {
    kind: StatusKind,
    raw: String,
    expected: &'static [&'static str],
}

impl StatusParseError {
    #[must_use]
    pub fn new(kind: StatusKind, raw: impl Into<String>, expected: &'static [&'static str]) -> Self {
        Self {
            kind,
            raw: raw.into(),
            expected,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        self.kind
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Availability of a pooled account.
///
/// Only an explicit, conditioned transition moves an account between these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    NotReady,
    Ready,
    Leased,
}

impl AccountStatus {
    pub const ALL: [AccountStatus; 3] = [
        AccountStatus::NotReady,
        AccountStatus::Ready,
        AccountStatus::Leased,
    ];

    const NAMES: &'static [&'static str] = &["NotReady", "Ready", "Leased"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AccountStatus::NotReady => "NotReady",
            AccountStatus::Ready => "Ready",
            AccountStatus::Leased => "Leased",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError::new(StatusKind::Account, s, Self::NAMES))
    }
}

/// Lifecycle of a lease, independent of the leased account's own status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaseStatus {
    Active,
    ResetLock,
    FinanceLock,
    Decommissioned,
}

impl LeaseStatus {
    pub const ALL: [LeaseStatus; 4] = [
        LeaseStatus::Active,
        LeaseStatus::ResetLock,
        LeaseStatus::FinanceLock,
        LeaseStatus::Decommissioned,
    ];

    const NAMES: &'static [&'static str] = &["Active", "ResetLock", "FinanceLock", "Decommissioned"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LeaseStatus::Active => "Active",
            LeaseStatus::ResetLock => "ResetLock",
            LeaseStatus::FinanceLock => "FinanceLock",
            LeaseStatus::Decommissioned => "Decommissioned",
        }
    }
}

impl fmt::Display for LeaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaseStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError::new(StatusKind::Lease, s, Self::NAMES))
    }
}
