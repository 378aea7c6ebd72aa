//! Core domain types for the sandbox account pool.
//!
//! Pure data with no IO: accounts, leases, and their two status enums.
//! Persistence and transition rules live in `sandpool-db`.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod account;
mod lease;
mod status;

pub use account::Account;
pub use lease::Lease;
pub use status::{AccountStatus, LeaseStatus, StatusKind, StatusParseError};

/// Caller-owned opaque payload attached to an account.
///
/// Values may be nested mappings, strings, numbers, or any other JSON value.
pub type Metadata = serde_json::Map<String, serde_json::Value>;
