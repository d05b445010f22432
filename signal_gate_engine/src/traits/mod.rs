//! Contracts that database backends must implement.
//!
//! * [`SignalGateDatabase`] is the write path: atomic postback ingestion and the delayed-check queue. Ledger
//!   accumulation MUST be a single atomic read-modify-write at the storage layer; a naive read-then-write loses
//!   updates under concurrent postbacks for the same account id.
//! * [`LedgerManagement`] provides read access to the deposit ledger.
//! * [`AccessManagement`] owns the per-user authorization records.
//! * [`VerificationBackend`] bundles the three for code that drives the whole verification flow.
mod access_management;
mod gate_database;
mod ledger_management;

pub use access_management::{AccessApiError, AccessManagement};
pub use gate_database::{SignalGateDatabase, SignalGateError};
pub use ledger_management::{LedgerApiError, LedgerManagement};

/// Marker trait for backends that support the complete verification flow.
pub trait VerificationBackend: LedgerManagement + AccessManagement + SignalGateDatabase {}
