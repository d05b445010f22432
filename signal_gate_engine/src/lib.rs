//! Signal Gate Engine
//!
//! Core logic for the deposit-reconciliation and access-gating service. Two independent, uncoordinated event
//! sources feed it: the affiliate network's postback webhook writes deposit totals into the ledger, and chat users
//! submit broker account ids that are checked against that ledger. The engine owns both durable stores, the
//! idempotent-upsert semantics that keep the ledger correct under concurrent and repeated deliveries, and the
//! verification state machine that turns ledger state into a durable authorization decision.
//!
//! The crate is divided into two main sections:
//! 1. Database backends ([`mod@sqlite`]). SQLite is the supported backend; it implements the contracts in
//!    [`mod@traits`]. Callers should never touch the database directly; use the public API instead. The exception
//!    is the data types in [`mod@db_types`], which are public.
//! 2. The public API ([`mod@gate_api`]): postback ingestion and the verification state machine.
pub mod db_types;
pub mod helpers;
mod sqlite;

mod gate_api;
pub mod traits;

pub use gate_api::{PostbackApi, VerificationApi, VerificationError, VerificationOutcome};
pub use sqlite::{db_url, SqliteDatabase};
