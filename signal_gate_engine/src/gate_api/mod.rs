//! The public API of the engine.
//!
//! [`PostbackApi`] is the only writer of the ledger; [`VerificationApi`] is the only writer of the access store.
//! Both are thin, backend-generic wrappers so that server handlers and tests can swap in mock backends.
mod postback;
mod verify;

pub use postback::PostbackApi;
pub use verify::{VerificationApi, VerificationError, VerificationOutcome};
