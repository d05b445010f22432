mod usd;

pub mod op;
mod secret;

pub use secret::Secret;
pub use usd::{UsdCents, UsdConversionError};
