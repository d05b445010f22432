use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A bot or postback token. Every credential this system handles is a string, so this is a plain string wrapper
/// that masks itself in `Debug` and `Display` output; tokens cannot leak through logs or formatted errors.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// Deliberately explicit. Call sites that need the raw token (URL building, header values) stand out in review.
    pub fn reveal(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
