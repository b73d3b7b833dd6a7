//! Numeric header fields (`Content-Length`, `Lines`).

use crate::error::{Error, Result};
use std::fmt;

/// A non-negative integer header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Count(u64);

impl Count {
    /// Wraps a number.
    #[must_use]
    pub const fn new(n: u64) -> Self {
        Self(n)
    }

    /// Parses a decimal number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a non-negative integer.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.trim()
            .parse()
            .map(Self)
            .map_err(|_| Error::InvalidCount(raw.trim().to_string()))
    }

    /// The number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Header wire words.
    #[must_use]
    pub fn encode(self) -> Vec<String> {
        vec![self.0.to_string()]
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Count {
    fn from(n: u64) -> Self {
        Self(n)
    }
}
