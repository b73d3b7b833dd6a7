//! Envelope paths.

use std::fmt;

use crate::error::{Error, Result};

/// A mailbox as it appears in `MAIL FROM` and `RCPT TO`.
///
/// Displays in path form with angle brackets; the empty reverse path
/// shows as `<>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Checks and wraps a mailbox.
    ///
    /// LMTP delivers to local users, so a bare `postmaster` passes. An
    /// `@` with nothing on one side does not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] for an empty mailbox or one that
    /// would break out of the command line.
    pub fn new(mailbox: impl Into<String>) -> Result<Self> {
        let mailbox = mailbox.into();
        if mailbox.is_empty() {
            return Err(Error::InvalidAddress("empty mailbox".into()));
        }
        if let Some(bad) = mailbox.chars().find(|c| matches!(c, '<' | '>' | '\r' | '\n')) {
            return Err(Error::InvalidAddress(format!("{bad:?} in {mailbox:?}")));
        }
        if let Some((local, domain)) = mailbox.rsplit_once('@')
            && (local.is_empty() || domain.is_empty())
        {
            return Err(Error::InvalidAddress(format!("incomplete mailbox {mailbox:?}")));
        }
        Ok(Self(mailbox))
    }

    /// The empty reverse path, for bounces.
    #[must_use]
    pub const fn null() -> Self {
        Self(String::new())
    }

    /// The bare mailbox, empty for [`Address::null`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `<>`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl TryFrom<&str> for Address {
    type Error = Error;

    fn try_from(mailbox: &str) -> Result<Self> {
        Self::new(mailbox)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_domain_and_local_users() {
        let addr = Address::new("jane@example.org").unwrap();
        assert_eq!(addr.as_str(), "jane@example.org");
        assert_eq!(addr.to_string(), "<jane@example.org>");
        assert!(Address::try_from("postmaster").is_ok());
    }

    #[test]
    fn rejects_broken_mailboxes() {
        for bad in ["", "@example.org", "jane@", "a@b.c>\r\nRCPT TO:<x@y.z"] {
            assert!(
                matches!(Address::new(bad), Err(Error::InvalidAddress(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn null_path() {
        let null = Address::null();
        assert!(null.is_null());
        assert_eq!(null.as_str(), "");
        assert_eq!(null.to_string(), "<>");
    }
}
