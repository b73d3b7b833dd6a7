//! Error types for POP3 operations.

/// Result type alias for POP3 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// POP3 error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS or timeout failure.
    #[error(transparent)]
    Transport(#[from] hermeneutics_net::Error),

    /// The server answered `-ERR`.
    #[error("Server error: {0}")]
    Server(String),

    /// A status line that is neither `+OK` nor `-ERR`.
    #[error("Malformed response: {0}")]
    Unspec(String),

    /// The server refused the password or APOP digest.
    #[error("Authentication failed: {0}")]
    AuthFail(String),

    /// A single-item reply names a different message than asked for.
    #[error("Wrong message number in reply: expected {expected}, got {actual}")]
    Check {
        /// Requested message number.
        expected: u32,
        /// Message number in the reply.
        actual: u32,
    },

    /// Input left over after a complete response.
    #[error("Unused data after response: {0}")]
    Unused(String),

    /// A reply whose fields could not be read.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The operation needs something the server does not offer.
    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl Error {
    /// Returns true if the credentials were rejected.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFail(_))
    }

    /// Returns true if the connection can no longer be used.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_fatal(),
            Self::Unspec(_) | Self::Unused(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::AuthFail("bad password".into()).is_auth_failure());
        assert!(!Error::Server("no such message".into()).is_auth_failure());
        assert!(Error::Unused("+OK".into()).is_fatal());
        assert!(!Error::Check { expected: 1, actual: 2 }.is_fatal());
        assert!(Error::Transport(hermeneutics_net::Error::Eof).is_fatal());
    }
}
