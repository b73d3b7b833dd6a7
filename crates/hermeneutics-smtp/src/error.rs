//! Error types for SMTP and LMTP operations.

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS, timeout or SASL failure.
    #[error(transparent)]
    Transport(#[from] hermeneutics_net::Error),

    /// A reply line that is neither `DDD text` nor `DDD-text`.
    #[error("Malformed reply line: {0}")]
    Unspec(String),

    /// The greeting was not `220`.
    #[error("Server not ready ({code}): {message}")]
    ServerNotReady {
        /// Reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// A command was answered with a non-2xx reply.
    #[error("SMTP error {code}: {message}")]
    NotOk {
        /// Reply code (e.g., 550).
        code: u16,
        /// Error message from server.
        message: String,
    },

    /// `DATA` or an `AUTH` step was not answered with 3xx.
    #[error("Server not ready for data ({code}): {message}")]
    NotReadyForData {
        /// Reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// Authentication was rejected.
    #[error("Authentication failed ({code}): {message}")]
    AuthFailed {
        /// Reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// A multi-line reply where a single line was expected.
    #[error("Uncaught continuation line: {0}")]
    Uncaught(String),

    /// Input left over after a complete reply.
    #[error("Unused data after reply: {0}")]
    Unused(String),

    /// Feature not supported by server or dialect.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Invalid envelope address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

impl Error {
    /// The reply code carried by the error, if any.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::ServerNotReady { code, .. }
            | Self::NotOk { code, .. }
            | Self::NotReadyForData { code, .. }
            | Self::AuthFailed { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.code(), Some(500..=599))
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.code(), Some(400..=499))
    }

    /// Returns true if the credentials were rejected.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }
}

/// A refused command together with the client that sent it.
///
/// Returned where a refusal leaves the session usable, so the caller can
/// go on with the transaction. Converts into [`Error`] for `?`.
pub struct Refused<C> {
    /// Why the command failed.
    pub error: Error,
    /// The client, in the state it had before the command.
    pub client: C,
}

impl<C> Refused<C> {
    /// Splits into error and client.
    pub fn into_parts(self) -> (Error, C) {
        (self.error, self.client)
    }
}

impl<C> std::fmt::Debug for Refused<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refused")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<C> std::fmt::Display for Refused<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<C> std::error::Error for Refused<C> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<C> From<Refused<C>> for Error {
    fn from(refused: Refused<C>) -> Self {
        refused.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = Error::NotOk {
            code: 550,
            message: "no such user".into(),
        };
        assert!(err.is_permanent());
        assert!(!err.is_transient());

        let err = Error::ServerNotReady {
            code: 421,
            message: "busy".into(),
        };
        assert!(err.is_transient());

        let err = Error::AuthFailed {
            code: 535,
            message: "bad credentials".into(),
        };
        assert!(err.is_auth_failure());
        assert!(err.is_permanent());

        assert_eq!(Error::Unused("x".into()).code(), None);
    }
}
