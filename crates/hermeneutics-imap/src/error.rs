//! Client errors.
//!
//! A tagged `NO` or `BAD` maps to its own variant so callers can tell a
//! refused command from a broken connection.

use thiserror::Error;

/// Everything an IMAP call can fail with.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket, TLS, timeout or SASL failure below the protocol.
    #[error(transparent)]
    Transport(#[from] hermeneutics_net::Error),

    /// Response text the parser could not make sense of.
    #[error("malformed response at byte {position}: {message}")]
    Parse {
        /// Offset into the response line.
        position: usize,
        /// What was expected there.
        message: String,
    },

    /// A response that is neither tagged with the pending tag, untagged
    /// nor a continuation request.
    #[error("unexpected response {0}")]
    UnspecResponse(String),

    /// LOGIN or AUTHENTICATE was refused.
    #[error("login refused: {0}")]
    Auth(String),

    /// Tagged `NO`.
    #[error("NO {0}")]
    No(String),

    /// Tagged `BAD`.
    #[error("BAD {0}")]
    Bad(String),

    /// The server said `BYE` and closed the connection.
    #[error("BYE {0}")]
    Bye(String),

    /// The conversation went off track, e.g. a continuation where none was
    /// expected.
    #[error("{0}")]
    Protocol(String),
}

impl Error {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// After this error the connection is gone.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_fatal(),
            Self::Bye(_) => true,
            _ => false,
        }
    }

    /// True when the credentials were rejected.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result of client calls.
pub type Result<T, E = Error> = std::result::Result<T, E>;
