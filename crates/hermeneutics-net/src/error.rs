//! Transport failures shared by the protocol crates.

use std::time::Duration;

use thiserror::Error;

/// What can go wrong below the protocol layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the socket failed.
    #[error("socket: {0}")]
    Io(#[from] std::io::Error),

    /// Handshake or record layer failure.
    #[error("tls: {0}")]
    Tls(#[from] rustls::Error),

    /// The host name cannot be used as TLS server name.
    #[error("not a valid server name: {0}")]
    InvalidDnsName(String),

    /// The CA bundle could not be loaded.
    #[error("ca bundle: {0}")]
    Certificate(String),

    /// Nothing arrived within the configured read timeout.
    #[error("no data for {0:?}")]
    Timeout(Duration),

    /// The server hung up.
    #[error("unexpected end of stream")]
    Eof,

    /// A response line grew past the limit, in bytes.
    #[error("response line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The operation does not fit the current connection, e.g. a second
    /// STARTTLS.
    #[error("{0}")]
    InvalidState(String),

    /// The server's SASL challenge could not be answered.
    #[error("sasl: {0}")]
    Sasl(String),
}

impl Error {
    /// The stream is unusable after this error; the caller should drop the
    /// connection.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Tls(_) | Self::Timeout(_) | Self::Eof)
    }
}

/// Transport result.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stream_failures_are_fatal() {
        assert!(Error::Eof.is_fatal());
        assert!(Error::Timeout(Duration::from_secs(1)).is_fatal());
        assert!(!Error::Sasl("bad challenge".into()).is_fatal());
        assert!(!Error::LineTooLong(8).is_fatal());
        assert_eq!(Error::LineTooLong(8).to_string(), "response line exceeds 8 bytes");
    }
}
