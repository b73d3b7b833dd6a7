//! SMTP and LMTP connection management with type-state pattern.

mod client;

pub use client::{
    Authenticated, Client, Connected, Data, Greeted, MailTransaction, Ready, RecipientAdded,
    SmtpConnection,
};

use crate::error::Result;
use crate::types::Extension;
use hermeneutics_net::{Config, Stream, Transport};
#[cfg(unix)]
use std::path::Path;

/// Default SMTP port.
pub const DEFAULT_PORT: u16 = 25;

/// Default SMTP port with implicit TLS.
pub const DEFAULT_TLS_PORT: u16 = 465;

/// Default LMTP port over TCP.
pub const LMTP_PORT: u16 = 24;

/// The protocol spoken on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// RFC 5321: one reply per message.
    #[default]
    Smtp,
    /// RFC 2033: one reply per accepted recipient after the message.
    Lmtp,
}

/// Server identity and capabilities from the greeting and EHLO/LHLO reply.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server domain from the EHLO/LHLO reply.
    pub domain: String,
    /// Greeting text following the domain.
    pub greeting: String,
    /// Advertised extensions.
    pub extensions: Vec<Extension>,
}

impl ServerInfo {
    /// Fills the domain, greeting and extensions from hello reply lines.
    ///
    /// The first line carries the domain and a greeting; every further
    /// line advertises an extension.
    pub(crate) fn from_hello(lines: &[String]) -> Self {
        let (domain, greeting) = lines.first().map_or(("", ""), |first| {
            first
                .trim()
                .split_once(char::is_whitespace)
                .map_or((first.trim(), ""), |(d, g)| (d, g.trim()))
        });
        Self {
            domain: domain.to_string(),
            greeting: greeting.to_string(),
            extensions: lines.iter().skip(1).map(|l| Extension::parse(l)).collect(),
        }
    }

    /// Checks if an extension keyword is advertised.
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.keyword().eq_ignore_ascii_case(keyword))
    }

    /// Checks if STARTTLS is supported.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// Returns the maximum message size, if advertised.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => *size,
            _ => None,
        })
    }

    /// Returns the advertised authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> &[String] {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Checks if an authentication mechanism is advertised.
    #[must_use]
    pub fn has_auth(&self, mechanism: &str) -> bool {
        self.auth_mechanisms()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mechanism))
    }
}

/// Connects to an SMTP server and reads the greeting.
///
/// # Errors
///
/// Returns an error if the connection fails or the server is not ready.
pub async fn connect(config: &Config) -> Result<Client<Connected>> {
    let stream = hermeneutics_net::connect(config, config.port_or(DEFAULT_PORT, DEFAULT_TLS_PORT)).await?;
    Client::new(Transport::new(stream).with_timeout(config.read_timeout), Dialect::Smtp).await
}

/// Connects to an LMTP server over TCP and reads the greeting.
///
/// # Errors
///
/// Returns an error if the connection fails or the server is not ready.
pub async fn connect_lmtp(config: &Config) -> Result<Client<Connected>> {
    let stream = hermeneutics_net::connect(config, config.port_or(LMTP_PORT, LMTP_PORT)).await?;
    Client::new(Transport::new(stream).with_timeout(config.read_timeout), Dialect::Lmtp).await
}

/// Connects to an LMTP server on a Unix domain socket.
///
/// # Errors
///
/// Returns an error if the socket cannot be opened or the server is not
/// ready.
#[cfg(unix)]
pub async fn connect_lmtp_unix(path: impl AsRef<Path>) -> Result<Client<Connected, Stream>> {
    let stream = hermeneutics_net::connect_unix(path).await?;
    Client::new(Transport::new(stream), Dialect::Lmtp).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_server_info_from_hello() {
        let lines: Vec<String> = ["example.com Hi", "SIZE 1000000", "AUTH PLAIN LOGIN", "STARTTLS"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let info = ServerInfo::from_hello(&lines);
        assert_eq!(info.domain, "example.com");
        assert_eq!(info.greeting, "Hi");
        assert_eq!(info.max_message_size(), Some(1_000_000));
        assert_eq!(info.auth_mechanisms(), ["PLAIN", "LOGIN"]);
        assert!(info.has_auth("login"));
        assert!(info.supports_starttls());
        assert!(info.supports("size"));
        assert!(!info.supports("CHUNKING"));
    }

    #[test]
    fn test_server_info_single_line() {
        let info = ServerInfo::from_hello(&["mx.example.org".to_string()]);
        assert_eq!(info.domain, "mx.example.org");
        assert_eq!(info.greeting, "");
        assert!(info.extensions.is_empty());
        assert!(info.auth_mechanisms().is_empty());
    }
}
