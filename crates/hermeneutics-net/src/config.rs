//! Where and how to connect.

use std::path::PathBuf;
use std::time::Duration;

/// When TLS starts, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain TCP throughout.
    None,
    /// Plain TCP until the client sends STARTTLS.
    StartTls,
    /// Handshake right after connecting (ports 465, 993, 995).
    #[default]
    Implicit,
}

/// Certificate checking for the TLS handshake.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsVerify {
    /// Anything goes. Only for test servers with self-signed certificates.
    None,
    /// The bundled web PKI roots.
    #[default]
    Peer,
    /// Roots from a PEM bundle, for private CAs.
    CaFile(PathBuf),
}

/// Connection settings common to SMTP, LMTP, POP3 and IMAP.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to connect to, also the TLS server name.
    pub host: String,
    /// Explicit port; see [`Config::port_or`].
    pub port: Option<u16>,
    /// When TLS starts.
    pub security: Security,
    /// Certificate checking.
    pub tls_verify: TlsVerify,
    /// Limit for TCP connect, 30 seconds unless changed.
    pub connect_timeout: Option<Duration>,
    /// Limit for each read. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Config {
    /// Implicit TLS with peer verification and no read timeout.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::default(),
            tls_verify: TlsVerify::default(),
            connect_timeout: Some(Duration::from_secs(30)),
            read_timeout: None,
        }
    }

    /// Starts from [`Config::new`] and adjusts.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder(Self::new(host))
    }

    /// The explicit port, else `plain` or `tls` depending on whether the
    /// connection opens in the clear.
    #[must_use]
    pub fn port_or(&self, plain: u16, tls: u16) -> u16 {
        match (self.port, self.security) {
            (Some(port), _) => port,
            (None, Security::Implicit) => tls,
            (None, Security::None | Security::StartTls) => plain,
        }
    }
}

/// Chained setters over a [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder(Config);

impl ConfigBuilder {
    /// Same as [`Config::builder`].
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Config::builder(host)
    }

    /// Overrides the protocol's default port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.0.port = Some(port);
        self
    }

    /// Chooses when TLS starts.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.0.security = security;
        self
    }

    /// Chooses the trust roots.
    #[must_use]
    pub fn tls_verify(mut self, verify: TlsVerify) -> Self {
        self.0.tls_verify = verify;
        self
    }

    /// Limits the TCP connect.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.0.connect_timeout = Some(timeout);
        self
    }

    /// Limits every single read.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.0.read_timeout = Some(timeout);
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports_follow_security() {
        assert_eq!(Config::new("mx.example.org").port_or(25, 465), 465);

        let starttls = Config::builder("mx.example.org")
            .security(Security::StartTls)
            .build();
        assert_eq!(starttls.port_or(143, 993), 143);

        let explicit = Config::builder("mx.example.org").port(2525).build();
        assert_eq!(explicit.port_or(25, 465), 2525);
    }

    #[test]
    fn builder_sets_everything() {
        let config = Config::builder("imap.example.org")
            .security(Security::None)
            .tls_verify(TlsVerify::CaFile("/etc/ssl/ca.pem".into()))
            .connect_timeout(Duration::from_secs(10))
            .read_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.host, "imap.example.org");
        assert_eq!(config.security, Security::None);
        assert_eq!(config.tls_verify, TlsVerify::CaFile("/etc/ssl/ca.pem".into()));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn defaults() {
        let config = Config::new("pop.example.org");
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.tls_verify, TlsVerify::Peer);
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(30)));
        assert!(config.read_timeout.is_none());
    }
}
