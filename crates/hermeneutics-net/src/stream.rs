//! Stream types for mail connections.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::config::{Config, Security, TlsVerify};
use crate::{Error, Result};

/// A stream that can be plaintext TCP, TLS or a Unix domain socket.
#[derive(Debug)]
pub enum Stream {
    /// Plaintext TCP stream.
    Tcp(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
    /// Unix domain socket, as used for local LMTP delivery.
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    /// Upgrades a plaintext TCP stream to TLS after STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is not plain TCP or the handshake fails.
    pub async fn upgrade(self, config: &Config) -> Result<Self> {
        match self {
            Self::Tcp(tcp) => {
                let connector = tls_connector(&config.tls_verify)?;
                let tls = connector.connect(server_name(&config.host)?, tcp).await?;
                debug!(host = %config.host, "TLS established after STARTTLS");
                Ok(Self::Tls(Box::new(tls)))
            }
            _ => Err(Error::InvalidState("stream cannot be upgraded to TLS".to_string())),
        }
    }

    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
            #[cfg(unix)]
            Self::Unix(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Connects to `config.host` on the given port.
///
/// With [`Security::Implicit`] the TLS handshake happens right away;
/// otherwise the stream stays plain (STARTTLS is up to the protocol).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails or times out.
pub async fn connect(config: &Config, port: u16) -> Result<Stream> {
    let addr = format!("{}:{port}", config.host);
    let tcp = match config.connect_timeout {
        Some(limit) => tokio::time::timeout(limit, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout(limit))??,
        None => TcpStream::connect(&addr).await?,
    };
    debug!(%addr, security = ?config.security, "connected");

    if config.security == Security::Implicit {
        let connector = tls_connector(&config.tls_verify)?;
        let tls = connector.connect(server_name(&config.host)?, tcp).await?;
        return Ok(Stream::Tls(Box::new(tls)));
    }
    Ok(Stream::Tcp(tcp))
}

/// Connects to a Unix domain socket.
///
/// # Errors
///
/// Returns an error if the socket cannot be opened.
#[cfg(unix)]
pub async fn connect_unix(path: impl AsRef<Path>) -> Result<Stream> {
    let path = path.as_ref();
    let stream = UnixStream::connect(path).await?;
    debug!(path = %path.display(), "connected");
    Ok(Stream::Unix(stream))
}

/// Creates a TLS connector for the given verification mode.
///
/// # Errors
///
/// Returns an error if a CA file cannot be read or holds no usable
/// certificate.
pub fn tls_connector(verify: &TlsVerify) -> Result<TlsConnector> {
    let builder = rustls::ClientConfig::builder();
    let config = match verify {
        TlsVerify::None => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAny::new()))
            .with_no_client_auth(),
        TlsVerify::Peer => builder
            .with_root_certificates(rustls::RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            })
            .with_no_client_auth(),
        TlsVerify::CaFile(path) => builder
            .with_root_certificates(load_ca_file(path)?)
            .with_no_client_auth(),
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

fn load_ca_file(path: &Path) -> Result<rustls::RootCertStore> {
    let certificate_error = |e: rustls::pki_types::pem::Error| {
        Error::Certificate(format!("{}: {e}", path.display()))
    };
    let mut store = rustls::RootCertStore::empty();
    for cert in CertificateDer::pem_file_iter(path).map_err(certificate_error)? {
        store.add(cert.map_err(certificate_error)?)?;
    }
    if store.is_empty() {
        return Err(Error::Certificate(format!("{}: no certificates", path.display())));
    }
    Ok(store)
}

fn server_name(host: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(host.to_string()).map_err(|e| Error::InvalidDnsName(format!("{host}: {e}")))
}

/// Verifier that accepts every certificate but still checks handshake
/// signatures.
#[derive(Debug)]
struct AcceptAny(Arc<CryptoProvider>);

impl AcceptAny {
    fn new() -> Self {
        let provider = CryptoProvider::get_default()
            .cloned()
            .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()));
        Self(provider)
    }
}

impl ServerCertVerifier for AcceptAny {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
