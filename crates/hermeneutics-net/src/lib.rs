//! # hermeneutics-net
//!
//! Line-oriented client transport shared by the SMTP, LMTP, POP3 and IMAP
//! clients.
//!
//! ## Features
//!
//! - **Streams**: TCP, implicit TLS, STARTTLS upgrade, Unix domain sockets
//! - **TLS verification**: web PKI roots, a CA file, or none at all
//! - **Framing**: CRLF lines, raw blocks, read timeouts
//! - **Protocol checks**: detect input left over after a response
//! - **SASL**: PLAIN, LOGIN and CRAM-MD5 exchanges
//!
//! ## Quick Start
//!
//! ```ignore
//! use hermeneutics_net::{Config, Security, Transport, connect};
//!
//! let config = Config::builder("mail.example.com")
//!     .security(Security::Implicit)
//!     .build();
//! let stream = connect(&config, config.port_or(25, 465)).await?;
//! let mut transport = Transport::new(stream).with_timeout(config.read_timeout);
//!
//! let greeting = transport.read_line_lossy().await?;
//! transport.write_line("QUIT").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod stream;
mod transport;

pub mod sasl;

pub use config::{Config, ConfigBuilder, Security, TlsVerify};
pub use error::{Error, Result};
#[cfg(unix)]
pub use stream::connect_unix;
pub use stream::{Stream, connect, tls_connector};
pub use transport::{MAX_LINE_LENGTH, Transport};
