//! # hermeneutics-smtp
//!
//! SMTP (RFC 5321) and LMTP (RFC 2033) client library.
//!
//! ## Features
//!
//! - The client type tracks the session phase, so `data()` before
//!   `rcpt_to()` does not compile
//! - EHLO, LHLO, HELO, MAIL FROM, RCPT TO, DATA, BDAT, RSET, NOOP, HELP,
//!   AUTH, STARTTLS
//! - **LMTP**: one delivery reply per accepted recipient, TCP or Unix socket
//! - **Authentication**: PLAIN, LOGIN, CRAM-MD5
//! - **Strict replies**: malformed lines, stray continuation lines and data
//!   left over after a reply are reported as errors
//!
//! ## Quick Start
//!
//! ```ignore
//! use hermeneutics_smtp::{Address, Config, Security};
//! use hermeneutics_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> hermeneutics_smtp::Result<()> {
//!     let config = Config::builder("mx.example.org")
//!         .port(587)
//!         .security(Security::StartTls)
//!         .build();
//!     let client = connect(&config).await?
//!         .ehlo("laptop.example.org").await?
//!         .starttls(&config).await?
//!         .auth_plain("jane", "s3cret").await?;
//!
//!     let client = client
//!         .mail_from(Address::new("jane@example.org")?).await?
//!         .rcpt_to(Address::new("bob@example.net")?).await?
//!         .data().await?
//!         .send_message(b"Subject: hi\r\n\r\nsee you at eight\r\n").await?;
//!
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Connected ── ehlo()/lhlo()/helo() ──→ Greeted ── auth() ──→ Authenticated
//!                                          │                      │
//!                                          └────── mail_from() ───┘
//!                                                     │
//!            MailTransaction ── rcpt_to() ──→ RecipientAdded ── data() ──→ Data
//!                                                     │                     │
//!                        Greeted ←──────── bdat() ────┘   send_message() ───┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command lines
//! - [`connection`]: the client and its session states
//! - [`parser`]: Reply line parser
//! - [`types`]: envelope addresses, EHLO extensions, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

#[cfg(unix)]
pub use connection::connect_lmtp_unix;
pub use connection::{
    Authenticated, Client, Connected, DEFAULT_PORT, DEFAULT_TLS_PORT, Data, Dialect, Greeted,
    LMTP_PORT, MailTransaction, Ready, RecipientAdded, ServerInfo, SmtpConnection, connect,
    connect_lmtp,
};
pub use error::{Error, Refused, Result};
pub use hermeneutics_net::sasl::Mechanism;
pub use hermeneutics_net::{Config, ConfigBuilder, Security, TlsVerify};
pub use types::{Address, Extension, Reply, ReplyCode, ReplyKind};
