//! # hermeneutics-pop3
//!
//! POP3 client library implementing RFC 1939 and the CAPA extension of
//! RFC 2449.
//!
//! ## Features
//!
//! - **Type-state sessions**: transaction commands exist only after login
//! - **Authentication**: APOP when the greeting carries a timestamp,
//!   USER/PASS otherwise
//! - **Listings**: STAT, LIST and UIDL for one message or all of them
//! - **Retrieval**: RETR and TOP with dot-unstuffing
//! - **Strict responses**: data left over after a response is an error
//!
//! ## Quick Start
//!
//! ```ignore
//! use hermeneutics_pop3::{Config, connect};
//!
//! let config = Config::new("pop.example.com");
//! let client = connect(&config).await?;
//! let mut client = client.authenticate("user", "password").await?;
//!
//! let stat = client.stat().await?;
//! for entry in client.list(None).await? {
//!     let message = client.retr(entry.number).await?;
//!     println!("{} bytes", message.len());
//! }
//! client.quit().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Authorization, Client, DEFAULT_PORT, DEFAULT_TLS_PORT, Transaction, apop_digest, connect,
};
pub use error::{Error, Result};
pub use hermeneutics_net::{Config, ConfigBuilder, Security, TlsVerify};
pub use types::{Capabilities, ListEntry, Stat, UidEntry};
