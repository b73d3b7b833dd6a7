//! # hermeneutics-imap
//!
//! IMAP client library implementing the client side of RFC 3501.
//!
//! ## Features
//!
//! - **Type-state sessions**: mailbox commands exist only after login,
//!   message commands only with a mailbox selected
//! - **Response grammar**: tagged, untagged and continuation responses with
//!   nested lists, quoted strings and `{n}` literals
//! - **Unsolicited responses**: a background watcher drains untagged data
//!   between commands; nothing the server pushes is lost
//! - **Authentication**: LOGIN and AUTHENTICATE with PLAIN, LOGIN or CRAM-MD5
//! - **IDLE**: push notifications per RFC 2177
//! - **Mailbox names**: modified UTF-7 on the wire, UTF-8 in the API
//!
//! ## Quick Start
//!
//! ```ignore
//! use hermeneutics_imap::{Config, SequenceSet, connect};
//!
//! let config = Config::new("imap.example.com");
//! let client = connect(&config).await?;
//! let client = client.authenticate("user", "password").await?;
//!
//! let (mut client, status) = client.select("INBOX").await?;
//! println!("{} messages", status.exists);
//!
//! for fetch in client.fetch(&SequenceSet::from(1..=10), &["FLAGS", "UID"]).await? {
//!     println!("{}: {:?}", fetch.number, fetch.flags());
//! }
//! for update in client.take_unsolicited() {
//!     println!("server says {}", update.name());
//! }
//! client.logout().await?;
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command construction and serialization
//! - [`connection`]: client, watcher and IDLE
//! - [`parser`]: response grammar
//! - [`types`]: response and mailbox types
//! - [`utf7`]: modified UTF-7 for mailbox names

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;
pub mod utf7;

pub use command::{Arg, Command, TagGenerator};
pub use connection::{
    Authenticated, Authorized, Client, DEFAULT_PORT, DEFAULT_TLS_PORT, IdleEvent, IdleHandle,
    NotAuthenticated, Selected, connect,
};
pub use error::{Error, Result};
pub use hermeneutics_net::sasl::Mechanism;
pub use hermeneutics_net::{Config, ConfigBuilder, Security, TlsVerify};
pub use parser::parse_response;
pub use types::{
    Fetch, ListEntry, MailboxStatus, Response, SeqNumber, SequenceSet, Status, StatusResponse,
    Untagged, Value,
};
