//! # hermeneutics-mime
//!
//! Mail message model: headers, typed header values, addresses and MIME
//! multipart bodies.
//!
//! ## Features
//!
//! - **Message parsing**: Split raw mail into headers and body, multipart aware
//! - **Typed headers**: Addresses, dates, message ids, counts, content types
//! - **Header encoding**: RFC 2047 encoded words, RFC 2231 parameters, folding
//! - **Multipart**: Byte-exact parts with collision-free boundaries
//! - **Mbox envelopes**: The `From ` line of a stored mail
//!
//! ## Quick Start
//!
//! ### Parsing Messages
//!
//! ```ignore
//! use hermeneutics_mime::Message;
//!
//! let raw = b"From: Fred <fred@example.com>\r\n\
//!             Subject: =?UTF-8?Q?Gr=C3=BC=C3=9Fe?=\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw)?;
//! println!("Subject: {}", message.headers().subject().map(ToString::to_string).unwrap_or_default());
//! println!("Body: {}", message.body_decoded()?.text());
//! ```
//!
//! ### Building Messages
//!
//! ```ignore
//! use hermeneutics_mime::{AddrList, Message, Timestamp};
//!
//! let mut message = Message::new();
//! message
//!     .headers_mut()
//!     .add("From", AddrList::parse("Fred <fred@example.com>"))
//!     .add("Subject", "Grüße aus Köln")
//!     .add("Date", Timestamp::now());
//! message.set_body_text("Hello, World!");
//!
//! let bytes = message.to_bytes();
//! ```
//!
//! ### Addresses
//!
//! ```ignore
//! use hermeneutics_mime::AddrList;
//!
//! let list = AddrList::parse("friends: \"Flintstone, Fred\" <fred@example.com>, barney@example.com;");
//! assert!(list.has("Fred@Example.com"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod header;
mod mail;
mod message;
mod multipart;

pub mod addrs;
pub mod encoding;
pub mod escape;
pub mod types;

pub use addrs::{Addr, AddrList, Group};
pub use error::{Error, Result};
pub use header::{Header, Headers, build_name};
pub use mail::Mail;
pub use message::{Body, DecodedBody, Message, TransferEncoding};
pub use multipart::{Multipart, generate_boundary};
pub use types::{
    ContentType, Contents, Count, Dictionary, FieldKind, HeaderValue, Id, IdList, PlainText,
    Timestamp,
};
