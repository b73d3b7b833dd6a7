//! Mails as stored in mbox files: a message behind a `From ` line.

use crate::addrs::{Addr, AddrList};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::message::{Body, Message};
use chrono::Utc;
use std::ops::{Deref, DerefMut};

const FROM_PREFIX: &[u8] = b"From ";

/// A message with an optional mbox envelope line.
#[derive(Debug, Clone, Default)]
pub struct Mail {
    from_line: Option<String>,
    message: Message,
}

impl Mail {
    /// Creates an empty mail without envelope line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a message.
    #[must_use]
    pub const fn from_message(message: Message) -> Self {
        Self {
            from_line: None,
            message,
        }
    }

    /// Parses a mail, taking a leading `From ` line as the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the message does not parse.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let (from_line, rest) = if input.starts_with(FROM_PREFIX) {
            let end = input.iter().position(|&b| b == b'\n').map_or(input.len(), |i| i + 1);
            let line = String::from_utf8_lossy(&input[..end]);
            (Some(line.trim_end().to_string()), &input[end..])
        } else {
            (None, input)
        };
        Ok(Self {
            from_line,
            message: Message::parse(rest)?,
        })
    }

    /// The envelope line, if one was read or built.
    #[must_use]
    pub fn from_line(&self) -> Option<&str> {
        self.from_line.as_deref()
    }

    /// The wrapped message.
    #[must_use]
    pub const fn message(&self) -> &Message {
        &self.message
    }

    /// Unwraps the message.
    #[must_use]
    pub fn into_message(self) -> Message {
        self.message
    }

    /// All `To:`, `Cc:` and `Bcc:` addresses.
    #[must_use]
    pub fn receivers(&self) -> AddrList {
        addresses_of(self.message.headers(), &["To", "Cc", "Bcc"])
    }

    /// Builds the envelope line from the headers unless one is present.
    ///
    /// The sender comes from `From:` or `Return-Path:`, preferring an
    /// address with a domain. The time is the `Date:` field or now, in UTC.
    ///
    /// # Errors
    ///
    /// Returns an error if neither field carries an address.
    pub fn ensure_from_line(&mut self) -> Result<&str> {
        if self.from_line.is_none() {
            let headers = self.message.headers();
            let senders = addresses_of(headers, &["From", "Return-Path"]);
            let mut sender: Option<&Addr> = None;
            for addr in &senders {
                if sender.is_none_or(|s| !s.mail().contains('@')) {
                    sender = Some(addr);
                }
            }
            let sender = sender.ok_or_else(|| Error::InvalidAddress("no From: field present".to_string()))?;
            let time = headers
                .date()
                .map_or_else(Utc::now, |d| d.datetime().with_timezone(&Utc))
                .format("%a %b %e %H:%M:%S %Y");
            self.from_line = Some(format!("From {} {time}", sender.plain()));
        }
        Ok(self.from_line.as_deref().unwrap_or_default())
    }

    /// Serializes the mail with its envelope line.
    ///
    /// Mails live in mbox files, so the result always ends in a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if no envelope line can be built.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = self.ensure_from_line()?.as_bytes().to_vec();
        out.push(b'\n');
        out.extend(self.message.to_bytes());
        if !out.ends_with(b"\n") {
            out.push(b'\n');
        }
        Ok(out)
    }
}

impl Deref for Mail {
    type Target = Message;

    fn deref(&self) -> &Message {
        &self.message
    }
}

impl DerefMut for Mail {
    fn deref_mut(&mut self) -> &mut Message {
        &mut self.message
    }
}

impl From<Message> for Mail {
    fn from(message: Message) -> Self {
        Self::from_message(message)
    }
}

impl From<(Headers, Body)> for Mail {
    fn from((headers, body): (Headers, Body)) -> Self {
        Self::from_message(Message::from_parts(headers, body))
    }
}

fn addresses_of(headers: &Headers, names: &[&str]) -> AddrList {
    names
        .iter()
        .flat_map(|name| headers.get_all(name))
        .filter_map(|h| h.contents().ok().and_then(|v| v.as_addr_list()).cloned())
        .flatten()
        .collect()
}
