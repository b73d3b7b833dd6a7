//! SASL authentication mechanisms.
//!
//! Implements:
//! - PLAIN (RFC 4616) - one-shot username/password payload
//! - LOGIN - username and password sent in answer to two challenges
//! - CRAM-MD5 (RFC 2195) - HMAC-MD5 of the server challenge
//!
//! The protocols differ only in how challenges are framed (`334 ...` in
//! SMTP, `+ ...` in IMAP); [`Exchange`] answers the base64 challenge text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::Md5;
use std::fmt::Write as _;

use crate::{Error, Result};

/// Supported SASL mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mechanism {
    /// PLAIN.
    Plain,
    /// LOGIN.
    Login,
    /// CRAM-MD5.
    CramMd5,
}

impl Mechanism {
    /// The mechanism name as sent on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
            Self::CramMd5 => "CRAM-MD5",
        }
    }

    /// Parses a mechanism name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        [Self::Plain, Self::Login, Self::CramMd5]
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// Picks the strongest mechanism out of those a server offers.
    #[must_use]
    pub fn preferred<'a>(offered: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        offered.into_iter().filter_map(Self::parse).min_by_key(|m| match m {
            Self::CramMd5 => 0,
            Self::Plain => 1,
            Self::Login => 2,
        })
    }
}

impl std::fmt::Display for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Generates the PLAIN response: base64 of `\0user\0password`.
#[must_use]
pub fn plain_response(username: &str, password: &str) -> String {
    STANDARD.encode(format!("\0{username}\0{password}"))
}

/// Generates the CRAM-MD5 response to a base64 challenge.
///
/// # Errors
///
/// Returns an error if the challenge is not valid base64.
pub fn cram_md5_response(username: &str, password: &str, challenge: &str) -> Result<String> {
    let challenge = decode(challenge)?;
    let mut mac = Hmac::<Md5>::new_from_slice(password.as_bytes())
        .map_err(|e| Error::Sasl(e.to_string()))?;
    mac.update(&challenge);
    let digest = mac.finalize().into_bytes();
    Ok(STANDARD.encode(format!("{username} {}", hex(&digest))))
}

/// Lower-case hex representation.
#[must_use]
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| Error::Sasl(format!("invalid challenge: {e}")))
}

/// One authentication exchange: answers challenges in order.
#[derive(Debug, Clone)]
pub struct Exchange {
    mechanism: Mechanism,
    username: String,
    password: String,
    step: usize,
}

impl Exchange {
    /// Starts an exchange.
    #[must_use]
    pub fn new(mechanism: Mechanism, username: &str, password: &str) -> Self {
        Self {
            mechanism,
            username: username.to_string(),
            password: password.to_string(),
            step: 0,
        }
    }

    /// The mechanism.
    #[must_use]
    pub const fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// The payload sent along with the command, if the mechanism has one.
    ///
    /// Consumes the first step for PLAIN.
    pub fn initial_response(&mut self) -> Option<String> {
        match self.mechanism {
            Mechanism::Plain if self.step == 0 => {
                self.step = 1;
                Some(plain_response(&self.username, &self.password))
            }
            _ => None,
        }
    }

    /// Answers the next server challenge (the base64 text after the prompt).
    ///
    /// # Errors
    ///
    /// Returns an error if the server asks for more than the mechanism
    /// provides or sends an undecodable challenge.
    pub fn respond(&mut self, challenge: &str) -> Result<String> {
        let answer = match (self.mechanism, self.step) {
            (Mechanism::Plain, 0) => plain_response(&self.username, &self.password),
            (Mechanism::Login, 0) => STANDARD.encode(&self.username),
            (Mechanism::Login, 1) => STANDARD.encode(&self.password),
            (Mechanism::CramMd5, 0) => cram_md5_response(&self.username, &self.password, challenge)?,
            (mechanism, step) => {
                return Err(Error::Sasl(format!(
                    "unexpected challenge #{} for {mechanism}",
                    step + 1
                )));
            }
        };
        self.step += 1;
        Ok(answer)
    }
}
