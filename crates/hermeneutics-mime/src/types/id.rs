//! Message identifiers (`Message-ID`, `In-Reply-To`, `References`).

use crate::error::{Error, Result};
use chrono::Local;
use rand::Rng;
use regex::Regex;
use std::fmt;
use std::sync::{LazyLock, RwLock};

#[allow(clippy::unwrap_used)]
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(.*?)>").unwrap());

static DEFAULT_HOST: RwLock<Option<String>> = RwLock::new(None);

/// An angle-bracket message identifier, stored without the brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Id(String);

impl Id {
    /// Wraps an identifier given without brackets.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses the first `<...>` of a header value.
    ///
    /// A value without brackets is taken as is.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty value.
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(caps) = BRACKETED.captures(raw) {
            return Ok(Self(caps[1].to_string()));
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh id: `<timestamp>.<pid>.<random>@<host>`.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_for(&default_host())
    }

    /// Generates a fresh id for the given host.
    #[must_use]
    pub fn generate_for(host: &str) -> Self {
        let mut rng = rand::thread_rng();
        let random: String = (0..8).map(|_| char::from(rng.gen_range(b'a'..=b'z'))).collect();
        Self(format!(
            "{}.{}.{random}@{host}",
            Local::now().format("%Y%m%d%H%M%S"),
            std::process::id()
        ))
    }

    /// Sets the process-wide host used by [`Id::generate`].
    pub fn set_default_host(host: impl Into<String>) {
        if let Ok(mut slot) = DEFAULT_HOST.write() {
            *slot = Some(host.into());
        }
    }

    /// The identifier without brackets.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header wire words.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

/// The configured host, else `HOSTNAME`, else `localhost`.
fn default_host() -> String {
    DEFAULT_HOST
        .read()
        .ok()
        .and_then(|slot| slot.clone())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
        .unwrap_or_else(|| "localhost".to_string())
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// A whitespace-separated list of message ids (`References`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdList(Vec<Id>);

impl IdList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Collects every `<...>` in the header value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self(
            BRACKETED
                .captures_iter(raw)
                .map(|caps| Id(caps[1].to_string()))
                .collect(),
        )
    }

    /// Appends an id.
    pub fn push(&mut self, id: Id) {
        self.0.push(id);
    }

    /// The ids in order.
    #[must_use]
    pub fn ids(&self) -> &[Id] {
        &self.0
    }

    /// Header wire words, one per id.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for IdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode().join(" "))
    }
}
