//! Content fields: a caption followed by parameters.
//!
//! `Content-Disposition: attachment; filename=x.pdf` and
//! `Content-Type: text/plain; charset=utf-8` share this shape.

use super::dictionary::{Dictionary, join_parts};
use crate::error::{Error, Result};
use std::fmt;

/// A caption with a parameter dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contents {
    caption: String,
    params: Dictionary,
}

impl Contents {
    /// Creates contents with the given caption and no parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the caption contains `;` or `=`.
    pub fn new(caption: impl Into<String>) -> Result<Self> {
        let caption = caption.into();
        if caption.contains([';', '=']) {
            return Err(Error::InvalidHeader(format!("invalid content caption '{caption}'")));
        }
        Ok(Self {
            caption,
            params: Dictionary::new(),
        })
    }

    /// Parses `caption; k=v; ...`.
    ///
    /// # Errors
    ///
    /// Returns an error if the caption is malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (caption, rest) = raw.split_once(';').unwrap_or((raw, ""));
        let mut contents = Self::new(caption.trim())?;
        contents.params = Dictionary::parse(rest);
        Ok(contents)
    }

    /// The caption, e.g. `attachment`.
    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// The parameters.
    #[must_use]
    pub const fn params(&self) -> &Dictionary {
        &self.params
    }

    /// Mutable access to the parameters.
    pub const fn params_mut(&mut self) -> &mut Dictionary {
        &mut self.params
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(key, value);
        self
    }

    /// Case-insensitive caption comparison.
    #[must_use]
    pub fn is(&self, caption: &str) -> bool {
        self.caption.eq_ignore_ascii_case(caption)
    }

    /// Header wire words.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        let mut parts = vec![self.caption.clone()];
        parts.extend(self.params.encoded_parts());
        join_parts(parts)
    }
}

impl fmt::Display for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![self.caption.clone()];
        parts.extend(self.params.quoted_parts());
        f.write_str(&parts.join("; "))
    }
}

/// `Content-Type`: a `type/subtype` caption and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentType(Contents);

impl ContentType {
    /// `main/sub` without parameters.
    #[must_use]
    pub fn new(main_type: &str, sub_type: &str) -> Self {
        Self(Contents {
            caption: format!("{main_type}/{sub_type}"),
            params: Dictionary::new(),
        })
    }

    /// `text/plain; charset=utf-8`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// `text/html; charset=utf-8`.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// `multipart/mixed` separated by `boundary`.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// `multipart/alternative` separated by `boundary`.
    #[must_use]
    pub fn multipart_alternative(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "alternative").with_parameter("boundary", boundary)
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self(self.0.with_parameter(key, value))
    }

    /// Reads a field body such as `text/plain; charset="iso-8859-1"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the `type/subtype` part is malformed.
    pub fn parse(raw: &str) -> Result<Self> {
        let contents = Contents::parse(raw)?;
        match contents.caption.split_once('/') {
            Some((main, sub)) if !main.trim().is_empty() && !sub.trim().is_empty() => {
                Ok(Self(contents))
            }
            _ => Err(Error::InvalidContentType(raw.trim().to_string())),
        }
    }

    /// `type/subtype` as written.
    #[must_use]
    pub fn fulltype(&self) -> &str {
        &self.0.caption
    }

    /// The part before the slash.
    #[must_use]
    pub fn main_type(&self) -> &str {
        self.0.caption.split_once('/').map_or(&self.0.caption, |(m, _)| m)
    }

    /// The part after the slash.
    #[must_use]
    pub fn sub_type(&self) -> &str {
        self.0.caption.split_once('/').map_or("", |(_, s)| s)
    }

    /// The parameters.
    #[must_use]
    pub const fn params(&self) -> &Dictionary {
        &self.0.params
    }

    /// Mutable access to the parameters.
    pub const fn params_mut(&mut self) -> &mut Dictionary {
        &mut self.0.params
    }

    /// `charset`, used when decoding text bodies.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.0.get("charset")
    }

    /// `boundary`, required for multipart bodies.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.0.get("boundary")
    }

    /// True for any `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type().eq_ignore_ascii_case("multipart")
    }

    /// True for any `text/*`.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type().eq_ignore_ascii_case("text")
    }

    /// Case-insensitive `type/subtype` comparison.
    #[must_use]
    pub fn is(&self, fulltype: &str) -> bool {
        self.0.is(fulltype)
    }

    /// Header wire words.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        self.0.encode()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
