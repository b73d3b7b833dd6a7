//! Percent encoding as used in URLs and RFC 2231 parameter values.

use std::fmt::Write as _;

/// Percent encoder with configurable treatment of spaces and 8-bit bytes.
///
/// ```
/// use hermeneutics_mime::escape::UrlText;
///
/// let utx = UrlText::new();
/// assert_eq!(utx.encode("'Stop!' said Fred."), "%27Stop%21%27+said+Fred.");
/// assert_eq!(UrlText::decode("%27Stop%21%27+said+Fred%2e"), "'Stop!' said Fred.");
/// ```
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct UrlText {
    keep_8bit: bool,
    keep_space: bool,
    mask_space: bool,
}

impl UrlText {
    /// Creates an encoder that masks everything outside `[A-Za-z0-9_.-]`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keep_8bit: false,
            keep_space: false,
            mask_space: false,
        }
    }

    /// Leaves non-ASCII characters unmasked.
    #[must_use]
    pub const fn keep_8bit(mut self, keep: bool) -> Self {
        self.keep_8bit = keep;
        self
    }

    /// Leaves spaces as they are instead of turning them into `+`.
    #[must_use]
    pub const fn keep_space(mut self, keep: bool) -> Self {
        self.keep_space = keep;
        self
    }

    /// Encodes spaces as `%20`. Takes precedence over `keep_space`.
    #[must_use]
    pub const fn mask_space(mut self, mask: bool) -> Self {
        self.mask_space = mask;
        self
    }

    /// Percent-encodes a string.
    #[must_use]
    pub fn encode(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                result.push(c);
            } else if c == ' ' && !self.mask_space {
                result.push(if self.keep_space { ' ' } else { '+' });
            } else if self.keep_8bit && !c.is_ascii() {
                result.push(c);
            } else {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    let _ = write!(result, "%{byte:02X}");
                }
            }
        }
        result
    }

    /// Decodes `+` and `%XX` sequences into raw bytes.
    #[must_use]
    pub fn decode_bytes(text: &str) -> Vec<u8> {
        unescape(text, true)
    }

    /// Decodes `%XX` sequences only, leaving `+` alone (RFC 2231 values).
    #[must_use]
    pub fn decode_percent(text: &str) -> Vec<u8> {
        unescape(text, false)
    }

    /// Decodes `+` and `%XX` sequences, interpreting the result as UTF-8.
    #[must_use]
    pub fn decode(text: &str) -> String {
        String::from_utf8_lossy(&Self::decode_bytes(text)).into_owned()
    }

    /// Encodes key/value pairs as `k=v&k2=v2`.
    #[must_use]
    pub fn encode_pairs<'a, I>(&self, pairs: I) -> String
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", self.encode(k), self.encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Splits a `k=v&k2=v2` string (`;` also separates) into decoded pairs.
    ///
    /// A key without `=` gets an empty value.
    #[must_use]
    pub fn decode_pairs(text: &str) -> Vec<(String, String)> {
        text.split(['&', ';'])
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('=') {
                Some((k, v)) => (Self::decode(k), Self::decode(v)),
                None => (Self::decode(item), String::new()),
            })
            .collect()
    }
}

fn unescape(text: &str, plus_is_space: bool) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' if plus_is_space => {
                result.push(b' ');
                i += 1;
            }
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                if let Some(byte) = hex {
                    result.push(byte);
                    i += 3;
                } else {
                    result.push(b'%');
                    i += 1;
                }
            }
            byte => {
                result.push(byte);
                i += 1;
            }
        }
    }
    result
}
