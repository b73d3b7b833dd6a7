//! Unstructured header text (`Subject`, `User-Agent`).

use crate::escape::HeaderWord;
use std::fmt;

/// Whitespace-normalized header text.
///
/// Parsing removes RFC 2047 masking and collapses whitespace runs to a
/// single space; encoding masks non-ASCII words again.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlainText(String);

impl PlainText {
    /// Creates a plain text value, normalizing its whitespace.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self(normalize(text))
    }

    /// Decodes raw header data.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self::new(&HeaderWord::decode(raw))
    }

    /// The decoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Header wire words; non-ASCII words are RFC 2047 encoded.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        HeaderWord::std()
            .encode(&self.0)
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Collapses whitespace runs into single spaces and trims both ends.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl fmt::Display for PlainText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlainText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_normalizes() {
        let text = PlainText::parse("  Re:\n    =?UTF-8?Q?Gr=C3=BC=C3=9Fe?=   aus   Berlin ");
        assert_eq!(text.as_str(), "Re: Grüße aus Berlin");
    }

    #[test]
    fn test_encode_words() {
        let text = PlainText::new("Grüße aus Berlin");
        assert_eq!(text.encode(), vec!["=?UTF-8?Q?Gr=C3=BC=C3=9Fe?=", "aus", "Berlin"]);
    }

    proptest! {
        #[test]
        fn decode_encode_is_normalize(text in "[ a-zA-Zäöü€\\t]{0,80}") {
            let encoded = PlainText::new(&text).encode().join(" ");
            let parsed = PlainText::parse(&encoded);
            prop_assert_eq!(parsed.as_str(), normalize(&text));
        }
    }
}
