//! Encoding schemes for internet text.
//!
//! - [`Entities`]: HTML character entities (`&amp;`, `&auml;`)
//! - [`UrlText`]: percent encoding (`%2D`, `+` for space)
//! - [`HeaderWord`]: RFC 2047 encoded words (`=?UTF-8?Q?=C3=B6?=`)

mod entities;
mod header_word;
mod url;

pub use entities::Entities;
pub use header_word::HeaderWord;
pub(crate) use header_word::{Fragment, fragments};
pub use url::UrlText;

use charset::Charset;

/// Decodes bytes in the named charset into a string.
///
/// Returns `None` when the label is unknown. A `*lang` suffix (RFC 2231)
/// on the label is ignored.
#[must_use]
pub fn decode_charset(label: &str, bytes: &[u8]) -> Option<String> {
    let label = label.split('*').next().unwrap_or(label).trim();
    if label.eq_ignore_ascii_case("us-ascii") || label.eq_ignore_ascii_case("unknown") {
        return Some(String::from_utf8_lossy(bytes).into_owned());
    }
    let charset = Charset::for_label(label.as_bytes())?;
    let (text, _malformed) = charset.decode_without_bom_handling(bytes);
    Some(text.into_owned())
}

/// Decodes bytes in the named charset, falling back to lossy UTF-8.
#[must_use]
pub fn decode_text(bytes: &[u8], label: Option<&str>) -> String {
    label
        .and_then(|l| decode_charset(l, bytes))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1() {
        assert_eq!(decode_charset("iso-8859-1", b"gr\xfc\xdf"), Some("grüß".to_string()));
    }

    #[test]
    fn test_decode_with_language_suffix() {
        assert_eq!(decode_charset("utf-8*de", "ä".as_bytes()), Some("ä".to_string()));
    }

    #[test]
    fn test_decode_unknown_label() {
        assert_eq!(decode_charset("x-no-such-charset", b"abc"), None);
        assert_eq!(decode_text(b"abc", Some("x-no-such-charset")), "abc");
    }
}
