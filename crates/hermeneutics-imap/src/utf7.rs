//! Modified UTF-7 for mailbox names (RFC 3501, section 5.1.3).
//!
//! Printable ASCII stands for itself, except `&`, which becomes `&-`.
//! Runs of other characters are written as `&`, the base64 of their
//! UTF-16BE form (with `,` in place of `/` and no padding), and `-`.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::{Error, Result};

const MUTF7: GeneralPurpose = GeneralPurpose::new(
    &IMAP_MUTF7,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone),
);

/// Encodes a mailbox name.
#[must_use]
pub fn encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut run: Vec<u16> = Vec::new();
    for c in name.chars() {
        if (' '..='~').contains(&c) {
            flush(&mut out, &mut run);
            if c == '&' {
                out.push_str("&-");
            } else {
                out.push(c);
            }
        } else {
            let mut buf = [0u16; 2];
            run.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush(&mut out, &mut run);
    out
}

fn flush(out: &mut String, run: &mut Vec<u16>) {
    if run.is_empty() {
        return;
    }
    let bytes: Vec<u8> = run.iter().flat_map(|unit| unit.to_be_bytes()).collect();
    out.push('&');
    out.push_str(&MUTF7.encode(bytes));
    out.push('-');
    run.clear();
}

/// Decodes a mailbox name.
///
/// # Errors
///
/// Returns [`Error::Parse`] for an unterminated shift sequence, bad base64
/// or UTF-16 that does not form characters.
pub fn decode(name: &str) -> Result<String> {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;
    let mut position = 0;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let shifted = &rest[start + 1..];
        let end = shifted
            .find('-')
            .ok_or_else(|| Error::parse(position + start, "unterminated shift sequence"))?;
        if end == 0 {
            out.push('&');
        } else {
            decode_run(&shifted[..end], position + start, &mut out)?;
        }
        let consumed = start + end + 2;
        position += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

fn decode_run(encoded: &str, position: usize, out: &mut String) -> Result<()> {
    let bytes = MUTF7
        .decode(encoded)
        .map_err(|e| Error::parse(position, format!("invalid modified base64: {e}")))?;
    if bytes.len() % 2 != 0 {
        return Err(Error::parse(position, "odd number of UTF-16 bytes"));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    for c in char::decode_utf16(units) {
        out.push(c.map_err(|e| Error::parse(position, e.to_string()))?);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(encode("INBOX"), "INBOX");
        assert_eq!(encode("Sent Items"), "Sent Items");
        assert_eq!(decode("Sent Items").unwrap(), "Sent Items");
    }

    #[test]
    fn test_ampersand() {
        assert_eq!(encode("Tom & Jerry"), "Tom &- Jerry");
        assert_eq!(decode("Tom &- Jerry").unwrap(), "Tom & Jerry");
    }

    #[test]
    fn test_non_ascii() {
        assert_eq!(encode("Entwürfe"), "Entw&APw-rfe");
        assert_eq!(decode("Entw&APw-rfe").unwrap(), "Entwürfe");
    }

    #[test]
    fn test_rfc3501_example() {
        let name = "~peter/mail/\u{53f0}\u{5317}/\u{65e5}\u{672c}\u{8a9e}";
        assert_eq!(encode(name), "~peter/mail/&U,BTFw-/&ZeVnLIqe-");
        assert_eq!(decode("~peter/mail/&U,BTFw-/&ZeVnLIqe-").unwrap(), name);
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(decode(&encode("mail \u{1f4e7}")).unwrap(), "mail \u{1f4e7}");
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            decode("abc&AMk"),
            Err(Error::Parse { position: 3, .. })
        ));
        assert!(decode("&!!!-").is_err());
        // A lone high surrogate.
        assert!(decode("&2D0-").is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(name in "\\PC*") {
            let encoded = encode(&name);
            prop_assert!(encoded.bytes().all(|b| (b' '..=b'~').contains(&b)));
            prop_assert_eq!(decode(&encoded).unwrap(), name);
        }
    }
}
