//! Semicolon-separated parameter lists (`k=v; k2="v 2"`).
//!
//! Values with non-ASCII characters use the RFC 2231 extended notation
//! `key*=utf-8'lang'percent-encoded`. Parsing also joins RFC 2231
//! continuations (`key*0*=`, `key*1=`).

use crate::escape::{UrlText, decode_text};
use std::fmt;

/// Characters that force a parameter value into quotes (RFC 2045).
const TSPECIALS: &[char] = &['(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '[', ']', '/', '?', '='];

/// Ordered parameter mapping with case-insensitive keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dictionary {
    entries: Vec<(String, String)>,
}

#[derive(Debug)]
struct Segment {
    key: String,
    ord: Option<u32>,
    extended: bool,
    value: String,
}

impl Dictionary {
    /// Creates an empty dictionary.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parses `k=v; k2="quoted"; k3*=utf-8''%C3%A4`.
    ///
    /// Keys are lower-cased. A key without `=` gets an empty value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = raw.trim();

        while !rest.is_empty() {
            let eq = rest.find('=');
            let semi = rest.find(';');
            let (key, after) = match (eq, semi) {
                (Some(e), Some(s)) if s < e => {
                    push_segment(&mut segments, &rest[..s], String::new());
                    rest = rest[s + 1..].trim_start();
                    continue;
                }
                (Some(e), _) => (&rest[..e], &rest[e + 1..]),
                (None, Some(s)) => {
                    push_segment(&mut segments, &rest[..s], String::new());
                    rest = rest[s + 1..].trim_start();
                    continue;
                }
                (None, None) => {
                    push_segment(&mut segments, rest, String::new());
                    break;
                }
            };

            let after = after.trim_start();
            let (value, remainder) = if !key.trim_end().ends_with('*') && after.starts_with('"') {
                let (value, consumed) = unquote(after);
                let remainder = &after[consumed..];
                let remainder = remainder.find(';').map_or("", |i| &remainder[i + 1..]);
                (value, remainder)
            } else {
                match after.split_once(';') {
                    Some((v, r)) => (v.trim().to_string(), r),
                    None => (after.trim().to_string(), ""),
                }
            };
            push_segment(&mut segments, key, value);
            rest = remainder.trim_start();
        }

        Self::assemble(segments)
    }

    fn assemble(segments: Vec<Segment>) -> Self {
        let mut keys: Vec<String> = Vec::new();
        for seg in &segments {
            if !keys.contains(&seg.key) {
                keys.push(seg.key.clone());
            }
        }

        let mut dict = Self::new();
        for key in keys {
            let mut parts: Vec<&Segment> = segments.iter().filter(|s| s.key == key).collect();
            parts.sort_by_key(|s| s.ord.unwrap_or(0));

            let mut charset: Option<String> = None;
            let mut bytes = Vec::new();
            for (i, seg) in parts.iter().enumerate() {
                if seg.extended {
                    let mut data = seg.value.as_str();
                    if i == 0 {
                        let pieces: Vec<&str> = seg.value.splitn(3, '\'').collect();
                        if let [cs, _lang, text] = pieces.as_slice() {
                            if !cs.is_empty() {
                                charset = Some((*cs).to_string());
                            }
                            data = text;
                        }
                    }
                    bytes.extend(UrlText::decode_percent(data));
                } else {
                    bytes.extend_from_slice(seg.value.as_bytes());
                }
            }
            dict.entries.push((key, decode_text(&bytes, charset.as_deref())));
        }
        dict
    }

    /// Looks up a value by case-insensitive key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a value, replacing an existing entry in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Removes an entry, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `key=value` pieces with values quoted where needed.
    pub(crate) fn quoted_parts(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={}", quote_value(v)))
            .collect()
    }

    /// `key=value` pieces for the wire; non-ASCII values use RFC 2231.
    pub(crate) fn encoded_parts(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(k, v)| {
                if v.is_ascii() {
                    format!("{k}={}", quote_value(v))
                } else {
                    let encoded = UrlText::new().mask_space(true).encode(v);
                    format!("{k}*=utf-8'{}'{encoded}", language())
                }
            })
            .collect()
    }

    /// Header wire words; each but the last carries the `;` separator.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        join_parts(self.encoded_parts())
    }
}

fn push_segment(segments: &mut Vec<Segment>, key: &str, value: String) {
    let mut key = key.trim().to_ascii_lowercase();
    if key.is_empty() {
        return;
    }
    let extended = key.ends_with('*');
    if extended {
        key.pop();
    }
    let mut ord = None;
    if let Some((name, digits)) = key.rsplit_once('*') {
        if let Ok(n) = digits.parse() {
            ord = Some(n);
            key = name.to_string();
        }
    }
    segments.push(Segment {
        key,
        ord,
        extended,
        value,
    });
}

/// Reads a quoted string at the start of `text`; returns the unescaped
/// content and the number of bytes consumed.
fn unquote(text: &str) -> (String, usize) {
    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return (value, i + 1);
        } else {
            value.push(c);
        }
    }
    (value, text.len())
}

pub(crate) fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| TSPECIALS.contains(&c) || c.is_whitespace() || c.is_control());
    if needs_quotes {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Appends `;` to every piece but the last.
pub(crate) fn join_parts(parts: Vec<String>) -> Vec<String> {
    let count = parts.len();
    parts
        .into_iter()
        .enumerate()
        .map(|(i, p)| if i + 1 < count { format!("{p};") } else { p })
        .collect()
}

/// Language tag for RFC 2231 values, taken from `LANG` (`de_DE.UTF-8` → `de-DE`).
fn language() -> String {
    std::env::var("LANG")
        .ok()
        .and_then(|lang| {
            lang.split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .next()
                .map(|l| l.replace('_', "-"))
        })
        .filter(|l| !l.is_empty() && l != "C" && l != "POSIX")
        .unwrap_or_default()
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted_parts().join("; "))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (k, v) in iter {
            dict.set(k, v);
        }
        dict
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let dict = Dictionary::parse("a=1; B=\"two words\";c=x/y");
        assert_eq!(dict.get("a"), Some("1"));
        assert_eq!(dict.get("b"), Some("two words"));
        assert_eq!(dict.get("C"), Some("x/y"));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_quoted_with_semicolon_and_escape() {
        let dict = Dictionary::parse(r#"name="a; \"b\""; size=3"#);
        assert_eq!(dict.get("name"), Some("a; \"b\""));
        assert_eq!(dict.get("size"), Some("3"));
    }

    #[test]
    fn test_parse_rfc2231_extended() {
        let dict = Dictionary::parse("filename*=utf-8'de'gr%C3%BC%C3%9Fe%20dich.txt");
        assert_eq!(dict.get("filename"), Some("grüße dich.txt"));
    }

    #[test]
    fn test_parse_rfc2231_continuations() {
        let dict = Dictionary::parse(
            "title*1*=%20%E4rger; title*0*=iso-8859-1''Gro%DFer; title*2=\" ade\"",
        );
        assert_eq!(dict.get("title"), Some("Großer ärger ade"));
    }

    #[test]
    fn test_parse_valueless_key() {
        let dict = Dictionary::parse("flag; x=1");
        assert_eq!(dict.get("flag"), Some(""));
        assert_eq!(dict.get("x"), Some("1"));
    }

    #[test]
    fn test_display_quotes_tspecials() {
        let dict: Dictionary = [("charset", "utf-8"), ("name", "my file.txt")].into_iter().collect();
        assert_eq!(dict.to_string(), "charset=utf-8; name=\"my file.txt\"");
    }

    #[test]
    fn test_encode_non_ascii() {
        let dict: Dictionary = [("filename", "Grüße.txt"), ("size", "10")].into_iter().collect();
        let words = dict.encode();
        assert_eq!(words.len(), 2);
        assert!(words[0].starts_with("filename*=utf-8'"));
        assert!(words[0].ends_with("'Gr%C3%BC%C3%9Fe.txt;"));
        assert_eq!(words[1], "size=10");

        let reparsed = Dictionary::parse(&words.join(" "));
        assert_eq!(reparsed.get("filename"), Some("Grüße.txt"));
    }
}
