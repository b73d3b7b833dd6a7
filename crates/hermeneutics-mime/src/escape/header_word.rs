//! RFC 2047 encoded words in header fields.

use super::decode_charset;
use crate::encoding::{decode_base64, decode_quoted_printable, encode_base64};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").unwrap());

#[allow(clippy::unwrap_used)]
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\s+)|\B=\?(\S*?)\?([QB])\?(\S*?)\?=\B").unwrap()
});

/// Word break limit of the standard converter.
pub const STD_LIMIT: usize = 64;

/// Encoder/decoder for RFC 2047 encoded words.
///
/// Words that contain non-ASCII characters (or match the optional mask
/// pattern) are wrapped as `=?UTF-8?Q?...?=`; runs of such words are
/// merged into one encoded word together with the whitespace between them.
///
/// ```
/// use hermeneutics_mime::escape::HeaderWord;
///
/// let encoded = HeaderWord::std().encode("Jörg Müller");
/// assert_eq!(encoded, "=?UTF-8?Q?J=C3=B6rg_M=C3=BCller?=");
/// assert_eq!(HeaderWord::decode(&encoded), "Jörg Müller");
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeaderWord {
    base64: bool,
    limit: Option<usize>,
    lower: bool,
    mask: Option<Regex>,
}

impl HeaderWord {
    /// Creates a converter without word break limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard converter, breaking encoded words after 64 characters.
    #[must_use]
    pub fn std() -> Self {
        Self::new().limit(Some(STD_LIMIT))
    }

    /// Builds `?B?` (Base64) words instead of `?Q?`.
    #[must_use]
    pub const fn base64(mut self, base64: bool) -> Self {
        self.base64 = base64;
        self
    }

    /// Breaks encoded words longer than `limit` characters.
    #[must_use]
    pub const fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Writes charset and encoding type in lower case.
    #[must_use]
    pub const fn lower(mut self, lower: bool) -> Self {
        self.lower = lower;
        self
    }

    /// Forces masking of words matching `pattern` even if they are ASCII.
    #[must_use]
    pub fn mask(mut self, pattern: Regex) -> Self {
        self.mask = Some(pattern);
        self
    }

    /// Checks whether a string needs encoding.
    #[must_use]
    pub fn needs(&self, text: &str) -> bool {
        !text.is_ascii() || self.mask.as_ref().is_some_and(|m| m.is_match(text))
    }

    /// Encodes the words of `text` that need it.
    #[must_use]
    pub fn encode(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut pending = String::new();
        let mut pos = 0;

        for word in WORD.find_iter(text) {
            let gap = &text[pos..word.start()];
            if self.needs(word.as_str()) {
                if pending.is_empty() {
                    result.push_str(gap);
                } else {
                    pending.push_str(gap);
                }
                pending.push_str(word.as_str());
            } else {
                if !pending.is_empty() {
                    result.push_str(&self.mask_text(&pending));
                    pending.clear();
                }
                result.push_str(gap);
                result.push_str(word.as_str());
            }
            pos = word.end();
        }

        let rest = &text[pos..];
        if pending.is_empty() {
            result.push_str(rest);
        } else {
            pending.push_str(rest);
            result.push_str(&self.mask_text(&pending));
        }
        result
    }

    /// Encodes the whole string as encoded words regardless of its content.
    #[must_use]
    pub fn encode_whole(&self, text: &str) -> String {
        self.mask_text(text)
    }

    fn mask_text(&self, text: &str) -> String {
        let (charset, kind) = match (self.lower, self.base64) {
            (false, false) => ("UTF-8", "Q"),
            (false, true) => ("UTF-8", "B"),
            (true, false) => ("utf-8", "q"),
            (true, true) => ("utf-8", "b"),
        };
        let chars: Vec<char> = text.chars().collect();
        let limit = self.limit.unwrap_or(chars.len()).max(1);
        chars
            .chunks(limit)
            .map(|chunk| {
                let piece: String = chunk.iter().collect();
                let encoded = if self.base64 {
                    encode_base64(piece.as_bytes())
                } else {
                    q_encode(&piece)
                };
                format!("=?{charset}?{kind}?{encoded}?=")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Removes encoded-word masking.
    ///
    /// Whitespace between two encoded words is dropped; a space is put
    /// between an encoded word and adjacent plain text. Fragments in an
    /// unknown charset are read in the first known charset of the input.
    #[must_use]
    pub fn decode(text: &str) -> String {
        let mut result: Vec<String> = Vec::new();
        let mut before: Option<Kind> = None;
        let mut last: Option<Kind> = None;

        for fragment in fragments(text) {
            let kind = fragment.kind();
            match kind {
                Kind::Decoded => {
                    if last == Some(Kind::Space) && matches!(before, None | Some(Kind::Decoded)) {
                        result.pop();
                    } else if last == Some(Kind::Plain) {
                        result.push(" ".to_string());
                    }
                }
                Kind::Plain => {
                    if last == Some(Kind::Decoded) {
                        result.push(" ".to_string());
                    }
                }
                Kind::Space => {}
            }
            result.push(fragment.into_text());
            before = last;
            last = Some(kind);
        }
        if last == Some(Kind::Space) && before == Some(Kind::Decoded) {
            result.pop();
        }
        result.concat()
    }
}

/// A lexed piece of header text with encoded words already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    Plain(String),
    Space(String),
    Decoded(String),
}

impl Fragment {
    const fn kind(&self) -> Kind {
        match self {
            Self::Plain(_) => Kind::Plain,
            Self::Space(_) => Kind::Space,
            Self::Decoded(_) => Kind::Decoded,
        }
    }

    fn into_text(self) -> String {
        match self {
            Self::Plain(s) | Self::Space(s) | Self::Decoded(s) => s,
        }
    }
}

/// Splits header text into plain, whitespace and decoded encoded-word pieces.
pub(crate) fn fragments(text: &str) -> Vec<Fragment> {
    let pieces = lex(text);
    let fallback = pieces.iter().find_map(|p| match p {
        Piece::Decoded { charset, bytes } => {
            decode_charset(charset, bytes).map(|_| charset.as_str())
        }
        _ => None,
    });
    pieces
        .iter()
        .map(|p| match p {
            Piece::Plain(s) => Fragment::Plain((*s).to_string()),
            Piece::Space(s) => Fragment::Space((*s).to_string()),
            Piece::Decoded { .. } => Fragment::Decoded(p.text(fallback)),
        })
        .collect()
}

fn q_encode(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b' ' => result.push('_'),
            b if b.is_ascii_alphanumeric() => result.push(b as char),
            b => {
                let _ = write!(result, "={b:02X}");
            }
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Plain,
    Space,
    Decoded,
}

#[derive(Debug)]
enum Piece<'a> {
    Plain(&'a str),
    Space(&'a str),
    Decoded { charset: String, bytes: Vec<u8> },
}

impl Piece<'_> {
    fn text(&self, fallback: Option<&str>) -> String {
        match self {
            Self::Plain(s) | Self::Space(s) => (*s).to_string(),
            Self::Decoded { charset, bytes } => decode_charset(charset, bytes)
                .or_else(|| fallback.and_then(|f| decode_charset(f, bytes)))
                .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

fn lex(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut pos = 0;

    for caps in TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > pos {
            pieces.push(Piece::Plain(&text[pos..whole.start()]));
        }
        if caps.get(1).is_some() {
            pieces.push(Piece::Space(whole.as_str()));
        } else {
            let charset = caps.get(2).map_or("", |m| m.as_str());
            let kind = caps.get(3).map_or("", |m| m.as_str());
            let payload = caps.get(4).map_or("", |m| m.as_str());
            match unmask(kind, payload) {
                Some(bytes) => pieces.push(Piece::Decoded {
                    charset: charset.to_string(),
                    bytes,
                }),
                None => pieces.push(Piece::Plain(whole.as_str())),
            }
        }
        pos = whole.end();
    }
    if pos < text.len() {
        pieces.push(Piece::Plain(&text[pos..]));
    }
    pieces
}

fn unmask(kind: &str, payload: &str) -> Option<Vec<u8>> {
    if kind.eq_ignore_ascii_case("B") {
        decode_base64(payload.as_bytes()).ok()
    } else {
        decode_quoted_printable(payload.replace('_', " ").as_bytes()).ok()
    }
}
