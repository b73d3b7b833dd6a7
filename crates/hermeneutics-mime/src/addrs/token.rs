//! Token stream for address fields.

use crate::escape::{Fragment, fragments};

/// Single-character tokens with syntactic meaning in address fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Special {
    LAng,
    RAng,
    LParen,
    RParen,
    Comma,
    Semicolon,
    Colon,
    At,
    LBrack,
    RBrack,
}

impl Special {
    const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '<' => Self::LAng,
            '>' => Self::RAng,
            '(' => Self::LParen,
            ')' => Self::RParen,
            ',' => Self::Comma,
            ';' => Self::Semicolon,
            ':' => Self::Colon,
            '@' => Self::At,
            '[' => Self::LBrack,
            ']' => Self::RBrack,
            _ => return None,
        })
    }

    const fn as_char(self) -> char {
        match self {
            Self::LAng => '<',
            Self::RAng => '>',
            Self::LParen => '(',
            Self::RParen => ')',
            Self::Comma => ',',
            Self::Semicolon => ';',
            Self::Colon => ':',
            Self::At => '@',
            Self::LBrack => '[',
            Self::RBrack => ']',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Literal characters; `quoted` if they came from a quoted string,
    /// an escape or an encoded word.
    Char { text: String, quoted: bool },
    Space,
    /// A run of chars and single spaces, or a merged display name.
    Text(Vec<Token>),
    Special(Special),
}

impl Token {
    pub(crate) fn is(&self, special: Special) -> bool {
        *self == Self::Special(special)
    }

    pub(crate) const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// The characters without any quoting.
    pub(crate) fn text(&self) -> String {
        match self {
            Self::Char { text, .. } => text.clone(),
            Self::Space => " ".to_string(),
            Self::Text(tokens) => tokens.iter().map(Self::text).collect(),
            Self::Special(s) => s.as_char().to_string(),
        }
    }

    pub(crate) fn needs_quote(&self) -> bool {
        match self {
            Self::Char { quoted, .. } => *quoted,
            Self::Space => false,
            Self::Text(tokens) => tokens.iter().any(Self::needs_quote),
            Self::Special(_) => true,
        }
    }

    /// The text with quoting applied to the parts that need it.
    ///
    /// A text run is quoted as a whole.
    pub(crate) fn quote(&self) -> String {
        match self {
            Self::Char { text, quoted } => {
                if *quoted {
                    quote_string(text)
                } else {
                    text.clone()
                }
            }
            Self::Text(_) => {
                let text = self.text();
                if self.needs_quote() {
                    quote_string(&text)
                } else {
                    text
                }
            }
            Self::Space | Self::Special(_) => self.text(),
        }
    }
}

pub(crate) fn quote_string(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

/// Splits raw address text into tokens.
///
/// Double-quoted strings and backslash escapes (including `\xHH`) produce
/// quoted chars. Whitespace runs become one space token.
pub(crate) fn lex(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            tokens.push(Token::Space);
        } else if let Some(special) = Special::from_char(c) {
            tokens.push(Token::Special(special));
        } else if c == '\\' {
            let mut bytes = Vec::new();
            escaped(&mut chars, &mut bytes);
            while chars.next_if_eq(&'\\').is_some() {
                escaped(&mut chars, &mut bytes);
            }
            tokens.push(Token::Char {
                text: String::from_utf8_lossy(&bytes).into_owned(),
                quoted: true,
            });
        } else if c == '"' {
            let mut bytes = Vec::new();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => escaped(&mut chars, &mut bytes),
                    c => push_char(&mut bytes, c),
                }
            }
            tokens.push(Token::Char {
                text: String::from_utf8_lossy(&bytes).into_owned(),
                quoted: true,
            });
        } else {
            let mut text = String::from(c);
            while let Some(c) = chars.next_if(|&c| {
                !(c.is_whitespace() || c == '\\' || c == '"' || Special::from_char(c).is_some())
            }) {
                text.push(c);
            }
            tokens.push(Token::Char {
                text,
                quoted: false,
            });
        }
    }
    tokens
}

/// Like [`lex`], but RFC 2047 encoded words become quoted chars first.
pub(crate) fn lex_decode(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for fragment in fragments(text) {
        match fragment {
            Fragment::Decoded(text) => tokens.push(Token::Char { text, quoted: true }),
            Fragment::Plain(text) => tokens.extend(lex(&text)),
            Fragment::Space(_) => tokens.push(Token::Space),
        }
    }
    tokens
}

fn push_char(bytes: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Reads the character after a backslash.
fn escaped(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, bytes: &mut Vec<u8>) {
    let Some(c) = chars.next() else { return };
    if c == 'x' {
        let mut probe = chars.clone();
        let hex: String = probe.by_ref().take(2).collect();
        if hex.len() == 2 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let byte = u8::from_str_radix(&hex, 16).unwrap_or_default();
            bytes.push(byte);
            *chars = probe;
            return;
        }
    }
    let unescaped = match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'f' => '\x0c',
        'v' => '\x0b',
        'b' => '\x08',
        'a' => '\x07',
        'e' => '\x1b',
        '0' => '\0',
        c => c,
    };
    push_char(bytes, unescaped);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn chr(text: &str, quoted: bool) -> Token {
        Token::Char {
            text: text.to_string(),
            quoted,
        }
    }

    #[test]
    fn test_lex_simple_address() {
        let tokens = lex("Fred <fred@example.com>");
        assert_eq!(
            tokens,
            vec![
                chr("Fred", false),
                Token::Space,
                Token::Special(Special::LAng),
                chr("fred", false),
                Token::Special(Special::At),
                chr("example.com", false),
                Token::Special(Special::RAng),
            ]
        );
    }

    #[test]
    fn test_lex_quoted_and_escapes() {
        let tokens = lex(r#""Meier, \"Hans\"" M\xc3\xb6ller\, O'Brien"#);
        assert_eq!(tokens[0], chr("Meier, \"Hans\"", true));
        assert_eq!(tokens[1], Token::Space);
        assert_eq!(tokens[2], chr("M", false));
        assert_eq!(tokens[3], chr("ö", true));
        assert_eq!(tokens[4], chr("ller", false));
        assert_eq!(tokens[5], chr(",", true));
        assert_eq!(tokens[7], chr("O'Brien", false));
    }

    #[test]
    fn test_lex_decode_encoded_word() {
        let tokens = lex_decode("=?utf-8?q?M=C3=B6ller=2C_Fritz?= <f@x>");
        assert_eq!(tokens[0], chr("Möller, Fritz", true));
        assert_eq!(tokens[1], Token::Space);
        assert!(tokens[2].is(Special::LAng));
    }

    #[test]
    fn test_quote() {
        let text = Token::Text(vec![chr("Meier", false), Token::Special(Special::Comma), Token::Space, chr("Hans", false)]);
        assert_eq!(text.text(), "Meier, Hans");
        assert_eq!(text.quote(), "\"Meier, Hans\"");
        assert_eq!(chr("plain", false).quote(), "plain");
    }
}
