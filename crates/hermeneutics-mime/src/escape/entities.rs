//! HTML character entities (`&amp;`, `&auml;`, `&#x20ac;`).

use regex::{Captures, Regex};
use std::fmt::Write as _;
use std::sync::LazyLock;

/// Named entities, ASCII specials first.
const NAMED: &[(char, &str)] = &[
    ('"', "quot"),
    ('&', "amp"),
    ('<', "lt"),
    ('>', "gt"),
    ('\u{a0}', "nbsp"),
    ('¡', "iexcl"),
    ('¢', "cent"),
    ('£', "pound"),
    ('€', "euro"),
    ('¥', "yen"),
    ('Š', "Scaron"),
    ('¤', "curren"),
    ('¦', "brvbar"),
    ('§', "sect"),
    ('š', "scaron"),
    ('©', "copy"),
    ('ª', "ordf"),
    ('«', "laquo"),
    ('¬', "not"),
    ('\u{ad}', "shy"),
    ('¨', "uml"),
    ('®', "reg"),
    ('¯', "macr"),
    ('°', "deg"),
    ('±', "plusmn"),
    ('²', "sup2"),
    ('³', "sup3"),
    ('µ', "micro"),
    ('¶', "para"),
    ('´', "acute"),
    ('·', "middot"),
    ('¹', "sup1"),
    ('º', "ordm"),
    ('»', "raquo"),
    ('Œ', "OElig"),
    ('œ', "oelig"),
    ('¸', "cedil"),
    ('¼', "frac14"),
    ('½', "frac12"),
    ('Ÿ', "Yuml"),
    ('¿', "iquest"),
    ('¾', "frac34"),
    ('À', "Agrave"),
    ('Á', "Aacute"),
    ('Â', "Acirc"),
    ('Ã', "Atilde"),
    ('Ä', "Auml"),
    ('Å', "Aring"),
    ('Æ', "AElig"),
    ('Ç', "Ccedil"),
    ('È', "Egrave"),
    ('É', "Eacute"),
    ('Ê', "Ecirc"),
    ('Ë', "Euml"),
    ('Ì', "Igrave"),
    ('Í', "Iacute"),
    ('Î', "Icirc"),
    ('Ï', "Iuml"),
    ('Ð', "ETH"),
    ('Ñ', "Ntilde"),
    ('Ò', "Ograve"),
    ('Ó', "Oacute"),
    ('Ô', "Ocirc"),
    ('Õ', "Otilde"),
    ('Ö', "Ouml"),
    ('×', "times"),
    ('Ø', "Oslash"),
    ('Ù', "Ugrave"),
    ('Ú', "Uacute"),
    ('Û', "Ucirc"),
    ('Ü', "Uuml"),
    ('Ý', "Yacute"),
    ('Þ', "THORN"),
    ('ß', "szlig"),
    ('à', "agrave"),
    ('á', "aacute"),
    ('â', "acirc"),
    ('ã', "atilde"),
    ('ä', "auml"),
    ('å', "aring"),
    ('æ', "aelig"),
    ('ç', "ccedil"),
    ('è', "egrave"),
    ('é', "eacute"),
    ('ê', "ecirc"),
    ('ë', "euml"),
    ('ì', "igrave"),
    ('í', "iacute"),
    ('î', "icirc"),
    ('ï', "iuml"),
    ('ð', "eth"),
    ('ñ', "ntilde"),
    ('ò', "ograve"),
    ('ó', "oacute"),
    ('ô', "ocirc"),
    ('õ', "otilde"),
    ('ö', "ouml"),
    ('÷', "divide"),
    ('ø', "oslash"),
    ('ù', "ugrave"),
    ('ú', "uacute"),
    ('û', "ucirc"),
    ('ü', "uuml"),
    ('ý', "yacute"),
    ('þ', "thorn"),
    ('ÿ', "yuml"),
    ('‚', "sbquo"),
    ('‘', "lsquo"),
    ('’', "rsquo"),
    ('„', "bdquo"),
    ('“', "ldquo"),
    ('”', "rdquo"),
    ('‹', "lsaquo"),
    ('›', "rsaquo"),
    ('–', "ndash"),
    ('—', "mdash"),
    ('‰', "permil"),
    ('…', "hellip"),
    ('†', "dagger"),
    ('‡', "Dagger"),
];

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"&([^;&\s]+?);").unwrap()
});

/// Converter between plain text and HTML entity notation.
///
/// ```
/// use hermeneutics_mime::escape::Entities;
///
/// assert_eq!(Entities::new().encode("<äöü>"), "&lt;&auml;&ouml;&uuml;&gt;");
/// assert_eq!(Entities::decode("&lt;&#x20ac;&gt;"), "<€>");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Entities {
    keep_8bit: bool,
}

impl Entities {
    /// Creates a converter that masks every non-ASCII character.
    #[must_use]
    pub const fn new() -> Self {
        Self { keep_8bit: false }
    }

    /// Keeps non-ASCII characters as they are; only `& < > "` get masked.
    #[must_use]
    pub const fn keep_8bit(mut self, keep: bool) -> Self {
        self.keep_8bit = keep;
        self
    }

    /// Masks special characters as entities.
    ///
    /// Characters without a name become `&#xhhhh;`.
    #[must_use]
    pub fn encode(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        for c in text.chars() {
            let special = matches!(c, '"' | '&' | '<' | '>');
            if special || (!c.is_ascii() && !self.keep_8bit) {
                match name_of(c) {
                    Some(name) => {
                        let _ = write!(result, "&{name};");
                    }
                    None => {
                        let _ = write!(result, "&#x{:04x};", u32::from(c));
                    }
                }
            } else {
                result.push(c);
            }
        }
        result
    }

    /// Replaces named and numeric entities by their characters.
    ///
    /// Unknown entity names are left untouched.
    #[must_use]
    pub fn decode(text: &str) -> String {
        ENTITY
            .replace_all(text, |caps: &Captures<'_>| {
                let body = &caps[1];
                named(body)
                    .or_else(|| numeric(body))
                    .map_or_else(|| caps[0].to_string(), String::from)
            })
            .into_owned()
    }
}

fn name_of(c: char) -> Option<&'static str> {
    NAMED.iter().find(|(ch, _)| *ch == c).map(|(_, name)| *name)
}

fn named(name: &str) -> Option<char> {
    NAMED.iter().find(|(_, n)| *n == name).map(|(ch, _)| *ch)
}

fn numeric(body: &str) -> Option<char> {
    let digits = body.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse().ok()?,
    };
    char::from_u32(code)
}
