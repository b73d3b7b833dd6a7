//! Service extensions from the EHLO/LHLO reply.

/// One line of the EHLO/LHLO reply after the first.
///
/// Keywords are matched without regard to case. Unknown ones are kept
/// in upper case together with their parameter text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `STARTTLS`.
    StartTls,
    /// `AUTH` with the offered SASL mechanisms, upper-cased.
    Auth(Vec<String>),
    /// `SIZE`, with the limit in bytes if the server states one.
    Size(Option<usize>),
    /// `8BITMIME`.
    EightBitMime,
    /// `PIPELINING`.
    Pipelining,
    /// `CHUNKING`, enables BDAT.
    Chunking,
    /// `SMTPUTF8`.
    SmtpUtf8,
    /// Keyword and parameters of anything else.
    Other(String, Option<String>),
}

const FLAGS: [(&str, Extension); 5] = [
    ("STARTTLS", Extension::StartTls),
    ("8BITMIME", Extension::EightBitMime),
    ("PIPELINING", Extension::Pipelining),
    ("CHUNKING", Extension::Chunking),
    ("SMTPUTF8", Extension::SmtpUtf8),
];

impl Extension {
    /// Reads one `KEYWORD [params]` line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let keyword = words.next().unwrap_or_default().to_ascii_uppercase();
        let params: Vec<&str> = words.collect();

        if let Some((_, flag)) = FLAGS.iter().find(|(name, _)| *name == keyword) {
            return flag.clone();
        }
        match keyword.as_str() {
            "AUTH" => Self::Auth(params.iter().map(|m| m.to_ascii_uppercase()).collect()),
            "SIZE" => Self::Size(params.first().and_then(|n| n.parse().ok())),
            _ => Self::Other(keyword, (!params.is_empty()).then(|| params.join(" "))),
        }
    }

    /// The keyword as the server would announce it.
    #[must_use]
    pub fn keyword(&self) -> &str {
        match self {
            Self::Auth(_) => "AUTH",
            Self::Size(_) => "SIZE",
            Self::Other(keyword, _) => keyword,
            flag => FLAGS
                .iter()
                .find(|(_, known)| known == flag)
                .map_or("", |(name, _)| *name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_ignore_case() {
        assert_eq!(Extension::parse("starttls"), Extension::StartTls);
        assert_eq!(Extension::parse("Chunking"), Extension::Chunking);
        assert_eq!(Extension::parse("8bitmime").keyword(), "8BITMIME");
    }

    #[test]
    fn size_limit() {
        assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
        assert_eq!(Extension::parse("SIZE"), Extension::Size(None));
        assert_eq!(Extension::parse("SIZE lots"), Extension::Size(None));
    }

    #[test]
    fn auth_mechanisms() {
        assert_eq!(
            Extension::parse("AUTH plain LOGIN cram-md5"),
            Extension::Auth(vec!["PLAIN".into(), "LOGIN".into(), "CRAM-MD5".into()])
        );
        assert_eq!(Extension::parse("AUTH"), Extension::Auth(vec![]));
    }

    #[test]
    fn unknown_keywords() {
        let ext = Extension::parse("x-custom  some   params");
        assert_eq!(ext, Extension::Other("X-CUSTOM".into(), Some("some params".into())));
        assert_eq!(ext.keyword(), "X-CUSTOM");
        assert_eq!(Extension::parse("DSN"), Extension::Other("DSN".into(), None));
        assert_eq!(Extension::parse(""), Extension::Other(String::new(), None));
    }
}
