//! Mailbox listings and capabilities.

/// Reply to `STAT`: number of messages and their total size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Number of messages in the maildrop.
    pub count: u32,
    /// Total size in octets.
    pub size: u64,
}

/// One line of a `LIST` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListEntry {
    /// Message number.
    pub number: u32,
    /// Message size in octets.
    pub size: u64,
}

/// One line of a `UIDL` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UidEntry {
    /// Message number.
    pub number: u32,
    /// Unique id, stable across sessions.
    pub uid: String,
}

/// Capabilities from a `CAPA` reply (RFC 2449).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    entries: Vec<(String, Vec<String>)>,
}

impl Capabilities {
    /// Parses capability lines, one `NAME [args...]` per line.
    ///
    /// A name listed twice accumulates its arguments.
    #[must_use]
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut caps = Self::default();
        for line in lines {
            let mut words = line.split_whitespace();
            let Some(name) = words.next() else { continue };
            let name = name.to_ascii_uppercase();
            let args = words.map(str::to_string);
            match caps.entries.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => existing.extend(args),
                None => caps.entries.push((name, args.collect())),
            }
        }
        caps
    }

    /// Checks if a capability is present, case-insensitively.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// The arguments of a capability, empty if it has none or is absent.
    #[must_use]
    pub fn args(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map_or(&[][..], |(_, args)| args.as_slice())
    }

    /// Iterates capability names in server order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no capability was listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let caps = Capabilities::from_lines([
            "TOP",
            "USER",
            "SASL PLAIN",
            "sasl CRAM-MD5",
            "RESP-CODES",
            "IMPLEMENTATION Example-Server",
            "",
        ]);
        assert_eq!(caps.len(), 5);
        assert!(caps.has("top"));
        assert!(!caps.has("STLS"));
        assert_eq!(caps.args("SASL"), ["PLAIN", "CRAM-MD5"]);
        assert!(caps.args("USER").is_empty());
        assert!(caps.args("PIPELINING").is_empty());
        assert_eq!(
            caps.names().collect::<Vec<_>>(),
            ["TOP", "USER", "SASL", "RESP-CODES", "IMPLEMENTATION"]
        );
    }
}
