//! MIME multipart bodies.

use crate::error::{Error, Result};
use crate::message::Message;
use chrono::Local;
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::warn;

/// A multipart body: prolog, parts and epilog around a boundary.
///
/// A delimiter is `--boundary` at the start of a line. The line break in
/// front of a delimiter belongs to the delimiter, so part contents are
/// kept byte for byte.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    prolog: Vec<u8>,
    parts: Vec<Message>,
    epilog: Vec<u8>,
}

impl Multipart {
    /// Creates a multipart body.
    ///
    /// An empty boundary is replaced by a generated one.
    #[must_use]
    pub fn new(boundary: impl Into<String>, prolog: Vec<u8>, parts: Vec<Message>, epilog: Vec<u8>) -> Self {
        let mut boundary = boundary.into();
        if boundary.is_empty() {
            boundary = generate_boundary();
        }
        Self {
            boundary,
            prolog,
            parts,
            epilog,
        }
    }

    /// Creates an empty multipart body with a generated boundary.
    #[must_use]
    pub fn with_parts(parts: Vec<Message>) -> Self {
        Self::new(generate_boundary(), Vec::new(), parts, Vec::new())
    }

    /// Splits a body at the given boundary and parses each part.
    ///
    /// # Errors
    ///
    /// Returns an error if a delimiter or the closing delimiter is
    /// missing, or a part does not parse.
    pub fn parse(input: &[u8], boundary: &str) -> Result<Self> {
        if boundary.is_empty() {
            return Err(Error::MissingBoundary);
        }
        let delimiter = format!("--{boundary}");
        let delimiter = delimiter.as_bytes();

        let first = find_delimiter(input, delimiter, 0)
            .ok_or_else(|| Error::InvalidMultipart(format!("no delimiter --{boundary}")))?;
        let prolog = input[..first].to_vec();
        let first_line = &input[first..line_end(input, first)];
        let crlf = first_line.ends_with(b"\r\n");

        let mut parts = Vec::new();
        let mut pos = first + delimiter.len();
        loop {
            if input[pos..].starts_with(b"--") {
                let epilog_start = line_end(input, pos + 2);
                let epilog = input[epilog_start..].to_vec();
                return Ok(Self {
                    boundary: boundary.to_string(),
                    prolog,
                    parts,
                    epilog,
                });
            }
            let start = line_end(input, pos);
            let next = find_delimiter(input, delimiter, start).ok_or_else(|| {
                Error::InvalidMultipart(format!("missing closing delimiter --{boundary}--"))
            })?;
            parts.push(Message::parse(strip_line_break(&input[start..next], crlf))?);
            pos = next + delimiter.len();
        }
    }

    /// The current boundary.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Bytes before the first delimiter.
    #[must_use]
    pub fn prolog(&self) -> &[u8] {
        &self.prolog
    }

    /// Bytes after the closing delimiter line.
    #[must_use]
    pub fn epilog(&self) -> &[u8] {
        &self.epilog
    }

    /// The parts.
    #[must_use]
    pub fn parts(&self) -> &[Message] {
        &self.parts
    }

    /// Mutable access to the parts.
    pub fn parts_mut(&mut self) -> &mut Vec<Message> {
        &mut self.parts
    }

    /// Appends a part.
    pub fn push(&mut self, part: Message) {
        self.parts.push(part);
    }

    /// Number of parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Serializes the body.
    ///
    /// If the boundary occurs in the prolog, a part or the epilog, a new
    /// boundary is generated until none of them contains it.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        let parts: Vec<Vec<u8>> = self.parts.iter_mut().map(Message::to_bytes).collect();
        while self.collides(&parts) {
            let fresh = generate_boundary();
            warn!(old = %self.boundary, new = %fresh, "boundary occurs in content, regenerating");
            self.boundary = fresh;
        }

        let delimiter = format!("--{}", self.boundary);
        let mut out = self.prolog.clone();
        for part in &parts {
            out.extend_from_slice(delimiter.as_bytes());
            out.push(b'\n');
            out.extend_from_slice(part);
            out.push(b'\n');
        }
        out.extend_from_slice(delimiter.as_bytes());
        out.extend_from_slice(b"--\n");
        out.extend_from_slice(&self.epilog);
        out
    }

    fn collides(&self, parts: &[Vec<u8>]) -> bool {
        let needle = self.boundary.as_bytes();
        contains(&self.prolog, needle)
            || contains(&self.epilog, needle)
            || parts.iter().any(|p| contains(p, needle))
    }
}

/// Generates a boundary: a timestamp and 16 random alphanumerics.
#[must_use]
pub fn generate_boundary() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("{}.{random}", Local::now().format("%Y%m%d%H%M%S"))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Position of the next delimiter line at or after `from`.
///
/// The delimiter must start the line and may only be followed by `--`,
/// trailing blanks and the line break. Lines like `--boundary-ish` are
/// body content.
fn find_delimiter(input: &[u8], delimiter: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos + delimiter.len() <= input.len() {
        let offset = input[pos..]
            .windows(delimiter.len())
            .position(|w| w == delimiter)?;
        let at = pos + offset;
        let after = at + delimiter.len();
        if (at == 0 || input[at - 1] == b'\n') && delimiter_tail(&input[after..line_end(input, after)]) {
            return Some(at);
        }
        pos = at + 1;
    }
    None
}

fn delimiter_tail(rest: &[u8]) -> bool {
    let rest = rest.strip_prefix(b"--").unwrap_or(rest);
    rest.iter().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}

/// Index just past the end of the line containing `pos`.
fn line_end(input: &[u8], pos: usize) -> usize {
    input[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(input.len(), |i| pos + i + 1)
}

/// Removes the line break that belongs to the following delimiter.
fn strip_line_break(part: &[u8], crlf: bool) -> &[u8] {
    let brk: &[u8] = if crlf { b"\r\n" } else { b"\n" };
    part.strip_suffix(brk).unwrap_or(part)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::Body;
    use proptest::prelude::*;

    const SAMPLE: &[u8] = b"This is a MIME message.\n\
--frontier\n\
Content-Type: text/plain\n\
\n\
first\n\
--frontier  \n\
Content-Type: text/html\n\
\n\
<p>second</p>\n\
\n\
--frontier--\n\
trailing words\n";

    fn body_of(message: &Message) -> &[u8] {
        match message.body() {
            Body::Bytes(b) => b,
            _ => panic!("not a leaf body"),
        }
    }

    #[test]
    fn test_parse() {
        let mp = Multipart::parse(SAMPLE, "frontier").unwrap();
        assert_eq!(mp.prolog(), b"This is a MIME message.\n");
        assert_eq!(mp.len(), 2);
        assert_eq!(body_of(&mp.parts()[0]), b"first");
        assert_eq!(body_of(&mp.parts()[1]), b"<p>second</p>\n");
        assert_eq!(mp.epilog(), b"trailing words\n");
    }

    #[test]
    fn test_parse_crlf() {
        let input = b"--b\r\n\r\none\r\n--b\r\n\r\ntwo\r\n--b--\r\n";
        let mp = Multipart::parse(input, "b").unwrap();
        assert_eq!(body_of(&mp.parts()[0]), b"one");
        assert_eq!(body_of(&mp.parts()[1]), b"two");
        assert!(mp.epilog().is_empty());
    }

    #[test]
    fn test_missing_closing_delimiter() {
        assert!(Multipart::parse(b"--b\n\nx\n", "b").is_err());
        assert!(Multipart::parse(b"nothing here", "b").is_err());
        assert!(matches!(Multipart::parse(b"", ""), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_delimiter_must_start_line() {
        let input = b"--b\n\nsee --b inline\n--b--\n";
        let mp = Multipart::parse(input, "b").unwrap();
        assert_eq!(mp.len(), 1);
        assert_eq!(body_of(&mp.parts()[0]), b"see --b inline");
    }

    #[test]
    fn test_longer_line_is_not_a_delimiter() {
        let input = b"--b\n\npart one\n--bogus line inside body\n--b \n\npart two\n--b--\t\n";
        let mp = Multipart::parse(input, "b").unwrap();
        assert_eq!(mp.len(), 2);
        assert_eq!(body_of(&mp.parts()[0]), b"part one\n--bogus line inside body");
        assert_eq!(body_of(&mp.parts()[1]), b"part two");
    }

    #[test]
    fn test_serialize_reparse() {
        let mut mp = Multipart::parse(SAMPLE, "frontier").unwrap();
        let bytes = mp.to_bytes();
        assert_eq!(mp.boundary(), "frontier");
        let again = Multipart::parse(&bytes, "frontier").unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(body_of(&again.parts()[1]), b"<p>second</p>\n");
        assert_eq!(again.epilog(), b"trailing words\n");
    }

    #[test]
    fn test_boundary_collision_regenerates() {
        let mut part = Message::new();
        part.set_body(Body::Bytes(b"contains --simple inside".to_vec()));
        let mut mp = Multipart::new("simple", Vec::new(), vec![part], Vec::new());
        let bytes = mp.to_bytes();
        assert_ne!(mp.boundary(), "simple");
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.matches("simple").count(), 1);
        let again = Multipart::parse(&bytes, mp.boundary()).unwrap();
        assert_eq!(body_of(&again.parts()[0]), b"contains --simple inside");
    }

    #[test]
    fn test_generated_boundary_shape() {
        let b = generate_boundary();
        let (stamp, random) = b.split_once('.').unwrap();
        assert_eq!(stamp.len(), 14);
        assert_eq!(random.len(), 16);
        assert!(random.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    proptest! {
        #[test]
        fn body_round_trip(body in proptest::collection::vec(any::<u8>(), 0..200)) {
            let boundary = "=_bOuNdArY_=";
            prop_assume!(!contains(&body, boundary.as_bytes()));
            let mut part = Message::new();
            part.set_body(Body::Bytes(body.clone()));
            let mut mp = Multipart::new(boundary, Vec::new(), vec![part], Vec::new());
            let bytes = mp.to_bytes();
            let again = Multipart::parse(&bytes, boundary).unwrap();
            prop_assert_eq!(body_of(&again.parts()[0]), body.as_slice());
        }
    }
}
