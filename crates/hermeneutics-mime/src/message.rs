//! Messages: a header section and a body.

use crate::encoding::{
    decode_base64, decode_quoted_printable, encode_base64_lines, encode_quoted_printable,
};
use crate::error::{Error, Result};
use crate::escape::decode_text;
use crate::header::Headers;
use crate::multipart::Multipart;
use crate::types::{ContentType, HeaderValue};
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses a transfer encoding name; unknown names mean 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }

    /// The header value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The body of a message.
#[derive(Debug, Clone)]
pub enum Body {
    /// Opaque bytes, still transfer-encoded.
    Bytes(Vec<u8>),
    /// A `multipart/*` body.
    Multipart(Multipart),
    /// A `message/rfc822` body.
    Message(Box<Message>),
}

impl Default for Body {
    fn default() -> Self {
        Self::Bytes(Vec::new())
    }
}

type BodyParser = fn(&[u8], &ContentType) -> Result<Body>;

/// Body constructors by content type, tried in order.
const BODY_TYPES: &[(fn(&ContentType) -> bool, BodyParser)] = &[
    (ContentType::is_multipart, parse_multipart),
    (is_rfc822, parse_rfc822),
];

fn is_rfc822(ct: &ContentType) -> bool {
    ct.is("message/rfc822")
}

fn parse_multipart(input: &[u8], ct: &ContentType) -> Result<Body> {
    let boundary = ct.boundary().ok_or(Error::MissingBoundary)?;
    Multipart::parse(input, boundary).map(Body::Multipart)
}

fn parse_rfc822(input: &[u8], _ct: &ContentType) -> Result<Body> {
    Message::parse(input).map(|m| Body::Message(Box::new(m)))
}

/// A transfer-decoded body with its declared charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBody {
    /// The decoded bytes.
    pub bytes: Vec<u8>,
    /// The `charset` parameter of the content type, if any.
    pub charset: Option<String>,
}

impl DecodedBody {
    /// The bytes read in their charset; lossy UTF-8 if none is declared.
    #[must_use]
    pub fn text(&self) -> String {
        decode_text(&self.bytes, self.charset.as_deref())
    }
}

/// A message: headers and a body.
#[derive(Debug, Clone, Default)]
pub struct Message {
    headers: Headers,
    body: Body,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a message from its parts.
    #[must_use]
    pub const fn from_parts(headers: Headers, body: Body) -> Self {
        Self { headers, body }
    }

    /// Parses a message.
    ///
    /// The header section ends at the first empty line (LF or CRLF). The
    /// body is parsed according to the content type: multipart bodies are
    /// split into parts, `message/rfc822` bodies are parsed as messages,
    /// everything else stays raw.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed header lines or multipart bodies.
    pub fn parse(input: &[u8]) -> Result<Self> {
        let (head, body) = split_head(input);
        let headers = Headers::parse_bytes(head)?;
        let body = match headers.content_type() {
            Some(ct) => BODY_TYPES
                .iter()
                .find(|(matches, _)| matches(ct))
                .map_or_else(|| Ok(Body::Bytes(body.to_vec())), |(_, parse)| parse(body, ct))?,
            None => Body::Bytes(body.to_vec()),
        };
        Ok(Self { headers, body })
    }

    /// The headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the headers.
    pub const fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// The body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable access to the body.
    pub const fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Replaces the body as is.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Splits the message into headers and body.
    #[must_use]
    pub fn into_parts(self) -> (Headers, Body) {
        (self.headers, self.body)
    }

    /// The decoded contents of a header field.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is present but malformed.
    pub fn header(&self, name: &str) -> Result<Option<&HeaderValue>> {
        self.headers.field(name)
    }

    /// Whether a header field is present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.headers.has(name)
    }

    /// Whether the body is a multipart body.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart(_))
    }

    /// The transfer encoding declared in the headers.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .content_transfer_encoding()
            .map_or(TransferEncoding::SevenBit, |c| TransferEncoding::parse(c.caption()))
    }

    /// The body with its transfer encoding removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a leaf body or does not decode.
    pub fn body_decoded(&self) -> Result<DecodedBody> {
        let Body::Bytes(raw) = &self.body else {
            return Err(Error::InvalidEncoding("structured body cannot be transfer-decoded".to_string()));
        };
        let bytes = match self.transfer_encoding() {
            TransferEncoding::QuotedPrintable => decode_quoted_printable(raw)?,
            TransferEncoding::Base64 => decode_base64(raw)?,
            _ => raw.clone(),
        };
        let charset = self
            .headers
            .content_type()
            .and_then(ContentType::charset)
            .map(String::from);
        Ok(DecodedBody { bytes, charset })
    }

    /// Sets a UTF-8 text body, quoted-printable encoded.
    pub fn set_body_text(&mut self, text: &str) {
        self.headers
            .replace("Content-Type", ContentType::text_plain())
            .replace("Content-Transfer-Encoding", TransferEncoding::QuotedPrintable.as_str());
        self.body = Body::Bytes(encode_quoted_printable(text.as_bytes()).into_bytes());
    }

    /// Sets a binary body, base64 encoded.
    pub fn set_body_binary(&mut self, data: &[u8]) {
        self.headers
            .replace("Content-Transfer-Encoding", TransferEncoding::Base64.as_str());
        self.body = Body::Bytes(encode_base64_lines(data).into_bytes());
    }

    /// Serializes the message: header lines, an empty line, the body.
    ///
    /// For a multipart body the boundary parameter of the content type is
    /// brought in line with the body's boundary first, which may have been
    /// regenerated.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        let body = match &mut self.body {
            Body::Bytes(bytes) => bytes.clone(),
            Body::Multipart(mp) => {
                let bytes = mp.to_bytes();
                self.sync_boundary();
                bytes
            }
            Body::Message(inner) => inner.to_bytes(),
        };
        let mut out = self.headers.to_bytes();
        out.push(b'\n');
        out.extend_from_slice(&body);
        out
    }

    fn sync_boundary(&mut self) {
        let Body::Multipart(mp) = &self.body else { return };
        let boundary = mp.boundary();
        let current = self.headers.content_type();
        if current.and_then(ContentType::boundary) == Some(boundary) {
            return;
        }
        let ct = current.map_or_else(
            || ContentType::multipart_mixed(boundary),
            |ct| ct.clone().with_parameter("boundary", boundary),
        );
        self.headers.replace("Content-Type", ct);
    }
}

/// Splits at the first empty line; the empty line itself is dropped.
fn split_head(input: &[u8]) -> (&[u8], &[u8]) {
    let mut pos = 0;
    while pos < input.len() {
        let end = input[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(input.len(), |i| pos + i + 1);
        let line = &input[pos..end];
        if line == b"\n" || line == b"\r\n" {
            return (&input[..pos], &input[end..]);
        }
        pos = end;
    }
    (input, &[])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::addrs::AddrList;

    const SIMPLE: &[u8] = b"From: Fred <fred@example.com>\r\n\
To: wilma@example.com\r\n\
Subject: Test\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Gr=FC=DFe\r\n";

    mod transfer_encoding_tests {
        use super::*;

        #[test]
        fn test_parse() {
            assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
            assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
            assert_eq!(
                TransferEncoding::parse("quoted-printable"),
                TransferEncoding::QuotedPrintable
            );
            assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
        }
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_simple() {
            let msg = Message::parse(SIMPLE).unwrap();
            assert_eq!(msg.headers().len(), 5);
            assert!(msg.headers().from().is_some_and(|f| f.has("fred@example.com")));
            assert!(!msg.is_multipart());
            assert_eq!(msg.transfer_encoding(), TransferEncoding::QuotedPrintable);

            let decoded = msg.body_decoded().unwrap();
            assert_eq!(decoded.charset.as_deref(), Some("iso-8859-1"));
            assert_eq!(decoded.text(), "Grüße\r\n");
        }

        #[test]
        fn test_parse_without_body() {
            let msg = Message::parse(b"Subject: only headers\n").unwrap();
            assert_eq!(msg.headers().len(), 1);
            assert!(matches!(msg.body(), Body::Bytes(b) if b.is_empty()));
        }

        #[test]
        fn test_parse_multipart() {
            let input = b"Content-Type: multipart/mixed; boundary=\"xx\"\n\
\n\
--xx\n\
Content-Type: text/plain\n\
\n\
one\n\
--xx\n\
Content-Type: message/rfc822\n\
\n\
Subject: inner\n\
\n\
inner body\n\
--xx--\n";
            let msg = Message::parse(input).unwrap();
            let Body::Multipart(mp) = msg.body() else { panic!("expected multipart") };
            assert_eq!(mp.len(), 2);
            let Body::Message(inner) = mp.parts()[1].body() else { panic!("expected message") };
            assert_eq!(inner.headers().raw("subject"), Some("inner"));
        }

        #[test]
        fn test_multipart_without_boundary() {
            let input = b"Content-Type: multipart/mixed\n\n--x--\n";
            assert!(matches!(Message::parse(input), Err(Error::MissingBoundary)));
        }

        #[test]
        fn test_bad_header_line() {
            assert!(matches!(
                Message::parse(b"Subject: x\nbroken line\n\nbody"),
                Err(Error::MissingColon(_))
            ));
        }

        #[test]
        fn test_8bit_header_round_trip() {
            let input = b"Subject: caf\xe9\n\nbody\n";
            let mut msg = Message::parse(input).unwrap();
            assert_eq!(msg.headers().raw("Subject"), Some("caf\u{e9}"));
            assert_eq!(msg.to_bytes(), input);
        }
    }

    mod build_tests {
        use super::*;

        #[test]
        fn test_body_text() {
            let mut msg = Message::new();
            msg.headers_mut().add("To", AddrList::parse("x@example.com"));
            msg.set_body_text("Grüße, Welt");
            assert_eq!(msg.headers().raw("content-type"), Some("text/plain; charset=utf-8"));
            assert_eq!(msg.transfer_encoding(), TransferEncoding::QuotedPrintable);
            assert_eq!(msg.body_decoded().unwrap().text(), "Grüße, Welt");

            let bytes = msg.to_bytes();
            let again = Message::parse(&bytes).unwrap();
            assert_eq!(again.body_decoded().unwrap().text(), "Grüße, Welt");
        }

        #[test]
        fn test_body_binary() {
            let mut msg = Message::new();
            msg.set_body_binary(&[0, 159, 146, 150]);
            assert_eq!(msg.transfer_encoding(), TransferEncoding::Base64);
            assert_eq!(msg.body_decoded().unwrap().bytes, vec![0, 159, 146, 150]);
        }

        #[test]
        fn test_boundary_resync() {
            let mut part = Message::new();
            part.set_body_text("see --old for details");
            let mut msg = Message::new();
            msg.headers_mut()
                .add("Content-Type", ContentType::multipart_mixed("old"));
            msg.set_body(Body::Multipart(Multipart::new("old", Vec::new(), vec![part], Vec::new())));

            let bytes = msg.to_bytes();
            let boundary = msg.headers().content_type().and_then(ContentType::boundary).unwrap().to_string();
            assert_ne!(boundary, "old");

            let again = Message::parse(&bytes).unwrap();
            let Body::Multipart(mp) = again.body() else { panic!("expected multipart") };
            assert_eq!(mp.boundary(), boundary);
            assert_eq!(mp.parts()[0].body_decoded().unwrap().text(), "see --old for details");
        }
    }
}
