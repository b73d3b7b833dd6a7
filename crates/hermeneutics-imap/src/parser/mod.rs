//! IMAP response parser.
//!
//! A sans-I/O recursive-descent parser over one complete response as
//! assembled by the connection: the response lines with the bytes of
//! every `{n}` literal spliced in after the line that announced it.
//!
//! # Example
//!
//! ```
//! use hermeneutics_imap::parser::parse_response;
//! use hermeneutics_imap::types::{Response, Untagged};
//!
//! let response = parse_response(b"* 2 FETCH (FLAGS (\\Seen))\r\n").unwrap();
//! let Response::Untagged(Untagged::Data(data)) = response else {
//!     panic!("expected untagged data");
//! };
//! assert_eq!(data.number, Some(2));
//! assert_eq!(data.name, "FETCH");
//! ```

pub mod lexer;

pub use lexer::Lexer;

use crate::error::{Error, Result};
use crate::types::{Code, Data, Response, Status, StatusResponse, Untagged, Value};

/// Largest literal accepted from a server.
pub const MAX_LITERAL_SIZE: usize = 64 * 1024 * 1024;

/// Parses one complete response.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed syntax and
/// [`Error::UnspecResponse`] for a tagged line without a status.
pub fn parse_response(input: &[u8]) -> Result<Response> {
    let mut lexer = Lexer::new(input);
    match lexer.word() {
        b"" => Err(lexer.error("empty response")),
        b"+" => {
            lexer.skip_spaces();
            Ok(Response::Continuation(text(lexer.rest_of_line())))
        }
        b"*" => {
            lexer.skip_spaces();
            untagged(&mut lexer).map(Response::Untagged)
        }
        tag => {
            let tag = text(tag);
            lexer.skip_spaces();
            let Some(status) = status_word(&mut lexer) else {
                return Err(Error::UnspecResponse(text(first_line(input))));
            };
            Ok(Response::Tagged {
                tag,
                status: status_response(&mut lexer, status)?,
            })
        }
    }
}

/// Length of the literal announced at the end of `line`, as in `{42}`.
#[must_use]
pub fn literal_length(line: &[u8]) -> Option<usize> {
    let inner = line.strip_suffix(b"}")?;
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn untagged(lexer: &mut Lexer<'_>) -> Result<Untagged> {
    if let Some(status) = status_word(lexer) {
        return status_response(lexer, status).map(Untagged::Status);
    }
    let word = lexer.peek_word();
    let number = if !word.is_empty() && word.iter().all(u8::is_ascii_digit) {
        let position = lexer.position();
        let number = text(lexer.word())
            .parse()
            .map_err(|_| Error::parse(position, "message number out of range"))?;
        lexer.skip_spaces();
        Some(number)
    } else {
        None
    };
    let name = data_name(lexer)?;
    let values = values(lexer, None)?;
    Ok(Untagged::Data(Data {
        number,
        name,
        values,
    }))
}

fn data_name(lexer: &mut Lexer<'_>) -> Result<String> {
    let position = lexer.position();
    let name = lexer.atom();
    if name.is_empty()
        || !name
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.'))
    {
        return Err(Error::parse(position, "expected data name"));
    }
    Ok(text(name).to_ascii_uppercase())
}

fn status_word(lexer: &mut Lexer<'_>) -> Option<Status> {
    let status = std::str::from_utf8(lexer.peek_word())
        .ok()
        .and_then(Status::parse)?;
    lexer.word();
    Some(status)
}

fn status_response(lexer: &mut Lexer<'_>, status: Status) -> Result<StatusResponse> {
    lexer.skip_spaces();
    let code = if lexer.peek() == Some(b'[') {
        lexer.advance();
        let name = data_name(lexer)?;
        let values = values(lexer, Some(b']'))?;
        lexer.expect(b']')?;
        lexer.skip_spaces();
        Some(Code { name, values })
    } else {
        None
    };
    let text = text(lexer.rest_of_line()).trim_end().to_string();
    Ok(StatusResponse { status, code, text })
}

/// Values up to `close`, or up to the end of the response.
fn values(lexer: &mut Lexer<'_>, close: Option<u8>) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    loop {
        lexer.skip_spaces();
        match lexer.peek() {
            byte if byte == close && close.is_some() => return Ok(items),
            None | Some(b'\r' | b'\n') => {
                return match close {
                    None => Ok(items),
                    Some(c) => Err(lexer.error(format!("missing '{}'", char::from(c)))),
                };
            }
            Some(b')') => return Err(lexer.error("unexpected ')'")),
            Some(_) => items.push(value(lexer)?),
        }
    }
}

fn value(lexer: &mut Lexer<'_>) -> Result<Value> {
    match lexer.peek() {
        Some(b'(') => {
            lexer.advance();
            let items = values(lexer, Some(b')'))?;
            lexer.expect(b')')?;
            Ok(Value::List(items))
        }
        Some(b'"') => quoted(lexer),
        Some(b'{') => literal(lexer),
        _ => {
            let atom = lexer.atom();
            if atom.is_empty() {
                return Err(lexer.error("unexpected character"));
            }
            if atom.eq_ignore_ascii_case(b"NIL") {
                Ok(Value::Nil)
            } else {
                Ok(Value::Atom(text(atom)))
            }
        }
    }
}

fn quoted(lexer: &mut Lexer<'_>) -> Result<Value> {
    let start = lexer.position();
    lexer.advance();
    let mut bytes = Vec::new();
    loop {
        match lexer.peek() {
            Some(b'"') => {
                lexer.advance();
                return Ok(Value::Quoted(text(&bytes)));
            }
            Some(b'\\') => {
                lexer.advance();
                if lexer.at_line_end() {
                    break;
                }
                bytes.extend(lexer.peek());
                lexer.advance();
            }
            Some(b'\r' | b'\n') | None => break,
            Some(b) => {
                bytes.push(b);
                lexer.advance();
            }
        }
    }
    Err(Error::parse(start, "unterminated quoted string"))
}

fn literal(lexer: &mut Lexer<'_>) -> Result<Value> {
    let start = lexer.position();
    lexer.advance();
    let digits = lexer.atom();
    let length = digits
        .strip_suffix(b"}")
        .and_then(|d| std::str::from_utf8(d).ok())
        .and_then(|d| d.parse::<usize>().ok())
        .ok_or_else(|| Error::parse(start, "malformed literal length"))?;
    if length > MAX_LITERAL_SIZE {
        return Err(Error::parse(start, format!("literal of {length} bytes is too large")));
    }
    lexer.expect_line_end()?;
    Ok(Value::Literal(lexer.take(length)?.to_vec()))
}

fn first_line(input: &[u8]) -> &[u8] {
    let end = input
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(input.len());
    &input[..end]
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
