//! SMTP reply line parser.
//!
//! Replies are single-line or multi-line:
//! - Single: `250 OK`
//! - Multi: `250-First line`, `250-Second line`, `250 Last line`

use crate::error::{Error, Result};
use crate::types::ReplyCode;

/// One line of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyLine<'a> {
    /// `DDD-text`: more lines follow.
    Continuation(ReplyCode, &'a str),
    /// `DDD text` or a bare `DDD`: the reply is complete.
    Final(ReplyCode, &'a str),
}

/// Classifies a reply line.
///
/// # Errors
///
/// Returns [`Error::Unspec`] if the line does not start with three digits
/// followed by a space, a dash or the end of the line.
pub fn parse_line(line: &str) -> Result<ReplyLine<'_>> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(Error::Unspec(line.to_string()));
    }
    let code = ReplyCode::new(
        line[..3]
            .parse()
            .map_err(|_| Error::Unspec(line.to_string()))?,
    );
    match bytes.get(3) {
        None => Ok(ReplyLine::Final(code, "")),
        Some(b' ') => Ok(ReplyLine::Final(code, &line[4..])),
        Some(b'-') => Ok(ReplyLine::Continuation(code, &line[4..])),
        Some(_) => Err(Error::Unspec(line.to_string())),
    }
}
