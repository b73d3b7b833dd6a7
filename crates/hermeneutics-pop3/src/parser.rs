//! POP3 response parsing.
//!
//! Status lines start with `+OK` or `-ERR`. Multi-line data ends with a
//! lone `.`; data lines starting with a dot carry an extra one.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::types::{ListEntry, Stat, UidEntry};

/// The APOP timestamp in a greeting, `<process.clock@host>`.
#[allow(clippy::unwrap_used)]
static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[!-~]+@[!-~]+>").unwrap());

/// A status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status<'a> {
    /// `+OK` with the rest of the line.
    Ok(&'a str),
    /// `-ERR` with the rest of the line.
    Err(&'a str),
}

/// Classifies a status line.
///
/// # Errors
///
/// Returns [`Error::Unspec`] for anything but `+OK` or `-ERR`.
pub fn parse_status(line: &str) -> Result<Status<'_>> {
    if let Some(rest) = line.strip_prefix("+OK") {
        Ok(Status::Ok(rest.trim_start()))
    } else if let Some(rest) = line.strip_prefix("-ERR") {
        Ok(Status::Err(rest.trim_start()))
    } else {
        Err(Error::Unspec(line.to_string()))
    }
}

/// A line of multi-line data, or the end of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLine<'a> {
    /// Content with dot-stuffing removed.
    Line(&'a [u8]),
    /// The terminating `.`.
    End,
}

/// Classifies a multi-line data line.
#[must_use]
pub fn parse_data_line(line: &[u8]) -> DataLine<'_> {
    match line {
        b"." => DataLine::End,
        [b'.', rest @ ..] => DataLine::Line(rest),
        _ => DataLine::Line(line),
    }
}

/// Extracts the APOP timestamp from a greeting.
#[must_use]
pub fn apop_timestamp(greeting: &str) -> Option<&str> {
    TIMESTAMP.find(greeting).map(|m| m.as_str())
}

fn split_number(text: &str) -> Result<(u32, &str)> {
    let text = text.trim_start();
    let (number, rest) = text.split_once(' ').unwrap_or((text, ""));
    let number = number
        .parse()
        .map_err(|_| Error::Parse(format!("bad message number in {text:?}")))?;
    Ok((number, rest.trim_start()))
}

fn parse_size(text: &str) -> Result<u64> {
    let size = text.split_whitespace().next().unwrap_or_default();
    size.parse()
        .map_err(|_| Error::Parse(format!("bad size {size:?}")))
}

/// Parses `count size` from a `STAT` reply.
///
/// # Errors
///
/// Returns [`Error::Parse`] if either field is not a number.
pub fn parse_stat(text: &str) -> Result<Stat> {
    let (count, rest) = split_number(text)?;
    Ok(Stat {
        count,
        size: parse_size(rest)?,
    })
}

/// Parses `number size` from a `LIST` line.
///
/// # Errors
///
/// Returns [`Error::Parse`] if either field is not a number.
pub fn parse_list_entry(text: &str) -> Result<ListEntry> {
    let (number, rest) = split_number(text)?;
    Ok(ListEntry {
        number,
        size: parse_size(rest)?,
    })
}

/// Parses `number uid` from a `UIDL` line.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the number is malformed or the id missing.
pub fn parse_uid_entry(text: &str) -> Result<UidEntry> {
    let (number, rest) = split_number(text)?;
    let uid = rest.split_whitespace().next().unwrap_or_default();
    if uid.is_empty() {
        return Err(Error::Parse(format!("missing unique id in {text:?}")));
    }
    Ok(UidEntry {
        number,
        uid: uid.to_string(),
    })
}
