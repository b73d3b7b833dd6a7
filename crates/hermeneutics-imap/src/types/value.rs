//! Data items of server responses.

use std::fmt;

use crate::error::{Error, Result};
use crate::utf7;

/// One data item of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A bare token such as `FLAGS`, `\Seen` or `BODY[HEADER]`.
    Atom(String),
    /// A quoted string, unescaped.
    Quoted(String),
    /// A `{n}` literal: exactly the bytes the server announced.
    Literal(Vec<u8>),
    /// `NIL`.
    Nil,
    /// A parenthesized list.
    List(Vec<Self>),
}

impl Value {
    /// The text of an atom, a quoted string or a UTF-8 literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Atom(s) | Self::Quoted(s) => Some(s),
            Self::Literal(bytes) => std::str::from_utf8(bytes).ok(),
            Self::Nil | Self::List(_) => None,
        }
    }

    /// The bytes of an atom, a quoted string or a literal.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Atom(s) | Self::Quoted(s) => Some(s.as_bytes()),
            Self::Literal(bytes) => Some(bytes),
            Self::Nil | Self::List(_) => None,
        }
    }

    /// The items of a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// An atom read as a number.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Atom(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Returns true for `NIL`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true for an atom equal to `name`, ignoring case.
    #[must_use]
    pub fn is_atom(&self, name: &str) -> bool {
        matches!(self, Self::Atom(s) if s.eq_ignore_ascii_case(name))
    }

    /// The value as a mailbox name, decoded from modified UTF-7.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the value is not a string and
    /// [`Error::Parse`] if it is not valid modified UTF-7.
    pub fn to_mailbox(&self) -> Result<String> {
        let name = self
            .as_str()
            .ok_or_else(|| Error::Protocol(format!("expected mailbox name, got {self}")))?;
        utf7::decode(name)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(s) => f.write_str(s),
            Self::Quoted(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::Literal(bytes) => write!(f, "{{{}}}", bytes.len()),
            Self::Nil => f.write_str("NIL"),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}
