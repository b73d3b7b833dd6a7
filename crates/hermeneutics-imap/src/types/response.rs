//! Parsed server responses.

use std::fmt;

use super::Value;
use crate::error::{Error, Result};

/// Status of a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// Operational failure.
    No,
    /// Protocol-level error.
    Bad,
    /// Server is closing the connection.
    Bye,
    /// Connection starts authenticated.
    PreAuth,
}

impl Status {
    /// Parses a status word, ignoring case.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "BYE" => Some(Self::Bye),
            "PREAUTH" => Some(Self::PreAuth),
            _ => None,
        }
    }

    /// The status word.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::Bye => "BYE",
            Self::PreAuth => "PREAUTH",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bracketed response code such as `[UIDVALIDITY 3857529045]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// Code name, upper case.
    pub name: String,
    /// Arguments following the name.
    pub values: Vec<Value>,
}

/// `OK`, `NO`, `BAD`, `BYE` or `PREAUTH` with optional code and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// The status.
    pub status: Status,
    /// The response code, if any.
    pub code: Option<Code>,
    /// Human-readable text.
    pub text: String,
}

impl StatusResponse {
    /// Returns the code if its name matches, ignoring case.
    #[must_use]
    pub fn code(&self, name: &str) -> Option<&Code> {
        self.code
            .as_ref()
            .filter(|code| code.name.eq_ignore_ascii_case(name))
    }

    /// Turns `NO`, `BAD` and `BYE` into errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`], [`Error::Bad`] or [`Error::Bye`] with the
    /// response text.
    pub fn check(self) -> Result<Self> {
        match self.status {
            Status::Ok | Status::PreAuth => Ok(self),
            Status::No => Err(Error::No(self.text)),
            Status::Bad => Err(Error::Bad(self.text)),
            Status::Bye => Err(Error::Bye(self.text)),
        }
    }
}

/// Untagged data such as `* 23 EXISTS` or `* SEARCH 2 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
    /// Leading message number, as in `* 2 FETCH`.
    pub number: Option<u32>,
    /// Data name, upper case.
    pub name: String,
    /// Items following the name.
    pub values: Vec<Value>,
}

/// A response starting with `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Untagged {
    /// Untagged status response.
    Status(StatusResponse),
    /// Untagged data.
    Data(Data),
}

impl Untagged {
    /// The data name, or the status word.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Status(status) => status.status.as_str(),
            Self::Data(data) => &data.name,
        }
    }

    /// The text of a `BYE`.
    #[must_use]
    pub fn bye_text(&self) -> Option<&str> {
        match self {
            Self::Status(status) if status.status == Status::Bye => Some(&status.text),
            _ => None,
        }
    }

    /// The data, if this is data.
    #[must_use]
    pub const fn as_data(&self) -> Option<&Data> {
        match self {
            Self::Data(data) => Some(data),
            Self::Status(_) => None,
        }
    }
}

/// A complete server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Final response to the command carrying `tag`.
    Tagged {
        /// The command tag.
        tag: String,
        /// The outcome.
        status: StatusResponse,
    },
    /// `+` request for more data, with its text.
    Continuation(String),
    /// `*` response.
    Untagged(Untagged),
}
