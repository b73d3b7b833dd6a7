//! Typed views of SELECT, LIST, STATUS and FETCH data.

use super::{Data, StatusResponse, Untagged, Value};
use crate::error::{Error, Result};

/// Mailbox state reported by SELECT or EXAMINE.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number.
    pub unseen: Option<u32>,
    /// Next UID to be assigned.
    pub uid_next: Option<u32>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<u32>,
    /// Flags defined for this mailbox.
    pub flags: Vec<String>,
    /// Flags that can be permanently stored.
    pub permanent_flags: Vec<String>,
    /// Whether mailbox is read-only.
    pub read_only: bool,
}

impl MailboxStatus {
    /// Collects the untagged responses of a SELECT and its final status.
    #[must_use]
    pub fn from_responses(responses: &[Untagged], done: &StatusResponse) -> Self {
        let mut status = Self::default();
        for response in responses {
            match response {
                Untagged::Data(data) => match (data.name.as_str(), data.number) {
                    ("EXISTS", Some(n)) => status.exists = n,
                    ("RECENT", Some(n)) => status.recent = n,
                    ("FLAGS", None) => status.flags = atoms(data.values.first()),
                    _ => {}
                },
                Untagged::Status(s) => {
                    let Some(code) = &s.code else { continue };
                    let first = code.values.first();
                    match code.name.as_str() {
                        "UNSEEN" => status.unseen = number(first),
                        "UIDNEXT" => status.uid_next = number(first),
                        "UIDVALIDITY" => status.uid_validity = number(first),
                        "PERMANENTFLAGS" => status.permanent_flags = atoms(first),
                        _ => {}
                    }
                }
            }
        }
        status.read_only = done.code("READ-ONLY").is_some();
        status
    }
}

fn number(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_number)
        .and_then(|n| u32::try_from(n).ok())
}

fn atoms(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// One LIST or LSUB entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Name attributes such as `\Noselect`.
    pub attributes: Vec<String>,
    /// Hierarchy delimiter, if the server has one.
    pub delimiter: Option<char>,
    /// Mailbox name, decoded from modified UTF-7.
    pub name: String,
}

impl ListEntry {
    /// Reads `(attributes) delimiter name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the data has another shape.
    pub fn from_data(data: &Data) -> Result<Self> {
        let [attributes, delimiter, name] = data.values.as_slice() else {
            return Err(Error::Protocol(format!("malformed {} data", data.name)));
        };
        if attributes.as_list().is_none() {
            return Err(Error::Protocol(format!("malformed {} attributes", data.name)));
        }
        Ok(Self {
            attributes: atoms(Some(attributes)),
            delimiter: delimiter.as_str().and_then(|d| d.chars().next()),
            name: name.to_mailbox()?,
        })
    }

    /// Returns true if the entry carries `attribute`, ignoring case.
    #[must_use]
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
    }
}

/// The data items FETCH returned for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    /// Message sequence number.
    pub number: u32,
    /// Item names and their values, in server order.
    pub items: Vec<(String, Value)>,
}

impl Fetch {
    /// Reads `* n FETCH (name value ...)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the number is missing or the list
    /// does not pair up.
    pub fn from_data(data: &Data) -> Result<Self> {
        let number = data
            .number
            .ok_or_else(|| Error::Protocol("FETCH data without message number".into()))?;
        let list = data
            .values
            .first()
            .and_then(Value::as_list)
            .ok_or_else(|| Error::Protocol(format!("FETCH data for {number} is not a list")))?;
        if list.len() % 2 != 0 {
            return Err(Error::Protocol(format!("odd FETCH item list for {number}")));
        }
        let items = list
            .chunks_exact(2)
            .map(|pair| {
                let name = pair[0]
                    .as_str()
                    .ok_or_else(|| Error::Protocol(format!("bad FETCH item name {}", pair[0])))?;
                Ok((name.to_ascii_uppercase(), pair[1].clone()))
            })
            .collect::<Result<_>>()?;
        Ok(Self { number, items })
    }

    /// The value of item `name`, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.items
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// The message flags, if fetched.
    #[must_use]
    pub fn flags(&self) -> Option<Vec<String>> {
        self.get("FLAGS").map(|v| atoms(Some(v)))
    }

    /// The UID, if fetched.
    #[must_use]
    pub fn uid(&self) -> Option<u32> {
        number(self.get("UID"))
    }
}
