//! Core IMAP types.

mod mailbox;
mod response;
mod sequence;
mod value;

pub use mailbox::{Fetch, ListEntry, MailboxStatus};
pub use response::{Code, Data, Response, Status, StatusResponse, Untagged};
pub use sequence::{SeqNumber, SequenceSet};
pub use value::Value;
