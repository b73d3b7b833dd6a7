//! Typed header field values.
//!
//! Every header name maps to a [`FieldKind`] through a fixed registry;
//! [`HeaderValue`] holds a decoded value of one of these kinds.

mod content_type;
mod count;
mod dictionary;
mod id;
mod plain_text;
mod timestamp;

pub use content_type::{ContentType, Contents};
pub use count::Count;
pub use dictionary::Dictionary;
pub use id::{Id, IdList};
pub use plain_text::{PlainText, normalize};
pub use timestamp::Timestamp;

use crate::addrs::AddrList;
use crate::error::Result;
use std::fmt;

/// The kinds of typed header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Unstructured text.
    PlainText,
    /// A date.
    Timestamp,
    /// A single message id.
    Id,
    /// A list of message ids.
    IdList,
    /// A list of addresses.
    AddrList,
    /// A non-negative number.
    Count,
    /// A bare parameter list.
    Dictionary,
    /// A caption with parameters.
    Contents,
    /// A MIME type with parameters.
    ContentType,
}

const REGISTRY: &[(&str, FieldKind)] = &[
    ("Content-Type", FieldKind::ContentType),
    ("To", FieldKind::AddrList),
    ("Cc", FieldKind::AddrList),
    ("Bcc", FieldKind::AddrList),
    ("From", FieldKind::AddrList),
    ("Sender", FieldKind::AddrList),
    ("Reply-To", FieldKind::AddrList),
    ("Return-Path", FieldKind::AddrList),
    ("Envelope-To", FieldKind::AddrList),
    ("Subject", FieldKind::PlainText),
    ("User-Agent", FieldKind::PlainText),
    ("Content-Disposition", FieldKind::Contents),
    ("Content-Transfer-Encoding", FieldKind::Contents),
    ("Date", FieldKind::Timestamp),
    ("Delivery-Date", FieldKind::Timestamp),
    ("Message-ID", FieldKind::Id),
    ("List-ID", FieldKind::Id),
    ("In-Reply-To", FieldKind::Id),
    ("References", FieldKind::IdList),
    ("Content-Length", FieldKind::Count),
    ("Lines", FieldKind::Count),
    ("DKIM-Signature", FieldKind::Dictionary),
    ("DomainKey-Signature", FieldKind::Dictionary),
];

impl FieldKind {
    /// The registered kind for a header name; unknown names are plain text.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        REGISTRY
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map_or(Self::PlainText, |(_, kind)| *kind)
    }
}

/// A decoded header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Unstructured text.
    PlainText(PlainText),
    /// A date.
    Timestamp(Timestamp),
    /// A single message id.
    Id(Id),
    /// A list of message ids.
    IdList(IdList),
    /// A list of addresses.
    AddrList(AddrList),
    /// A non-negative number.
    Count(Count),
    /// A bare parameter list.
    Dictionary(Dictionary),
    /// A caption with parameters.
    Contents(Contents),
    /// A MIME type with parameters.
    ContentType(ContentType),
}

impl HeaderValue {
    /// Decodes raw header data as the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not fit the kind.
    pub fn parse(kind: FieldKind, raw: &str) -> Result<Self> {
        Ok(match kind {
            FieldKind::PlainText => Self::PlainText(PlainText::parse(raw)),
            FieldKind::Timestamp => Self::Timestamp(Timestamp::parse(raw)?),
            FieldKind::Id => Self::Id(Id::parse(raw)?),
            FieldKind::IdList => Self::IdList(IdList::parse(raw)),
            FieldKind::AddrList => Self::AddrList(AddrList::parse(raw)),
            FieldKind::Count => Self::Count(Count::parse(raw)?),
            FieldKind::Dictionary => Self::Dictionary(Dictionary::parse(raw)),
            FieldKind::Contents => Self::Contents(Contents::parse(raw)?),
            FieldKind::ContentType => Self::ContentType(ContentType::parse(raw)?),
        })
    }

    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::PlainText(_) => FieldKind::PlainText,
            Self::Timestamp(_) => FieldKind::Timestamp,
            Self::Id(_) => FieldKind::Id,
            Self::IdList(_) => FieldKind::IdList,
            Self::AddrList(_) => FieldKind::AddrList,
            Self::Count(_) => FieldKind::Count,
            Self::Dictionary(_) => FieldKind::Dictionary,
            Self::Contents(_) => FieldKind::Contents,
            Self::ContentType(_) => FieldKind::ContentType,
        }
    }

    /// Header wire words, ready for folding.
    #[must_use]
    pub fn encode(&self) -> Vec<String> {
        match self {
            Self::PlainText(v) => v.encode(),
            Self::Timestamp(v) => v.encode(),
            Self::Id(v) => v.encode(),
            Self::IdList(v) => v.encode(),
            Self::AddrList(v) => v.encode(),
            Self::Count(v) => v.encode(),
            Self::Dictionary(v) => v.encode(),
            Self::Contents(v) => v.encode(),
            Self::ContentType(v) => v.encode(),
        }
    }

    /// The plain text, if this is one.
    #[must_use]
    pub const fn as_plain_text(&self) -> Option<&PlainText> {
        match self {
            Self::PlainText(v) => Some(v),
            _ => None,
        }
    }

    /// The timestamp, if this is one.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            Self::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    /// The message id, if this is one.
    #[must_use]
    pub const fn as_id(&self) -> Option<&Id> {
        match self {
            Self::Id(v) => Some(v),
            _ => None,
        }
    }

    /// The id list, if this is one.
    #[must_use]
    pub const fn as_id_list(&self) -> Option<&IdList> {
        match self {
            Self::IdList(v) => Some(v),
            _ => None,
        }
    }

    /// The address list, if this is one.
    #[must_use]
    pub const fn as_addr_list(&self) -> Option<&AddrList> {
        match self {
            Self::AddrList(v) => Some(v),
            _ => None,
        }
    }

    /// The count, if this is one.
    #[must_use]
    pub const fn as_count(&self) -> Option<Count> {
        match self {
            Self::Count(v) => Some(*v),
            _ => None,
        }
    }

    /// The dictionary, if this is one.
    #[must_use]
    pub const fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(v) => Some(v),
            _ => None,
        }
    }

    /// The contents, if this is one.
    #[must_use]
    pub const fn as_contents(&self) -> Option<&Contents> {
        match self {
            Self::Contents(v) => Some(v),
            _ => None,
        }
    }

    /// The content type, if this is one.
    #[must_use]
    pub const fn as_content_type(&self) -> Option<&ContentType> {
        match self {
            Self::ContentType(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText(v) => v.fmt(f),
            Self::Timestamp(v) => v.fmt(f),
            Self::Id(v) => v.fmt(f),
            Self::IdList(v) => v.fmt(f),
            Self::AddrList(v) => v.fmt(f),
            Self::Count(v) => v.fmt(f),
            Self::Dictionary(v) => v.fmt(f),
            Self::Contents(v) => v.fmt(f),
            Self::ContentType(v) => v.fmt(f),
        }
    }
}

macro_rules! impl_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for HeaderValue {
                fn from(v: $variant) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from!(PlainText, Timestamp, Id, IdList, AddrList, Count, Dictionary, Contents, ContentType);

impl From<&str> for HeaderValue {
    fn from(text: &str) -> Self {
        Self::PlainText(PlainText::new(text))
    }
}

impl From<String> for HeaderValue {
    fn from(text: String) -> Self {
        Self::PlainText(PlainText::new(&text))
    }
}
