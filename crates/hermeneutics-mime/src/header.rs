//! Header fields and the ordered header collection.

use crate::addrs::AddrList;
use crate::error::{Error, Result};
use crate::types::{
    ContentType, Contents, Count, FieldKind, HeaderValue, Id, IdList, PlainText, Timestamp,
};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Maximum length of a generated header line.
pub const LINE_MAX: usize = 78;

/// Indentation of generated continuation lines.
pub const INDENT: &str = "    ";

/// A single header field.
///
/// The raw data is kept as read; the typed contents are decoded on first
/// access and cached until the data changes.
///
/// A line that is not valid UTF-8 is read as Latin-1 and its bytes are
/// written back unchanged until the field is set anew.
#[derive(Debug, Clone)]
pub struct Header {
    name: String,
    data: String,
    kind: FieldKind,
    contents: OnceLock<HeaderValue>,
    raw: Option<Vec<u8>>,
}

impl Header {
    /// Parses a `Name: data` line. Continuation lines are expected to be
    /// joined with `\n` already.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColon`] if there is no colon.
    pub fn parse(line: &str) -> Result<Self> {
        let (name, data) = line
            .split_once(':')
            .ok_or_else(|| Error::MissingColon(line.to_string()))?;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Error::InvalidHeader(line.to_string()));
        }
        Ok(Self::with_data(name.to_string(), data.trim_start().to_string()))
    }

    /// Like [`Header::parse`], for a line straight off the wire.
    ///
    /// # Errors
    ///
    /// Same as [`Header::parse`].
    pub fn parse_bytes(line: &[u8]) -> Result<Self> {
        if let Ok(text) = std::str::from_utf8(line) {
            return Self::parse(text);
        }
        let mut header = Self::parse(&charset::decode_latin1(line))?;
        debug!(name = %header.name, "8-bit header kept as is");
        header.raw = Some(line.to_vec());
        Ok(header)
    }

    /// Creates a header from a typed value. The name is built with
    /// [`build_name`].
    #[must_use]
    pub fn new(name: &str, value: impl Into<HeaderValue>) -> Self {
        let value = value.into();
        let mut header = Self::with_data(build_name(name), String::new());
        header.data = fold(&header.name, &value.encode());
        if value.kind() == header.kind {
            let _ = header.contents.set(value);
        }
        header
    }

    /// Creates a header from text that is already in wire form.
    ///
    /// Whitespace runs are folded into generated line breaks.
    #[must_use]
    pub fn from_text(name: &str, text: &str) -> Self {
        let name = build_name(name);
        let words: Vec<String> = text.split_whitespace().map(String::from).collect();
        let data = fold(&name, &words);
        Self::with_data(name, data)
    }

    fn with_data(name: String, data: String) -> Self {
        let kind = FieldKind::for_name(&name);
        Self {
            name,
            data,
            kind,
            contents: OnceLock::new(),
            raw: None,
        }
    }

    /// The line as it goes out, without line break.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.raw
            .clone()
            .unwrap_or_else(|| self.to_string().into_bytes())
    }

    /// The field name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw field data, continuation lines included.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn name_is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The registered kind of this field.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The contents decoded as the registered kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not parse as that kind.
    pub fn contents(&self) -> Result<&HeaderValue> {
        if let Some(value) = self.contents.get() {
            return Ok(value);
        }
        let value = HeaderValue::parse(self.kind, &self.data)?;
        Ok(self.contents.get_or_init(|| value))
    }

    /// The contents decoded as the given kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not parse as that kind.
    pub fn contents_as(&self, kind: FieldKind) -> Result<Cow<'_, HeaderValue>> {
        if kind == self.kind {
            self.contents().map(Cow::Borrowed)
        } else {
            HeaderValue::parse(kind, &self.data).map(Cow::Owned)
        }
    }

    /// Replaces the data with the wire form of a value.
    pub fn set(&mut self, value: impl Into<HeaderValue>) {
        let value = value.into();
        self.data = fold(&self.name, &value.encode());
        self.contents = OnceLock::new();
        self.raw = None;
        if value.kind() == self.kind {
            let _ = self.contents.set(value);
        }
    }

    /// Rewrites the data from the decoded contents, normalizing encoding
    /// and folding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not parse as `kind`.
    pub fn recode(&mut self, kind: Option<FieldKind>) -> Result<()> {
        let value = self.contents_as(kind.unwrap_or(self.kind))?.into_owned();
        self.set(value);
        Ok(())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.data)
    }
}

/// Builds a field name from an identifier: `content_type` becomes
/// `Content-Type`.
#[must_use]
pub fn build_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        let c = if c == '_' { '-' } else { c };
        if word_start && c.is_ascii_lowercase() {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
        word_start = !c.is_alphanumeric();
    }
    result
}

/// Joins words to header data, breaking lines before they exceed
/// [`LINE_MAX`].
fn fold(name: &str, words: &[String]) -> String {
    let mut room = LINE_MAX.saturating_sub(name.len() + 2);
    let mut data = String::new();
    for word in words {
        if !data.is_empty() {
            if word.len() < room {
                data.push(' ');
                room -= 1;
            } else {
                data.push('\n');
                data.push_str(INDENT);
                room = LINE_MAX - INDENT.len();
            }
        }
        data.push_str(word);
        room = room.saturating_sub(word.len());
    }
    data
}

/// Ordered header fields with case-insensitive lookup.
///
/// Duplicates are allowed; lookups return the first match.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    list: Vec<Header>,
}

macro_rules! typed_accessors {
    ($($(#[$doc:meta])* $method:ident => $name:literal, $as:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $method(&self) -> Option<&$ty> {
                self.typed($name).and_then(HeaderValue::$as)
            }
        )*
    };
}

impl Headers {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self { list: Vec::new() }
    }

    /// Parses a header section.
    ///
    /// Lines starting with whitespace continue the previous field and are
    /// joined with `\n`. Parsing stops at the first empty line.
    ///
    /// # Errors
    ///
    /// Returns an error for a leading continuation line or a line without
    /// a colon.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_bytes(text.as_bytes())
    }

    /// Parses a header section that may hold unencoded 8-bit data.
    ///
    /// # Errors
    ///
    /// Same as [`Headers::parse`].
    pub fn parse_bytes(input: &[u8]) -> Result<Self> {
        let mut lines: Vec<Vec<u8>> = Vec::new();
        for line in input.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if line.starts_with(b" ") || line.starts_with(b"\t") {
                let last = lines.last_mut().ok_or_else(|| {
                    Error::InvalidHeader(format!(
                        "first line may not be a continuation: {}",
                        String::from_utf8_lossy(line)
                    ))
                })?;
                last.push(b'\n');
                last.extend_from_slice(line);
            } else {
                lines.push(line.to_vec());
            }
        }
        let list = lines
            .iter()
            .map(|l| Header::parse_bytes(l))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { list })
    }

    /// The header section as it goes out, one `\n` after each field.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for header in &self.list {
            out.extend(header.to_bytes());
            out.push(b'\n');
        }
        out
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Whether there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.list.iter()
    }

    /// Whether a field is present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The first field with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Header> {
        let name = build_name(name);
        self.list.iter().find(|h| h.name_is(&name))
    }

    /// All fields with the given name.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Header> + 'a {
        let name = build_name(name);
        self.list.iter().filter(move |h| h.name_is(&name))
    }

    /// The raw data of the first field with the given name.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.get(name).map(Header::data)
    }

    /// The decoded contents of the first field with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is present but malformed.
    pub fn field(&self, name: &str) -> Result<Option<&HeaderValue>> {
        self.get(name).map(Header::contents).transpose()
    }

    /// The contents of the first field decoded as `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is present but malformed.
    pub fn field_as(&self, name: &str, kind: FieldKind) -> Result<Option<Cow<'_, HeaderValue>>> {
        self.get(name).map(|h| h.contents_as(kind)).transpose()
    }

    fn typed(&self, name: &str) -> Option<&HeaderValue> {
        match self.field(name) {
            Ok(value) => value,
            Err(e) => {
                debug!(field = name, error = %e, "ignoring malformed header");
                None
            }
        }
    }

    typed_accessors! {
        /// `From:`
        from => "From", as_addr_list -> AddrList;
        /// `To:`
        to => "To", as_addr_list -> AddrList;
        /// `Cc:`
        cc => "Cc", as_addr_list -> AddrList;
        /// `Bcc:`
        bcc => "Bcc", as_addr_list -> AddrList;
        /// `Reply-To:`
        reply_to => "Reply-To", as_addr_list -> AddrList;
        /// `Sender:`
        sender => "Sender", as_addr_list -> AddrList;
        /// `Return-Path:`
        return_path => "Return-Path", as_addr_list -> AddrList;
        /// `Subject:`
        subject => "Subject", as_plain_text -> PlainText;
        /// `Date:`
        date => "Date", as_timestamp -> Timestamp;
        /// `Message-ID:`
        message_id => "Message-ID", as_id -> Id;
        /// `In-Reply-To:`
        in_reply_to => "In-Reply-To", as_id -> Id;
        /// `References:`
        references => "References", as_id_list -> IdList;
        /// `Content-Type:`
        content_type => "Content-Type", as_content_type -> ContentType;
        /// `Content-Transfer-Encoding:`
        content_transfer_encoding => "Content-Transfer-Encoding", as_contents -> Contents;
        /// `Content-Disposition:`
        content_disposition => "Content-Disposition", as_contents -> Contents;
    }

    /// `Content-Length:`
    #[must_use]
    pub fn content_length(&self) -> Option<Count> {
        self.typed("Content-Length").and_then(HeaderValue::as_count)
    }

    /// Inserts a field at the front.
    pub fn insert(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        self.list.insert(0, Header::new(name, value));
        self
    }

    /// Appends a field.
    pub fn add(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        self.list.push(Header::new(name, value));
        self
    }

    /// Appends a prepared field.
    pub fn push(&mut self, header: Header) -> &mut Self {
        self.list.push(header);
        self
    }

    /// Removes all fields with the given name.
    pub fn remove(&mut self, name: &str) -> &mut Self {
        let name = build_name(name);
        self.list.retain(|h| !h.name_is(&name));
        self
    }

    /// Removes the fields with the given name whose contents match.
    ///
    /// Fields that fail to decode are kept.
    pub fn remove_if<F>(&mut self, name: &str, mut predicate: F) -> &mut Self
    where
        F: FnMut(&HeaderValue) -> bool,
    {
        let name = build_name(name);
        self.list
            .retain(|h| !(h.name_is(&name) && h.contents().is_ok_and(&mut predicate)));
        self
    }

    /// Removes the fields with the given name that carry no data.
    pub fn compact(&mut self, name: &str) -> &mut Self {
        let name = build_name(name);
        self.list
            .retain(|h| !(h.name_is(&name) && h.data.trim().is_empty()));
        self
    }

    /// Replaces all fields with the given name by one new field.
    ///
    /// The new field takes the position of the first match, or is
    /// appended if there was none.
    pub fn replace(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        let header = Header::new(name, value);
        match self.list.iter().position(|h| h.name_is(&header.name)) {
            Some(pos) => {
                let name = header.name.clone();
                self.list[pos] = header;
                let mut index = 0;
                self.list.retain(|h| {
                    let keep = index <= pos || !h.name_is(&name);
                    index += 1;
                    keep
                });
            }
            None => self.list.push(header),
        }
        self
    }

    /// Maps the contents of every field with the given name in place.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the fields does not decode; fields
    /// before it are already rewritten.
    pub fn replace_all<F>(&mut self, name: &str, mut f: F) -> Result<&mut Self>
    where
        F: FnMut(HeaderValue) -> HeaderValue,
    {
        let name = build_name(name);
        for header in self.list.iter_mut().filter(|h| h.name_is(&name)) {
            let value = header.contents()?.clone();
            header.set(f(value));
        }
        Ok(self)
    }

    /// Merges a value into the first field with the given name, or
    /// appends a new field.
    ///
    /// Address lists, id lists and dictionaries are extended; other kinds
    /// are replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing field does not decode.
    pub fn replace_add(&mut self, name: &str, value: impl Into<HeaderValue>) -> Result<&mut Self> {
        let value = value.into();
        let built = build_name(name);
        let Some(header) = self.list.iter_mut().find(|h| h.name_is(&built)) else {
            self.list.push(Header::new(name, value));
            return Ok(self);
        };
        let merged = merge(header.contents()?.clone(), value);
        header.set(merged);
        Ok(self)
    }

    /// Rewrites every field with the given name from its decoded contents.
    ///
    /// # Errors
    ///
    /// Returns an error if a field does not decode.
    pub fn recode(&mut self, name: &str, kind: Option<FieldKind>) -> Result<&mut Self> {
        let name = build_name(name);
        for header in self.list.iter_mut().filter(|h| h.name_is(&name)) {
            header.recode(kind)?;
        }
        Ok(self)
    }
}

fn merge(current: HeaderValue, value: HeaderValue) -> HeaderValue {
    match (current, value) {
        (HeaderValue::AddrList(mut list), HeaderValue::AddrList(more)) => {
            for addr in more {
                list.push(addr);
            }
            HeaderValue::AddrList(list)
        }
        (HeaderValue::IdList(mut list), HeaderValue::IdList(more)) => {
            for id in more.ids() {
                list.push(id.clone());
            }
            HeaderValue::IdList(list)
        }
        (HeaderValue::Dictionary(mut dict), HeaderValue::Dictionary(more)) => {
            for (k, v) in more.iter() {
                dict.set(k, v);
            }
            HeaderValue::Dictionary(dict)
        }
        (_, value) => value,
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for header in &self.list {
            writeln!(f, "{header}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.list.iter()
    }
}
