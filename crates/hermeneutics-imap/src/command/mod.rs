//! IMAP commands and their serialization.
//!
//! A command is its name and an ordered list of arguments. It serializes
//! into one or more segments: every segment but the last ends in a `{n}`
//! literal announcement, and the client waits for a `+` continuation
//! before sending the next one, which starts with the literal bytes.

mod tag_generator;

pub use tag_generator::TagGenerator;

use hermeneutics_net::sasl::Mechanism;

use crate::types::{SequenceSet, Untagged};
use crate::utf7;

/// One command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Sent verbatim: sequence sets, search keys, fetch items.
    Atom(String),
    /// A string: bare if it is a valid atom, quoted if it fits on a
    /// line, a literal otherwise.
    Str(String),
    /// A mailbox name, encoded in modified UTF-7 and then sent as a string.
    Mailbox(String),
    /// A LIST pattern: a mailbox name in which `%` and `*` stay bare.
    Pattern(String),
    /// Raw bytes, always sent as a literal.
    Literal(Vec<u8>),
    /// A parenthesized list.
    List(Vec<Self>),
}

impl Arg {
    /// An atom.
    #[must_use]
    pub fn atom(s: impl Into<String>) -> Self {
        Self::Atom(s.into())
    }

    /// A string.
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// A mailbox name.
    #[must_use]
    pub fn mailbox(name: impl Into<String>) -> Self {
        Self::Mailbox(name.into())
    }

    fn render(&self, out: &mut Segments) {
        match self {
            Self::Atom(s) => out.push(s.as_bytes()),
            Self::Str(s) => write_string(s, false, out),
            Self::Mailbox(name) => write_string(&utf7::encode(name), false, out),
            Self::Pattern(pattern) => write_string(&utf7::encode(pattern), true, out),
            Self::Literal(data) => out.literal(data),
            Self::List(items) => {
                out.push(b"(");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b" ");
                    }
                    item.render(out);
                }
                out.push(b")");
            }
        }
    }
}

impl From<&SequenceSet> for Arg {
    fn from(set: &SequenceSet) -> Self {
        Self::Atom(set.to_string())
    }
}

fn write_string(s: &str, wildcards: bool, out: &mut Segments) {
    if s
        .bytes()
        .any(|b| matches!(b, b'\r' | b'\n' | 0) || !b.is_ascii())
    {
        out.literal(s.as_bytes());
    } else if is_atom(s, wildcards) {
        out.push(s.as_bytes());
    } else {
        let mut quoted = Vec::with_capacity(s.len() + 2);
        quoted.push(b'"');
        for b in s.bytes() {
            if matches!(b, b'"' | b'\\') {
                quoted.push(b'\\');
            }
            quoted.push(b);
        }
        quoted.push(b'"');
        out.push(&quoted);
    }
}

fn is_atom(s: &str, wildcards: bool) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(b, b'(' | b')' | b'{' | b'"' | b'\\' | b']')
                && (wildcards || !matches!(b, b'%' | b'*'))
        })
}

/// Serialized command bytes, split at literals.
#[derive(Debug, Default)]
struct Segments {
    done: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl Segments {
    fn push(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }

    fn literal(&mut self, data: &[u8]) {
        self.push(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.done.push(std::mem::take(&mut self.current));
        self.push(data);
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.push(b"\r\n");
        self.done.push(self.current);
        self.done
    }
}

/// Which untagged responses a command claims as its own.
///
/// The rest are queued as unsolicited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Collect {
    All,
    Data(&'static [&'static str]),
    Nothing,
}

/// An IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Arg>,
    collect: Collect,
}

impl Command {
    /// A command that claims every untagged response it provokes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            collect: Collect::All,
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    /// Appends arguments.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args.extend(args);
        self
    }

    fn collecting(mut self, collect: Collect) -> Self {
        self.collect = collect;
        self
    }

    /// The command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// LOGIN.
    #[must_use]
    pub fn login(user: &str, password: &str) -> Self {
        Self::new("LOGIN")
            .arg(Arg::string(user))
            .arg(Arg::string(password))
            .collecting(Collect::Data(&["CAPABILITY"]))
    }

    /// AUTHENTICATE, answered through continuations.
    #[must_use]
    pub fn authenticate(mechanism: Mechanism) -> Self {
        Self::new("AUTHENTICATE")
            .arg(Arg::atom(mechanism.name()))
            .collecting(Collect::Data(&["CAPABILITY"]))
    }

    /// LOGOUT.
    #[must_use]
    pub fn logout() -> Self {
        Self::new("LOGOUT")
    }

    /// CAPABILITY.
    #[must_use]
    pub fn capability() -> Self {
        Self::new("CAPABILITY").collecting(Collect::Data(&["CAPABILITY"]))
    }

    /// NOOP. Everything it provokes is unsolicited.
    #[must_use]
    pub fn noop() -> Self {
        Self::new("NOOP").collecting(Collect::Nothing)
    }

    /// IDLE.
    #[must_use]
    pub fn idle() -> Self {
        Self::new("IDLE").collecting(Collect::Nothing)
    }

    /// SELECT.
    #[must_use]
    pub fn select(mailbox: &str) -> Self {
        Self::new("SELECT").arg(Arg::mailbox(mailbox))
    }

    /// EXAMINE.
    #[must_use]
    pub fn examine(mailbox: &str) -> Self {
        Self::new("EXAMINE").arg(Arg::mailbox(mailbox))
    }

    /// CLOSE.
    #[must_use]
    pub fn close() -> Self {
        Self::new("CLOSE").collecting(Collect::Nothing)
    }

    /// LIST.
    #[must_use]
    pub fn list(reference: &str, pattern: &str) -> Self {
        Self::new("LIST")
            .arg(Arg::mailbox(reference))
            .arg(Arg::Pattern(pattern.to_string()))
            .collecting(Collect::Data(&["LIST"]))
    }

    /// LSUB.
    #[must_use]
    pub fn lsub(reference: &str, pattern: &str) -> Self {
        Self::new("LSUB")
            .arg(Arg::mailbox(reference))
            .arg(Arg::Pattern(pattern.to_string()))
            .collecting(Collect::Data(&["LSUB"]))
    }

    /// STATUS with the given items, e.g. `MESSAGES` and `UNSEEN`.
    #[must_use]
    pub fn status(mailbox: &str, items: &[&str]) -> Self {
        Self::new("STATUS")
            .arg(Arg::mailbox(mailbox))
            .arg(Arg::List(items.iter().map(|&i| Arg::atom(i)).collect()))
            .collecting(Collect::Data(&["STATUS"]))
    }

    /// FETCH. A single item goes bare, several in a list.
    #[must_use]
    pub fn fetch(set: &SequenceSet, items: &[&str]) -> Self {
        let items = match items {
            [item] => Arg::atom(*item),
            _ => Arg::List(items.iter().map(|&i| Arg::atom(i)).collect()),
        };
        Self::new("FETCH")
            .arg(set.into())
            .arg(items)
            .collecting(Collect::Data(&["FETCH"]))
    }

    /// SEARCH.
    #[must_use]
    pub fn search(criteria: impl IntoIterator<Item = Arg>) -> Self {
        Self::new("SEARCH")
            .args(criteria)
            .collecting(Collect::Data(&["SEARCH"]))
    }

    /// Serializes the command under `tag`.
    #[must_use]
    pub fn segments(&self, tag: &str) -> Vec<Vec<u8>> {
        let mut out = Segments::default();
        out.push(tag.as_bytes());
        out.push(b" ");
        out.push(self.name.as_bytes());
        for arg in &self.args {
            out.push(b" ");
            arg.render(&mut out);
        }
        out.finish()
    }

    /// Returns true if `response` belongs to this command.
    pub(crate) fn claims(&self, response: &Untagged) -> bool {
        match self.collect {
            Collect::All => true,
            Collect::Nothing => false,
            Collect::Data(names) => response
                .as_data()
                .is_some_and(|data| names.iter().any(|n| n.eq_ignore_ascii_case(&data.name))),
        }
    }
}
