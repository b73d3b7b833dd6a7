//! POP3 command lines.

/// POP3 command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// USER - Name the mailbox
    User(String),
    /// PASS - Password for the named mailbox
    Pass(String),
    /// APOP - Name and MD5 digest in one step
    Apop {
        /// Mailbox name
        name: String,
        /// Hex digest of timestamp and password
        digest: String,
    },
    /// CAPA - List capabilities
    Capa,
    /// STAT - Maildrop size
    Stat,
    /// LIST - Message sizes, one or all
    List(Option<u32>),
    /// UIDL - Unique ids, one or all
    Uidl(Option<u32>),
    /// RETR - Fetch a message
    Retr(u32),
    /// TOP - Fetch headers and the first lines of the body
    Top {
        /// Message number
        number: u32,
        /// Body lines
        lines: u32,
    },
    /// DELE - Mark for deletion
    Dele(u32),
    /// RSET - Unmark deletions
    Rset,
    /// NOOP - No operation
    Noop,
    /// QUIT - Commit deletions and close
    Quit,
}

impl Command {
    /// The command line, without line break.
    #[must_use]
    pub fn to_line(&self) -> String {
        match self {
            Self::User(name) => format!("USER {name}"),
            Self::Pass(password) => format!("PASS {password}"),
            Self::Apop { name, digest } => format!("APOP {name} {digest}"),
            Self::Capa => "CAPA".to_string(),
            Self::Stat => "STAT".to_string(),
            Self::List(Some(n)) => format!("LIST {n}"),
            Self::List(None) => "LIST".to_string(),
            Self::Uidl(Some(n)) => format!("UIDL {n}"),
            Self::Uidl(None) => "UIDL".to_string(),
            Self::Retr(n) => format!("RETR {n}"),
            Self::Top { number, lines } => format!("TOP {number} {lines}"),
            Self::Dele(n) => format!("DELE {n}"),
            Self::Rset => "RSET".to_string(),
            Self::Noop => "NOOP".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
    }

    /// Whether a `+OK` is followed by a dot-terminated data block.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        matches!(
            self,
            Self::Capa
                | Self::List(None)
                | Self::Uidl(None)
                | Self::Retr(_)
                | Self::Top { .. }
        )
    }
}
