//! SMTP and LMTP command lines.

use crate::types::Address;

/// A client command, rendered by [`Command::to_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `HELO`, for servers without ESMTP.
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// `EHLO`, asks for the extension list.
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// `LHLO`, the LMTP form of EHLO.
    Lhlo {
        /// Client hostname
        hostname: String,
    },
    /// `STARTTLS`.
    StartTls,
    /// `AUTH mechanism [initial-response]`.
    Auth {
        /// Mechanism name
        mechanism: String,
        /// Base64 response sent along, saving a round trip.
        initial_response: Option<String>,
    },
    /// `MAIL FROM`, opens a transaction.
    MailFrom {
        /// Sender address
        from: Address,
        /// SIZE parameter
        size: Option<usize>,
    },
    /// `RCPT TO`, one per recipient.
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// `DATA`, the message follows dot-stuffed.
    Data,
    /// `BDAT size [LAST]`, the chunk follows verbatim.
    Bdat {
        /// Chunk size in bytes
        size: usize,
        /// Whether this is the final chunk
        last: bool,
    },
    /// `RSET`, drops the open transaction.
    Rset,
    /// `HELP [topic]`.
    Help {
        /// Topic
        topic: Option<String>,
    },
    /// `NOOP`.
    Noop,
    /// `QUIT`.
    Quit,
}

impl Command {
    /// The command line, without line break.
    #[must_use]
    pub fn to_line(&self) -> String {
        match self {
            Self::Helo { hostname } => format!("HELO {hostname}"),
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::Lhlo { hostname } => format!("LHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::Auth {
                mechanism,
                initial_response,
            } => match initial_response {
                Some(resp) => format!("AUTH {mechanism} {resp}"),
                None => format!("AUTH {mechanism}"),
            },
            Self::MailFrom { from, size } => match size {
                Some(size) => format!("MAIL FROM:{from} SIZE={size}"),
                None => format!("MAIL FROM:{from}"),
            },
            Self::RcptTo { to } => format!("RCPT TO:{to}"),
            Self::Data => "DATA".to_string(),
            Self::Bdat { size, last: true } => format!("BDAT {size} LAST"),
            Self::Bdat { size, last: false } => format!("BDAT {size}"),
            Self::Rset => "RSET".to_string(),
            Self::Help { topic: Some(topic) } => format!("HELP {topic}"),
            Self::Help { topic: None } => "HELP".to_string(),
            Self::Noop => "NOOP".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
    }

    /// Whether the reply may span several lines.
    #[must_use]
    pub const fn allows_multiline(&self) -> bool {
        matches!(
            self,
            Self::Helo { .. } | Self::Ehlo { .. } | Self::Lhlo { .. } | Self::Help { .. }
        )
    }
}
