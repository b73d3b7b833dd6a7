//! Server replies.
//!
//! A reply is a three digit code and one or more text lines. Only the
//! first digit decides how the client proceeds, see [`ReplyKind`].

use std::fmt;

/// How the first digit of a code tells the client to go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyKind {
    /// 1xx, accepted but not yet acted on.
    Preliminary,
    /// 2xx.
    Completed,
    /// 3xx, the server waits for more input (data, SASL response).
    Intermediate,
    /// 4xx, try again later.
    Transient,
    /// 5xx.
    Permanent,
    /// Anything outside 100..=599.
    Unknown,
}

/// A numeric reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// `220` greeting.
    pub const SERVICE_READY: Self = Self(220);
    /// `221` answer to QUIT.
    pub const CLOSING: Self = Self(221);
    /// `235` after a successful AUTH.
    pub const AUTH_OK: Self = Self(235);
    /// `250` plain success.
    pub const OK: Self = Self(250);
    /// `334` SASL challenge follows.
    pub const AUTH_CONTINUE: Self = Self(334);
    /// `354` send the message, end with a lone dot.
    pub const START_DATA: Self = Self(354);
    /// `421` the server is shutting down.
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// `450` mailbox temporarily busy.
    pub const MAILBOX_BUSY: Self = Self(450);
    /// `535` credentials refused.
    pub const AUTH_FAILED: Self = Self(535);
    /// `550` no such mailbox, or delivery refused.
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);

    /// Wraps a raw code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The raw number.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Classifies the code by its leading digit.
    #[must_use]
    pub const fn kind(self) -> ReplyKind {
        match self.0 {
            100..=199 => ReplyKind::Preliminary,
            200..=299 => ReplyKind::Completed,
            300..=399 => ReplyKind::Intermediate,
            400..=499 => ReplyKind::Transient,
            500..=599 => ReplyKind::Permanent,
            _ => ReplyKind::Unknown,
        }
    }

    /// True for 2xx.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.kind(), ReplyKind::Completed)
    }

    /// True for 3xx.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        matches!(self.kind(), ReplyKind::Intermediate)
    }

    /// True for 4xx and 5xx.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self.kind(), ReplyKind::Transient | ReplyKind::Permanent)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// A complete, possibly multi-line reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Code shared by every line.
    pub code: ReplyCode,
    /// Line texts with code and separator stripped.
    pub message: Vec<String>,
}

impl Reply {
    /// Builds a reply from its parts.
    #[must_use]
    pub const fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// See [`ReplyCode::is_success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// See [`ReplyCode::is_intermediate`].
    #[must_use]
    pub const fn is_intermediate(&self) -> bool {
        self.code.is_intermediate()
    }

    /// Text of the line carrying the space separator; SASL challenges
    /// live here.
    #[must_use]
    pub fn last_line(&self) -> &str {
        self.message.last().map_or("", String::as_str)
    }

    /// All lines joined by newlines, for error messages.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.last_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_first_digit() {
        assert_eq!(ReplyCode::new(110).kind(), ReplyKind::Preliminary);
        assert_eq!(ReplyCode::CLOSING.kind(), ReplyKind::Completed);
        assert_eq!(ReplyCode::START_DATA.kind(), ReplyKind::Intermediate);
        assert_eq!(ReplyCode::MAILBOX_BUSY.kind(), ReplyKind::Transient);
        assert_eq!(ReplyCode::AUTH_FAILED.kind(), ReplyKind::Permanent);
        assert_eq!(ReplyCode::new(7).kind(), ReplyKind::Unknown);
        assert_eq!(ReplyCode::new(600).kind(), ReplyKind::Unknown);

        assert!(ReplyCode::AUTH_CONTINUE.is_intermediate());
        assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_failure());
        assert!(!ReplyCode::OK.is_failure());
    }

    #[test]
    fn code_is_zero_padded() {
        assert_eq!(ReplyCode::OK.to_string(), "250");
        assert_eq!(ReplyCode::new(7).to_string(), "007");
    }

    #[test]
    fn multi_line_reply() {
        let reply = Reply::new(
            ReplyCode::SERVICE_READY,
            vec!["mx.example.org ESMTP".to_string(), "go ahead".to_string()],
        );
        assert_eq!(reply.message_text(), "mx.example.org ESMTP\ngo ahead");
        assert_eq!(reply.last_line(), "go ahead");
        assert_eq!(reply.to_string(), "220 go ahead");
    }

    #[test]
    fn empty_reply() {
        let reply = Reply::new(ReplyCode::OK, vec![]);
        assert!(reply.is_success());
        assert_eq!(reply.message_text(), "");
        assert_eq!(reply.last_line(), "");
    }
}
