//! Session states a [`Client`](super::Client) moves through.

use crate::types::MailboxStatus;

/// Greeted, credentials not yet accepted. LOGIN, AUTHENTICATE and
/// STARTTLS live here.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is open, by SELECT or read-only by EXAMINE.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: String,
    pub(crate) status: MailboxStatus,
}

/// Either logged-in state. LIST, STATUS, SELECT and IDLE are allowed in
/// both.
pub trait Authorized: private::Sealed {}

impl Authorized for Authenticated {}
impl Authorized for Selected {}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Authenticated {}
    impl Sealed for super::Selected {}
}
