//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::{Arg, Command};
use crate::types::{Fetch, MailboxStatus, SequenceSet, Untagged};
use crate::{Error, Result};

impl<S> Client<Selected, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Returns the selected mailbox name.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.state.mailbox
    }

    /// Returns the status reported when the mailbox was selected.
    #[must_use]
    pub const fn mailbox_status(&self) -> &MailboxStatus {
        &self.state.status
    }

    /// Fetches data items such as `FLAGS`, `UID` or `BODY[]` for a set of messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or sends malformed data.
    pub async fn fetch(&mut self, set: &SequenceSet, items: &[&str]) -> Result<Vec<Fetch>> {
        let responses = self.command(&Command::fetch(set, items)).await?;
        responses
            .iter()
            .filter_map(Untagged::as_data)
            .map(Fetch::from_data)
            .collect()
    }

    /// Searches the mailbox and returns matching sequence numbers.
    ///
    /// ```ignore
    /// let unseen = client.search([Arg::atom("UNSEEN")]).await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the criteria.
    pub async fn search(&mut self, criteria: impl IntoIterator<Item = Arg>) -> Result<Vec<u32>> {
        let responses = self.command(&Command::search(criteria)).await?;
        responses
            .iter()
            .filter_map(Untagged::as_data)
            .flat_map(|data| &data.values)
            .map(|value| {
                value
                    .as_number()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| Error::Protocol(format!("bad SEARCH result {value}")))
            })
            .collect()
    }

    /// Closes the mailbox, expunging deleted messages, and returns to the
    /// authenticated state.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses.
    pub async fn close(mut self) -> Result<Client<Authenticated, S>> {
        self.command(&Command::close()).await?;
        Ok(self.into_state(Authenticated))
    }
}
