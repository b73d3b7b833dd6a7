//! Mailbox operations, valid once authenticated.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authorized, Selected};
use crate::command::Command;
use crate::types::{Data, ListEntry, MailboxStatus, Untagged};
use crate::{Error, Result};

impl<State, S> Client<State, S>
where
    State: Authorized,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Selects a mailbox for read-write access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] if the mailbox does not exist. The session
    /// then has no mailbox selected.
    pub async fn select(self, mailbox: &str) -> Result<(Client<Selected, S>, MailboxStatus)> {
        self.open(Command::select(mailbox), mailbox).await
    }

    /// Selects a mailbox read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] if the mailbox does not exist.
    pub async fn examine(self, mailbox: &str) -> Result<(Client<Selected, S>, MailboxStatus)> {
        self.open(Command::examine(mailbox), mailbox).await
    }

    async fn open(
        mut self,
        command: Command,
        mailbox: &str,
    ) -> Result<(Client<Selected, S>, MailboxStatus)> {
        let done = self.run(&command, None).await?;
        let status = MailboxStatus::from_responses(&done.responses, &done.status);
        done.status.check()?;
        debug!(mailbox, exists = status.exists, "mailbox selected");
        let state = Selected {
            mailbox: mailbox.to_string(),
            status: status.clone(),
        };
        Ok((self.into_state(state), status))
    }

    /// Lists mailboxes matching `pattern` relative to `reference`.
    ///
    /// Both may use the `*` and `%` wildcards.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or sends a malformed entry.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let responses = self.command(&Command::list(reference, pattern)).await?;
        data(&responses).map(ListEntry::from_data).collect()
    }

    /// Lists subscribed mailboxes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or sends a malformed entry.
    pub async fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let responses = self.command(&Command::lsub(reference, pattern)).await?;
        data(&responses).map(ListEntry::from_data).collect()
    }

    /// Requests status items such as `MESSAGES` or `UNSEEN` for a mailbox
    /// without selecting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or the reply is malformed.
    pub async fn status(&mut self, mailbox: &str, items: &[&str]) -> Result<Vec<(String, u64)>> {
        let responses = self.command(&Command::status(mailbox, items)).await?;
        let Some(values) = data(&responses).find_map(|data| data.values.get(1)?.as_list()) else {
            return Err(Error::Protocol("no STATUS data in reply".into()));
        };
        values
            .chunks(2)
            .map(|pair| match pair {
                [name, value] => {
                    let name = name
                        .as_str()
                        .ok_or_else(|| Error::Protocol(format!("bad STATUS item {name}")))?;
                    let value = value
                        .as_number()
                        .ok_or_else(|| Error::Protocol(format!("bad STATUS value {value}")))?;
                    Ok((name.to_ascii_uppercase(), value))
                }
                _ => Err(Error::Protocol("odd STATUS item list".into())),
            })
            .collect()
    }
}

fn data(responses: &[Untagged]) -> impl Iterator<Item = &Data> {
    responses.iter().filter_map(Untagged::as_data)
}
