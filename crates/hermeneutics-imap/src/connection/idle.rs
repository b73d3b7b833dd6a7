//! IMAP IDLE command support (RFC 2177).
//!
//! While idling the watcher keeps reading; the handle hands out what it
//! queues until `DONE` ends the command.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::debug;

use super::client::{Authorized, Client};
use super::exchange::Pending;
use crate::command::Command;
use crate::types::Untagged;
use crate::{Error, Result};

/// Event received during IDLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleEvent {
    /// The server pushed an untagged response (EXISTS, EXPUNGE, FETCH...).
    Update(Untagged),
    /// Timeout occurred without receiving an event.
    Timeout,
}

/// Handle for an active IDLE session.
///
/// Holds the client until [`IdleHandle::done`] is called. Dropping the
/// handle without `done` leaves the server idling.
pub struct IdleHandle<'a, State, S> {
    client: &'a mut Client<State, S>,
    tag: String,
}

impl<State, S> std::fmt::Debug for IdleHandle<'_, State, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdleHandle")
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

impl<State, S> IdleHandle<'_, State, S>
where
    State: Authorized,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Waits for the next untagged response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server ended the session, or the
    /// transport error that ended it.
    pub async fn next(&mut self) -> Result<Untagged> {
        match self.client.next_unsolicited().await {
            Some(response) => Ok(response),
            None => Err(self.client.ended()),
        }
    }

    /// Waits for a server event or timeout.
    ///
    /// RFC 2177 recommends re-issuing IDLE every 29 minutes. Most servers
    /// drop idle connections sooner, so keep `duration` shorter.
    ///
    /// # Errors
    ///
    /// Same as [`IdleHandle::next`].
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        match timeout(duration, self.next()).await {
            Ok(response) => response.map(IdleEvent::Update),
            Err(_) => Ok(IdleEvent::Timeout),
        }
    }

    /// Exits IDLE mode by sending DONE.
    ///
    /// Responses still arriving before the tagged status go to the
    /// unsolicited queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the server ended the session or rejects the end
    /// of IDLE.
    pub async fn done(self) -> Result<()> {
        let client = self.client;
        let mut transport = client.take_transport().await?;
        let command = Command::idle();
        let outcome = match transport.write_line("DONE").await {
            Ok(()) => {
                Pending::new(&self.tag, &command, client.queue())
                    .finish(&mut transport)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        let closing = match &outcome {
            Ok(done) => done.bye.is_some(),
            Err(e) => e.is_fatal(),
        };
        client.resume(transport, closing);
        outcome?.status.check()?;
        debug!(tag = %self.tag, "IDLE done");
        Ok(())
    }
}

impl<State, S> Client<State, S>
where
    State: Authorized,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Enters IDLE mode for real-time notifications.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut handle = client.idle().await?;
    /// loop {
    ///     match handle.wait(Duration::from_secs(600)).await? {
    ///         IdleEvent::Update(response) => println!("{}", response.name()),
    ///         IdleEvent::Timeout => break,
    ///     }
    /// }
    /// handle.done().await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] or [`Error::Bad`] if the server refuses to idle.
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, State, S>> {
        let mut transport = self.take_transport().await?;
        let tag = self.next_tag();
        debug!(%tag, "entering IDLE");
        let command = Command::idle();
        let outcome = match transport.write_all(&command.segments(&tag).concat()).await {
            Ok(()) => {
                Pending::new(&tag, &command, self.queue())
                    .until_continuation(&mut transport)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        let closing = outcome.as_ref().is_err_and(Error::is_fatal);
        self.resume(transport, closing);
        match outcome? {
            None => Ok(IdleHandle { client: self, tag }),
            Some(status) => {
                status.check()?;
                Err(Error::Protocol("IDLE completed without continuation".into()))
            }
        }
    }
}
