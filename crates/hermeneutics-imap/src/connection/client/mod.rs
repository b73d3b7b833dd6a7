//! Type-state IMAP client connection.
//!
//! Uses the type-state pattern to enforce valid state transitions at compile time.
//! The IMAP connection states are:
//!
//! - `NotAuthenticated`: Initial state after connection
//! - `Authenticated`: After successful LOGIN/AUTHENTICATE
//! - `Selected`: After successful SELECT/EXAMINE
//!
//! Between commands a watcher task owns the transport; every command
//! stops it, runs, and starts it again unless the server said `BYE`.

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::mem;

use hermeneutics_net::sasl::Exchange;
use hermeneutics_net::{Stream, Transport};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use self::states::{Authenticated, Authorized, NotAuthenticated, Selected};
use super::exchange::{Completion, Pending, execute};
use super::watcher::{Watch, Watcher};
use crate::command::{Command, TagGenerator};
use crate::error::{Error, Result};
use crate::types::{Status, StatusResponse, Untagged, Value};

/// Who holds the transport.
pub(crate) enum Link<S> {
    Watching(Watcher<S>),
    Ended(Transport<S>, Result<Watch>),
    Closed,
}

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<State, S = Stream> {
    link: Link<S>,
    tags: TagGenerator,
    greeting: StatusResponse,
    capabilities: Vec<String>,
    queue_tx: mpsc::UnboundedSender<Untagged>,
    queue_rx: mpsc::UnboundedReceiver<Untagged>,
    state: State,
}

// Manual Debug implementation since the watcher task is not Debug
impl<State: std::fmt::Debug, S> std::fmt::Debug for Client<State, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("tags", &self.tags)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Shared implementation for all states.
impl<State, S> Client<State, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn with_greeting(transport: Transport<S>, greeting: StatusResponse, state: State) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let capabilities = greeting
            .code("CAPABILITY")
            .map(|code| strings(&code.values))
            .unwrap_or_default();
        Self {
            link: Link::Watching(Watcher::spawn(transport, queue_tx.clone())),
            tags: TagGenerator::default(),
            greeting,
            capabilities,
            queue_tx,
            queue_rx,
            state,
        }
    }

    /// The server greeting.
    #[must_use]
    pub const fn greeting(&self) -> &StatusResponse {
        &self.greeting
    }

    /// Returns the server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability, ignoring case.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }

    /// The SASL mechanisms advertised as `AUTH=` capabilities.
    #[must_use]
    pub fn auths(&self) -> Vec<&str> {
        self.capabilities
            .iter()
            .filter_map(|c| {
                c.get(..5)
                    .filter(|prefix| prefix.eq_ignore_ascii_case("AUTH="))
                    .map(|_| &c[5..])
            })
            .collect()
    }

    /// Drains the untagged responses nobody asked for: those the watcher
    /// read between commands and those no command claimed.
    pub fn take_unsolicited(&mut self) -> Vec<Untagged> {
        let mut responses = Vec::new();
        while let Ok(response) = self.queue_rx.try_recv() {
            responses.push(response);
        }
        responses
    }

    /// Sends a CAPABILITY command and updates the stored capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or the connection fails.
    pub async fn capability(&mut self) -> Result<Vec<String>> {
        self.command(&Command::capability()).await?;
        Ok(self.capabilities.clone())
    }

    /// Sends a NOOP command. Updates it provokes land in the unsolicited queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or the connection fails.
    pub async fn noop(&mut self) -> Result<()> {
        self.command(&Command::noop()).await?;
        Ok(())
    }

    /// Runs any command and returns the untagged responses it claimed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`], [`Error::Bad`] or [`Error::Bye`] for a
    /// failed command.
    pub async fn command(&mut self, command: &Command) -> Result<Vec<Untagged>> {
        let done = self.run(command, None).await?;
        done.status.check()?;
        Ok(done.responses)
    }

    /// Logs out and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses.
    pub async fn logout(mut self) -> Result<()> {
        match self.run(&Command::logout(), None).await {
            Ok(done) => {
                done.status.check()?;
                debug!("logged out");
                Ok(())
            }
            Err(Error::Bye(text)) => {
                debug!(%text, "server closed the connection");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Sends a command and reads its responses, without checking the status.
    pub(crate) async fn run(
        &mut self,
        command: &Command,
        sasl: Option<&mut Exchange>,
    ) -> Result<Completion> {
        let mut transport = self.take_transport().await?;
        let tag = self.tags.next_tag();
        debug!(%tag, command = command.name(), "sending command");
        let pending = Pending::new(&tag, command, &self.queue_tx);
        let outcome = execute(&mut transport, pending, sasl).await;
        let closing = match &outcome {
            Ok(done) => done.bye.is_some() || done.status.status == Status::Bye,
            Err(e) => e.is_fatal(),
        };
        self.resume(transport, closing);
        if let Ok(done) = &outcome {
            self.note_capabilities(done);
        }
        outcome
    }

    /// Stops the watcher and takes the transport over.
    pub(crate) async fn take_transport(&mut self) -> Result<Transport<S>> {
        let (transport, outcome) = match mem::replace(&mut self.link, Link::Closed) {
            Link::Watching(watcher) => watcher.stop().await?,
            Link::Ended(transport, outcome) => (transport, outcome),
            Link::Closed => return Err(Error::Protocol("connection is closed".into())),
        };
        match outcome {
            Ok(Watch::Stopped) => Ok(transport),
            Ok(Watch::Bye(text)) => Err(Error::Bye(text)),
            Err(e) if !e.is_fatal() => {
                warn!(error = %e, "watcher skipped a response");
                Ok(transport)
            }
            Err(e) => Err(e),
        }
    }

    /// Hands the transport back to a new watcher, or drops it.
    pub(crate) fn resume(&mut self, transport: Transport<S>, closing: bool) {
        self.link = if closing {
            debug!("connection closing");
            Link::Closed
        } else {
            Link::Watching(Watcher::spawn(transport, self.queue_tx.clone()))
        };
    }

    pub(crate) const fn queue(&self) -> &mpsc::UnboundedSender<Untagged> {
        &self.queue_tx
    }

    pub(crate) fn next_tag(&mut self) -> String {
        self.tags.next_tag()
    }

    /// Waits for the next unsolicited response while the watcher runs.
    ///
    /// Returns `None` once the watcher has ended for good; [`Self::ended`]
    /// then tells why.
    pub(crate) async fn next_unsolicited(&mut self) -> Option<Untagged> {
        loop {
            if let Ok(response) = self.queue_rx.try_recv() {
                return Some(response);
            }
            let Link::Watching(watcher) = &mut self.link else {
                return None;
            };
            let finished = tokio::select! {
                biased;
                response = self.queue_rx.recv() => return response,
                finished = watcher.finished() => finished,
            };
            self.link = match finished {
                Ok((transport, Err(e))) if !e.is_fatal() => {
                    warn!(error = %e, "watcher skipped a response");
                    Link::Watching(Watcher::spawn(transport, self.queue_tx.clone()))
                }
                Ok((transport, outcome)) => Link::Ended(transport, outcome),
                Err(e) => {
                    warn!(error = %e, "watcher lost");
                    Link::Closed
                }
            };
        }
    }

    /// Why the watcher stopped on its own.
    pub(crate) fn ended(&self) -> Error {
        match &self.link {
            Link::Ended(_, Ok(Watch::Bye(text))) => Error::Bye(text.clone()),
            Link::Ended(_, Err(e)) => Error::Protocol(format!("connection lost: {e}")),
            _ => Error::Protocol("connection is closed".into()),
        }
    }

    fn note_capabilities(&mut self, done: &Completion) {
        let data = done
            .responses
            .iter()
            .filter_map(Untagged::as_data)
            .find(|data| data.name == "CAPABILITY")
            .map(|data| &data.values);
        let code = done.status.code("CAPABILITY").map(|code| &code.values);
        if let Some(values) = data.or(code) {
            self.capabilities = strings(values);
        }
    }

    fn into_state<T>(self, state: T) -> Client<T, S> {
        Client {
            link: self.link,
            tags: self.tags,
            greeting: self.greeting,
            capabilities: self.capabilities,
            queue_tx: self.queue_tx,
            queue_rx: self.queue_rx,
            state,
        }
    }
}

fn strings(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}
