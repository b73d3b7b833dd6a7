//! One command round trip on a transport the caller owns.

use hermeneutics_net::Transport;
use hermeneutics_net::sasl::Exchange;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::framed::next_response;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::types::{Response, StatusResponse, Untagged};

/// The outcome of a command.
#[derive(Debug)]
pub(crate) struct Completion {
    /// The tagged status.
    pub(crate) status: StatusResponse,
    /// Untagged responses the command claimed.
    pub(crate) responses: Vec<Untagged>,
    /// Text of a `BYE` seen on the way.
    pub(crate) bye: Option<String>,
}

/// What ends a wait for the server.
enum Event {
    Continuation(String),
    Done(StatusResponse),
}

/// The responses of the command in flight.
pub(crate) struct Pending<'a> {
    tag: &'a str,
    command: &'a Command,
    queue: &'a mpsc::UnboundedSender<Untagged>,
    responses: Vec<Untagged>,
    bye: Option<String>,
}

impl<'a> Pending<'a> {
    pub(crate) const fn new(
        tag: &'a str,
        command: &'a Command,
        queue: &'a mpsc::UnboundedSender<Untagged>,
    ) -> Self {
        Self {
            tag,
            command,
            queue,
            responses: Vec::new(),
            bye: None,
        }
    }

    /// Reads until a continuation request or the tagged status.
    ///
    /// Untagged responses the command does not claim go to the queue.
    async fn next_event<S>(&mut self, transport: &mut Transport<S>) -> Result<Event>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let response = match next_response(transport).await {
                Ok(response) => response,
                Err(Error::Transport(hermeneutics_net::Error::Eof)) if self.bye.is_some() => {
                    return Err(Error::Bye(self.bye.take().unwrap_or_default()));
                }
                Err(e) => return Err(e),
            };
            match response {
                Response::Tagged { tag, status } if tag == self.tag => return Ok(Event::Done(status)),
                Response::Tagged { tag, status } => {
                    return Err(Error::UnspecResponse(format!(
                        "{tag} {} {}",
                        status.status, status.text
                    )));
                }
                Response::Continuation(text) => return Ok(Event::Continuation(text)),
                Response::Untagged(untagged) => {
                    if let Some(text) = untagged.bye_text() {
                        debug!(%text, "server is closing the connection");
                        self.bye = Some(text.to_string());
                    }
                    if self.command.claims(&untagged) {
                        self.responses.push(untagged);
                    } else {
                        let _ = self.queue.send(untagged);
                    }
                }
            }
        }
    }

    /// Reads until the tagged status; continuations are errors.
    pub(crate) async fn finish<S>(mut self, transport: &mut Transport<S>) -> Result<Completion>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.next_event(transport).await? {
            Event::Done(status) => Ok(self.complete(status)),
            Event::Continuation(text) => Err(Error::Protocol(format!(
                "unexpected continuation request: {text}"
            ))),
        }
    }

    /// Reads until the server asks for more. A tagged status instead
    /// comes back as the command's completion.
    pub(crate) async fn until_continuation<S>(
        &mut self,
        transport: &mut Transport<S>,
    ) -> Result<Option<StatusResponse>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match self.next_event(transport).await? {
            Event::Continuation(_) => Ok(None),
            Event::Done(status) => Ok(Some(status)),
        }
    }

    pub(crate) fn complete(self, status: StatusResponse) -> Completion {
        Completion {
            status,
            responses: self.responses,
            bye: self.bye,
        }
    }
}

/// Sends `command` and waits for its tagged status.
///
/// Literals wait for the server's continuation request. With `sasl`,
/// continuation requests after the command line are challenges; a failing
/// exchange is cancelled with `*` and its error returned once the server
/// has answered.
pub(crate) async fn execute<S>(
    transport: &mut Transport<S>,
    mut pending: Pending<'_>,
    mut sasl: Option<&mut Exchange>,
) -> Result<Completion>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let segments = pending.command.segments(pending.tag);
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        transport.write_all(segment).await?;
        if i < last {
            if let Some(status) = pending.until_continuation(transport).await? {
                return Ok(pending.complete(status));
            }
        }
    }

    let mut failure = None;
    loop {
        match pending.next_event(transport).await? {
            Event::Done(status) => {
                return match failure {
                    Some(e) => Err(e),
                    None => Ok(pending.complete(status)),
                };
            }
            Event::Continuation(challenge) => {
                let Some(exchange) = sasl.as_deref_mut() else {
                    return Err(Error::Protocol(format!(
                        "unexpected continuation request: {challenge}"
                    )));
                };
                match exchange.respond(&challenge) {
                    Ok(answer) => transport.write_secret_line(&answer).await?,
                    Err(e) => {
                        warn!(error = %e, "cancelling authentication");
                        failure = Some(Error::from(e));
                        transport.write_line("*").await?;
                    }
                }
            }
        }
    }
}
