//! Background reader for unsolicited responses.
//!
//! While no command is in flight the watcher task owns the transport and
//! queues every untagged response the server pushes. Stopping it is a
//! handshake: the stop signal is only honoured between responses, and the
//! transport comes back through the join handle before the next write.

use hermeneutics_net::Transport;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::framed::next_response;
use crate::error::{Error, Result};
use crate::types::{Response, Untagged};

/// Why the watcher gave the transport back.
#[derive(Debug)]
pub(crate) enum Watch {
    /// Stopped on request.
    Stopped,
    /// The server said `BYE`.
    Bye(String),
}

/// What a finished watcher hands back.
pub(crate) type Finished<S> = (Transport<S>, Result<Watch>);

/// A running watcher task.
#[derive(Debug)]
pub(crate) struct Watcher<S> {
    stop: oneshot::Sender<()>,
    task: JoinHandle<Finished<S>>,
}

impl<S> Watcher<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Starts watching `transport`.
    pub(crate) fn spawn(transport: Transport<S>, queue: mpsc::UnboundedSender<Untagged>) -> Self {
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(watch(transport, stopped, queue));
        Self { stop, task }
    }

    /// Signals the task to stop and waits for it.
    pub(crate) async fn stop(self) -> Result<Finished<S>> {
        // The task may have ended on its own already.
        let _ = self.stop.send(());
        self.task.await.map_err(join_error)
    }

    /// Waits for the task to end on its own.
    ///
    /// The watcher must not be polled again once this returned.
    pub(crate) async fn finished(&mut self) -> Result<Finished<S>> {
        (&mut self.task).await.map_err(join_error)
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Protocol(format!("watcher task failed: {e}"))
}

async fn watch<S>(
    mut transport: Transport<S>,
    mut stopped: oneshot::Receiver<()>,
    queue: mpsc::UnboundedSender<Untagged>,
) -> Finished<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    trace!("watcher started");
    loop {
        tokio::select! {
            biased;
            _ = &mut stopped => {
                trace!("watcher stopped");
                return (transport, Ok(Watch::Stopped));
            }
            ready = transport.wait_readable() => {
                if let Err(e) = ready {
                    return (transport, Err(e.into()));
                }
            }
        }
        let response = match next_response(&mut transport).await {
            Ok(response) => response,
            Err(e) => return (transport, Err(e)),
        };
        match response {
            Response::Untagged(untagged) => {
                debug!(name = untagged.name(), "unsolicited response");
                let bye = untagged.bye_text().map(str::to_string);
                // The receiver lives as long as the client.
                let _ = queue.send(untagged);
                if let Some(text) = bye {
                    return (transport, Ok(Watch::Bye(text)));
                }
            }
            Response::Continuation(text) => {
                warn!(%text, "continuation request with no command pending");
            }
            Response::Tagged { tag, status } => {
                let err = Error::UnspecResponse(format!("{tag} {} {}", status.status, status.text));
                return (transport, Err(err));
            }
        }
    }
}
