//! Implementation for the not-authenticated state.

use hermeneutics_net::sasl::{Exchange, Mechanism};
use hermeneutics_net::{Config, Stream, Transport};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::Command;
use crate::connection::exchange::{Pending, execute};
use crate::connection::framed::next_response;
use crate::types::{Response, Status, Untagged};
use crate::{Error, Result};

impl<S> Client<NotAuthenticated, S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a new client from a transport.
    ///
    /// Reads the server greeting and the capabilities it announces, then
    /// starts watching for unsolicited responses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server rejects the connection and
    /// [`Error::UnspecResponse`] for anything but an untagged `OK` or `PREAUTH`.
    pub async fn new(mut transport: Transport<S>) -> Result<Self> {
        let greeting = match next_response(&mut transport).await? {
            Response::Untagged(Untagged::Status(status))
                if matches!(status.status, Status::Ok | Status::PreAuth) =>
            {
                status
            }
            Response::Untagged(Untagged::Status(status)) if status.status == Status::Bye => {
                return Err(Error::Bye(status.text));
            }
            other => return Err(Error::UnspecResponse(format!("{other:?}"))),
        };
        info!(text = %greeting.text, "IMAP server greeting");
        Ok(Self::with_greeting(transport, greeting, NotAuthenticated))
    }

    /// Returns true if the server greeted with `PREAUTH`.
    #[must_use]
    pub fn is_preauth(&self) -> bool {
        self.greeting.status == Status::PreAuth
    }

    /// Moves a `PREAUTH` session to the authenticated state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the greeting was a plain `OK`.
    pub fn preauthenticated(self) -> Result<Client<Authenticated, S>> {
        if !self.is_preauth() {
            return Err(Error::Protocol("server did not pre-authenticate".into()));
        }
        Ok(self.into_state(Authenticated))
    }

    /// Authenticates with LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server refuses the credentials or
    /// announces `LOGINDISABLED`.
    pub async fn login(mut self, username: &str, password: &str) -> Result<Client<Authenticated, S>> {
        if self.has_capability("LOGINDISABLED") {
            return Err(Error::Auth("LOGIN is disabled on this connection".into()));
        }
        let done = self.run(&Command::login(username, password), None).await?;
        authorized(done.status.status, &done.status.text)?;
        info!(user = username, "logged in");
        Ok(self.into_state(Authenticated))
    }

    /// Authenticates with the given SASL mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server refuses the credentials.
    pub async fn auth(
        mut self,
        mechanism: Mechanism,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated, S>> {
        let mut exchange = Exchange::new(mechanism, username, password);
        let done = self
            .run(&Command::authenticate(mechanism), Some(&mut exchange))
            .await?;
        authorized(done.status.status, &done.status.text)?;
        info!(user = username, %mechanism, "authenticated");
        Ok(self.into_state(Authenticated))
    }

    /// Authenticates with the best mechanism the server offers, falling
    /// back to LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] if the server refuses the credentials.
    pub async fn authenticate(self, username: &str, password: &str) -> Result<Client<Authenticated, S>> {
        let preferred = Mechanism::preferred(self.auths());
        match preferred {
            Some(mechanism) => self.auth(mechanism, username, password).await,
            None => {
                debug!("no usable SASL mechanism offered, using LOGIN");
                self.login(username, password).await
            }
        }
    }
}

impl Client<NotAuthenticated, Stream> {
    /// Upgrades the connection with STARTTLS and refreshes the capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or the TLS handshake fails.
    pub async fn starttls(mut self, config: &Config) -> Result<Self> {
        let mut transport = self.take_transport().await?;
        let tag = self.tags.next_tag();
        let command = Command::new("STARTTLS");
        let done = execute(&mut transport, Pending::new(&tag, &command, &self.queue_tx), None).await?;
        done.status.check()?;

        let timeout = transport.timeout();
        let stream = transport.into_inner()?.upgrade(config).await?;
        debug!("TLS established");
        self.resume(Transport::new(stream).with_timeout(timeout), false);
        // Capabilities seen before the handshake are void.
        self.capabilities.clear();
        self.capability().await?;
        Ok(self)
    }
}

fn authorized(status: Status, text: &str) -> Result<()> {
    match status {
        Status::Ok => Ok(()),
        Status::No => Err(Error::Auth(text.to_string())),
        Status::Bye => Err(Error::Bye(text.to_string())),
        _ => Err(Error::Bad(text.to_string())),
    }
}
