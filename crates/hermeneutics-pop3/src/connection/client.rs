//! Type-state POP3 client.

use crate::command::Command;
use crate::error::{Error, Result};
use crate::parser::{
    DataLine, Status, apop_timestamp, parse_data_line, parse_list_entry, parse_stat, parse_status,
    parse_uid_entry,
};
use crate::types::{Capabilities, ListEntry, Stat, UidEntry};
use hermeneutics_net::{Stream, Transport, sasl};
use md5::{Digest, Md5};
use std::marker::PhantomData;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Type-state marker: greeting received, not logged in.
#[derive(Debug)]
pub struct Authorization;

/// Type-state marker: logged in, maildrop locked.
#[derive(Debug)]
pub struct Transaction;

/// POP3 client with type-state pattern.
#[derive(Debug)]
pub struct Client<State, S = Stream> {
    transport: Transport<S>,
    greeting: String,
    timestamp: Option<String>,
    last_response: Option<String>,
    _state: PhantomData<State>,
}

/// The APOP digest: MD5 of timestamp and password, in lower-case hex.
#[must_use]
pub fn apop_digest(timestamp: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(timestamp.as_bytes());
    hasher.update(password.as_bytes());
    sasl::hex(&hasher.finalize())
}

impl<S> Client<Authorization, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a transport and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the server greets with `-ERR`.
    pub async fn new(transport: Transport<S>) -> Result<Self> {
        let mut client = Self {
            transport,
            greeting: String::new(),
            timestamp: None,
            last_response: None,
            _state: PhantomData,
        };
        let greeting = client.read_status().await?;
        client.check_unused().await?;
        client.timestamp = apop_timestamp(&greeting).map(str::to_string);
        debug!(apop = client.timestamp.is_some(), "server ready");
        client.greeting = greeting;
        Ok(client)
    }

    /// The APOP timestamp from the greeting, if any.
    #[must_use]
    pub fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }

    /// Logs in with APOP when the server offers it, else with USER and PASS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFail`] if the credentials are refused.
    pub async fn authenticate(self, name: &str, password: &str) -> Result<Client<Transaction, S>> {
        if self.timestamp.is_some() {
            self.apop(name, password).await
        } else {
            self.user(name).await?.pass(password).await
        }
    }

    /// Names the mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the server refuses the name.
    pub async fn user(mut self, name: &str) -> Result<Self> {
        self.simple(&Command::User(name.to_string())).await?;
        Ok(self)
    }

    /// Sends the password for the mailbox named by [`Client::user`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFail`] if the password is refused.
    pub async fn pass(mut self, password: &str) -> Result<Client<Transaction, S>> {
        self.login(&Command::Pass(password.to_string())).await?;
        Ok(self.into_state())
    }

    /// Logs in with an MD5 digest of the greeting timestamp and the password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the greeting carried no timestamp
    /// and [`Error::AuthFail`] if the digest is refused.
    pub async fn apop(mut self, name: &str, password: &str) -> Result<Client<Transaction, S>> {
        let timestamp = self
            .timestamp
            .as_deref()
            .ok_or_else(|| Error::NotSupported("APOP: greeting has no timestamp".into()))?;
        let cmd = Command::Apop {
            name: name.to_string(),
            digest: apop_digest(timestamp, password),
        };
        self.login(&cmd).await?;
        Ok(self.into_state())
    }

    async fn login(&mut self, cmd: &Command) -> Result<()> {
        match self.simple(cmd).await {
            Err(Error::Server(msg)) => Err(Error::AuthFail(msg)),
            Err(e) => Err(e),
            Ok(_) => {
                debug!("logged in");
                Ok(())
            }
        }
    }
}

impl<S> Client<Transaction, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Number of messages and total size.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses or the reply is malformed.
    pub async fn stat(&mut self) -> Result<Stat> {
        let text = self.simple(&Command::Stat).await?;
        parse_stat(&text)
    }

    /// Message sizes: of message `number`, or of every message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Check`] if a single-item reply names another
    /// message, [`Error::Server`] if the message does not exist.
    pub async fn list(&mut self, number: Option<u32>) -> Result<Vec<ListEntry>> {
        let cmd = Command::List(number);
        if let Some(expected) = number {
            let entry = parse_list_entry(&self.simple(&cmd).await?)?;
            check_number(expected, entry.number)?;
            return Ok(vec![entry]);
        }
        let lines = self.multi(&cmd).await?;
        lines
            .iter()
            .map(|line| parse_list_entry(&String::from_utf8_lossy(line)))
            .collect()
    }

    /// Unique ids: of message `number`, or of every message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Check`] if a single-item reply names another
    /// message, [`Error::Server`] if the message does not exist.
    pub async fn uidl(&mut self, number: Option<u32>) -> Result<Vec<UidEntry>> {
        let cmd = Command::Uidl(number);
        if let Some(expected) = number {
            let entry = parse_uid_entry(&self.simple(&cmd).await?)?;
            check_number(expected, entry.number)?;
            return Ok(vec![entry]);
        }
        let lines = self.multi(&cmd).await?;
        lines
            .iter()
            .map(|line| parse_uid_entry(&String::from_utf8_lossy(line)))
            .collect()
    }

    /// Fetches a whole message. Lines end in LF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the message does not exist.
    pub async fn retr(&mut self, number: u32) -> Result<Vec<u8>> {
        let lines = self.multi(&Command::Retr(number)).await?;
        Ok(join_lines(&lines))
    }

    /// Fetches the header and the first `lines` body lines of a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the message does not exist.
    pub async fn top(&mut self, number: u32, lines: u32) -> Result<Vec<u8>> {
        let data = self.multi(&Command::Top { number, lines }).await?;
        Ok(join_lines(&data))
    }

    /// Marks a message for deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the message does not exist.
    pub async fn dele(&mut self, number: u32) -> Result<()> {
        self.simple(&Command::Dele(number)).await?;
        Ok(())
    }

    /// Unmarks all messages marked for deletion.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses.
    pub async fn rset(&mut self) -> Result<()> {
        self.simple(&Command::Rset).await?;
        Ok(())
    }

    /// Does nothing but keep the connection alive.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses.
    pub async fn noop(&mut self) -> Result<()> {
        self.simple(&Command::Noop).await?;
        Ok(())
    }
}

// Common implementation for all states
impl<State, S> Client<State, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The greeting text after `+OK`.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// The text of the most recent `+OK` line.
    #[must_use]
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    /// Lists the server's capabilities (RFC 2449).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the server does not know CAPA.
    pub async fn capa(&mut self) -> Result<Capabilities> {
        let lines = self.multi(&Command::Capa).await?;
        let lines: Vec<String> = lines
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect();
        Ok(Capabilities::from_lines(lines.iter().map(String::as_str)))
    }

    /// Ends the session. In the transaction state this commits deletions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] if the server could not remove messages.
    pub async fn quit(mut self) -> Result<()> {
        self.simple(&Command::Quit).await?;
        debug!("connection closed");
        Ok(())
    }

    fn into_state<T>(self) -> Client<T, S> {
        Client {
            transport: self.transport,
            greeting: self.greeting,
            timestamp: self.timestamp,
            last_response: self.last_response,
            _state: PhantomData,
        }
    }

    /// Sends a command with a single-line reply.
    async fn simple(&mut self, cmd: &Command) -> Result<String> {
        self.transport.write_line(&cmd.to_line()).await?;
        let text = self.read_status().await?;
        self.check_unused().await?;
        Ok(text)
    }

    /// Sends a command whose `+OK` is followed by a data block.
    async fn multi(&mut self, cmd: &Command) -> Result<Vec<Vec<u8>>> {
        self.transport.write_line(&cmd.to_line()).await?;
        self.read_status().await?;
        let mut lines = Vec::new();
        loop {
            let line = self.transport.read_line().await?;
            match parse_data_line(&line) {
                DataLine::End => break,
                DataLine::Line(content) => lines.push(content.to_vec()),
            }
        }
        self.check_unused().await?;
        Ok(lines)
    }

    async fn read_status(&mut self) -> Result<String> {
        let line = self.transport.read_line_lossy().await?;
        match parse_status(&line)? {
            Status::Ok(text) => {
                let text = text.to_string();
                self.last_response = Some(text.clone());
                Ok(text)
            }
            Status::Err(text) => {
                let err = Error::Server(text.to_string());
                self.check_unused().await?;
                Err(err)
            }
        }
    }

    /// Fails if the server sent more than the response just read.
    async fn check_unused(&mut self) -> Result<()> {
        if self.transport.is_done().await? {
            return Ok(());
        }
        let line = self.transport.read_line_lossy().await?;
        Err(Error::Unused(line))
    }
}

fn check_number(expected: u32, actual: u32) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::Check { expected, actual })
    }
}

fn join_lines(lines: &[Vec<u8>]) -> Vec<u8> {
    let mut data = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        data.extend_from_slice(line);
        data.push(b'\n');
    }
    data
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_apop_digest() {
        // RFC 1939, section 7
        assert_eq!(
            apop_digest("<1896.697170952@dbc.mtview.ca.us>", "tanstaaf"),
            "c4c9334bac560ecc979e58001b3e22fb"
        );
    }

    #[test]
    fn test_join_lines() {
        assert_eq!(join_lines(&[b"a".to_vec(), Vec::new(), b"b".to_vec()]), b"a\n\nb\n");
        assert!(join_lines(&[]).is_empty());
    }

    #[test]
    fn test_check_number() {
        assert!(check_number(3, 3).is_ok());
        assert!(matches!(
            check_number(3, 4),
            Err(Error::Check {
                expected: 3,
                actual: 4
            })
        ));
    }
}
