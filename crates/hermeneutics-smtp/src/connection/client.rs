//! Type-state SMTP and LMTP client.

use super::{Dialect, ServerInfo};
use crate::command::Command;
use crate::error::{Error, Refused, Result};
use crate::parser::{ReplyLine, parse_line};
use crate::types::{Address, Reply, ReplyCode};
use hermeneutics_net::sasl::{Exchange, Mechanism};
use hermeneutics_net::{Config, Stream, Transport};
use std::marker::PhantomData;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Type-state marker: greeting received, no hello sent yet.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker: EHLO, LHLO or HELO accepted.
#[derive(Debug)]
pub struct Greeted;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// States in which a new mail transaction may begin.
pub trait Ready: private::Sealed {}

impl Ready for Greeted {}
impl Ready for Authenticated {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Greeted {}
    impl Sealed for super::Authenticated {}
}

/// SMTP or LMTP client with type-state pattern.
///
/// Every method consumes the client and hands it back in its next state,
/// so commands cannot be issued out of order. An error drops the
/// connection, except for a refused `RCPT TO`, which hands the client back
/// in a [`Refused`].
#[derive(Debug)]
pub struct Client<State, S = Stream> {
    transport: Transport<S>,
    dialect: Dialect,
    server_info: ServerInfo,
    hostname: String,
    recipients: usize,
    last_reply: Option<Reply>,
    deliveries: Vec<Reply>,
    _state: PhantomData<State>,
}

/// Connection trait for all states.
pub trait SmtpConnection {
    /// Returns the server information.
    fn server_info(&self) -> &ServerInfo;

    /// Returns the protocol spoken.
    fn dialect(&self) -> Dialect;

    /// The most recent complete reply.
    fn last_reply(&self) -> Option<&Reply>;
}

impl<State, S> SmtpConnection for Client<State, S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn last_reply(&self) -> Option<&Reply> {
        self.last_reply.as_ref()
    }
}

impl<S> Client<Connected, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a transport and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerNotReady`] unless the greeting is `220`.
    pub async fn new(transport: Transport<S>, dialect: Dialect) -> Result<Self> {
        let mut client = Self {
            transport,
            dialect,
            server_info: ServerInfo::default(),
            hostname: String::new(),
            recipients: 0,
            last_reply: None,
            deliveries: Vec::new(),
            _state: PhantomData,
        };
        let greeting = client.read_reply(true).await?;
        client.check_unused().await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::ServerNotReady {
                code: greeting.code.as_u16(),
                message: greeting.message_text(),
            });
        }
        client.server_info = ServerInfo::from_hello(&greeting.message[..1]);
        debug!(domain = %client.server_info.domain, ?dialect, "server ready");
        Ok(client)
    }

    /// Sends EHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] on an LMTP connection and
    /// [`Error::NotOk`] if the server refuses.
    pub async fn ehlo(self, client_hostname: &str) -> Result<Client<Greeted, S>> {
        if self.dialect == Dialect::Lmtp {
            return Err(Error::NotSupported("EHLO on an LMTP connection".into()));
        }
        self.hello(client_hostname).await
    }

    /// Sends LHLO and discovers server capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] on an SMTP connection and
    /// [`Error::NotOk`] if the server refuses.
    pub async fn lhlo(self, client_hostname: &str) -> Result<Client<Greeted, S>> {
        if self.dialect == Dialect::Smtp {
            return Err(Error::NotSupported("LHLO on an SMTP connection".into()));
        }
        self.hello(client_hostname).await
    }

    /// Sends the plain RFC 821 HELO greeting. No extensions are known afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] on an LMTP connection and
    /// [`Error::NotOk`] if the server refuses.
    pub async fn helo(mut self, client_hostname: &str) -> Result<Client<Greeted, S>> {
        if self.dialect == Dialect::Lmtp {
            return Err(Error::NotSupported("HELO on an LMTP connection".into()));
        }
        let cmd = Command::Helo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.command_ok(&cmd).await?;
        self.server_info = ServerInfo::from_hello(&reply.message[..1]);
        self.hostname = client_hostname.to_string();
        Ok(self.into_state())
    }

    /// Sends EHLO or LHLO, whichever the dialect calls for.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses.
    pub async fn hello(mut self, client_hostname: &str) -> Result<Client<Greeted, S>> {
        self.send_hello(client_hostname).await?;
        Ok(self.into_state())
    }
}

impl Client<Greeted, Stream> {
    /// Upgrades the connection to TLS and repeats the hello command.
    ///
    /// `config` supplies the server name and certificate verification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if STARTTLS was not advertised, or
    /// an error if the server refuses or the handshake fails.
    pub async fn starttls(mut self, config: &Config) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.command_ok(&Command::StartTls).await?;

        let Self {
            transport,
            dialect,
            hostname,
            ..
        } = self;
        let timeout = transport.timeout();
        let stream = transport.into_inner()?.upgrade(config).await?;
        debug!("TLS established");

        let mut client = Self {
            transport: Transport::new(stream).with_timeout(timeout),
            dialect,
            server_info: ServerInfo::default(),
            hostname: String::new(),
            recipients: 0,
            last_reply: None,
            deliveries: Vec::new(),
            _state: PhantomData,
        };
        client.send_hello(&hostname).await?;
        Ok(client)
    }
}

impl<S> Client<Greeted, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates with the given SASL mechanism.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFailed`] if the server rejects the credentials.
    pub async fn auth(
        mut self,
        mechanism: Mechanism,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated, S>> {
        let mut exchange = Exchange::new(mechanism, username, password);
        let cmd = Command::Auth {
            mechanism: mechanism.name().to_string(),
            initial_response: exchange.initial_response(),
        };
        self.transport.write_line(&cmd.to_line()).await?;
        let mut reply = self.read_reply(false).await?;
        self.check_unused().await?;

        while reply.is_intermediate() {
            let answer = exchange.respond(reply.last_line())?;
            self.transport.write_secret_line(&answer).await?;
            reply = self.read_reply(false).await?;
            self.check_unused().await?;
        }

        if !reply.is_success() {
            return Err(Error::AuthFailed {
                code: reply.code.as_u16(),
                message: reply.message_text(),
            });
        }
        debug!(%mechanism, "authenticated");
        Ok(self.into_state())
    }

    /// Authenticates with the strongest mechanism the server advertises.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if no known mechanism is offered.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated, S>> {
        let mechanism = Mechanism::preferred(
            self.server_info
                .auth_mechanisms()
                .iter()
                .map(String::as_str),
        )
        .ok_or_else(|| Error::NotSupported("no usable AUTH mechanism".into()))?;
        self.auth(mechanism, username, password).await
    }

    /// Authenticates using PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated, S>> {
        self.auth(Mechanism::Plain, username, password).await
    }

    /// Authenticates using LOGIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated, S>> {
        self.auth(Mechanism::Login, username, password).await
    }

    /// Authenticates using CRAM-MD5 mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_cram_md5(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated, S>> {
        self.auth(Mechanism::CramMd5, username, password).await
    }
}

impl<State, S> Client<State, S>
where
    State: Ready,
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses the sender.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction, S>> {
        self.command_ok(&Command::MailFrom { from, size: None })
            .await?;
        self.recipients = 0;
        Ok(self.into_state())
    }

    /// Starts a mail transaction declaring the message size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses the sender.
    pub async fn mail_from_sized(
        mut self,
        from: Address,
        size: usize,
    ) -> Result<Client<MailTransaction, S>> {
        let size = self.server_info.supports("SIZE").then_some(size);
        self.command_ok(&Command::MailFrom { from, size }).await?;
        self.recipients = 0;
        Ok(self.into_state())
    }

    /// Sends RSET.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses.
    pub async fn rset(mut self) -> Result<Self> {
        self.recipients = 0;
        self.command_ok(&Command::Rset).await?;
        Ok(self)
    }

    /// Sends NOOP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses.
    pub async fn noop(mut self) -> Result<Self> {
        self.command_ok(&Command::Noop).await?;
        Ok(self)
    }

    /// Asks for help text, one entry per reply line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses.
    pub async fn help(mut self, topic: Option<&str>) -> Result<(Self, Vec<String>)> {
        let cmd = Command::Help {
            topic: topic.map(str::to_string),
        };
        let reply = self.command_ok(&cmd).await?;
        Ok((self, reply.message))
    }

    /// Replies from the last delivered message: one for SMTP, one per
    /// recipient for LMTP.
    #[must_use]
    pub fn deliveries(&self) -> &[Reply] {
        &self.deliveries
    }
}

impl<S> Client<MailTransaction, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds a recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns the client with [`Error::NotOk`] if the server refuses the
    /// recipient; the transaction stays open.
    pub async fn rcpt_to(
        mut self,
        to: Address,
    ) -> std::result::Result<Client<RecipientAdded, S>, Refused<Self>> {
        match self.add_recipient(to).await {
            Ok(()) => Ok(self.into_state()),
            Err(error) => Err(Refused { error, client: self }),
        }
    }

    /// Abandons the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses.
    pub async fn reset(self) -> Result<Client<Greeted, S>> {
        self.abandon().await
    }
}

impl<S> Client<RecipientAdded, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns the client with [`Error::NotOk`] if the server refuses the
    /// recipient. Recipients accepted before stay in the transaction.
    pub async fn rcpt_to(mut self, to: Address) -> std::result::Result<Self, Refused<Self>> {
        match self.add_recipient(to).await {
            Ok(()) => Ok(self),
            Err(error) => Err(Refused { error, client: self }),
        }
    }

    /// Number of accepted recipients.
    #[must_use]
    pub const fn recipients(&self) -> usize {
        self.recipients
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReadyForData`] unless the server answers 3xx.
    pub async fn data(mut self) -> Result<Client<Data, S>> {
        let reply = self.command(&Command::Data).await?;
        if !reply.is_intermediate() {
            return Err(Error::NotReadyForData {
                code: reply.code.as_u16(),
                message: reply.message_text(),
            });
        }
        Ok(self.into_state())
    }

    /// Sends the message in BDAT chunks (RFC 3030).
    ///
    /// Each chunk is acknowledged separately; the final one carries
    /// `LAST`. Without any chunk a single `BDAT 0 LAST` is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if a chunk or the message is refused.
    pub async fn bdat<I, B>(mut self, chunks: I) -> Result<Client<Greeted, S>>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut chunks = chunks.into_iter().peekable();
        loop {
            let chunk = chunks.next();
            let data: &[u8] = chunk.as_ref().map_or(&[][..], |c| c.as_ref());
            let last = chunks.peek().is_none();
            let cmd = Command::Bdat {
                size: data.len(),
                last,
            };
            self.transport.write_line(&cmd.to_line()).await?;
            self.transport.write_all(data).await?;
            if last {
                break;
            }
            let reply = self.read_reply(false).await?;
            self.check_unused().await?;
            ensure_ok(&reply)?;
        }
        self.finish_delivery().await
    }

    /// Abandons the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server refuses.
    pub async fn reset(self) -> Result<Client<Greeted, S>> {
        self.abandon().await
    }
}

impl<S> Client<Data, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with a dot are
    /// dot-stuffed and the terminating `.` line is appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the message is refused. Over LMTP the
    /// first refusing recipient is reported after all replies were read;
    /// [`Client::deliveries`] is lost with the connection in that case.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Greeted, S>> {
        let data = encode_data(message);
        self.transport.write_all(&data).await?;
        self.finish_delivery().await
    }
}

// Common implementation for all states
impl<State, S> Client<State, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn into_state<T>(self) -> Client<T, S> {
        Client {
            transport: self.transport,
            dialect: self.dialect,
            server_info: self.server_info,
            hostname: self.hostname,
            recipients: self.recipients,
            last_reply: self.last_reply,
            deliveries: self.deliveries,
            _state: PhantomData,
        }
    }

    async fn send_hello(&mut self, client_hostname: &str) -> Result<()> {
        let cmd = match self.dialect {
            Dialect::Smtp => Command::Ehlo {
                hostname: client_hostname.to_string(),
            },
            Dialect::Lmtp => Command::Lhlo {
                hostname: client_hostname.to_string(),
            },
        };
        let reply = self.command_ok(&cmd).await?;
        self.server_info = ServerInfo::from_hello(&reply.message);
        self.hostname = client_hostname.to_string();
        debug!(extensions = self.server_info.extensions.len(), "hello accepted");
        Ok(())
    }

    async fn add_recipient(&mut self, to: Address) -> Result<()> {
        self.command_ok(&Command::RcptTo { to }).await?;
        self.recipients += 1;
        Ok(())
    }

    async fn abandon(mut self) -> Result<Client<Greeted, S>> {
        self.recipients = 0;
        self.command_ok(&Command::Rset).await?;
        Ok(self.into_state())
    }

    /// Reads the completion reply, or one reply per recipient over LMTP.
    async fn finish_delivery(mut self) -> Result<Client<Greeted, S>> {
        let count = match self.dialect {
            Dialect::Smtp => 1,
            Dialect::Lmtp => self.recipients,
        };
        self.recipients = 0;
        let mut replies = Vec::with_capacity(count);
        for _ in 0..count {
            replies.push(self.read_reply(false).await?);
        }
        self.check_unused().await?;
        if let Some(refused) = replies.iter().find(|r| !r.is_success()) {
            return Err(not_ok(refused));
        }
        debug!(replies = replies.len(), "message delivered");
        self.deliveries = replies;
        Ok(self.into_state())
    }

    async fn command(&mut self, cmd: &Command) -> Result<Reply> {
        self.transport.write_line(&cmd.to_line()).await?;
        let reply = self.read_reply(cmd.allows_multiline()).await?;
        self.check_unused().await?;
        Ok(reply)
    }

    async fn command_ok(&mut self, cmd: &Command) -> Result<Reply> {
        let reply = self.command(cmd).await?;
        ensure_ok(&reply)?;
        Ok(reply)
    }

    async fn read_reply(&mut self, multiline: bool) -> Result<Reply> {
        let mut message = Vec::new();
        loop {
            let line = self.transport.read_line_lossy().await?;
            match parse_line(&line)? {
                ReplyLine::Continuation(_, text) if multiline => message.push(text.to_string()),
                ReplyLine::Continuation(..) => return Err(Error::Uncaught(line.clone())),
                ReplyLine::Final(code, text) => {
                    message.push(text.to_string());
                    let reply = Reply::new(code, message);
                    self.last_reply = Some(reply.clone());
                    return Ok(reply);
                }
            }
        }
    }

    /// Fails if the server sent more than the reply just read.
    async fn check_unused(&mut self) -> Result<()> {
        if self.transport.is_done().await? {
            return Ok(());
        }
        let line = self.transport.read_line_lossy().await?;
        Err(Error::Unused(line))
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotOk`] if the server does not answer 2xx.
    pub async fn quit(mut self) -> Result<()> {
        self.command_ok(&Command::Quit).await?;
        debug!("connection closed");
        Ok(())
    }
}

fn not_ok(reply: &Reply) -> Error {
    Error::NotOk {
        code: reply.code.as_u16(),
        message: reply.message_text(),
    }
}

fn ensure_ok(reply: &Reply) -> Result<()> {
    if reply.is_success() {
        Ok(())
    } else {
        Err(not_ok(reply))
    }
}

/// Frames a message for DATA: CRLF lines, dot-stuffing, final `.` line.
fn encode_data(message: &[u8]) -> Vec<u8> {
    let body = message.strip_suffix(b"\n").unwrap_or(message);
    let mut data = Vec::with_capacity(body.len() + body.len() / 32 + 5);
    if !body.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                data.push(b'.');
            }
            data.extend_from_slice(line);
            data.extend_from_slice(b"\r\n");
        }
    }
    data.extend_from_slice(b".\r\n");
    data
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod data {
        use super::*;

        #[test]
        fn test_crlf_normalization() {
            assert_eq!(encode_data(b"a\nb\n"), b"a\r\nb\r\n.\r\n");
            assert_eq!(encode_data(b"a\r\nb\r\n"), b"a\r\nb\r\n.\r\n");
            assert_eq!(encode_data(b"a\nb"), b"a\r\nb\r\n.\r\n");
        }

        #[test]
        fn test_dot_stuffing() {
            assert_eq!(encode_data(b".\n..x\ny.\n"), b"..\r\n...x\r\ny.\r\n.\r\n");
        }

        #[test]
        fn test_blank_lines_kept() {
            assert_eq!(encode_data(b"a\n\nb\n\n"), b"a\r\n\r\nb\r\n\r\n.\r\n");
        }

        #[test]
        fn test_empty_message() {
            assert_eq!(encode_data(b""), b".\r\n");
            assert_eq!(encode_data(b"\n"), b".\r\n");
        }
    }

    mod replies {
        use super::*;
        use tokio_test::io::Builder;

        async fn greeted(mock: tokio_test::io::Mock) -> Result<Client<Connected, tokio_test::io::Mock>> {
            Client::new(Transport::new(mock), Dialect::Smtp).await
        }

        #[tokio::test]
        async fn test_greeting_not_ready() {
            let mock = Builder::new().read(b"554 go away\r\n").build();
            let err = greeted(mock).await.unwrap_err();
            assert!(matches!(err, Error::ServerNotReady { code: 554, .. }));
        }

        #[tokio::test]
        async fn test_greeting_must_be_220() {
            let mock = Builder::new().read(b"250 mx.example.com\r\n").build();
            let err = greeted(mock).await.unwrap_err();
            assert!(matches!(err, Error::ServerNotReady { code: 250, .. }));
        }

        #[tokio::test]
        async fn test_malformed_reply() {
            let mock = Builder::new().read(b"hello there\r\n").build();
            assert!(matches!(greeted(mock).await.unwrap_err(), Error::Unspec(_)));
        }

        #[tokio::test]
        async fn test_uncaught_continuation() {
            let mock = Builder::new()
                .read(b"220 mx.example.com ESMTP\r\n")
                .write(b"NOOP\r\n")
                .read(b"250-one\r\n")
                .build();
            let client: Client<Greeted, _> = greeted(mock).await.unwrap().into_state();
            let err = client.noop().await.unwrap_err();
            assert!(matches!(err, Error::Uncaught(line) if line == "250-one"));
        }

        #[tokio::test]
        async fn test_unused_data() {
            let mock = Builder::new()
                .read(b"220 mx.example.com ESMTP\r\n250 surprise\r\n")
                .build();
            let err = greeted(mock).await.unwrap_err();
            assert!(matches!(err, Error::Unused(line) if line == "250 surprise"));
        }
    }
}
