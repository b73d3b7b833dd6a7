//! Line-oriented I/O shared by the mail protocols.
//!
//! All four protocols exchange CRLF-terminated lines with the occasional
//! raw block (SMTP `BDAT` chunks, IMAP literals). [`Transport`] wraps any
//! async stream with a read buffer, an optional read timeout and a check
//! for unexpected pending input.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::trace;

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Commands whose arguments are credentials.
const SECRET_COMMANDS: &[&str] = &["AUTH", "AUTHENTICATE", "LOGIN", "PASS", "APOP"];

/// A buffered line transport over a stream.
#[derive(Debug)]
pub struct Transport<S> {
    reader: BufReader<S>,
    timeout: Option<Duration>,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a transport without read timeout.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            timeout: None,
        }
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The read timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Reads one line without its line break (CRLF or LF).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the peer closed the connection,
    /// [`Error::Timeout`] if nothing arrived in time and
    /// [`Error::LineTooLong`] for runaway lines.
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let timeout = self.timeout;
        let mut line = timed(timeout, read_raw_line(&mut self.reader)).await?;
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        trace!("S: {}", String::from_utf8_lossy(&line));
        Ok(line)
    }

    /// Reads one line as text, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// See [`Transport::read_line`].
    pub async fn read_line_lossy(&mut self) -> Result<String> {
        let line = self.read_line().await?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Reads exactly `n` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the stream ends early.
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut data = vec![0u8; n];
        let timeout = self.timeout;
        timed(timeout, async {
            self.reader.read_exact(&mut data).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => Error::Eof,
                _ => Error::Io(e),
            })
        })
        .await?;
        trace!("S: <{n} bytes>");
        Ok(data)
    }

    /// Writes a line and appends CRLF.
    ///
    /// Credentials following `AUTH`, `LOGIN`, `PASS` and the like are
    /// kept out of the trace.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        trace!("C: {}", redact(line));
        self.send_line(line).await
    }

    /// Writes a line holding nothing but credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_secret_line(&mut self, line: &str) -> Result<()> {
        trace!("C: <credentials>");
        self.send_line(line).await
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.send(&data).await
    }

    /// Writes raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        trace!("C: <{} bytes>", data.len());
        self.send(data).await
    }

    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Returns true if no further input is pending right now.
    ///
    /// Buffered bytes or data the stream can deliver without waiting count
    /// as pending; a closed stream counts as done.
    ///
    /// # Errors
    ///
    /// Returns an error if polling the stream fails.
    pub async fn is_done(&mut self) -> Result<bool> {
        if !self.reader.buffer().is_empty() {
            return Ok(false);
        }
        match tokio::time::timeout(Duration::ZERO, self.reader.fill_buf()).await {
            Err(_) => Ok(true),
            Ok(Ok(buf)) => Ok(buf.is_empty()),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Waits until input is available, without consuming it.
    ///
    /// No timeout applies. The future may be dropped at any time without
    /// losing data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Eof`] if the peer closed the connection.
    pub async fn wait_readable(&mut self) -> Result<()> {
        if self.reader.fill_buf().await?.is_empty() {
            return Err(Error::Eof);
        }
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Gets a mutable reference to the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Consumes the transport and returns the inner stream.
    ///
    /// Fails if input is still buffered, since it would be lost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the read buffer is not empty.
    pub fn into_inner(self) -> Result<S> {
        if !self.reader.buffer().is_empty() {
            return Err(Error::InvalidState("unread input before stream switch".to_string()));
        }
        Ok(self.reader.into_inner())
    }
}

async fn timed<T>(limit: Option<Duration>, fut: impl Future<Output = Result<T>>) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| Error::Timeout(limit))?,
        None => fut.await,
    }
}

async fn read_raw_line<R: AsyncRead + Unpin>(reader: &mut BufReader<R>) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Err(Error::Eof);
        }
        if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
            line.extend_from_slice(&buf[..=pos]);
            reader.consume(pos + 1);
            return Ok(line);
        }
        let len = buf.len();
        line.extend_from_slice(buf);
        reader.consume(len);
        if line.len() > MAX_LINE_LENGTH {
            return Err(Error::LineTooLong(MAX_LINE_LENGTH));
        }
    }
}

/// Elides everything after a credential-bearing command word.
fn redact(line: &str) -> String {
    let words: Vec<&str> = line.split(' ').collect();
    // IMAP lines start with a tag.
    let secret = words
        .iter()
        .take(2)
        .position(|w| SECRET_COMMANDS.iter().any(|c| c.eq_ignore_ascii_case(w)));
    match secret {
        Some(i) if words.len() > i + 1 => format!("{} <credentials>", words[..=i].join(" ")),
        _ => line.to_string(),
    }
}
