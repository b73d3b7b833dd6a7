//! Response framing.
//!
//! IMAP responses are CRLF-terminated lines, except that a line ending in
//! `{n}` is followed by exactly `n` raw bytes and then the rest of the
//! response.

use hermeneutics_net::Transport;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};
use crate::parser::{MAX_LITERAL_SIZE, literal_length, parse_response};
use crate::types::Response;

/// Reads one complete response, literals included.
pub(crate) async fn read_response<S>(transport: &mut Transport<S>) -> Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut response = Vec::new();
    loop {
        let line = transport.read_line().await?;
        response.extend_from_slice(&line);
        response.extend_from_slice(b"\r\n");
        let Some(length) = literal_length(&line) else {
            break;
        };
        if length > MAX_LITERAL_SIZE {
            return Err(Error::Protocol(format!(
                "literal too large: {length} bytes (max {MAX_LITERAL_SIZE})"
            )));
        }
        let literal = transport.read_exact(length).await?;
        response.extend_from_slice(&literal);
    }
    Ok(response)
}

/// Reads and parses one response.
pub(crate) async fn next_response<S>(transport: &mut Transport<S>) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let raw = read_response(transport).await?;
    parse_response(&raw)
}
