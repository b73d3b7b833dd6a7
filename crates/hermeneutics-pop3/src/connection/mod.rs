//! POP3 connection management.

mod client;

pub use client::{Authorization, Client, Transaction, apop_digest};

use crate::error::Result;
use hermeneutics_net::{Config, Transport};

/// Default POP3 port.
pub const DEFAULT_PORT: u16 = 110;

/// Default POP3 port with implicit TLS.
pub const DEFAULT_TLS_PORT: u16 = 995;

/// Connects to a POP3 server and reads the greeting.
///
/// # Errors
///
/// Returns an error if the connection fails or the server greets with `-ERR`.
pub async fn connect(config: &Config) -> Result<Client<Authorization>> {
    let port = config.port_or(DEFAULT_PORT, DEFAULT_TLS_PORT);
    let stream = hermeneutics_net::connect(config, port).await?;
    Client::new(Transport::new(stream).with_timeout(config.read_timeout)).await
}
