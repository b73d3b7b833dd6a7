//! IMAP connection management.
//!
//! - [`Client`]: type-state client over a [`Transport`]
//! - [`IdleHandle`]: an IDLE command in progress
//!
//! The `framed`, `exchange` and `watcher` modules underneath split the work
//! of reading responses, running one command, and draining untagged data
//! between commands.

mod client;
mod exchange;
mod framed;
mod idle;
mod watcher;

pub use client::{Authenticated, Authorized, Client, NotAuthenticated, Selected};
pub use idle::{IdleEvent, IdleHandle};

use hermeneutics_net::{Config, Security, Transport};
use tracing::debug;

use crate::error::Result;

/// Default IMAP port.
pub const DEFAULT_PORT: u16 = 143;

/// Default IMAP port with implicit TLS.
pub const DEFAULT_TLS_PORT: u16 = 993;

/// Connects to an IMAP server and reads the greeting.
///
/// With [`Security::StartTls`] the connection is upgraded before it is
/// returned.
///
/// # Errors
///
/// Returns an error if the connection, the greeting or the TLS upgrade fails.
pub async fn connect(config: &Config) -> Result<Client<NotAuthenticated>> {
    let port = config.port_or(DEFAULT_PORT, DEFAULT_TLS_PORT);
    let stream = hermeneutics_net::connect(config, port).await?;
    let client = Client::new(Transport::new(stream).with_timeout(config.read_timeout)).await?;
    if config.security == Security::StartTls {
        debug!("upgrading with STARTTLS");
        return client.starttls(config).await;
    }
    Ok(client)
}
