//! Public entry point for the Cloud Socket client: wires the handshake,
//! framed link, counter, retry queue and parser together behind a small
//! `Client` facade, mirroring `csoconnector::Connector`'s public surface
//! (`Open`, `Listen`, `SendMessage`, `SendGroupMessage`,
//! `SendMessageAndRetry`, `SendGroupMessageAndRetry`).

use std::error::Error;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub use cso_handshake::{Config, ConfigError, HandshakeError, ServerKey, ServerTicket};
pub use cso_link::Status;
pub use cso_session::SessionError;

use cso_session::Session;

/// A connection to a Cloud Socket hub. Construct once, spawn `open` and
/// `listen` on their own threads, then call the `send_*` methods from
/// anywhere.
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    /// `bufferSize` bounds both the inbound frame channel and the retry
    /// queue's capacity, matching `DefaultConnector`.
    pub fn new(buffer_size: usize, config: Config) -> Client {
        Client {
            session: Arc::new(Session::new(buffer_size, config)),
        }
    }

    /// Loads `Config` from a `cso_key.json`-shaped file before constructing
    /// the client, matching `NewConfigFromFile` plus `DefaultConnector`.
    pub fn from_config_file(buffer_size: usize, path: &str) -> Result<Client, ConfigError> {
        Ok(Client::new(buffer_size, Config::from_file(path)?))
    }

    /// `Open`: spawns the reconnect supervisor on its own thread. The
    /// returned handle never finishes on its own; join it only to propagate
    /// a panic.
    pub fn open(&self) -> JoinHandle<()> {
        let session = Arc::clone(&self.session);
        thread::spawn(move || session.open())
    }

    /// `Listen`: spawns the dispatcher loop on its own thread, delivering
    /// every inbound application message to `callback`. Returning `Err`
    /// from `callback` leaves the message undelivered-looking to the hub
    /// (no ack sent), so it will be redelivered.
    pub fn listen<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(&str, &[u8]) -> Result<(), Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
    {
        let session = Arc::clone(&self.session);
        thread::spawn(move || session.listen(callback))
    }

    pub fn is_activated(&self) -> bool {
        self.session.is_activated()
    }

    /// `SendMessage`: no retry tracking; delivery is best-effort.
    pub fn send_message(
        &self,
        recv_name: &str,
        content: &[u8],
        is_encrypted: bool,
        is_cached: bool,
    ) -> Result<(), SessionError> {
        self.session
            .send_message(recv_name, content, is_encrypted, is_cached)
    }

    /// `SendGroupMessage`: the group-recipient counterpart of `send_message`.
    pub fn send_group_message(
        &self,
        group_name: &str,
        content: &[u8],
        is_encrypted: bool,
        is_cached: bool,
    ) -> Result<(), SessionError> {
        self.session
            .send_group_message(group_name, content, is_encrypted, is_cached)
    }

    /// `SendMessageAndRetry`: queued with `number_retry + 1` delivery
    /// attempts, resent every 3s until acknowledged.
    pub fn send_message_and_retry(
        &self,
        recv_name: &str,
        content: &[u8],
        is_encrypted: bool,
        number_retry: i32,
    ) -> Result<(), SessionError> {
        self.session
            .send_message_and_retry(recv_name, content, is_encrypted, number_retry)
    }

    /// `SendGroupMessageAndRetry`: the group-recipient counterpart.
    pub fn send_group_message_and_retry(
        &self,
        group_name: &str,
        content: &[u8],
        is_encrypted: bool,
        number_retry: i32,
    ) -> Result<(), SessionError> {
        self.session
            .send_group_message_and_retry(group_name, content, is_encrypted, number_retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_starts_unactivated() {
        let config = Config::new("proj", "dG9rZW4=", "conn", "", "http://127.0.0.1:1");
        let client = Client::new(16, config);
        assert!(!client.is_activated());
        assert!(matches!(
            client.send_message("peer", b"hi", true, false),
            Err(SessionError::NotActivated)
        ));
    }
}
