//! The out-of-band HTTP handshake: `exchange-key` and `register-connection`
//! against the Proxy server, plus the `Config` it runs against. Grounded on
//! `csoproxy/proxy_implement.go`, `csoproxy/proxy_message.go` and
//! `config/config.go`.

mod client;
mod config;
mod error;
mod messages;

pub use client::{HandshakeClient, ServerKey, ServerTicket};
pub use config::{Config, ConfigError};
pub use error::HandshakeError;
