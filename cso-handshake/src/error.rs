use std::fmt;

use crate::config::ConfigError;

/// Handshake failures, wrapping the phase they occurred in. Hand-written,
/// matching the crate-wide convention of flat error enums over `thiserror`.
#[derive(Debug)]
pub enum HandshakeError {
    Config(ConfigError),
    Http(reqwest::Error),
    Decode(String),
    Crypto(cso_crypto::CryptoError),
    Wire(cso_wire::WireError),
    /// The server's envelope carried `returncode != 1`; holds its message.
    ServerRejected(String),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::Config(e) => write!(f, "config error: {e}"),
            HandshakeError::Http(e) => write!(f, "http error: {e}"),
            HandshakeError::Decode(msg) => write!(f, "decode error: {msg}"),
            HandshakeError::Crypto(e) => write!(f, "crypto error: {e}"),
            HandshakeError::Wire(e) => write!(f, "wire error: {e}"),
            HandshakeError::ServerRejected(msg) => write!(f, "server rejected request: {msg}"),
        }
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandshakeError::Config(e) => Some(e),
            HandshakeError::Http(e) => Some(e),
            HandshakeError::Crypto(e) => Some(e),
            HandshakeError::Wire(e) => Some(e),
            HandshakeError::Decode(_) | HandshakeError::ServerRejected(_) => None,
        }
    }
}

impl From<ConfigError> for HandshakeError {
    fn from(e: ConfigError) -> Self {
        HandshakeError::Config(e)
    }
}

impl From<reqwest::Error> for HandshakeError {
    fn from(e: reqwest::Error) -> Self {
        HandshakeError::Http(e)
    }
}

impl From<cso_crypto::CryptoError> for HandshakeError {
    fn from(e: cso_crypto::CryptoError) -> Self {
        HandshakeError::Crypto(e)
    }
}

impl From<cso_wire::WireError> for HandshakeError {
    fn from(e: cso_wire::WireError) -> Self {
        HandshakeError::Wire(e)
    }
}
