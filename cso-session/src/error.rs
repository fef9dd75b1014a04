use std::fmt;

/// Failures from parsing or building a wire frame on an activated session.
/// Hand-written, matching the crate-wide flat-enum error convention.
#[derive(Debug)]
pub enum SessionError {
    Wire(cso_wire::WireError),
    Crypto(cso_crypto::CryptoError),
    /// A plaintext frame's HMAC did not match its recomputed value.
    SignatureMismatch,
    /// An operation that needs a secret key ran before one was set.
    NoSecretKey,
    NotActivated,
    QueueFull,
    Link(cso_link::LinkError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Wire(e) => write!(f, "wire error: {e}"),
            SessionError::Crypto(e) => write!(f, "crypto error: {e}"),
            SessionError::SignatureMismatch => write!(f, "HMAC signature mismatch"),
            SessionError::NoSecretKey => write!(f, "no secret key set on parser"),
            SessionError::NotActivated => write!(f, "connection is not activated"),
            SessionError::QueueFull => write!(f, "retry queue is full"),
            SessionError::Link(e) => write!(f, "link error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Wire(e) => Some(e),
            SessionError::Crypto(e) => Some(e),
            SessionError::Link(e) => Some(e),
            _ => None,
        }
    }
}

impl From<cso_link::LinkError> for SessionError {
    fn from(e: cso_link::LinkError) -> Self {
        SessionError::Link(e)
    }
}

impl From<cso_wire::WireError> for SessionError {
    fn from(e: cso_wire::WireError) -> Self {
        SessionError::Wire(e)
    }
}

impl From<cso_crypto::CryptoError> for SessionError {
    fn from(e: cso_crypto::CryptoError) -> Self {
        SessionError::Crypto(e)
    }
}
