use std::fmt;

/// Decode/encode failures for the wire codecs. Hand-written, matching the
/// teacher crate's own `HandshakeError` (no `thiserror`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    TooShort,
    InvalidNameLength(usize),
    InvalidIv(usize),
    InvalidAuthenTag(usize),
    InvalidSign(usize),
    InvalidTicket,
    InvalidReadyTicket,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::TooShort => write!(f, "buffer shorter than the fixed header"),
            WireError::InvalidNameLength(len) => write!(f, "invalid name length: {len}"),
            WireError::InvalidIv(len) => write!(f, "invalid IV length: {len}"),
            WireError::InvalidAuthenTag(len) => write!(f, "invalid authen-tag length: {len}"),
            WireError::InvalidSign(len) => write!(f, "invalid sign length: {len}"),
            WireError::InvalidTicket => write!(f, "ticket must be exactly 34 bytes"),
            WireError::InvalidReadyTicket => write!(f, "ready ticket must be exactly 21 bytes"),
        }
    }
}

impl std::error::Error for WireError {}
