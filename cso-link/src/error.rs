use std::fmt;
use std::io;

/// Link-level failures: connect/read/write faults and protocol misuse.
/// Hand-written, matching the teacher crate's own error style.
#[derive(Debug)]
pub enum LinkError {
    NotConnected,
    Io(io::Error),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NotConnected => write!(f, "the connection is closed"),
            LinkError::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LinkError::Io(e) => Some(e),
            LinkError::NotConnected => None,
        }
    }
}

impl From<io::Error> for LinkError {
    fn from(e: io::Error) -> Self {
        LinkError::Io(e)
    }
}
