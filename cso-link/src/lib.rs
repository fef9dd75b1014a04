//! The framed TCP link: connect, a 2-byte little-endian length-prefix
//! framer/deframer, and a bounded inbound channel. Grounded on
//! `csoconnection/conn_implement.go`'s `connectionImpl`, reworked from its
//! single-goroutine-plus-channel shape into plain OS threads and
//! `crossbeam_channel` (the maintained successor to the teacher's own
//! `crossbeam` dependency), matching spec.md §4.6/§5's reader-thread model.

mod error;
mod status;
mod transport;

pub use error::LinkError;
pub use status::Status;
pub use transport::{FramedLink, BUFFER_SIZE, HEADER_SIZE};
