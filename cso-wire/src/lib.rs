//! The `Cipher` wire frame, its header flags, and the activation ticket
//! codecs. Grounded on `message/cipher/cipher.go`, `message/ticket/ticket.go`
//! and spec.md's `ReadyTicket` layout (§3, §8 fixture 4) from the original
//! Go implementation this protocol was ported from. The little-endian,
//! length-prefixed framing style mirrors `brontide::Machine::write_message`/
//! `read_message`, just with a flag-packed header instead of brontide's
//! encrypted length-prefix.

mod cipher;
mod error;
mod ready_ticket;
mod ticket;

pub use cipher::{
    build_aad, build_cipher_bytes, build_no_cipher_bytes, build_raw_bytes, Cipher, MessageType,
    MAX_NAME_LEN,
};
pub use error::WireError;
pub use ready_ticket::ReadyTicket;
pub use ticket::Ticket;
