use byteorder::{ByteOrder, LittleEndian};

use crate::error::WireError;

const TICKET_LEN: usize = 34;

/// The 34-byte activation ticket handed back by `register-connection` and
/// replayed on the TCP session to bind it to the handshake. Matches
/// `message/ticket/ticket.go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u16,
    pub token: [u8; 32],
}

impl Ticket {
    pub fn parse(buffer: &[u8]) -> Result<Ticket, WireError> {
        if buffer.len() != TICKET_LEN {
            return Err(WireError::InvalidTicket);
        }
        let mut token = [0u8; 32];
        token.copy_from_slice(&buffer[2..]);
        Ok(Ticket {
            id: LittleEndian::read_u16(&buffer[0..2]),
            token,
        })
    }

    pub fn into_bytes(&self) -> [u8; TICKET_LEN] {
        let mut buffer = [0u8; TICKET_LEN];
        LittleEndian::write_u16(&mut buffer[0..2], self.id);
        buffer[2..].copy_from_slice(&self.token);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // spec.md §8, fixture 3.
    #[test]
    fn round_trip_max_id() {
        let token = [7u8; 32];
        let ticket = Ticket { id: 65535, token };
        let bytes = ticket.into_bytes();
        assert_eq!(&bytes[0..2], &[0xFF, 0xFF]);

        let parsed = Ticket::parse(&bytes).unwrap();
        assert_eq!(parsed.id, 65535);
        assert_eq!(parsed.token, token);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(Ticket::parse(&[0u8; 33]), Err(WireError::InvalidTicket));
        assert_eq!(Ticket::parse(&[0u8; 35]), Err(WireError::InvalidTicket));
    }
}
