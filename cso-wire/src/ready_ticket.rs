use byteorder::{ByteOrder, LittleEndian};

use crate::error::WireError;

const READY_TICKET_LEN: usize = 21;

/// The activation acknowledgement delivered inside a `TypeActivation`
/// frame's `Data` field after decryption: whether the hub considers the
/// session ready, plus the read/write watermarks the `Counter` seeds from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyTicket {
    pub is_ready: bool,
    pub idx_read: u64,
    pub mask_read: u32,
    pub idx_write: u64,
}

impl ReadyTicket {
    pub fn parse(buffer: &[u8]) -> Result<ReadyTicket, WireError> {
        if buffer.len() != READY_TICKET_LEN {
            return Err(WireError::InvalidReadyTicket);
        }
        Ok(ReadyTicket {
            is_ready: buffer[0] == 1,
            idx_read: LittleEndian::read_u64(&buffer[1..9]),
            mask_read: LittleEndian::read_u32(&buffer[9..13]),
            idx_write: LittleEndian::read_u64(&buffer[13..21]),
        })
    }

    pub fn into_bytes(&self) -> [u8; READY_TICKET_LEN] {
        let mut buffer = [0u8; READY_TICKET_LEN];
        buffer[0] = self.is_ready as u8;
        LittleEndian::write_u64(&mut buffer[1..9], self.idx_read);
        LittleEndian::write_u32(&mut buffer[9..13], self.mask_read);
        LittleEndian::write_u64(&mut buffer[13..21], self.idx_write);
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // spec.md §8, fixture 4.
    #[test]
    fn parses_max_watermarks() {
        let mut input = vec![1u8];
        input.extend(std::iter::repeat(0xFFu8).take(12));
        input.push(0xFE);
        input.extend(std::iter::repeat(0xFFu8).take(7));
        assert_eq!(input.len(), READY_TICKET_LEN);

        let parsed = ReadyTicket::parse(&input).unwrap();
        assert!(parsed.is_ready);
        assert_eq!(parsed.idx_read, u64::MAX);
        assert_eq!(parsed.mask_read, u32::MAX);
        assert_eq!(parsed.idx_write, u64::MAX - 1);
    }

    #[test]
    fn round_trip() {
        let ticket = ReadyTicket {
            is_ready: true,
            idx_read: 42,
            mask_read: 0b1010,
            idx_write: 100,
        };
        let parsed = ReadyTicket::parse(&ticket.into_bytes()).unwrap();
        assert_eq!(parsed, ticket);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(ReadyTicket::parse(&[0u8; 20]), Err(WireError::InvalidReadyTicket));
    }
}
