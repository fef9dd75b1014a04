use std::sync::RwLock;

use cso_wire::{
    build_aad, build_cipher_bytes, build_no_cipher_bytes, build_raw_bytes, Cipher, MessageType,
};

use crate::error::SessionError;

/// Builds and parses `Cipher` frames against the session's current secret
/// key, grounded on `csoparser/parser_implement.go`'s `parserImpl`. The key
/// is set once per successful handshake (`set_secret_key`, called by the
/// reconnect supervisor) and read on every build/parse call thereafter from
/// the dispatcher thread; the `RwLock` exists for that cross-thread handoff,
/// not for contention.
pub struct Parser {
    secret_key: RwLock<Option<[u8; 32]>>,
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            secret_key: RwLock::new(None),
        }
    }

    pub fn set_secret_key(&self, secret_key: [u8; 32]) {
        *self.secret_key.write().expect("parser lock poisoned") = Some(secret_key);
    }

    fn key(&self) -> Result<[u8; 32], SessionError> {
        self.secret_key
            .read()
            .expect("parser lock poisoned")
            .ok_or(SessionError::NoSecretKey)
    }

    /// `ParseReceivedMessage`: parses the wire frame, then either verifies
    /// its HMAC (plaintext) or decrypts its payload (encrypted), returning a
    /// normalized `Cipher` with `is_encrypted == false` either way.
    pub fn parse_received_message(&self, content: &[u8]) -> Result<Cipher, SessionError> {
        let mut msg = Cipher::parse(content)?;

        if !msg.is_encrypted {
            let key = self.key()?;
            let raw = msg.raw_bytes()?;
            let sign = msg.sign.ok_or(SessionError::SignatureMismatch)?;
            if !cso_crypto::validate_hmac(&key, &raw, &sign) {
                return Err(SessionError::SignatureMismatch);
            }
            return Ok(msg);
        }

        let key = self.key()?;
        let aad = msg.aad()?;
        let iv = msg.iv.ok_or(cso_wire::WireError::InvalidIv(0))?;
        let authen_tag = msg
            .authen_tag
            .ok_or(cso_wire::WireError::InvalidAuthenTag(0))?;
        msg.data = cso_crypto::decrypt(&key, &iv, &authen_tag, &msg.data, &aad)?;
        msg.is_encrypted = false;
        msg.iv = None;
        msg.authen_tag = None;
        Ok(msg)
    }

    /// `BuildActivateMessage`: wraps the 34-byte activation ticket in an
    /// always-encrypted `TypeActivation` frame, named after the decimal
    /// ticket id.
    pub fn build_activate_message(
        &self,
        ticket_id: u32,
        ticket_bytes: &[u8; 34],
    ) -> Result<Vec<u8>, SessionError> {
        let key = self.key()?;
        let name = ticket_id.to_string();
        let aad = build_aad(0, 0, MessageType::Activation, true, true, true, true, &name)?;
        let (iv, authen_tag, data) = cso_crypto::encrypt(&key, ticket_bytes, &aad)?;
        Ok(build_cipher_bytes(
            0,
            0,
            MessageType::Activation,
            true,
            true,
            true,
            &name,
            &iv,
            &data,
            &authen_tag,
        )?)
    }

    /// `BuildMessage`: a single-recipient frame. `msg_tag` is the
    /// original's `reqMsgID` parameter — it's carried through to the
    /// header's `MessageTag` field, not a separate request-id concept.
    #[allow(clippy::too_many_arguments)]
    pub fn build_message(
        &self,
        msg_id: u64,
        msg_tag: u64,
        recv_name: &str,
        content: &[u8],
        encrypted: bool,
        cached: bool,
        first: bool,
        last: bool,
        request: bool,
    ) -> Result<Vec<u8>, SessionError> {
        self.build(
            msg_id, msg_tag, message_type(false, cached), recv_name, content, encrypted, first,
            last, request,
        )
    }

    /// `BuildGroupMessage`: the group-recipient counterpart of `build_message`.
    #[allow(clippy::too_many_arguments)]
    pub fn build_group_message(
        &self,
        msg_id: u64,
        msg_tag: u64,
        group_name: &str,
        content: &[u8],
        encrypted: bool,
        cached: bool,
        first: bool,
        last: bool,
        request: bool,
    ) -> Result<Vec<u8>, SessionError> {
        self.build(
            msg_id, msg_tag, message_type(true, cached), group_name, content, encrypted, first,
            last, request,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        msg_id: u64,
        msg_tag: u64,
        msg_type: MessageType,
        name: &str,
        content: &[u8],
        encrypted: bool,
        first: bool,
        last: bool,
        request: bool,
    ) -> Result<Vec<u8>, SessionError> {
        if !encrypted {
            let key = self.key()?;
            let raw = build_raw_bytes(
                msg_id, msg_tag, msg_type, false, first, last, request, name, content,
            )?;
            let sign = cso_crypto::hmac_sha256(&key, &raw);
            return Ok(build_no_cipher_bytes(
                msg_id, msg_tag, msg_type, first, last, request, name, content, &sign,
            )?);
        }

        let key = self.key()?;
        let aad = build_aad(msg_id, msg_tag, msg_type, true, first, last, request, name)?;
        let (iv, authen_tag, data) = cso_crypto::encrypt(&key, content, &aad)?;
        Ok(build_cipher_bytes(
            msg_id, msg_tag, msg_type, first, last, request, name, &iv, &data, &authen_tag,
        )?)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new()
    }
}

fn message_type(is_group: bool, is_cached: bool) -> MessageType {
    match (is_group, is_cached) {
        (true, true) => MessageType::GroupCached,
        (true, false) => MessageType::Group,
        (false, true) => MessageType::SingleCached,
        (false, false) => MessageType::Single,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_round_trips_through_parse() {
        let parser = Parser::new();
        parser.set_secret_key([3u8; 32]);

        let bytes = parser
            .build_message(5, 0, "peer", b"hi", false, false, true, true, true)
            .unwrap();
        let parsed = parser.parse_received_message(&bytes).unwrap();
        assert_eq!(parsed.data, b"hi");
        assert_eq!(parsed.name, "peer");
        assert!(!parsed.is_encrypted);
    }

    #[test]
    fn encrypted_round_trips_through_parse() {
        let parser = Parser::new();
        parser.set_secret_key([9u8; 32]);

        let bytes = parser
            .build_group_message(7, 2, "team", b"hello team", true, true, true, false, true)
            .unwrap();
        let parsed = parser.parse_received_message(&bytes).unwrap();
        assert_eq!(parsed.data, b"hello team");
        assert_eq!(parsed.message_type, MessageType::GroupCached);
        assert_eq!(parsed.message_tag, 2);
    }

    #[test]
    fn tampered_plaintext_frame_fails_hmac() {
        let parser = Parser::new();
        parser.set_secret_key([1u8; 32]);

        let mut bytes = parser
            .build_message(1, 0, "peer", b"payload", false, false, true, true, true)
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            parser.parse_received_message(&bytes),
            Err(SessionError::SignatureMismatch)
        ));
    }

    #[test]
    fn build_without_secret_key_fails() {
        let parser = Parser::new();
        assert!(matches!(
            parser.build_message(1, 0, "peer", b"x", true, false, true, true, true),
            Err(SessionError::NoSecretKey)
        ));
    }

    #[test]
    fn build_activate_message_uses_decimal_ticket_id_as_name() {
        let parser = Parser::new();
        parser.set_secret_key([5u8; 32]);
        let ticket_bytes = [7u8; 34];
        let bytes = parser.build_activate_message(65535, &ticket_bytes).unwrap();
        let parsed = parser.parse_received_message(&bytes).unwrap();
        assert_eq!(parsed.name, "65535");
        assert_eq!(parsed.data, ticket_bytes);
        assert_eq!(parsed.message_type, MessageType::Activation);
    }
}
