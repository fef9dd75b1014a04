use byteorder::{ByteOrder, LittleEndian};

use crate::error::WireError;

pub const MAX_NAME_LEN: usize = 36;

const IV_LEN: usize = 12;
const AUTHEN_TAG_LEN: usize = 16;
const SIGN_LEN: usize = 32;

const FLAG_ENCRYPTED: u8 = 0x80;
const FLAG_FIRST: u8 = 0x40;
const FLAG_LAST: u8 = 0x20;
const FLAG_REQUEST: u8 = 0x10;
const FLAG_USE_TAG: u8 = 0x08;
const FLAG_TYPE_MASK: u8 = 0x07;

/// One of the eight message kinds a `Cipher` frame can carry, packed into
/// the low 3 bits of the header's flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Unknown = 0,
    Ping = 1,
    Activation = 2,
    Single = 3,
    Group = 4,
    SingleCached = 5,
    GroupCached = 6,
    Done = 7,
}

impl From<u8> for MessageType {
    fn from(v: u8) -> Self {
        use MessageType::*;
        match v & FLAG_TYPE_MASK {
            1 => Ping,
            2 => Activation,
            3 => Single,
            4 => Group,
            5 => SingleCached,
            6 => GroupCached,
            7 => Done,
            _ => Unknown,
        }
    }
}

impl From<MessageType> for u8 {
    fn from(v: MessageType) -> Self {
        v as u8
    }
}

/// The core wire entity: a length-framed, flag-packed, either AEAD-sealed
/// or HMAC-signed message. See spec.md §3/§4.2 for the exact byte layout.
#[derive(Debug, Clone)]
pub struct Cipher {
    pub message_id: u64,
    pub message_tag: u64,
    pub message_type: MessageType,
    pub is_first: bool,
    pub is_last: bool,
    pub is_request: bool,
    pub is_encrypted: bool,
    pub name: String,
    pub data: Vec<u8>,
    pub iv: Option<[u8; IV_LEN]>,
    pub authen_tag: Option<[u8; AUTHEN_TAG_LEN]>,
    pub sign: Option<[u8; SIGN_LEN]>,
}

fn flags_byte(
    encrypted: bool,
    first: bool,
    last: bool,
    request: bool,
    use_tag: bool,
    msg_type: MessageType,
) -> u8 {
    (encrypted as u8) << 7
        | (first as u8) << 6
        | (last as u8) << 5
        | (request as u8) << 4
        | (use_tag as u8) << 3
        | u8::from(msg_type)
}

fn fixed_prefix_len(msg_tag: u64) -> usize {
    if msg_tag > 0 {
        18
    } else {
        10
    }
}

fn check_name(name: &str) -> Result<(), WireError> {
    let len = name.len();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(WireError::InvalidNameLength(len));
    }
    Ok(())
}

fn write_header(buffer: &mut [u8], msg_id: u64, msg_tag: u64, flags: u8, len_name: u8) {
    LittleEndian::write_u64(&mut buffer[0..8], msg_id);
    buffer[8] = flags;
    buffer[9] = len_name;
    if msg_tag > 0 {
        LittleEndian::write_u64(&mut buffer[10..18], msg_tag);
    }
}

/// `BuildRawBytes`: the fixed header prefix plus `data`, with no IV/tag/sign
/// region. This is the HMAC input for plaintext frames.
pub fn build_raw_bytes(
    msg_id: u64,
    msg_tag: u64,
    msg_type: MessageType,
    encrypted: bool,
    first: bool,
    last: bool,
    request: bool,
    name: &str,
    data: &[u8],
) -> Result<Vec<u8>, WireError> {
    check_name(name)?;
    let fixed_len = fixed_prefix_len(msg_tag);
    let mut buffer = vec![0u8; fixed_len + name.len() + data.len()];
    write_header(
        &mut buffer,
        msg_id,
        msg_tag,
        flags_byte(encrypted, first, last, request, msg_tag > 0, msg_type),
        name.len() as u8,
    );
    buffer[fixed_len..fixed_len + name.len()].copy_from_slice(name.as_bytes());
    buffer[fixed_len + name.len()..].copy_from_slice(data);
    Ok(buffer)
}

/// `BuildAad`: the fixed header prefix plus `Name`, stopping before any
/// IV/tag/sign region or `Data`. This is what's bound (but not encrypted)
/// by AES-GCM.
pub fn build_aad(
    msg_id: u64,
    msg_tag: u64,
    msg_type: MessageType,
    encrypted: bool,
    first: bool,
    last: bool,
    request: bool,
    name: &str,
) -> Result<Vec<u8>, WireError> {
    check_name(name)?;
    let fixed_len = fixed_prefix_len(msg_tag);
    let mut buffer = vec![0u8; fixed_len + name.len()];
    write_header(
        &mut buffer,
        msg_id,
        msg_tag,
        flags_byte(encrypted, first, last, request, msg_tag > 0, msg_type),
        name.len() as u8,
    );
    buffer[fixed_len..].copy_from_slice(name.as_bytes());
    Ok(buffer)
}

#[allow(clippy::too_many_arguments)]
fn build_bytes(
    msg_id: u64,
    msg_tag: u64,
    msg_type: MessageType,
    encrypted: bool,
    first: bool,
    last: bool,
    request: bool,
    name: &str,
    iv: &[u8],
    data: &[u8],
    authen_tag: &[u8],
    sign: &[u8],
) -> Result<Vec<u8>, WireError> {
    check_name(name)?;
    if encrypted && (iv.len() != IV_LEN || authen_tag.len() != AUTHEN_TAG_LEN) {
        return Err(WireError::InvalidIv(iv.len()));
    }
    if !encrypted && sign.len() != SIGN_LEN {
        return Err(WireError::InvalidSign(sign.len()));
    }

    let fixed_len = fixed_prefix_len(msg_tag);
    let mut buffer =
        vec![0u8; fixed_len + authen_tag.len() + iv.len() + sign.len() + name.len() + data.len()];
    write_header(
        &mut buffer,
        msg_id,
        msg_tag,
        flags_byte(encrypted, first, last, request, msg_tag > 0, msg_type),
        name.len() as u8,
    );

    let mut pos = fixed_len;
    if encrypted {
        buffer[pos..pos + authen_tag.len()].copy_from_slice(authen_tag);
        pos += authen_tag.len();
        buffer[pos..pos + iv.len()].copy_from_slice(iv);
        pos += iv.len();
    } else {
        buffer[pos..pos + sign.len()].copy_from_slice(sign);
        pos += sign.len();
    }
    buffer[pos..pos + name.len()].copy_from_slice(name.as_bytes());
    pos += name.len();
    buffer[pos..].copy_from_slice(data);
    Ok(buffer)
}

/// `BuildCipherBytes`: assembles a full encrypted wire frame (AuthenTag, IV,
/// Name, then ciphertext `Data`).
#[allow(clippy::too_many_arguments)]
pub fn build_cipher_bytes(
    msg_id: u64,
    msg_tag: u64,
    msg_type: MessageType,
    first: bool,
    last: bool,
    request: bool,
    name: &str,
    iv: &[u8; IV_LEN],
    data: &[u8],
    authen_tag: &[u8; AUTHEN_TAG_LEN],
) -> Result<Vec<u8>, WireError> {
    build_bytes(
        msg_id, msg_tag, msg_type, true, first, last, request, name, iv, data, authen_tag, &[],
    )
}

/// `BuildNoCipherBytes`: assembles a full plaintext wire frame (Sign, Name,
/// then `Data`).
#[allow(clippy::too_many_arguments)]
pub fn build_no_cipher_bytes(
    msg_id: u64,
    msg_tag: u64,
    msg_type: MessageType,
    first: bool,
    last: bool,
    request: bool,
    name: &str,
    data: &[u8],
    sign: &[u8; SIGN_LEN],
) -> Result<Vec<u8>, WireError> {
    build_bytes(
        msg_id, msg_tag, msg_type, false, first, last, request, name, &[], data, &[], sign,
    )
}

impl Cipher {
    /// Parses a wire frame, validating lengths exactly as spec.md §4.2 and
    /// `cipher.go`'s `ParseBytes` require.
    pub fn parse(buffer: &[u8]) -> Result<Cipher, WireError> {
        let mut fixed_len = 10usize;
        if buffer.len() < fixed_len {
            return Err(WireError::TooShort);
        }

        let flags = buffer[8];
        let is_encrypted = flags & FLAG_ENCRYPTED != 0;
        let message_id = LittleEndian::read_u64(&buffer[0..8]);
        let len_name = buffer[9] as usize;

        let use_tag = flags & FLAG_USE_TAG != 0;
        let mut pos_authen_tag = fixed_len;
        let message_tag = if use_tag {
            fixed_len += 8;
            pos_authen_tag += 8;
            if buffer.len() < fixed_len {
                return Err(WireError::TooShort);
            }
            LittleEndian::read_u64(&buffer[10..18])
        } else {
            0
        };

        if is_encrypted {
            fixed_len += AUTHEN_TAG_LEN + IV_LEN;
        }
        if buffer.len() < fixed_len + len_name || len_name == 0 || len_name > MAX_NAME_LEN {
            return Err(WireError::InvalidNameLength(len_name));
        }

        let mut iv = None;
        let mut authen_tag = None;
        let mut sign = None;
        if is_encrypted {
            let pos_iv = pos_authen_tag + AUTHEN_TAG_LEN;
            let mut tag = [0u8; AUTHEN_TAG_LEN];
            tag.copy_from_slice(&buffer[pos_authen_tag..pos_iv]);
            authen_tag = Some(tag);
            let mut iv_bytes = [0u8; IV_LEN];
            iv_bytes.copy_from_slice(&buffer[pos_iv..fixed_len]);
            iv = Some(iv_bytes);
        } else {
            let pos_sign = fixed_len;
            fixed_len += SIGN_LEN;
            if buffer.len() < fixed_len + len_name {
                return Err(WireError::InvalidSign(buffer.len()));
            }
            let mut sign_bytes = [0u8; SIGN_LEN];
            sign_bytes.copy_from_slice(&buffer[pos_sign..fixed_len]);
            sign = Some(sign_bytes);
        }

        let pos_data = fixed_len + len_name;
        let name = String::from_utf8_lossy(&buffer[fixed_len..pos_data]).into_owned();
        let data = buffer[pos_data..].to_vec();

        Ok(Cipher {
            message_id,
            message_tag,
            message_type: MessageType::from(flags),
            is_first: flags & FLAG_FIRST != 0,
            is_last: flags & FLAG_LAST != 0,
            is_request: flags & FLAG_REQUEST != 0,
            is_encrypted,
            name,
            data,
            iv,
            authen_tag,
            sign,
        })
    }

    /// `IntoBytes`: re-serializes this `Cipher` in whichever of the two wire
    /// formats `is_encrypted` selects.
    pub fn into_bytes(&self) -> Result<Vec<u8>, WireError> {
        if self.is_encrypted {
            let iv = self.iv.ok_or(WireError::InvalidIv(0))?;
            let authen_tag = self.authen_tag.ok_or(WireError::InvalidAuthenTag(0))?;
            build_cipher_bytes(
                self.message_id,
                self.message_tag,
                self.message_type,
                self.is_first,
                self.is_last,
                self.is_request,
                &self.name,
                &iv,
                &self.data,
                &authen_tag,
            )
        } else {
            let sign = self.sign.ok_or(WireError::InvalidSign(0))?;
            build_no_cipher_bytes(
                self.message_id,
                self.message_tag,
                self.message_type,
                self.is_first,
                self.is_last,
                self.is_request,
                &self.name,
                &self.data,
                &sign,
            )
        }
    }

    /// `GetRawBytes`: the HMAC input for a plaintext frame with this
    /// header/payload.
    pub fn raw_bytes(&self) -> Result<Vec<u8>, WireError> {
        build_raw_bytes(
            self.message_id,
            self.message_tag,
            self.message_type,
            self.is_encrypted,
            self.is_first,
            self.is_last,
            self.is_request,
            &self.name,
            &self.data,
        )
    }

    /// `GetAad`: the AES-GCM associated data for this header.
    pub fn aad(&self) -> Result<Vec<u8>, WireError> {
        build_aad(
            self.message_id,
            self.message_tag,
            self.message_type,
            self.is_encrypted,
            self.is_first,
            self.is_last,
            self.is_request,
            &self.name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // spec.md §8, fixture 1 & 2.
    fn fixture_header() -> (u64, u64, MessageType, &'static str) {
        (1024, 1025, MessageType::Single, "goldeneye_technologies")
    }

    #[test]
    fn build_raw_bytes_matches_fixture() {
        let (id, tag, ty, name) = fixture_header();
        let raw =
            build_raw_bytes(id, tag, ty, true, true, true, true, name, b"Goldeneye Technologies")
                .unwrap();

        assert_eq!(
            &raw[0..10],
            &[0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFB, 0x16]
        );
        assert_eq!(&raw[10..18], &[0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&raw[18..18 + name.len()], name.as_bytes());
        assert_eq!(&raw[18 + name.len()..], b"Goldeneye Technologies");
    }

    #[test]
    fn build_aad_matches_fixture() {
        let (id, tag, ty, name) = fixture_header();
        let aad = build_aad(id, tag, ty, true, true, true, true, name).unwrap();
        assert_eq!(aad.len(), 40);
        assert_eq!(
            &aad[0..10],
            &[0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFB, 0x16]
        );
        assert_eq!(&aad[10..18], &[0x01, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&aad[18..], name.as_bytes());
    }

    #[test]
    fn round_trip_cipher_frame() {
        let iv = [1u8; IV_LEN];
        let authen_tag = [2u8; AUTHEN_TAG_LEN];
        let bytes = build_cipher_bytes(
            42,
            7,
            MessageType::Group,
            true,
            false,
            true,
            "receiver",
            &iv,
            b"payload bytes",
            &authen_tag,
        )
        .unwrap();

        let parsed = Cipher::parse(&bytes).unwrap();
        assert_eq!(parsed.message_id, 42);
        assert_eq!(parsed.message_tag, 7);
        assert_eq!(parsed.message_type, MessageType::Group);
        assert!(parsed.is_first);
        assert!(!parsed.is_last);
        assert!(parsed.is_request);
        assert!(parsed.is_encrypted);
        assert_eq!(parsed.name, "receiver");
        assert_eq!(parsed.data, b"payload bytes");
        assert_eq!(parsed.iv, Some(iv));
        assert_eq!(parsed.authen_tag, Some(authen_tag));
    }

    #[test]
    fn round_trip_plaintext_frame_without_tag() {
        let sign = [9u8; SIGN_LEN];
        let bytes = build_no_cipher_bytes(
            1,
            0,
            MessageType::Ping,
            true,
            true,
            false,
            "n",
            b"",
            &sign,
        )
        .unwrap();

        let parsed = Cipher::parse(&bytes).unwrap();
        assert_eq!(parsed.message_tag, 0);
        assert!(!parsed.is_encrypted);
        assert_eq!(parsed.sign, Some(sign));
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn rejects_name_too_long() {
        let name: String = "a".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            build_raw_bytes(1, 0, MessageType::Single, false, true, true, true, &name, b""),
            Err(WireError::InvalidNameLength(_))
        ));
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(
            build_raw_bytes(1, 0, MessageType::Single, false, true, true, true, "", b""),
            Err(WireError::InvalidNameLength(_))
        ));
    }

    #[test]
    fn parse_rejects_truncated_buffer() {
        assert!(matches!(Cipher::parse(&[1, 2, 3]), Err(WireError::TooShort)));
    }

    #[test]
    fn flipping_a_header_byte_changes_the_aad() {
        let (id, tag, ty, name) = fixture_header();
        let aad = build_aad(id, tag, ty, true, true, true, true, name).unwrap();
        let mut tampered = aad.clone();
        tampered[8] ^= 0x01;
        assert_ne!(aad, tampered);
    }
}
