use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::CryptoError;

pub const KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 12;
pub const AUTHEN_TAG_SIZE: usize = 16;

/// Seals `plain_text` under `key` with `aad` bound but not encrypted,
/// generating a fresh random 12-byte IV. Returns `(iv, authen_tag, cipher_text)`
/// with the tag split out of the sealed output, matching `utils.EncryptAES`
/// in the original implementation (which trims the trailing 16 tag bytes off
/// the GCM `Seal` output before returning).
pub fn encrypt(
    key: &[u8; KEY_SIZE],
    plain_text: &[u8],
    aad: &[u8],
) -> Result<([u8; IV_SIZE], [u8; AUTHEN_TAG_SIZE], Vec<u8>), CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut sealed = cipher
        .encrypt(&nonce, Payload { msg: plain_text, aad })
        .map_err(|e| CryptoError::Aead(e.to_string()))?;

    let tag_offset = sealed.len() - AUTHEN_TAG_SIZE;
    let mut authen_tag = [0u8; AUTHEN_TAG_SIZE];
    authen_tag.copy_from_slice(&sealed[tag_offset..]);
    sealed.truncate(tag_offset);

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(nonce.as_slice());
    Ok((iv, authen_tag, sealed))
}

/// Opens `cipher_text` + `authen_tag` under `key`/`iv`/`aad`. Fails with
/// `CryptoError::Aead` on tag mismatch (tampered header or payload).
pub fn decrypt(
    key: &[u8; KEY_SIZE],
    iv: &[u8; IV_SIZE],
    authen_tag: &[u8; AUTHEN_TAG_SIZE],
    cipher_text: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(iv);

    let mut sealed = Vec::with_capacity(cipher_text.len() + AUTHEN_TAG_SIZE);
    sealed.extend_from_slice(cipher_text);
    sealed.extend_from_slice(authen_tag);

    cipher
        .decrypt(nonce, Payload { msg: &sealed, aad })
        .map_err(|e| CryptoError::Aead(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = [7u8; KEY_SIZE];
        let aad = b"header-bytes";
        let plain = b"Goldeneye Technologies";

        let (iv, tag, cipher_text) = encrypt(&key, plain, aad).unwrap();
        let recovered = decrypt(&key, &iv, &tag, &cipher_text, aad).unwrap();
        assert_eq!(recovered, plain);
    }

    #[test]
    fn tampered_aad_fails() {
        let key = [7u8; KEY_SIZE];
        let (iv, tag, cipher_text) = encrypt(&key, b"payload", b"aad-one").unwrap();
        assert!(decrypt(&key, &iv, &tag, &cipher_text, b"aad-two").is_err());
    }

    #[test]
    fn tampered_cipher_text_fails() {
        let key = [7u8; KEY_SIZE];
        let (iv, tag, mut cipher_text) = encrypt(&key, b"payload", b"aad").unwrap();
        cipher_text[0] ^= 0xFF;
        assert!(decrypt(&key, &iv, &tag, &cipher_text, b"aad").is_err());
    }
}
