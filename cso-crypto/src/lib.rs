//! Cryptographic primitives used by the Cloud Socket wire protocol and
//! handshake: AES-256-GCM sealing, HMAC-SHA256 signing, RSA-PKCS1v15
//! signature verification and the classic (non-elliptic) Diffie-Hellman
//! key agreement used during activation.
//!
//! The shapes here mirror `brontide::machine::CipherState` (one seal/open
//! pair keyed by a 32-byte secret) but trade brontide's incrementing-nonce
//! ratchet for a fresh random IV per call, per the wire format's
//! `AES-256-GCM, 96-bit IV, 128-bit tag` contract.

mod aead;
mod dh;
mod hmac_sign;
mod rsa_verify;

pub use aead::{decrypt, encrypt, AUTHEN_TAG_SIZE, IV_SIZE, KEY_SIZE};
pub use dh::{calc_dh_key, calc_secret_key, generate_dh_private_key};
pub use hmac_sign::{hmac_sha256, validate_hmac, SIGN_SIZE};
pub use rsa_verify::verify_rsa_sign;

use std::fmt;

/// Errors surfaced by the crypto primitives. Kept as a flat, hand-written
/// enum (no `thiserror`) to match the teacher crate's own `HandshakeError`.
#[derive(Debug)]
pub enum CryptoError {
    Aead(String),
    Signature(String),
    InvalidKey(String),
    InvalidInteger(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::Aead(msg) => write!(f, "aead error: {msg}"),
            CryptoError::Signature(msg) => write!(f, "signature error: {msg}"),
            CryptoError::InvalidKey(msg) => write!(f, "invalid key: {msg}"),
            CryptoError::InvalidInteger(msg) => write!(f, "invalid integer: {msg}"),
        }
    }
}

impl std::error::Error for CryptoError {}
