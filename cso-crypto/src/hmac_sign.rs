use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGN_SIZE: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Computes the HMAC-SHA256 of `data` under `key`. Used to sign plaintext
/// frames, mirroring `utils.CalcHMAC` in the original implementation.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; SIGN_SIZE] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Constant-time comparison between `expected` and the HMAC of `data` under
/// `key`, mirroring `utils.ValidateHMAC`.
pub fn validate_hmac(key: &[u8], data: &[u8], expected: &[u8; SIGN_SIZE]) -> bool {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.verify_slice(expected).is_ok()
}
