use num_bigint::{BigUint, RandBigInt};
use sha2::{Digest, Sha256};

/// Lower bound (inclusive) of the private key range: `2^100`.
const PRIV_KEY_MIN_EXP: u32 = 100;
/// Upper bound (exclusive) of the private key range: `2^180`.
const PRIV_KEY_MAX_EXP: u32 = 180;

/// Draws a uniform private DH key in `[2^100, 2^180)`, matching
/// `utils.GenerateDHPrivateKey`.
pub fn generate_dh_private_key() -> BigUint {
    let min = BigUint::from(1u32) << PRIV_KEY_MIN_EXP;
    let max = BigUint::from(1u32) << PRIV_KEY_MAX_EXP;
    let span = &max - &min;
    let mut rng = rand::thread_rng();
    min + rng.gen_biguint_below(&span)
}

/// `pub = g^priv mod n`, matching `utils.CalcDHKeys`.
pub fn calc_dh_key(g: &BigUint, n: &BigUint, priv_key: &BigUint) -> BigUint {
    g.modpow(priv_key, n)
}

/// `secret = sha256(decimal_string(peer_pub^priv_key mod n))`, matching
/// `utils.CalcSecretKey`. This is the 32-byte AES key used for every
/// AES-GCM seal/open in the handshake and on the activated session.
pub fn calc_secret_key(n: &BigUint, priv_key: &BigUint, peer_pub: &BigUint) -> [u8; 32] {
    let shared = peer_pub.modpow(priv_key, n);
    let digest = Sha256::digest(shared.to_str_radix(10).as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_is_in_range() {
        let min = BigUint::from(1u32) << PRIV_KEY_MIN_EXP;
        let max = BigUint::from(1u32) << PRIV_KEY_MAX_EXP;
        for _ in 0..50 {
            let priv_key = generate_dh_private_key();
            assert!(priv_key >= min);
            assert!(priv_key < max);
        }
    }

    #[test]
    fn both_sides_derive_the_same_secret() {
        let g = BigUint::from(5u32);
        let n = BigUint::parse_bytes(b"1000000000000000000000000000057", 10).unwrap();

        let client_priv = generate_dh_private_key();
        let server_priv = generate_dh_private_key();

        let client_pub = calc_dh_key(&g, &n, &client_priv);
        let server_pub = calc_dh_key(&g, &n, &server_priv);

        let client_secret = calc_secret_key(&n, &client_priv, &server_pub);
        let server_secret = calc_secret_key(&n, &server_priv, &client_pub);

        assert_eq!(client_secret, server_secret);
    }
}
