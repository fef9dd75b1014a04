use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;

use crate::CryptoError;

/// Verifies `sign` over SHA-256(`data`) against a PEM-encoded SubjectPublicKeyInfo
/// RSA public key, mirroring `utils.VerifyRSASign` (the handshake's
/// `g_key || n_key || pub_key` signature check).
pub fn verify_rsa_sign(public_key_pem: &str, sign: &[u8], data: &[u8]) -> Result<(), CryptoError> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    let verifying_key = VerifyingKey::<Sha256>::new(public_key);
    let signature =
        Signature::try_from(sign).map_err(|e| CryptoError::Signature(e.to_string()))?;
    verifying_key
        .verify(data, &signature)
        .map_err(|e| CryptoError::Signature(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15::SigningKey;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::signature::{SignatureEncoding, Signer};
    use rsa::{RsaPrivateKey, RsaPublicKey};

    #[test]
    fn verifies_a_freshly_signed_payload() {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let pem = public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let data = b"123456789012name";
        let signature = signing_key.sign(data);

        assert!(verify_rsa_sign(&pem, &signature.to_bytes(), data).is_ok());
    }

    #[test]
    fn rejects_signature_over_different_data() {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let pem = public_key
            .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
            .unwrap();

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let signature = signing_key.sign(b"one payload");

        assert!(verify_rsa_sign(&pem, &signature.to_bytes(), b"a different payload").is_err());
    }
}
