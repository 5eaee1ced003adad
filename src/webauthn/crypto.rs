//! Cryptographic operations for the ceremony engine
//!
//! Challenge generation from the OS random source, SHA-256 digests, and
//! assertion signature verification against a stored public key. The key
//! algorithm is selected once, when the DER-encoded SubjectPublicKeyInfo
//! is decoded, and carried as a closed enum.

use p256::ecdsa::signature::Verifier as _;
use p256::pkcs8::DecodePublicKey as _;
use rand::rngs::OsRng;
use rand::TryRngCore;
use rsa::pkcs8::DecodePublicKey as _;
use rsa::signature::Verifier as _;
use sha2::{Digest, Sha256};

use super::errors::WebAuthnError;

/// Challenge length in bytes (256 bits)
pub const CHALLENGE_LEN: usize = 32;

/// Generate a fresh random challenge.
///
/// # Errors
/// Returns `RandomSourceFailure` if the OS random source fails. The
/// failure is propagated, never papered over with a weaker source.
pub fn generate_challenge() -> Result<Vec<u8>, WebAuthnError> {
    random_bytes(CHALLENGE_LEN)
}

/// Fill a buffer of the given length from the OS random source.
///
/// # Errors
/// Returns `RandomSourceFailure` if the OS random source fails.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, WebAuthnError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| WebAuthnError::RandomSourceFailure)?;
    Ok(bytes)
}

/// Hash data with SHA-256
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// A stored public key, decoded once and ready to verify assertions
pub enum VerifierKey {
    /// ECDSA P-256, signatures are DER-encoded `(r, s)` (ES256)
    Ecdsa(p256::ecdsa::VerifyingKey),
    /// RSA, signatures are PKCS#1 v1.5 over SHA-256 (RS256)
    Rsa(rsa::RsaPublicKey),
}

impl VerifierKey {
    /// Decode a DER-encoded SubjectPublicKeyInfo into a verifier key.
    ///
    /// # Errors
    /// Returns `UnsupportedKeyType` if the key is neither ECDSA P-256 nor
    /// RSA (or the DER is malformed).
    pub fn from_spki_der(der: &[u8]) -> Result<Self, WebAuthnError> {
        if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_der(der) {
            return Ok(Self::Ecdsa(key));
        }
        if let Ok(key) = rsa::RsaPublicKey::from_public_key_der(der) {
            return Ok(Self::Rsa(key));
        }
        Err(WebAuthnError::UnsupportedKeyType)
    }

    /// Verify an assertion signature over `message`, hashed with SHA-256.
    ///
    /// # Errors
    /// Returns `SignatureVerificationFailed` if the signature is malformed
    /// or does not verify against this key.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), WebAuthnError> {
        match self {
            Self::Ecdsa(key) => {
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| WebAuthnError::SignatureVerificationFailed)?;
                key.verify(message, &signature)
                    .map_err(|_| WebAuthnError::SignatureVerificationFailed)
            }
            Self::Rsa(key) => {
                let verifying_key = rsa::pkcs1v15::VerifyingKey::<Sha256>::new(key.clone());
                let signature = rsa::pkcs1v15::Signature::try_from(signature)
                    .map_err(|_| WebAuthnError::SignatureVerificationFailed)?;
                verifying_key
                    .verify(message, &signature)
                    .map_err(|_| WebAuthnError::SignatureVerificationFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::signature::Signer as _;
    use p256::pkcs8::EncodePublicKey as _;

    fn ec_signing_key() -> p256::ecdsa::SigningKey {
        // Fixed scalar keeps the test deterministic
        p256::ecdsa::SigningKey::from_slice(&[7u8; 32]).expect("valid P-256 scalar")
    }

    #[test]
    fn challenges_are_32_bytes_and_unique() {
        let a = generate_challenge().expect("challenge");
        let b = generate_challenge().expect("challenge");
        assert_eq!(a.len(), CHALLENGE_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn ecdsa_spki_roundtrip_verifies() {
        let signing_key = ec_signing_key();
        let spki = signing_key
            .verifying_key()
            .to_public_key_der()
            .expect("spki der");

        let key = VerifierKey::from_spki_der(spki.as_bytes()).expect("decodes as ECDSA");
        assert!(matches!(key, VerifierKey::Ecdsa(_)));

        let message = b"signed payload";
        let signature: p256::ecdsa::Signature = signing_key.sign(message);
        key.verify(message, signature.to_der().as_bytes())
            .expect("signature verifies");
        assert!(key
            .verify(b"other payload", signature.to_der().as_bytes())
            .is_err());
    }

    #[test]
    fn ed25519_spki_is_unsupported() {
        // Minimal SPKI with the Ed25519 OID (1.3.101.112)
        let mut spki = Vec::new();
        spki.extend_from_slice(&[0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70]);
        spki.extend_from_slice(&[0x03, 0x21, 0x00]);
        spki.extend_from_slice(&[0xab; 32]);

        assert!(matches!(
            VerifierKey::from_spki_der(&spki),
            Err(WebAuthnError::UnsupportedKeyType)
        ));
    }

    #[test]
    fn garbage_der_is_unsupported() {
        assert!(matches!(
            VerifierKey::from_spki_der(&[0x00, 0x01, 0x02]),
            Err(WebAuthnError::UnsupportedKeyType)
        ));
    }
}
