//! Ed25519 ownership proofs.
//!
//! An address is the lowercase hex of a 32-byte verifying key; a signature is
//! the lowercase hex of a 64-byte Ed25519 signature over the UTF-8 bytes of
//! the challenge message.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

pub trait SignatureVerifier: Send + Sync {
    /// Returns `false` for malformed input instead of failing.
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, message: &str, address: &str, signature: &str) -> bool {
        let mut key_bytes = [0u8; 32];
        if hex::decode_to_slice(address, &mut key_bytes).is_err() {
            return false;
        }
        let mut sig_bytes = [0u8; 64];
        if hex::decode_to_slice(signature, &mut sig_bytes).is_err() {
            return false;
        }
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let sig = Signature::from_bytes(&sig_bytes);
        key.verify(message.as_bytes(), &sig).is_ok()
    }
}

pub fn address_of(key: &VerifyingKey) -> String {
    hex::encode(key.to_bytes())
}

/// Signs a challenge message and returns the hex signature `submit` expects.
pub fn sign_challenge(key: &SigningKey, message: &str) -> String {
    hex::encode(key.sign(message.as_bytes()).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn verify_accepts_own_signature() {
        let key = SigningKey::generate(&mut OsRng);
        let address = address_of(&key.verifying_key());
        let sig = sign_challenge(&key, "hello");
        assert_eq!(address.len(), 64);
        assert_eq!(sig.len(), 128);
        assert!(Ed25519Verifier.verify("hello", &address, &sig));
    }

    #[test]
    fn verify_rejects_other_message_or_key() {
        let key = SigningKey::generate(&mut OsRng);
        let other = SigningKey::generate(&mut OsRng);
        let address = address_of(&key.verifying_key());
        let sig = sign_challenge(&key, "hello");
        assert!(!Ed25519Verifier.verify("hullo", &address, &sig));
        assert!(!Ed25519Verifier.verify(
            "hello",
            &address_of(&other.verifying_key()),
            &sig
        ));
    }

    #[test]
    fn verify_is_false_on_malformed_input() {
        let key = SigningKey::generate(&mut OsRng);
        let address = address_of(&key.verifying_key());
        let sig = sign_challenge(&key, "hello");
        assert!(!Ed25519Verifier.verify("hello", "not-hex", &sig));
        assert!(!Ed25519Verifier.verify("hello", &address, "zz"));
        assert!(!Ed25519Verifier.verify("hello", &address, &sig[..64]));
        assert!(!Ed25519Verifier.verify("hello", "", ""));
    }
}
