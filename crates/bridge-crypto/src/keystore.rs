//! Keystore & Signer (spec §4.1).
//!
//! SAFETY INVARIANTS:
//! 1. `sign` is deterministic: the same message under the same key always
//!    produces the same signature bytes. This rules out fork-choice
//!    ambiguity from a validator signing the same canonical message twice
//!    and producing two different signature bytes for it.
//! 2. The secret key never leaves process memory once loaded; `Keystore` is
//!    the only path to it. Callers get signatures and a public key, never
//!    the key material itself.
//!
//! Grounded on the post-quantum signer this replaces
//! (`QuantumSecure`/SPHINCS+-simple: `keygen`/`sign`/`verify`) but
//! implemented with Ed25519, whose deterministic nonce derivation (RFC 8032)
//! satisfies invariant 1 directly rather than relying on a parameter-set
//! assumption. A post-quantum backend can be swapped in behind the same
//! `Keystore` trait later — see DESIGN.md.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeystoreError {
    /// Key material doesn't parse or is the wrong length (spec §4.1).
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

/// Implemented by any signing backend the node can be configured with.
/// `verify` is a free function (not `&self`) because verifying a peer's
/// signature never requires holding that peer's secret key.
pub trait Keystore: Send + Sync {
    fn sign(&self, message: &[u8]) -> Vec<u8>;
    fn public_key(&self) -> Vec<u8>;
    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool
    where
        Self: Sized;
}

/// Ed25519 keystore: holds a signing key in memory, produced from
/// operator-supplied key material (file, env, or argument — all external to
/// this crate; see spec §1 and §4.1).
pub struct Ed25519Keystore {
    signing_key: SigningKey,
}

impl Ed25519Keystore {
    /// Load from a 32-byte Ed25519 secret key.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, KeystoreError> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            KeystoreError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Ed25519Keystore {
            signing_key: SigningKey::from_bytes(&array),
        })
    }

    /// Generate a fresh key. Intended for tests and local development only —
    /// production validators load an operator-provisioned key.
    pub fn generate(rng: &mut impl rand::RngCore) -> Self {
        Ed25519Keystore {
            signing_key: SigningKey::generate(rng),
        }
    }

    /// Loads the raw 32-byte secret key from `path`. How the key material
    /// got onto disk (encrypted at rest, HSM-backed, operator-provisioned)
    /// is external to this crate; this is the one narrow seam the process
    /// entry point calls at startup.
    pub fn from_file(path: &std::path::Path) -> Result<Self, KeystoreError> {
        let bytes = std::fs::read(path)
            .map_err(|e| KeystoreError::InvalidKey(format!("could not read key file: {e}")))?;
        Self::from_secret_bytes(&bytes)
    }
}

impl Drop for Ed25519Keystore {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

impl Keystore for Ed25519Keystore {
    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }

    fn public_key(&self) -> Vec<u8> {
        self.signing_key.verifying_key().to_bytes().to_vec()
    }

    fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key_bytes): Result<[u8; 32], _> = public_key.try_into() else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(sig_bytes): Result<[u8; 64], _> = signature.try_into() else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_bytes);
        verifying_key.verify(message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn signing_is_deterministic() {
        let ks = Ed25519Keystore::generate(&mut OsRng);
        let msg = b"canonical transfer message";
        assert_eq!(ks.sign(msg), ks.sign(msg));
    }

    #[test]
    fn round_trip_verify() {
        let ks = Ed25519Keystore::generate(&mut OsRng);
        let msg = b"canonical transfer message";
        let sig = ks.sign(msg);
        assert!(Ed25519Keystore::verify(&ks.public_key(), msg, &sig));
    }

    #[test]
    fn verify_rejects_tampered_message() {
        let ks = Ed25519Keystore::generate(&mut OsRng);
        let sig = ks.sign(b"original");
        assert!(!Ed25519Keystore::verify(&ks.public_key(), b"tampered", &sig));
    }

    #[test]
    fn rejects_wrong_length_key_material() {
        let err = Ed25519Keystore::from_secret_bytes(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, KeystoreError::InvalidKey(_)));
    }
}
