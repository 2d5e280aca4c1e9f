//! Validator keystore and deterministic signer (spec §4.1).

pub mod keystore;

pub use keystore::{Ed25519Keystore, Keystore, KeystoreError};
