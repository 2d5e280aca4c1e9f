//! Bundle re-verification (spec §4.5 step 1): before submitting anything
//! on-chain, re-check every signature independently of whatever
//! `bridge-aggregator` already concluded — a compromised aggregator task
//! should not be able to forge an authorized bundle.

use bridge_aggregator::AuthorizedBundle;
use bridge_core::ValidatorPeer;
use bridge_crypto::{Ed25519Keystore, Keystore};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BundleVerificationError {
    #[error("bundle has fewer than {required} signatures ({actual})")]
    BelowThreshold { required: usize, actual: usize },
    #[error("signature from {validator_id} does not match the bundle's canonical message")]
    WrongMessage { validator_id: String },
    #[error("cryptographic signature from {validator_id} does not verify")]
    BadSignature { validator_id: String },
    #[error("signature from {validator_id} is not from a currently active peer")]
    InactiveSigner { validator_id: String },
}

/// Re-verifies a bundle: every signature is over the bundle's own canonical
/// message, every signature cryptographically verifies, every signer is
/// currently in the active peer directory, and the count meets threshold.
pub fn verify_bundle(
    bundle: &AuthorizedBundle,
    threshold: usize,
    active_peers: &[ValidatorPeer],
) -> Result<(), BundleVerificationError> {
    if bundle.signatures.len() < threshold {
        return Err(BundleVerificationError::BelowThreshold {
            required: threshold,
            actual: bundle.signatures.len(),
        });
    }

    let canonical_hash = bundle.transfer.canonical_hash();

    for signature in &bundle.signatures {
        if signature.message_hash != canonical_hash {
            return Err(BundleVerificationError::WrongMessage { validator_id: signature.validator_id.clone() });
        }
        if !Ed25519Keystore::verify(&signature.public_key, &signature.message_hash, &signature.signature) {
            return Err(BundleVerificationError::BadSignature { validator_id: signature.validator_id.clone() });
        }
        let is_active = active_peers.iter().any(|p| p.id == signature.validator_id);
        if !is_active {
            return Err(BundleVerificationError::InactiveSigner { validator_id: signature.validator_id.clone() });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::{ChainId, Direction, HexBytes, PeerCapabilities, Transfer, ValidatorSignature};
    use rand::rngs::OsRng;

    fn sample_transfer() -> Transfer {
        Transfer::new(
            Direction::L1ToL2,
            ChainId(1),
            ChainId(2),
            100,
            HexBytes(vec![1; 20]),
            HexBytes(vec![2; 20]),
            1000,
            HexBytes(vec![3; 32]),
            0,
            1,
            1_700_000_000_000,
            1_700_000_600_000,
        )
        .unwrap()
    }

    fn peer(id: &str, public_key: Vec<u8>) -> ValidatorPeer {
        ValidatorPeer {
            id: id.to_string(),
            public_key,
            endpoint: String::new(),
            last_heartbeat: 0,
            declared_stake: 0,
            reputation: 100,
            capabilities: PeerCapabilities {
                multi_sig: true,
                emergency_response: true,
                security_level: "standard".into(),
                max_throughput: 10,
            },
        }
    }

    #[test]
    fn rejects_bundle_below_threshold() {
        let bundle = AuthorizedBundle { transfer: sample_transfer(), signatures: vec![] };
        let err = verify_bundle(&bundle, 2, &[]).unwrap_err();
        assert_eq!(err, BundleVerificationError::BelowThreshold { required: 2, actual: 0 });
    }

    #[test]
    fn accepts_a_correctly_signed_bundle() {
        let transfer = sample_transfer();
        let keystore = Ed25519Keystore::generate(&mut OsRng);
        let message_hash = transfer.canonical_hash();
        let signature = ValidatorSignature {
            transfer_id: transfer.id,
            validator_id: "v1".into(),
            public_key: keystore.public_key(),
            signature: keystore.sign(&message_hash),
            signed_at: 1,
            message_hash,
        };
        let active = vec![peer("v1", keystore.public_key())];
        let bundle = AuthorizedBundle { transfer, signatures: vec![signature] };
        assert!(verify_bundle(&bundle, 1, &active).is_ok());
    }

    #[test]
    fn rejects_signer_not_in_active_directory() {
        let transfer = sample_transfer();
        let keystore = Ed25519Keystore::generate(&mut OsRng);
        let message_hash = transfer.canonical_hash();
        let signature = ValidatorSignature {
            transfer_id: transfer.id,
            validator_id: "v1".into(),
            public_key: keystore.public_key(),
            signature: keystore.sign(&message_hash),
            signed_at: 1,
            message_hash,
        };
        let bundle = AuthorizedBundle { transfer, signatures: vec![signature] };
        let err = verify_bundle(&bundle, 1, &[]).unwrap_err();
        assert_eq!(err, BundleVerificationError::InactiveSigner { validator_id: "v1".into() });
    }
}
