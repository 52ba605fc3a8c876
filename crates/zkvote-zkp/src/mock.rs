//! # Mock Proof System
//!
//! A deterministic, transparent stand-in for the vote circuit. `prove`
//! computes the same five public signals the circuit does:
//!
//! | Signal | Mock derivation |
//! |--------|-----------------|
//! | `voteCommitment` | digest of `(vote, salt)` |
//! | `nullifierHash` | digest of `(secret, salt)` |
//! | `validVoteFlag` | `1` iff `vote < maxOptions` |
//! | `maxOptions` | copied from inputs |
//! | `commitmentHash` | [`HashCommitment::commit_secret`] |
//!
//! The "proof" is a SHA-256 digest of the signals bound to the verifying
//! key's circuit id. Anyone can forge it. It exists so the full
//! register → prove → verify flow runs without circuit artifacts.

use serde::{Deserialize, Serialize};

use zkvote_core::PublicSignals;
use zkvote_crypto::{CommitmentDomain, HashCommitment, VoterSecret};

use crate::traits::{ProofBackend, ProofBundle, ProofError, ProofSystem, VerifyError};

const MOCK_PROTOCOL: &str = "mock";

/// A mock proof: the deterministic digest of the public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockProof {
    pub digest: String,
}

/// Mock verifying key. Serialized form is what a key file contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockVerifyingKey {
    pub protocol: String,
    pub circuit_id: String,
}

/// Witness for the mock circuit.
#[derive(Debug, Clone)]
pub struct MockCircuitInputs {
    pub voter_secret: VoterSecret,
    pub vote: u64,
    pub max_options: u64,
    /// Per-vote randomness. Distinct salts give distinct nullifiers.
    pub salt: String,
}

/// Deterministic mock proof system. No zero-knowledge guarantees.
#[derive(Debug, Clone)]
pub struct MockProofSystem {
    circuit_id: String,
}

impl MockProofSystem {
    pub fn new(circuit_id: impl Into<String>) -> Self {
        Self {
            circuit_id: circuit_id.into(),
        }
    }

    /// The key that verifies this instance's proofs.
    pub fn verifying_key(&self) -> MockVerifyingKey {
        MockVerifyingKey {
            protocol: MOCK_PROTOCOL.to_string(),
            circuit_id: self.circuit_id.clone(),
        }
    }

    /// JSON encoding of [`verifying_key`](Self::verifying_key), suitable
    /// for writing to a key file.
    pub fn verifying_key_json(&self) -> String {
        serde_json::to_string_pretty(&self.verifying_key()).unwrap_or_default()
    }

    fn proof_digest(circuit_id: &str, signals: &PublicSignals) -> String {
        let input = format!("{circuit_id}|{}", signals.as_slice().join(","));
        HashCommitment::digest(CommitmentDomain::MockProof, input.as_bytes())
    }
}

impl Default for MockProofSystem {
    fn default() -> Self {
        Self::new("zkvote")
    }
}

impl ProofSystem for MockProofSystem {
    type Proof = MockProof;
    type VerifyingKey = MockVerifyingKey;
    type CircuitInputs = MockCircuitInputs;

    fn backend(&self) -> ProofBackend {
        ProofBackend::Mock
    }

    fn prove(&self, inputs: &MockCircuitInputs) -> Result<ProofBundle<MockProof>, ProofError> {
        if inputs.voter_secret.is_empty() {
            return Err(ProofError::InvalidInputs("voter secret is empty".into()));
        }
        if inputs.max_options == 0 {
            return Err(ProofError::InvalidInputs("max_options must be positive".into()));
        }

        let vote_commitment = HashCommitment::digest(
            CommitmentDomain::MockProof,
            format!("vote|{}|{}", inputs.vote, inputs.salt).as_bytes(),
        );
        let nullifier = HashCommitment::digest(
            CommitmentDomain::MockProof,
            format!("nullifier|{}|{}", inputs.voter_secret.expose(), inputs.salt).as_bytes(),
        );
        let valid = if inputs.vote < inputs.max_options { "1" } else { "0" };
        let commitment = HashCommitment::commit_secret(&inputs.voter_secret);

        let public_signals = PublicSignals::new(vec![
            vote_commitment,
            nullifier,
            valid.to_string(),
            inputs.max_options.to_string(),
            commitment.as_str().to_string(),
        ])
        .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;

        let proof = MockProof {
            digest: Self::proof_digest(&self.circuit_id, &public_signals),
        };
        Ok(ProofBundle {
            proof,
            public_signals,
        })
    }

    fn verify(
        &self,
        vk: &MockVerifyingKey,
        public_signals: &PublicSignals,
        proof: &MockProof,
    ) -> Result<bool, VerifyError> {
        if vk.protocol != MOCK_PROTOCOL {
            return Err(VerifyError::KeyMismatch(format!(
                "expected protocol {MOCK_PROTOCOL:?}, got {:?}",
                vk.protocol
            )));
        }
        if proof.digest.is_empty() {
            return Err(VerifyError::MalformedProof("empty digest".into()));
        }
        Ok(proof.digest == Self::proof_digest(&vk.circuit_id, public_signals))
    }

    fn parse_verifying_key(&self, bytes: &[u8]) -> Result<MockVerifyingKey, VerifyError> {
        let vk: MockVerifyingKey =
            serde_json::from_slice(bytes).map_err(|e| VerifyError::MalformedKey(e.to_string()))?;
        if vk.protocol != MOCK_PROTOCOL {
            return Err(VerifyError::KeyMismatch(format!(
                "expected protocol {MOCK_PROTOCOL:?}, got {:?}",
                vk.protocol
            )));
        }
        Ok(vk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn inputs(secret: &str, vote: u64, salt: &str) -> MockCircuitInputs {
        MockCircuitInputs {
            voter_secret: VoterSecret::new(secret),
            vote,
            max_options: 3,
            salt: salt.to_string(),
        }
    }

    #[test]
    fn proof_verifies_under_own_key() {
        let system = MockProofSystem::default();
        let bundle = system.prove(&inputs("s", 1, "r1")).unwrap();
        let ok = system
            .verify(&system.verifying_key(), &bundle.public_signals, &bundle.proof)
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn signals_follow_circuit_layout() {
        let system = MockProofSystem::default();
        let secret = VoterSecret::new("s");
        let bundle = system.prove(&inputs("s", 2, "r1")).unwrap();
        let signals = &bundle.public_signals;
        assert_eq!(signals.valid_vote_flag(), "1");
        assert_eq!(signals.max_options(), "3");
        assert_eq!(
            signals.commitment_hash(),
            HashCommitment::commit_secret(&secret)
        );
    }

    #[test]
    fn out_of_range_vote_clears_valid_flag() {
        let system = MockProofSystem::default();
        let bundle = system.prove(&inputs("s", 3, "r1")).unwrap();
        assert_eq!(bundle.public_signals.valid_vote_flag(), "0");
    }

    #[test]
    fn salt_changes_nullifier_but_not_commitment() {
        let system = MockProofSystem::default();
        let a = system.prove(&inputs("s", 0, "r1")).unwrap();
        let b = system.prove(&inputs("s", 0, "r2")).unwrap();
        assert_ne!(a.public_signals.nullifier_hash(), b.public_signals.nullifier_hash());
        assert_eq!(a.public_signals.commitment_hash(), b.public_signals.commitment_hash());
    }

    #[test]
    fn tampered_signals_fail_verification() {
        let system = MockProofSystem::default();
        let bundle = system.prove(&inputs("s", 0, "r1")).unwrap();
        let mut values: Vec<String> = bundle.public_signals.clone().into();
        values[2] = "0".to_string();
        let tampered = PublicSignals::new(values).unwrap();
        let ok = system
            .verify(&system.verifying_key(), &tampered, &bundle.proof)
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn foreign_circuit_key_rejects() {
        let prover = MockProofSystem::new("circuit-a");
        let bundle = prover.prove(&inputs("s", 0, "r1")).unwrap();
        let other = MockProofSystem::new("circuit-b").verifying_key();
        assert!(!prover.verify(&other, &bundle.public_signals, &bundle.proof).unwrap());
    }

    #[test]
    fn key_file_round_trip() {
        let system = MockProofSystem::new("c1");
        let vk = system
            .parse_verifying_key(system.verifying_key_json().as_bytes())
            .unwrap();
        assert_eq!(vk, system.verifying_key());
    }

    #[test]
    fn key_with_wrong_protocol_is_rejected() {
        let system = MockProofSystem::default();
        let err = system
            .parse_verifying_key(br#"{"protocol":"groth16","circuit_id":"x"}"#)
            .unwrap_err();
        assert!(matches!(err, VerifyError::KeyMismatch(_)));
        let err = system.parse_verifying_key(b"not json").unwrap_err();
        assert!(matches!(err, VerifyError::MalformedKey(_)));
    }

    #[test]
    fn empty_secret_is_invalid_input() {
        let system = MockProofSystem::default();
        let err = system.prove(&inputs("", 0, "r")).unwrap_err();
        assert!(matches!(err, ProofError::InvalidInputs(_)));
    }

    proptest! {
        #[test]
        fn every_honest_proof_verifies(secret in "[a-z0-9]{1,32}", vote in 0u64..3, salt in "[a-z0-9]{1,16}") {
            let system = MockProofSystem::default();
            let bundle = system.prove(&inputs(&secret, vote, &salt)).unwrap();
            let ok = system
                .verify(&system.verifying_key(), &bundle.public_signals, &bundle.proof)
                .unwrap();
            prop_assert!(ok);
            prop_assert_eq!(bundle.public_signals.valid_vote_flag(), "1");
        }
    }
}
