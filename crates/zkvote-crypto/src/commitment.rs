//! # Hash Commitments
//!
//! A commitment is `SHA-256(tag || 0x00 || input)`, truncated to its first
//! 31 bytes and rendered as an unsigned decimal integer. 248 bits always
//! fit below the BN254 scalar field modulus, so every commitment is also a
//! valid circuit public signal and compares byte-for-byte against the
//! `commitmentHash` a proof publishes.
//!
//! ## Security Invariant
//!
//! Each use has its own domain tag. A voter-secret commitment can never
//! collide with a fallback nullifier derived from the same bytes.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use zkvote_core::{Commitment, NullifierHash, PublicSignals, VoteCommitment, VoterId};

use crate::secret::VoterSecret;

/// Bytes of the SHA-256 output kept before decimal rendering.
const FIELD_SAFE_BYTES: usize = 31;

/// What a digest is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitmentDomain {
    /// Binding of a voter's registration secret.
    VoterSecret,
    /// Nullifier synthesized by the simplified verification path.
    FallbackNullifier,
    /// Vote commitment synthesized by the simplified verification path.
    FallbackVote,
    /// Transparent proof digest produced by the mock proof system.
    MockProof,
}

impl CommitmentDomain {
    fn tag(self) -> &'static [u8] {
        match self {
            Self::VoterSecret => b"zkvote/voter-secret/v1",
            Self::FallbackNullifier => b"zkvote/fallback-nullifier/v1",
            Self::FallbackVote => b"zkvote/fallback-vote/v1",
            Self::MockProof => b"zkvote/mock-proof/v1",
        }
    }
}

/// Deterministic one-way digest function used across the workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashCommitment;

impl HashCommitment {
    /// Digest `input` under `domain` and render it as a decimal string.
    pub fn digest(domain: CommitmentDomain, input: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(domain.tag());
        hasher.update([0u8]);
        hasher.update(input);
        let hash = hasher.finalize();
        to_decimal(&hash[..FIELD_SAFE_BYTES])
    }

    /// Commitment registered for a voter's secret.
    pub fn commit_secret(secret: &VoterSecret) -> Commitment {
        Commitment::new(Self::digest(
            CommitmentDomain::VoterSecret,
            secret.expose().as_bytes(),
        ))
    }

    /// Nullifier derived from a voter id and a millisecond clock reading.
    ///
    /// This links the nullifier to the voter. It exists only for the
    /// simplified path, which offers no anonymity.
    pub fn fallback_nullifier(voter_id: &VoterId, epoch_millis: i64) -> NullifierHash {
        let input = format!("{}{}", voter_id.as_str(), epoch_millis);
        NullifierHash::new(Self::digest(
            CommitmentDomain::FallbackNullifier,
            input.as_bytes(),
        ))
    }

    /// Vote commitment derived from the concatenated public signals.
    pub fn fallback_vote_commitment(signals: &PublicSignals) -> VoteCommitment {
        VoteCommitment::new(Self::digest(
            CommitmentDomain::FallbackVote,
            signals.concatenated().as_bytes(),
        ))
    }
}

/// Constant-time equality of two commitments.
pub fn commitments_match(stored: &Commitment, claimed: &Commitment) -> bool {
    stored.as_str().as_bytes().ct_eq(claimed.as_str().as_bytes()).into()
}

/// Render a big-endian unsigned integer as decimal.
fn to_decimal(bytes: &[u8]) -> String {
    let mut number: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    if number.is_empty() {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(bytes.len() * 3);
    while !number.is_empty() {
        let mut remainder: u16 = 0;
        for byte in number.iter_mut() {
            let acc = (remainder << 8) | u16::from(*byte);
            *byte = (acc / 10) as u8;
            remainder = acc % 10;
        }
        digits.push(b'0' + remainder as u8);
        let leading = number.iter().take_while(|b| **b == 0).count();
        number.drain(..leading);
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}
