//! # Proof Verifier
//!
//! Accepts or rejects one anonymous ballot. The verification strategy is
//! resolved once, at the start of the request, from the verifying key:
//!
//! | Key state | Strategy |
//! |-----------|----------|
//! | loads | `CircuitBacked` |
//! | not configured / file missing | `Simplified(KeyUnavailable)` |
//! | file unreadable or undecodable | `Simplified(CapabilityFailure)` |
//!
//! If the proof system itself fails mid-request (a `VerifyError` other
//! than `MalformedProof`), the request is re-dispatched to the simplified
//! path with reason `CapabilityFailure`. Nothing has been mutated at that
//! point. A malformed proof is the submitter's fault and is rejected as
//! `InvalidProof`.
//!
//! ## Circuit-backed path
//!
//! 1. Voter has a stored commitment and has not voted.
//! 2. `commitmentHash` signal equals the stored commitment (constant time).
//! 3. `nullifierHash` signal is unused.
//! 4. The proof verifies under the key.
//! 5. `validVoteFlag == "1"` and `maxOptions` equals the option count.
//! 6. Consume the nullifier, append the ballot, mark the voter.
//!
//! ## Simplified path
//!
//! Checks only registration and voted status, then derives a nullifier from
//! the voter id and the current time. This links the ballot to the voter
//! and gives no replay protection beyond the voted flag. Every use is
//! logged at `warn`, counted, and named in the returned [`VoteReceipt`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use zkvote_core::{NullifierHash, PublicSignals, VoteCommitment, VoterId};
use zkvote_crypto::{commitments_match, HashCommitment};
use zkvote_zkp::{KeyResolution, ProofBackend, ProofSystem, VerifyError, VerifyingKeySource};

use crate::ledger::NullifierLedger;
use crate::registry::VoterRecord;
use crate::tally::{AnonymousBallot, TallyEngine};

/// Why a ballot was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("voter {voter_id} has no registered commitment")]
    VoterNotRegistered { voter_id: VoterId },

    #[error("voter {voter_id} has already voted")]
    AlreadyVoted { voter_id: VoterId },

    #[error("commitment in proof does not match the one registered for voter {voter_id}")]
    CommitmentMismatch { voter_id: VoterId },

    #[error("nullifier {nullifier} has already been used")]
    ReplayedVote { nullifier: NullifierHash },

    #[error("proof did not verify")]
    InvalidProof,

    #[error("circuit marked the vote invalid (validVoteFlag = {flag})")]
    CircuitRejected { flag: String },

    #[error("proof is bound to maxOptions = {claimed}, ballot has {expected} options")]
    OptionBoundMismatch { expected: usize, claimed: String },
}

/// Why the simplified path was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimplifiedReason {
    KeyUnavailable,
    CapabilityFailure,
}

impl SimplifiedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyUnavailable => "key_unavailable",
            Self::CapabilityFailure => "capability_failure",
        }
    }
}

/// Which path accepted a ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationPath {
    CircuitBacked,
    Simplified { reason: SimplifiedReason },
}

impl VerificationPath {
    /// Only the circuit-backed path keeps the ballot unlinkable to the voter.
    pub fn is_zero_knowledge(self) -> bool {
        matches!(self, Self::CircuitBacked)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CircuitBacked => "circuit_backed",
            Self::Simplified { .. } => "simplified",
        }
    }
}

/// The strategy chosen for one request.
#[derive(Debug, Clone)]
pub enum VerificationStrategy<K> {
    CircuitBacked(K),
    Simplified(SimplifiedReason),
}

/// Returned for every accepted anonymous ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub nullifier_hash: NullifierHash,
    pub vote_commitment: VoteCommitment,
    pub path: VerificationPath,
}

/// The ballot stores a verification writes into.
pub(crate) struct BallotContext<'a> {
    pub voter_id: &'a VoterId,
    pub ledger: &'a NullifierLedger,
    pub tally: &'a TallyEngine,
    pub option_count: usize,
}

enum CircuitFailure {
    Rejected(VerificationError),
    Capability(VerifyError),
}

impl From<VerificationError> for CircuitFailure {
    fn from(e: VerificationError) -> Self {
        Self::Rejected(e)
    }
}

/// Verifies anonymous ballots against an injected [`ProofSystem`].
pub struct ProofVerifier<S: ProofSystem> {
    system: Arc<S>,
    key_source: VerifyingKeySource<S::VerifyingKey>,
    downgrades: AtomicU64,
}

impl<S: ProofSystem> ProofVerifier<S> {
    pub fn new(system: Arc<S>, key_source: VerifyingKeySource<S::VerifyingKey>) -> Self {
        Self {
            system,
            key_source,
            downgrades: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> ProofBackend {
        self.system.backend()
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Ballots accepted through the simplified path so far.
    pub fn downgrade_count(&self) -> u64 {
        self.downgrades.load(Ordering::Relaxed)
    }

    /// Whether the verifying key currently resolves. Does not log, so it
    /// is safe to poll.
    pub fn circuit_available(&self) -> bool {
        matches!(
            self.key_source.resolve(self.system.as_ref()),
            KeyResolution::Available(_)
        )
    }

    /// Resolve the verifying key and pick a strategy. Logs `warn` when a
    /// configured key fails to load.
    pub fn strategy(&self) -> VerificationStrategy<S::VerifyingKey> {
        match self.key_source.resolve(self.system.as_ref()) {
            KeyResolution::Available(vk) => VerificationStrategy::CircuitBacked(vk),
            KeyResolution::Unavailable => {
                VerificationStrategy::Simplified(SimplifiedReason::KeyUnavailable)
            }
            KeyResolution::Failed(e) => {
                tracing::warn!(error = %e, "verifying key could not be loaded");
                VerificationStrategy::Simplified(SimplifiedReason::CapabilityFailure)
            }
        }
    }

    /// Verify one ballot and, if it is accepted, record it.
    ///
    /// Runs while the caller holds the voter's lock. On `Err`, ledger,
    /// tally, and `record` are unchanged.
    pub(crate) fn verify_and_record(
        &self,
        ctx: &BallotContext<'_>,
        record: &mut VoterRecord,
        proof: &S::Proof,
        signals: &PublicSignals,
    ) -> Result<VoteReceipt, VerificationError> {
        if record.commitment().is_none() {
            return Err(VerificationError::VoterNotRegistered {
                voter_id: ctx.voter_id.clone(),
            });
        }
        if record.has_voted(zkvote_core::VotingMode::Anonymous) {
            return Err(VerificationError::AlreadyVoted {
                voter_id: ctx.voter_id.clone(),
            });
        }

        match self.strategy() {
            VerificationStrategy::CircuitBacked(vk) => {
                match self.circuit_path(ctx, record, &vk, proof, signals) {
                    Ok(receipt) => Ok(receipt),
                    Err(CircuitFailure::Rejected(e)) => Err(e),
                    Err(CircuitFailure::Capability(e)) => {
                        tracing::warn!(error = %e, "proof system failed during verification");
                        self.simplified_path(ctx, record, signals, SimplifiedReason::CapabilityFailure)
                    }
                }
            }
            VerificationStrategy::Simplified(reason) => {
                self.simplified_path(ctx, record, signals, reason)
            }
        }
    }

    fn circuit_path(
        &self,
        ctx: &BallotContext<'_>,
        record: &mut VoterRecord,
        vk: &S::VerifyingKey,
        proof: &S::Proof,
        signals: &PublicSignals,
    ) -> Result<VoteReceipt, CircuitFailure> {
        let stored = record
            .commitment()
            .ok_or_else(|| VerificationError::VoterNotRegistered {
                voter_id: ctx.voter_id.clone(),
            })?;
        if !commitments_match(stored, &signals.commitment_hash()) {
            return Err(VerificationError::CommitmentMismatch {
                voter_id: ctx.voter_id.clone(),
            }
            .into());
        }

        let nullifier = signals.nullifier_hash();
        if ctx.ledger.is_consumed(&nullifier) {
            return Err(VerificationError::ReplayedVote { nullifier }.into());
        }

        match self.system.verify(vk, signals, proof) {
            Ok(true) => {}
            Ok(false) => return Err(VerificationError::InvalidProof.into()),
            Err(e) if e.is_capability_failure() => return Err(CircuitFailure::Capability(e)),
            Err(e) => {
                tracing::debug!(error = %e, "malformed proof");
                return Err(VerificationError::InvalidProof.into());
            }
        }

        if signals.valid_vote_flag() != "1" {
            return Err(VerificationError::CircuitRejected {
                flag: signals.valid_vote_flag().to_string(),
            }
            .into());
        }
        match signals.max_options().parse::<usize>() {
            Ok(bound) if bound == ctx.option_count => {}
            _ => {
                return Err(VerificationError::OptionBoundMismatch {
                    expected: ctx.option_count,
                    claimed: signals.max_options().to_string(),
                }
                .into())
            }
        }

        Ok(self.commit(
            ctx,
            record,
            nullifier,
            signals.vote_commitment(),
            VerificationPath::CircuitBacked,
        )?)
    }

    fn simplified_path(
        &self,
        ctx: &BallotContext<'_>,
        record: &mut VoterRecord,
        signals: &PublicSignals,
        reason: SimplifiedReason,
    ) -> Result<VoteReceipt, VerificationError> {
        let now_millis = chrono::Utc::now().timestamp_millis();
        let nullifier = HashCommitment::fallback_nullifier(ctx.voter_id, now_millis);
        let vote_commitment = HashCommitment::fallback_vote_commitment(signals);
        let receipt = self.commit(
            ctx,
            record,
            nullifier,
            vote_commitment,
            VerificationPath::Simplified { reason },
        )?;

        self.downgrades.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("zkvote_verification_downgrades_total", "reason" => reason.as_str())
            .increment(1);
        tracing::warn!(
            voter_id = %ctx.voter_id,
            reason = reason.as_str(),
            "ballot accepted by simplified verification; ballot is linkable to voter"
        );
        Ok(receipt)
    }

    /// The only mutating step. The ledger insert is the last check.
    fn commit(
        &self,
        ctx: &BallotContext<'_>,
        record: &mut VoterRecord,
        nullifier: NullifierHash,
        vote_commitment: VoteCommitment,
        path: VerificationPath,
    ) -> Result<VoteReceipt, VerificationError> {
        ctx.ledger
            .consume(nullifier.clone())
            .map_err(|_| VerificationError::ReplayedVote {
                nullifier: nullifier.clone(),
            })?;
        ctx.tally.record_anonymous(AnonymousBallot {
            vote_commitment: vote_commitment.clone(),
            nullifier_hash: nullifier.clone(),
            path,
        });
        record.mark_voted(Some(nullifier.clone()));

        metrics::counter!("zkvote_ballots_accepted_total", "path" => path.label()).increment(1);
        tracing::debug!(path = path.label(), "anonymous ballot accepted");
        Ok(VoteReceipt {
            nullifier_hash: nullifier,
            vote_commitment,
            path,
        })
    }
}
