//! # Voting Session
//!
//! The façade the HTTP and CLI layers call. One session runs one ballot
//! through a fixed lifecycle:
//!
//! ```text
//! UNCONFIGURED ──configure──▶ CONFIGURED ──load_eligible_voters──▶ OPEN ──close──▶ CLOSED
//!                              ▲       │
//!                              └───────┘ configure (replace)
//! ```
//!
//! Vote operations are accepted only while `OPEN`. Each holds the
//! lifecycle read lock for its whole duration, so `close()` and
//! `reset_votes()`, which take the write lock, never observe a half-applied
//! vote. Votes for different voters run in parallel under the shared read
//! lock and serialize only on their own voter's mutex.

use std::net::IpAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zkvote_core::{Commitment, NullifierHash, PublicSignals, Timestamp, VoterId, VotingMode};
use zkvote_crypto::{HashCommitment, VoterSecret};
use zkvote_zkp::{ProofSystem, VerifyingKeySource};

use crate::guard::AddressGuard;
use crate::ledger::NullifierLedger;
use crate::registry::{RegistryError, VoterRegistry};
use crate::tally::{AnonymousBallot, TallyEngine, TallyError, TallyView};
use crate::verifier::{BallotContext, ProofVerifier, VerificationError, VoteReceipt};

// ─── Session State ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Unconfigured,
    Configured,
    Open,
    Closed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "UNCONFIGURED",
            Self::Configured => "CONFIGURED",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors returned by [`VotingSession`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid ballot configuration: {0}")]
    InvalidConfiguration(String),

    #[error("eligible voter list is empty")]
    NoVotersLoaded,

    #[error("ballot cannot be reconfigured in state {state}")]
    AlreadyConfigured { state: SessionState },

    #[error("invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },

    #[error("session is not open (state {state})")]
    NotOpen { state: SessionState },

    #[error("{operation} is not available in {mode} mode")]
    ModeMismatch {
        mode: VotingMode,
        operation: &'static str,
    },

    #[error("voter {voter_id} has already voted")]
    AlreadyVoted { voter_id: VoterId },

    #[error("a vote has already been cast from this network address")]
    AddressAlreadyVoted,

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Tally(#[from] TallyError),
}

impl SessionError {
    /// Plaintext and anonymous double votes, as one predicate.
    pub fn is_already_voted(&self) -> bool {
        matches!(
            self,
            Self::AlreadyVoted { .. } | Self::Verification(VerificationError::AlreadyVoted { .. })
        )
    }
}

// ─── Ballot Configuration ────────────────────────────────────────────

/// Subject, options, and mode for one ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotConfig {
    subject: String,
    options: Vec<String>,
    mode: VotingMode,
    block_repeat_addresses: bool,
}

impl BallotConfig {
    /// Validate and normalize a ballot.
    ///
    /// Subject and options are trimmed and empty options dropped. Fails if
    /// the subject is empty, fewer than two options remain, or an option
    /// label repeats.
    pub fn new(
        subject: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        mode: VotingMode,
    ) -> Result<Self, SessionError> {
        let subject = subject.into().trim().to_string();
        if subject.is_empty() {
            return Err(SessionError::InvalidConfiguration(
                "subject must not be empty".into(),
            ));
        }

        let mut labels: Vec<String> = Vec::new();
        for option in options {
            let label = option.into().trim().to_string();
            if label.is_empty() {
                continue;
            }
            if labels.contains(&label) {
                return Err(SessionError::InvalidConfiguration(format!(
                    "option {label:?} appears more than once"
                )));
            }
            labels.push(label);
        }
        if labels.len() < 2 {
            return Err(SessionError::InvalidConfiguration(format!(
                "at least two distinct options are required, got {}",
                labels.len()
            )));
        }

        Ok(Self {
            subject,
            options: labels,
            mode,
            block_repeat_addresses: false,
        })
    }

    /// Reject a second plaintext vote from the same network address.
    pub fn with_address_blocking(mut self, enabled: bool) -> Self {
        self.block_repeat_addresses = enabled;
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn mode(&self) -> VotingMode {
        self.mode
    }

    pub fn blocks_repeat_addresses(&self) -> bool {
        self.block_repeat_addresses
    }
}

// ─── Reported Views ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityStatus {
    pub valid: bool,
    pub has_voted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingInfo {
    pub subject: String,
    pub options: Vec<String>,
    pub mode: VotingMode,
    pub max_options: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHealth {
    pub state: SessionState,
    pub mode: Option<VotingMode>,
    pub circuit_available: bool,
    pub backend: String,
    pub verification_downgrades: u64,
}

/// Snapshot taken when the session closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalTally {
    pub subject: String,
    pub options: Vec<String>,
    pub mode: VotingMode,
    pub tally: TallyView,
    pub eligible_voters: usize,
    pub votes_cast: usize,
    /// Percentage, `0.0..=100.0`.
    pub participation_rate: f64,
    pub closed_at: Timestamp,
    pub verification_downgrades: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTransitionRecord {
    pub from_state: SessionState,
    pub to_state: SessionState,
    pub timestamp: Timestamp,
}

// ─── Lifecycle ───────────────────────────────────────────────────────

struct OpenBallot {
    config: BallotConfig,
    registry: VoterRegistry,
    ledger: NullifierLedger,
    tally: TallyEngine,
    addresses: AddressGuard,
}

impl OpenBallot {
    fn view(&self) -> TallyView {
        match self.config.mode() {
            VotingMode::Plaintext => TallyView::Plaintext {
                options: self.config.options().to_vec(),
                results: self.tally.get_results(self.config.options()),
            },
            VotingMode::Anonymous => {
                TallyView::Anonymous(self.tally.anonymous_summary(self.registry.registered_count()))
            }
        }
    }

    fn require_mode(&self, mode: VotingMode, operation: &'static str) -> Result<(), SessionError> {
        if self.config.mode() == mode {
            Ok(())
        } else {
            Err(SessionError::ModeMismatch {
                mode: self.config.mode(),
                operation,
            })
        }
    }
}

enum Phase {
    Unconfigured,
    Configured(BallotConfig),
    Open(Box<OpenBallot>),
    Closed(Box<FinalTally>),
}

impl Phase {
    fn state(&self) -> SessionState {
        match self {
            Self::Unconfigured => SessionState::Unconfigured,
            Self::Configured(_) => SessionState::Configured,
            Self::Open(_) => SessionState::Open,
            Self::Closed(_) => SessionState::Closed,
        }
    }
}

struct Lifecycle {
    phase: Phase,
    transitions: Vec<SessionTransitionRecord>,
}

impl Lifecycle {
    fn do_transition(&mut self, to: Phase) {
        let from = self.phase.state();
        let to_state = to.state();
        self.transitions.push(SessionTransitionRecord {
            from_state: from,
            to_state,
            timestamp: Timestamp::now(),
        });
        self.phase = to;
        tracing::info!(from = %from, to = %to_state, "session transition");
    }
}

// ─── Voting Session ──────────────────────────────────────────────────

/// One ballot, from configuration to final tally.
pub struct VotingSession<S: ProofSystem> {
    lifecycle: RwLock<Lifecycle>,
    verifier: ProofVerifier<S>,
}

impl<S: ProofSystem> VotingSession<S> {
    pub fn new(system: S, key_source: VerifyingKeySource<S::VerifyingKey>) -> Self {
        Self::with_verifier(ProofVerifier::new(Arc::new(system), key_source))
    }

    pub fn with_verifier(verifier: ProofVerifier<S>) -> Self {
        Self {
            lifecycle: RwLock::new(Lifecycle {
                phase: Phase::Unconfigured,
                transitions: Vec::new(),
            }),
            verifier,
        }
    }

    pub fn state(&self) -> SessionState {
        self.lifecycle.read().phase.state()
    }

    pub fn transitions(&self) -> Vec<SessionTransitionRecord> {
        self.lifecycle.read().transitions.clone()
    }

    pub fn verifier(&self) -> &ProofVerifier<S> {
        &self.verifier
    }

    /// UNCONFIGURED/CONFIGURED → CONFIGURED.
    pub fn configure(
        &self,
        subject: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        mode: VotingMode,
    ) -> Result<(), SessionError> {
        self.configure_ballot(BallotConfig::new(subject, options, mode)?)
    }

    /// Install an already-validated [`BallotConfig`]. Replaces any earlier
    /// configuration until voters are loaded.
    pub fn configure_ballot(&self, config: BallotConfig) -> Result<(), SessionError> {
        let mut lifecycle = self.lifecycle.write();
        match lifecycle.phase.state() {
            SessionState::Unconfigured | SessionState::Configured => {
                tracing::info!(
                    subject = config.subject(),
                    options = config.options().len(),
                    mode = %config.mode(),
                    "ballot configured"
                );
                lifecycle.do_transition(Phase::Configured(config));
                Ok(())
            }
            state => Err(SessionError::AlreadyConfigured { state }),
        }
    }

    /// CONFIGURED → OPEN. Returns the number of distinct eligible voters.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoVotersLoaded`] for an empty list; the session
    /// stays `CONFIGURED`.
    pub fn load_eligible_voters(
        &self,
        voters: impl IntoIterator<Item = VoterId>,
    ) -> Result<usize, SessionError> {
        let mut lifecycle = self.lifecycle.write();
        let config = match &lifecycle.phase {
            Phase::Configured(config) => config.clone(),
            other => {
                return Err(SessionError::InvalidTransition {
                    from: other.state(),
                    to: SessionState::Open,
                })
            }
        };

        let registry = VoterRegistry::new(config.mode(), voters);
        if registry.is_empty() {
            return Err(SessionError::NoVotersLoaded);
        }
        let eligible = registry.len();
        let ballot = OpenBallot {
            tally: TallyEngine::new(config.options().len(), eligible),
            addresses: AddressGuard::new(config.blocks_repeat_addresses()),
            ledger: NullifierLedger::new(),
            registry,
            config,
        };
        tracing::info!(eligible, "eligible voters loaded");
        lifecycle.do_transition(Phase::Open(Box::new(ballot)));
        Ok(eligible)
    }

    /// OPEN → CLOSED, taking the final snapshot.
    pub fn close(&self) -> Result<FinalTally, SessionError> {
        let mut lifecycle = self.lifecycle.write();
        let snapshot = match &lifecycle.phase {
            Phase::Open(ballot) => self.snapshot(ballot),
            other => {
                return Err(SessionError::InvalidTransition {
                    from: other.state(),
                    to: SessionState::Closed,
                })
            }
        };
        lifecycle.do_transition(Phase::Closed(Box::new(snapshot.clone())));
        Ok(snapshot)
    }

    /// The closing snapshot, once closed.
    pub fn final_tally(&self) -> Option<FinalTally> {
        match &self.lifecycle.read().phase {
            Phase::Closed(snapshot) => Some(snapshot.as_ref().clone()),
            _ => None,
        }
    }

    fn snapshot(&self, ballot: &OpenBallot) -> FinalTally {
        let eligible_voters = ballot.registry.len();
        let votes_cast = ballot.registry.voted_count();
        let participation_rate = if eligible_voters == 0 {
            0.0
        } else {
            votes_cast as f64 / eligible_voters as f64 * 100.0
        };
        FinalTally {
            subject: ballot.config.subject().to_string(),
            options: ballot.config.options().to_vec(),
            mode: ballot.config.mode(),
            tally: ballot.view(),
            eligible_voters,
            votes_cast,
            participation_rate,
            closed_at: Timestamp::now(),
            verification_downgrades: self.verifier.downgrade_count(),
        }
    }

    fn with_open<R>(
        &self,
        f: impl FnOnce(&OpenBallot) -> Result<R, SessionError>,
    ) -> Result<R, SessionError> {
        let lifecycle = self.lifecycle.read();
        match &lifecycle.phase {
            Phase::Open(ballot) => f(ballot.as_ref()),
            other => Err(SessionError::NotOpen {
                state: other.state(),
            }),
        }
    }

    // ── Voter operations ──

    /// Unknown voters are reported as `valid: false`, not as an error.
    pub fn verify_voter_eligibility(&self, voter_id: &VoterId) -> Result<EligibilityStatus, SessionError> {
        self.with_open(|ballot| {
            Ok(EligibilityStatus {
                valid: ballot.registry.is_eligible(voter_id),
                has_voted: ballot.registry.has_voted(voter_id),
            })
        })
    }

    /// Anonymous mode: commit to `secret` and store the commitment.
    pub fn register_commitment(
        &self,
        voter_id: &VoterId,
        secret: &VoterSecret,
    ) -> Result<Commitment, SessionError> {
        self.with_open(|ballot| {
            ballot.require_mode(VotingMode::Anonymous, "commitment registration")?;
            let commitment = HashCommitment::commit_secret(secret);
            ballot
                .registry
                .register_commitment(voter_id, commitment.clone())?;
            tracing::info!(voter_id = %voter_id, "commitment registered");
            Ok(commitment)
        })
    }

    /// Anonymous mode: verify a proof and record the ballot.
    pub fn submit_proof(
        &self,
        voter_id: &VoterId,
        proof: &S::Proof,
        signals: &PublicSignals,
    ) -> Result<VoteReceipt, SessionError> {
        self.with_open(|ballot| {
            ballot.require_mode(VotingMode::Anonymous, "proof submission")?;
            let ctx = BallotContext {
                voter_id,
                ledger: &ballot.ledger,
                tally: &ballot.tally,
                option_count: ballot.config.options().len(),
            };
            let outcome = ballot
                .registry
                .with_voter(voter_id, |record| {
                    self.verifier.verify_and_record(&ctx, record, proof, signals)
                })
                .ok_or_else(|| RegistryError::NotEligible {
                    voter_id: voter_id.clone(),
                })?;
            if let Err(e) = &outcome {
                tracing::warn!(voter_id = %voter_id, error = %e, "ballot rejected");
            }
            Ok(outcome?)
        })
    }

    /// Plaintext mode: record `option_index` for `voter_id`.
    pub fn submit_plaintext_vote(&self, voter_id: &VoterId, option_index: usize) -> Result<(), SessionError> {
        self.submit_plaintext_vote_from(voter_id, option_index, None)
    }

    /// As [`submit_plaintext_vote`](Self::submit_plaintext_vote), with the
    /// caller's network address for the repeat-address guard.
    pub fn submit_plaintext_vote_from(
        &self,
        voter_id: &VoterId,
        option_index: usize,
        addr: Option<IpAddr>,
    ) -> Result<(), SessionError> {
        self.with_open(|ballot| {
            ballot.require_mode(VotingMode::Plaintext, "plaintext voting")?;
            ballot.tally.check_option(option_index)?;
            let outcome = ballot
                .registry
                .with_voter(voter_id, |record| {
                    if record.has_voted(VotingMode::Plaintext) {
                        return Err(SessionError::AlreadyVoted {
                            voter_id: voter_id.clone(),
                        });
                    }
                    if !ballot.addresses.try_claim(addr) {
                        return Err(SessionError::AddressAlreadyVoted);
                    }
                    ballot.tally.register_vote(voter_id, option_index)?;
                    record.mark_voted(None);
                    Ok(())
                })
                .ok_or_else(|| RegistryError::NotEligible {
                    voter_id: voter_id.clone(),
                })?;
            if let Err(e) = &outcome {
                tracing::warn!(voter_id = %voter_id, error = %e, "plaintext vote rejected");
            }
            outcome?;
            metrics::counter!("zkvote_ballots_accepted_total", "path" => "plaintext").increment(1);
            tracing::debug!(voter_id = %voter_id, option_index, "plaintext vote recorded");
            Ok(())
        })
    }

    // ── Read-side operations ──

    /// Live tally while open; the closing snapshot's tally once closed.
    pub fn get_tally(&self) -> Result<TallyView, SessionError> {
        let lifecycle = self.lifecycle.read();
        match &lifecycle.phase {
            Phase::Open(ballot) => Ok(ballot.view()),
            Phase::Closed(snapshot) => Ok(snapshot.tally.clone()),
            other => Err(SessionError::NotOpen {
                state: other.state(),
            }),
        }
    }

    pub fn voting_info(&self) -> Result<VotingInfo, SessionError> {
        let lifecycle = self.lifecycle.read();
        let (subject, options, mode) = match &lifecycle.phase {
            Phase::Open(ballot) => (
                ballot.config.subject(),
                ballot.config.options(),
                ballot.config.mode(),
            ),
            Phase::Closed(snapshot) => (
                snapshot.subject.as_str(),
                snapshot.options.as_slice(),
                snapshot.mode,
            ),
            other => {
                return Err(SessionError::NotOpen {
                    state: other.state(),
                })
            }
        };
        Ok(VotingInfo {
            subject: subject.to_string(),
            options: options.to_vec(),
            mode,
            max_options: options.len(),
        })
    }

    /// Never fails. Resolves the verifying key to report availability.
    pub fn health(&self) -> SessionHealth {
        let lifecycle = self.lifecycle.read();
        let mode = match &lifecycle.phase {
            Phase::Unconfigured => None,
            Phase::Configured(config) => Some(config.mode()),
            Phase::Open(ballot) => Some(ballot.config.mode()),
            Phase::Closed(snapshot) => Some(snapshot.mode),
        };
        SessionHealth {
            state: lifecycle.phase.state(),
            mode,
            circuit_available: self.verifier.circuit_available(),
            backend: self.verifier.backend().name().to_string(),
            verification_downgrades: self.verifier.downgrade_count(),
        }
    }

    /// Accepted anonymous ballots in order, for external aggregation.
    pub fn anonymous_ballots(&self) -> Result<Vec<AnonymousBallot>, SessionError> {
        self.with_open(|ballot| {
            ballot.require_mode(VotingMode::Anonymous, "ballot export")?;
            Ok(ballot.tally.anonymous_ballots())
        })
    }

    pub fn is_nullifier_consumed(&self, nullifier: &NullifierHash) -> Result<bool, SessionError> {
        self.with_open(|ballot| Ok(ballot.ledger.is_consumed(nullifier)))
    }

    /// Clear all votes, nullifiers, and claimed addresses. Eligibility and
    /// stored commitments survive.
    pub fn reset_votes(&self) -> Result<(), SessionError> {
        let lifecycle = self.lifecycle.write();
        match &lifecycle.phase {
            Phase::Open(ballot) => {
                ballot.ledger.clear();
                ballot.tally.clear();
                ballot.registry.clear_votes();
                ballot.addresses.clear();
                tracing::warn!("all votes reset");
                Ok(())
            }
            other => Err(SessionError::NotOpen {
                state: other.state(),
            }),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
