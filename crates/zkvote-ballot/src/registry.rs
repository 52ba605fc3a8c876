//! # Voter Registry
//!
//! Holds every eligible voter's record: the commitment registered in
//! anonymous mode and the voted status. Records are created when the
//! voter list is loaded and never removed for the session's lifetime.
//!
//! ## Locking
//!
//! Each record sits behind its own `parking_lot::Mutex`. The map itself
//! (`DashMap`) is only read after loading, so looking a voter up never
//! contends with another voter's in-flight request. [`VoterRegistry::with_voter`]
//! is the critical section every vote runs in.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;

use zkvote_core::{Commitment, NullifierHash, VoterId, VotingMode};

/// Errors from registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The voter id is not in the pre-issued set.
    #[error("voter {voter_id} is not eligible")]
    NotEligible { voter_id: VoterId },

    /// A commitment is already stored for this voter.
    #[error("voter {voter_id} has already registered a commitment")]
    AlreadyRegistered { voter_id: VoterId },
}

/// Per-voter state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoterRecord {
    commitment: Option<Commitment>,
    nullifier: Option<NullifierHash>,
    voted: bool,
}

impl VoterRecord {
    pub fn commitment(&self) -> Option<&Commitment> {
        self.commitment.as_ref()
    }

    /// Plaintext mode checks the voted flag; anonymous mode checks for an
    /// attached nullifier.
    pub fn has_voted(&self, mode: VotingMode) -> bool {
        match mode {
            VotingMode::Plaintext => self.voted,
            VotingMode::Anonymous => self.nullifier.is_some(),
        }
    }

    pub(crate) fn mark_voted(&mut self, nullifier: Option<NullifierHash>) {
        self.voted = true;
        if nullifier.is_some() {
            self.nullifier = nullifier;
        }
    }

    fn clear_vote(&mut self) {
        self.voted = false;
        self.nullifier = None;
    }
}

/// Eligible voters and their records.
#[derive(Debug)]
pub struct VoterRegistry {
    mode: VotingMode,
    voters: DashMap<VoterId, Arc<Mutex<VoterRecord>>>,
}

impl VoterRegistry {
    /// Build from the eligible-voter list. Duplicate ids collapse.
    pub fn new(mode: VotingMode, eligible: impl IntoIterator<Item = VoterId>) -> Self {
        let voters = DashMap::new();
        for id in eligible {
            voters
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(VoterRecord::default())));
        }
        Self { mode, voters }
    }

    pub fn mode(&self) -> VotingMode {
        self.mode
    }

    /// Number of eligible voters.
    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn is_eligible(&self, voter_id: &VoterId) -> bool {
        self.voters.contains_key(voter_id)
    }

    /// Whether `voter_id` has voted. Unknown voters have not.
    pub fn has_voted(&self, voter_id: &VoterId) -> bool {
        let mode = self.mode;
        self.with_voter(voter_id, |record| record.has_voted(mode))
            .unwrap_or(false)
    }

    pub fn commitment(&self, voter_id: &VoterId) -> Option<Commitment> {
        self.with_voter(voter_id, |record| record.commitment.clone())
            .flatten()
    }

    /// Store `commitment` for `voter_id`. Does not mark the voter as voted.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotEligible`] for unknown ids,
    /// [`RegistryError::AlreadyRegistered`] if a commitment exists. The
    /// stored commitment is never replaced.
    pub fn register_commitment(
        &self,
        voter_id: &VoterId,
        commitment: Commitment,
    ) -> Result<(), RegistryError> {
        self.with_voter(voter_id, |record| {
            if record.commitment.is_some() {
                return Err(RegistryError::AlreadyRegistered {
                    voter_id: voter_id.clone(),
                });
            }
            record.commitment = Some(commitment);
            Ok(())
        })
        .unwrap_or_else(|| {
            Err(RegistryError::NotEligible {
                voter_id: voter_id.clone(),
            })
        })
    }

    /// Attach `nullifier` (anonymous mode) or set the voted flag.
    ///
    /// The caller must already have confirmed the voter has not voted.
    /// Vote paths do this inside [`with_voter`](Self::with_voter) instead.
    pub fn mark_voted(
        &self,
        voter_id: &VoterId,
        nullifier: Option<NullifierHash>,
    ) -> Result<(), RegistryError> {
        self.with_voter(voter_id, |record| record.mark_voted(nullifier))
            .ok_or_else(|| RegistryError::NotEligible {
                voter_id: voter_id.clone(),
            })
    }

    /// Run `f` while holding `voter_id`'s lock. `None` if the voter is unknown.
    ///
    /// The map shard lock is released before the voter lock is taken.
    pub fn with_voter<R>(&self, voter_id: &VoterId, f: impl FnOnce(&mut VoterRecord) -> R) -> Option<R> {
        let record = Arc::clone(self.voters.get(voter_id)?.value());
        let mut guard = record.lock();
        Some(f(&mut guard))
    }

    /// Voters who have voted under this registry's mode.
    pub fn voted_count(&self) -> usize {
        let mode = self.mode;
        self.records()
            .iter()
            .filter(|record| record.lock().has_voted(mode))
            .count()
    }

    /// Voters with a stored commitment.
    pub fn registered_count(&self) -> usize {
        self.records()
            .iter()
            .filter(|record| record.lock().commitment.is_some())
            .count()
    }

    /// Clear every voter's voted status. Commitments are kept.
    pub(crate) fn clear_votes(&self) {
        for record in self.records() {
            record.lock().clear_vote();
        }
    }

    fn records(&self) -> Vec<Arc<Mutex<VoterRecord>>> {
        self.voters
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}
