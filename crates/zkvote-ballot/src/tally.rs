//! # Tally Engine
//!
//! Plaintext sessions store one option index per voter and count on
//! demand. Anonymous sessions append opaque ballots (vote commitment plus
//! nullifier) and expose only how many were cast. Per-option counts for
//! anonymous ballots need an authorized decryption step outside this
//! crate.
//!
//! The engine does not enforce one vote per voter. [`VoterRegistry`]
//! and the session own that rule; here a repeated voter id overwrites.
//!
//! [`VoterRegistry`]: crate::registry::VoterRegistry

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zkvote_core::{NullifierHash, VoteCommitment, VoterId};

use crate::verifier::VerificationPath;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    #[error("option index {index} is out of range for {option_count} options")]
    InvalidOption { index: usize, option_count: usize },
}

/// Per-option counts for a plaintext session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyResults {
    pub counts: Vec<u64>,
    pub total: u64,
    pub max_voters: u64,
}

/// One accepted anonymous ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousBallot {
    pub vote_commitment: VoteCommitment,
    pub nullifier_hash: NullifierHash,
    pub path: VerificationPath,
}

/// What an anonymous session reveals about its tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSummary {
    pub total_votes_cast: u64,
    pub registered_voters: u64,
    pub max_voters: u64,
    pub message: String,
}

const ANONYMOUS_TALLY_MESSAGE: &str =
    "Votes are anonymous. Per-option counts require authorized decryption.";

/// The tally as returned to callers, shaped by voting mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TallyView {
    Plaintext {
        options: Vec<String>,
        #[serde(flatten)]
        results: TallyResults,
    },
    Anonymous(AnonymousSummary),
}

impl TallyView {
    /// Ballots counted so far, in either mode.
    pub fn votes_cast(&self) -> u64 {
        match self {
            Self::Plaintext { results, .. } => results.total,
            Self::Anonymous(summary) => summary.total_votes_cast,
        }
    }
}

/// Vote storage and aggregation for one open ballot.
#[derive(Debug)]
pub struct TallyEngine {
    option_count: usize,
    max_voters: usize,
    plaintext: DashMap<VoterId, usize>,
    ballots: Mutex<Vec<AnonymousBallot>>,
}

impl TallyEngine {
    pub fn new(option_count: usize, max_voters: usize) -> Self {
        Self {
            option_count,
            max_voters,
            plaintext: DashMap::new(),
            ballots: Mutex::new(Vec::new()),
        }
    }

    /// Fail unless `index` names a configured option.
    pub fn check_option(&self, index: usize) -> Result<(), TallyError> {
        if index < self.option_count {
            Ok(())
        } else {
            Err(TallyError::InvalidOption {
                index,
                option_count: self.option_count,
            })
        }
    }

    /// Record `voter_id`'s choice. Last write wins.
    pub fn register_vote(&self, voter_id: &VoterId, option_index: usize) -> Result<(), TallyError> {
        self.check_option(option_index)?;
        self.plaintext.insert(voter_id.clone(), option_index);
        Ok(())
    }

    /// Count stored plaintext votes into `options.len()` buckets.
    /// Stored indices outside the buckets are skipped.
    pub fn get_results(&self, options: &[String]) -> TallyResults {
        let mut counts = vec![0u64; options.len()];
        for entry in self.plaintext.iter() {
            if let Some(count) = counts.get_mut(*entry.value()) {
                *count += 1;
            }
        }
        TallyResults {
            counts,
            total: self.plaintext.len() as u64,
            max_voters: self.max_voters as u64,
        }
    }

    pub fn record_anonymous(&self, ballot: AnonymousBallot) {
        self.ballots.lock().push(ballot);
    }

    pub fn total_votes_cast(&self) -> usize {
        self.ballots.lock().len()
    }

    /// Anonymous ballots in the order they were accepted.
    pub fn anonymous_ballots(&self) -> Vec<AnonymousBallot> {
        self.ballots.lock().clone()
    }

    pub fn anonymous_summary(&self, registered_voters: usize) -> AnonymousSummary {
        AnonymousSummary {
            total_votes_cast: self.total_votes_cast() as u64,
            registered_voters: registered_voters as u64,
            max_voters: self.max_voters as u64,
            message: ANONYMOUS_TALLY_MESSAGE.to_string(),
        }
    }

    pub(crate) fn clear(&self) {
        self.plaintext.clear();
        self.ballots.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn options() -> Vec<String> {
        vec!["Yes".into(), "No".into(), "Abstain".into()]
    }

    fn id(s: &str) -> VoterId {
        VoterId::new(s).unwrap()
    }

    #[test]
    fn counts_per_option() {
        let tally = TallyEngine::new(3, 5);
        tally.register_vote(&id("a"), 0).unwrap();
        tally.register_vote(&id("b"), 2).unwrap();
        tally.register_vote(&id("c"), 0).unwrap();
        let results = tally.get_results(&options());
        assert_eq!(results.counts, vec![2, 0, 1]);
        assert_eq!(results.total, 3);
        assert_eq!(results.max_voters, 5);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let tally = TallyEngine::new(3, 5);
        assert_eq!(
            tally.register_vote(&id("a"), 3),
            Err(TallyError::InvalidOption {
                index: 3,
                option_count: 3
            })
        );
        assert_eq!(tally.get_results(&options()).total, 0);
    }

    #[test]
    fn repeated_voter_overwrites() {
        let tally = TallyEngine::new(3, 5);
        tally.register_vote(&id("a"), 0).unwrap();
        tally.register_vote(&id("a"), 1).unwrap();
        let results = tally.get_results(&options());
        assert_eq!(results.counts, vec![0, 1, 0]);
        assert_eq!(results.total, 1);
    }

    #[test]
    fn stored_index_beyond_buckets_is_skipped() {
        let tally = TallyEngine::new(3, 5);
        tally.register_vote(&id("a"), 2).unwrap();
        let results = tally.get_results(&options()[..2]);
        assert_eq!(results.counts, vec![0, 0]);
        assert_eq!(results.total, 1);
    }

    #[test]
    fn anonymous_summary_hides_choices() {
        let tally = TallyEngine::new(2, 4);
        tally.record_anonymous(AnonymousBallot {
            vote_commitment: VoteCommitment::new("11"),
            nullifier_hash: NullifierHash::new("22"),
            path: VerificationPath::CircuitBacked,
        });
        let summary = tally.anonymous_summary(3);
        assert_eq!(summary.total_votes_cast, 1);
        assert_eq!(summary.registered_voters, 3);
        assert_eq!(summary.max_voters, 4);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("counts").is_none());
        assert_eq!(json["totalVotesCast"], 1);
    }

    #[test]
    fn plaintext_view_serializes_flat() {
        let tally = TallyEngine::new(3, 5);
        tally.register_vote(&id("a"), 1).unwrap();
        let view = TallyView::Plaintext {
            options: options(),
            results: tally.get_results(&options()),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["mode"], "plaintext");
        assert_eq!(json["counts"], serde_json::json!([0, 1, 0]));
        assert_eq!(json["maxVoters"], 5);
        assert_eq!(view.votes_cast(), 1);
    }

    #[test]
    fn clear_empties_both_stores() {
        let tally = TallyEngine::new(2, 2);
        tally.register_vote(&id("a"), 0).unwrap();
        tally.record_anonymous(AnonymousBallot {
            vote_commitment: VoteCommitment::new("1"),
            nullifier_hash: NullifierHash::new("2"),
            path: VerificationPath::CircuitBacked,
        });
        tally.clear();
        assert_eq!(tally.get_results(&options()[..2]).total, 0);
        assert_eq!(tally.total_votes_cast(), 0);
    }

    proptest! {
        #[test]
        fn total_equals_distinct_voters(choices in proptest::collection::vec(0usize..3, 0..40)) {
            let tally = TallyEngine::new(3, choices.len());
            for (i, choice) in choices.iter().enumerate() {
                tally.register_vote(&id(&format!("v{i}")), *choice).unwrap();
            }
            let results = tally.get_results(&options());
            prop_assert_eq!(results.total, choices.len() as u64);
            prop_assert_eq!(results.counts.iter().sum::<u64>(), choices.len() as u64);
        }
    }
}
