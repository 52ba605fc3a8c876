//! # Circuit Public Signals
//!
//! The vote circuit publishes exactly five values, each a decimal field
//! element, in a fixed order:
//!
//! ```text
//! [voteCommitment, nullifierHash, validVoteFlag, maxOptions, commitmentHash]
//! ```
//!
//! `PublicSignals` validates arity and digit-only content at construction
//! and names each position so the verifier never indexes by number.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{Commitment, NullifierHash, VoteCommitment};

/// Number of public signals produced by the vote circuit.
pub const PUBLIC_SIGNAL_COUNT: usize = 5;

const VOTE_COMMITMENT: usize = 0;
const NULLIFIER_HASH: usize = 1;
const VALID_VOTE_FLAG: usize = 2;
const MAX_OPTIONS: usize = 3;
const COMMITMENT_HASH: usize = 4;

/// Ordered, non-secret values a vote proof attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PublicSignals([String; PUBLIC_SIGNAL_COUNT]);

impl PublicSignals {
    /// Build from the positional values.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::SignalCount`] unless exactly five values are given.
    /// - [`ValidationError::NonDecimalSignal`] if any value is empty or
    ///   contains anything other than ASCII digits.
    pub fn new(values: Vec<String>) -> Result<Self, ValidationError> {
        let actual = values.len();
        let array: [String; PUBLIC_SIGNAL_COUNT] =
            values.try_into().map_err(|_| ValidationError::SignalCount {
                expected: PUBLIC_SIGNAL_COUNT,
                actual,
            })?;
        for (position, value) in array.iter().enumerate() {
            if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValidationError::NonDecimalSignal {
                    position,
                    value: value.clone(),
                });
            }
        }
        Ok(Self(array))
    }

    pub fn vote_commitment(&self) -> VoteCommitment {
        VoteCommitment::new(self.0[VOTE_COMMITMENT].clone())
    }

    pub fn nullifier_hash(&self) -> NullifierHash {
        NullifierHash::new(self.0[NULLIFIER_HASH].clone())
    }

    /// The circuit's `validVote` output. `"1"` means the choice was in range.
    pub fn valid_vote_flag(&self) -> &str {
        &self.0[VALID_VOTE_FLAG]
    }

    /// The option bound the proof was generated against, as a decimal string.
    pub fn max_options(&self) -> &str {
        &self.0[MAX_OPTIONS]
    }

    pub fn commitment_hash(&self) -> Commitment {
        Commitment::new(self.0[COMMITMENT_HASH].clone())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// All five values concatenated with no separator.
    pub fn concatenated(&self) -> String {
        self.0.concat()
    }
}

impl TryFrom<Vec<String>> for PublicSignals {
    type Error = ValidationError;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<PublicSignals> for Vec<String> {
    fn from(signals: PublicSignals) -> Self {
        signals.0.into()
    }
}
