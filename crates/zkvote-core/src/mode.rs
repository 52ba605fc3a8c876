//! # Voting Mode

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How ballots are cast and counted for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingMode {
    /// Voter id and option index are recorded together; per-option counts
    /// are available directly.
    Plaintext,
    /// Voters register a commitment and submit proofs; only totals are
    /// available without an external decryption step.
    Anonymous,
}

impl VotingMode {
    /// Whether ballots in this mode go through proof verification.
    pub fn is_anonymous(self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Anonymous => "anonymous",
        }
    }
}

impl std::str::FromStr for VotingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plaintext" | "plain" => Ok(Self::Plaintext),
            "anonymous" | "zk" => Ok(Self::Anonymous),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for VotingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
