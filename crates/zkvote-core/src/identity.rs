//! # Identifier Newtypes
//!
//! Voter identifiers are opaque strings issued out-of-band. Commitments,
//! nullifiers, and vote commitments are digest strings (decimal field
//! elements in this workspace) produced by a hash or by the circuit.
//!
//! ## Security Invariant
//!
//! Type-level distinction between these namespaces prevents the class of
//! bug where a nullifier is checked against the commitment store or a
//! voter id is inserted into the nullifier ledger.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Opaque identifier of an eligible voter. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoterId(String);

impl VoterId {
    /// Construct a voter id, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyIdentifier`] if nothing remains.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyIdentifier { kind: "voter id" });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VoterId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VoterId> for String {
    fn from(id: VoterId) -> Self {
        id.0
    }
}

impl std::fmt::Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! digest_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a digest string.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

digest_newtype!(
    /// One-way digest binding a voter's secret. Set once at registration.
    Commitment
);

digest_newtype!(
    /// Single-use token. Once consumed it is never accepted again.
    NullifierHash
);

digest_newtype!(
    /// Hiding commitment to a ballot choice, as published by the circuit.
    VoteCommitment
);
