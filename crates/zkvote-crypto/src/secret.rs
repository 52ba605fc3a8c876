//! # Voter Secrets
//!
//! The secret a voter registers with is held only long enough to derive
//! its commitment. The buffer is zeroed on drop, and neither `Debug` nor
//! `Serialize` ever reveals it.

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A voter's registration secret.
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct VoterSecret(String);

impl VoterSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret material. Callers must not log or store it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for VoterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VoterSecret([REDACTED])")
    }
}
