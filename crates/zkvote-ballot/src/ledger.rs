//! # Nullifier Ledger
//!
//! The set of consumed nullifiers. A nullifier enters the set at most once
//! and never leaves it while the session is open.

use dashmap::DashSet;
use thiserror::Error;

use zkvote_core::NullifierHash;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("nullifier {nullifier} has already been consumed")]
    AlreadyConsumed { nullifier: NullifierHash },
}

/// Consumed nullifiers.
#[derive(Debug, Default)]
pub struct NullifierLedger {
    consumed: DashSet<NullifierHash>,
}

impl NullifierLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_consumed(&self, nullifier: &NullifierHash) -> bool {
        self.consumed.contains(nullifier)
    }

    /// Insert `nullifier`. Check and insert are one step: of two concurrent
    /// calls with the same value, exactly one returns `Ok`.
    pub fn consume(&self, nullifier: NullifierHash) -> Result<(), LedgerError> {
        if self.consumed.insert(nullifier.clone()) {
            Ok(())
        } else {
            Err(LedgerError::AlreadyConsumed { nullifier })
        }
    }

    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    pub(crate) fn clear(&self) {
        self.consumed.clear();
    }
}
