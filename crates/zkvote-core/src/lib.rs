//! # zkvote-core — Foundational Types
//!
//! The leaf of the zkvote crate graph. Every other crate depends on
//! `zkvote-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for every identifier.** `VoterId`, `Commitment`,
//!    `NullifierHash`, `VoteCommitment` are distinct types. A nullifier can
//!    never be passed where a commitment is expected.
//!
//! 2. **Positional public signals are named.** `PublicSignals` holds exactly
//!    five decimal strings and exposes them by meaning, not by index.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is seconds-precision UTC.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `zkvote-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod mode;
pub mod signals;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{Commitment, NullifierHash, VoteCommitment, VoterId};
pub use mode::VotingMode;
pub use signals::{PublicSignals, PUBLIC_SIGNAL_COUNT};
pub use temporal::Timestamp;
