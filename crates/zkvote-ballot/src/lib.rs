//! # zkvote-ballot — Anonymous Ballot Core
//!
//! Registers voter commitments, verifies proofs of valid votes, enforces
//! exactly-once voting through a nullifier set, and aggregates counts.
//!
//! ## Components (leaves first)
//!
//! - **VoterRegistry** (`registry.rs`): eligibility, commitments, and
//!   voted status, with one lock per voter.
//! - **NullifierLedger** (`ledger.rs`): the set of consumed one-time
//!   tokens. Consumption is a single compare-and-insert.
//! - **ProofVerifier** (`verifier.rs`): resolves a
//!   [`VerificationStrategy`] once per request and runs exactly one path,
//!   circuit-backed or simplified, end to end.
//! - **TallyEngine** (`tally.rs`): plaintext per-option counts, or
//!   append-only anonymous ballots exposed only as totals.
//! - **AddressGuard** (`guard.rs`): optional one-vote-per-network-address
//!   rule for plaintext sessions.
//! - **VotingSession** (`session.rs`): the façade and its
//!   `Unconfigured → Configured → Open → Closed` state machine.
//!
//! ## Concurrency
//!
//! Every vote runs inside the voter's own mutex, so two requests for the
//! same voter serialize and exactly one succeeds. Distinct voters share
//! nothing but the ledger's insert path and the tally's append.
//!
//! ## Failure Atomicity
//!
//! Each vote validates everything before its first mutation. The first
//! mutation is the nullifier insert (or address claim), which is itself
//! the last check; nothing after it can fail. A rejected request leaves
//! registry, ledger, and tally exactly as they were.

pub mod guard;
pub mod ledger;
pub mod registry;
pub mod session;
pub mod tally;
pub mod verifier;

pub use guard::AddressGuard;
pub use ledger::{LedgerError, NullifierLedger};
pub use registry::{RegistryError, VoterRecord, VoterRegistry};
pub use session::{
    BallotConfig, EligibilityStatus, FinalTally, SessionError, SessionHealth, SessionState,
    SessionTransitionRecord, VotingInfo, VotingSession,
};
pub use tally::{AnonymousBallot, AnonymousSummary, TallyEngine, TallyError, TallyResults, TallyView};
pub use verifier::{
    ProofVerifier, SimplifiedReason, VerificationError, VerificationPath, VerificationStrategy,
    VoteReceipt,
};
