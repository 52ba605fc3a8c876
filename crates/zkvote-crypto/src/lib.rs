//! # zkvote-crypto — Cryptographic Primitives
//!
//! - **HashCommitment**: deterministic one-way binding of an input to a
//!   short decimal digest, domain-separated by purpose.
//! - **VoterSecret**: a secret that is wiped from memory on drop and never
//!   printed.
//!
//! ## Crate Policy
//!
//! - Depends only on `zkvote-core` internally.
//! - No mocking of cryptographic operations in tests; all tests use real
//!   SHA-256.

pub mod commitment;
pub mod secret;

pub use commitment::{commitments_match, CommitmentDomain, HashCommitment};
pub use secret::VoterSecret;
