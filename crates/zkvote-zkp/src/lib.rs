//! # zkvote-zkp — Zero-Knowledge Proof Capability
//!
//! The proving and verifying primitive is an injected dependency of the
//! ballot core. This crate defines its shape and ships two backends.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): `ProofSystem` with `prove`, `verify`, and
//!   `parse_verifying_key`. The ballot core is generic over it, so tests
//!   substitute deterministic fakes without touching circuit artifacts.
//!
//! - **Mock** (`mock.rs`): `MockProofSystem` computes the same five public
//!   signals the vote circuit does and "proves" them with a SHA-256 digest.
//!   No zero-knowledge guarantees.
//!
//! - **snarkjs** (`snarkjs.rs`): `SnarkjsProofSystem` drives the `snarkjs`
//!   CLI for real Groth16 proofs over the compiled vote circuit.
//!
//! - **Key** (`key.rs`): `VerifyingKeySource` resolves the verifying key
//!   once per request. An absent key file is a normal condition that
//!   selects simplified verification upstream.
//!
//! ## Crate Policy
//!
//! - Depends on `zkvote-core` and `zkvote-crypto` internally.
//! - Backend failures are returned as typed errors, never panics.

pub mod key;
#[cfg(feature = "mock")]
pub mod mock;
pub mod snarkjs;
pub mod traits;

pub use key::{KeyResolution, VerifyingKeySource};
#[cfg(feature = "mock")]
pub use mock::{MockCircuitInputs, MockProof, MockProofSystem, MockVerifyingKey};
pub use snarkjs::SnarkjsProofSystem;
pub use traits::{ProofBackend, ProofBundle, ProofError, ProofSystem, VerifyError};
