//! # Proof System Trait
//!
//! The abstract interface for the vote circuit's proving and verifying
//! primitive. All backends (mock, snarkjs Groth16) implement this trait.
//!
//! ## Security Invariant
//!
//! The trait requires `Send + Sync` so a single instance can serve
//! concurrent verification requests. `verify` distinguishes a proof that
//! is well-formed but false (`Ok(false)`) from a backend that could not
//! run at all (`Err`). Callers treat those two outcomes differently.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use zkvote_core::PublicSignals;

/// Error during proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The circuit inputs are invalid or missing.
    #[error("invalid circuit inputs: {0}")]
    InvalidInputs(String),
    /// The prover ran but did not produce a usable proof.
    #[error("proof generation failed: {0}")]
    GenerationFailed(String),
    /// The proving backend could not be invoked.
    #[error("prover backend unavailable: {0}")]
    Backend(String),
}

/// Error during proof verification.
///
/// A proof that simply does not verify is `Ok(false)`. `MalformedProof`
/// describes the submitted proof; every other variant is a failure of the
/// verifying capability itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The proof is structurally malformed.
    #[error("malformed proof: {0}")]
    MalformedProof(String),
    /// The verifying key could not be decoded.
    #[error("malformed verifying key: {0}")]
    MalformedKey(String),
    /// The verifying key was decoded but belongs to a different backend.
    #[error("verifying key mismatch: {0}")]
    KeyMismatch(String),
    /// The verifying backend could not be invoked or produced no verdict.
    #[error("verifier backend unavailable: {0}")]
    Backend(String),
}

impl VerifyError {
    /// Whether the verifier, rather than the submitted proof, is at fault.
    pub fn is_capability_failure(&self) -> bool {
        !matches!(self, Self::MalformedProof(_))
    }
}

/// The kind of backend that produced or checks a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofBackend {
    /// Deterministic SHA-256 mock. No cryptographic security.
    Mock,
    /// Groth16 over BN254 via the snarkjs CLI.
    Groth16Snarkjs,
}

impl ProofBackend {
    /// Whether this backend provides real cryptographic soundness.
    pub fn is_real(self) -> bool {
        matches!(self, Self::Groth16Snarkjs)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Mock => "mock-sha256",
            Self::Groth16Snarkjs => "groth16-snarkjs",
        }
    }
}

/// A proof together with the public signals it attests to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofBundle<P> {
    pub proof: P,
    pub public_signals: PublicSignals,
}

/// Interface for the vote circuit's zero-knowledge proof system.
///
/// ## Associated Types
///
/// - **`Proof`**: the opaque proof artifact. Serde-capable so the HTTP layer
///   can carry it as JSON.
/// - **`VerifyingKey`**: cloneable so it can be resolved once and moved
///   into a single request's verification.
/// - **`CircuitInputs`**: private and public witness inputs for `prove`.
pub trait ProofSystem: Send + Sync {
    type Proof: Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static;
    type VerifyingKey: Clone + Send + Sync;
    type CircuitInputs;

    /// Which backend this is.
    fn backend(&self) -> ProofBackend;

    /// Generate a proof and the public signals it commits to.
    ///
    /// # Errors
    ///
    /// [`ProofError::InvalidInputs`] for malformed inputs,
    /// [`ProofError::GenerationFailed`] or [`ProofError::Backend`] if the
    /// prover cannot complete.
    fn prove(
        &self,
        inputs: &Self::CircuitInputs,
    ) -> Result<ProofBundle<Self::Proof>, ProofError>;

    /// Verify `proof` against `public_signals` under `vk`.
    ///
    /// Returns `Ok(true)` if valid, `Ok(false)` if well-formed but invalid.
    ///
    /// # Errors
    ///
    /// Any [`VerifyError`] means no verdict could be reached.
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        public_signals: &PublicSignals,
        proof: &Self::Proof,
    ) -> Result<bool, VerifyError>;

    /// Decode a verifying key from its on-disk representation.
    fn parse_verifying_key(&self, bytes: &[u8]) -> Result<Self::VerifyingKey, VerifyError>;
}
