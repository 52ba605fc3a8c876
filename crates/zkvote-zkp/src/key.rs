//! # Verifying Key Resolution
//!
//! The verifying key is looked up on every request rather than cached at
//! startup, so an operator can drop a key file into place (or remove it)
//! while a session is open. Resolution has three outcomes:
//!
//! - `Available(key)`: circuit-backed verification can run.
//! - `Unavailable`: no key is configured or the file does not exist.
//! - `Failed(err)`: a key file exists but could not be read or decoded.

use std::path::PathBuf;

use crate::traits::{ProofSystem, VerifyError};

/// Where the verifying key comes from.
#[derive(Debug, Clone)]
pub enum VerifyingKeySource<K> {
    /// No key. Every request uses simplified verification.
    Absent,
    /// A key held in memory.
    InMemory(K),
    /// A key file read and decoded per request.
    File(PathBuf),
}

/// Outcome of resolving a [`VerifyingKeySource`].
#[derive(Debug)]
pub enum KeyResolution<K> {
    Available(K),
    Unavailable,
    Failed(VerifyError),
}

impl<K: Clone> VerifyingKeySource<K> {
    /// Resolve the key using `system` to decode file contents.
    pub fn resolve<S>(&self, system: &S) -> KeyResolution<K>
    where
        S: ProofSystem<VerifyingKey = K> + ?Sized,
    {
        match self {
            Self::Absent => KeyResolution::Unavailable,
            Self::InMemory(key) => KeyResolution::Available(key.clone()),
            Self::File(path) => {
                if !path.exists() {
                    return KeyResolution::Unavailable;
                }
                let bytes = match std::fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return KeyResolution::Failed(VerifyError::Backend(format!(
                            "{}: {e}",
                            path.display()
                        )))
                    }
                };
                match system.parse_verifying_key(&bytes) {
                    Ok(key) => KeyResolution::Available(key),
                    Err(e) => KeyResolution::Failed(e),
                }
            }
        }
    }

    /// Whether a key is configured at all (it may still fail to load).
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}
