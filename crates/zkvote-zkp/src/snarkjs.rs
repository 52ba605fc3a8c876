//! # snarkjs Groth16 Backend
//!
//! Drives the `snarkjs` command-line tool against the compiled vote
//! circuit. Proofs, public signals, and verifying keys are exchanged as
//! the JSON documents snarkjs itself reads and writes, staged in a
//! per-call temporary directory.
//!
//! ```text
//! snarkjs groth16 fullprove input.json circuit.wasm circuit.zkey proof.json public.json
//! snarkjs groth16 verify    verification_key.json public.json proof.json
//! ```
//!
//! Both calls block until the child process exits.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

use zkvote_core::PublicSignals;

use crate::traits::{ProofBackend, ProofBundle, ProofError, ProofSystem, VerifyError};

/// Groth16 proof system backed by the snarkjs CLI.
#[derive(Debug, Clone)]
pub struct SnarkjsProofSystem {
    executable: PathBuf,
    wasm: Option<PathBuf>,
    zkey: Option<PathBuf>,
}

impl SnarkjsProofSystem {
    /// Verification-only instance using `snarkjs` from `PATH`.
    pub fn new() -> Self {
        Self {
            executable: PathBuf::from("snarkjs"),
            wasm: None,
            zkey: None,
        }
    }

    /// Use a specific snarkjs executable.
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Enable proving with the given circuit artifacts.
    pub fn with_circuit(mut self, wasm: impl Into<PathBuf>, zkey: impl Into<PathBuf>) -> Self {
        self.wasm = Some(wasm.into());
        self.zkey = Some(zkey.into());
        self
    }

    fn run(&self, args: &[&Path]) -> std::io::Result<Output> {
        let mut command = Command::new(&self.executable);
        command.arg("groth16");
        for arg in args {
            command.arg(arg);
        }
        command.output()
    }
}

impl Default for SnarkjsProofSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> std::io::Result<()> {
    let bytes = serde_json::to_vec(value).map_err(std::io::Error::other)?;
    std::fs::write(path, bytes)
}

impl ProofSystem for SnarkjsProofSystem {
    type Proof = Value;
    type VerifyingKey = Value;
    type CircuitInputs = Value;

    fn backend(&self) -> ProofBackend {
        ProofBackend::Groth16Snarkjs
    }

    fn prove(&self, inputs: &Value) -> Result<ProofBundle<Value>, ProofError> {
        let (Some(wasm), Some(zkey)) = (&self.wasm, &self.zkey) else {
            return Err(ProofError::Backend(
                "no circuit artifacts configured for proving".into(),
            ));
        };
        if !inputs.is_object() {
            return Err(ProofError::InvalidInputs(
                "circuit inputs must be a JSON object".into(),
            ));
        }

        let dir = tempfile::tempdir().map_err(|e| ProofError::Backend(e.to_string()))?;
        let input_path = dir.path().join("input.json");
        let proof_path = dir.path().join("proof.json");
        let public_path = dir.path().join("public.json");
        write_json(&input_path, inputs).map_err(|e| ProofError::Backend(e.to_string()))?;

        let fullprove = Path::new("fullprove");
        let output = self
            .run(&[fullprove, &input_path, wasm, zkey, &proof_path, &public_path])
            .map_err(|e| ProofError::Backend(format!("{}: {e}", self.executable.display())))?;
        if !output.status.success() {
            return Err(ProofError::GenerationFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let proof: Value = std::fs::read(&proof_path)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))
            .and_then(|b| {
                serde_json::from_slice(&b).map_err(|e| ProofError::GenerationFailed(e.to_string()))
            })?;
        let signals: Vec<String> = std::fs::read(&public_path)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))
            .and_then(|b| {
                serde_json::from_slice(&b).map_err(|e| ProofError::GenerationFailed(e.to_string()))
            })?;
        let public_signals =
            PublicSignals::new(signals).map_err(|e| ProofError::GenerationFailed(e.to_string()))?;

        Ok(ProofBundle {
            proof,
            public_signals,
        })
    }

    fn verify(
        &self,
        vk: &Value,
        public_signals: &PublicSignals,
        proof: &Value,
    ) -> Result<bool, VerifyError> {
        if !proof.is_object() {
            return Err(VerifyError::MalformedProof("proof must be a JSON object".into()));
        }

        let dir = tempfile::tempdir().map_err(|e| VerifyError::Backend(e.to_string()))?;
        let vk_path = dir.path().join("verification_key.json");
        let public_path = dir.path().join("public.json");
        let proof_path = dir.path().join("proof.json");
        write_json(&vk_path, vk).map_err(|e| VerifyError::Backend(e.to_string()))?;
        write_json(&public_path, &public_signals.as_slice())
            .map_err(|e| VerifyError::Backend(e.to_string()))?;
        write_json(&proof_path, proof).map_err(|e| VerifyError::Backend(e.to_string()))?;

        let verify = Path::new("verify");
        let output = self
            .run(&[verify, &vk_path, &public_path, &proof_path])
            .map_err(|e| VerifyError::Backend(format!("{}: {e}", self.executable.display())))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stdout.contains("OK!") {
            return Ok(true);
        }
        if stdout.contains("Invalid proof") || stderr.contains("Invalid proof") {
            return Ok(false);
        }
        // snarkjs ran against the staged proof and refused it.
        if !output.status.success() {
            tracing::debug!(status = ?output.status, %stderr, "snarkjs rejected the proof");
            return Ok(false);
        }
        tracing::debug!(%stdout, "snarkjs exited cleanly with no verdict");
        Err(VerifyError::Backend(format!(
            "snarkjs exited with {} and no verdict",
            output.status
        )))
    }

    fn parse_verifying_key(&self, bytes: &[u8]) -> Result<Value, VerifyError> {
        let vk: Value =
            serde_json::from_slice(bytes).map_err(|e| VerifyError::MalformedKey(e.to_string()))?;
        match vk.get("protocol").and_then(Value::as_str) {
            Some("groth16") => Ok(vk),
            Some(other) => Err(VerifyError::KeyMismatch(format!(
                "expected protocol \"groth16\", got {other:?}"
            ))),
            None => Err(VerifyError::MalformedKey("missing \"protocol\" field".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> PublicSignals {
        PublicSignals::new(["1", "2", "1", "2", "3"].iter().map(|s| s.to_string()).collect())
            .unwrap()
    }

    #[test]
    fn parses_groth16_key() {
        let system = SnarkjsProofSystem::new();
        let vk = system
            .parse_verifying_key(br#"{"protocol":"groth16","curve":"bn128","nPublic":5}"#)
            .unwrap();
        assert_eq!(vk["nPublic"], 5);
    }

    #[test]
    fn rejects_non_groth16_key() {
        let system = SnarkjsProofSystem::new();
        let err = system.parse_verifying_key(br#"{"protocol":"plonk"}"#).unwrap_err();
        assert!(matches!(err, VerifyError::KeyMismatch(_)));
        let err = system.parse_verifying_key(br#"{"curve":"bn128"}"#).unwrap_err();
        assert!(matches!(err, VerifyError::MalformedKey(_)));
    }

    #[test]
    fn missing_executable_is_backend_error() {
        let system = SnarkjsProofSystem::new()
            .with_executable("/nonexistent/zkvote-test/snarkjs");
        let vk = serde_json::json!({"protocol": "groth16"});
        let proof = serde_json::json!({"pi_a": ["1", "2", "1"]});
        let err = system.verify(&vk, &signals(), &proof).unwrap_err();
        assert!(matches!(err, VerifyError::Backend(_)));
    }

    #[test]
    fn non_object_proof_is_malformed() {
        let system = SnarkjsProofSystem::new();
        let vk = serde_json::json!({"protocol": "groth16"});
        let err = system
            .verify(&vk, &signals(), &serde_json::json!("proof"))
            .unwrap_err();
        assert!(matches!(err, VerifyError::MalformedProof(_)));
    }

    #[cfg(unix)]
    fn fake_snarkjs(dir: &Path, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn failed_run_without_verdict_is_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let exe = fake_snarkjs(dir.path(), "refuses", "echo 'TypeError: cannot read pi_a' >&2; exit 1");
        let system = SnarkjsProofSystem::new().with_executable(exe);
        let vk = serde_json::json!({"protocol": "groth16"});
        let proof = serde_json::json!({"garbage": true});
        assert_eq!(system.verify(&vk, &signals(), &proof), Ok(false));
    }

    #[cfg(unix)]
    #[test]
    fn verdicts_are_read_from_output() {
        let dir = tempfile::tempdir().unwrap();
        let vk = serde_json::json!({"protocol": "groth16"});
        let proof = serde_json::json!({"pi_a": []});

        let ok = SnarkjsProofSystem::new()
            .with_executable(fake_snarkjs(dir.path(), "accepts", "echo '[INFO]  snarkJS: OK!'"));
        assert_eq!(ok.verify(&vk, &signals(), &proof), Ok(true));

        let silent =
            SnarkjsProofSystem::new().with_executable(fake_snarkjs(dir.path(), "silent", "exit 0"));
        assert!(matches!(
            silent.verify(&vk, &signals(), &proof),
            Err(VerifyError::Backend(_))
        ));
    }

    #[test]
    fn proving_without_artifacts_is_backend_error() {
        let system = SnarkjsProofSystem::new();
        let err = system.prove(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ProofError::Backend(_)));
    }
}
