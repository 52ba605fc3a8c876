//! # Voter Routes
//!
//! - `POST /api/verify`: eligibility and voted status for a voter id
//! - `POST /api/register-voter`: store a commitment to the voter's secret
//! - `POST /api/zk-vote`: submit a proof with its public signals
//! - `POST /api/vote`: plaintext vote
//!
//! Proof verification may shell out to an external prover, so
//! `/api/zk-vote` runs it on the blocking pool.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::Extensions;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use zkvote_ballot::{EligibilityStatus, VoteReceipt};
use zkvote_core::{Commitment, VoterId};
use zkvote_crypto::VoterSecret;
use zkvote_zkp::{ProofBundle, ProofSystem};

use crate::error::AppError;
use crate::extractors::{client_ip, extract_json};
use crate::state::AppState;

pub fn router<S: ProofSystem + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/verify", post(verify::<S>))
        .route("/api/register-voter", post(register_voter::<S>))
        .route("/api/zk-vote", post(zk_vote::<S>))
        .route("/api/vote", post(vote::<S>))
}

// ─── Request / Response Types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub voter_id: VoterId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVoterRequest {
    pub voter_id: VoterId,
    pub voter_secret: VoterSecret,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVoterResponse {
    pub message: &'static str,
    pub commitment_hash: Commitment,
}

/// `proof` carries the proof and its public signals, as snarkjs emits them.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkVoteRequest<P> {
    pub voter_id: VoterId,
    pub proof: ProofBundle<P>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkVoteResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub receipt: VoteReceipt,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_id: VoterId,
    pub option: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// ─── Handlers ────────────────────────────────────────────────────────

async fn verify<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<EligibilityStatus>, AppError> {
    let req = extract_json(body)?;
    Ok(Json(state.session.verify_voter_eligibility(&req.voter_id)?))
}

async fn register_voter<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<RegisterVoterRequest>, JsonRejection>,
) -> Result<Json<RegisterVoterResponse>, AppError> {
    let req = extract_json(body)?;
    if req.voter_secret.is_empty() {
        return Err(AppError::Validation("voterSecret must not be empty".into()));
    }
    let commitment_hash = state
        .session
        .register_commitment(&req.voter_id, &req.voter_secret)?;
    Ok(Json(RegisterVoterResponse {
        message: "Voter registered successfully",
        commitment_hash,
    }))
}

async fn zk_vote<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
    body: Result<Json<ZkVoteRequest<S::Proof>>, JsonRejection>,
) -> Result<Json<ZkVoteResponse>, AppError> {
    let req = extract_json(body)?;
    let session = state.session.clone();
    let receipt = tokio::task::spawn_blocking(move || {
        session.submit_proof(&req.voter_id, &req.proof.proof, &req.proof.public_signals)
    })
    .await
    .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))??;
    Ok(Json(ZkVoteResponse {
        message: "ZK vote recorded successfully",
        receipt,
    }))
}

async fn vote<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
    extensions: Extensions,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let req = extract_json(body)?;
    state
        .session
        .submit_plaintext_vote_from(&req.voter_id, req.option, client_ip(&extensions))?;
    Ok(Json(MessageResponse {
        message: "Vote registered successfully",
    }))
}
