//! # Ballot Routes
//!
//! - `GET /api/voting-info`: subject, options, mode
//! - `GET /api/results`: per-option counts (plaintext) or totals (anonymous)
//! - `GET /api/ballots`: accepted anonymous ballots for external aggregation

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use zkvote_ballot::{AnonymousBallot, TallyView, VotingInfo};
use zkvote_zkp::ProofSystem;

use crate::error::AppError;
use crate::state::AppState;

pub fn router<S: ProofSystem + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/voting-info", get(voting_info::<S>))
        .route("/api/results", get(results::<S>))
        .route("/api/ballots", get(ballots::<S>))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingInfoResponse {
    #[serde(flatten)]
    pub info: VotingInfo,
    pub zk_enabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub zk_enabled: bool,
    #[serde(flatten)]
    pub tally: TallyView,
}

async fn voting_info<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<VotingInfoResponse>, AppError> {
    let info = state.session.voting_info()?;
    Ok(Json(VotingInfoResponse {
        zk_enabled: info.mode.is_anonymous(),
        info,
    }))
}

async fn results<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<ResultsResponse>, AppError> {
    let tally = state.session.get_tally()?;
    Ok(Json(ResultsResponse {
        zk_enabled: matches!(tally, TallyView::Anonymous(_)),
        tally,
    }))
}

async fn ballots<S: ProofSystem + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<AnonymousBallot>>, AppError> {
    Ok(Json(state.session.anonymous_ballots()?))
}
