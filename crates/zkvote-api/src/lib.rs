//! # zkvote-api — Axum HTTP Surface
//!
//! Maps the voting session's operations onto JSON routes. Handlers hold
//! no ballot logic; they parse, call [`VotingSession`], and map errors.
//!
//! ## Routes
//!
//! | Method | Path | Session operation |
//! |--------|------|-------------------|
//! | GET  | `/health` | `health` |
//! | GET  | `/api/voting-info` | `voting_info` |
//! | POST | `/api/verify` | `verify_voter_eligibility` |
//! | POST | `/api/register-voter` | `register_commitment` |
//! | POST | `/api/zk-vote` | `submit_proof` |
//! | POST | `/api/vote` | `submit_plaintext_vote_from` |
//! | GET  | `/api/results` | `get_tally` |
//! | GET  | `/api/ballots` | `anonymous_ballots` |
//!
//! Request and response bodies use camelCase keys. Every error renders as
//! `{ "error": { "code", "message", "details"? } }`.
//!
//! ## Crate Policy
//!
//! - Generic over the proof system so tests run against the mock backend.
//! - The repeat-address guard sees the peer address only when the server
//!   is started with `into_make_service_with_connect_info::<SocketAddr>()`.
//!
//! [`VotingSession`]: zkvote_ballot::VotingSession

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use zkvote_ballot::SessionHealth;
use zkvote_zkp::ProofSystem;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
pub fn app<S: ProofSystem + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .merge(routes::ballot::router())
        .merge(routes::voters::router())
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub zk_enabled: bool,
    #[serde(flatten)]
    pub session: SessionHealth,
}

async fn health<S: ProofSystem + 'static>(State(state): State<AppState<S>>) -> Json<HealthResponse> {
    let session = state.session.health();
    Json(HealthResponse {
        status: "ok",
        zk_enabled: session.mode.is_some_and(|m| m.is_anonymous()),
        session,
    })
}
