//! # API Error Types
//!
//! Maps session errors to HTTP status codes and a structured JSON body:
//!
//! ```json
//! { "error": { "code": "VOTE_REJECTED", "message": "...", "details": { "reason": "already_voted" } } }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zkvote_ballot::{RegistryError, SessionError, TallyError, VerificationError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `"VOTE_REJECTED"`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Body parsed but a value is out of range (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Operation not available in this ballot's mode (400).
    #[error("{0}")]
    WrongMode(String),

    /// Voter id is not in the eligible set (403).
    #[error("{0}")]
    NotEligible(String),

    /// A vote or registration was refused (403). `reason` is a stable
    /// snake_case tag clients can branch on.
    #[error("{message}")]
    Rejected {
        reason: &'static str,
        message: String,
    },

    /// Conflicts with current state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The ballot is not open (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::WrongMode(_) => (StatusCode::BAD_REQUEST, "WRONG_MODE"),
            Self::NotEligible(_) => (StatusCode::FORBIDDEN, "NOT_ELIGIBLE"),
            Self::Rejected { .. } => (StatusCode::FORBIDDEN, "VOTE_REJECTED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn rejected(reason: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Rejected {
            reason,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        let details = match &self {
            Self::Rejected { reason, .. } => Some(serde_json::json!({ "reason": reason })),
            _ => None,
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Rejected { reason, .. } => tracing::info!(reason, "request rejected"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<zkvote_core::ValidationError> for AppError {
    fn from(err: zkvote_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidConfiguration(_) => Self::Validation(err.to_string()),
            SessionError::NoVotersLoaded | SessionError::NotOpen { .. } => {
                Self::ServiceUnavailable(err.to_string())
            }
            SessionError::AlreadyConfigured { .. } | SessionError::InvalidTransition { .. } => {
                Self::Conflict(err.to_string())
            }
            SessionError::ModeMismatch { .. } => Self::WrongMode(err.to_string()),
            SessionError::AlreadyVoted { .. } => Self::rejected("already_voted", err),
            SessionError::AddressAlreadyVoted => Self::rejected("address_already_voted", err),
            SessionError::Registry(e) => match e {
                RegistryError::NotEligible { .. } => Self::NotEligible(e.to_string()),
                RegistryError::AlreadyRegistered { .. } => Self::rejected("already_registered", e),
            },
            SessionError::Tally(e @ TallyError::InvalidOption { .. }) => {
                Self::Validation(e.to_string())
            }
            SessionError::Verification(e) => {
                let reason = match &e {
                    VerificationError::VoterNotRegistered { .. } => "voter_not_registered",
                    VerificationError::AlreadyVoted { .. } => "already_voted",
                    VerificationError::CommitmentMismatch { .. } => "commitment_mismatch",
                    VerificationError::ReplayedVote { .. } => "replayed_vote",
                    VerificationError::InvalidProof => "invalid_proof",
                    VerificationError::CircuitRejected { .. } => "circuit_rejected",
                    VerificationError::OptionBoundMismatch { .. } => "option_bound_mismatch",
                };
                Self::rejected(reason, e)
            }
        }
    }
}
