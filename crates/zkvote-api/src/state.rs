//! # Application State

use std::sync::Arc;

use zkvote_ballot::VotingSession;
use zkvote_zkp::ProofSystem;

/// Shared state passed to every handler.
pub struct AppState<S: ProofSystem> {
    pub session: Arc<VotingSession<S>>,
}

impl<S: ProofSystem> AppState<S> {
    pub fn new(session: Arc<VotingSession<S>>) -> Self {
        Self { session }
    }
}

impl<S: ProofSystem> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}
