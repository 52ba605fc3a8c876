//! # Serve Subcommand
//!
//! Opens a session from the resolved configuration and serves the HTTP
//! API until Ctrl-C. On shutdown the session is closed and the results
//! report is written to `--results-dir`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use zkvote_api::AppState;
use zkvote_ballot::{FinalTally, VotingSession};
use zkvote_zkp::{SnarkjsProofSystem, VerifyingKeySource};

use crate::config::{ServeArgs, ServeConfig};
use crate::report;
use crate::voters::load_voters;

/// Build an open session: configure the ballot and load the voter list.
pub fn open_session(config: &ServeConfig) -> Result<VotingSession<SnarkjsProofSystem>> {
    let system = SnarkjsProofSystem::new().with_executable(&config.snarkjs);
    let key_source = match &config.verifying_key {
        Some(path) => VerifyingKeySource::File(path.clone()),
        None => VerifyingKeySource::Absent,
    };
    if config.ballot.mode().is_anonymous() && !key_source.is_configured() {
        tracing::warn!("no verifying key configured; anonymous votes use simplified verification");
    }

    let session = VotingSession::new(system, key_source);
    session.configure_ballot(config.ballot.clone())?;
    let voters = load_voters(&config.voters)?;
    let eligible = session
        .load_eligible_voters(voters)
        .context("opening the session")?;
    tracing::info!(eligible, path = %config.voters.display(), "voter list loaded");
    Ok(session)
}

/// Close `session` and write the report. Returns the closing snapshot.
pub fn finish<S: zkvote_zkp::ProofSystem>(
    session: &VotingSession<S>,
    config: &ServeConfig,
) -> Result<FinalTally> {
    let tally = session.close().context("closing the session")?;
    let path = report::write(
        &config.results_dir,
        &tally,
        config.ballot.blocks_repeat_addresses(),
    )?;
    tracing::info!(path = %path.display(), votes_cast = tally.votes_cast, "results saved");
    println!("Results saved to {}", path.display());
    Ok(tally)
}

pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    let config = ServeConfig::from_args(args)?;
    let session = Arc::new(open_session(&config)?);

    let app = zkvote_api::app(AppState::new(Arc::clone(&session)));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(
        %addr,
        subject = config.ballot.subject(),
        mode = %config.ballot.mode(),
        "zkvote listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    finish(&session, &config)?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
