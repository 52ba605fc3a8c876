//! # zkvote entry point
//!
//! Parses command-line arguments, initialises tracing, and dispatches to
//! the subcommand handlers in the library crate.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zkvote_cli::config::ServeArgs;
use zkvote_cli::serve::run_serve;
use zkvote_cli::voters::{run_gen_voters, GenVotersArgs};

/// Anonymous-ballot voting server.
#[derive(Parser, Debug)]
#[command(name = "zkvote", version, about, long_about = None)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a ballot and serve the voting API until Ctrl-C.
    Serve(ServeArgs),

    /// Write a voters.json of freshly generated voter ids.
    GenVoters(GenVotersArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let result = match cli.command {
        Commands::Serve(args) => run_serve(&args).await,
        Commands::GenVoters(args) => run_gen_voters(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
