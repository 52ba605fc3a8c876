//! # zkvote-cli — Server and Tooling
//!
//! Library half of the `zkvote` binary. Subcommand handlers live here so
//! they can be tested without spawning a process.
//!
//! ## Subcommands
//!
//! - `zkvote serve`: resolve the ballot from YAML and flags, load
//!   `voters.json`, open the session, serve HTTP until Ctrl-C, then close
//!   the session and write the results report.
//! - `zkvote gen-voters <count>`: write `count` UUID v4 voter ids.
//!
//! ## Crate Policy
//!
//! - Handlers return `anyhow::Result`; configuration errors are fatal
//!   here and nowhere else.

pub mod config;
pub mod report;
pub mod serve;
pub mod voters;
