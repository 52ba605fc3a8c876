//! # Voter List
//!
//! `voters.json` is a JSON array of voter id strings. The server refuses
//! to start without one; `zkvote gen-voters` produces it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use uuid::Uuid;

use zkvote_core::VoterId;

/// Arguments for `zkvote gen-voters`.
#[derive(Args, Debug, Clone)]
pub struct GenVotersArgs {
    /// Number of voter ids to generate.
    pub count: usize,

    /// Output file.
    #[arg(long, short, default_value = "voters.json")]
    pub out: PathBuf,
}

/// Read the eligible-voter list. Duplicate ids are dropped, keeping the
/// first occurrence.
pub fn load_voters(path: &Path) -> Result<Vec<VoterId>> {
    if !path.exists() {
        bail!(
            "{} not found; create it with `zkvote gen-voters <count>`",
            path.display()
        );
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let ids: Vec<String> = serde_json::from_str(&raw)
        .with_context(|| format!("{} must be a JSON array of strings", path.display()))?;
    if ids.is_empty() {
        bail!("{} contains no voters", path.display());
    }

    let mut seen = HashSet::with_capacity(ids.len());
    let mut voters = Vec::with_capacity(ids.len());
    for (i, raw) in ids.into_iter().enumerate() {
        let id = VoterId::new(raw).with_context(|| format!("voter entry {i}"))?;
        if seen.insert(id.clone()) {
            voters.push(id);
        }
    }
    Ok(voters)
}

/// `count` fresh UUID v4 voter ids.
pub fn generate_voters(count: usize) -> Result<Vec<String>> {
    if count < 1 {
        bail!("voter count must be at least 1");
    }
    Ok((0..count).map(|_| Uuid::new_v4().to_string()).collect())
}

/// Write ids as a pretty-printed JSON array.
pub fn write_voters(path: &Path, voters: &[String]) -> Result<()> {
    let json = serde_json::to_string_pretty(voters)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

pub fn run_gen_voters(args: &GenVotersArgs) -> Result<()> {
    let voters = generate_voters(args.count)?;
    write_voters(&args.out, &voters)?;
    tracing::info!(count = voters.len(), path = %args.out.display(), "voter ids written");
    println!("Generated {} voter ids in {}", voters.len(), args.out.display());
    Ok(())
}
