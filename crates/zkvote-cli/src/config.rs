//! # Ballot Configuration
//!
//! A ballot can be described in a YAML file, on the command line, or both.
//! Flags override the file field by field:
//!
//! ```yaml
//! subject: Board election 2026
//! options: [Alice, Bob, Abstain]
//! mode: anonymous
//! block_repeat_addresses: false
//! verifying_key: circuits/verification_key.json
//! ```
//!
//! `PORT` and `ZKVOTE_VERIFYING_KEY` are read from the environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;

use zkvote_ballot::BallotConfig;
use zkvote_core::VotingMode;

pub const DEFAULT_PORT: u16 = 3000;
pub const VERIFYING_KEY_ENV: &str = "ZKVOTE_VERIFYING_KEY";

/// Arguments for `zkvote serve`.
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// YAML ballot file. Flags below override its fields.
    #[arg(long, short)]
    pub ballot: Option<PathBuf>,

    /// Ballot subject.
    #[arg(long, short)]
    pub subject: Option<String>,

    /// Options, comma separated or repeated.
    #[arg(long = "option", short = 'o', value_delimiter = ',')]
    pub options: Vec<String>,

    /// Voting mode: plaintext or anonymous.
    #[arg(long, short)]
    pub mode: Option<VotingMode>,

    /// Reject a second plaintext vote from the same client address.
    #[arg(long)]
    pub block_repeat_addresses: bool,

    /// Eligible voter list.
    #[arg(long, default_value = "voters.json")]
    pub voters: PathBuf,

    /// Groth16 verifying key. Read on every proof, so it may appear later.
    #[arg(long)]
    pub verifying_key: Option<PathBuf>,

    /// snarkjs executable used for circuit-backed verification.
    #[arg(long, default_value = "snarkjs")]
    pub snarkjs: PathBuf,

    /// Listen port. Defaults to $PORT, then 3000.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Directory the results report is written to on shutdown.
    #[arg(long, default_value = ".")]
    pub results_dir: PathBuf,
}

/// On-disk ballot description. Every field is optional so a file can
/// carry only the parts that do not change between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallotFile {
    pub subject: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub mode: Option<VotingMode>,
    pub block_repeat_addresses: Option<bool>,
    pub verifying_key: Option<PathBuf>,
}

impl BallotFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading ballot file {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing ballot file {}", path.display()))
    }
}

/// Everything `serve` needs, after merging file, flags, and environment.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub ballot: BallotConfig,
    pub voters: PathBuf,
    pub verifying_key: Option<PathBuf>,
    pub snarkjs: PathBuf,
    pub port: u16,
    pub results_dir: PathBuf,
}

impl ServeConfig {
    /// Resolve from the process environment.
    pub fn from_args(args: &ServeArgs) -> Result<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve(args: &ServeArgs, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let file = match &args.ballot {
            Some(path) => BallotFile::load(path)?,
            None => BallotFile::default(),
        };

        let subject = args
            .subject
            .clone()
            .or(file.subject)
            .context("no ballot subject given; pass --subject or set `subject` in the ballot file")?;
        let options = if args.options.is_empty() {
            file.options
        } else {
            args.options.clone()
        };
        let mode = args.mode.or(file.mode).unwrap_or(VotingMode::Plaintext);
        let block = args.block_repeat_addresses || file.block_repeat_addresses.unwrap_or(false);

        let ballot = BallotConfig::new(subject, options, mode)
            .context("invalid ballot")?
            .with_address_blocking(block);

        let verifying_key = args
            .verifying_key
            .clone()
            .or_else(|| env(VERIFYING_KEY_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .or(file.verifying_key);

        let port = args
            .port
            .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            ballot,
            voters: args.voters.clone(),
            verifying_key,
            snarkjs: args.snarkjs.clone(),
            port,
            results_dir: args.results_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn args() -> ServeArgs {
        ServeArgs {
            voters: PathBuf::from("voters.json"),
            snarkjs: PathBuf::from("snarkjs"),
            results_dir: PathBuf::from("."),
            ..ServeArgs::default()
        }
    }

    #[test]
    fn flags_alone_are_enough() {
        let mut a = args();
        a.subject = Some("Lunch".into());
        a.options = vec!["Pizza".into(), " Sushi ".into(), "".into()];
        let config = ServeConfig::resolve(&a, no_env).unwrap();
        assert_eq!(config.ballot.subject(), "Lunch");
        assert_eq!(config.ballot.options(), ["Pizza", "Sushi"]);
        assert_eq!(config.ballot.mode(), VotingMode::Plaintext);
        assert!(!config.ballot.blocks_repeat_addresses());
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.verifying_key.is_none());
    }

    #[test]
    fn missing_subject_is_fatal() {
        let mut a = args();
        a.options = vec!["A".into(), "B".into()];
        let err = ServeConfig::resolve(&a, no_env).unwrap_err();
        assert!(format!("{err:#}").contains("subject"));
    }

    #[test]
    fn single_option_is_fatal() {
        let mut a = args();
        a.subject = Some("S".into());
        a.options = vec!["Only".into()];
        let err = ServeConfig::resolve(&a, no_env).unwrap_err();
        assert!(format!("{err:#}").contains("at least two"));
    }

    #[test]
    fn file_fields_are_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ballot.yaml");
        std::fs::write(
            &path,
            "subject: From file\noptions: [Red, Green]\nmode: anonymous\n\
             block_repeat_addresses: true\nverifying_key: keys/vk.json\n",
        )
        .unwrap();

        let mut a = args();
        a.ballot = Some(path.clone());
        let config = ServeConfig::resolve(&a, no_env).unwrap();
        assert_eq!(config.ballot.subject(), "From file");
        assert_eq!(config.ballot.mode(), VotingMode::Anonymous);
        assert!(config.ballot.blocks_repeat_addresses());
        assert_eq!(config.verifying_key, Some(PathBuf::from("keys/vk.json")));

        a.subject = Some("From flag".into());
        a.options = vec!["Blue".into(), "Yellow".into()];
        a.mode = Some(VotingMode::Plaintext);
        let config = ServeConfig::resolve(&a, no_env).unwrap();
        assert_eq!(config.ballot.subject(), "From flag");
        assert_eq!(config.ballot.options(), ["Blue", "Yellow"]);
        assert_eq!(config.ballot.mode(), VotingMode::Plaintext);
    }

    #[test]
    fn unknown_file_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ballot.yaml");
        std::fs::write(&path, "subject: S\noptionz: [A, B]\n").unwrap();
        assert!(BallotFile::load(&path).is_err());
    }

    #[test]
    fn environment_supplies_port_and_key() {
        let env: HashMap<&str, &str> =
            HashMap::from([("PORT", "8081"), (VERIFYING_KEY_ENV, "/etc/zkvote/vk.json")]);
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let mut a = args();
        a.subject = Some("S".into());
        a.options = vec!["A".into(), "B".into()];
        let config = ServeConfig::resolve(&a, lookup).unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.verifying_key, Some(PathBuf::from("/etc/zkvote/vk.json")));

        a.port = Some(9000);
        a.verifying_key = Some(PathBuf::from("vk.json"));
        let config = ServeConfig::resolve(&a, lookup).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.verifying_key, Some(PathBuf::from("vk.json")));
    }

    #[test]
    fn unparsable_port_falls_back_to_default() {
        let mut a = args();
        a.subject = Some("S".into());
        a.options = vec!["A".into(), "B".into()];
        let config = ServeConfig::resolve(&a, |k| (k == "PORT").then(|| "http".to_string())).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
