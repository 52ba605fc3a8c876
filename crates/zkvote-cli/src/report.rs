//! # Results Report
//!
//! Plain-text rendering of a closed session, written next to the server
//! when it shuts down.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use zkvote_ballot::{FinalTally, TallyView};
use zkvote_core::Timestamp;

/// Render `tally` as the results report.
pub fn render(tally: &FinalTally, address_blocking: bool) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, tally, address_blocking);
    out
}

fn write_report(out: &mut String, tally: &FinalTally, address_blocking: bool) -> std::fmt::Result {
    writeln!(out, "=== Voting Results ===\n")?;
    writeln!(out, "Subject: {}", tally.subject)?;
    writeln!(out, "Mode: {}", tally.mode)?;
    writeln!(out, "Date: {}\n", tally.closed_at)?;

    writeln!(out, "Statistics:")?;
    writeln!(out, "- Total eligible voters: {}", tally.eligible_voters)?;
    writeln!(out, "- Total votes cast: {}", tally.votes_cast)?;
    writeln!(out, "- Participation rate: {:.1}%", tally.participation_rate)?;
    writeln!(
        out,
        "- IP blocking: {}",
        if address_blocking { "Enabled" } else { "Disabled" }
    )?;
    if tally.verification_downgrades > 0 {
        writeln!(
            out,
            "- Simplified verifications: {}",
            tally.verification_downgrades
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Final Results:")?;
    writeln!(out, "============")?;
    match &tally.tally {
        TallyView::Plaintext { options, results } => {
            for (label, count) in options.iter().zip(&results.counts) {
                let share = if results.total > 0 {
                    *count as f64 / results.total as f64 * 100.0
                } else {
                    0.0
                };
                writeln!(out, "{label}: {count} votes ({share:.1}%)")?;
            }
        }
        TallyView::Anonymous(summary) => {
            writeln!(out, "Anonymous ballots cast: {}", summary.total_votes_cast)?;
            writeln!(out, "Registered commitments: {}", summary.registered_voters)?;
            writeln!(out, "Options: {}", tally.options.join(", "))?;
            writeln!(out, "{}", summary.message)?;
        }
    }
    Ok(())
}

/// Replace everything but ASCII letters and digits with `_`.
pub fn sanitize_subject(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `<subject>_<YYYY-MM-DDTHH-MM-SS>.txt`
pub fn file_name(subject: &str, closed_at: &Timestamp) -> String {
    format!("{}_{}.txt", sanitize_subject(subject), closed_at.to_file_stamp())
}

/// Render and write the report into `dir`. Returns the file path.
pub fn write(dir: &Path, tally: &FinalTally, address_blocking: bool) -> Result<PathBuf> {
    let path = dir.join(file_name(&tally.subject, &tally.closed_at));
    std::fs::write(&path, render(tally, address_blocking))
        .with_context(|| format!("writing results to {}", path.display()))?;
    Ok(path)
}
