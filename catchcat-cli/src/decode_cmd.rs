//! Decode command - expand a compact report into the verbose form

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use catchcat_core::decode_report;

#[derive(Args)]
pub struct DecodeArgs {
    /// Compact report JSON file
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Write the verbose report here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: DecodeArgs) -> Result<()> {
    let compact = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read report: {}", args.input.display()))?;
    let report = decode_report(&compact)
        .with_context(|| format!("Failed to decode report: {}", args.input.display()))?;

    tracing::info!(
        "Decoded {} matches, {} users",
        report.matches.len(),
        report.high_scores.len()
    );

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}
