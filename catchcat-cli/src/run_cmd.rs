//! Run command - play a full competition between agent executables
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_config(), play_competition(), write_report(), print_rankings()
//! - Level 4: formatting utilities

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use catchcat_core::{encode_report, CompetitionReport};
use catchcat_tournament::{
    create_rng, match_count, participants_from_config, prepare_layouts, run_competition,
    CompetitionConfig,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct RunArgs {
    /// Competition config JSON file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Per-move timeout in milliseconds (overrides the config)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Where to write the competition report
    #[arg(long, value_name = "FILE", default_value = "report.json")]
    pub output: PathBuf,

    /// Write the verbose report instead of the compact form
    #[arg(long)]
    pub verbose_report: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run competition command
///
/// 1. Load the config and apply command-line overrides
/// 2. Play every pairing on every layout
/// 3. Write the report and print the rankings
pub fn run(args: RunArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(&args, seed)?;

    let report = play_competition(&config)?;

    write_report(&report, &args)?;
    print_rankings(&report);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Load the config file and apply overrides
fn load_config(args: &RunArgs, seed: Option<u64>) -> Result<CompetitionConfig> {
    let mut config = CompetitionConfig::load(&args.config)?;

    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_move_timeout_ms(timeout_ms);
    }
    if config.agents.len() < 2 {
        bail!(
            "{} names {} agent(s); a competition needs at least two",
            args.config.display(),
            config.agents.len()
        );
    }

    if let Some(name) = duplicate_agent_name(&config) {
        bail!(
            "{} names agent {:?} more than once; agent names must be unique",
            args.config.display(),
            name
        );
    }

    Ok(config)
}

/// Play the competition on a fresh tokio runtime
fn play_competition(config: &CompetitionConfig) -> Result<CompetitionReport> {
    let mut rng = create_rng(config.seed);
    let layouts = prepare_layouts(config, &mut rng);
    let participants = participants_from_config(config);
    let match_config = config.match_config();

    tracing::info!(
        "Starting competition: {} agents, {} layouts, {} matches (timeout={}ms)",
        participants.len(),
        layouts.len(),
        match_count(participants.len(), layouts.len()),
        config.move_timeout_ms
    );

    let progress = ProgressBar::new(match_count(participants.len(), layouts.len()) as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(run_competition(
        &participants,
        &layouts,
        &match_config,
        |m| {
            progress.set_message(format!("{} vs {}", m.cat_player, m.catcher_player));
            progress.inc(1);
        },
    ));
    progress.finish_with_message("done");

    Ok(report)
}

/// Write the report in compact or verbose form
fn write_report(report: &CompetitionReport, args: &RunArgs) -> Result<()> {
    let json = if args.verbose_report {
        serde_json::to_string_pretty(report).context("Failed to serialize report")?
    } else {
        encode_report(report).context("Failed to encode report")?
    };

    std::fs::write(&args.output, json)
        .with_context(|| format!("Failed to write report: {}", args.output.display()))?;

    tracing::info!("Report written to {}", args.output.display());
    Ok(())
}

/// Print the high-score table
fn print_rankings(report: &CompetitionReport) {
    println!("\n=== High Scores ({} matches) ===", report.matches.len());
    println!(
        "{:<4} {:<20} {:>9} {:>9} {:>9} {:>6}",
        "#", "User", "Cat", "Catcher", "Total", "Wins"
    );
    for (rank, score) in report.high_scores.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:>9.4} {:>9.4} {:>9.4} {:>6}",
            rank + 1,
            truncate(&score.username, 20),
            score.cat_score,
            score.catcher_score,
            score.total_score,
            score.wins()
        );
    }

    if let Some(winner) = report.winner() {
        println!("\nWinner: {}", winner.username);
    }
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// First agent name that appears twice
fn duplicate_agent_name(config: &CompetitionConfig) -> Option<&str> {
    let mut seen = HashSet::new();
    config
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .find(|name| !seen.insert(*name))
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(width - 1).collect();
        short.push('~');
        short
    }
}
