//! Competition execution - every ordered pairing on every layout
//!
//! Level 1 - Orchestration and Level 2 - Phases

use catchcat_core::{generate_layout, CompetitionReport, InitialLayout, MatchReport};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agent::{Agent, ProcessAgent};
use crate::config::{CompetitionConfig, MatchConfig};
use crate::match_play::{play_match, Participant};
use crate::scoring::aggregate_scores;

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Run a competition (Level 1 orchestration)
///
/// For each layout, every participant plays the cat against every other
/// participant as catcher. Matches run one at a time. A layout that fails
/// to build a board skips its pairing with a warning; nothing else stops
/// the competition.
///
/// # Arguments
/// * `participants` - Players in the competition
/// * `layouts` - Initial boards, played in order
/// * `config` - Per-match settings
/// * `on_match` - Called after each finished match
pub async fn run_competition<A, F>(
    participants: &[Participant<A>],
    layouts: &[InitialLayout],
    config: &MatchConfig,
    mut on_match: F,
) -> CompetitionReport
where
    A: Agent,
    F: FnMut(&MatchReport),
{
    let pairings = generate_ordered_pairings(participants.len());
    let mut matches = Vec::with_capacity(layouts.len() * pairings.len());

    for (layout_index, layout) in layouts.iter().enumerate() {
        for &(cat_idx, catcher_idx) in &pairings {
            let cat = &participants[cat_idx];
            let catcher = &participants[catcher_idx];

            match play_match(layout, cat, catcher, config).await {
                Ok(report) => {
                    tracing::info!(
                        layout = layout_index,
                        cat = %cat.username,
                        catcher = %catcher.username,
                        moves = report.move_count(),
                        cat_score = report.cat_move_score,
                        catcher_score = report.catcher_move_score,
                        "match finished"
                    );
                    on_match(&report);
                    matches.push(report);
                }
                Err(e) => {
                    tracing::warn!(
                        layout = layout_index,
                        cat = %cat.username,
                        catcher = %catcher.username,
                        error = %e,
                        "skipping match, board could not be built"
                    );
                }
            }
        }
    }

    let high_scores = aggregate_scores(&matches);
    CompetitionReport {
        matches,
        high_scores,
    }
}

/// Number of matches a competition will attempt
pub fn match_count(participants: usize, layouts: usize) -> usize {
    generate_ordered_pairings(participants).len() * layouts
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Initial layouts for a competition (Level 2 phase)
///
/// Explicit layouts come first, followed by `layouts_per_size` generated
/// boards for each configured size. Sizes that cannot form a board are
/// skipped with a warning.
pub fn prepare_layouts(config: &CompetitionConfig, rng: &mut ChaCha8Rng) -> Vec<InitialLayout> {
    let mut layouts = config.layouts.clone();

    for &size in &config.board_sizes {
        for _ in 0..config.layouts_per_size {
            match generate_layout(size, rng) {
                Ok(layout) => layouts.push(layout),
                Err(e) => {
                    tracing::warn!(size, error = %e, "skipping board size");
                    break;
                }
            }
        }
    }

    layouts
}

/// Process-backed participants for every configured agent
pub fn participants_from_config(config: &CompetitionConfig) -> Vec<Participant<ProcessAgent>> {
    config
        .agents
        .iter()
        .map(|spec| {
            Participant::new(
                spec.name.clone(),
                ProcessAgent::new(spec.command.clone(), spec.args.clone()),
            )
        })
        .collect()
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// All ordered pairs `(cat, catcher)` of distinct participants
fn generate_ordered_pairings(n: usize) -> Vec<(usize, usize)> {
    let mut pairings = Vec::new();
    for i in 0..n {
        for j in 0..n {
            if i != j {
                pairings.push((i, j));
            }
        }
    }
    pairings
}

/// Create RNG from optional seed
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
