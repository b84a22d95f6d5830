//! Scoring - time penalties, normalization and ranking
//!
//! Level 3 - Step-level implementation

use catchcat_core::{MatchReport, Turn, UserScore};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Default scale for the square-root law, tuned for millisecond timings
pub const DEFAULT_SQUARE_ROOT_SCALE: f64 = 0.001;
/// Default scale for the cube-root law, tuned for microsecond timings
pub const DEFAULT_CUBE_ROOT_SCALE: f64 = 0.001;

/// Named time-penalty law.
///
/// Every law is monotonically increasing and concave in the elapsed time,
/// so doubling the time spent costs far less than double the penalty.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "law", rename_all = "snake_case")]
pub enum TimePenalty {
    /// `scale * sqrt(t)`
    SquareRoot { scale: f64 },
    /// `scale * cbrt(t)`
    CubeRoot { scale: f64 },
}

impl Default for TimePenalty {
    fn default() -> Self {
        Self::square_root()
    }
}

impl TimePenalty {
    pub fn square_root() -> Self {
        TimePenalty::SquareRoot {
            scale: DEFAULT_SQUARE_ROOT_SCALE,
        }
    }

    pub fn cube_root() -> Self {
        TimePenalty::CubeRoot {
            scale: DEFAULT_CUBE_ROOT_SCALE,
        }
    }

    /// Penalty for one move; negative times count as zero
    pub fn penalty(&self, elapsed: f64) -> f64 {
        let t = elapsed.max(0.0);
        match *self {
            TimePenalty::SquareRoot { scale } => scale * t.sqrt(),
            TimePenalty::CubeRoot { scale } => scale * t.cbrt(),
        }
    }
}

/// Move-score split at `move_count` moves on a board of `area` cells: (winner, loser)
pub fn split_move_score(area: usize, move_count: usize) -> (u32, u32) {
    let loser = move_count.min(area);
    ((area - loser) as u32, loser as u32)
}

/// Move-score divided by the board's cell count
pub fn normalize(move_score: u32, area: usize) -> f64 {
    if area == 0 {
        0.0
    } else {
        move_score as f64 / area as f64
    }
}

/// Fold all match reports into ranked per-user scores
pub fn aggregate_scores(matches: &[MatchReport]) -> Vec<UserScore> {
    let mut order: FxHashMap<String, usize> = FxHashMap::default();
    let mut scores: Vec<UserScore> = Vec::new();

    for report in matches {
        let area = report.area();
        let winner = report.winner();

        for turn in [Turn::Cat, Turn::Catcher] {
            let username = report.player(turn);
            let index = *order.entry(username.to_string()).or_insert_with(|| {
                scores.push(UserScore::new(username));
                scores.len() - 1
            });
            let score = &mut scores[index];

            let move_score = normalize(report.move_score(turn), area);
            let time_score = report.time_score(turn);
            let won = winner == Some(turn);

            match turn {
                Turn::Cat => {
                    score.cat_move_score += move_score;
                    score.cat_time_score += time_score;
                    score.cat_wins += won as u32;
                }
                Turn::Catcher => {
                    score.catcher_move_score += move_score;
                    score.catcher_time_score += time_score;
                    score.catcher_wins += won as u32;
                }
            }
        }
    }

    for score in &mut scores {
        score.update_totals();
    }
    rank_scores(&mut scores);
    scores
}

/// Sort by total score, best first
pub fn rank_scores(scores: &mut [UserScore]) {
    scores.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
