//! Match histories, per-user scores and competition reports

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Position, Turn};
use crate::error::BoardError;
use crate::layout::InitialLayout;

/// Why a move request did not produce a legal move
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveFailure {
    #[error("agent did not answer before the timeout")]
    Timeout,

    #[error("agent process failed: {message}")]
    ProcessError { message: String },

    #[error("could not parse agent output: {message}")]
    ParseError { message: String },

    #[error("illegal move to {position}")]
    InvalidMove { position: Position },
}

/// Outcome of a single move request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveOutcome {
    Success { position: Position },
    Failure { reason: MoveFailure },
}

/// One entry of a match log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveReport {
    pub username: String,
    pub turn: Turn,
    /// Agent-reported processing time, or measured time for failed requests
    pub time: f64,
    pub outcome: MoveOutcome,
}

impl MoveReport {
    pub fn success(username: &str, turn: Turn, time: f64, position: Position) -> Self {
        Self {
            username: username.to_string(),
            turn,
            time,
            outcome: MoveOutcome::Success { position },
        }
    }

    pub fn failure(username: &str, turn: Turn, time: f64, reason: MoveFailure) -> Self {
        Self {
            username: username.to_string(),
            turn,
            time,
            outcome: MoveOutcome::Failure { reason },
        }
    }

    /// Attempted position, if the agent produced one
    pub fn position(&self) -> Option<Position> {
        match &self.outcome {
            MoveOutcome::Success { position } => Some(*position),
            MoveOutcome::Failure {
                reason: MoveFailure::InvalidMove { position },
            } => Some(*position),
            MoveOutcome::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&MoveFailure> {
        match &self.outcome {
            MoveOutcome::Success { .. } => None,
            MoveOutcome::Failure { reason } => Some(reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, MoveOutcome::Success { .. })
    }
}

/// Full record of one match
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub cat_player: String,
    pub catcher_player: String,
    /// Initial layout string
    pub board: String,
    pub cat_start: Position,
    pub initial_turn: Turn,
    pub moves: Vec<MoveReport>,
    pub cat_move_score: u32,
    pub catcher_move_score: u32,
    pub cat_time_score: f64,
    pub catcher_time_score: f64,
}

impl MatchReport {
    /// Empty report for a match about to start
    pub fn new(layout: &InitialLayout, cat_player: &str, catcher_player: &str) -> Self {
        Self {
            cat_player: cat_player.to_string(),
            catcher_player: catcher_player.to_string(),
            board: layout.board.clone(),
            cat_start: layout.cat,
            initial_turn: Turn::Cat,
            moves: Vec::new(),
            cat_move_score: 0,
            catcher_move_score: 0,
            cat_time_score: 0.0,
            catcher_time_score: 0.0,
        }
    }

    /// Total number of cells on the match board
    pub fn area(&self) -> usize {
        self.board.len()
    }

    /// Number of moves applied to the board
    pub fn move_count(&self) -> usize {
        self.moves.iter().filter(|m| m.is_success()).count()
    }

    pub fn player(&self, turn: Turn) -> &str {
        match turn {
            Turn::Cat => &self.cat_player,
            Turn::Catcher => &self.catcher_player,
        }
    }

    pub fn move_score(&self, turn: Turn) -> u32 {
        match turn {
            Turn::Cat => self.cat_move_score,
            Turn::Catcher => self.catcher_move_score,
        }
    }

    pub fn time_score(&self, turn: Turn) -> f64 {
        match turn {
            Turn::Cat => self.cat_time_score,
            Turn::Catcher => self.catcher_time_score,
        }
    }

    /// Side with the strictly higher move-score, `None` on a tie
    pub fn winner(&self) -> Option<Turn> {
        use std::cmp::Ordering;
        match self.cat_move_score.cmp(&self.catcher_move_score) {
            Ordering::Greater => Some(Turn::Cat),
            Ordering::Less => Some(Turn::Catcher),
            Ordering::Equal => None,
        }
    }

    /// Rebuild the final board from the initial state and the recorded moves
    pub fn replay(&self) -> Result<Board, BoardError> {
        let mut board = Board::new(&self.board, self.cat_start)?
            .with_turn(self.initial_turn)
            .with_players(&self.cat_player, &self.catcher_player);

        for mv in &self.moves {
            if let MoveOutcome::Success { position } = mv.outcome {
                board.make_move(position)?;
            }
        }
        Ok(board)
    }
}

/// Aggregate score of one user across all matches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScore {
    pub username: String,
    pub cat_move_score: f64,
    pub catcher_move_score: f64,
    pub cat_time_score: f64,
    pub catcher_time_score: f64,
    pub cat_score: f64,
    pub catcher_score: f64,
    pub total_score: f64,
    pub cat_wins: u32,
    pub catcher_wins: u32,
}

impl UserScore {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            cat_move_score: 0.0,
            catcher_move_score: 0.0,
            cat_time_score: 0.0,
            catcher_time_score: 0.0,
            cat_score: 0.0,
            catcher_score: 0.0,
            total_score: 0.0,
            cat_wins: 0,
            catcher_wins: 0,
        }
    }

    /// Refresh the derived `cat_score`, `catcher_score` and `total_score`
    pub fn update_totals(&mut self) {
        self.cat_score = self.cat_move_score - self.cat_time_score;
        self.catcher_score = self.catcher_move_score - self.catcher_time_score;
        self.total_score = self.cat_score + self.catcher_score;
    }

    pub fn wins(&self) -> u32 {
        self.cat_wins + self.catcher_wins
    }
}

/// Everything produced by a competition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionReport {
    pub matches: Vec<MatchReport>,
    /// Ranked by `total_score`, best first
    pub high_scores: Vec<UserScore>,
}

impl CompetitionReport {
    pub fn winner(&self) -> Option<&UserScore> {
        self.high_scores.first()
    }

    pub fn score_for(&self, username: &str) -> Option<&UserScore> {
        self.high_scores.iter().find(|s| s.username == username)
    }
}
