//! Initial layouts and random obstacle placement

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Position, BLOCKED_CELL, EMPTY_CELL};
use crate::error::BoardError;

/// Minimum share of cells blocked by a generated layout
const MIN_OBSTACLE_RATIO: f64 = 0.05;
/// Extra share added on top of the minimum, scaled by a uniform draw
const OBSTACLE_RATIO_SPREAD: f64 = 0.05;

/// Starting point of a match: layout string plus cat start
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialLayout {
    pub board: String,
    pub cat: Position,
}

impl InitialLayout {
    pub fn new(board: impl Into<String>, cat: Position) -> Self {
        Self {
            board: board.into(),
            cat,
        }
    }

    /// Construct a fresh board for a match
    pub fn to_board(&self) -> Result<Board, BoardError> {
        Board::new(&self.board, self.cat)
    }
}

/// Generate a random layout of side `size` with the cat at the center.
///
/// Blocks between 5% and 10% of the cells, never the center.
pub fn generate_layout<R: Rng>(size: usize, rng: &mut R) -> Result<InitialLayout, BoardError> {
    if size == 0 || (size - 1) % 4 != 0 {
        return Err(BoardError::InvalidSide(size));
    }

    let total = size * size;
    let center = total / 2;
    let obstacles = obstacle_count(total, rng.gen::<f64>());

    let mut cells = vec![EMPTY_CELL; total];
    let mut placed = 0;
    while placed < obstacles {
        let index = rng.gen_range(0..total);
        if index == center || cells[index] == BLOCKED_CELL {
            continue;
        }
        cells[index] = BLOCKED_CELL;
        placed += 1;
    }

    Ok(InitialLayout::new(
        cells.into_iter().collect::<String>(),
        Position::new(0, 0),
    ))
}

/// Number of obstacles for `total` cells given a uniform draw in `[0, 1)`
fn obstacle_count(total: usize, draw: f64) -> usize {
    let total_f = total as f64;
    let base = (MIN_OBSTACLE_RATIO * total_f).floor();
    let extra = (draw * OBSTACLE_RATIO_SPREAD * total_f).floor();
    ((base + extra) as usize).min(total.saturating_sub(1))
}
