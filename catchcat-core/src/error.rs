//! Error types for board construction, moves and report decoding

use thiserror::Error;

use crate::board::{Position, Turn};

/// Board construction and move errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board layout of length {0} is not a perfect square")]
    NotSquare(usize),

    #[error("board side {0} is not of the form 4k+1")]
    InvalidSide(usize),

    #[error("invalid cell symbol {symbol:?} at index {index}")]
    InvalidCell { index: usize, symbol: char },

    #[error("cat start {0} is outside the board")]
    CatOutOfBounds(Position),

    #[error("cat start {0} is on a blocked cell")]
    CatOnBlockedCell(Position),

    #[error("board string has no cat cell")]
    MissingCat,

    #[error("illegal move to {position} for {turn}")]
    IllegalMove { position: Position, turn: Turn },
}

/// Errors raised while decoding a compact report
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed report document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("run length {0:?} has no symbol to repeat")]
    TrailingCount(String),

    #[error("run length {0:?} is too large")]
    InvalidCount(String),

    #[error("unknown turn code {0}")]
    InvalidTurn(u8),

    #[error("user index {0} is not in the user table")]
    UnknownUser(usize),

    #[error("match {match_index}, move {move_index}: successful move has no position")]
    MissingPosition { match_index: usize, move_index: usize },

    #[error("match {match_index}, move {move_index}: position recorded for a move that produced none")]
    UnexpectedPosition { match_index: usize, move_index: usize },
}
