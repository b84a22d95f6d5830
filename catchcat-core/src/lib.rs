//! Catch-the-Cat Core - Game engine and report format
//!
//! This crate provides the core logic shared by the arena:
//! - Board geometry (offset hex grid with centered coordinates)
//! - Move legality and win detection for cat and catcher
//! - Random layout generation
//! - Match reports, user scores and replay
//! - Compact report codec (run-length layouts, indexed usernames)

pub mod board;
pub mod codec;
pub mod error;
pub mod layout;
pub mod report;

// Re-exports for convenient access
pub use board::{Board, Direction, GameResult, Position, Turn, DIRECTIONS};
pub use codec::{
    compact, compress_board, decode_report, decompact, decompress_board, encode_report,
    CompactReport, MAX_DECODED_CELLS,
};
pub use error::{BoardError, CodecError};
pub use layout::{generate_layout, InitialLayout};
pub use report::{CompetitionReport, MatchReport, MoveFailure, MoveOutcome, MoveReport, UserScore};
