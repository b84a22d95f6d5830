//! Compact report encoding
//!
//! Two lossless transforms back the persisted report:
//! - run-length encoding of layout strings (`"3.#2."` for `"...#.."`)
//! - compaction, which swaps usernames for indices into a shared user table,
//!   turns into `0`/`1`, and drops absent move fields instead of writing nulls

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::board::{Position, Turn};
use crate::error::CodecError;
use crate::report::{
    CompetitionReport, MatchReport, MoveFailure, MoveOutcome, MoveReport, UserScore,
};

// ============================================================================
// RUN-LENGTH ENCODING
// ============================================================================

/// Longest layout a compact report may expand to (a 1025x1025 board)
pub const MAX_DECODED_CELLS: usize = 1025 * 1025;

/// Run-length encode a layout string. Runs of length 1 carry no count.
pub fn compress_board(board: &str) -> String {
    let mut out = String::with_capacity(board.len() / 2);
    let mut chars = board.chars().peekable();

    while let Some(symbol) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&symbol) {
            chars.next();
            run += 1;
        }
        if run > 1 {
            out.push_str(&run.to_string());
        }
        out.push(symbol);
    }
    out
}

/// Inverse of [`compress_board`]
///
/// Fails with [`CodecError::InvalidCount`] once the output would exceed
/// [`MAX_DECODED_CELLS`].
pub fn decompress_board(encoded: &str) -> Result<String, CodecError> {
    let mut out = String::new();
    let mut count = String::new();
    let mut cells = 0usize;

    for c in encoded.chars() {
        if c.is_ascii_digit() {
            count.push(c);
            continue;
        }
        let run = if count.is_empty() {
            1
        } else {
            count
                .parse::<usize>()
                .map_err(|_| CodecError::InvalidCount(count.clone()))?
        };
        cells = cells
            .checked_add(run)
            .filter(|&n| n <= MAX_DECODED_CELLS)
            .ok_or_else(|| CodecError::InvalidCount(count.clone()))?;
        out.extend(std::iter::repeat(c).take(run));
        count.clear();
    }

    if !count.is_empty() {
        return Err(CodecError::TrailingCount(count));
    }
    Ok(out)
}

// ============================================================================
// COMPACT DOCUMENT
// ============================================================================

/// Persisted form of a [`CompetitionReport`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactReport {
    pub users: Vec<String>,
    pub matches: Vec<CompactMatch>,
    pub high_scores: Vec<CompactScore>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactMatch {
    pub cat: usize,
    pub catcher: usize,
    /// Run-length encoded initial layout
    pub board: String,
    pub start: [i32; 2],
    pub turn: u8,
    pub moves: Vec<CompactMove>,
    pub cat_move_score: u32,
    pub catcher_move_score: u32,
    pub cat_time_score: f64,
    pub catcher_time_score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompactMove {
    pub user: usize,
    pub turn: u8,
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[i32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CompactError>,
}

/// Failure kind without the attempted position, which lives on the move itself
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompactError {
    Timeout,
    ProcessError { message: String },
    ParseError { message: String },
    InvalidMove,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactScore {
    pub user: usize,
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

/// Ordered username table, built fresh for every encode call
#[derive(Default)]
struct UserTable {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl UserTable {
    fn intern(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }
}

// ============================================================================
// COMPACTION
// ============================================================================

/// Replace usernames with table indices and compress layouts
pub fn compact(report: &CompetitionReport) -> CompactReport {
    let mut users = UserTable::default();

    let matches = report
        .matches
        .iter()
        .map(|m| compact_match(m, &mut users))
        .collect();

    let high_scores = report
        .high_scores
        .iter()
        .map(|s| compact_score(s, &mut users))
        .collect();

    CompactReport {
        users: users.names,
        matches,
        high_scores,
    }
}

fn compact_match(m: &MatchReport, users: &mut UserTable) -> CompactMatch {
    let cat = users.intern(&m.cat_player);
    let catcher = users.intern(&m.catcher_player);
    let moves = m.moves.iter().map(|mv| compact_move(mv, users)).collect();

    CompactMatch {
        cat,
        catcher,
        board: compress_board(&m.board),
        start: [m.cat_start.x, m.cat_start.y],
        turn: turn_code(m.initial_turn),
        moves,
        cat_move_score: m.cat_move_score,
        catcher_move_score: m.catcher_move_score,
        cat_time_score: m.cat_time_score,
        catcher_time_score: m.catcher_time_score,
    }
}

fn compact_move(mv: &MoveReport, users: &mut UserTable) -> CompactMove {
    let error = mv.error().map(|reason| match reason {
        MoveFailure::Timeout => CompactError::Timeout,
        MoveFailure::ProcessError { message } => CompactError::ProcessError {
            message: message.clone(),
        },
        MoveFailure::ParseError { message } => CompactError::ParseError {
            message: message.clone(),
        },
        MoveFailure::InvalidMove { .. } => CompactError::InvalidMove,
    });

    CompactMove {
        user: users.intern(&mv.username),
        turn: turn_code(mv.turn),
        time: mv.time,
        position: mv.position().map(|p| [p.x, p.y]),
        error,
    }
}

fn compact_score(s: &UserScore, users: &mut UserTable) -> CompactScore {
    CompactScore {
        user: users.intern(&s.username),
        cat_move_score: s.cat_move_score,
        catcher_move_score: s.catcher_move_score,
        cat_time_score: s.cat_time_score,
        catcher_time_score: s.catcher_time_score,
        cat_score: s.cat_score,
        catcher_score: s.catcher_score,
        total_score: s.total_score,
        cat_wins: s.cat_wins,
        catcher_wins: s.catcher_wins,
    }
}

// ============================================================================
// DECOMPACTION
// ============================================================================

/// Exact inverse of [`compact`]
pub fn decompact(compact: &CompactReport) -> Result<CompetitionReport, CodecError> {
    let users = &compact.users;

    let matches = compact
        .matches
        .iter()
        .enumerate()
        .map(|(i, m)| decompact_match(i, m, users))
        .collect::<Result<Vec<_>, _>>()?;

    let high_scores = compact
        .high_scores
        .iter()
        .map(|s| decompact_score(s, users))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompetitionReport {
        matches,
        high_scores,
    })
}

fn decompact_match(
    match_index: usize,
    m: &CompactMatch,
    users: &[String],
) -> Result<MatchReport, CodecError> {
    let moves = m
        .moves
        .iter()
        .enumerate()
        .map(|(move_index, mv)| decompact_move(match_index, move_index, mv, users))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MatchReport {
        cat_player: lookup_user(users, m.cat)?,
        catcher_player: lookup_user(users, m.catcher)?,
        board: decompress_board(&m.board)?,
        cat_start: Position::new(m.start[0], m.start[1]),
        initial_turn: turn_from_code(m.turn)?,
        moves,
        cat_move_score: m.cat_move_score,
        catcher_move_score: m.catcher_move_score,
        cat_time_score: m.cat_time_score,
        catcher_time_score: m.catcher_time_score,
    })
}

fn decompact_move(
    match_index: usize,
    move_index: usize,
    mv: &CompactMove,
    users: &[String],
) -> Result<MoveReport, CodecError> {
    let position = mv.position.map(|[x, y]| Position::new(x, y));

    let outcome = match (&mv.error, position) {
        (None, Some(position)) => MoveOutcome::Success { position },
        (Some(CompactError::InvalidMove), Some(position)) => MoveOutcome::Failure {
            reason: MoveFailure::InvalidMove { position },
        },
        (None, None) | (Some(CompactError::InvalidMove), None) => {
            return Err(CodecError::MissingPosition {
                match_index,
                move_index,
            })
        }
        (Some(_), Some(_)) => {
            return Err(CodecError::UnexpectedPosition {
                match_index,
                move_index,
            })
        }
        (Some(CompactError::Timeout), None) => MoveOutcome::Failure {
            reason: MoveFailure::Timeout,
        },
        (Some(CompactError::ProcessError { message }), None) => MoveOutcome::Failure {
            reason: MoveFailure::ProcessError {
                message: message.clone(),
            },
        },
        (Some(CompactError::ParseError { message }), None) => MoveOutcome::Failure {
            reason: MoveFailure::ParseError {
                message: message.clone(),
            },
        },
    };

    Ok(MoveReport {
        username: lookup_user(users, mv.user)?,
        turn: turn_from_code(mv.turn)?,
        time: mv.time,
        outcome,
    })
}

fn decompact_score(s: &CompactScore, users: &[String]) -> Result<UserScore, CodecError> {
    Ok(UserScore {
        username: lookup_user(users, s.user)?,
        cat_move_score: s.cat_move_score,
        catcher_move_score: s.catcher_move_score,
        cat_time_score: s.cat_time_score,
        catcher_time_score: s.catcher_time_score,
        cat_score: s.cat_score,
        catcher_score: s.catcher_score,
        total_score: s.total_score,
        cat_wins: s.cat_wins,
        catcher_wins: s.catcher_wins,
    })
}

fn lookup_user(users: &[String], index: usize) -> Result<String, CodecError> {
    users
        .get(index)
        .cloned()
        .ok_or(CodecError::UnknownUser(index))
}

fn turn_code(turn: Turn) -> u8 {
    match turn {
        Turn::Cat => 0,
        Turn::Catcher => 1,
    }
}

fn turn_from_code(code: u8) -> Result<Turn, CodecError> {
    match code {
        0 => Ok(Turn::Cat),
        1 => Ok(Turn::Catcher),
        other => Err(CodecError::InvalidTurn(other)),
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Compact and serialize a report
pub fn encode_report(report: &CompetitionReport) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&compact(report))?)
}

/// Parse and decompact a report
pub fn decode_report(json: &str) -> Result<CompetitionReport, CodecError> {
    let compact: CompactReport = serde_json::from_str(json)?;
    decompact(&compact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::InitialLayout;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn sample_report() -> CompetitionReport {
        let layout = InitialLayout::new("....#....#...............", Position::new(0, 0));

        let mut first = MatchReport::new(&layout, "alice", "bob");
        first.moves = vec![
            MoveReport::success("alice", Turn::Cat, 10.25, Position::new(1, 0)),
            MoveReport::failure(
                "bob",
                Turn::Catcher,
                3000.0,
                MoveFailure::ProcessError { message: "exit status: 1".into() },
            ),
        ];
        first.cat_move_score = 24;
        first.catcher_move_score = 1;
        first.cat_time_score = 0.1;

        let mut second = MatchReport::new(&layout, "bob", "alice");
        second.moves = vec![
            MoveReport::failure(
                "bob",
                Turn::Cat,
                2.0,
                MoveFailure::InvalidMove { position: Position::new(2, 2) },
            ),
        ];
        second.catcher_move_score = 25;

        let mut carol = UserScore::new("carol");
        carol.catcher_wins = 1;
        carol.update_totals();

        CompetitionReport {
            matches: vec![first, second],
            high_scores: vec![UserScore::new("alice"), UserScore::new("bob"), carol],
        }
    }

    #[test]
    fn test_compress_examples() {
        assert_eq!(compress_board(""), "");
        assert_eq!(compress_board("."), ".");
        assert_eq!(compress_board("...#.."), "3.#2.");
        assert_eq!(compress_board("##########"), "10#");
        assert_eq!(decompress_board("3.#2.").unwrap(), "...#..");
        assert_eq!(decompress_board("12#").unwrap(), "#".repeat(12));
    }

    #[test]
    fn test_compress_round_trip_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for len in 0..=500 {
            let s: String = (0..len)
                .map(|_| if rng.gen_bool(0.3) { '#' } else { '.' })
                .collect();
            assert_eq!(decompress_board(&compress_board(&s)).unwrap(), s);
        }
    }

    #[test]
    fn test_compress_round_trip_long_runs() {
        for len in [1usize, 9, 10, 11, 99, 100, 101, 441] {
            let s = format!("{}{}{}", ".".repeat(len), "#".repeat(len), ".");
            assert_eq!(decompress_board(&compress_board(&s)).unwrap(), s);
        }
    }

    #[test]
    fn test_decompress_trailing_count() {
        assert!(matches!(
            decompress_board("3.12"),
            Err(CodecError::TrailingCount(c)) if c == "12"
        ));
    }

    #[test]
    fn test_decompress_rejects_oversized_runs() {
        for encoded in ["99999999999999#", "99999999999999999999999#", "1050626.", "1050625.#"] {
            assert!(
                matches!(decompress_board(encoded), Err(CodecError::InvalidCount(_))),
                "{encoded:?} should be rejected"
            );
        }
        let largest = decompress_board(&format!("{MAX_DECODED_CELLS}.")).unwrap();
        assert_eq!(largest.len(), MAX_DECODED_CELLS);
    }

    #[test]
    fn test_decode_report_rejects_oversized_board() {
        let mut doc = compact(&sample_report());
        doc.matches[0].board = "99999999999999#".to_string();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(matches!(decode_report(&json), Err(CodecError::InvalidCount(_))));
    }

    #[test]
    fn test_user_table_order() {
        let compact = compact(&sample_report());
        assert_eq!(compact.users, vec!["alice", "bob", "carol"]);
        assert_eq!(compact.matches[1].cat, 1);
        assert_eq!(compact.matches[1].catcher, 0);
        assert_eq!(compact.high_scores[2].user, 2);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let json = encode_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let moves = &value["matches"][0]["moves"];
        assert!(moves[0].get("error").is_none());
        assert_eq!(moves[0]["position"], serde_json::json!([1, 0]));
        assert!(moves[1].get("position").is_none());
        assert_eq!(moves[1]["error"]["kind"], "process_error");
        assert_eq!(moves[1]["turn"], 1);

        let invalid = &value["matches"][1]["moves"][0];
        assert_eq!(invalid["position"], serde_json::json!([2, 2]));
        assert_eq!(invalid["error"]["kind"], "invalid_move");
        assert!(value.get("highScores").is_some());
    }

    #[test]
    fn test_compact_round_trip() {
        let report = sample_report();
        assert_eq!(decompact(&compact(&report)).unwrap(), report);
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = encode_report(&report).unwrap();
        assert_eq!(decode_report(&json).unwrap(), report);
    }

    #[test]
    fn test_separate_encodes_do_not_share_tables() {
        let report = sample_report();
        let mut other = report.clone();
        other.matches.reverse();

        let a = compact(&report);
        let b = compact(&other);
        assert_eq!(a.users, vec!["alice", "bob", "carol"]);
        assert_eq!(b.users, vec!["bob", "alice", "carol"]);
        assert_eq!(decompact(&b).unwrap(), other);
    }

    #[test]
    fn test_decompact_rejects_malformed_moves() {
        let mut doc = compact(&sample_report());
        doc.matches[0].moves[0].position = None;
        assert!(matches!(
            decompact(&doc),
            Err(CodecError::MissingPosition { match_index: 0, move_index: 0 })
        ));

        let mut doc = compact(&sample_report());
        doc.matches[0].moves[1].position = Some([0, 0]);
        assert!(matches!(
            decompact(&doc),
            Err(CodecError::UnexpectedPosition { match_index: 0, move_index: 1 })
        ));

        let mut doc = compact(&sample_report());
        doc.matches[1].moves[0].position = None;
        assert!(matches!(
            decompact(&doc),
            Err(CodecError::MissingPosition { match_index: 1, move_index: 0 })
        ));

        let mut doc = compact(&sample_report());
        doc.matches[0].moves[0].turn = 4;
        assert!(matches!(decompact(&doc), Err(CodecError::InvalidTurn(4))));

        let mut doc = compact(&sample_report());
        doc.matches[0].cat = 9;
        assert!(matches!(decompact(&doc), Err(CodecError::UnknownUser(9))));
    }
}
