//! Match play - one cat/catcher game between two agents
//!
//! Level 2 - Phase-level implementation

use catchcat_core::{
    Board, BoardError, InitialLayout, MatchReport, MoveFailure, MoveReport, Position, Turn,
};

use crate::agent::{request_move_bounded, Agent, MoveRequest};
use crate::config::MatchConfig;
use crate::scoring::split_move_score;

/// A named player and the agent that moves for it
#[derive(Clone, Debug)]
pub struct Participant<A> {
    pub username: String,
    pub agent: A,
}

impl<A> Participant<A> {
    pub fn new(username: impl Into<String>, agent: A) -> Self {
        Self {
            username: username.into(),
            agent,
        }
    }
}

/// Play one match (Level 2 phase)
///
/// Runs the turn loop until the board declares a winner, an agent fails, or
/// the move count reaches the number of cells. A failure ends the match as
/// an immediate loss for the failing side.
///
/// # Errors
/// Only board construction can fail; agent failures are recorded in the report.
pub async fn play_match<A: Agent>(
    layout: &InitialLayout,
    cat: &Participant<A>,
    catcher: &Participant<A>,
    config: &MatchConfig,
) -> Result<MatchReport, BoardError> {
    let mut board = layout
        .to_board()?
        .with_players(&cat.username, &catcher.username);
    let mut report = MatchReport::new(layout, &cat.username, &catcher.username);
    let area = board.area();
    let mut move_count = 0usize;

    loop {
        if let Some(winner) = board.game_result().winner() {
            tracing::debug!(?winner, move_count, "game decided");
            award_move_scores(&mut report, winner, area, move_count);
            break;
        }
        if move_count >= area {
            tracing::warn!(move_count, "move cap reached without a result");
            break;
        }

        let turn = board.turn();
        let player = match turn {
            Turn::Cat => cat,
            Turn::Catcher => catcher,
        };

        match play_turn(&mut board, player, config).await {
            Ok((position, time)) => {
                let penalty = config.time_penalty.penalty(time);
                match turn {
                    Turn::Cat => report.cat_time_score += penalty,
                    Turn::Catcher => report.catcher_time_score += penalty,
                }
                move_count += 1;
                report
                    .moves
                    .push(MoveReport::success(&player.username, turn, time, position));
            }
            Err((reason, time)) => {
                tracing::warn!(player = %player.username, %turn, %reason, "move failed, match forfeited");
                report
                    .moves
                    .push(MoveReport::failure(&player.username, turn, time, reason));
                award_move_scores(&mut report, turn.opponent(), area, move_count);
                break;
            }
        }
    }

    Ok(report)
}

/// Request, classify and apply one move (Level 3 step)
async fn play_turn<A: Agent>(
    board: &mut Board,
    player: &Participant<A>,
    config: &MatchConfig,
) -> Result<(Position, f64), (MoveFailure, f64)> {
    let request = MoveRequest::from_board(board);
    let response = request_move_bounded(&player.agent, &request, config).await;
    let time = response.time;

    let position = response.result.map_err(|reason| (reason, time))?;
    board
        .make_move(position)
        .map_err(|_| (MoveFailure::InvalidMove { position }, time))?;

    tracing::debug!(player = %player.username, %position, time, "move applied");
    Ok((position, time))
}

/// Winner takes `area - move_count`, loser takes `move_count`
fn award_move_scores(report: &mut MatchReport, winner: Turn, area: usize, move_count: usize) {
    let (winner_score, loser_score) = split_move_score(area, move_count);
    match winner {
        Turn::Cat => {
            report.cat_move_score = winner_score;
            report.catcher_move_score = loser_score;
        }
        Turn::Catcher => {
            report.catcher_move_score = winner_score;
            report.cat_move_score = loser_score;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::TimePenalty;
    use catchcat_core::{GameResult, MoveOutcome};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Plays a fixed list of answers, then fails to parse
    struct ScriptedAgent {
        answers: Mutex<Vec<Result<ScriptedMove, MoveFailure>>>,
        calls: Mutex<usize>,
    }

    #[derive(Clone, Copy)]
    struct ScriptedMove {
        position: Position,
        elapsed: f64,
        delay_ms: u64,
    }

    impl ScriptedAgent {
        fn new(answers: Vec<Result<ScriptedMove, MoveFailure>>) -> Self {
            let mut answers = answers;
            answers.reverse();
            Self {
                answers: Mutex::new(answers),
                calls: Mutex::new(0),
            }
        }

        fn moves(positions: &[(i32, i32)]) -> Self {
            Self::new(
                positions
                    .iter()
                    .map(|&(x, y)| Ok(mv(x, y)))
                    .collect(),
            )
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    fn mv(x: i32, y: i32) -> ScriptedMove {
        ScriptedMove {
            position: Position::new(x, y),
            elapsed: 4.0,
            delay_ms: 0,
        }
    }

    impl Agent for ScriptedAgent {
        async fn request_move(
            &self,
            _request: &MoveRequest,
        ) -> Result<crate::agent::AgentMove, MoveFailure> {
            *self.calls.lock().unwrap() += 1;
            let next = self.answers.lock().unwrap().pop();
            match next {
                Some(Ok(scripted)) => {
                    if scripted.delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(scripted.delay_ms)).await;
                    }
                    Ok(crate::agent::AgentMove {
                        position: scripted.position,
                        elapsed: scripted.elapsed,
                    })
                }
                Some(Err(failure)) => Err(failure),
                None => Err(MoveFailure::ParseError {
                    message: "script exhausted".into(),
                }),
            }
        }
    }

    fn open_board() -> InitialLayout {
        InitialLayout::new(".".repeat(25), Position::new(0, 0))
    }

    fn config() -> MatchConfig {
        MatchConfig::default().with_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_cat_reaches_edge() {
        let cat = Participant::new("alice", ScriptedAgent::moves(&[(1, 0), (2, 0)]));
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[(-2, -2)]));

        let report = play_match(&open_board(), &cat, &catcher, &config()).await.unwrap();

        assert_eq!(report.moves.len(), 3);
        assert!(report.moves.iter().all(|m| m.is_success()));
        assert_eq!(report.cat_move_score, 22);
        assert_eq!(report.catcher_move_score, 3);
        assert_eq!(report.winner(), Some(Turn::Cat));
        // no request once the game is over
        assert_eq!(cat.agent.calls(), 2);
        assert_eq!(catcher.agent.calls(), 1);

        let board = report.replay().unwrap();
        assert_eq!(board.game_result(), GameResult::CatWins);
    }

    #[tokio::test]
    async fn test_catcher_traps_cat() {
        // (0,0) and (1,0) form a walled pocket; the catcher seals it behind the cat
        let (start, pocket) = (Position::new(0, 0), Position::new(1, 0));
        let mut cells: Vec<char> = ".".repeat(81).chars().collect();
        let board = Board::new(&".".repeat(81), start).unwrap();
        for n in start.neighbors().into_iter().chain(pocket.neighbors()) {
            if n != start && n != pocket {
                cells[board.position_to_index(n).unwrap()] = '#';
            }
        }
        let layout = InitialLayout::new(cells.into_iter().collect::<String>(), start);

        let cat = Participant::new("alice", ScriptedAgent::moves(&[(1, 0)]));
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[(0, 0)]));
        let report = play_match(&layout, &cat, &catcher, &config()).await.unwrap();

        assert_eq!(report.move_count(), 2);
        assert_eq!(report.catcher_move_score, 79);
        assert_eq!(report.cat_move_score, 2);
        assert_eq!(report.replay().unwrap().game_result(), GameResult::CatcherWins);
    }

    #[tokio::test]
    async fn test_invalid_move_forfeits() {
        let cat = Participant::new("alice", ScriptedAgent::moves(&[(1, 0)]));
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[(1, 0)]));

        let report = play_match(&open_board(), &cat, &catcher, &config()).await.unwrap();

        let last = report.moves.last().unwrap();
        assert_eq!(last.username, "bob");
        assert_eq!(
            last.outcome,
            MoveOutcome::Failure {
                reason: MoveFailure::InvalidMove { position: Position::new(1, 0) }
            }
        );
        assert_eq!(report.cat_move_score, 24);
        assert_eq!(report.catcher_move_score, 1);
    }

    #[tokio::test]
    async fn test_process_error_forfeits_immediately() {
        let cat = Participant::new(
            "alice",
            ScriptedAgent::new(vec![Err(MoveFailure::ProcessError { message: "crashed".into() })]),
        );
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[]));

        let report = play_match(&open_board(), &cat, &catcher, &config()).await.unwrap();

        assert_eq!(report.moves.len(), 1);
        assert_eq!(report.moves[0].position(), None);
        assert_eq!(report.cat_move_score, 0);
        assert_eq!(report.catcher_move_score, 25);
        assert_eq!(catcher.agent.calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_forfeits_without_penalty_shift() {
        let slow = ScriptedMove {
            delay_ms: 1_000,
            ..mv(1, 1)
        };
        let cat = Participant::new("alice", ScriptedAgent::moves(&[(1, 0)]));
        let catcher = Participant::new("bob", ScriptedAgent::new(vec![Ok(slow)]));

        let report = play_match(&open_board(), &cat, &catcher, &config()).await.unwrap();

        let timeouts = report
            .moves
            .iter()
            .filter(|m| m.error() == Some(&MoveFailure::Timeout))
            .count();
        assert_eq!(timeouts, 1);
        assert_eq!(report.moves.len(), 2);
        assert!(report.moves.iter().all(|m| m.position() != Some(Position::new(1, 1))));
        assert_eq!(report.cat_move_score, 24);
        assert_eq!(report.catcher_move_score, 1);
        // only the cat's valid move was billed
        assert_eq!(report.cat_time_score, config().time_penalty.penalty(4.0));
        assert_eq!(report.catcher_time_score, 0.0);
    }

    #[tokio::test]
    async fn test_penalty_billed_to_mover() {
        let cat_move = ScriptedMove { elapsed: 100.0, ..mv(1, 0) };
        let catcher_move = ScriptedMove { elapsed: 400.0, ..mv(-2, 2) };
        let cat = Participant::new("alice", ScriptedAgent::new(vec![Ok(cat_move), Ok(mv(2, 0))]));
        let catcher = Participant::new("bob", ScriptedAgent::new(vec![Ok(catcher_move)]));

        let report = play_match(&open_board(), &cat, &catcher, &config()).await.unwrap();

        let penalty = config().time_penalty;
        assert_eq!(report.cat_time_score, penalty.penalty(100.0) + penalty.penalty(4.0));
        assert_eq!(report.catcher_time_score, penalty.penalty(400.0));
    }

    #[tokio::test]
    async fn test_configured_penalty_law() {
        let law = TimePenalty::cube_root();
        let cat = Participant::new("alice", ScriptedAgent::moves(&[(1, 0), (2, 0)]));
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[(-2, -2)]));
        let config = config().with_penalty(law);

        let report = play_match(&open_board(), &cat, &catcher, &config).await.unwrap();

        assert_eq!(report.cat_time_score, law.penalty(4.0) + law.penalty(4.0));
        assert_eq!(report.catcher_time_score, law.penalty(4.0));
        assert_ne!(report.catcher_time_score, TimePenalty::square_root().penalty(4.0));
    }

    #[tokio::test]
    async fn test_bad_layout_is_an_error() {
        let cat = Participant::new("alice", ScriptedAgent::moves(&[]));
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[]));
        let layout = InitialLayout::new(".".repeat(24), Position::new(0, 0));

        let result = play_match(&layout, &cat, &catcher, &config()).await;
        assert_eq!(result, Err(BoardError::NotSquare(24)));
    }

    #[tokio::test]
    async fn test_already_decided_board_plays_no_moves() {
        let cat = Participant::new("alice", ScriptedAgent::moves(&[]));
        let catcher = Participant::new("bob", ScriptedAgent::moves(&[]));
        let layout = InitialLayout::new(".".repeat(25), Position::new(2, 1));

        let report = play_match(&layout, &cat, &catcher, &config()).await.unwrap();
        assert!(report.moves.is_empty());
        assert_eq!(report.cat_move_score, 25);
        assert_eq!(report.catcher_move_score, 0);
    }
}
