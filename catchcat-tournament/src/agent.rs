//! Agent protocol - bounded move requests to external players
//!
//! An agent is invoked once per move with the board (cat cell marked `C`),
//! the side to move and the board size. On stdout, the last non-blank line
//! must read `<x>,<y>` and the one before it the processing time. Earlier
//! lines are ignored.

use std::future::Future;
use std::process::Stdio;
use std::time::Instant;

use catchcat_core::{Board, BoardError, MoveFailure, Position, Turn};
use tokio::process::Command;

use crate::config::MatchConfig;

/// Everything an agent is told about the position
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    /// Flat board string with the cat's cell marked `C`
    pub board: String,
    pub turn: Turn,
    pub size: usize,
}

impl MoveRequest {
    pub fn from_board(board: &Board) -> Self {
        Self {
            board: board.agent_string(),
            turn: board.turn(),
            size: board.size(),
        }
    }

    /// Rebuild the board the request describes
    pub fn board_state(&self) -> Result<Board, BoardError> {
        Board::from_agent_string(&self.board, self.turn)
    }
}

/// A move as answered by an agent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentMove {
    pub position: Position,
    /// Processing time reported by the agent
    pub elapsed: f64,
}

/// Something that can pick a move for a position
pub trait Agent {
    fn request_move(
        &self,
        request: &MoveRequest,
    ) -> impl Future<Output = Result<AgentMove, MoveFailure>> + Send;
}

/// Resolution of one bounded move request
#[derive(Clone, Debug, PartialEq)]
pub struct MoveResponse {
    /// Reported processing time on success, measured wall-clock time otherwise
    pub time: f64,
    pub result: Result<Position, MoveFailure>,
}

/// Request a move, racing the agent against `config.move_timeout`.
///
/// The agent future is dropped as soon as the timer fires, which releases
/// every handle it owns. An answer that arrives at or after the deadline is
/// still a timeout.
pub async fn request_move_bounded<A: Agent>(
    agent: &A,
    request: &MoveRequest,
    config: &MatchConfig,
) -> MoveResponse {
    let start = Instant::now();
    let answer = tokio::time::timeout(config.move_timeout, agent.request_move(request)).await;
    let elapsed = start.elapsed();
    let measured = config.time_unit.measure(elapsed);

    match answer {
        Ok(_) if elapsed >= config.move_timeout => MoveResponse {
            time: measured,
            result: Err(MoveFailure::Timeout),
        },
        Ok(Ok(mv)) => MoveResponse {
            time: mv.elapsed,
            result: Ok(mv.position),
        },
        Ok(Err(failure)) => MoveResponse {
            time: measured,
            result: Err(failure),
        },
        Err(_) => MoveResponse {
            time: measured,
            result: Err(MoveFailure::Timeout),
        },
    }
}

// ============================================================================
// PROCESS AGENT
// ============================================================================

/// Agent backed by an executable, spawned once per move.
///
/// On unix the agent runs in its own process group. The whole group is sent
/// `SIGKILL` once the request resolves or is abandoned, so neither the agent
/// nor anything it started outlives its move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessAgent {
    command: String,
    args: Vec<String>,
}

impl ProcessAgent {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Agent for ProcessAgent {
    async fn request_move(&self, request: &MoveRequest) -> Result<AgentMove, MoveFailure> {
        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .arg(request.turn.to_string())
            .arg(request.size.to_string())
            .arg(&request.board)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| MoveFailure::ProcessError {
            message: format!("could not run {}: {e}", self.command),
        })?;
        let _group = ProcessGroupGuard::new(child.id());

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| MoveFailure::ProcessError {
                message: format!("could not read output of {}: {e}", self.command),
            })?;

        if !output.status.success() {
            return Err(MoveFailure::ProcessError {
                message: format!("{} exited with {}", self.command, output.status),
            });
        }

        parse_agent_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Kills an agent's process group when dropped
struct ProcessGroupGuard {
    #[cfg_attr(not(unix), allow(dead_code))]
    leader: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.leader.and_then(|pid| i32::try_from(pid).ok()) {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            // ESRCH just means the group is already gone
            if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                if e != nix::errno::Errno::ESRCH {
                    tracing::warn!(pid, error = %e, "could not kill agent process group");
                }
            }
        }
    }
}

// ============================================================================
// OUTPUT PARSING
// ============================================================================

/// Parse an agent's stdout into a move
pub fn parse_agent_output(stdout: &str) -> Result<AgentMove, MoveFailure> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).rev();

    let coords = lines.next().ok_or_else(|| parse_error("agent printed nothing"))?;
    let time = lines
        .next()
        .ok_or_else(|| parse_error("missing processing time line"))?;

    let position = parse_position(coords)?;
    let elapsed = time
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| parse_error(format!("invalid processing time {time:?}")))?;

    Ok(AgentMove { position, elapsed })
}

fn parse_position(line: &str) -> Result<Position, MoveFailure> {
    let invalid = || parse_error(format!("expected \"<x>,<y>\", got {line:?}"));
    let (x, y) = line.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse::<i32>().map_err(|_| invalid())?;
    let y = y.trim().parse::<i32>().map_err(|_| invalid())?;
    Ok(Position::new(x, y))
}

fn parse_error(message: impl Into<String>) -> MoveFailure {
    MoveFailure::ParseError {
        message: message.into(),
    }
}
