//! Offset hex grid geometry and the cat/catcher state machine
//!
//! Coordinates are centered: on a board of side `N` both `x` and `y` range
//! over `[-N/2, N/2]`. Neighbor offsets depend on the parity of the row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;

/// Symbol for an empty cell in a layout string
pub const EMPTY_CELL: char = '.';
/// Symbol for a blocked cell in a layout string
pub const BLOCKED_CELL: char = '#';
/// Symbol marking the cat in the board string sent to agents
pub const CAT_CELL: char = 'C';

/// Offset hex coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbor in the given direction
    pub fn neighbor(&self, direction: Direction) -> Position {
        let parity = (self.y % 2 != 0) as usize;
        let (dx, dy) = NEIGHBOR_OFFSETS[parity][direction as usize];
        Position::new(self.x + dx, self.y + dy)
    }

    /// All six neighbors, in `DIRECTIONS` order
    pub fn neighbors(&self) -> [Position; 6] {
        DIRECTIONS.map(|d| self.neighbor(d))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Hex directions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    East = 0,
    West = 1,
    NorthEast = 2,
    NorthWest = 3,
    SouthEast = 4,
    SouthWest = 5,
}

pub const DIRECTIONS: [Direction; 6] = [
    Direction::East,
    Direction::West,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

/// Offsets (dx, dy) indexed by [row parity][direction], parity 1 = odd row
const NEIGHBOR_OFFSETS: [[(i32, i32); 6]; 2] = [
    // even rows: E, W, NE, NW, SE, SW
    [(1, 0), (-1, 0), (0, -1), (-1, -1), (-1, 1), (0, 1)],
    // odd rows
    [(1, 0), (-1, 0), (1, -1), (0, -1), (0, 1), (1, 1)],
];

/// Side to move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turn {
    Cat = 0,
    Catcher = 1,
}

impl Turn {
    pub fn opponent(self) -> Self {
        match self {
            Turn::Cat => Turn::Catcher,
            Turn::Catcher => Turn::Cat,
        }
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Turn::Cat => f.write_str("cat"),
            Turn::Catcher => f.write_str("catcher"),
        }
    }
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    /// The cat reached the edge
    CatWins,
    /// The cat is trapped
    CatcherWins,
}

impl GameResult {
    pub fn is_over(self) -> bool {
        self != GameResult::Ongoing
    }

    pub fn winner(self) -> Option<Turn> {
        match self {
            GameResult::Ongoing => None,
            GameResult::CatWins => Some(Turn::Cat),
            GameResult::CatcherWins => Some(Turn::Catcher),
        }
    }
}

/// Board state for a single match
///
/// The cat's cell is tracked out of band and is never marked blocked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    half: i32,
    blocked: Vec<bool>,
    cat: Position,
    turn: Turn,
    cat_player: String,
    catcher_player: String,
}

impl Board {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Build a board from a layout string over `{'.', '#'}` with the cat at `cat`.
    ///
    /// The layout length must be `N*N` for some `N = 4k+1`. The cat moves first.
    pub fn new(layout: &str, cat: Position) -> Result<Self, BoardError> {
        let size = side_length(layout.len())?;

        let mut blocked = Vec::with_capacity(layout.len());
        for (index, symbol) in layout.chars().enumerate() {
            match symbol {
                EMPTY_CELL => blocked.push(false),
                BLOCKED_CELL => blocked.push(true),
                _ => return Err(BoardError::InvalidCell { index, symbol }),
            }
        }

        let board = Self {
            size,
            half: (size / 2) as i32,
            blocked,
            cat,
            turn: Turn::Cat,
            cat_player: String::new(),
            catcher_player: String::new(),
        };

        if !board.is_valid_position(cat) {
            return Err(BoardError::CatOutOfBounds(cat));
        }
        if board.blocked[board.index_of(cat)] {
            return Err(BoardError::CatOnBlockedCell(cat));
        }

        Ok(board)
    }

    /// Parse the board string given to agents, where the cat's cell is `'C'`
    pub fn from_agent_string(board: &str, turn: Turn) -> Result<Self, BoardError> {
        let size = side_length(board.len())?;
        let cat_index = board.find(CAT_CELL).ok_or(BoardError::MissingCat)?;
        let half = (size / 2) as i32;
        let cat = Position::new(
            (cat_index % size) as i32 - half,
            (cat_index / size) as i32 - half,
        );
        let layout = board.replacen(CAT_CELL, &EMPTY_CELL.to_string(), 1);
        Ok(Self::new(&layout, cat)?.with_turn(turn))
    }

    /// Set the side to move
    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turn = turn;
        self
    }

    /// Set the participant identities
    pub fn with_players(mut self, cat_player: &str, catcher_player: &str) -> Self {
        self.cat_player = cat_player.to_string();
        self.catcher_player = catcher_player.to_string();
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Side length `N`
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells, `N*N`
    pub fn area(&self) -> usize {
        self.size * self.size
    }

    /// `N/2`, the largest absolute coordinate on the board
    pub fn half(&self) -> i32 {
        self.half
    }

    pub fn cat(&self) -> Position {
        self.cat
    }

    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn cat_player(&self) -> &str {
        &self.cat_player
    }

    pub fn catcher_player(&self) -> &str {
        &self.catcher_player
    }

    /// Username of the side to move
    pub fn current_player(&self) -> &str {
        match self.turn {
            Turn::Cat => &self.cat_player,
            Turn::Catcher => &self.catcher_player,
        }
    }

    // ========================================================================
    // GEOMETRY
    // ========================================================================

    pub fn is_valid_position(&self, p: Position) -> bool {
        p.x.abs() <= self.half && p.y.abs() <= self.half
    }

    /// Flat cell index of `p`, or `None` outside the board
    pub fn position_to_index(&self, p: Position) -> Option<usize> {
        self.is_valid_position(p).then(|| self.index_of(p))
    }

    /// Inverse of [`Board::position_to_index`]
    pub fn index_to_position(&self, index: usize) -> Option<Position> {
        (index < self.area()).then(|| {
            Position::new(
                (index % self.size) as i32 - self.half,
                (index / self.size) as i32 - self.half,
            )
        })
    }

    fn index_of(&self, p: Position) -> usize {
        (p.y + self.half) as usize * self.size + (p.x + self.half) as usize
    }

    /// Out-of-bounds positions read as blocked
    pub fn is_blocked(&self, p: Position) -> bool {
        match self.position_to_index(p) {
            Some(index) => self.blocked[index],
            None => true,
        }
    }

    // ========================================================================
    // RULES
    // ========================================================================

    /// Check a move for the side to move
    pub fn validate_move(&self, target: Position) -> bool {
        match self.turn {
            Turn::Cat => self.cat.neighbors().contains(&target) && !self.is_blocked(target),
            Turn::Catcher => {
                target != self.cat && self.is_valid_position(target) && !self.is_blocked(target)
            }
        }
    }

    /// Apply a move for the side to move and pass the turn.
    ///
    /// This is the only mutating operation. A rejected move leaves the board untouched.
    pub fn make_move(&mut self, target: Position) -> Result<(), BoardError> {
        if !self.validate_move(target) {
            return Err(BoardError::IllegalMove {
                position: target,
                turn: self.turn,
            });
        }

        match self.turn {
            Turn::Cat => self.cat = target,
            Turn::Catcher => {
                let index = self.index_of(target);
                self.blocked[index] = true;
            }
        }
        self.turn = self.turn.opponent();
        Ok(())
    }

    /// Edge check runs first, so a surrounded cat on the edge still wins
    pub fn game_result(&self) -> GameResult {
        if self.cat.x.abs() == self.half || self.cat.y.abs() == self.half {
            return GameResult::CatWins;
        }
        if self.cat.neighbors().iter().all(|&n| self.is_blocked(n)) {
            return GameResult::CatcherWins;
        }
        GameResult::Ongoing
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    /// Layout string over `{'.', '#'}`, without the cat
    pub fn layout_string(&self) -> String {
        self.blocked
            .iter()
            .map(|&b| if b { BLOCKED_CELL } else { EMPTY_CELL })
            .collect()
    }

    /// Layout string with the cat's cell marked `'C'`
    pub fn agent_string(&self) -> String {
        let cat_index = self.index_of(self.cat);
        self.blocked
            .iter()
            .enumerate()
            .map(|(i, &b)| match (i == cat_index, b) {
                (true, _) => CAT_CELL,
                (false, true) => BLOCKED_CELL,
                (false, false) => EMPTY_CELL,
            })
            .collect()
    }
}

/// Side length for a layout of `len` cells
fn side_length(len: usize) -> Result<usize, BoardError> {
    let size = (len as f64).sqrt().round() as usize;
    if size * size != len {
        return Err(BoardError::NotSquare(len));
    }
    if size == 0 || (size - 1) % 4 != 0 {
        return Err(BoardError::InvalidSide(size));
    }
    Ok(size)
}
