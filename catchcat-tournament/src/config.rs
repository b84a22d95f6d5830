//! Configuration types for competitions
//!
//! Level 4 - Utilities and configuration

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use catchcat_core::InitialLayout;
use serde::{Deserialize, Serialize};

use crate::scoring::TimePenalty;

/// Default wall-clock budget for one move request
pub const DEFAULT_MOVE_TIMEOUT_MS: u64 = 3000;

/// Unit of the processing time agents report, and of measured failure times
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Milliseconds,
    Microseconds,
}

impl TimeUnit {
    /// Express a duration in this unit
    pub fn measure(self, duration: Duration) -> f64 {
        match self {
            TimeUnit::Milliseconds => duration.as_secs_f64() * 1_000.0,
            TimeUnit::Microseconds => duration.as_secs_f64() * 1_000_000.0,
        }
    }
}

/// Settings for a single match
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Wall-clock budget per move request
    pub move_timeout: Duration,
    pub time_unit: TimeUnit,
    pub time_penalty: TimePenalty,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            move_timeout: Duration::from_millis(DEFAULT_MOVE_TIMEOUT_MS),
            time_unit: TimeUnit::default(),
            time_penalty: TimePenalty::default(),
        }
    }
}

impl MatchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.move_timeout = timeout;
        self
    }

    pub fn with_penalty(mut self, penalty: TimePenalty) -> Self {
        self.time_penalty = penalty;
        self
    }
}

/// An external agent executable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Username the agent plays under
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Competition configuration, usually loaded from JSON
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionConfig {
    pub agents: Vec<AgentSpec>,
    /// Side lengths of generated boards (each must be 4k+1)
    pub board_sizes: Vec<usize>,
    /// Generated layouts per board size
    pub layouts_per_size: usize,
    /// Fixed layouts played in addition to the generated ones
    pub layouts: Vec<InitialLayout>,
    pub move_timeout_ms: u64,
    pub time_unit: TimeUnit,
    pub time_penalty: TimePenalty,
    /// Random seed for layout generation (None = entropy)
    pub seed: Option<u64>,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            agents: Vec::new(),
            board_sizes: vec![9, 13],
            layouts_per_size: 2,
            layouts: Vec::new(),
            move_timeout_ms: DEFAULT_MOVE_TIMEOUT_MS,
            time_unit: TimeUnit::default(),
            time_penalty: TimePenalty::default(),
            seed: None,
        }
    }
}

impl CompetitionConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set per-move timeout in milliseconds
    pub fn with_move_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.move_timeout_ms = timeout_ms;
        self
    }

    /// Per-match settings derived from this config
    pub fn match_config(&self) -> MatchConfig {
        MatchConfig {
            move_timeout: Duration::from_millis(self.move_timeout_ms),
            time_unit: self.time_unit,
            time_penalty: self.time_penalty,
        }
    }
}
