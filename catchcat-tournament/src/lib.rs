//! Catch-the-Cat Tournament - Competitions between external agents
//!
//! This crate provides competition infrastructure:
//! - Agent protocol with bounded, killable move requests
//! - Match play between a cat and a catcher
//! - Time penalties, score normalization and ranking
//! - Competition driver over every ordered pairing and layout
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_competition (orchestration)
//! - Level 2: play_match, prepare_layouts (phases)
//! - Level 3: request_move_bounded, aggregate_scores (steps)
//! - Level 4: utilities, configuration

mod agent;
mod config;
mod match_play;
mod scoring;
mod tournament;

pub use agent::{
    parse_agent_output, request_move_bounded, Agent, AgentMove, MoveRequest, MoveResponse,
    ProcessAgent,
};
pub use config::{AgentSpec, CompetitionConfig, MatchConfig, TimeUnit, DEFAULT_MOVE_TIMEOUT_MS};
pub use match_play::{play_match, Participant};
pub use scoring::{aggregate_scores, normalize, rank_scores, split_move_score, TimePenalty};
pub use tournament::{
    create_rng, match_count, participants_from_config, prepare_layouts, run_competition,
};
