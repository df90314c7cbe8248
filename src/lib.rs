// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Skirmish: a deterministic turn & combat engine for two-player grid tactics.
//!
//! This crate provides the rules core of a tactics game, designed for:
//! - Atomic commands that either fully apply or change nothing
//! - Ordered, synchronous event delivery to presentation layers
//! - Bit-exact replay from a configuration and a command list
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     Replay / CLI (recordings)       │
//! ├─────────────────────────────────────┤
//! │     Session (commands, queries)     │
//! ├─────────────────────────────────────┤
//! │  Turns │ Moves │ Combat │ Selection │
//! ├─────────────────────────────────────┤
//! │    Grid, units, event bus           │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod replay;

pub use config::{Deployment, GameConfig};
pub use error::{ActionError, SetupError};

// Re-export key engine types at crate root for convenience
pub use engine::{
    ActionReport, Adjacency, CombatStatistics, Coord, EventBus, GameEvent, Player, Session,
    TurnInfo, TurnPhase, UnitId, UnitStats,
};
