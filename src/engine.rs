//! Turn & combat engine.
//!
//! Implements the rules of a two-player grid skirmish:
//! - Grid with walkable and blocked cells, one unit per cell
//! - Unit registry with health, attack, defense and a defending stance
//! - Move/attack classification for a unit entering a cell
//! - Combat with advance-on-kill and elimination
//! - Turn order with a per-turn action budget
//! - Single-unit selection and a synchronous event bus

mod combat;
mod events;
mod grid;
pub mod invariants;
mod movement;
mod player;
mod selection;
mod session;
mod turn;
mod unit;

pub use combat::{
    mitigated_damage, raw_damage, CombatOutcome, CombatResolver, CombatStatistics,
    DEFENDING_MITIGATION_DIVISOR,
};
pub use events::{EventBus, EventListener, GameEvent, ListenerId, DEFAULT_JOURNAL_LIMIT};
pub use grid::{Adjacency, Coord, Grid, Terrain};
pub use movement::{Action, ActionReport, MoveEvaluator};
pub use player::{PerPlayer, Player};
pub use selection::Selection;
pub use session::Session;
pub use turn::{TurnInfo, TurnPhase, TurnStateMachine};
pub use unit::{DamageReport, Unit, UnitId, UnitRegistry, UnitStats};
