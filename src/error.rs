//! Error types for game setup and player actions.

use std::io;

use thiserror::Error;

use crate::engine::{Coord, Player, UnitId};

/// Why a player action was rejected.
///
/// A rejected action leaves the game exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Target cell lies outside the grid.
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Coord),
    /// Target cell is blocked terrain.
    #[error("cell {0} is not walkable")]
    NonWalkable(Coord),
    /// Target cell holds a unit of the acting player.
    #[error("cell {0} is occupied by a friendly unit")]
    FriendlyOccupied(Coord),
    /// Target cell is an enemy that is not adjacent, or an empty cell beyond
    /// the move range.
    #[error("cell {0} is out of range")]
    OutOfRange(Coord),
    /// The grid refused to place a unit on an occupied cell.
    #[error("cell {0} is already occupied")]
    OccupancyConflict(Coord),
    /// The unit does not belong to the player whose turn it is.
    #[error("unit {unit} belongs to {owner}, but it is {current}'s turn")]
    WrongTurn {
        /// The unit that tried to act.
        unit: UnitId,
        /// Its owner.
        owner: Player,
        /// The player whose turn it is.
        current: Player,
    },
    /// The active player has used their whole action budget.
    #[error("{0} has no actions remaining this turn")]
    NoActionsRemaining(Player),
    /// The game has ended.
    #[error("the game is over: {0} was eliminated")]
    GameOver(Player),
    /// No live unit has this id.
    #[error("no live unit {0}")]
    UnknownUnit(UnitId),
    /// Actions were attempted before the first turn began.
    #[error("the game has not started")]
    NotStarted,
    /// The defender is outside the attacker's reach.
    #[error("unit {defender} is not adjacent to unit {attacker}")]
    NotAdjacent {
        /// The attacking unit.
        attacker: UnitId,
        /// The unit it tried to hit.
        defender: UnitId,
    },
    /// Both units belong to the same player.
    #[error("units {attacker} and {defender} are on the same side")]
    SameSide {
        /// The attacking unit.
        attacker: UnitId,
        /// The unit it tried to hit.
        defender: UnitId,
    },
}

/// Why a game could not be built from its configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Grid width or height is zero.
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// Action budget is zero.
    #[error("max_actions_per_turn must be at least 1")]
    InvalidActionBudget,
    /// Move range is zero.
    #[error("move_range must be at least 1 when set")]
    InvalidMoveRange,
    /// Unit stats are unusable.
    #[error("invalid unit stats: {reason}")]
    InvalidStats {
        /// What is wrong with them.
        reason: &'static str,
    },
    /// A unit could not be placed.
    #[error("cannot place unit at {position}: {source}")]
    Placement {
        /// The requested cell.
        position: Coord,
        /// The grid's objection.
        source: ActionError,
    },
    /// A roster entry could not be deployed.
    #[error("roster entry {index}: {source}")]
    Deployment {
        /// Zero-based position in the roster.
        index: usize,
        /// What went wrong.
        source: Box<SetupError>,
    },
    /// A player starts with no units.
    #[error("{0} has no units in the roster")]
    EmptyRoster(Player),
    /// A blocked cell lies outside the grid.
    #[error("blocked cell {0} is outside the grid")]
    BlockedCell(Coord),
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A configuration file is malformed.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
