//! Unit entities and the registry that owns them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{Coord, EventBus, GameEvent, Grid, Player};
use crate::error::{ActionError, SetupError};

/// Stable identifier for a unit.
///
/// Ids are handed out in spawn order and never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Combat statistics a unit is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum (and starting) health. Must be greater than zero.
    pub max_health: u32,
    /// Attack strength.
    pub attack: u32,
    /// Defense strength, subtracted from incoming attack.
    pub defense: u32,
}

impl UnitStats {
    /// Create a new stat block.
    #[must_use]
    pub const fn new(max_health: u32, attack: u32, defense: u32) -> Self {
        Self {
            max_health,
            attack,
            defense,
        }
    }
}

impl Default for UnitStats {
    fn default() -> Self {
        Self::new(10, 4, 1)
    }
}

/// A single unit on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Unit {
    /// Unique identifier.
    id: UnitId,
    /// Owning player.
    owner: Player,
    /// Cell the unit stands on.
    position: Coord,
    /// Current health, `0..=max_health`.
    health: u32,
    /// Stats fixed at creation.
    stats: UnitStats,
    /// Whether incoming damage is halved.
    defending: bool,
}

impl Unit {
    /// Unique identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Owning player.
    #[must_use]
    pub const fn owner(&self) -> Player {
        self.owner
    }

    /// Cell the unit stands on.
    #[must_use]
    pub const fn position(&self) -> Coord {
        self.position
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.stats.max_health
    }

    /// Attack strength.
    #[must_use]
    pub const fn attack(&self) -> u32 {
        self.stats.attack
    }

    /// Defense strength.
    #[must_use]
    pub const fn defense(&self) -> u32 {
        self.stats.defense
    }

    /// The full stat block.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        self.stats
    }

    /// Whether the unit is defending.
    #[must_use]
    pub const fn is_defending(&self) -> bool {
        self.defending
    }

    /// Whether the unit still has health left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// What happened when damage was applied to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    /// The unit that took damage.
    pub victim: UnitId,
    /// Health before the damage.
    pub health_before: u32,
    /// Health after the damage.
    pub health_after: u32,
    /// Whether this damage killed the unit.
    pub killed: bool,
    /// Where the unit stood when hit.
    pub position: Coord,
}

/// Owns every live unit; the single source of truth for unit state.
///
/// Dead units are removed outright, so any id that is no longer registered
/// is treated as dead by the rest of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitRegistry {
    /// Live units keyed by id.
    units: BTreeMap<UnitId, Unit>,
    /// Next id to hand out.
    next_id: u32,
}

impl UnitRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a unit and place it on the grid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStats` if `max_health` is zero, and `Placement` if the
    /// grid rejects the cell. Nothing is created on error.
    pub fn spawn(
        &mut self,
        grid: &mut Grid,
        owner: Player,
        position: Coord,
        stats: UnitStats,
    ) -> Result<UnitId, SetupError> {
        if stats.max_health == 0 {
            return Err(SetupError::InvalidStats {
                reason: "max_health must be greater than zero",
            });
        }

        let id = UnitId(self.next_id);
        grid.place(id, position)
            .map_err(|source| SetupError::Placement { position, source })?;

        self.next_id += 1;
        self.units.insert(
            id,
            Unit {
                id,
                owner,
                position,
                health: stats.max_health,
                stats,
                defending: false,
            },
        );
        debug!(unit = %id, %owner, %position, "spawned unit");
        Ok(id)
    }

    /// Get a live unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Look up a live unit, failing with `UnknownUnit`.
    pub(crate) fn require(&self, id: UnitId) -> Result<&Unit, ActionError> {
        self.units.get(&id).ok_or(ActionError::UnknownUnit(id))
    }

    /// Check whether a unit is registered and has health left.
    #[must_use]
    pub fn is_alive(&self, id: UnitId) -> bool {
        self.units.get(&id).is_some_and(Unit::is_alive)
    }

    /// Ids of a player's live units, in ascending id order.
    #[must_use]
    pub fn units_of(&self, player: Player) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|unit| unit.owner == player)
            .map(Unit::id)
            .collect()
    }

    /// Number of live units a player has.
    #[must_use]
    pub fn live_count(&self, player: Player) -> usize {
        self.units.values().filter(|unit| unit.owner == player).count()
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if no units are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Iterate over live units in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    /// Set or clear a unit's defending flag.
    ///
    /// Returns `true` if the flag changed.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit` if the unit is not alive.
    pub fn set_defending(&mut self, id: UnitId, defending: bool) -> Result<bool, ActionError> {
        let unit = self.units.get_mut(&id).ok_or(ActionError::UnknownUnit(id))?;
        let changed = unit.defending != defending;
        unit.defending = defending;
        Ok(changed)
    }

    /// Clear the defending flag on all of a player's units.
    ///
    /// Returns the ids whose flag was actually cleared.
    pub fn clear_defending(&mut self, player: Player) -> Vec<UnitId> {
        self.units
            .values_mut()
            .filter(|unit| unit.owner == player && unit.defending)
            .map(|unit| {
                unit.defending = false;
                unit.id
            })
            .collect()
    }

    /// Record a unit's new cell after the grid has moved it.
    pub(crate) fn set_position(&mut self, id: UnitId, position: Coord) -> Result<(), ActionError> {
        let unit = self.units.get_mut(&id).ok_or(ActionError::UnknownUnit(id))?;
        unit.position = position;
        Ok(())
    }

    /// Reduce a unit's health.
    ///
    /// Health saturates at zero. When it crosses from positive to zero the unit
    /// is taken off the grid, dropped from the registry and `UnitKilled` is
    /// emitted, all before this returns.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit` if the victim is not alive. Nothing changes on error.
    pub fn apply_damage(
        &mut self,
        grid: &mut Grid,
        events: &mut EventBus,
        attacker: Option<UnitId>,
        victim: UnitId,
        amount: u32,
    ) -> Result<DamageReport, ActionError> {
        let unit = self.units.get_mut(&victim).ok_or(ActionError::UnknownUnit(victim))?;

        let health_before = unit.health;
        unit.health = unit.health.saturating_sub(amount);
        let report = DamageReport {
            victim,
            health_before,
            health_after: unit.health,
            killed: health_before > 0 && unit.health == 0,
            position: unit.position,
        };

        if report.killed {
            grid.remove(victim);
            self.units.remove(&victim);
            debug!(unit = %victim, position = %report.position, "unit destroyed");
            events.emit(GameEvent::UnitKilled { attacker, victim });
        }

        Ok(report)
    }
}
