//! Combat resolution.
//!
//! Damage is the attacker's attack minus the defender's defense, never below
//! zero. A defending unit halves what gets through. Killing a unit pulls the
//! attacker forward into the vacated cell, so aggressive play gains ground
//! while a failed attack leaves the attacker where it stood.

use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{
    Adjacency, Coord, EventBus, GameEvent, Grid, PerPlayer, Player, TurnStateMachine, UnitId,
    UnitRegistry,
};
use crate::error::ActionError;

/// Divisor applied to damage against a defending unit (one half, rounded down).
pub const DEFENDING_MITIGATION_DIVISOR: u32 = 2;

/// Damage before any defending mitigation.
#[must_use]
pub const fn raw_damage(attack: u32, defense: u32) -> u32 {
    attack.saturating_sub(defense)
}

/// Damage dealt after defending mitigation.
#[must_use]
pub const fn mitigated_damage(attack: u32, defense: u32, defending: bool) -> u32 {
    let raw = raw_damage(attack, defense);
    if defending {
        raw / DEFENDING_MITIGATION_DIVISOR
    } else {
        raw
    }
}

/// Result of one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CombatOutcome {
    /// The attacking unit.
    pub attacker: UnitId,
    /// The defending unit.
    pub defender: UnitId,
    /// Damage dealt after mitigation.
    pub damage: u32,
    /// Defender health after the attack.
    pub defender_health: u32,
    /// Whether the defender was destroyed.
    pub killed: bool,
    /// Cell the attacker advanced into, if the defender was destroyed.
    pub advanced_to: Option<Coord>,
}

/// Running combat counters for a session.
///
/// Counters only grow; they are reset by explicit request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CombatStatistics {
    /// Number of attacks resolved.
    pub total_combats: u64,
    /// Attacks made by each player.
    pub attacks: PerPlayer<u64>,
    /// Total damage dealt by all attacks.
    pub total_damage: u64,
    /// Units destroyed in combat.
    pub units_destroyed: u64,
    /// Attackers that advanced into a vacated cell.
    pub advances: u64,
}

impl CombatStatistics {
    /// Attacks made by one player.
    #[must_use]
    pub fn attacks_by(&self, player: Player) -> u64 {
        self.attacks[player]
    }

    /// Fold one outcome into the counters.
    fn record(&mut self, attacker_owner: Player, outcome: &CombatOutcome) {
        self.total_combats += 1;
        self.attacks[attacker_owner] += 1;
        self.total_damage += u64::from(outcome.damage);
        if outcome.killed {
            self.units_destroyed += 1;
        }
        if outcome.advanced_to.is_some() {
            self.advances += 1;
        }
    }
}

/// Resolves attacks between adjacent enemy units and keeps combat statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombatResolver {
    /// Which cells count as within reach.
    adjacency: Adjacency,
    /// Accumulated counters.
    stats: CombatStatistics,
}

impl CombatResolver {
    /// Create a resolver with empty statistics.
    #[must_use]
    pub fn new(adjacency: Adjacency) -> Self {
        Self {
            adjacency,
            stats: CombatStatistics::default(),
        }
    }

    /// Counters accumulated since creation or the last reset.
    #[must_use]
    pub const fn statistics(&self) -> &CombatStatistics {
        &self.stats
    }

    /// Zero every counter.
    pub fn reset_statistics(&mut self) {
        self.stats = CombatStatistics::default();
    }

    /// Check that `attacker` may attack `defender` and return their owners.
    fn check_engagement(
        &self,
        units: &UnitRegistry,
        attacker: UnitId,
        defender: UnitId,
    ) -> Result<(Player, Coord, Coord), ActionError> {
        let att = units.require(attacker)?;
        let def = units.require(defender)?;
        if att.owner() == def.owner() {
            return Err(ActionError::SameSide { attacker, defender });
        }
        if !self.adjacency.are_adjacent(att.position(), def.position()) {
            return Err(ActionError::NotAdjacent { attacker, defender });
        }
        Ok((att.owner(), att.position(), def.position()))
    }

    /// Damage an attack would deal right now, without resolving it.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`CombatResolver::resolve`].
    pub fn forecast(
        &self,
        units: &UnitRegistry,
        attacker: UnitId,
        defender: UnitId,
    ) -> Result<u32, ActionError> {
        self.check_engagement(units, attacker, defender)?;
        let att = units.require(attacker)?;
        let def = units.require(defender)?;
        Ok(mitigated_damage(att.attack(), def.defense(), def.is_defending()))
    }

    /// Resolve an attack.
    ///
    /// Emits `CombatOccurred`, then `UnitKilled` and `UnitAdvanced` if the
    /// defender dies. Elimination is checked separately by
    /// [`CombatResolver::check_eliminations`].
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit` if either unit is dead, `SameSide` for allies and
    /// `NotAdjacent` if the defender is out of reach. Nothing changes on error.
    pub fn resolve(
        &mut self,
        grid: &mut Grid,
        units: &mut UnitRegistry,
        events: &mut EventBus,
        attacker: UnitId,
        defender: UnitId,
    ) -> Result<CombatOutcome, ActionError> {
        let (owner, from, target) = self.check_engagement(units, attacker, defender)?;
        let damage = self.forecast(units, attacker, defender)?;

        events.emit(GameEvent::CombatOccurred {
            attacker,
            defender,
            damage,
        });
        let report = units.apply_damage(grid, events, Some(attacker), defender, damage)?;

        let mut advanced_to = None;
        if report.killed {
            grid.relocate(attacker, from, target)?;
            units.set_position(attacker, target)?;
            advanced_to = Some(target);
            events.emit(GameEvent::UnitAdvanced {
                unit: attacker,
                to: target,
            });
        }

        let outcome = CombatOutcome {
            attacker,
            defender,
            damage,
            defender_health: report.health_after,
            killed: report.killed,
            advanced_to,
        };
        self.stats.record(owner, &outcome);
        debug!(
            %attacker,
            %defender,
            damage,
            killed = outcome.killed,
            "combat resolved"
        );
        Ok(outcome)
    }

    /// Record any player left without units as eliminated.
    ///
    /// Emits `PlayerEliminated` once per player; players already recorded are
    /// skipped. Returns the players newly eliminated by this call.
    pub fn check_eliminations(
        &self,
        units: &UnitRegistry,
        turns: &mut TurnStateMachine,
        events: &mut EventBus,
    ) -> Vec<Player> {
        let mut newly = Vec::new();
        for player in Player::ALL {
            if units.live_count(player) == 0 && turns.mark_eliminated(player) {
                info!(%player, "player eliminated");
                events.emit(GameEvent::PlayerEliminated { player });
                newly.push(player);
            }
        }
        newly
    }
}

/// Kani formal verification proofs.
///
/// These prove arithmetic safety properties for damage resolution.
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Mitigated damage never exceeds raw damage and never exceeds attack.
    #[kani::proof]
    fn prove_mitigation_bounded() {
        let attack: u32 = kani::any();
        let defense: u32 = kani::any();
        let defending: bool = kani::any();

        let raw = raw_damage(attack, defense);
        let dealt = mitigated_damage(attack, defense, defending);
        assert!(dealt <= raw);
        assert!(raw <= attack);
    }

    /// Health after damage stays within `0..=health_before`.
    #[kani::proof]
    fn prove_health_never_underflows() {
        let health: u32 = kani::any();
        let damage: u32 = kani::any();

        let after = health.saturating_sub(damage);
        assert!(after <= health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::UnitStats;

    struct Arena {
        grid: Grid,
        units: UnitRegistry,
        events: EventBus,
        combat: CombatResolver,
    }

    impl Arena {
        fn new(adjacency: Adjacency) -> Self {
            Self {
                grid: Grid::new(8, 8).unwrap(),
                units: UnitRegistry::new(),
                events: EventBus::new(),
                combat: CombatResolver::new(adjacency),
            }
        }

        fn spawn(&mut self, owner: Player, at: Coord, stats: UnitStats) -> UnitId {
            self.units.spawn(&mut self.grid, owner, at, stats).unwrap()
        }

        fn attack(&mut self, attacker: UnitId, defender: UnitId) -> Result<CombatOutcome, ActionError> {
            self.combat
                .resolve(&mut self.grid, &mut self.units, &mut self.events, attacker, defender)
        }
    }

    #[test]
    fn test_damage_formula() {
        assert_eq!(raw_damage(10, 2), 8);
        assert_eq!(raw_damage(2, 10), 0);
        assert_eq!(mitigated_damage(10, 2, false), 8);
        assert_eq!(mitigated_damage(10, 2, true), 4);
        assert_eq!(mitigated_damage(9, 2, true), 3);
        assert_eq!(mitigated_damage(3, 2, true), 0);
    }

    #[test]
    fn test_attack_survived_attacker_stays() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(2, 2), UnitStats::new(10, 6, 0));
        let d = arena.spawn(Player::Two, Coord::new(3, 2), UnitStats::new(10, 0, 2));

        let outcome = arena.attack(a, d).unwrap();
        assert_eq!(outcome.damage, 4);
        assert_eq!(outcome.defender_health, 6);
        assert!(!outcome.killed);
        assert_eq!(outcome.advanced_to, None);
        assert_eq!(arena.units.get(a).unwrap().position(), Coord::new(2, 2));
        assert_eq!(
            arena.events.history(),
            &[GameEvent::CombatOccurred {
                attacker: a,
                defender: d,
                damage: 4
            }]
        );
    }

    #[test]
    fn test_defending_halves_damage() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(2, 2), UnitStats::new(10, 10, 0));
        let d = arena.spawn(Player::Two, Coord::new(2, 3), UnitStats::new(20, 0, 2));
        arena.units.set_defending(d, true).unwrap();

        let outcome = arena.attack(a, d).unwrap();
        assert_eq!(outcome.damage, 4);
        assert_eq!(arena.units.get(d).unwrap().health(), 16);
    }

    #[test]
    fn test_kill_and_advance() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(2, 2), UnitStats::new(10, 10, 0));
        let d = arena.spawn(Player::Two, Coord::new(3, 2), UnitStats::new(5, 0, 2));

        let outcome = arena.attack(a, d).unwrap();
        assert!(outcome.killed);
        assert_eq!(outcome.advanced_to, Some(Coord::new(3, 2)));
        assert_eq!(arena.units.get(a).unwrap().position(), Coord::new(3, 2));
        assert_eq!(arena.grid.occupant_at(Coord::new(3, 2)), Some(a));
        assert_eq!(arena.grid.occupant_at(Coord::new(2, 2)), None);
        assert!(!arena.units.is_alive(d));

        assert_eq!(
            arena.events.history(),
            &[
                GameEvent::CombatOccurred {
                    attacker: a,
                    defender: d,
                    damage: 8
                },
                GameEvent::UnitKilled {
                    attacker: Some(a),
                    victim: d
                },
                GameEvent::UnitAdvanced {
                    unit: a,
                    to: Coord::new(3, 2)
                },
            ]
        );

        let stats = arena.combat.statistics();
        assert_eq!(stats.total_combats, 1);
        assert_eq!(stats.attacks_by(Player::One), 1);
        assert_eq!(stats.attacks_by(Player::Two), 0);
        assert_eq!(stats.total_damage, 8);
        assert_eq!(stats.units_destroyed, 1);
        assert_eq!(stats.advances, 1);
    }

    #[test]
    fn test_preconditions_leave_state_untouched() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(0, 0), UnitStats::default());
        let ally = arena.spawn(Player::One, Coord::new(1, 0), UnitStats::default());
        let far = arena.spawn(Player::Two, Coord::new(5, 5), UnitStats::default());
        let diagonal = arena.spawn(Player::Two, Coord::new(1, 1), UnitStats::default());

        let units = arena.units.clone();
        let grid = arena.grid.clone();

        assert_eq!(
            arena.attack(a, ally),
            Err(ActionError::SameSide {
                attacker: a,
                defender: ally
            })
        );
        assert_eq!(
            arena.attack(a, far),
            Err(ActionError::NotAdjacent {
                attacker: a,
                defender: far
            })
        );
        assert_eq!(
            arena.attack(a, diagonal),
            Err(ActionError::NotAdjacent {
                attacker: a,
                defender: diagonal
            })
        );
        assert_eq!(
            arena.attack(a, UnitId(99)),
            Err(ActionError::UnknownUnit(UnitId(99)))
        );

        assert_eq!(arena.units, units);
        assert_eq!(arena.grid, grid);
        assert!(arena.events.history().is_empty());
        assert_eq!(arena.combat.statistics().total_combats, 0);
    }

    #[test]
    fn test_diagonal_adjacency_allows_corner_attack() {
        let mut arena = Arena::new(Adjacency::Diagonal);
        let a = arena.spawn(Player::One, Coord::new(0, 0), UnitStats::new(10, 5, 0));
        let d = arena.spawn(Player::Two, Coord::new(1, 1), UnitStats::new(10, 0, 0));
        assert_eq!(arena.attack(a, d).unwrap().damage, 5);
    }

    #[test]
    fn test_forecast_matches_resolve() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(4, 4), UnitStats::new(10, 7, 0));
        let d = arena.spawn(Player::Two, Coord::new(4, 5), UnitStats::new(10, 0, 3));
        let forecast = arena.combat.forecast(&arena.units, a, d).unwrap();
        assert_eq!(arena.attack(a, d).unwrap().damage, forecast);
    }

    #[test]
    fn test_eliminations_fire_once() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(0, 0), UnitStats::new(10, 20, 0));
        let d = arena.spawn(Player::Two, Coord::new(0, 1), UnitStats::new(5, 0, 0));
        let mut turns = TurnStateMachine::new(Player::One, 4);

        arena.attack(a, d).unwrap();
        let newly = arena
            .combat
            .check_eliminations(&arena.units, &mut turns, &mut arena.events);
        assert_eq!(newly, vec![Player::Two]);

        let again = arena
            .combat
            .check_eliminations(&arena.units, &mut turns, &mut arena.events);
        assert!(again.is_empty());

        let count = arena
            .events
            .history()
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerEliminated { .. }))
            .count();
        assert_eq!(count, 1);
        assert!(turns.is_eliminated(Player::Two));
    }

    #[test]
    fn test_reset_statistics() {
        let mut arena = Arena::new(Adjacency::Orthogonal);
        let a = arena.spawn(Player::One, Coord::new(0, 0), UnitStats::new(10, 3, 0));
        let d = arena.spawn(Player::Two, Coord::new(0, 1), UnitStats::new(10, 0, 0));
        arena.attack(a, d).unwrap();
        assert_eq!(arena.combat.statistics().total_damage, 3);

        arena.combat.reset_statistics();
        assert_eq!(*arena.combat.statistics(), CombatStatistics::default());
    }
}
