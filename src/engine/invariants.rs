//! Session invariants - sanity checks that detect engine bugs.
//!
//! No sequence of public commands should ever violate these. They are not
//! game rules; a violation means the engine itself is wrong.

use std::fmt;

use crate::engine::{Player, Session};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all session invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(session: &Session) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut violation = |message: String| violations.push(InvariantViolation { message });

    let grid = session.grid();
    let units = session.units();

    // Registry -> grid
    for unit in units.iter() {
        match grid.occupant_at(unit.position()) {
            Some(id) if id == unit.id() => {}
            other => violation(format!(
                "Unit {} records position {} but the cell holds {other:?}",
                unit.id(),
                unit.position()
            )),
        }
        if unit.health() == 0 || unit.health() > unit.max_health() {
            violation(format!(
                "Unit {} has health {} outside 1..={}",
                unit.id(),
                unit.health(),
                unit.max_health()
            ));
        }
    }

    // Grid -> registry
    for (coord, id) in grid.occupied_cells() {
        match units.get(id) {
            Some(unit) if unit.position() == coord => {}
            Some(unit) => violation(format!(
                "Cell {coord} holds unit {id} which records position {}",
                unit.position()
            )),
            None => violation(format!("Cell {coord} holds dead unit {id}")),
        }
        if !grid.is_walkable(coord) {
            violation(format!("Unit {id} stands on blocked cell {coord}"));
        }
    }
    if grid.occupied_count() != units.len() {
        violation(format!(
            "Grid holds {} units but the registry has {}",
            grid.occupied_count(),
            units.len()
        ));
    }

    // Turn budget
    let turns = session.turns();
    if turns.actions_used() >= turns.max_actions() {
        violation(format!(
            "{} has used {} of {} actions without the turn ending",
            turns.current_player(),
            turns.actions_used(),
            turns.max_actions()
        ));
    }

    // Elimination consistency
    for player in Player::ALL {
        let live = units.live_count(player);
        if turns.is_eliminated(player) && live > 0 {
            violation(format!("Eliminated {player} still has {live} units"));
        }
        if turns.is_started() && live == 0 && !turns.is_eliminated(player) {
            violation(format!("{player} has no units but is not eliminated"));
        }
    }

    // Selection
    if let Some(selected) = session.current_selection() {
        match units.get(selected) {
            None => violation(format!("Dead unit {selected} is still selected")),
            Some(unit) if unit.owner() != turns.current_player() => violation(format!(
                "Selected unit {selected} belongs to {} during {}'s turn",
                unit.owner(),
                turns.current_player()
            )),
            Some(_) => {}
        }
    }

    violations
}

/// Assert all session invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(session: &Session) {
    let violations = check_invariants(session);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Session invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_session: &Session) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Deployment, GameConfig};
    use crate::engine::{Coord, UnitStats};

    #[test]
    fn test_fresh_session_is_valid() {
        let session = Session::new(GameConfig::default()).unwrap();
        assert!(check_invariants(&session).is_empty());
    }

    #[test]
    fn test_unstarted_session_is_valid() {
        let session = Session::build(GameConfig::default()).unwrap();
        assert!(check_invariants(&session).is_empty());
    }

    #[test]
    fn test_valid_after_kill() {
        let config = GameConfig::empty(3, 3)
            .with_unit(Deployment::new(Player::One, 0, 0).with_stats(UnitStats::new(10, 10, 2)))
            .with_unit(Deployment::new(Player::Two, 1, 0).with_stats(UnitStats::new(5, 1, 2)))
            .with_unit(Deployment::new(Player::Two, 2, 2));
        let mut session = Session::new(config).unwrap();
        let attacker = session.units().units_of(Player::One)[0];

        session.try_act(attacker, Coord::new(1, 0)).unwrap();
        assert!(check_invariants(&session).is_empty());
    }

    #[test]
    fn test_violation_display() {
        let violation = InvariantViolation {
            message: "Cell (0, 0) holds dead unit #3".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "Invariant violation: Cell (0, 0) holds dead unit #3"
        );
    }
}
