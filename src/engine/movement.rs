//! Classification and execution of a unit's intent to enter a cell.

use serde::Serialize;
use tracing::debug;

use crate::engine::{
    Adjacency, CombatOutcome, CombatResolver, Coord, EventBus, GameEvent, Grid, UnitId,
    UnitRegistry,
};
use crate::error::ActionError;

/// What a request to enter a cell amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Step onto an empty cell.
    Move {
        /// The moving unit.
        unit: UnitId,
        /// Current cell.
        from: Coord,
        /// Destination cell.
        to: Coord,
    },
    /// Strike the enemy standing on the cell.
    Attack {
        /// The attacking unit.
        attacker: UnitId,
        /// The unit being attacked.
        defender: UnitId,
        /// The defender's cell.
        target: Coord,
    },
}

/// What an executed action did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionReport {
    /// A unit moved onto an empty cell.
    Moved {
        /// The unit that moved.
        unit: UnitId,
        /// Cell it left.
        from: Coord,
        /// Cell it entered.
        to: Coord,
    },
    /// A unit attacked an enemy.
    Attacked(CombatOutcome),
    /// A unit took up a defensive stance.
    Defended {
        /// The defending unit.
        unit: UnitId,
    },
}

/// Decides whether a target cell means move, attack or nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveEvaluator {
    /// Which cells count as within attack reach.
    adjacency: Adjacency,
    /// Furthest move in steps, unlimited if `None`.
    move_range: Option<u32>,
}

impl MoveEvaluator {
    /// Create an evaluator using the given reach rule and unlimited moves.
    #[must_use]
    pub const fn new(adjacency: Adjacency) -> Self {
        Self {
            adjacency,
            move_range: None,
        }
    }

    /// Limit moves to `range` steps, measured with the reach rule.
    #[must_use]
    pub const fn with_move_range(mut self, range: Option<u32>) -> Self {
        self.move_range = range;
        self
    }

    /// Furthest move in steps, if limited.
    #[must_use]
    pub const fn move_range(&self) -> Option<u32> {
        self.move_range
    }

    /// Classify a request without changing anything.
    ///
    /// Rules, in order: the target must be in bounds and walkable; an empty
    /// target within the move range is a move; a friendly occupant rejects;
    /// an enemy one step away is an attack; anything else is out of range.
    /// Moves jump straight to the target, so terrain in between is ignored.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit`, `OutOfBounds`, `NonWalkable`,
    /// `FriendlyOccupied` or `OutOfRange`.
    pub fn classify(
        &self,
        grid: &Grid,
        units: &UnitRegistry,
        unit: UnitId,
        target: Coord,
    ) -> Result<Action, ActionError> {
        let mover = units.require(unit)?;

        if !grid.in_bounds(target) {
            return Err(ActionError::OutOfBounds(target));
        }
        if !grid.is_walkable(target) {
            return Err(ActionError::NonWalkable(target));
        }

        let Some(occupant) = grid.occupant_at(target) else {
            let steps = self.adjacency.distance(mover.position(), target);
            if self.move_range.is_some_and(|range| steps > range) {
                return Err(ActionError::OutOfRange(target));
            }
            return Ok(Action::Move {
                unit,
                from: mover.position(),
                to: target,
            });
        };

        let occupant_owner = units.require(occupant)?.owner();
        if occupant_owner == mover.owner() {
            return Err(ActionError::FriendlyOccupied(target));
        }
        if self.adjacency.are_adjacent(mover.position(), target) {
            Ok(Action::Attack {
                attacker: unit,
                defender: occupant,
                target,
            })
        } else {
            Err(ActionError::OutOfRange(target))
        }
    }

    /// Classify a request and carry it out.
    ///
    /// Either the whole action happens or nothing does: on error the grid and
    /// registry are exactly as they were.
    ///
    /// # Errors
    ///
    /// Any error from [`MoveEvaluator::classify`], or from the grid or
    /// combat resolver it delegates to.
    pub fn evaluate(
        &self,
        grid: &mut Grid,
        units: &mut UnitRegistry,
        combat: &mut CombatResolver,
        events: &mut EventBus,
        unit: UnitId,
        target: Coord,
    ) -> Result<ActionReport, ActionError> {
        let action = self.classify(grid, units, unit, target).inspect_err(|err| {
            debug!(%unit, %target, %err, "action rejected");
        })?;

        match action {
            Action::Move { unit, from, to } => {
                grid.relocate(unit, from, to)?;
                units.set_position(unit, to)?;
                debug!(%unit, %from, %to, "unit moved");
                events.emit(GameEvent::UnitMoved { unit, from, to });
                Ok(ActionReport::Moved { unit, from, to })
            }
            Action::Attack {
                attacker, defender, ..
            } => {
                let outcome = combat.resolve(grid, units, events, attacker, defender)?;
                Ok(ActionReport::Attacked(outcome))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Player, Terrain, UnitStats};

    struct Board {
        grid: Grid,
        units: UnitRegistry,
        combat: CombatResolver,
        events: EventBus,
        evaluator: MoveEvaluator,
    }

    impl Board {
        fn new() -> Self {
            let mut grid = Grid::new(6, 6).unwrap();
            grid.set_terrain(Coord::new(3, 3), Terrain::Blocked);
            Self {
                grid,
                units: UnitRegistry::new(),
                combat: CombatResolver::new(Adjacency::Orthogonal),
                events: EventBus::new(),
                evaluator: MoveEvaluator::new(Adjacency::Orthogonal),
            }
        }

        fn spawn(&mut self, owner: Player, at: Coord) -> UnitId {
            self.units
                .spawn(&mut self.grid, owner, at, UnitStats::new(10, 4, 1))
                .unwrap()
        }

        fn classify(&self, unit: UnitId, target: Coord) -> Result<Action, ActionError> {
            self.evaluator.classify(&self.grid, &self.units, unit, target)
        }

        fn evaluate(&mut self, unit: UnitId, target: Coord) -> Result<ActionReport, ActionError> {
            self.evaluator.evaluate(
                &mut self.grid,
                &mut self.units,
                &mut self.combat,
                &mut self.events,
                unit,
                target,
            )
        }
    }

    #[test]
    fn test_classify_rules_in_order() {
        let mut board = Board::new();
        let me = board.spawn(Player::One, Coord::new(2, 2));
        let friend = board.spawn(Player::One, Coord::new(2, 3));
        let enemy = board.spawn(Player::Two, Coord::new(1, 2));
        board.spawn(Player::Two, Coord::new(5, 5));

        assert_eq!(
            board.classify(me, Coord::new(6, 0)),
            Err(ActionError::OutOfBounds(Coord::new(6, 0)))
        );
        assert_eq!(
            board.classify(me, Coord::new(3, 3)),
            Err(ActionError::NonWalkable(Coord::new(3, 3)))
        );
        assert_eq!(
            board.classify(me, Coord::new(2, 1)),
            Ok(Action::Move {
                unit: me,
                from: Coord::new(2, 2),
                to: Coord::new(2, 1)
            })
        );
        assert_eq!(
            board.classify(me, Coord::new(2, 3)),
            Err(ActionError::FriendlyOccupied(Coord::new(2, 3)))
        );
        assert_eq!(
            board.classify(me, Coord::new(2, 2)),
            Err(ActionError::FriendlyOccupied(Coord::new(2, 2)))
        );
        assert_eq!(
            board.classify(me, Coord::new(1, 2)),
            Ok(Action::Attack {
                attacker: me,
                defender: enemy,
                target: Coord::new(1, 2)
            })
        );
        assert_eq!(
            board.classify(me, Coord::new(5, 5)),
            Err(ActionError::OutOfRange(Coord::new(5, 5)))
        );
        assert_eq!(
            board.classify(UnitId(40), Coord::new(0, 0)),
            Err(ActionError::UnknownUnit(UnitId(40)))
        );
        let _ = friend;
    }

    #[test]
    fn test_moves_are_unlimited_by_default() {
        let mut board = Board::new();
        let me = board.spawn(Player::One, Coord::new(0, 0));

        // Straight across the board, past the blocked cell at (3, 3).
        assert_eq!(board.evaluator.move_range(), None);
        assert!(matches!(
            board.classify(me, Coord::new(5, 5)),
            Ok(Action::Move { .. })
        ));
    }

    #[test]
    fn test_move_range_limits_moves_only() {
        let mut board = Board::new();
        board.evaluator = MoveEvaluator::new(Adjacency::Orthogonal).with_move_range(Some(1));
        let me = board.spawn(Player::One, Coord::new(2, 2));
        let enemy = board.spawn(Player::Two, Coord::new(2, 1));

        assert!(matches!(
            board.classify(me, Coord::new(1, 2)),
            Ok(Action::Move { .. })
        ));
        assert_eq!(
            board.classify(me, Coord::new(1, 3)),
            Err(ActionError::OutOfRange(Coord::new(1, 3)))
        );
        assert_eq!(
            board.classify(me, Coord::new(2, 4)),
            Err(ActionError::OutOfRange(Coord::new(2, 4)))
        );
        assert!(matches!(
            board.classify(me, Coord::new(2, 1)),
            Ok(Action::Attack { defender, .. }) if defender == enemy
        ));

        board.evaluator = MoveEvaluator::new(Adjacency::Diagonal).with_move_range(Some(1));
        assert!(matches!(
            board.classify(me, Coord::new(1, 3)),
            Ok(Action::Move { .. })
        ));
    }

    #[test]
    fn test_evaluate_move() {
        let mut board = Board::new();
        let me = board.spawn(Player::One, Coord::new(0, 0));

        let report = board.evaluate(me, Coord::new(1, 0)).unwrap();
        assert_eq!(
            report,
            ActionReport::Moved {
                unit: me,
                from: Coord::new(0, 0),
                to: Coord::new(1, 0)
            }
        );
        assert_eq!(board.units.get(me).unwrap().position(), Coord::new(1, 0));
        assert_eq!(board.grid.occupant_at(Coord::new(1, 0)), Some(me));
        assert_eq!(board.grid.occupant_at(Coord::new(0, 0)), None);
        assert_eq!(
            board.events.history(),
            &[GameEvent::UnitMoved {
                unit: me,
                from: Coord::new(0, 0),
                to: Coord::new(1, 0)
            }]
        );
    }

    #[test]
    fn test_evaluate_attack_delegates_to_combat() {
        let mut board = Board::new();
        let me = board.spawn(Player::One, Coord::new(0, 0));
        let enemy = board.spawn(Player::Two, Coord::new(0, 1));

        let report = board.evaluate(me, Coord::new(0, 1)).unwrap();
        let ActionReport::Attacked(outcome) = report else {
            panic!("expected an attack, got {report:?}");
        };
        assert_eq!(outcome.defender, enemy);
        assert_eq!(outcome.damage, 3);
        assert_eq!(board.combat.statistics().total_combats, 1);
    }

    #[test]
    fn test_rejection_changes_nothing() {
        let mut board = Board::new();
        let me = board.spawn(Player::One, Coord::new(0, 0));
        board.spawn(Player::Two, Coord::new(4, 4));

        let grid = board.grid.clone();
        let units = board.units.clone();
        assert_eq!(
            board.evaluate(me, Coord::new(4, 4)),
            Err(ActionError::OutOfRange(Coord::new(4, 4)))
        );
        assert_eq!(board.grid, grid);
        assert_eq!(board.units, units);
        assert!(board.events.history().is_empty());
    }
}
