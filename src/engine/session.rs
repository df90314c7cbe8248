//! A single match: every engine component under one owner.
//!
//! The session is the command surface presentation layers talk to. Each
//! command runs to completion before returning: validate, mutate the grid and
//! registry, resolve combat, update turn state, then emit events. A rejected
//! command changes nothing and emits nothing.

use std::mem;

use tracing::{debug, info};

use crate::config::GameConfig;
use crate::engine::invariants::assert_invariants;
use crate::engine::{
    ActionReport, CombatResolver, CombatStatistics, Coord, EventBus, EventListener, GameEvent,
    Grid, ListenerId, MoveEvaluator, Player, Selection, Terrain, TurnInfo, TurnPhase,
    TurnStateMachine, Unit, UnitId, UnitRegistry,
};
use crate::error::{ActionError, SetupError};

/// One match between two players.
#[derive(Debug)]
pub struct Session {
    /// Configuration the match was built from.
    config: GameConfig,
    /// Terrain and occupancy.
    grid: Grid,
    /// Live units.
    units: UnitRegistry,
    /// Move/attack classification.
    evaluator: MoveEvaluator,
    /// Attack resolution and statistics.
    combat: CombatResolver,
    /// Turn order and action budget.
    turns: TurnStateMachine,
    /// The active unit.
    selection: Selection,
    /// Event delivery and journal.
    events: EventBus,
}

impl Session {
    /// Lay out the board and spawn the roster without starting play.
    ///
    /// Listeners subscribed before [`Session::start`] see the opening
    /// `TurnStart`.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or `Deployment` if a roster entry cannot
    /// be placed.
    pub fn build(config: GameConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let mut grid = Grid::new(config.grid_width, config.grid_height).ok_or(
            SetupError::InvalidDimensions {
                width: config.grid_width,
                height: config.grid_height,
            },
        )?;
        for &cell in &config.blocked {
            if !grid.set_terrain(cell, Terrain::Blocked) {
                return Err(SetupError::BlockedCell(cell));
            }
        }

        let mut units = UnitRegistry::new();
        for (index, deployment) in config.roster.iter().enumerate() {
            units
                .spawn(
                    &mut grid,
                    deployment.player,
                    deployment.position,
                    deployment.stats,
                )
                .map_err(|source| SetupError::Deployment {
                    index,
                    source: Box::new(source),
                })?;
        }

        debug!(
            width = config.grid_width,
            height = config.grid_height,
            units = units.len(),
            "session built"
        );

        Ok(Self {
            grid,
            units,
            evaluator: MoveEvaluator::new(config.adjacency).with_move_range(config.move_range),
            combat: CombatResolver::new(config.adjacency),
            turns: TurnStateMachine::new(config.starting_player, config.max_actions_per_turn),
            selection: Selection::new(),
            events: EventBus::with_journal_limit(config.journal_limit),
            config,
        })
    }

    /// Begin the first turn. Calling it again is a no-op.
    pub fn start(&mut self) {
        self.turns.start(&mut self.events);
    }

    /// Build and start a session.
    ///
    /// # Errors
    ///
    /// As [`Session::build`].
    pub fn new(config: GameConfig) -> Result<Self, SetupError> {
        let mut session = Self::build(config)?;
        session.start();
        Ok(session)
    }

    /// Throw the current match away and start a new one.
    ///
    /// Listeners stay subscribed and see the old selection cleared before
    /// the new match starts. The event journal and combat statistics start
    /// over. On error the current match is left untouched.
    ///
    /// # Errors
    ///
    /// As [`Session::build`].
    pub fn reset_game(&mut self, config: GameConfig) -> Result<(), SetupError> {
        let mut fresh = Self::build(config)?;
        self.selection.clear(&mut self.events);
        fresh.events = mem::take(&mut self.events);
        fresh.events.drain();
        fresh.events.set_journal_limit(fresh.config.journal_limit);
        *self = fresh;
        info!("game reset");
        self.start();
        assert_invariants(self);
        Ok(())
    }

    // --- Commands ---

    /// Make a unit the selection.
    ///
    /// Only a unit that could act right now may be selected. Returns `true`
    /// if the selection changed.
    ///
    /// # Errors
    ///
    /// Any error from [`TurnStateMachine::check_can_act`].
    pub fn try_select(&mut self, unit: UnitId) -> Result<bool, ActionError> {
        self.turns.check_can_act(&self.units, unit)?;
        let changed = self.selection.select(unit, &mut self.events);
        self.finish_command();
        Ok(changed)
    }

    /// Deselect a unit if it is the selection.
    pub fn try_deselect(&mut self, unit: UnitId) -> bool {
        let changed = self.selection.deselect(unit, &mut self.events);
        self.finish_command();
        changed
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear(&mut self.events);
        self.finish_command();
        changed
    }

    /// Move a unit onto a cell, or attack the enemy standing there.
    ///
    /// Charges one action unless the attack ended the game.
    ///
    /// # Errors
    ///
    /// Any turn error from [`TurnStateMachine::check_can_act`], or any
    /// classification error from [`MoveEvaluator::classify`]. Nothing changes
    /// on error.
    pub fn try_act(&mut self, unit: UnitId, target: Coord) -> Result<ActionReport, ActionError> {
        self.turns.check_can_act(&self.units, unit)?;
        let report = self.evaluator.evaluate(
            &mut self.grid,
            &mut self.units,
            &mut self.combat,
            &mut self.events,
            unit,
            target,
        )?;

        if matches!(report, ActionReport::Attacked(_)) {
            self.combat
                .check_eliminations(&self.units, &mut self.turns, &mut self.events);
        }
        if !self.turns.is_over() {
            self.turns.consume_action(&mut self.units, &mut self.events)?;
        }

        self.finish_command();
        Ok(report)
    }

    /// Put a unit in a defensive stance until its owner's next turn.
    ///
    /// Incoming damage is halved while defending. Costs one action.
    ///
    /// # Errors
    ///
    /// Any error from [`TurnStateMachine::check_can_act`].
    pub fn try_defend(&mut self, unit: UnitId) -> Result<ActionReport, ActionError> {
        self.turns.check_can_act(&self.units, unit)?;
        if self.units.set_defending(unit, true)? {
            self.events.emit(GameEvent::DefendingChanged {
                unit,
                defending: true,
            });
        }
        debug!(%unit, "unit defending");
        self.turns.consume_action(&mut self.units, &mut self.events)?;

        self.finish_command();
        Ok(ActionReport::Defended { unit })
    }

    /// End the active player's turn without spending the rest of the budget.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` or `GameOver`.
    pub fn end_turn_early(&mut self) -> Result<(), ActionError> {
        self.turns.end_turn_early(&mut self.units, &mut self.events)?;
        self.finish_command();
        Ok(())
    }

    /// Zero the combat statistics.
    pub fn reset_statistics(&mut self) {
        self.combat.reset_statistics();
    }

    /// Drop a selection the active player can no longer use, then self-check.
    fn finish_command(&mut self) {
        if let Some(selected) = self.selection.current() {
            let usable = self
                .units
                .get(selected)
                .is_some_and(|unit| unit.owner() == self.turns.current_player());
            if !usable {
                self.selection.deselect(selected, &mut self.events);
            }
        }
        assert_invariants(self);
    }

    // --- Queries ---

    /// Whose turn it is and how much of the budget is left.
    #[must_use]
    pub const fn turn_info(&self) -> TurnInfo {
        self.turns.info()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.turns.phase()
    }

    /// Live units a player has left.
    #[must_use]
    pub fn remaining_units(&self, player: Player) -> usize {
        self.units.live_count(player)
    }

    /// Whether a player has been eliminated.
    #[must_use]
    pub fn is_eliminated(&self, player: Player) -> bool {
        self.turns.is_eliminated(player)
    }

    /// The surviving player once the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        self.turns.eliminated_player().map(Player::other)
    }

    /// Damage an attack would deal right now.
    ///
    /// # Errors
    ///
    /// As [`CombatResolver::forecast`].
    pub fn forecast_attack(&self, attacker: UnitId, defender: UnitId) -> Result<u32, ActionError> {
        self.combat.forecast(&self.units, attacker, defender)
    }

    /// Combat counters since the start or the last reset.
    #[must_use]
    pub const fn combat_statistics(&self) -> &CombatStatistics {
        self.combat.statistics()
    }

    /// The selected unit, if any.
    #[must_use]
    pub const fn current_selection(&self) -> Option<UnitId> {
        self.selection.current()
    }

    /// A live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// All live units.
    #[must_use]
    pub const fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// The board.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The turn machine.
    #[must_use]
    pub const fn turns(&self) -> &TurnStateMachine {
        &self.turns
    }

    /// The event bus, for reading the journal.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Register a listener for every event from now on.
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Take the event journal, leaving it empty.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    /// Change how many events the journal keeps. See
    /// [`EventBus::with_journal_limit`].
    pub fn set_journal_limit(&mut self, limit: Option<usize>) {
        self.events.set_journal_limit(limit);
    }

    /// Configuration the match was built from.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }
}
