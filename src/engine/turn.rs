//! Turn order and the per-turn action budget.

use serde::Serialize;
use tracing::info;

use crate::engine::{EventBus, GameEvent, PerPlayer, Player, UnitId, UnitRegistry};
use crate::error::ActionError;

/// Where the turn machine is in the life of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    /// Units are being placed; no one may act yet.
    Setup,
    /// The steady state: waiting for the given player to act.
    AwaitingAction {
        /// The player whose turn it is.
        player: Player,
    },
    /// A player has been eliminated; no further actions are accepted.
    GameOver {
        /// The eliminated player.
        loser: Player,
    },
}

/// Snapshot of the turn state for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnInfo {
    /// Player whose turn it is.
    pub player: Player,
    /// Actions spent this turn.
    pub actions_used: u32,
    /// Actions left this turn.
    pub actions_remaining: u32,
    /// Action budget per turn.
    pub max_actions: u32,
    /// Turn counter, starting at 1.
    pub turn_number: u32,
}

/// Tracks whose turn it is and how many actions they have left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnStateMachine {
    /// Whether `start` has been called.
    started: bool,
    /// Player whose turn it is.
    current: Player,
    /// Actions spent this turn.
    actions_used: u32,
    /// Action budget per turn.
    max_actions: u32,
    /// Turn counter.
    turn_number: u32,
    /// Players recorded as eliminated.
    eliminated: PerPlayer<bool>,
}

impl TurnStateMachine {
    /// Create a machine in the setup phase.
    ///
    /// A budget of zero is raised to one.
    #[must_use]
    pub fn new(starting_player: Player, max_actions: u32) -> Self {
        Self {
            started: false,
            current: starting_player,
            actions_used: 0,
            max_actions: max_actions.max(1),
            turn_number: 1,
            eliminated: PerPlayer::default(),
        }
    }

    /// Leave setup and begin the first turn.
    ///
    /// Emits `TurnStart` for the starting player. Calling it again is a no-op.
    pub fn start(&mut self, events: &mut EventBus) {
        if self.started {
            return;
        }
        self.started = true;
        info!(player = %self.current, turn = self.turn_number, "game started");
        events.emit(GameEvent::TurnStart {
            player: self.current,
        });
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        if let Some(loser) = self.eliminated_player() {
            TurnPhase::GameOver { loser }
        } else if self.started {
            TurnPhase::AwaitingAction {
                player: self.current,
            }
        } else {
            TurnPhase::Setup
        }
    }

    /// Snapshot for presentation.
    #[must_use]
    pub const fn info(&self) -> TurnInfo {
        TurnInfo {
            player: self.current,
            actions_used: self.actions_used,
            actions_remaining: self.actions_remaining(),
            max_actions: self.max_actions,
            turn_number: self.turn_number,
        }
    }

    /// Whether `start` has been called.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn current_player(&self) -> Player {
        self.current
    }

    /// Actions spent this turn.
    #[must_use]
    pub const fn actions_used(&self) -> u32 {
        self.actions_used
    }

    /// Actions left this turn.
    #[must_use]
    pub const fn actions_remaining(&self) -> u32 {
        self.max_actions.saturating_sub(self.actions_used)
    }

    /// Action budget per turn.
    #[must_use]
    pub const fn max_actions(&self) -> u32 {
        self.max_actions
    }

    /// Turn counter, starting at 1.
    #[must_use]
    pub const fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Whether a player has been recorded as eliminated.
    #[must_use]
    pub fn is_eliminated(&self, player: Player) -> bool {
        self.eliminated[player]
    }

    /// The first eliminated player, if any.
    #[must_use]
    pub fn eliminated_player(&self) -> Option<Player> {
        Player::ALL.into_iter().find(|&p| self.eliminated[p])
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.eliminated_player().is_some()
    }

    /// Record a player as eliminated.
    ///
    /// Returns `true` only the first time for each player.
    pub fn mark_eliminated(&mut self, player: Player) -> bool {
        if self.eliminated[player] {
            return false;
        }
        self.eliminated[player] = true;
        true
    }

    /// Reject mutations before the game starts or after it ends.
    fn guard(&self) -> Result<(), ActionError> {
        if !self.started {
            return Err(ActionError::NotStarted);
        }
        if let Some(loser) = self.eliminated_player() {
            return Err(ActionError::GameOver(loser));
        }
        Ok(())
    }

    /// Check whether a unit may act now, returning the reason if not.
    ///
    /// # Errors
    ///
    /// In order: `NotStarted`, `GameOver`, `UnknownUnit` for dead or unknown
    /// units, `WrongTurn` and `NoActionsRemaining`.
    pub fn check_can_act(&self, units: &UnitRegistry, unit: UnitId) -> Result<(), ActionError> {
        self.guard()?;
        let owner = units.require(unit)?.owner();
        if owner != self.current {
            return Err(ActionError::WrongTurn {
                unit,
                owner,
                current: self.current,
            });
        }
        if self.actions_used >= self.max_actions {
            return Err(ActionError::NoActionsRemaining(self.current));
        }
        Ok(())
    }

    /// Whether a unit may act now.
    #[must_use]
    pub fn can_act(&self, units: &UnitRegistry, unit: UnitId) -> bool {
        self.check_can_act(units, unit).is_ok()
    }

    /// Charge one action to the current player.
    ///
    /// Emits `ActionUsed`, and ends the turn once the budget is spent.
    /// Returns `true` if the turn ended.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` or `GameOver`; nothing changes on error.
    pub fn consume_action(
        &mut self,
        units: &mut UnitRegistry,
        events: &mut EventBus,
    ) -> Result<bool, ActionError> {
        self.guard()?;
        if self.actions_used >= self.max_actions {
            return Err(ActionError::NoActionsRemaining(self.current));
        }

        self.actions_used += 1;
        events.emit(GameEvent::ActionUsed {
            player: self.current,
            remaining: self.actions_remaining(),
        });

        if self.actions_used >= self.max_actions {
            self.end_turn(units, events);
            return Ok(true);
        }
        Ok(false)
    }

    /// End the current player's turn before the budget is spent.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted` or `GameOver`; nothing changes on error.
    pub fn end_turn_early(
        &mut self,
        units: &mut UnitRegistry,
        events: &mut EventBus,
    ) -> Result<(), ActionError> {
        self.guard()?;
        self.end_turn(units, events);
        Ok(())
    }

    /// Hand the turn to the other player.
    ///
    /// The incoming player's units stop defending as their own turn begins.
    fn end_turn(&mut self, units: &mut UnitRegistry, events: &mut EventBus) {
        let outgoing = self.current;
        events.emit(GameEvent::TurnEnd { player: outgoing });

        self.current = outgoing.other();
        self.actions_used = 0;
        self.turn_number += 1;
        events.emit(GameEvent::TurnNumberChanged {
            turn: self.turn_number,
        });

        for unit in units.clear_defending(self.current) {
            events.emit(GameEvent::DefendingChanged {
                unit,
                defending: false,
            });
        }

        info!(player = %self.current, turn = self.turn_number, "turn started");
        events.emit(GameEvent::TurnStart {
            player: self.current,
        });
    }
}
