//! Domain events and the synchronous bus that delivers them.
//!
//! Every state change the engine makes is announced here, in the order it
//! happened. Presentation layers subscribe listeners; the bus owns them and
//! calls them in subscription order before the mutating call returns.

use std::fmt;

use serde::Serialize;

use crate::engine::{Coord, Player, UnitId};

/// Something that happened in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A player's turn began.
    TurnStart {
        /// The player now acting.
        player: Player,
    },
    /// A player's turn ended.
    TurnEnd {
        /// The player whose turn ended.
        player: Player,
    },
    /// An action was charged against the turn budget.
    ActionUsed {
        /// The acting player.
        player: Player,
        /// Actions left this turn.
        remaining: u32,
    },
    /// The turn counter advanced.
    TurnNumberChanged {
        /// The new turn number.
        turn: u32,
    },
    /// A unit moved onto an empty cell.
    UnitMoved {
        /// The unit that moved.
        unit: UnitId,
        /// Cell it left.
        from: Coord,
        /// Cell it entered.
        to: Coord,
    },
    /// A unit's defending status changed.
    DefendingChanged {
        /// The affected unit.
        unit: UnitId,
        /// New status.
        defending: bool,
    },
    /// One unit attacked another.
    CombatOccurred {
        /// The attacking unit.
        attacker: UnitId,
        /// The defending unit.
        defender: UnitId,
        /// Damage dealt after mitigation.
        damage: u32,
    },
    /// A unit's health reached zero.
    UnitKilled {
        /// The unit that dealt the killing blow, if any.
        attacker: Option<UnitId>,
        /// The destroyed unit.
        victim: UnitId,
    },
    /// A unit advanced into the cell of the enemy it destroyed.
    UnitAdvanced {
        /// The advancing unit.
        unit: UnitId,
        /// The cell it moved into.
        to: Coord,
    },
    /// A player lost their last unit.
    PlayerEliminated {
        /// The eliminated player.
        player: Player,
    },
    /// A unit became the selection.
    Selected {
        /// The selected unit.
        unit: UnitId,
    },
    /// A unit stopped being the selection.
    Deselected {
        /// The deselected unit.
        unit: UnitId,
    },
    /// The selection was cleared.
    SelectionCleared,
}

/// Receives events from an [`EventBus`].
pub trait EventListener {
    /// Handle one event.
    fn on_event(&mut self, event: &GameEvent);
}

impl<F> EventListener for F
where
    F: FnMut(&GameEvent),
{
    fn on_event(&mut self, event: &GameEvent) {
        self(event);
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Journal size of a bus that was not given one.
pub const DEFAULT_JOURNAL_LIMIT: usize = 1024;

/// Ordered, synchronous event channel.
///
/// Besides fanning events out to listeners, the bus keeps a journal of the
/// events since the last [`EventBus::drain`]. The journal holds at most the
/// `journal_limit` most recent events; older ones are dropped.
pub struct EventBus {
    /// Subscribed listeners in subscription order.
    listeners: Vec<(ListenerId, Box<dyn EventListener>)>,
    /// Next listener id.
    next_id: u64,
    /// Events emitted since the last drain. May hold up to twice the limit
    /// before it is trimmed; only the tail is visible.
    journal: Vec<GameEvent>,
    /// Visible journal size, `None` for unbounded.
    journal_limit: Option<usize>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_journal_limit(Some(DEFAULT_JOURNAL_LIMIT))
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .field("journal", &self.history())
            .field("journal_limit", &self.journal_limit)
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Create a bus with no listeners and the default journal limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus keeping at most `limit` events. `Some(0)` disables the
    /// journal, `None` never drops events.
    #[must_use]
    pub const fn with_journal_limit(limit: Option<usize>) -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            journal: Vec::new(),
            journal_limit: limit,
        }
    }

    /// Current journal limit.
    #[must_use]
    pub const fn journal_limit(&self) -> Option<usize> {
        self.journal_limit
    }

    /// Change the journal limit, dropping the oldest events if needed.
    pub fn set_journal_limit(&mut self, limit: Option<usize>) {
        self.journal_limit = limit;
        if let Some(limit) = limit {
            let excess = self.journal.len().saturating_sub(limit);
            self.journal.drain(..excess);
        }
    }

    /// Register a listener. It sees every event emitted from now on.
    pub fn subscribe(&mut self, listener: impl EventListener + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Drop every listener.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    /// Number of subscribed listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver an event to every listener in subscription order and journal it.
    pub fn emit(&mut self, event: GameEvent) {
        for (_, listener) in &mut self.listeners {
            listener.on_event(&event);
        }
        match self.journal_limit {
            Some(0) => {}
            Some(limit) => {
                self.journal.push(event);
                if self.journal.len() >= limit.saturating_mul(2) {
                    let excess = self.journal.len() - limit;
                    self.journal.drain(..excess);
                }
            }
            None => self.journal.push(event),
        }
    }

    /// Events emitted since the last drain, oldest first.
    #[must_use]
    pub fn history(&self) -> &[GameEvent] {
        &self.journal[self.hidden()..]
    }

    /// Take the journal, leaving it empty.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        let hidden = self.hidden();
        self.journal.drain(..hidden);
        std::mem::take(&mut self.journal)
    }

    /// Number of trimmed-but-not-yet-dropped events at the front.
    fn hidden(&self) -> usize {
        self.journal_limit
            .map_or(0, |limit| self.journal.len().saturating_sub(limit))
    }
}
