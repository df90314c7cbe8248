//! The single active unit.
//!
//! Selection does not gate legality; the session checks turn rules before
//! selecting, and anything may be selected at this layer.

use crate::engine::{EventBus, GameEvent, UnitId};

/// Tracks at most one selected unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// The selected unit, if any.
    current: Option<UnitId>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The selected unit, if any.
    #[must_use]
    pub const fn current(&self) -> Option<UnitId> {
        self.current
    }

    /// Check whether a unit is the selection.
    #[must_use]
    pub fn is_selected(&self, unit: UnitId) -> bool {
        self.current == Some(unit)
    }

    /// Select a unit, replacing any previous selection.
    ///
    /// Emits `Deselected` for the previous unit before `Selected` for the new
    /// one. Selecting the already-selected unit emits nothing. Returns `true`
    /// if the selection changed.
    pub fn select(&mut self, unit: UnitId, events: &mut EventBus) -> bool {
        if self.current == Some(unit) {
            return false;
        }
        if let Some(previous) = self.current.take() {
            events.emit(GameEvent::Deselected { unit: previous });
        }
        self.current = Some(unit);
        events.emit(GameEvent::Selected { unit });
        true
    }

    /// Deselect a unit if it is the current selection.
    ///
    /// Returns `true` if it was selected.
    pub fn deselect(&mut self, unit: UnitId, events: &mut EventBus) -> bool {
        if self.current != Some(unit) {
            return false;
        }
        self.current = None;
        events.emit(GameEvent::Deselected { unit });
        true
    }

    /// Clear the selection.
    ///
    /// Emits `SelectionCleared` only if something was selected. Returns `true`
    /// in that case.
    pub fn clear(&mut self, events: &mut EventBus) -> bool {
        if self.current.take().is_none() {
            return false;
        }
        events.emit(GameEvent::SelectionCleared);
        true
    }
}
