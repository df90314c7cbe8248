//! Game recording and replay.
//!
//! Because games are 100% deterministic, a recording only needs:
//! - `config` - the board, action budget and starting roster
//! - `commands` - every command issued, in order
//!
//! No state deltas are stored. To view step N, re-run the commands from 0 to N.
//!
//! # Time Travel
//!
//! - **Forward**: Apply the next command
//! - **Backward**: Re-run from step 0 to (`position` - 1)
//! - **Jump to step N**: Re-run from step 0 to N

mod render;

pub use render::{render_board, render_units};

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::GameConfig;
use crate::engine::{ActionReport, Coord, GameEvent, Session, UnitId};
use crate::error::{ActionError, SetupError};

/// One command issued to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Select a unit.
    Select {
        /// Unit to select.
        unit: UnitId,
    },
    /// Deselect a unit.
    Deselect {
        /// Unit to deselect.
        unit: UnitId,
    },
    /// Clear the selection.
    ClearSelection,
    /// Move or attack.
    Act {
        /// Acting unit.
        unit: UnitId,
        /// Cell to enter.
        target: Coord,
    },
    /// Take a defensive stance.
    Defend {
        /// Defending unit.
        unit: UnitId,
    },
    /// End the turn early.
    EndTurn,
}

/// What an accepted command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// A selection command ran.
    Selection {
        /// Whether the selection changed.
        changed: bool,
    },
    /// A move, attack or defend action ran.
    Action {
        /// What the action did.
        report: ActionReport,
    },
    /// The turn passed to the other player.
    TurnEnded,
}

/// Issue one command to a session.
///
/// # Errors
///
/// Returns whatever the session rejected the command with.
pub fn apply_command(session: &mut Session, command: Command) -> Result<CommandOutcome, ActionError> {
    match command {
        Command::Select { unit } => session
            .try_select(unit)
            .map(|changed| CommandOutcome::Selection { changed }),
        Command::Deselect { unit } => Ok(CommandOutcome::Selection {
            changed: session.try_deselect(unit),
        }),
        Command::ClearSelection => Ok(CommandOutcome::Selection {
            changed: session.clear_selection(),
        }),
        Command::Act { unit, target } => session
            .try_act(unit, target)
            .map(|report| CommandOutcome::Action { report }),
        Command::Defend { unit } => session
            .try_defend(unit)
            .map(|report| CommandOutcome::Action { report }),
        Command::EndTurn => session.end_turn_early().map(|()| CommandOutcome::TurnEnded),
    }
}

/// Error type for replay operations.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The recorded configuration cannot build a game.
    #[error("invalid recording: {0}")]
    Setup(#[from] SetupError),
    /// Reading or writing the recording failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The recording is not valid JSON.
    #[error("malformed recording: {0}")]
    Json(#[from] serde_json::Error),
    /// Step number out of bounds.
    #[error("step {requested} out of bounds (recording has {len} commands)")]
    StepOutOfBounds {
        /// Requested step.
        requested: usize,
        /// Number of commands in the recording.
        len: usize,
    },
    /// Every command has already been applied.
    #[error("end of recording")]
    EndOfRecording,
    /// Already at the first step.
    #[error("already at the start of the recording")]
    AtStart,
}

/// A configuration plus every command issued against it.
///
/// Because the game is deterministic, this is all we need to replay.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recording {
    /// Game setup.
    pub config: GameConfig,
    /// Commands in issue order.
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Recording {
    /// Start an empty recording.
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            commands: Vec::new(),
        }
    }

    /// Append a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Number of recorded commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// A short opening on the default board, for use as a template.
    #[must_use]
    pub fn sample() -> Self {
        let mut recording = Self::new(GameConfig::default());
        for command in [
            Command::Select { unit: UnitId(0) },
            Command::Act {
                unit: UnitId(0),
                target: Coord::new(1, 1),
            },
            Command::Act {
                unit: UnitId(0),
                target: Coord::new(1, 2),
            },
            Command::Defend { unit: UnitId(1) },
            Command::EndTurn,
            Command::Select { unit: UnitId(3) },
            Command::Act {
                unit: UnitId(3),
                target: Coord::new(2, 6),
            },
            Command::EndTurn,
        ] {
            recording.push(command);
        }
        recording
    }

    /// Parse a recording and validate its configuration.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed input or `Setup` for a bad configuration.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let recording: Self = serde_json::from_str(json)?;
        recording.config.validate()?;
        Ok(recording)
    }

    /// Serialize as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a recording from a file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`Recording::from_json`].
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save the recording to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// One applied command and everything it caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// Zero-based position of the command in the recording.
    pub index: usize,
    /// The command.
    pub command: Command,
    /// What the session made of it.
    pub result: Result<CommandOutcome, ActionError>,
    /// Events emitted while it ran.
    pub events: Vec<GameEvent>,
}

/// Replay engine - steps through a recording deterministically.
///
/// Since games are deterministic, this engine can:
/// - Step forward by applying one command
/// - Step backward by replaying from step 0
/// - Jump to any step by replaying from step 0
#[derive(Debug)]
pub struct ReplayEngine {
    /// The recording being replayed.
    recording: Recording,
    /// Game state after `position` commands.
    session: Session,
    /// Number of commands applied.
    position: usize,
}

impl ReplayEngine {
    /// Create a replay engine positioned before the first command.
    ///
    /// # Errors
    ///
    /// Returns `Setup` if the recorded configuration is invalid.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at_step(recording, 0)
    }

    /// Create a replay engine with the first `step` commands applied.
    ///
    /// # Errors
    ///
    /// Returns `Setup` for an invalid configuration, or `StepOutOfBounds` if
    /// `step` exceeds the recording.
    pub fn new_at_step(recording: Recording, step: usize) -> Result<Self, ReplayError> {
        if step > recording.len() {
            return Err(ReplayError::StepOutOfBounds {
                requested: step,
                len: recording.len(),
            });
        }

        // Each step takes its events out of the journal, so nothing may be
        // trimmed between a command and its record.
        let mut session = Session::new(recording.config.clone())?;
        session.set_journal_limit(None);
        session.drain_events();
        let mut engine = Self {
            recording,
            session,
            position: 0,
        };
        for _ in 0..step {
            engine.apply_next();
        }
        Ok(engine)
    }

    /// The recording.
    #[must_use]
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Current game state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Number of commands applied so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether every command has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.recording.len()
    }

    /// Apply the next command.
    ///
    /// A command the session rejects is still a step; its error is in the
    /// returned record.
    ///
    /// # Errors
    ///
    /// Returns `EndOfRecording` once every command has been applied.
    pub fn step_forward(&mut self) -> Result<StepRecord, ReplayError> {
        if self.is_finished() {
            return Err(ReplayError::EndOfRecording);
        }
        Ok(self.apply_next())
    }

    /// Undo the last command by replaying up to it.
    ///
    /// # Errors
    ///
    /// Returns `AtStart` if no command has been applied.
    pub fn step_back(&mut self) -> Result<(), ReplayError> {
        if self.position == 0 {
            return Err(ReplayError::AtStart);
        }
        self.jump_to(self.position - 1)
    }

    /// Jump to the state after `step` commands.
    ///
    /// # Errors
    ///
    /// Returns `StepOutOfBounds` if `step` exceeds the recording.
    pub fn jump_to(&mut self, step: usize) -> Result<(), ReplayError> {
        let recording = self.recording.clone();
        *self = Self::new_at_step(recording, step)?;
        Ok(())
    }

    /// Apply every remaining command.
    pub fn run_to_end(&mut self) -> Vec<StepRecord> {
        let mut records = Vec::with_capacity(self.recording.len() - self.position);
        while !self.is_finished() {
            records.push(self.apply_next());
        }
        records
    }

    /// Apply the command at `position`. Callers check bounds.
    fn apply_next(&mut self) -> StepRecord {
        let index = self.position;
        let command = self.recording.commands[index];

        let result = apply_command(&mut self.session, command);
        if let Err(err) = &result {
            debug!(index, ?command, %err, "recorded command rejected");
        }

        self.position += 1;
        StepRecord {
            index,
            command,
            result,
            events: self.session.drain_events(),
        }
    }
}
