//! Output formatting utilities for CLI.

use std::fmt::Write as _;

use serde::Serialize;
use skirmish::engine::{CombatStatistics, Unit};
use skirmish::replay::{Command, CommandOutcome, StepRecord};
use skirmish::{ActionReport, GameEvent, Player, Session, TurnInfo, TurnPhase};

/// JSON-serializable step.
#[derive(Debug, Serialize)]
pub(super) struct JsonStep {
    /// Position in the recording.
    pub(super) index: usize,
    /// The command issued.
    pub(super) command: Command,
    /// What it did (null if rejected).
    pub(super) outcome: Option<CommandOutcome>,
    /// Why it was rejected (null if accepted).
    pub(super) rejected: Option<String>,
    /// Events it caused.
    pub(super) events: Vec<GameEvent>,
}

impl JsonStep {
    /// Create from a `StepRecord`.
    pub(super) fn from_record(record: &StepRecord) -> Self {
        let (outcome, rejected) = match &record.result {
            Ok(outcome) => (Some(*outcome), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            index: record.index,
            command: record.command,
            outcome,
            rejected,
            events: record.events.clone(),
        }
    }
}

/// JSON-serializable end-of-game summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonSummary {
    /// Every step played.
    pub(super) steps: Vec<JsonStep>,
    /// Final turn state.
    pub(super) turn: TurnInfo,
    /// Final phase.
    pub(super) phase: TurnPhase,
    /// Winner (null if the game is still running).
    pub(super) winner: Option<Player>,
    /// Combat counters.
    pub(super) statistics: CombatStatistics,
    /// Surviving units.
    pub(super) units: Vec<Unit>,
}

impl JsonSummary {
    /// Create from the played steps and the final session.
    pub(super) fn new(records: &[StepRecord], session: &Session) -> Self {
        Self {
            steps: records.iter().map(JsonStep::from_record).collect(),
            turn: session.turn_info(),
            phase: session.phase(),
            winner: session.winner(),
            statistics: *session.combat_statistics(),
            units: session.units().iter().cloned().collect(),
        }
    }
}

/// Format one step as a single line.
pub(super) fn format_step(record: &StepRecord) -> String {
    let command = match record.command {
        Command::Select { unit } => format!("select {unit}"),
        Command::Deselect { unit } => format!("deselect {unit}"),
        Command::ClearSelection => "clear selection".to_string(),
        Command::Act { unit, target } => format!("act {unit} -> {target}"),
        Command::Defend { unit } => format!("defend {unit}"),
        Command::EndTurn => "end turn".to_string(),
    };

    let result = match &record.result {
        Ok(CommandOutcome::Selection { changed: true }) => "selection changed".to_string(),
        Ok(CommandOutcome::Selection { changed: false }) => "no change".to_string(),
        Ok(CommandOutcome::TurnEnded) => "turn ended".to_string(),
        Ok(CommandOutcome::Action { report }) => match report {
            ActionReport::Moved { to, .. } => format!("moved to {to}"),
            ActionReport::Defended { .. } => "defending".to_string(),
            ActionReport::Attacked(outcome) if outcome.killed => format!(
                "hit {} for {}, destroyed",
                outcome.defender, outcome.damage
            ),
            ActionReport::Attacked(outcome) => format!(
                "hit {} for {}, {} hp left",
                outcome.defender, outcome.damage, outcome.defender_health
            ),
        },
        Err(err) => format!("rejected: {err}"),
    };

    format!("[{:>3}] {command}: {result}", record.index)
}

/// Format the final state as human-readable text.
pub(super) fn format_summary(session: &Session) -> String {
    let mut output = String::new();
    let info = session.turn_info();

    match session.winner() {
        Some(winner) => {
            let _ = writeln!(output, "Winner: {winner} (turn {})", info.turn_number);
        }
        None => {
            let _ = writeln!(
                output,
                "In progress: turn {}, {} to act",
                info.turn_number, info.player
            );
        }
    }
    for player in Player::ALL {
        let _ = writeln!(
            output,
            "  {player}: {} units left",
            session.remaining_units(player)
        );
    }

    let stats = session.combat_statistics();
    let _ = writeln!(output, "\nCombat:");
    let _ = writeln!(
        output,
        "  Attacks:    {} ({} / {})",
        stats.total_combats,
        stats.attacks_by(Player::One),
        stats.attacks_by(Player::Two)
    );
    let _ = writeln!(output, "  Damage:     {}", stats.total_damage);
    let _ = writeln!(output, "  Destroyed:  {}", stats.units_destroyed);
    let _ = writeln!(output, "  Advances:   {}", stats.advances);
    output
}
