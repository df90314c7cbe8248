//! Replay command implementation.

use std::path::Path;

use skirmish::replay::{render_board, render_units, Recording, ReplayEngine};

use super::CliError;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or the step is out of
/// range.
pub(crate) fn execute(path: &Path, step: Option<usize>) -> Result<(), CliError> {
    let recording = Recording::load(path).map_err(|e| {
        CliError::new(format!("Failed to load recording {}: {e}", path.display()))
    })?;

    let target = step.unwrap_or(recording.len());
    let total = recording.len();
    let engine = ReplayEngine::new_at_step(recording, target)?;

    println!("Step {}/{total}", engine.position());
    print!("{}", render_board(engine.session()));
    println!();
    print!("{}", render_units(engine.session()));

    Ok(())
}
