//! Init command implementation.

use std::path::Path;

use skirmish::replay::Recording;

use super::CliError;

/// Execute the init command.
///
/// # Errors
///
/// Returns an error if the file exists and `force` is not set, or the write
/// fails.
pub(crate) fn execute(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::new(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let recording = Recording::sample();
    recording.save(path)?;

    println!("Wrote template recording to {}", path.display());
    println!(
        "  {}x{} board, {} units, {} commands",
        recording.config.grid_width,
        recording.config.grid_height,
        recording.config.roster.len(),
        recording.len()
    );
    Ok(())
}
