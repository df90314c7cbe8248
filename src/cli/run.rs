//! Run command implementation.

use std::path::Path;

use skirmish::replay::{Recording, ReplayEngine};

use super::output::{format_step, format_summary, JsonSummary};
use super::{CliError, OutputFormat};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or played.
pub(crate) fn execute(path: &Path, format: OutputFormat, quiet: bool) -> Result<(), CliError> {
    let recording = Recording::load(path).map_err(|e| {
        CliError::new(format!("Failed to load recording {}: {e}", path.display()))
    })?;

    if !quiet && format == OutputFormat::Text {
        println!(
            "Playing {} commands on a {}x{} board...",
            recording.len(),
            recording.config.grid_width,
            recording.config.grid_height
        );
        println!();
    }

    let mut engine = ReplayEngine::new(recording)?;
    let records = engine.run_to_end();

    match format {
        OutputFormat::Text => {
            if !quiet {
                for record in &records {
                    println!("{}", format_step(record));
                }
                println!();
            }
            print!("{}", format_summary(engine.session()));
        }
        OutputFormat::Json => {
            let summary = JsonSummary::new(&records, engine.session());
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
