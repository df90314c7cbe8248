//! Configuration and recording validation command implementation.

use std::fs;
use std::path::Path;

use skirmish::replay::{Recording, ReplayEngine};
use skirmish::{GameConfig, Session};

use super::CliError;

/// Execute the validate command.
///
/// A file with a top-level `config` key is checked as a recording: the
/// configuration must build and every command is dry-run. Anything else is
/// checked as a bare configuration.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub(crate) fn execute(path: &Path) -> Result<(), CliError> {
    let json = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;

    println!("Validating: {}", path.display());
    println!();

    let value: serde_json::Value =
        serde_json::from_str(&json).map_err(|e| CliError::new(format!("Not valid JSON: {e}")))?;
    print_check("JSON syntax", true);

    if value.get("config").is_some() {
        validate_recording(&json)
    } else {
        validate_config(&json)
    }
}

fn validate_config(json: &str) -> Result<(), CliError> {
    let config = GameConfig::from_json(json).inspect_err(|_| print_check("Configuration", false))?;
    print_check("Configuration", true);

    let session = Session::build(config).inspect_err(|_| print_check("Deployment", false))?;
    print_check("Deployment", true);

    println!();
    println!("Summary:");
    println!(
        "  Board:        {}x{}",
        session.grid().width(),
        session.grid().height()
    );
    println!("  Units:        {}", session.units().len());
    println!("  Action limit: {}", session.config().max_actions_per_turn);
    println!();
    println!("Validation successful!");
    Ok(())
}

fn validate_recording(json: &str) -> Result<(), CliError> {
    let recording =
        Recording::from_json(json).inspect_err(|_| print_check("Recording format", false))?;
    print_check("Recording format", true);

    let mut engine = ReplayEngine::new(recording).inspect_err(|_| print_check("Deployment", false))?;
    print_check("Deployment", true);

    let records = engine.run_to_end();
    let rejected: Vec<_> = records.iter().filter(|r| r.result.is_err()).collect();
    print_check("All commands accepted", rejected.is_empty());
    for record in &rejected {
        if let Err(err) = &record.result {
            println!("      step {}: {err}", record.index);
        }
    }

    println!();
    println!("Summary:");
    println!("  Commands:     {}", records.len());
    println!("  Rejected:     {}", rejected.len());
    match engine.session().winner() {
        Some(winner) => println!("  Result:       {winner} wins"),
        None => println!("  Result:       game in progress"),
    }
    println!();

    if rejected.is_empty() {
        println!("Validation successful!");
        Ok(())
    } else {
        Err(CliError::new(format!(
            "{} recorded commands were rejected",
            rejected.len()
        )))
    }
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
