//! Recording and configuration file round trips.
//!
//! Run with: cargo test replay_files

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::fs;

use skirmish::engine::{Coord, Player, UnitId};
use skirmish::replay::{Command, Recording, ReplayEngine, ReplayError};
use skirmish::{GameConfig, SetupError};

#[test]
fn test_recording_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opening.json");

    let recording = Recording::sample();
    recording.save(&path).unwrap();
    let loaded = Recording::load(&path).unwrap();
    assert_eq!(loaded, recording);

    let mut engine = ReplayEngine::new(loaded).unwrap();
    let steps = engine.run_to_end();
    assert!(steps.iter().all(|step| step.result.is_ok()));
}

#[test]
fn test_hand_written_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("duel.json");
    fs::write(
        &path,
        r#"{
            "config": {
                "grid_width": 3,
                "grid_height": 1,
                "max_actions_per_turn": 2,
                "roster": [
                    {"player": "one", "position": {"x": 0, "y": 0},
                     "stats": {"max_health": 10, "attack": 10, "defense": 0}},
                    {"player": "two", "position": {"x": 2, "y": 0},
                     "stats": {"max_health": 10, "attack": 1, "defense": 0}}
                ]
            },
            "commands": [
                {"command": "act", "unit": 0, "target": {"x": 1, "y": 0}},
                {"command": "act", "unit": 0, "target": {"x": 2, "y": 0}}
            ]
        }"#,
    )
    .unwrap();

    let recording = Recording::load(&path).unwrap();
    assert_eq!(
        recording.commands[0],
        Command::Act {
            unit: UnitId(0),
            target: Coord::new(1, 0)
        }
    );

    let mut engine = ReplayEngine::new(recording).unwrap();
    engine.run_to_end();
    assert_eq!(engine.session().winner(), Some(Player::One));
    assert_eq!(
        engine.session().unit(UnitId(0)).unwrap().position(),
        Coord::new(2, 0)
    );
}

#[test]
fn test_bad_recordings_are_rejected() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(Recording::load(&missing), Err(ReplayError::Io(_))));

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "{ not json").unwrap();
    assert!(matches!(Recording::load(&garbage), Err(ReplayError::Json(_))));

    let invalid = dir.path().join("invalid.json");
    fs::write(&invalid, r#"{"config": {"max_actions_per_turn": 0}}"#).unwrap();
    assert!(matches!(
        Recording::load(&invalid),
        Err(ReplayError::Setup(SetupError::InvalidActionBudget))
    ));
}

#[test]
fn test_config_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let config = GameConfig::default();
    fs::write(&path, config.to_json_pretty().unwrap()).unwrap();
    assert_eq!(GameConfig::load(&path).unwrap(), config);

    fs::write(&path, r#"{"grid_width": 4, "grid_height": 4}"#).unwrap();
    assert!(matches!(
        GameConfig::load(&path),
        Err(SetupError::EmptyRoster(Player::One))
    ));
}
