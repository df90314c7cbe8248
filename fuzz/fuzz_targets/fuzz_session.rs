#![no_main]

//! Session command fuzzer.
//!
//! Builds a small board from fuzzer-chosen dimensions and stats, then throws
//! an arbitrary command stream at it:
//! 1. Select / deselect / clear
//! 2. Move or attack any unit toward any cell
//! 3. Defend and end turn
//!
//! After every command the session invariants must hold, and a rejected
//! command must leave the board untouched.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use skirmish::engine::invariants::check_invariants;
use skirmish::engine::{Adjacency, Coord, Player, Session, UnitId, UnitStats};
use skirmish::replay::{apply_command, Command};
use skirmish::{Deployment, GameConfig};

/// A fuzzer-generated command.
#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzCommand {
    Select { unit: u8 },
    Deselect { unit: u8 },
    ClearSelection,
    Act { unit: u8, x: u8, y: u8 },
    Defend { unit: u8 },
    EndTurn,
}

impl FuzzCommand {
    fn to_command(self) -> Command {
        let unit = |id: u8| UnitId(u32::from(id % 16));
        match self {
            Self::Select { unit: id } => Command::Select { unit: unit(id) },
            Self::Deselect { unit: id } => Command::Deselect { unit: unit(id) },
            Self::ClearSelection => Command::ClearSelection,
            Self::Act { unit: id, x, y } => Command::Act {
                unit: unit(id),
                target: Coord::new(u16::from(x % 12), u16::from(y % 12)),
            },
            Self::Defend { unit: id } => Command::Defend { unit: unit(id) },
            Self::EndTurn => Command::EndTurn,
        }
    }
}

/// Structured input for session fuzzing.
#[derive(Arbitrary, Debug)]
struct SessionInput {
    /// Board size (reduced modulo 10, plus 2).
    width: u8,
    height: u8,
    /// Actions per turn (reduced modulo 6, plus 1).
    budget: u8,
    /// Use diagonal adjacency.
    diagonal: bool,
    /// Per-unit stats; one unit per side per entry.
    stats: Vec<(u8, u8, u8)>,
    /// Command stream.
    commands: Vec<FuzzCommand>,
}

fuzz_target!(|input: SessionInput| {
    let width = u16::from(input.width % 10) + 2;
    let height = u16::from(input.height % 10) + 2;

    let mut config = GameConfig::empty(width, height);
    config.max_actions_per_turn = u32::from(input.budget % 6) + 1;
    if input.diagonal {
        config.adjacency = Adjacency::Diagonal;
    }
    for (i, &(health, attack, defense)) in input.stats.iter().take(usize::from(width)).enumerate() {
        let Ok(x) = u16::try_from(i) else { break };
        let stats = UnitStats::new(u32::from(health).max(1), u32::from(attack), u32::from(defense));
        config = config
            .with_unit(Deployment::new(Player::One, x, 0).with_stats(stats))
            .with_unit(Deployment::new(Player::Two, x, height - 1).with_stats(stats));
    }

    let Ok(mut session) = Session::new(config) else {
        return;
    };

    for command in input.commands.iter().take(256) {
        let grid = session.grid().clone();
        let units = session.units().clone();
        let turn = session.turn_info();

        if apply_command(&mut session, command.to_command()).is_err() {
            assert_eq!(session.grid(), &grid);
            assert_eq!(session.units(), &units);
            assert_eq!(session.turn_info(), turn);
        }

        let violations = check_invariants(&session);
        assert!(violations.is_empty(), "invariant violations: {violations:?}");
    }
});
