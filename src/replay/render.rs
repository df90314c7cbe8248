//! Plain-text rendering of a session for terminal viewing.

use std::fmt::Write as _;

use crate::engine::{Player, Session, Terrain, TurnPhase};

/// Glyph for a unit: `x`/`o` for players one and two, uppercase while defending.
fn unit_glyph(owner: Player, defending: bool) -> char {
    match (owner, defending) {
        (Player::One, false) => 'x',
        (Player::One, true) => 'X',
        (Player::Two, false) => 'o',
        (Player::Two, true) => 'O',
    }
}

/// Render the board with a status header.
///
/// Output format:
/// ```text
/// Turn 3 | player 1 to act | 4/4 actions left
///   0 1 2 3 4 5 6 7
/// 0 . x . x . x . .
/// 1 . . . . . . . .
/// 2 . . . . . . . .
/// 3 . . . # . . . .
/// 4 . . . . # . . .
/// 5 . . . . . . . .
/// 6 . . . . . . . .
/// 7 . . o . o . o .
///
/// Legend: x/o=unit (uppercase: defending)  #=blocked  [ ]=selected
/// ```
#[must_use]
pub fn render_board(session: &Session) -> String {
    let mut output = String::new();
    let info = session.turn_info();

    match session.phase() {
        TurnPhase::Setup => {
            let _ = writeln!(output, "Setup | waiting to start");
        }
        TurnPhase::AwaitingAction { player } => {
            let _ = writeln!(
                output,
                "Turn {} | {player} to act | {}/{} actions left",
                info.turn_number, info.actions_remaining, info.max_actions
            );
        }
        TurnPhase::GameOver { loser } => {
            let _ = writeln!(
                output,
                "Turn {} | game over | {} wins, {loser} eliminated",
                info.turn_number,
                loser.other()
            );
        }
    }

    let grid = session.grid();
    let selected = session.current_selection();

    output.push(' ');
    for x in 0..grid.width() {
        let _ = write!(output, "{:>2}", x % 10);
    }
    output.push('\n');

    let mut row = Vec::with_capacity(usize::from(grid.width()));
    for (coord, terrain, occupant) in grid.cells() {
        let glyph = match (terrain, occupant.and_then(|id| session.unit(id))) {
            (_, Some(unit)) => unit_glyph(unit.owner(), unit.is_defending()),
            (Terrain::Blocked, None) => '#',
            (Terrain::Open, None) => '.',
        };
        let marked = occupant.is_some() && occupant == selected;
        row.push((glyph, marked));

        if coord.x + 1 == grid.width() {
            let _ = write!(output, "{}", coord.y % 10);
            for &(glyph, marked) in &row {
                if marked {
                    let _ = write!(output, "[{glyph}");
                } else {
                    let _ = write!(output, " {glyph}");
                }
            }
            output.push('\n');
            row.clear();
        }
    }

    output.push_str("\nLegend: x/o=unit (uppercase: defending)  #=blocked  [ ]=selected\n");
    output
}

/// Render one line per live unit.
///
/// ```text
/// #0 player 1 at (1, 0) hp 10/10 atk 4 def 1
/// #3 player 2 at (2, 7) hp 7/10 atk 4 def 1 defending
/// ```
#[must_use]
pub fn render_units(session: &Session) -> String {
    let mut output = String::new();
    for unit in session.units().iter() {
        let _ = write!(
            output,
            "{} {} at {} hp {}/{} atk {} def {}",
            unit.id(),
            unit.owner(),
            unit.position(),
            unit.health(),
            unit.max_health(),
            unit.attack(),
            unit.defense()
        );
        if unit.is_defending() {
            output.push_str(" defending");
        }
        if session.current_selection() == Some(unit.id()) {
            output.push_str(" selected");
        }
        output.push('\n');
    }
    output
}
