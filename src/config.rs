//! Match configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{Adjacency, Coord, Player, UnitStats, DEFAULT_JOURNAL_LIMIT};
use crate::error::SetupError;

/// One unit to place at the start of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Owner of the unit.
    pub player: Player,
    /// Starting cell.
    pub position: Coord,
    /// Starting stats.
    #[serde(default)]
    pub stats: UnitStats,
}

impl Deployment {
    /// Deploy a unit with default stats.
    #[must_use]
    pub fn new(player: Player, x: u16, y: u16) -> Self {
        Self {
            player,
            position: Coord::new(x, y),
            stats: UnitStats::default(),
        }
    }

    /// Replace the stats.
    #[must_use]
    pub const fn with_stats(mut self, stats: UnitStats) -> Self {
        self.stats = stats;
        self
    }
}

/// Everything needed to set up a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Grid width in cells.
    pub grid_width: u16,
    /// Grid height in cells.
    pub grid_height: u16,
    /// Actions each player may take per turn.
    pub max_actions_per_turn: u32,
    /// Player who takes the first turn.
    pub starting_player: Player,
    /// Which cells count as one step away for attacks.
    pub adjacency: Adjacency,
    /// Furthest a unit may move in one action, in steps under `adjacency`.
    /// `None` lets a unit move to any empty cell.
    pub move_range: Option<u32>,
    /// Most recent events the session keeps in its journal. `Some(0)` turns
    /// the journal off; `None` keeps everything until drained.
    pub journal_limit: Option<usize>,
    /// Cells with blocked terrain.
    #[serde(default)]
    pub blocked: Vec<Coord>,
    /// Units placed at the start, in spawn order.
    #[serde(default)]
    pub roster: Vec<Deployment>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 8,
            grid_height: 8,
            max_actions_per_turn: 4,
            starting_player: Player::One,
            adjacency: Adjacency::Orthogonal,
            move_range: None,
            journal_limit: Some(DEFAULT_JOURNAL_LIMIT),
            blocked: vec![Coord::new(3, 3), Coord::new(4, 4)],
            roster: vec![
                Deployment::new(Player::One, 1, 0),
                Deployment::new(Player::One, 3, 0),
                Deployment::new(Player::One, 5, 0),
                Deployment::new(Player::Two, 2, 7),
                Deployment::new(Player::Two, 4, 7),
                Deployment::new(Player::Two, 6, 7),
            ],
        }
    }
}

impl GameConfig {
    /// An empty roster on a grid of the given size.
    #[must_use]
    pub fn empty(grid_width: u16, grid_height: u16) -> Self {
        Self {
            grid_width,
            grid_height,
            blocked: Vec::new(),
            roster: Vec::new(),
            ..Self::default()
        }
    }

    /// Append a unit to the roster.
    #[must_use]
    pub fn with_unit(mut self, deployment: Deployment) -> Self {
        self.roster.push(deployment);
        self
    }

    /// Check the values that can be checked without building a grid.
    ///
    /// Placement conflicts (two units on one cell, a unit on a blocked cell)
    /// are reported when the session is built.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SetupError::InvalidDimensions {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.max_actions_per_turn == 0 {
            return Err(SetupError::InvalidActionBudget);
        }
        if self.move_range == Some(0) {
            return Err(SetupError::InvalidMoveRange);
        }
        if let Some(&cell) = self
            .blocked
            .iter()
            .find(|c| c.x >= self.grid_width || c.y >= self.grid_height)
        {
            return Err(SetupError::BlockedCell(cell));
        }
        for (index, deployment) in self.roster.iter().enumerate() {
            if deployment.stats.max_health == 0 {
                return Err(SetupError::Deployment {
                    index,
                    source: Box::new(SetupError::InvalidStats {
                        reason: "max_health must be greater than zero",
                    }),
                });
            }
        }
        for player in Player::ALL {
            if !self.roster.iter().any(|d| d.player == player) {
                return Err(SetupError::EmptyRoster(player));
            }
        }
        Ok(())
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` for malformed input, or any validation error.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`GameConfig::from_json`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, SetupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.roster.len(), 6);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GameConfig::default();
        config.grid_height = 0;
        assert!(matches!(
            config.validate(),
            Err(SetupError::InvalidDimensions { width: 8, height: 0 })
        ));

        let mut config = GameConfig::default();
        config.max_actions_per_turn = 0;
        assert!(matches!(config.validate(), Err(SetupError::InvalidActionBudget)));

        let mut config = GameConfig::default();
        config.move_range = Some(0);
        assert!(matches!(config.validate(), Err(SetupError::InvalidMoveRange)));

        let mut config = GameConfig::default();
        config.blocked.push(Coord::new(8, 0));
        assert!(matches!(config.validate(), Err(SetupError::BlockedCell(_))));

        let config = GameConfig::empty(4, 4).with_unit(Deployment::new(Player::One, 0, 0));
        assert!(matches!(
            config.validate(),
            Err(SetupError::EmptyRoster(Player::Two))
        ));

        let config = GameConfig::empty(4, 4)
            .with_unit(Deployment::new(Player::One, 0, 0))
            .with_unit(Deployment::new(Player::Two, 1, 0).with_stats(UnitStats::new(0, 1, 1)));
        assert!(matches!(
            config.validate(),
            Err(SetupError::Deployment { index: 1, .. })
        ));
    }

    #[test]
    fn test_json_defaults_and_unknown_fields() {
        let config = GameConfig::from_json(
            r#"{
                "grid_width": 5,
                "grid_height": 5,
                "adjacency": "diagonal",
                "roster": [
                    {"player": "one", "position": {"x": 0, "y": 0}},
                    {"player": "two", "position": {"x": 4, "y": 4},
                     "stats": {"max_health": 5, "attack": 10, "defense": 2}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.max_actions_per_turn, 4);
        assert_eq!(config.adjacency, Adjacency::Diagonal);
        assert_eq!(config.roster[0].stats, UnitStats::default());
        assert_eq!(config.roster[1].stats.attack, 10);
        assert!(config.blocked.is_empty());
        assert_eq!(config.move_range, None);
        assert_eq!(config.journal_limit, Some(DEFAULT_JOURNAL_LIMIT));

        let config = GameConfig::from_json(
            r#"{
                "move_range": 2,
                "journal_limit": null,
                "roster": [
                    {"player": "one", "position": {"x": 0, "y": 0}},
                    {"player": "two", "position": {"x": 4, "y": 4}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.move_range, Some(2));
        assert_eq!(config.journal_limit, None);

        let err = GameConfig::from_json(r#"{"grid_widht": 5}"#).unwrap_err();
        assert!(matches!(err, SetupError::Json(_)));
    }

    #[test]
    fn test_pretty_json_round_trip() {
        let config = GameConfig::default();
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), config);
    }
}
