//! The two sides of a match.

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the two players in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    /// The first player.
    One,
    /// The second player.
    Two,
}

impl Player {
    /// Both players, in seating order.
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// The opposing player.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Seat number, starting at 1.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.number())
    }
}

/// A value held once per player.
///
/// Indexable by [`Player`], so per-side counters and flags live in a fixed
/// pair instead of a map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPlayer<T> {
    /// Value for [`Player::One`].
    pub one: T,
    /// Value for [`Player::Two`].
    pub two: T,
}

impl<T> PerPlayer<T> {
    /// Create a pair from both values.
    #[must_use]
    pub const fn new(one: T, two: T) -> Self {
        Self { one, two }
    }

    /// Iterate over `(player, value)` pairs in seating order.
    pub fn iter(&self) -> impl Iterator<Item = (Player, &T)> {
        [(Player::One, &self.one), (Player::Two, &self.two)].into_iter()
    }
}

impl<T> Index<Player> for PerPlayer<T> {
    type Output = T;

    fn index(&self, player: Player) -> &T {
        match player {
            Player::One => &self.one,
            Player::Two => &self.two,
        }
    }
}

impl<T> IndexMut<Player> for PerPlayer<T> {
    fn index_mut(&mut self, player: Player) -> &mut T {
        match player {
            Player::One => &mut self.one,
            Player::Two => &mut self.two,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_player() {
        assert_eq!(Player::One.other(), Player::Two);
        assert_eq!(Player::Two.other(), Player::One);
        assert_eq!(Player::One.other().other(), Player::One);
    }

    #[test]
    fn test_player_display() {
        assert_eq!(Player::One.to_string(), "player 1");
        assert_eq!(Player::Two.to_string(), "player 2");
    }

    #[test]
    fn test_per_player_index() {
        let mut counts = PerPlayer::new(0u32, 0u32);
        counts[Player::Two] += 3;
        counts[Player::One] += 1;
        assert_eq!(counts[Player::One], 1);
        assert_eq!(counts[Player::Two], 3);

        let collected: Vec<_> = counts.iter().map(|(p, v)| (p, *v)).collect();
        assert_eq!(collected, vec![(Player::One, 1), (Player::Two, 3)]);
    }

    #[test]
    fn test_player_serde_lowercase() {
        let json = serde_json::to_string(&Player::Two).unwrap();
        assert_eq!(json, "\"two\"");
        let back: Player = serde_json::from_str("\"one\"").unwrap();
        assert_eq!(back, Player::One);
    }
}
