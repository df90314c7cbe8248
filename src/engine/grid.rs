//! Grid coordinates, terrain and cell occupancy.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::UnitId;
use crate::error::ActionError;

/// A coordinate on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance to another coordinate.
    #[must_use]
    pub const fn manhattan_distance(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) as u32 + self.y.abs_diff(other.y) as u32
    }

    /// Chebyshev (king-move) distance to another coordinate.
    #[must_use]
    pub fn chebyshev_distance(self, other: Coord) -> u32 {
        u32::from(self.x.abs_diff(other.x).max(self.y.abs_diff(other.y)))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Which neighbouring cells count as one step away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjacency {
    /// Up, down, left and right (Manhattan distance 1).
    #[default]
    Orthogonal,
    /// The eight surrounding cells (Chebyshev distance 1).
    Diagonal,
}

impl Adjacency {
    /// Step distance between two cells under this adjacency rule.
    #[must_use]
    pub fn distance(self, a: Coord, b: Coord) -> u32 {
        match self {
            Adjacency::Orthogonal => a.manhattan_distance(b),
            Adjacency::Diagonal => a.chebyshev_distance(b),
        }
    }

    /// Check whether `b` is exactly one step from `a`.
    #[must_use]
    pub fn are_adjacent(self, a: Coord, b: Coord) -> bool {
        self.distance(a, b) == 1
    }
}

/// Terrain of a single cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    /// Open ground - units may stand here.
    #[default]
    Open,
    /// Impassable cell.
    Blocked,
}

impl Terrain {
    /// Check if units can stand on this terrain.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Terrain::Blocked)
    }
}

/// Authoritative record of which unit stands on which cell.
///
/// Cells are stored in row-major order. A reverse index from unit to cell is
/// kept alongside so that removal by id and consistency checks do not scan
/// the whole grid. Both sides are always written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Width of the grid in cells.
    width: u16,
    /// Height of the grid in cells.
    height: u16,
    /// Terrain per cell.
    terrain: Vec<Terrain>,
    /// Occupant per cell.
    occupants: Vec<Option<UnitId>>,
    /// Cell of every placed unit.
    positions: BTreeMap<UnitId, Coord>,
}

impl Grid {
    /// Create a new grid of open cells.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }

        let size = usize::from(width) * usize::from(height);
        Some(Self {
            width,
            height,
            terrain: vec![Terrain::Open; size],
            occupants: vec![None; size],
            positions: BTreeMap::new(),
        })
    }

    /// Get the width of the grid.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the height of the grid.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Check if a coordinate is within the grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x < self.width && coord.y < self.height
    }

    /// Convert a coordinate to an index into the cell arrays.
    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(usize::from(coord.y) * usize::from(self.width) + usize::from(coord.x))
        } else {
            None
        }
    }

    /// Terrain at a coordinate, or `None` when out of bounds.
    #[must_use]
    pub fn terrain_at(&self, coord: Coord) -> Option<Terrain> {
        self.index(coord).map(|idx| self.terrain[idx])
    }

    /// Check if a coordinate is in bounds and its terrain can be stood on.
    #[must_use]
    pub fn is_walkable(&self, coord: Coord) -> bool {
        self.terrain_at(coord).is_some_and(Terrain::is_walkable)
    }

    /// Set the terrain of a cell.
    ///
    /// Returns `false` if the coordinate is out of bounds, or if the cell is
    /// occupied and the new terrain is not walkable.
    pub fn set_terrain(&mut self, coord: Coord, terrain: Terrain) -> bool {
        let Some(idx) = self.index(coord) else {
            return false;
        };
        if !terrain.is_walkable() && self.occupants[idx].is_some() {
            return false;
        }
        self.terrain[idx] = terrain;
        true
    }

    /// The unit standing on a cell, if any.
    #[must_use]
    pub fn occupant_at(&self, coord: Coord) -> Option<UnitId> {
        self.index(coord).and_then(|idx| self.occupants[idx])
    }

    /// The cell a unit is standing on, if it is on the grid.
    #[must_use]
    pub fn position_of(&self, unit: UnitId) -> Option<Coord> {
        self.positions.get(&unit).copied()
    }

    /// Validate that `unit` may be written into `coord`.
    fn check_destination(&self, unit: UnitId, coord: Coord) -> Result<usize, ActionError> {
        let idx = self.index(coord).ok_or(ActionError::OutOfBounds(coord))?;
        if !self.terrain[idx].is_walkable() {
            return Err(ActionError::NonWalkable(coord));
        }
        match self.occupants[idx] {
            Some(other) if other != unit => Err(ActionError::OccupancyConflict(coord)),
            _ => Ok(idx),
        }
    }

    /// Put a unit that is not yet on the grid onto a cell.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` or `NonWalkable` for an invalid cell, and
    /// `OccupancyConflict` if the cell holds another unit or the unit is
    /// already placed elsewhere. The grid is unchanged on error.
    pub fn place(&mut self, unit: UnitId, coord: Coord) -> Result<(), ActionError> {
        let idx = self.check_destination(unit, coord)?;
        match self.positions.get(&unit) {
            Some(&current) if current == coord => return Ok(()),
            Some(_) => return Err(ActionError::OccupancyConflict(coord)),
            None => {}
        }

        self.occupants[idx] = Some(unit);
        self.positions.insert(unit, coord);
        Ok(())
    }

    /// Move a unit from one cell to another in a single step.
    ///
    /// Both cells are validated before either is written, so a failed move
    /// never leaves the unit on both cells or on neither.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` or `NonWalkable` for an invalid destination, and
    /// `OccupancyConflict` if the destination holds another unit or `from`
    /// does not hold `unit`. The grid is unchanged on error.
    pub fn relocate(&mut self, unit: UnitId, from: Coord, to: Coord) -> Result<(), ActionError> {
        let to_idx = self.check_destination(unit, to)?;
        let from_idx = self
            .index(from)
            .filter(|&idx| self.occupants[idx] == Some(unit))
            .ok_or(ActionError::OccupancyConflict(from))?;

        if from_idx == to_idx {
            return Ok(());
        }

        self.occupants[from_idx] = None;
        self.occupants[to_idx] = Some(unit);
        self.positions.insert(unit, to);
        Ok(())
    }

    /// Take a unit off the grid.
    ///
    /// Returns the cell it was standing on, or `None` if it was not placed.
    pub fn remove(&mut self, unit: UnitId) -> Option<Coord> {
        let coord = self.positions.remove(&unit)?;
        if let Some(idx) = self.index(coord) {
            self.occupants[idx] = None;
        }
        Some(coord)
    }

    /// Number of units on the grid.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterate over every occupied cell in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (Coord, UnitId)> + '_ {
        self.cells()
            .filter_map(|(coord, _, occupant)| occupant.map(|unit| (coord, unit)))
    }

    /// Iterate over the reverse index of unit to cell, in unit id order.
    pub fn placements(&self) -> impl Iterator<Item = (UnitId, Coord)> + '_ {
        self.positions.iter().map(|(&unit, &coord)| (unit, coord))
    }

    /// Iterate over all cells as `(coord, terrain, occupant)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (Coord, Terrain, Option<UnitId>)> + '_ {
        let width = usize::from(self.width);
        self.terrain
            .iter()
            .zip(&self.occupants)
            .enumerate()
            .map(move |(idx, (&terrain, &occupant))| {
                #[allow(clippy::cast_possible_truncation)]
                let coord = Coord::new((idx % width) as u16, (idx / width) as u16);
                (coord, terrain, occupant)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: UnitId = UnitId(1);
    const B: UnitId = UnitId(2);

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(10, 8).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 8);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_grid_zero_size() {
        assert!(Grid::new(0, 10).is_none());
        assert!(Grid::new(10, 0).is_none());
    }

    #[test]
    fn test_grid_bounds() {
        let grid = Grid::new(10, 10).unwrap();
        assert!(grid.in_bounds(Coord::new(0, 0)));
        assert!(grid.in_bounds(Coord::new(9, 9)));
        assert!(!grid.in_bounds(Coord::new(10, 0)));
        assert!(!grid.in_bounds(Coord::new(0, 10)));
    }

    #[test]
    fn test_distances() {
        let a = Coord::new(2, 2);
        assert_eq!(a.manhattan_distance(Coord::new(3, 3)), 2);
        assert_eq!(a.chebyshev_distance(Coord::new(3, 3)), 1);
        assert_eq!(a.manhattan_distance(Coord::new(0, 2)), 2);
        assert_eq!(a.chebyshev_distance(a), 0);
    }

    #[test]
    fn test_adjacency_rules() {
        let center = Coord::new(5, 5);
        assert!(Adjacency::Orthogonal.are_adjacent(center, Coord::new(5, 4)));
        assert!(!Adjacency::Orthogonal.are_adjacent(center, Coord::new(6, 6)));
        assert!(Adjacency::Diagonal.are_adjacent(center, Coord::new(6, 6)));
        assert!(!Adjacency::Diagonal.are_adjacent(center, center));
        assert!(!Adjacency::Diagonal.are_adjacent(center, Coord::new(7, 5)));
    }

    #[test]
    fn test_walkability() {
        let mut grid = Grid::new(4, 4).unwrap();
        let rock = Coord::new(1, 1);
        assert!(grid.is_walkable(rock));
        assert!(grid.set_terrain(rock, Terrain::Blocked));
        assert!(!grid.is_walkable(rock));
        assert!(!grid.is_walkable(Coord::new(4, 0)));
        assert!(!grid.set_terrain(Coord::new(4, 0), Terrain::Blocked));
    }

    #[test]
    fn test_cannot_block_occupied_cell() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.place(A, Coord::new(2, 2)).unwrap();
        assert!(!grid.set_terrain(Coord::new(2, 2), Terrain::Blocked));
        assert_eq!(grid.terrain_at(Coord::new(2, 2)), Some(Terrain::Open));
    }

    #[test]
    fn test_place_and_lookup() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.place(A, Coord::new(1, 2)).unwrap();
        assert_eq!(grid.occupant_at(Coord::new(1, 2)), Some(A));
        assert_eq!(grid.position_of(A), Some(Coord::new(1, 2)));
        assert_eq!(grid.occupant_at(Coord::new(2, 1)), None);
    }

    #[test]
    fn test_place_conflicts() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.set_terrain(Coord::new(3, 3), Terrain::Blocked);
        grid.place(A, Coord::new(0, 0)).unwrap();

        assert_eq!(
            grid.place(B, Coord::new(0, 0)),
            Err(ActionError::OccupancyConflict(Coord::new(0, 0)))
        );
        assert_eq!(
            grid.place(B, Coord::new(9, 0)),
            Err(ActionError::OutOfBounds(Coord::new(9, 0)))
        );
        assert_eq!(
            grid.place(B, Coord::new(3, 3)),
            Err(ActionError::NonWalkable(Coord::new(3, 3)))
        );
        // A unit can only stand on one cell.
        assert_eq!(
            grid.place(A, Coord::new(1, 0)),
            Err(ActionError::OccupancyConflict(Coord::new(1, 0)))
        );
        // Placing again on the same cell is a no-op.
        assert_eq!(grid.place(A, Coord::new(0, 0)), Ok(()));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_relocate_is_atomic() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.place(A, Coord::new(0, 0)).unwrap();
        grid.place(B, Coord::new(1, 0)).unwrap();

        let before = grid.clone();
        assert_eq!(
            grid.relocate(A, Coord::new(0, 0), Coord::new(1, 0)),
            Err(ActionError::OccupancyConflict(Coord::new(1, 0)))
        );
        assert_eq!(grid, before);

        // Wrong source cell.
        assert_eq!(
            grid.relocate(A, Coord::new(2, 2), Coord::new(0, 1)),
            Err(ActionError::OccupancyConflict(Coord::new(2, 2)))
        );
        assert_eq!(grid, before);

        grid.relocate(A, Coord::new(0, 0), Coord::new(0, 1)).unwrap();
        assert_eq!(grid.occupant_at(Coord::new(0, 0)), None);
        assert_eq!(grid.occupant_at(Coord::new(0, 1)), Some(A));
        assert_eq!(grid.position_of(A), Some(Coord::new(0, 1)));
    }

    #[test]
    fn test_remove() {
        let mut grid = Grid::new(4, 4).unwrap();
        grid.place(A, Coord::new(3, 1)).unwrap();
        assert_eq!(grid.remove(A), Some(Coord::new(3, 1)));
        assert_eq!(grid.occupant_at(Coord::new(3, 1)), None);
        assert_eq!(grid.remove(A), None);
    }

    #[test]
    fn test_occupied_cells_row_major() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.place(B, Coord::new(0, 2)).unwrap();
        grid.place(A, Coord::new(2, 0)).unwrap();
        let cells: Vec<_> = grid.occupied_cells().collect();
        assert_eq!(cells, vec![(Coord::new(2, 0), A), (Coord::new(0, 2), B)]);
    }
}
