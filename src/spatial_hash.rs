//! Integer-cell spatial hash for the broad phase.
//!
//! The grid only stores membership; which cells a body occupies is the
//! world's registration policy, not the grid's.

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::body_data::BodyId;

/// Discretized cell coordinates.
pub type Cell = (i32, i32);

/// The cell containing a world position at the given cell size.
pub fn cell_of(position: Vec2, cell_size: f32) -> Cell {
    (
        (position.x / cell_size).floor() as i32,
        (position.y / cell_size).floor() as i32,
    )
}

/// Hash grid grouping body identifiers by cell.
#[derive(Debug, Default)]
pub struct SpatialHash {
    cells: FxHashMap<Cell, FxHashSet<BodyId>>,
}

impl SpatialHash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, x: i32, y: i32, id: BodyId) {
        self.cells.entry((x, y)).or_default().insert(id);
    }

    /// Remove `id` from a cell, dropping the cell entry once it empties.
    pub fn remove(&mut self, x: i32, y: i32, id: BodyId) {
        if let Some(members) = self.cells.get_mut(&(x, y)) {
            members.remove(&id);
            if members.is_empty() {
                self.cells.remove(&(x, y));
            }
        }
    }

    /// Members of a cell; `None` for a never-populated (or emptied) cell.
    pub fn get(&self, x: i32, y: i32) -> Option<&FxHashSet<BodyId>> {
        self.cells.get(&(x, y))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_then_remove_leaves_cell_absent() {
        let mut grid = SpatialHash::new();
        grid.insert(3, -2, 7);
        assert!(grid.get(3, -2).is_some_and(|m| m.contains(&7)));

        grid.remove(3, -2, 7);
        assert!(grid.get(3, -2).is_none());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_get_on_never_populated_cell_is_absent() {
        let grid = SpatialHash::new();
        assert!(grid.get(0, 0).is_none());
    }

    #[test]
    fn test_remove_keeps_other_members() {
        let mut grid = SpatialHash::new();
        grid.insert(0, 0, 1);
        grid.insert(0, 0, 2);
        grid.remove(0, 0, 1);
        let members = grid.get(0, 0).expect("cell still populated");
        assert!(members.contains(&2));
        assert!(!members.contains(&1));
    }

    #[test]
    fn test_remove_from_unpopulated_cell_is_a_no_op() {
        let mut grid = SpatialHash::new();
        grid.remove(5, 5, 9);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_cell_of_floors_toward_negative_infinity() {
        assert_eq!(cell_of(Vec2::new(4.9, 0.1), 5.0), (0, 0));
        assert_eq!(cell_of(Vec2::new(5.0, -0.1), 5.0), (1, -1));
        assert_eq!(cell_of(Vec2::new(-0.1, -5.1), 5.0), (-1, -2));
    }
}
