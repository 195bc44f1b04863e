//! Dense voxel grid
//!
//! A [`VoxelGrid`] is a perfect N×N×N cube of optional [`Color`]s. Reads
//! outside the cube are defined to be empty rather than an error, which lets
//! the mesher query all six neighbors of a boundary cell without special cases.

use crate::color::Color;

/// Dense cube of optional cell colors
#[derive(Debug, Clone, Default)]
pub struct VoxelGrid {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl VoxelGrid {
    /// Create an empty grid with side length `size`
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size.pow(3)],
        }
    }

    /// Side length of the cube
    pub fn size(&self) -> usize {
        self.size
    }

    /// Total number of cells (`size³`)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Read a cell
    ///
    /// Any coordinate outside `0..size`, including negative ones, reads as empty.
    pub fn get(&self, x: i64, y: i64, z: i64) -> Option<&Color> {
        self.index_of(x, y, z)
            .and_then(|index| self.cells.get(index))
            .and_then(Option::as_ref)
    }

    /// Whether the cell holds a color
    pub fn is_occupied(&self, x: i64, y: i64, z: i64) -> bool {
        self.get(x, y, z).is_some()
    }

    /// Write a cell
    ///
    /// Out-of-range writes are ignored; the runner only writes in-bounds cells.
    pub fn set(&mut self, x: usize, y: usize, z: usize, color: impl Into<Option<Color>>) {
        if x >= self.size || y >= self.size || z >= self.size {
            tracing::debug!(x, y, z, size = self.size, "ignoring out-of-bounds grid write");
            return;
        }
        let index = self.flat_index(x, y, z);
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = color.into();
        }
    }

    /// Clear a cell
    pub fn clear(&mut self, x: usize, y: usize, z: usize) {
        self.set(x, y, z, None::<Color>);
    }

    /// Set every cell to empty
    ///
    /// Re-allocates when the backing storage does not match `size³` (a fresh
    /// default grid, or one whose size was just changed).
    pub fn reset_all(&mut self) {
        let expected = self.size.pow(3);
        if self.cells.len() == expected {
            self.cells.fill(None);
        } else {
            self.cells = vec![None; expected];
        }
    }

    /// Change the side length; all cells become empty
    pub fn resize(&mut self, size: usize) {
        self.size = size;
        self.reset_all();
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Iterate every cell coordinate in the fixed `y`, `z`, `x` order (outer to inner)
    pub fn coords(&self) -> impl Iterator<Item = (usize, usize, usize)> + use<> {
        let size = self.size;
        (0..size).flat_map(move |y| (0..size).flat_map(move |z| (0..size).map(move |x| (x, y, z))))
    }

    /// Iterate occupied cells in the same fixed order as [`VoxelGrid::coords`]
    pub fn iter_occupied(&self) -> impl Iterator<Item = ((usize, usize, usize), &Color)> + '_ {
        self.coords().filter_map(|(x, y, z)| {
            self.cells
                .get(self.flat_index(x, y, z))
                .and_then(Option::as_ref)
                .map(|color| ((x, y, z), color))
        })
    }

    fn index_of(&self, x: i64, y: i64, z: i64) -> Option<usize> {
        let size = self.size as i64;
        let in_range = |v: i64| (0..size).contains(&v);
        if in_range(x) && in_range(y) && in_range(z) {
            Some(self.flat_index(x as usize, y as usize, z as usize))
        } else {
            None
        }
    }

    fn flat_index(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.size + z) * self.size + x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = VoxelGrid::new(4);
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.len(), 64);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_set_then_get() {
        let mut grid = VoxelGrid::new(3);
        grid.set(0, 1, 2, Color::token("red"));
        assert_eq!(grid.get(0, 1, 2), Some(&Color::token("red")));
        assert_eq!(grid.get(2, 1, 0), None);

        grid.reset_all();
        assert_eq!(grid.get(0, 1, 2), None);
    }

    #[test]
    fn test_out_of_bounds_reads_are_empty() {
        let mut grid = VoxelGrid::new(2);
        grid.set(0, 0, 0, Color::Default);
        assert!(grid.is_occupied(0, 0, 0));
        assert!(!grid.is_occupied(-1, 0, 0));
        assert!(!grid.is_occupied(0, 2, 0));
        assert!(!grid.is_occupied(0, 0, i64::MAX));
    }

    #[test]
    fn test_out_of_bounds_write_ignored() {
        let mut grid = VoxelGrid::new(2);
        grid.set(2, 0, 0, Color::Default);
        assert_eq!(grid.occupied_count(), 0);
        assert_eq!(grid.len(), 8);
    }

    #[test]
    fn test_reset_all_idempotent() {
        let mut grid = VoxelGrid::new(2);
        grid.set(1, 1, 1, Color::Default);
        grid.reset_all();
        grid.reset_all();
        assert_eq!(grid.occupied_count(), 0);
        assert_eq!(grid.len(), 8);
    }

    #[test]
    fn test_reset_all_on_default_grid() {
        let mut grid = VoxelGrid::default();
        grid.reset_all();
        assert_eq!(grid.len(), 0);
        assert!(grid.is_empty());
    }

    #[test]
    fn test_resize_clears() {
        let mut grid = VoxelGrid::new(2);
        grid.set(1, 1, 1, Color::Default);
        grid.resize(5);
        assert_eq!(grid.size(), 5);
        assert_eq!(grid.len(), 125);
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_iteration_order() {
        let grid = VoxelGrid::new(2);
        let coords: Vec<_> = grid.coords().collect();
        assert_eq!(coords.len(), 8);
        assert_eq!(coords[0], (0, 0, 0));
        assert_eq!(coords[1], (1, 0, 0));
        assert_eq!(coords[2], (0, 0, 1));
        assert_eq!(coords[4], (0, 1, 0));
    }

    #[test]
    fn test_iter_occupied() {
        let mut grid = VoxelGrid::new(3);
        grid.set(2, 0, 0, Color::token("red"));
        grid.set(0, 2, 0, Color::token("blue"));
        let occupied: Vec<_> = grid.iter_occupied().map(|(pos, _)| pos).collect();
        assert_eq!(occupied, vec![(2, 0, 0), (0, 2, 0)]);
    }
}
