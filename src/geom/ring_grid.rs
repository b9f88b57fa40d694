use serde::{Deserialize, Serialize};

/// Row-major (axial station, angular sample) indexing over the inner surface.
///
/// Row 0 is the throat, row `length_steps` the mouth. Columns wrap back to 0
/// only when `full_circle` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingGrid {
    pub ring_count: usize,
    pub length_steps: usize,
    pub full_circle: bool,
}

impl RingGrid {
    #[must_use]
    pub const fn new(ring_count: usize, length_steps: usize, full_circle: bool) -> Self {
        Self {
            ring_count,
            length_steps,
            full_circle,
        }
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.length_steps + 1
    }

    /// Number of vertices the grid occupies, `(length_steps + 1) * ring_count`.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.rows() * self.ring_count
    }

    /// Quad columns per row: `ring_count` when wrapping, `ring_count - 1` otherwise.
    #[must_use]
    pub const fn radial_steps(&self) -> usize {
        if self.full_circle {
            self.ring_count
        } else {
            self.ring_count.saturating_sub(1)
        }
    }

    #[must_use]
    pub const fn mouth_row(&self) -> usize {
        self.length_steps
    }

    /// Flat index of `(row, col)` relative to `base`.
    #[must_use]
    pub fn index_from(&self, base: u32, row: usize, col: usize) -> u32 {
        debug_assert!(row < self.rows() && col < self.ring_count);
        base + (row * self.ring_count + col) as u32
    }

    #[must_use]
    pub fn index(&self, row: usize, col: usize) -> u32 {
        self.index_from(0, row, col)
    }

    /// Column after `col` in the same row, wrapping only around a full circle.
    #[must_use]
    pub const fn next_col(&self, col: usize) -> Option<usize> {
        if col + 1 < self.ring_count {
            Some(col + 1)
        } else if self.full_circle && self.ring_count > 1 {
            Some(0)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn prev_col(&self, col: usize) -> Option<usize> {
        if col > 0 {
            Some(col - 1)
        } else if self.full_circle && self.ring_count > 1 {
            Some(self.ring_count - 1)
        } else {
            None
        }
    }

    /// `(row, col)` of a flat index inside the grid.
    #[must_use]
    pub const fn row_col(&self, flat: usize) -> Option<(usize, usize)> {
        if self.ring_count == 0 || flat >= self.vertex_count() {
            return None;
        }
        Some((flat / self.ring_count, flat % self.ring_count))
    }

    /// Whether the grid can carry a surface at all: at least one axial step and
    /// enough columns to form a cell (three to close a loop).
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        let min_columns = if self.full_circle { 3 } else { 2 };
        self.length_steps >= 1 && self.ring_count >= min_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_row_major() {
        let grid = RingGrid::new(8, 4, true);
        assert_eq!(grid.vertex_count(), 40);
        assert_eq!(grid.index(0, 0), 0);
        assert_eq!(grid.index(1, 0), 8);
        assert_eq!(grid.index(4, 7), 39);
        assert_eq!(grid.index_from(40, 2, 3), 59);
        assert_eq!(grid.row_col(19), Some((2, 3)));
        assert_eq!(grid.row_col(40), None);
    }

    #[test]
    fn test_columns_wrap_only_for_full_circle() {
        let full = RingGrid::new(6, 2, true);
        assert_eq!(full.radial_steps(), 6);
        assert_eq!(full.next_col(5), Some(0));
        assert_eq!(full.prev_col(0), Some(5));

        let partial = RingGrid::new(6, 2, false);
        assert_eq!(partial.radial_steps(), 5);
        assert_eq!(partial.next_col(5), None);
        assert_eq!(partial.prev_col(0), None);
        assert_eq!(partial.next_col(2), Some(3));
    }

    #[test]
    fn test_well_formed_requirements() {
        assert!(RingGrid::new(3, 1, true).is_well_formed());
        assert!(!RingGrid::new(2, 1, true).is_well_formed());
        assert!(RingGrid::new(2, 1, false).is_well_formed());
        assert!(!RingGrid::new(8, 0, true).is_well_formed());
        assert!(!RingGrid::new(0, 4, false).is_well_formed());
    }
}
