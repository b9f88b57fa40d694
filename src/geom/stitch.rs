//! Triangulation of the outer shell and the mouth band.
//!
//! The inner surface uses the cell pattern `[i0, i1, i2], [i2, i1, i3]` with
//! `i0 = (r, c)`, `i1 = (r, c + 1)`, `i2 = (r + 1, c)`, `i3 = (r + 1, c + 1)`.
//! The outer shell uses the mirrored winding so both skins face away from the
//! solid, and the mouth band runs its rim edges opposite to the ones the two
//! skins leave open, so every shared edge is walked once in each direction.

use serde::Serialize;

use super::mesh::MeshBuffers;
use super::ring_grid::RingGrid;

/// Triangles kept and dropped by one stitching pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitCounts {
    pub emitted: usize,
    pub rejected: usize,
}

impl EmitCounts {
    pub(crate) fn push(&mut self, mesh: &mut MeshBuffers, a: u32, b: u32, c: u32) {
        if mesh.push_triangle(a, b, c) {
            self.emitted += 1;
        } else {
            self.rejected += 1;
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.emitted += other.emitted;
        self.rejected += other.rejected;
    }
}

/// Triangulate the outer grid starting at `outer_start` with reversed winding.
pub fn stitch_outer_shell(mesh: &mut MeshBuffers, grid: &RingGrid, outer_start: u32) -> EmitCounts {
    let mut counts = EmitCounts::default();

    for row in 0..grid.length_steps {
        for col in 0..grid.radial_steps() {
            let Some(next) = grid.next_col(col) else {
                continue;
            };
            let a = grid.index_from(outer_start, row, col);
            let b = grid.index_from(outer_start, row, next);
            let c = grid.index_from(outer_start, row + 1, col);
            let d = grid.index_from(outer_start, row + 1, next);

            counts.push(mesh, a, c, b);
            counts.push(mesh, c, d, b);
        }
    }

    counts
}

/// Close the gap between the inner and outer mouth rings.
pub fn stitch_mouth_band(mesh: &mut MeshBuffers, grid: &RingGrid, outer_start: u32) -> EmitCounts {
    let mut counts = EmitCounts::default();
    let mouth = grid.mouth_row();

    for col in 0..grid.radial_steps() {
        let Some(next) = grid.next_col(col) else {
            continue;
        };
        let inner_a = grid.index(mouth, col);
        let inner_b = grid.index(mouth, next);
        let outer_a = grid.index_from(outer_start, mouth, col);
        let outer_b = grid.index_from(outer_start, mouth, next);

        counts.push(mesh, inner_a, inner_b, outer_b);
        counts.push(mesh, inner_a, outer_b, outer_a);
    }

    counts
}
