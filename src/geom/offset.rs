//! Offset direction resolution and the outer shell of a freestanding wall.
//!
//! Face-accumulated normals point inward or outward depending on the winding
//! the upstream extrusion used. [`resolve_offset_sign`] decides which way is
//! out by comparing a sample of normals against the horizontal radial
//! direction, and [`build_outer_shell`] moves a copy of the inner grid that way.
//!
//! # Example
//!
//! ```ignore
//! use waveguide_engine::geom::{build_outer_shell, estimate_vertex_normals, resolve_offset_sign};
//!
//! let normals = estimate_vertex_normals(&mesh, &grid).normals;
//! let sign = resolve_offset_sign(&mesh, &normals, grid.vertex_count());
//! let outer_start = build_outer_shell(&mut mesh, &normals, &grid, 2.0, sign);
//! ```

use serde::Serialize;

use super::mesh::MeshBuffers;
use super::ring_grid::RingGrid;
use super::{Point3, Tolerance, Vec3};

/// Upper bound on the number of vertices sampled when resolving the sign.
const SIGN_SAMPLE_TARGET: usize = 64;

/// Multiplier applied to the estimated normals to point them away from the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OffsetSign {
    /// Normals already point outward.
    Positive,
    /// Normals point toward the axis and must be flipped.
    #[default]
    Negative,
}

impl OffsetSign {
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

/// Decide whether `normals` point away from the horn axis on average.
///
/// Every `max(1, inner_count / 64)`-th vertex is sampled. Samples sitting on
/// the axis (`hypot(x, z) <= 1e-9`) or with a degenerate normal are skipped.
/// The dot products between the horizontal radial direction and the
/// horizontal part of the normal are summed; a negative sum gives
/// [`OffsetSign::Negative`]. With no usable sample the result is
/// [`OffsetSign::Negative`].
#[must_use]
pub fn resolve_offset_sign(mesh: &MeshBuffers, normals: &[Vec3], inner_count: usize) -> OffsetSign {
    let count = inner_count.min(normals.len()).min(mesh.vertex_count());
    let stride = (count / SIGN_SAMPLE_TARGET).max(1);
    let tol = Tolerance::DEFAULT;
    let zero = Tolerance::ZERO_LENGTH;

    let mut samples = 0usize;
    let mut dot_sum = 0.0;
    for i in (0..count).step_by(stride) {
        let p = Point3::from_array(mesh.positions[i]);
        if tol.is_zero_length(p.radial_distance()) {
            continue;
        }
        let normal = normals[i];
        if zero.is_zero_vec3(normal) {
            continue;
        }
        let (Some(radial), Some(horizontal)) = (
            p.to_vec3().horizontal().normalized(),
            normal.horizontal().normalized(),
        ) else {
            continue;
        };

        dot_sum += radial.dot(horizontal);
        samples += 1;
    }

    if samples == 0 {
        log::debug!("no usable samples for offset sign; defaulting to negative");
        return OffsetSign::Negative;
    }

    if dot_sum < 0.0 {
        OffsetSign::Negative
    } else {
        OffsetSign::Positive
    }
}

/// Append an offset copy of the inner grid and return the index of its first vertex.
///
/// Every vertex moves by `sign * thickness` along its normalized normal,
/// except throat vertices (row 0), which move `thickness` in the XZ plane
/// only so the outer throat ring stays in the inner throat plane. When a
/// throat normal has no horizontal part the vertex moves radially outward
/// instead, and a vertex on the axis with no usable direction is copied
/// unchanged.
pub fn build_outer_shell(
    mesh: &mut MeshBuffers,
    normals: &[Vec3],
    grid: &RingGrid,
    thickness: f64,
    sign: OffsetSign,
) -> u32 {
    let inner_count = grid.vertex_count().min(mesh.vertex_count());
    let outer_start = mesh.vertex_count() as u32;
    let s = sign.value();

    for i in 0..inner_count {
        let p = Point3::from_array(mesh.positions[i]);
        let normal = normals.get(i).copied().unwrap_or(Vec3::ZERO);
        let is_throat = i < grid.ring_count;

        let direction = if is_throat {
            normal
                .horizontal()
                .normalized()
                .map(|n| n * s)
                .or_else(|| p.to_vec3().horizontal().normalized())
        } else {
            normal
                .normalized()
                .map(|n| n * s)
                .or_else(|| p.to_vec3().horizontal().normalized())
        };

        let moved = direction.map_or(p, |dir| p + dir * thickness);
        mesh.push_vertex(moved);
    }

    outer_start
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    /// Straight cylinder of radius `r` with outward normals.
    fn cylinder(ring: usize, steps: usize, r: f64) -> (MeshBuffers, RingGrid, Vec<Vec3>) {
        let grid = RingGrid::new(ring, steps, true);
        let mut mesh = MeshBuffers::new();
        let mut normals = Vec::new();
        for row in 0..=steps {
            for col in 0..ring {
                let a = TAU * col as f64 / ring as f64;
                mesh.push_vertex(Point3::new(r * a.cos(), row as f64 * 10.0, r * a.sin()));
                normals.push(Vec3::new(a.cos(), 0.0, a.sin()));
            }
        }
        (mesh, grid, normals)
    }

    #[test]
    fn test_outward_normals_resolve_positive() {
        let (mesh, grid, normals) = cylinder(8, 3, 5.0);
        assert_eq!(
            resolve_offset_sign(&mesh, &normals, grid.vertex_count()),
            OffsetSign::Positive
        );
    }

    #[test]
    fn test_reversed_normals_flip_sign() {
        let (mesh, grid, normals) = cylinder(12, 4, 5.0);
        let reversed: Vec<Vec3> = normals.iter().map(|n| -*n).collect();
        let forward = resolve_offset_sign(&mesh, &normals, grid.vertex_count());
        let backward = resolve_offset_sign(&mesh, &reversed, grid.vertex_count());
        assert_eq!(backward, forward.flipped());
    }

    #[test]
    fn test_axis_only_geometry_defaults_negative() {
        let mut mesh = MeshBuffers::new();
        for y in 0..4 {
            mesh.push_vertex(Point3::new(0.0, y as f64, 0.0));
        }
        let normals = vec![Vec3::new(1.0, 0.0, 0.0); 4];
        assert_eq!(resolve_offset_sign(&mesh, &normals, 4), OffsetSign::Negative);
        assert_eq!(resolve_offset_sign(&mesh, &[], 4), OffsetSign::Negative);
    }

    #[test]
    fn test_outer_shell_offsets_by_thickness() {
        let (mut mesh, grid, normals) = cylinder(8, 2, 5.0);
        let start = build_outer_shell(&mut mesh, &normals, &grid, 2.0, OffsetSign::Positive);
        assert_eq!(start, 24);
        assert_eq!(mesh.vertex_count(), 48);
        for i in 0..24 {
            let inner = Point3::from_array(mesh.positions[i]);
            let outer = Point3::from_array(mesh.positions[24 + i]);
            assert!((outer.radial_distance() - 7.0).abs() < 1e-9);
            assert!((outer.y - inner.y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_throat_row_stays_in_plane() {
        let (mut mesh, grid, mut normals) = cylinder(6, 1, 4.0);
        // Tilt every normal toward +Y; only rows above the throat may follow.
        for n in &mut normals {
            *n = *n + Vec3::new(0.0, 1.0, 0.0);
        }
        let start = build_outer_shell(&mut mesh, &normals, &grid, 1.0, OffsetSign::Positive) as usize;
        for col in 0..6 {
            let throat = Point3::from_array(mesh.positions[start + col]);
            assert_eq!(throat.y, 0.0);
            assert!((throat.radial_distance() - 5.0).abs() < 1e-9);
            let mouth = Point3::from_array(mesh.positions[start + 6 + col]);
            assert!(mouth.y > 10.0);
        }
    }

    #[test]
    fn test_axial_throat_normal_falls_back_to_radial() {
        let (mut mesh, grid, mut normals) = cylinder(4, 1, 2.0);
        for n in normals.iter_mut().take(4) {
            *n = Vec3::DOWN;
        }
        let start = build_outer_shell(&mut mesh, &normals, &grid, 0.5, OffsetSign::Negative) as usize;
        let p = Point3::from_array(mesh.positions[start]);
        assert!((p.x - 2.5).abs() < 1e-12);
        assert_eq!(p.y, 0.0);
    }
}
