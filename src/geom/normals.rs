//! Per-vertex normal estimation for the inner ring-grid surface.

use super::mesh::MeshBuffers;
use super::ring_grid::RingGrid;
use super::{Point3, Tolerance, Vec3};

/// Normals of the inner grid plus how many needed a fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalEstimate {
    pub normals: Vec<Vec3>,
    pub filled_count: usize,
}

/// Estimate one normal per inner-grid vertex.
///
/// Each triangle adds its unnormalized cross product `(b - a) x (c - a)` to
/// its three corners, so larger faces weigh more. Triangles touching any index
/// at or past `grid.vertex_count()` belong to geometry appended later and are
/// skipped. The returned vectors are not normalized.
///
/// Vertices left with a zero-length accumulation are filled, in order, from:
/// 1. the sum of the raw accumulations of their up/down/left/right grid
///    neighbors (columns wrap only for a full circle),
/// 2. their own horizontal radial direction `(x, 0, z)`,
/// 3. [`Vec3::DOWN`].
#[must_use]
pub fn estimate_vertex_normals(mesh: &MeshBuffers, grid: &RingGrid) -> NormalEstimate {
    let inner_count = grid.vertex_count().min(mesh.vertex_count());
    let raw = accumulate_face_normals(mesh, inner_count);

    let tol = Tolerance::ZERO_LENGTH;
    let mut normals = raw.clone();
    let mut filled_count = 0usize;
    for (i, normal) in normals.iter_mut().enumerate() {
        if !tol.is_zero_vec3(*normal) {
            continue;
        }
        filled_count += 1;
        *normal = fill_degenerate_normal(mesh, grid, &raw, i, tol);
    }

    if filled_count > 0 {
        log::debug!("filled {filled_count} of {inner_count} degenerate vertex normals");
    }
    NormalEstimate {
        normals,
        filled_count,
    }
}

fn accumulate_face_normals(mesh: &MeshBuffers, inner_count: usize) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; inner_count];

    for tri in mesh.indices.chunks_exact(3) {
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;
        if i0 >= inner_count || i1 >= inner_count || i2 >= inner_count {
            continue;
        }

        let a = Point3::from_array(mesh.positions[i0]);
        let b = Point3::from_array(mesh.positions[i1]);
        let c = Point3::from_array(mesh.positions[i2]);
        let face_normal = b.sub_point(a).cross(c.sub_point(a));
        if !face_normal.is_finite() {
            continue;
        }

        normals[i0] = normals[i0] + face_normal;
        normals[i1] = normals[i1] + face_normal;
        normals[i2] = normals[i2] + face_normal;
    }

    normals
}

fn fill_degenerate_normal(
    mesh: &MeshBuffers,
    grid: &RingGrid,
    raw: &[Vec3],
    index: usize,
    tol: Tolerance,
) -> Vec3 {
    if let Some((row, col)) = grid.row_col(index) {
        let mut neighbors = Vec::with_capacity(4);
        if row + 1 < grid.rows() {
            neighbors.push((row + 1, col));
        }
        if row > 0 {
            neighbors.push((row - 1, col));
        }
        if let Some(prev) = grid.prev_col(col) {
            neighbors.push((row, prev));
        }
        if let Some(next) = grid.next_col(col) {
            neighbors.push((row, next));
        }

        let sum = neighbors
            .into_iter()
            .filter_map(|(r, c)| raw.get(grid.index(r, c) as usize))
            .fold(Vec3::ZERO, |acc, n| acc + *n);
        if !tol.is_zero_vec3(sum) {
            return sum;
        }
    }

    let radial = mesh
        .point(index)
        .map_or(Vec3::ZERO, |p| p.to_vec3().horizontal());
    match radial.normalized() {
        Some(dir) if !tol.is_zero_vec3(radial) => dir,
        _ => Vec3::DOWN,
    }
}
