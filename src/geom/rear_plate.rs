//! Rear end-cap for the freestanding wall.
//!
//! The outer throat ring is copied one wall thickness behind the throat plane,
//! joined to the original ring by a thin axial strip, and the copy is filled
//! with a planar disc of concentric rings. On a full circle the angular point
//! count of a ring is halved whenever its segments would get much shorter than
//! the ring spacing, so triangles stay reasonably shaped all the way to the
//! centre.
//!
//! A decimated ring keeps every other vertex of the ring outside it, so each of
//! its vertices is also a vertex (by column) of the outer ring and the two
//! rings can be stitched without any rounding of index positions.

use std::f64::consts::TAU;

use serde::Serialize;

use super::mesh::MeshBuffers;
use super::ring_grid::RingGrid;
use super::stitch::EmitCounts;
use super::{Point3, Tolerance};

/// Ring spacing never drops below this fraction of the disc radius.
const MIN_SPACING_FRACTION: f64 = 1.0 / 32.0;
/// Halve the point count when segment length falls under this share of the spacing.
const DECIMATION_RATIO: f64 = 0.6;
/// Rings with fewer points than this are never halved.
const MIN_DECIMATION_COUNT: usize = 6;

/// Shape of the disc the capper produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RearPlateReport {
    /// Radial distance between consecutive disc rings.
    pub spacing: f64,
    /// Mean distance of the rim vertices from the disc centre.
    pub mean_radius: f64,
    /// Angular extent covered by the rim; `2π` for a full circle.
    pub angular_span: f64,
    /// Axial position of the disc plane.
    pub disc_y: f64,
    /// Radius of every interior ring, outermost first.
    pub ring_radii: Vec<f64>,
    /// Point count of every interior ring, matching `ring_radii`.
    pub ring_counts: Vec<usize>,
    /// Radius of the innermost emitted ring; the rim radius when the rim is
    /// fanned straight into the centre.
    pub last_ring_radius: f64,
    /// Radius the next ring would have had when the disc collapsed. Never
    /// emitted; always within half a spacing of the centre.
    pub next_radius_at_collapse: f64,
    /// Index of the centre vertex.
    pub center_index: u32,
    /// Triangles of the axial strip.
    pub strip: EmitCounts,
    /// Triangles of the disc, rings and centre fan together.
    pub disc: EmitCounts,
}

impl RearPlateReport {
    /// Number of interior rings between the rim and the centre.
    #[must_use]
    pub fn ring_steps(&self) -> usize {
        self.ring_radii.len()
    }

    #[must_use]
    pub fn emitted(&self) -> usize {
        self.strip.emitted + self.disc.emitted
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.strip.rejected + self.disc.rejected
    }
}

/// One ring of the disc: vertex indices plus the rim column each one came from.
#[derive(Debug, Clone)]
struct DiscRing {
    vertices: Vec<u32>,
    columns: Vec<usize>,
}

/// Cap the outer throat ring starting at `outer_start` with a strip and disc.
///
/// `thickness` must be positive; it sets the axial depth of the strip and the
/// minimum ring spacing.
pub fn build_rear_plate(
    mesh: &mut MeshBuffers,
    grid: &RingGrid,
    outer_start: u32,
    thickness: f64,
) -> RearPlateReport {
    let count = grid.ring_count;
    let throat: Vec<Point3> = (0..count)
        .filter_map(|col| mesh.point(grid.index_from(outer_start, 0, col) as usize))
        .collect();
    if throat.len() != count || count == 0 {
        return RearPlateReport::default();
    }

    let throat_y = throat.iter().map(|p| p.y).sum::<f64>() / count as f64;
    let disc_y = throat_y - thickness;

    let center = if grid.full_circle {
        let sum = throat
            .iter()
            .fold((0.0, 0.0), |(x, z), p| (x + p.x, z + p.z));
        Point3::new(sum.0 / count as f64, disc_y, sum.1 / count as f64)
    } else {
        Point3::new(0.0, disc_y, 0.0)
    };

    let mean_radius = throat
        .iter()
        .map(|p| (p.x - center.x).hypot(p.z - center.z))
        .sum::<f64>()
        / count as f64;
    let angular_span = if grid.full_circle {
        TAU
    } else {
        rim_angular_span(&throat, center)
    };
    let spacing = thickness.max(mean_radius * MIN_SPACING_FRACTION);

    let mut report = RearPlateReport {
        spacing,
        mean_radius,
        angular_span,
        disc_y,
        ..RearPlateReport::default()
    };

    // Rim: the throat ring dropped onto the disc plane.
    let rim_points: Vec<Point3> = throat
        .iter()
        .map(|p| Point3::new(p.x, disc_y, p.z))
        .collect();
    let rim = DiscRing {
        vertices: rim_points.iter().map(|p| mesh.push_vertex(*p)).collect(),
        columns: (0..count).collect(),
    };

    // Axial strip between the outer throat ring and the rim.
    for col in 0..grid.radial_steps() {
        let Some(next) = grid.next_col(col) else {
            continue;
        };
        let p = grid.index_from(outer_start, 0, col);
        let q = grid.index_from(outer_start, 0, next);
        let r = rim.vertices[col];
        let s = rim.vertices[next];
        report.strip.push(mesh, p, q, s);
        report.strip.push(mesh, p, s, r);
    }

    let tol = Tolerance::ZERO_LENGTH;
    let mut current = rim;
    let mut radius = mean_radius;
    loop {
        let next_radius = radius - spacing;
        if next_radius <= spacing * 0.5 {
            report.last_ring_radius = radius;
            report.next_radius_at_collapse = next_radius;
            break;
        }

        let mut columns = current.columns.clone();
        let segments = if grid.full_circle {
            columns.len()
        } else {
            columns.len().saturating_sub(1).max(1)
        };
        let segment_length = next_radius * angular_span / segments as f64;
        if grid.full_circle
            && columns.len() >= MIN_DECIMATION_COUNT
            && segment_length < DECIMATION_RATIO * spacing
        {
            columns = columns.into_iter().step_by(2).collect();
        }

        let scale = if tol.is_zero_length(mean_radius) {
            0.0
        } else {
            next_radius / mean_radius
        };
        let vertices = columns
            .iter()
            .map(|&col| {
                let rim_point = rim_points[col];
                mesh.push_vertex(center + rim_point.sub_point(center) * scale)
            })
            .collect();
        let ring = DiscRing { vertices, columns };

        stitch_rings(mesh, &current, &ring, grid.full_circle, &mut report.disc);
        report.ring_radii.push(next_radius);
        report.ring_counts.push(ring.vertices.len());

        current = ring;
        radius = next_radius;
    }

    let center_index = mesh.push_vertex(center);
    report.center_index = center_index;
    let n = current.vertices.len();
    let fan_edges = if grid.full_circle { n } else { n.saturating_sub(1) };
    for k in 0..fan_edges {
        let a = current.vertices[k];
        let b = current.vertices[(k + 1) % n];
        report.disc.push(mesh, a, b, center_index);
    }

    log::debug!(
        "rear plate: {} rings, spacing {:.4}, mean radius {:.4}, last ring {:.4}, collapse at {:.4}",
        report.ring_steps(),
        spacing,
        mean_radius,
        report.last_ring_radius,
        report.next_radius_at_collapse
    );

    report
}

/// Stitch ring `outer` to the (possibly decimated) ring `inner`.
///
/// `inner` keeps a subset of the columns of `outer`, in order and starting at
/// the same column. Each inner edge `j -> j + 1` spans outer vertices
/// `a..=b`: outer edges in the first half of the span fan to inner vertex `j`,
/// the rest to `j + 1`, and one triangle joins the middle outer vertex to the
/// inner edge. A span of one is a plain quad strip, a span of two the usual
/// 2:1 fan.
fn stitch_rings(
    mesh: &mut MeshBuffers,
    outer: &DiscRing,
    inner: &DiscRing,
    full_circle: bool,
    counts: &mut EmitCounts,
) {
    let outer_n = outer.vertices.len();
    let inner_n = inner.vertices.len();
    if outer_n == 0 || inner_n == 0 {
        return;
    }

    // Position of each inner vertex in the outer ring.
    let mut positions = Vec::with_capacity(inner_n);
    let mut cursor = 0usize;
    for &col in &inner.columns {
        while cursor < outer_n && outer.columns[cursor] != col {
            cursor += 1;
        }
        if cursor == outer_n {
            return;
        }
        positions.push(cursor);
    }

    let edges = if full_circle { inner_n } else { inner_n - 1 };
    for j in 0..edges {
        let j1 = (j + 1) % inner_n;
        let start = positions[j];
        let end = if j1 == 0 { outer_n } else { positions[j1] };
        let span = end - start;
        let mid = start + span / 2;

        let nj = inner.vertices[j];
        let nj1 = inner.vertices[j1];
        for i in start..end {
            let pi = outer.vertices[i % outer_n];
            let pi1 = outer.vertices[(i + 1) % outer_n];
            if i < mid {
                counts.push(mesh, pi, pi1, nj);
            } else {
                counts.push(mesh, pi, pi1, nj1);
            }
        }
        counts.push(mesh, outer.vertices[mid % outer_n], nj1, nj);
    }
}

/// Angle between the first and last rim vertex around the disc centre,
/// following the rim's own direction of travel.
fn rim_angular_span(rim: &[Point3], center: Point3) -> f64 {
    let angle = |p: &Point3| (p.z - center.z).atan2(p.x - center.x);
    let mut span = 0.0;
    for w in rim.windows(2) {
        let mut step = angle(&w[1]) - angle(&w[0]);
        if step > std::f64::consts::PI {
            step -= TAU;
        } else if step < -std::f64::consts::PI {
            step += TAU;
        }
        span += step;
    }
    span.abs()
}
