//! Inner horn surface extrusion from a cross-section profile.
//!
//! The profile is sampled at `length_steps + 1` stations from throat (`t = 0`)
//! to mouth (`t = 1`). Each station is a rounded rectangle in the XZ plane at
//! height `axial`, sampled at the shared angle list. The resulting ring grid is
//! the input of the wall builder.

use serde::{Deserialize, Serialize};

use super::groups::{GroupError, MeshRegion, TriangleRange};
use super::mesh::MeshBuffers;
use super::ring_grid::RingGrid;
use super::Point3;

/// Cross-section size and axial position of one profile station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationExtents {
    pub axial: f64,
    pub half_width: f64,
    pub half_height: f64,
    pub corner_radius: f64,
}

/// Source of per-station cross-section extents along the horn axis.
pub trait CrossSectionProfile {
    /// Extents at normalized position `t` in `[0, 1]`, throat to mouth.
    fn station(&self, t: f64) -> StationExtents;
}

/// Cross-section size used by [`LinearProfile`] at either end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSize {
    pub half_width: f64,
    pub half_height: f64,
    #[serde(default)]
    pub corner_radius: f64,
}

impl SectionSize {
    #[must_use]
    pub const fn new(half_width: f64, half_height: f64) -> Self {
        Self {
            half_width,
            half_height,
            corner_radius: 0.0,
        }
    }

    #[must_use]
    pub const fn circle(radius: f64) -> Self {
        Self {
            half_width: radius,
            half_height: radius,
            corner_radius: radius,
        }
    }

    #[must_use]
    pub const fn corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = radius;
        self
    }
}

/// Straight-sided (conical) horn interpolating linearly from throat to mouth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearProfile {
    pub throat: SectionSize,
    pub mouth: SectionSize,
    pub length: f64,
}

impl LinearProfile {
    #[must_use]
    pub const fn new(throat: SectionSize, mouth: SectionSize, length: f64) -> Self {
        Self {
            throat,
            mouth,
            length,
        }
    }
}

impl CrossSectionProfile for LinearProfile {
    fn station(&self, t: f64) -> StationExtents {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: f64, b: f64| a + (b - a) * t;
        StationExtents {
            axial: self.length * t,
            half_width: lerp(self.throat.half_width, self.mouth.half_width),
            half_height: lerp(self.throat.half_height, self.mouth.half_height),
            corner_radius: lerp(self.throat.corner_radius, self.mouth.corner_radius),
        }
    }
}

/// Where a ray from the axis at `angle` meets a rounded rectangle.
///
/// Returns `(x, z)`. The corner radius is clipped to the smaller half-extent;
/// non-positive extents give the origin.
#[must_use]
pub fn rounded_rect_point(angle: f64, half_width: f64, half_height: f64, corner_radius: f64) -> (f64, f64) {
    if !(half_width > 0.0 && half_height > 0.0) || !angle.is_finite() {
        return (0.0, 0.0);
    }
    let r = if corner_radius.is_finite() {
        corner_radius.clamp(0.0, half_width.min(half_height))
    } else {
        0.0
    };

    let (sin, cos) = angle.sin_cos();
    let dx = cos.abs();
    let dz = sin.abs();

    // Distance to the bounding rectangle along the ray.
    let tx = if dx > 0.0 { half_width / dx } else { f64::INFINITY };
    let tz = if dz > 0.0 { half_height / dz } else { f64::INFINITY };
    let mut t = tx.min(tz);

    let cx = half_width - r;
    let cz = half_height - r;
    if r > 0.0 && t * dx > cx && t * dz > cz {
        // Far intersection of the ray with the corner circle.
        let along = dx * cx + dz * cz;
        let disc = along * along - (cx * cx + cz * cz - r * r);
        t = along + disc.max(0.0).sqrt();
    }

    (t * dx * cos.signum(), t * dz * sin.signum())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtrusionError {
    #[error("grid has {expected} columns but {actual} angles were given")]
    AngleCountMismatch { expected: usize, actual: usize },

    #[error("inner surface must start at vertex 0 (mesh already has {0} vertices)")]
    MeshNotEmpty(usize),

    #[error("ring grid {ring_count}x{length_steps} cannot carry a surface")]
    MalformedGrid { ring_count: usize, length_steps: usize },

    #[error(transparent)]
    Group(#[from] GroupError),
}

/// Append the inner surface ring grid and its triangles to an empty mesh.
///
/// Cells use the winding `[i0, i1, i2], [i2, i1, i3]`, which for increasing
/// angles makes the face normals point toward the axis. The triangle range is
/// recorded as [`MeshRegion::InnerSurface`].
///
/// # Errors
/// Fails when the mesh is not empty, the grid is malformed, or the angle count
/// differs from `grid.ring_count`.
pub fn extrude_inner_surface(
    mesh: &mut MeshBuffers,
    profile: &impl CrossSectionProfile,
    angles: &[f64],
    grid: &RingGrid,
) -> Result<TriangleRange, ExtrusionError> {
    if mesh.vertex_count() != 0 {
        return Err(ExtrusionError::MeshNotEmpty(mesh.vertex_count()));
    }
    if !grid.is_well_formed() {
        return Err(ExtrusionError::MalformedGrid {
            ring_count: grid.ring_count,
            length_steps: grid.length_steps,
        });
    }
    if angles.len() != grid.ring_count {
        return Err(ExtrusionError::AngleCountMismatch {
            expected: grid.ring_count,
            actual: angles.len(),
        });
    }

    for row in 0..grid.rows() {
        let station = profile.station(row as f64 / grid.length_steps as f64);
        for &angle in angles {
            let (x, z) = rounded_rect_point(
                angle,
                station.half_width,
                station.half_height,
                station.corner_radius,
            );
            mesh.push_vertex(Point3::new(x, station.axial, z));
        }
    }

    let start = mesh.triangle_count();
    for row in 0..grid.length_steps {
        for col in 0..grid.radial_steps() {
            let Some(next) = grid.next_col(col) else {
                continue;
            };
            let i0 = grid.index(row, col);
            let i1 = grid.index(row, next);
            let i2 = grid.index(row + 1, col);
            let i3 = grid.index(row + 1, next);

            mesh.push_triangle(i0, i1, i2);
            mesh.push_triangle(i2, i1, i3);
        }
    }

    let range = TriangleRange::new(start, mesh.triangle_count());
    mesh.groups.record(MeshRegion::InnerSurface, range)?;

    let expected = 2 * grid.length_steps * grid.radial_steps();
    if range.len() < expected {
        log::debug!(
            "inner surface dropped {} degenerate triangles",
            expected - range.len()
        );
    }

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

    #[test]
    fn test_rect_point_on_axes() {
        let (x, z) = rounded_rect_point(0.0, 40.0, 25.0, 5.0);
        assert!((x - 40.0).abs() < 1e-12 && z.abs() < 1e-12);
        let (x, z) = rounded_rect_point(FRAC_PI_2, 40.0, 25.0, 5.0);
        assert!(x.abs() < 1e-9 && (z - 25.0).abs() < 1e-12);
        let (x, z) = rounded_rect_point(PI, 40.0, 25.0, 5.0);
        assert!((x + 40.0).abs() < 1e-9 && z.abs() < 1e-9);
    }

    #[test]
    fn test_sharp_corner_hits_corner() {
        let (x, z) = rounded_rect_point(FRAC_PI_4, 10.0, 10.0, 0.0);
        assert!((x - 10.0).abs() < 1e-9 && (z - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_rounding_is_a_circle() {
        for i in 0..16 {
            let a = TAU * i as f64 / 16.0;
            let (x, z) = rounded_rect_point(a, 7.0, 7.0, 7.0);
            assert!((x.hypot(z) - 7.0).abs() < 1e-9);
            assert!((z.atan2(x).rem_euclid(TAU) - a).abs() < 1e-9 || i == 0);
        }
    }

    #[test]
    fn test_rounded_corner_point_lies_on_arc() {
        let (hw, hh, r) = (30.0, 20.0, 6.0);
        // The corner arc spans roughly 0.44..0.69 rad for these extents.
        let (x, z) = rounded_rect_point(0.55, hw, hh, r);
        let d = (x - (hw - r)).hypot(z - (hh - r));
        assert!((d - r).abs() < 1e-9);
    }

    #[test]
    fn test_linear_profile_interpolates() {
        let profile = LinearProfile::new(SectionSize::circle(10.0), SectionSize::new(50.0, 30.0), 100.0);
        let mid = profile.station(0.5);
        assert_eq!(mid.axial, 50.0);
        assert_eq!(mid.half_width, 30.0);
        assert_eq!(mid.half_height, 20.0);
        assert_eq!(mid.corner_radius, 5.0);
        assert_eq!(profile.station(2.0).axial, 100.0);
    }

    #[test]
    fn test_extrusion_records_inner_surface() {
        let profile = LinearProfile::new(SectionSize::circle(5.0), SectionSize::circle(20.0), 40.0);
        let angles: Vec<f64> = (0..8).map(|i| TAU * i as f64 / 8.0).collect();
        let grid = RingGrid::new(8, 4, true);
        let mut mesh = MeshBuffers::new();
        let range = extrude_inner_surface(&mut mesh, &profile, &angles, &grid).unwrap();

        assert_eq!(mesh.vertex_count(), 40);
        assert_eq!(range, TriangleRange::new(0, 64));
        assert_eq!(mesh.groups.get(MeshRegion::InnerSurface), Some(range));
        let mouth = mesh.point(grid.index(4, 0) as usize).unwrap();
        assert!((mouth.x - 20.0).abs() < 1e-9 && mouth.y == 40.0);
    }

    #[test]
    fn test_extrusion_rejects_bad_input() {
        let profile = LinearProfile::new(SectionSize::circle(5.0), SectionSize::circle(20.0), 40.0);
        let grid = RingGrid::new(8, 4, true);
        let mut mesh = MeshBuffers::new();
        assert!(matches!(
            extrude_inner_surface(&mut mesh, &profile, &[0.0, 1.0], &grid),
            Err(ExtrusionError::AngleCountMismatch { expected: 8, actual: 2 })
        ));
        assert!(matches!(
            extrude_inner_surface(&mut mesh, &profile, &[0.0; 8], &RingGrid::new(8, 0, true)),
            Err(ExtrusionError::MalformedGrid { .. })
        ));
        mesh.push_vertex(Point3::ORIGIN);
        assert!(matches!(
            extrude_inner_surface(&mut mesh, &profile, &[0.0; 8], &grid),
            Err(ExtrusionError::MeshNotEmpty(1))
        ));
    }
}
