//! One-call horn build: angle sampling, inner surface, wall, topology check.
//!
//! This is the path the wasm `Engine` and `wall_cli` take. The angle list is
//! sampled on the mouth cross-section and shared by every station.

use serde::{Deserialize, Serialize};

use super::angles::{AngleSamplingParams, QuadrantSpec, build_angle_list, select_angles_for_quadrants};
use super::diagnostics::{EdgeTopology, WallDiagnostics};
use super::groups::TriangleRange;
use super::mesh::MeshBuffers;
use super::metrics::{TimingBucket, WallMetrics, WallTimingReport};
use super::profile::{ExtrusionError, LinearProfile, extrude_inner_surface};
use super::ring_grid::RingGrid;
use super::wall::{WallOptions, add_freestanding_wall};

/// Input of [`build_horn`], deserialized from plain JS objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HornParams {
    pub segments: usize,
    #[serde(default)]
    pub corner_segments: usize,
    #[serde(default)]
    pub quadrants: QuadrantSpec,
    pub length_steps: usize,
    pub profile: LinearProfile,
    /// Wall thickness; zero builds the bare inner surface.
    #[serde(default)]
    pub thickness: f64,
}

impl HornParams {
    #[must_use]
    pub const fn new(segments: usize, length_steps: usize, profile: LinearProfile) -> Self {
        Self {
            segments,
            corner_segments: 0,
            quadrants: QuadrantSpec::Full,
            length_steps,
            profile,
            thickness: 0.0,
        }
    }

    #[must_use]
    pub const fn corner_segments(mut self, corner_segments: usize) -> Self {
        self.corner_segments = corner_segments;
        self
    }

    #[must_use]
    pub const fn quadrants(mut self, quadrants: QuadrantSpec) -> Self {
        self.quadrants = quadrants;
        self
    }

    #[must_use]
    pub const fn thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }
}

/// Everything [`build_horn`] produced.
#[derive(Debug, Clone)]
pub struct HornBuild {
    pub mesh: MeshBuffers,
    pub grid: RingGrid,
    /// Angles of the ring columns, after quadrant selection.
    pub angles: Vec<f64>,
    pub points_per_quadrant: usize,
    pub inner: TriangleRange,
    pub wall: WallDiagnostics,
    pub topology: EdgeTopology,
    /// Only populated with the `wall_metrics` feature on native targets.
    pub timing: Option<WallTimingReport>,
}

/// Build a horn from a linear profile and optionally wrap it in a wall.
///
/// # Errors
/// Fails when the selected angles and `length_steps` do not form a usable
/// ring grid. Wall problems never fail the build; they show up in
/// [`HornBuild::wall`].
pub fn build_horn(params: &HornParams) -> Result<HornBuild, ExtrusionError> {
    let mut metrics = WallMetrics::default();
    metrics.begin();

    let mouth = params.profile.mouth;
    let (angle_list, angles) = metrics.time(TimingBucket::AngleSampling, || {
        let sampling = AngleSamplingParams::new(params.segments, mouth.half_width, mouth.half_height)
            .corner(mouth.corner_radius, params.corner_segments);
        let list = build_angle_list(&sampling);
        let angles = select_angles_for_quadrants(&list.full_angles, params.quadrants);
        (list, angles)
    });

    let grid = RingGrid::new(
        angles.len(),
        params.length_steps,
        params.quadrants.is_full_circle(),
    );
    let mut mesh = MeshBuffers::with_capacity(2 * grid.vertex_count(), 4 * grid.vertex_count());
    let inner = metrics.time(TimingBucket::Extrusion, || {
        extrude_inner_surface(&mut mesh, &params.profile, &angles, &grid)
    })?;

    let wall = if params.thickness == 0.0 {
        WallDiagnostics::new()
    } else {
        add_freestanding_wall(&mut mesh, &grid, WallOptions::new(params.thickness))
    };

    let topology = metrics.time(TimingBucket::Diagnostics, || {
        EdgeTopology::analyze(&mesh.indices)
    });

    let timing = match (metrics.end(), wall.timing.as_ref()) {
        (Some(mut report), Some(wall_timing)) => {
            report.merge(wall_timing);
            Some(report)
        }
        (report, _) => report,
    };

    log::debug!(
        "horn {}x{} quadrants:{} V:{} T:{} open:{} | {}",
        grid.ring_count,
        grid.rows(),
        params.quadrants,
        mesh.vertex_count(),
        mesh.triangle_count(),
        topology.open_edges,
        wall.summary()
    );

    Ok(HornBuild {
        mesh,
        grid,
        angles,
        points_per_quadrant: angle_list.points_per_quadrant,
        inner,
        wall,
        topology,
        timing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{MeshRegion, SectionSize};

    fn round_profile() -> LinearProfile {
        LinearProfile::new(SectionSize::circle(12.0), SectionSize::circle(40.0), 60.0)
    }

    #[test]
    fn test_bare_horn_has_only_inner_surface() {
        let build = build_horn(&HornParams::new(16, 6, round_profile())).unwrap();
        assert!(!build.wall.applied);
        assert!(build.wall.warnings.is_empty());
        assert_eq!(build.grid, RingGrid::new(16, 6, true));
        assert_eq!(build.mesh.vertex_count(), 16 * 7);
        assert_eq!(build.inner, TriangleRange::new(0, 2 * 16 * 6));
        assert_eq!(build.points_per_quadrant, 4);
        // Throat and mouth rings stay open.
        assert_eq!(build.topology.open_edges, 32);
    }

    #[test]
    fn test_walled_horn_records_both_regions() {
        let build = build_horn(&HornParams::new(16, 6, round_profile()).thickness(2.0)).unwrap();
        assert!(build.wall.applied);
        let inner = build.mesh.groups.get(MeshRegion::InnerSurface).unwrap();
        let wall = build.mesh.groups.get(MeshRegion::FreestandingWall).unwrap();
        assert_eq!(inner.end, wall.start);
        assert_eq!(wall.end, build.mesh.triangle_count());
        // Only the inner throat ring is left open.
        assert_eq!(build.topology.open_edges, 16);
        assert!(build.topology.is_manifold());
        assert!(build.topology.is_consistently_oriented());
    }

    #[test]
    fn test_quadrant_build_is_open_on_symmetry_planes() {
        let params = HornParams::new(16, 4, round_profile())
            .quadrants(QuadrantSpec::FirstFourth)
            .thickness(1.5);
        let build = build_horn(&params).unwrap();
        assert!(!build.grid.full_circle);
        assert_eq!(build.grid.ring_count, 9);
        assert!(build.wall.applied);
        assert!(build.topology.is_manifold());
        assert!(build.angles.first().copied().unwrap() < 0.0);
    }

    #[test]
    fn test_too_few_angles_fail() {
        let params = HornParams::new(3, 4, round_profile()).quadrants(QuadrantSpec::First);
        assert!(matches!(
            build_horn(&params),
            Err(ExtrusionError::MalformedGrid { ring_count: 1, .. })
        ));
    }
}
