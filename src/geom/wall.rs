//! Freestanding wall: turns an open inner horn surface into a closed shell.
//!
//! The inner ring grid must occupy vertices `0..grid.vertex_count()` with its
//! triangles already in the index buffer. The wall appends, in order:
//!
//! 1. an outer copy of the grid, offset by the wall thickness,
//! 2. the outer shell triangles and the mouth band,
//! 3. the rear plate (axial strip plus disc) closing the throat end,
//!
//! and records the new triangles as [`MeshRegion::FreestandingWall`].
//!
//! [`add_freestanding_wall`] never fails: bad input is logged and leaves the
//! buffers untouched. Use [`try_add_freestanding_wall`] to get the error.

use serde::{Deserialize, Serialize};

use super::diagnostics::WallDiagnostics;
use super::groups::{GroupError, MeshRegion, TriangleRange};
use super::mesh::MeshBuffers;
use super::metrics::{TimingBucket, WallMetrics};
use super::normals::estimate_vertex_normals;
use super::offset::{build_outer_shell, resolve_offset_sign};
use super::rear_plate::build_rear_plate;
use super::ring_grid::RingGrid;
use super::stitch::{EmitCounts, stitch_mouth_band, stitch_outer_shell};

/// Options for [`add_freestanding_wall`].
///
/// A thickness of zero (the default) disables the wall.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallOptions {
    pub thickness: f64,
}

impl WallOptions {
    #[must_use]
    pub const fn new(thickness: f64) -> Self {
        Self { thickness }
    }

    #[must_use]
    pub const fn thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WallError {
    #[error("wall thickness must be finite and positive: {0}")]
    InvalidThickness(f64),

    #[error("ring grid {ring_count}x{length_steps} cannot carry a wall")]
    MalformedGrid { ring_count: usize, length_steps: usize },

    #[error("inner grid needs {required} vertices but the mesh has {available}")]
    InsufficientVertices { required: usize, available: usize },

    #[error(transparent)]
    Group(#[from] GroupError),
}

/// Add a freestanding wall around the inner surface, or do nothing.
///
/// Any [`WallError`] is logged with `log::warn!` and reported through
/// [`WallDiagnostics::warnings`]; the buffers and face groups are then left
/// exactly as they were and `applied` is `false`.
pub fn add_freestanding_wall(
    mesh: &mut MeshBuffers,
    grid: &RingGrid,
    options: WallOptions,
) -> WallDiagnostics {
    match try_add_freestanding_wall(mesh, grid, options) {
        Ok(diagnostics) => diagnostics,
        Err(err) => {
            log::warn!("freestanding wall skipped: {err}");
            WallDiagnostics::skipped(options.thickness, err.to_string())
        }
    }
}

/// Add a freestanding wall around the inner surface.
///
/// # Errors
/// Returns an error, without touching `mesh`, when the thickness is not a
/// positive finite number, the grid is malformed, the mesh holds fewer
/// vertices than the grid needs, or the wall region is already recorded.
pub fn try_add_freestanding_wall(
    mesh: &mut MeshBuffers,
    grid: &RingGrid,
    options: WallOptions,
) -> Result<WallDiagnostics, WallError> {
    let thickness = options.thickness;
    if !(thickness.is_finite() && thickness > 0.0) {
        return Err(WallError::InvalidThickness(thickness));
    }
    if !grid.is_well_formed() {
        return Err(WallError::MalformedGrid {
            ring_count: grid.ring_count,
            length_steps: grid.length_steps,
        });
    }
    let required = grid.vertex_count();
    if required == 0 || mesh.vertex_count() < required {
        return Err(WallError::InsufficientVertices {
            required,
            available: mesh.vertex_count(),
        });
    }
    if mesh.groups.contains(MeshRegion::FreestandingWall) {
        return Err(GroupError::AlreadyRecorded(MeshRegion::FreestandingWall).into());
    }

    let mut metrics = WallMetrics::default();
    metrics.begin();

    let checkpoint = mesh.checkpoint();
    let triangle_start = mesh.triangle_count();
    let vertex_start = mesh.vertex_count();

    let estimate = metrics.time(TimingBucket::Normals, || estimate_vertex_normals(mesh, grid));
    let normals = estimate.normals;

    let (sign, outer_start) = metrics.time(TimingBucket::Offset, || {
        let sign = resolve_offset_sign(mesh, &normals, required);
        let outer_start = build_outer_shell(mesh, &normals, grid, thickness, sign);
        (sign, outer_start)
    });

    let stitched = metrics.time(TimingBucket::Stitch, || {
        let mut counts = stitch_outer_shell(mesh, grid, outer_start);
        counts.merge(stitch_mouth_band(mesh, grid, outer_start));
        counts
    });

    let plate = metrics.time(TimingBucket::RearPlate, || {
        build_rear_plate(mesh, grid, outer_start, thickness)
    });

    let range = TriangleRange::new(triangle_start, mesh.triangle_count());
    if let Err(err) = mesh.groups.record(MeshRegion::FreestandingWall, range) {
        mesh.rollback(checkpoint);
        return Err(err.into());
    }

    let mut totals = EmitCounts::default();
    totals.merge(stitched);
    totals.merge(plate.strip);
    totals.merge(plate.disc);

    let mut diagnostics = WallDiagnostics {
        applied: true,
        thickness,
        offset_sign: Some(sign),
        outer_start: Some(outer_start),
        filled_normal_count: estimate.filled_count,
        vertices_added: mesh.vertex_count() - vertex_start,
        triangles_emitted: totals.emitted,
        triangles_rejected: totals.rejected,
        range: Some(range),
        rear_plate: Some(plate),
        timing: metrics.end(),
        warnings: Vec::new(),
    };
    if totals.rejected > 0 {
        diagnostics.add_warning(format!(
            "{} degenerate wall triangles dropped",
            totals.rejected
        ));
    }

    log::debug!("{}", diagnostics.summary());
    Ok(diagnostics)
}
