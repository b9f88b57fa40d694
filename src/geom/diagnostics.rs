//! Mesh diagnostics for the wall builder.
//!
//! [`EdgeTopology`] checks how triangles share edges (open, non-manifold and
//! inconsistently oriented edges). [`WallDiagnostics`] is returned by the
//! wall operation and records what was added and what was dropped.
//!
//! # Example
//!
//! ```ignore
//! use waveguide_engine::geom::{add_freestanding_wall, EdgeTopology, WallOptions};
//!
//! let diagnostics = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(2.0));
//! if !diagnostics.applied {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("Warning: {}", warning);
//!     }
//! }
//!
//! let topology = EdgeTopology::analyze(&mesh.indices);
//! println!("{} open edges", topology.open_edges);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::groups::TriangleRange;
use super::metrics::WallTimingReport;
use super::offset::OffsetSign;
use super::rear_plate::RearPlateReport;
use super::{Point3, Tolerance};

/// Edge sharing statistics of a triangle list.
///
/// - `open_edges`: edges used by exactly one triangle
/// - `non_manifold_edges`: edges used by more than two triangles
/// - `orientation_mismatches`: edges whose two triangles walk them in the
///   same direction, i.e. neighbors with inconsistent winding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTopology {
    pub edge_count: usize,
    pub open_edges: usize,
    pub non_manifold_edges: usize,
    pub orientation_mismatches: usize,
    #[serde(skip)]
    boundary: Vec<(u32, u32)>,
}

impl EdgeTopology {
    /// Analyze a triangle index list. Triangles with a repeated index are ignored.
    #[must_use]
    pub fn analyze(indices: &[u32]) -> Self {
        // Undirected edge -> directed uses in triangle order.
        let mut edges: BTreeMap<(u32, u32), Vec<(u32, u32)>> = BTreeMap::new();

        for tri in indices.chunks_exact(3) {
            let i0 = tri[0];
            let i1 = tri[1];
            let i2 = tri[2];

            if i0 == i1 || i1 == i2 || i0 == i2 {
                continue;
            }

            for (ea, eb) in [(i0, i1), (i1, i2), (i2, i0)] {
                let key = if ea <= eb { (ea, eb) } else { (eb, ea) };
                edges.entry(key).or_default().push((ea, eb));
            }
        }

        let mut topology = Self {
            edge_count: edges.len(),
            ..Self::default()
        };
        for uses in edges.values() {
            match uses.as_slice() {
                [single] => {
                    topology.open_edges += 1;
                    topology.boundary.push(*single);
                }
                [first, second] => {
                    if first == second {
                        topology.orientation_mismatches += 1;
                    }
                }
                _ => topology.non_manifold_edges += 1,
            }
        }

        topology
    }

    /// Open edges, in the direction their single triangle walks them.
    #[must_use]
    pub fn boundary_edges(&self) -> &[(u32, u32)] {
        &self.boundary
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.open_edges == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edges == 0
    }

    #[must_use]
    pub fn is_consistently_oriented(&self) -> bool {
        self.orientation_mismatches == 0
    }
}

/// Area of triangle `tri`, or `None` if it references a missing vertex.
#[must_use]
pub fn triangle_area(positions: &[[f64; 3]], tri: [u32; 3]) -> Option<f64> {
    let a = Point3::from_array(*positions.get(tri[0] as usize)?);
    let b = Point3::from_array(*positions.get(tri[1] as usize)?);
    let c = Point3::from_array(*positions.get(tri[2] as usize)?);
    Some(0.5 * b.sub_point(a).cross(c.sub_point(a)).length())
}

/// Whether any triangle repeats an index, references a missing vertex, or has
/// a cross product at or below [`Tolerance::TRIANGLE_AREA`].
#[must_use]
pub fn has_degenerate_triangles(positions: &[[f64; 3]], indices: &[u32]) -> bool {
    indices.chunks_exact(3).any(|tri| {
        if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
            return true;
        }
        triangle_area(positions, [tri[0], tri[1], tri[2]])
            .map_or(true, |area| !(2.0 * area > Tolerance::TRIANGLE_AREA.eps))
    })
}

/// Outcome of one freestanding-wall operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallDiagnostics {
    /// Whether any geometry was added. `false` means the buffers are untouched.
    pub applied: bool,

    pub thickness: f64,

    /// Multiplier applied to the estimated normals; `None` when not applied.
    pub offset_sign: Option<OffsetSign>,

    /// First vertex of the outer shell.
    pub outer_start: Option<u32>,

    /// Inner-grid normals that needed a fallback direction.
    pub filled_normal_count: usize,

    pub vertices_added: usize,

    /// Triangles added to the index buffer.
    pub triangles_emitted: usize,

    /// Triangles dropped as degenerate during emission.
    pub triangles_rejected: usize,

    /// Triangle range recorded for the wall.
    pub range: Option<TriangleRange>,

    pub rear_plate: Option<RearPlateReport>,

    /// Only populated with the `wall_metrics` feature on native targets.
    #[serde(skip)]
    pub timing: Option<WallTimingReport>,

    pub warnings: Vec<String>,
}

impl WallDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics for a call that left the mesh untouched.
    #[must_use]
    pub fn skipped(thickness: f64, reason: impl Into<String>) -> Self {
        Self {
            thickness,
            warnings: vec![reason.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"wall t:{thickness} +V:{vertices} +T:{triangles} [details...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.applied {
            return format!("wall t:{} skipped", self.thickness);
        }

        let mut parts = vec![format!(
            "wall t:{} +V:{} +T:{}",
            self.thickness, self.vertices_added, self.triangles_emitted
        )];
        if let Some(sign) = self.offset_sign {
            parts.push(format!("sign:{:+}", sign.value()));
        }
        if let Some(range) = self.range {
            parts.push(format!("range:{}..{}", range.start, range.end));
        }
        if let Some(plate) = &self.rear_plate {
            parts.push(format!("rings:{}", plate.ring_steps()));
        }
        if self.triangles_rejected > 0 {
            parts.push(format!("rejected:{}", self.triangles_rejected));
        }
        if self.filled_normal_count > 0 {
            parts.push(format!("filled-normals:{}", self.filled_normal_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for WallDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wall Diagnostics:")?;
        writeln!(f, "  Thickness: {}", self.thickness)?;

        if self.applied {
            if let Some(sign) = self.offset_sign {
                writeln!(f, "  Offset sign: {:+}", sign.value())?;
            }
            if let Some(start) = self.outer_start {
                writeln!(f, "  Outer start: {}", start)?;
            }
            writeln!(f, "  Vertices added: {}", self.vertices_added)?;
            writeln!(f, "  Triangles emitted: {}", self.triangles_emitted)?;
            if self.triangles_rejected > 0 {
                writeln!(f, "  Degenerate triangles dropped: {}", self.triangles_rejected)?;
            }
            if let Some(range) = self.range {
                writeln!(f, "  Triangle range: {}..{}", range.start, range.end)?;
            }
            if let Some(plate) = &self.rear_plate {
                writeln!(f, "  Rear plate:")?;
                writeln!(f, "    - Spacing: {:.4}", plate.spacing)?;
                writeln!(f, "    - Mean radius: {:.4}", plate.mean_radius)?;
                writeln!(f, "    - Rings: {}", plate.ring_steps())?;
                writeln!(f, "    - Last ring radius: {:.4}", plate.last_ring_radius)?;
                writeln!(f, "    - Next radius at collapse: {:.4}", plate.next_radius_at_collapse)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if !self.applied {
            "SKIPPED"
        } else if self.triangles_rejected == 0 {
            "CLEAN"
        } else {
            "APPLIED (degenerates dropped)"
        };
        writeln!(f, "  Status: {}", status)?;

        Ok(())
    }
}
