mod angles;
mod core;
mod diagnostics;
mod groups;
mod horn;
mod mesh;
mod metrics;
mod normals;
mod offset;
mod profile;
mod rear_plate;
mod ring_grid;
mod stitch;
mod wall;

pub use angles::{
    AngleList, AngleSamplingParams, QuadrantSpec, QuadrantSpecError, build_angle_list,
    select_angles_for_quadrants,
};
pub use self::core::{Point3, Tolerance, Vec3};
pub use diagnostics::{EdgeTopology, WallDiagnostics, has_degenerate_triangles, triangle_area};
pub use groups::{FaceGroups, GroupError, MeshRegion, TriangleRange};
pub use horn::{HornBuild, HornParams, build_horn};
pub use mesh::{MeshBuffers, MeshCheckpoint};
pub use metrics::{TimingBucket, WallMetrics, WallTimingReport};
pub use normals::{NormalEstimate, estimate_vertex_normals};
pub use offset::{OffsetSign, build_outer_shell, resolve_offset_sign};
pub use profile::{
    CrossSectionProfile, ExtrusionError, LinearProfile, SectionSize, StationExtents,
    extrude_inner_surface, rounded_rect_point,
};
pub use rear_plate::{RearPlateReport, build_rear_plate};
pub use ring_grid::RingGrid;
pub use stitch::{EmitCounts, stitch_mouth_band, stitch_outer_shell};
pub use wall::{WallError, WallOptions, add_freestanding_wall, try_add_freestanding_wall};

#[cfg(test)]
mod tests;
