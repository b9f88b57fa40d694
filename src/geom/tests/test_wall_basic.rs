use std::f64::consts::{PI, TAU};

use crate::geom::{
    EdgeTopology, LinearProfile, MeshBuffers, MeshRegion, OffsetSign, Point3, RingGrid,
    SectionSize, Vec3, WallOptions, add_freestanding_wall, estimate_vertex_normals,
    extrude_inner_surface, has_degenerate_triangles, resolve_offset_sign,
};

fn horn(ring: usize, steps: usize, full_circle: bool) -> (MeshBuffers, RingGrid) {
    let profile = LinearProfile::new(SectionSize::circle(5.0), SectionSize::circle(15.0), 20.0);
    let angles: Vec<f64> = if full_circle {
        (0..ring).map(|i| TAU * i as f64 / ring as f64).collect()
    } else {
        (0..ring).map(|i| PI * i as f64 / (ring - 1) as f64).collect()
    };
    let grid = RingGrid::new(ring, steps, full_circle);
    let mut mesh = MeshBuffers::new();
    extrude_inner_surface(&mut mesh, &profile, &angles, &grid).unwrap();
    (mesh, grid)
}

#[test]
fn full_circle_wall_is_manifold_apart_from_the_throat() {
    let (mut mesh, grid) = horn(8, 4, true);
    let diag = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(2.0));
    assert!(diag.applied);
    assert_eq!(diag.triangles_rejected, 0);

    let topology = EdgeTopology::analyze(&mesh.indices);
    assert_eq!(topology.non_manifold_edges, 0);
    assert_eq!(topology.orientation_mismatches, 0);
    assert_eq!(topology.open_edges, 8);
    for &(a, b) in topology.boundary_edges() {
        assert!(a < 8 && b < 8, "open edge {a}-{b} off the inner throat");
    }
    assert!(!has_degenerate_triangles(&mesh.positions, &mesh.indices));
}

#[test]
fn partial_circle_wall_is_manifold() {
    let (mut mesh, grid) = horn(9, 3, false);
    let diag = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(1.5));
    assert!(diag.applied);

    let topology = EdgeTopology::analyze(&mesh.indices);
    assert!(topology.is_manifold());
    assert!(topology.is_consistently_oriented());
    assert!(!topology.is_closed());
    assert!(mesh.validate().is_ok());
}

#[test]
fn coincident_vertices_emit_no_degenerate_triangles() {
    let grid = RingGrid::new(8, 4, true);
    let mut mesh = MeshBuffers::new();
    for row in 0..grid.rows() {
        let r = 5.0 + 2.5 * row as f64;
        for col in 0..grid.ring_count {
            let a = TAU * col as f64 / grid.ring_count as f64;
            mesh.push_vertex(Point3::new(r * a.cos(), 5.0 * row as f64, r * a.sin()));
        }
    }
    let a = grid.index(2, 0);
    let b = grid.index(2, 1);
    mesh.positions[b as usize] = mesh.positions[a as usize];

    for row in 0..grid.length_steps {
        for col in 0..grid.ring_count {
            let next = (col + 1) % grid.ring_count;
            let i0 = grid.index(row, col);
            let i1 = grid.index(row, next);
            let i2 = grid.index(row + 1, col);
            let i3 = grid.index(row + 1, next);
            mesh.push_triangle(i0, i1, i2);
            mesh.push_triangle(i2, i1, i3);
        }
    }
    assert!(mesh.rejected_triangle_count() > 0);

    let diag = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(1.0));
    assert!(diag.applied);
    assert!(mesh.validate().is_ok());
    assert!(!has_degenerate_triangles(&mesh.positions, &mesh.indices));
    for tri in mesh.indices.chunks_exact(3) {
        assert!(!(tri.contains(&a) && tri.contains(&b)));
    }
}

#[test]
fn reversed_normals_flip_offset_sign() {
    let (mesh, grid) = horn(16, 5, true);
    let normals = estimate_vertex_normals(&mesh, &grid).normals;
    let reversed: Vec<Vec3> = normals.iter().map(|n| -*n).collect();

    let sign = resolve_offset_sign(&mesh, &normals, grid.vertex_count());
    assert_eq!(sign, OffsetSign::Negative);
    assert_eq!(
        resolve_offset_sign(&mesh, &reversed, grid.vertex_count()),
        OffsetSign::Positive
    );
}

#[test]
fn wall_range_is_recorded_only_for_positive_thickness() {
    for thickness in [0.5, 2.0, 7.0] {
        let (mut mesh, grid) = horn(12, 3, true);
        add_freestanding_wall(&mut mesh, &grid, WallOptions::new(thickness));
        let range = mesh.groups.get(MeshRegion::FreestandingWall).unwrap();
        assert!(range.end > range.start);
        assert_eq!(range.end, mesh.triangle_count());
    }

    for thickness in [0.0, -2.0] {
        let (mut mesh, grid) = horn(12, 3, true);
        let before = mesh.clone();
        let diag = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(thickness));
        assert!(!diag.applied);
        assert!(mesh.groups.get(MeshRegion::FreestandingWall).is_none());
        assert_eq!(mesh, before);
    }
}

#[test]
fn outer_throat_ring_stays_in_throat_plane() {
    let (mut mesh, grid) = horn(12, 3, true);
    let diag = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(2.0));
    let outer_start = diag.outer_start.unwrap() as usize;
    for col in 0..grid.ring_count {
        let inner = mesh.point(col).unwrap();
        let outer = mesh.point(outer_start + col).unwrap();
        assert_eq!(outer.y, inner.y);
        assert!((outer.sub_point(inner).length() - 2.0).abs() < 1e-9);
        assert!(outer.radial_distance() > inner.radial_distance());
    }
    let plate = diag.rear_plate.unwrap();
    assert!((plate.disc_y + 2.0).abs() < 1e-12);
}

#[test]
fn wall_is_deterministic() {
    let build = || {
        let (mut mesh, grid) = horn(16, 6, true);
        let diag = add_freestanding_wall(&mut mesh, &grid, WallOptions::new(1.25));
        (mesh, diag.summary())
    };
    assert_eq!(build(), build());
}
