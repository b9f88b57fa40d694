use super::groups::FaceGroups;
use super::{Point3, Tolerance};

/// Growable vertex/index buffers for one mesh build.
///
/// Vertices and triangles are only ever appended; indices handed out by
/// [`push_vertex`](Self::push_vertex) stay valid for the lifetime of the
/// buffers. Every triangle goes through [`push_triangle`](Self::push_triangle),
/// so degenerate faces never reach `indices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub groups: FaceGroups,
    rejected_triangles: usize,
}

impl MeshBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(triangles * 3),
            ..Self::default()
        }
    }

    /// Build buffers from packed `[x0, y0, z0, x1, ...]` coordinates and a
    /// triangle index list, as they arrive from JS. A trailing partial
    /// coordinate triple is ignored. Indices are taken as-is; call
    /// [`validate`](Self::validate) before trusting them.
    #[must_use]
    pub fn from_flat(vertices: &[f64], indices: &[u32]) -> Self {
        let positions = vertices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self {
            positions,
            indices: indices.to_vec(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles dropped by [`push_triangle`](Self::push_triangle) so far.
    #[must_use]
    pub fn rejected_triangle_count(&self) -> usize {
        self.rejected_triangles
    }

    #[must_use]
    pub fn point(&self, index: usize) -> Option<Point3> {
        self.positions.get(index).copied().map(Point3::from_array)
    }

    /// Append a vertex and return its index.
    pub fn push_vertex(&mut self, p: Point3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(p.to_array());
        index
    }

    /// Append triangle `(a, b, c)` unless it is degenerate.
    ///
    /// A triangle is dropped when it repeats an index, references a vertex that
    /// does not exist, has a non-finite corner, or when `|(b - a) x (c - a)|`
    /// is at or below [`Tolerance::TRIANGLE_AREA`]. Returns whether it was kept.
    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) -> bool {
        if self.is_emittable(a, b, c) {
            self.indices.extend_from_slice(&[a, b, c]);
            true
        } else {
            self.rejected_triangles += 1;
            false
        }
    }

    fn is_emittable(&self, a: u32, b: u32, c: u32) -> bool {
        if a == b || b == c || a == c {
            return false;
        }
        let (Some(pa), Some(pb), Some(pc)) = (
            self.point(a as usize),
            self.point(b as usize),
            self.point(c as usize),
        ) else {
            return false;
        };
        if !(pa.is_finite() && pb.is_finite() && pc.is_finite()) {
            return false;
        }

        let cross = pb.sub_point(pa).cross(pc.sub_point(pa));
        cross.length() > Tolerance::TRIANGLE_AREA.eps
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.iter().all(|&i| i < n)
    }

    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        Ok(())
    }

    /// Returns the position buffer as a flat slice: `[x0, y0, z0, x1, y1, z1, ...]`.
    ///
    /// This is a zero-copy view over `positions`, for the wasm adapter.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        flatten_f64_array_slice::<3>(&self.positions)
    }

    /// Current buffer lengths, for [`rollback`](Self::rollback).
    #[must_use]
    pub fn checkpoint(&self) -> MeshCheckpoint {
        MeshCheckpoint {
            vertex_count: self.positions.len(),
            index_count: self.indices.len(),
            rejected_triangles: self.rejected_triangles,
        }
    }

    /// Drop everything appended since `checkpoint`. Face groups are not touched.
    pub fn rollback(&mut self, checkpoint: MeshCheckpoint) {
        self.positions.truncate(checkpoint.vertex_count);
        self.indices.truncate(checkpoint.index_count);
        self.rejected_triangles = checkpoint.rejected_triangles;
    }

    /// Triangle `t` as three vertex indices.
    #[must_use]
    pub fn triangle(&self, t: usize) -> Option<[u32; 3]> {
        let tri = self.indices.get(t * 3..t * 3 + 3)?;
        Some([tri[0], tri[1], tri[2]])
    }
}

/// Buffer lengths captured by [`MeshBuffers::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshCheckpoint {
    vertex_count: usize,
    index_count: usize,
    rejected_triangles: usize,
}

fn flatten_f64_array_slice<const N: usize>(data: &[[f64; N]]) -> &[f64] {
    let count = data.len().checked_mul(N).unwrap_or(0);
    let ptr = data.as_ptr().cast::<f64>();
    // SAFETY: `[[f64; N]]` is stored contiguously, and we compute the element count as `len * N`.
    unsafe { std::slice::from_raw_parts(ptr, count) }
}
