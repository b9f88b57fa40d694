#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use std::fmt;

use geom::{
    AngleSamplingParams, EdgeTopology, FaceGroups, HornParams, MeshBuffers, MeshRegion,
    QuadrantSpec, RingGrid, TriangleRange, WallDiagnostics, WallOptions, add_freestanding_wall,
    build_angle_list, build_horn, select_angles_for_quadrants,
};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

/// Mesh handed back to JS after every build.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MeshPayload<'a> {
    vertices: &'a [f64],
    indices: &'a [u32],
    groups: &'a FaceGroups,
    diagnostics: &'a WallDiagnostics,
    topology: &'a EdgeTopology,
}

impl<'a> From<&'a MeshState> for MeshPayload<'a> {
    fn from(state: &'a MeshState) -> Self {
        Self {
            vertices: &state.vertices,
            indices: &state.indices,
            groups: &state.groups,
            diagnostics: &state.diagnostics,
            topology: &state.topology,
        }
    }
}

/// Last mesh built by the engine, as handed back to JS.
#[derive(Debug, Clone)]
struct MeshState {
    vertices: Vec<f64>,
    indices: Vec<u32>,
    groups: FaceGroups,
    diagnostics: WallDiagnostics,
    topology: EdgeTopology,
}

impl MeshState {
    fn from_mesh(mesh: MeshBuffers, diagnostics: WallDiagnostics) -> Self {
        let topology = EdgeTopology::analyze(&mesh.indices);
        Self {
            vertices: mesh.positions_flat().to_vec(),
            indices: mesh.indices,
            groups: mesh.groups,
            diagnostics,
            topology,
        }
    }

    /// Caller buffers passed back unchanged, without any face group.
    fn untouched(vertices: Vec<f64>, indices: Vec<u32>, diagnostics: WallDiagnostics) -> Self {
        let topology = EdgeTopology::analyze(&indices);
        Self {
            vertices,
            indices,
            groups: FaceGroups::new(),
            diagnostics,
            topology,
        }
    }
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    last: Option<MeshState>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            last: None,
        }
    }

    /// Whether the engine went through its minimal initialization.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Sample the circumferential angles for a rounded-rectangle mouth.
    ///
    /// Returns `{ fullAngles, pointsPerQuadrant }`.
    #[wasm_bindgen]
    pub fn angle_list(
        &self,
        segments: usize,
        half_width: f64,
        half_height: f64,
        corner_radius: f64,
        corner_segments: usize,
    ) -> Result<JsValue, JsValue> {
        let params = AngleSamplingParams::new(segments, half_width, half_height)
            .corner(corner_radius, corner_segments);
        let list = build_angle_list(&params);
        serde_wasm_bindgen::to_value(&list).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Keep the angles covered by `quadrants` (`"1"`, `"12"`, `"14"` or `"1234"`).
    #[wasm_bindgen]
    pub fn select_angles(&self, full_angles: Vec<f64>, quadrants: &str) -> Result<Vec<f64>, JsValue> {
        let quadrants: QuadrantSpec = quadrants.parse().map_err(to_js_error)?;
        Ok(select_angles_for_quadrants(&full_angles, quadrants))
    }

    /// Build a horn from `{ segments, cornerSegments, quadrants, lengthSteps,
    /// profile, thickness }` and return `{ vertices, indices, groups,
    /// diagnostics, topology }`.
    #[wasm_bindgen]
    pub fn build_horn(&mut self, params: JsValue) -> Result<JsValue, JsValue> {
        let params: HornParams = serde_wasm_bindgen::from_value(params).map_err(to_js_error)?;
        let build = build_horn(&params).map_err(to_js_error)?;
        self.last = Some(MeshState {
            vertices: build.mesh.positions_flat().to_vec(),
            indices: build.mesh.indices,
            groups: build.mesh.groups,
            diagnostics: build.wall,
            topology: build.topology,
        });
        self.last_payload()
    }

    /// Wrap caller-supplied inner surface buffers in a freestanding wall.
    ///
    /// The buffers must hold the inner ring grid at vertices
    /// `0..(length_steps + 1) * ring_count`. Malformed buffers or a wall that
    /// cannot be built are not errors: the payload then carries the caller's
    /// buffers unchanged, `diagnostics.applied == false` and the reason in
    /// `diagnostics.warnings`.
    #[wasm_bindgen]
    pub fn add_wall(
        &mut self,
        vertices: Vec<f64>,
        indices: Vec<u32>,
        ring_count: usize,
        length_steps: usize,
        full_circle: bool,
        thickness: f64,
    ) -> Result<JsValue, JsValue> {
        let grid = RingGrid::new(ring_count, length_steps, full_circle);
        self.last = Some(wall_from_buffers(
            vertices,
            indices,
            &grid,
            WallOptions::new(thickness),
        ));
        self.last_payload()
    }

    /// Diagnostics of the last build, or `null` before the first one.
    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        match self.last.as_ref() {
            Some(state) => serde_wasm_bindgen::to_value(&state.diagnostics)
                .map_err(|err| JsError::new(&err.to_string()).into()),
            None => Ok(JsValue::NULL),
        }
    }
}

impl Engine {
    fn last_payload(&self) -> Result<JsValue, JsValue> {
        let state = self
            .last
            .as_ref()
            .ok_or_else(|| js_error("no mesh has been built yet"))?;
        let payload = MeshPayload::from(state);
        serde_wasm_bindgen::to_value(&payload).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

fn wall_from_buffers(
    vertices: Vec<f64>,
    indices: Vec<u32>,
    grid: &RingGrid,
    options: WallOptions,
) -> MeshState {
    match inner_mesh_from_buffers(&vertices, &indices) {
        Ok(mut mesh) => {
            let diagnostics = add_freestanding_wall(&mut mesh, grid, options);
            MeshState::from_mesh(mesh, diagnostics)
        }
        Err(reason) => {
            log::warn!("freestanding wall skipped: {reason}");
            let diagnostics = WallDiagnostics::skipped(options.thickness, reason);
            MeshState::untouched(vertices, indices, diagnostics)
        }
    }
}

/// Validate caller buffers and tag their triangles as the inner surface.
fn inner_mesh_from_buffers(vertices: &[f64], indices: &[u32]) -> Result<MeshBuffers, String> {
    if vertices.len() % 3 != 0 {
        return Err(format!(
            "vertex buffer length {} is not a multiple of 3",
            vertices.len()
        ));
    }
    let mut mesh = MeshBuffers::from_flat(vertices, indices);
    mesh.validate()?;

    let inner_triangles = mesh.triangle_count();
    if inner_triangles > 0 {
        mesh.groups
            .record(
                MeshRegion::InnerSurface,
                TriangleRange::new(0, inner_triangles),
            )
            .map_err(|err| err.to_string())?;
    }
    Ok(mesh)
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geom::{LinearProfile, SectionSize};

    fn inner_buffers() -> (Vec<f64>, Vec<u32>, RingGrid) {
        let profile = LinearProfile::new(SectionSize::circle(6.0), SectionSize::circle(18.0), 30.0);
        let build = build_horn(&HornParams::new(12, 3, profile)).unwrap();
        (
            build.mesh.positions_flat().to_vec(),
            build.mesh.indices.clone(),
            build.grid,
        )
    }

    #[test]
    fn wall_from_buffers_records_both_groups() {
        let (vertices, indices, grid) = inner_buffers();
        let state = wall_from_buffers(vertices, indices, &grid, WallOptions::new(1.0));
        assert!(state.diagnostics.applied);
        assert_eq!(
            state.groups.get(MeshRegion::InnerSurface),
            Some(TriangleRange::new(0, 72))
        );
        assert!(state.groups.contains(MeshRegion::FreestandingWall));
        assert_eq!(state.topology.open_edges, 12);
    }

    #[test]
    fn broken_buffers_come_back_untouched() {
        let (vertices, indices, grid) = inner_buffers();

        let mut out_of_range = indices.clone();
        out_of_range.extend_from_slice(&[9999, 0, 1]);
        let mut nan_vertex = vertices.clone();
        nan_vertex[4] = f64::NAN;
        let partial_triple = vertices[..vertices.len() - 1].to_vec();

        for (v, i) in [
            (vertices.clone(), out_of_range),
            (partial_triple, indices.clone()),
            (nan_vertex, indices.clone()),
        ] {
            let state = wall_from_buffers(v.clone(), i.clone(), &grid, WallOptions::new(1.0));
            assert!(!state.diagnostics.applied);
            assert!(state.diagnostics.has_warnings());
            assert_eq!(state.diagnostics.range, None);
            assert_eq!(state.indices, i);
            assert_eq!(state.vertices.len(), v.len());
            assert!(state.vertices.iter().zip(&v).all(|(a, b)| a.to_bits() == b.to_bits()));
            assert!(!state.groups.contains(MeshRegion::FreestandingWall));
            assert!(state.groups.is_empty());
        }
    }

    #[test]
    fn zero_thickness_returns_untouched_buffers() {
        let (vertices, indices, grid) = inner_buffers();
        let state = wall_from_buffers(vertices.clone(), indices.clone(), &grid, WallOptions::default());
        assert!(!state.diagnostics.applied);
        assert_eq!(state.vertices, vertices);
        assert_eq!(state.indices, indices);
        assert!(!state.groups.contains(MeshRegion::FreestandingWall));
    }

    #[test]
    fn payload_exposes_flat_vertices() {
        let (vertices, indices, grid) = inner_buffers();
        let vertex_floats = vertices.len();
        let prefix = vertices.clone();
        let state = wall_from_buffers(vertices, indices, &grid, WallOptions::new(1.0));
        let payload = MeshPayload::from(&state);
        assert!(payload.vertices.len() > vertex_floats);
        assert_eq!(payload.vertices.len() % 3, 0);
        assert_eq!(&payload.vertices[..vertex_floats], prefix.as_slice());
        assert_eq!(payload.indices.len() % 3, 0);
    }

    #[test]
    fn engine_starts_without_mesh() {
        let engine = Engine::new();
        assert!(engine.is_initialized());
        assert!(engine.last.is_none());
    }
}
