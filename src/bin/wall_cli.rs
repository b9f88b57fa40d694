#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("wall_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    use waveguide_engine::geom::{
        EdgeTopology, FaceGroups, HornBuild, HornParams, LinearProfile, MeshBuffers,
        QuadrantSpec, RearPlateReport, SectionSize, WallDiagnostics, build_horn,
    };

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"wall_cli (waveguide-engine)

USAGE:
  wall_cli list
  wall_cli run <scenario|all> [options]

SCENARIOS:
  round_horn
  round_horn_bare
  round_horn_thick_wall
  rect_horn
  rect_horn_quadrant_1
  rect_horn_quadrant_12
  rect_horn_quadrant_14

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_name(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario = Scenario::from_name(scenario_name.as_str())
            .ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.build.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.build.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_summary(&output);
        Ok(())
    }

    fn print_summary(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} triangles={} open_edges={} | {}",
            output.name,
            output.build.mesh.vertex_count(),
            output.build.mesh.triangle_count(),
            output.build.topology.open_edges,
            output.build.wall.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &MeshBuffers, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# waveguide-engine wall_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        // One OBJ group per recorded region; triangles outside every region go first.
        let first_grouped = mesh.groups.iter().map(|(_, range)| range.start).min();
        let ungrouped_end = first_grouped.unwrap_or(mesh.triangle_count());
        write_obj_faces(&mut w, mesh, 0, ungrouped_end)?;
        for (region, range) in mesh.groups.iter() {
            writeln!(w, "g {}", region.key()).map_err(|e| format!("write obj: {e}"))?;
            write_obj_faces(&mut w, mesh, range.start, range.end)?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn write_obj_faces(w: &mut impl Write, mesh: &MeshBuffers, start: usize, end: usize) -> Result<(), String> {
        for t in start..end {
            let Some([a, b, c]) = mesh.triangle(t) else {
                break;
            };
            writeln!(w, "f {} {} {}", a + 1, b + 1, c + 1).map_err(|e| format!("write obj: {e}"))?;
        }
        Ok(())
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_f64_line(out: &mut String, key: &str, value: f64) {
        let _ = write!(out, "{key} ");
        write_f64(out, value);
        out.push('\n');
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_params(out: &mut String, params: &HornParams) {
        let _ = writeln!(out, "params.segments {}", params.segments);
        let _ = writeln!(out, "params.corner_segments {}", params.corner_segments);
        let _ = writeln!(out, "params.quadrants {}", params.quadrants);
        let _ = writeln!(out, "params.length_steps {}", params.length_steps);
        write_f64_line(out, "params.thickness", params.thickness);
        write_f64_line(out, "params.length", params.profile.length);
    }

    fn write_angles(out: &mut String, build: &HornBuild) {
        let _ = writeln!(out, "angles.points_per_quadrant {}", build.points_per_quadrant);
        let _ = writeln!(out, "angles.count {}", build.angles.len());
        for (idx, angle) in build.angles.iter().copied().enumerate() {
            write_f64_line(out, &format!("angles.{idx}"), angle);
        }
    }

    fn write_wall_diagnostics(out: &mut String, diag: &WallDiagnostics) {
        let _ = writeln!(out, "wall_diag.applied {}", diag.applied);
        if let Some(sign) = diag.offset_sign {
            let _ = writeln!(out, "wall_diag.offset_sign {:+}", sign.value());
        }
        if let Some(start) = diag.outer_start {
            let _ = writeln!(out, "wall_diag.outer_start {start}");
        }
        let _ = writeln!(out, "wall_diag.filled_normal_count {}", diag.filled_normal_count);
        let _ = writeln!(out, "wall_diag.vertices_added {}", diag.vertices_added);
        let _ = writeln!(out, "wall_diag.triangles_emitted {}", diag.triangles_emitted);
        let _ = writeln!(out, "wall_diag.triangles_rejected {}", diag.triangles_rejected);
        let _ = writeln!(out, "wall_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "wall_diag.warning.{idx} {warning}");
        }
        if let Some(plate) = diag.rear_plate.as_ref() {
            write_rear_plate(out, plate);
        }
    }

    fn write_rear_plate(out: &mut String, plate: &RearPlateReport) {
        write_f64_line(out, "rear_plate.spacing", plate.spacing);
        write_f64_line(out, "rear_plate.mean_radius", plate.mean_radius);
        write_f64_line(out, "rear_plate.angular_span", plate.angular_span);
        write_f64_line(out, "rear_plate.disc_y", plate.disc_y);
        let _ = writeln!(out, "rear_plate.ring_count {}", plate.ring_steps());
        for (idx, (radius, count)) in plate.ring_radii.iter().zip(&plate.ring_counts).enumerate() {
            let _ = write!(out, "rear_plate.ring.{idx} {count} ");
            write_f64(out, *radius);
            out.push('\n');
        }
        write_f64_line(out, "rear_plate.last_ring_radius", plate.last_ring_radius);
        write_f64_line(out, "rear_plate.next_radius_at_collapse", plate.next_radius_at_collapse);
        let _ = writeln!(out, "rear_plate.center_index {}", plate.center_index);
    }

    fn write_topology(out: &mut String, topology: &EdgeTopology) {
        let _ = writeln!(out, "topology.edge_count {}", topology.edge_count);
        let _ = writeln!(out, "topology.open_edges {}", topology.open_edges);
        let _ = writeln!(out, "topology.non_manifold_edges {}", topology.non_manifold_edges);
        let _ = writeln!(
            out,
            "topology.orientation_mismatches {}",
            topology.orientation_mismatches
        );
    }

    fn write_groups(out: &mut String, groups: &FaceGroups) {
        let _ = writeln!(out, "groups.count {}", groups.len());
        for (region, range) in groups.iter() {
            let _ = writeln!(out, "groups.{} {} {}", region.key(), range.start, range.end);
        }
    }

    fn write_mesh(out: &mut String, mesh: &MeshBuffers) -> Result<(), String> {
        mesh.validate()?;

        let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
        let _ = writeln!(out, "mesh.triangle_count {}", mesh.triangle_count());

        let _ = writeln!(out, "mesh.positions {}", mesh.positions.len());
        for p in mesh.positions.iter().copied() {
            write_vec3_line(out, "p", p);
        }

        let _ = writeln!(out, "mesh.indices {}", mesh.indices.len());
        for tri in mesh.indices.chunks_exact(3) {
            let _ = writeln!(out, "i {} {} {}", tri[0], tri[1], tri[2]);
        }
        Ok(())
    }

    fn snapshot(op: &str, sections: impl FnOnce(&mut String) -> Result<(), String>) -> Result<String, String> {
        let mut out = String::new();
        let _ = writeln!(out, "# waveguide-engine wall v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out)?;
        Ok(normalize_snapshot_text(&out))
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        RoundHorn,
        RoundHornBare,
        RoundHornThickWall,
        RectHorn,
        RectHornQuadrant1,
        RectHornQuadrant12,
        RectHornQuadrant14,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::RoundHorn,
            Scenario::RoundHornBare,
            Scenario::RoundHornThickWall,
            Scenario::RectHorn,
            Scenario::RectHornQuadrant1,
            Scenario::RectHornQuadrant12,
            Scenario::RectHornQuadrant14,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::RoundHorn => "round_horn",
                Scenario::RoundHornBare => "round_horn_bare",
                Scenario::RoundHornThickWall => "round_horn_thick_wall",
                Scenario::RectHorn => "rect_horn",
                Scenario::RectHornQuadrant1 => "rect_horn_quadrant_1",
                Scenario::RectHornQuadrant12 => "rect_horn_quadrant_12",
                Scenario::RectHornQuadrant14 => "rect_horn_quadrant_14",
            }
        }

        fn from_name(name: &str) -> Option<Self> {
            Scenario::ALL.iter().copied().find(|s| s.name() == name)
        }

        fn params(self) -> HornParams {
            let round = LinearProfile::new(SectionSize::circle(12.5), SectionSize::circle(60.0), 90.0);
            let rect = LinearProfile::new(
                SectionSize::new(14.0, 9.0).corner_radius(4.0),
                SectionSize::new(110.0, 65.0).corner_radius(20.0),
                140.0,
            );
            let rect_params = |quadrants| {
                HornParams::new(48, 16, rect)
                    .corner_segments(6)
                    .quadrants(quadrants)
                    .thickness(3.0)
            };

            match self {
                Scenario::RoundHorn => HornParams::new(32, 12, round).thickness(2.0),
                Scenario::RoundHornBare => HornParams::new(32, 12, round),
                Scenario::RoundHornThickWall => HornParams::new(16, 6, round).thickness(15.0),
                Scenario::RectHorn => rect_params(QuadrantSpec::Full),
                Scenario::RectHornQuadrant1 => rect_params(QuadrantSpec::First),
                Scenario::RectHornQuadrant12 => rect_params(QuadrantSpec::FirstSecond),
                Scenario::RectHornQuadrant14 => rect_params(QuadrantSpec::FirstFourth),
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        build: HornBuild,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        let name = scenario.name();
        let params = scenario.params();
        let build = build_horn(&params).map_err(|e| e.to_string())?;

        let snap = snapshot(name, |out| {
            write_params(out, &params);
            write_angles(out, &build);
            write_wall_diagnostics(out, &build.wall);
            write_topology(out, &build.topology);
            write_groups(out, &build.mesh.groups);
            write_mesh(out, &build.mesh)
        })?;

        Ok(ScenarioOutput {
            name,
            build,
            snapshot: snap,
        })
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
