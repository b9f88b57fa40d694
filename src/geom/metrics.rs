//! Opt-in timing hooks for the wall builder.
//!
//! Timing is only collected when the `wall_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles to a plain closure invocation.
//!
//! # Usage
//!
//! ```ignore
//! use waveguide_engine::geom::{WallMetrics, TimingBucket};
//!
//! let mut metrics = WallMetrics::default();
//! metrics.begin();
//!
//! let normals = metrics.time(TimingBucket::Normals, || {
//!     estimate_vertex_normals(&mesh, &grid)
//! });
//!
//! if let Some(report) = metrics.end() {
//!     println!("Normals: {} ns", report.normals_ns);
//! }
//! ```

/// Phases of a mesh build that can be timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Building and selecting circumferential angles.
    AngleSampling,
    /// Inner surface extrusion from a profile.
    Extrusion,
    /// Per-vertex normal estimation.
    Normals,
    /// Offset sign resolution and outer shell placement.
    Offset,
    /// Outer shell and mouth band triangulation.
    Stitch,
    /// Axial strip and rear disc.
    RearPlate,
    /// Topology checks.
    Diagnostics,
}

/// Timing report with nanosecond precision.
///
/// All fields are cumulative; repeated calls to the same bucket add up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WallTimingReport {
    pub angle_sampling_ns: u64,
    pub extrusion_ns: u64,
    pub normals_ns: u64,
    pub offset_ns: u64,
    pub stitch_ns: u64,
    pub rear_plate_ns: u64,
    pub diagnostics_ns: u64,
}

impl WallTimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.angle_sampling_ns
            .saturating_add(self.extrusion_ns)
            .saturating_add(self.normals_ns)
            .saturating_add(self.offset_ns)
            .saturating_add(self.stitch_ns)
            .saturating_add(self.rear_plate_ns)
            .saturating_add(self.diagnostics_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }

    /// Adds every bucket of `other` to this report.
    pub fn merge(&mut self, other: &Self) {
        self.angle_sampling_ns = self.angle_sampling_ns.saturating_add(other.angle_sampling_ns);
        self.extrusion_ns = self.extrusion_ns.saturating_add(other.extrusion_ns);
        self.normals_ns = self.normals_ns.saturating_add(other.normals_ns);
        self.offset_ns = self.offset_ns.saturating_add(other.offset_ns);
        self.stitch_ns = self.stitch_ns.saturating_add(other.stitch_ns);
        self.rear_plate_ns = self.rear_plate_ns.saturating_add(other.rear_plate_ns);
        self.diagnostics_ns = self.diagnostics_ns.saturating_add(other.diagnostics_ns);
    }
}

/// Accumulator for timing build phases.
///
/// Call [`begin`](Self::begin) to reset, wrap phases with
/// [`time`](Self::time), and call [`end`](Self::end) to retrieve the report.
/// When metrics are disabled [`end`](Self::end) returns `None`.
#[derive(Debug, Default)]
pub struct WallMetrics {
    #[cfg(all(feature = "wall_metrics", not(target_arch = "wasm32")))]
    report: WallTimingReport,
}

impl WallMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "wall_metrics", not(target_arch = "wasm32")))]
        {
            self.report = WallTimingReport::default();
        }
    }

    #[must_use]
    pub fn end(&self) -> Option<WallTimingReport> {
        #[cfg(all(feature = "wall_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "wall_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times `f` and adds the elapsed time to `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "wall_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let elapsed = start.elapsed();
            // Cap at u64::MAX to prevent overflow
            let nanos_u64 = elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos_u64);
            result
        }

        #[cfg(not(all(feature = "wall_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "wall_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::AngleSampling => &mut self.report.angle_sampling_ns,
            TimingBucket::Extrusion => &mut self.report.extrusion_ns,
            TimingBucket::Normals => &mut self.report.normals_ns,
            TimingBucket::Offset => &mut self.report.offset_ns,
            TimingBucket::Stitch => &mut self.report.stitch_ns,
            TimingBucket::RearPlate => &mut self.report.rear_plate_ns,
            TimingBucket::Diagnostics => &mut self.report.diagnostics_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_report_total() {
        let report = WallTimingReport {
            normals_ns: 1000,
            stitch_ns: 2000,
            rear_plate_ns: 3000,
            ..Default::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn test_time_returns_closure_result() {
        let mut metrics = WallMetrics::default();
        metrics.begin();
        let result = metrics.time(TimingBucket::RearPlate, || 42);
        assert_eq!(result, 42);
        let report = metrics.end();
        assert_eq!(
            report.is_some(),
            cfg!(all(feature = "wall_metrics", not(target_arch = "wasm32")))
        );
    }

    #[test]
    fn test_merge_adds_buckets() {
        let mut report = WallTimingReport {
            extrusion_ns: 10,
            ..Default::default()
        };
        report.merge(&WallTimingReport {
            extrusion_ns: 5,
            offset_ns: u64::MAX,
            ..Default::default()
        });
        assert_eq!(report.extrusion_ns, 15);
        assert_eq!(report.offset_ns, u64::MAX);
    }
}
