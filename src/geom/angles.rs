//! Circumferential angle sampling for rounded-rectangle cross-sections.
//!
//! Every ring of the horn surface is sampled at the same list of angles, so the
//! list fixes the ring topology for a whole rebuild. When the segment count is a
//! multiple of four the list is built from one quadrant and mirrored, which keeps
//! samples on the straight sides and the rounded corners proportional to their
//! length and makes symmetry-reduced meshes (see [`QuadrantSpec`]) line up with
//! the full one.

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Tolerance;

/// Parameters for [`build_angle_list`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleSamplingParams {
    /// Requested number of angular samples around the full circle.
    pub segments: usize,
    /// Mouth half-width (X extent).
    pub half_width: f64,
    /// Mouth half-height (Z extent).
    pub half_height: f64,
    /// Corner rounding radius; clipped to the smaller half-extent.
    #[serde(default)]
    pub corner_radius: f64,
    /// Number of angular steps spent on each rounded corner.
    #[serde(default)]
    pub corner_segments: usize,
}

impl AngleSamplingParams {
    #[must_use]
    pub const fn new(segments: usize, half_width: f64, half_height: f64) -> Self {
        Self {
            segments,
            half_width,
            half_height,
            corner_radius: 0.0,
            corner_segments: 0,
        }
    }

    /// Set the corner rounding.
    #[must_use]
    pub const fn corner(mut self, radius: f64, segments: usize) -> Self {
        self.corner_radius = radius;
        self.corner_segments = segments;
        self
    }
}

/// Output of [`build_angle_list`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleList {
    /// Increasing angles covering `[0, 2π)`.
    pub full_angles: Vec<f64>,
    /// Samples per quadrant, or 0 when the list has no quadrant structure.
    pub points_per_quadrant: usize,
}

impl AngleList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.full_angles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_angles.is_empty()
    }

    #[must_use]
    pub fn has_quadrant_structure(&self) -> bool {
        self.points_per_quadrant > 0
    }
}

/// Build the circumferential sample angles for a rounded-rectangle mouth.
///
/// Falls back to `segments` uniformly spaced angles (and `points_per_quadrant = 0`)
/// when the segment count is not a multiple of four, the half-extents are not
/// positive finite numbers, or mirroring does not produce a clean closed loop.
#[must_use]
pub fn build_angle_list(params: &AngleSamplingParams) -> AngleList {
    let segments = params.segments;
    let extents_valid = params.half_width.is_finite()
        && params.half_height.is_finite()
        && params.half_width > 0.0
        && params.half_height > 0.0;

    if segments < 4 || segments % 4 != 0 || !extents_valid {
        return uniform_angle_list(segments);
    }

    let per_quadrant = segments / 4;
    let corner_radius = if params.corner_radius.is_finite() {
        params.corner_radius
    } else {
        0.0
    };
    let quadrant = quadrant_angles(
        per_quadrant,
        params.half_width,
        params.half_height,
        corner_radius,
        params.corner_segments,
    );
    let full_angles = mirror_quadrant(&quadrant);

    if full_angles.len() != segments || !is_closed_loop(&full_angles) {
        log::debug!(
            "angle mirroring produced {} samples for {} segments; using uniform sampling",
            full_angles.len(),
            segments
        );
        return uniform_angle_list(segments);
    }

    AngleList {
        full_angles,
        points_per_quadrant: per_quadrant,
    }
}

fn uniform_angle_list(segments: usize) -> AngleList {
    let step = TAU / segments.max(1) as f64;
    AngleList {
        full_angles: (0..segments).map(|i| i as f64 * step).collect(),
        points_per_quadrant: 0,
    }
}

/// Angles of one quadrant, `steps + 1` values from 0 to π/2 inclusive.
fn quadrant_angles(
    steps: usize,
    half_width: f64,
    half_height: f64,
    corner_radius: f64,
    corner_segments: usize,
) -> Vec<f64> {
    let linear = || {
        (0..=steps)
            .map(|i| FRAC_PI_2 * i as f64 / steps as f64)
            .collect::<Vec<_>>()
    };

    let radius = corner_radius.min(half_width).min(half_height);
    if radius <= 0.0 || corner_segments == 0 {
        return linear();
    }

    let tol = Tolerance::DEFAULT;
    // Corner circle centre; the straight sides run from the axes up to it.
    let center_x = half_width - radius;
    let center_z = half_height - radius;
    let has_side = !tol.is_zero_length(center_z);
    let has_top = !tol.is_zero_length(center_x);
    let straight_count = usize::from(has_side) + usize::from(has_top);

    let mut arc_steps = corner_segments.min(steps.saturating_sub(straight_count));
    if arc_steps == 0 {
        return linear();
    }

    let rest = steps - arc_steps;
    let (side_steps, top_steps) = match (has_side, has_top) {
        (true, true) => {
            let share = (rest as f64 * center_z / (center_z + center_x)).round() as usize;
            let side = share.clamp(1, rest - 1);
            (side, rest - side)
        }
        (true, false) => (rest, 0),
        (false, true) => (0, rest),
        (false, false) => {
            arc_steps += rest;
            (0, 0)
        }
    };

    // Angular spans of the two straight sides, seen from the axis.
    let side_end = center_z.atan2(half_width);
    let top_start = half_height.atan2(center_x);

    let mut angles = Vec::with_capacity(steps + 1);
    for i in 0..side_steps {
        angles.push(side_end * i as f64 / side_steps as f64);
    }
    for j in 0..arc_steps {
        let phi = FRAC_PI_2 * j as f64 / arc_steps as f64;
        let x = center_x + radius * phi.cos();
        let z = center_z + radius * phi.sin();
        angles.push(z.atan2(x));
    }
    for i in 0..top_steps {
        angles.push(top_start + (FRAC_PI_2 - top_start) * i as f64 / top_steps as f64);
    }
    angles.push(FRAC_PI_2);

    angles[0] = 0.0;
    angles
}

/// Reflect one quadrant across π/2, π and 3π/2, dropping the shared boundary
/// angle each time (and 2π, which duplicates 0).
fn mirror_quadrant(quadrant: &[f64]) -> Vec<f64> {
    let Some(steps) = quadrant.len().checked_sub(1) else {
        return Vec::new();
    };
    if steps == 0 {
        return Vec::new();
    }

    let mut full = Vec::with_capacity(4 * steps);
    full.extend_from_slice(quadrant);
    full.extend(quadrant[..steps].iter().rev().map(|a| PI - a));
    full.extend(quadrant[1..].iter().map(|a| PI + a));
    full.extend(quadrant[1..steps].iter().rev().map(|a| TAU - a));
    full
}

fn is_closed_loop(angles: &[f64]) -> bool {
    angles.first() == Some(&0.0)
        && angles.iter().all(|a| a.is_finite() && *a >= 0.0 && *a < TAU)
        && angles.windows(2).all(|w| w[1] > w[0])
}

/// Which quadrants of the circumference a symmetry-reduced mesh keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuadrantSpec {
    /// `[0, π/2]`.
    #[serde(rename = "1")]
    First,
    /// `[0, π]`.
    #[serde(rename = "12")]
    FirstSecond,
    /// `[-π/2, π/2]`, continuous across angle 0.
    #[serde(rename = "14")]
    FirstFourth,
    /// The whole circle.
    #[default]
    #[serde(rename = "1234")]
    Full,
}

impl QuadrantSpec {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::FirstSecond => "12",
            Self::FirstFourth => "14",
            Self::Full => "1234",
        }
    }

    /// Whether ring columns wrap for this selection.
    #[must_use]
    pub const fn is_full_circle(self) -> bool {
        matches!(self, Self::Full)
    }
}

impl fmt::Display for QuadrantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuadrantSpecError {
    #[error("unknown quadrant selection `{0}` (expected 1, 12, 14 or 1234)")]
    Unknown(String),
}

impl FromStr for QuadrantSpec {
    type Err = QuadrantSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::First),
            "12" => Ok(Self::FirstSecond),
            "14" => Ok(Self::FirstFourth),
            "1234" | "" => Ok(Self::Full),
            other => Err(QuadrantSpecError::Unknown(other.to_string())),
        }
    }
}

/// Extract the angles covered by a symmetry-reduced quadrant selection.
///
/// The `"14"` selection remaps angles in `[3π/2, 2π)` to their negative
/// equivalents so the result runs continuously through angle 0 instead of
/// jumping from π/2 to 3π/2. Angles closer than 1e-9 are de-duplicated.
#[must_use]
pub fn select_angles_for_quadrants(full_angles: &[f64], quadrants: QuadrantSpec) -> Vec<f64> {
    let eps = Tolerance::ANGLE.eps;
    let up_to = |limit: f64| {
        full_angles
            .iter()
            .copied()
            .filter(move |&a| a <= limit + eps)
    };

    let mut selected: Vec<f64> = match quadrants {
        QuadrantSpec::Full => full_angles.to_vec(),
        QuadrantSpec::First => up_to(FRAC_PI_2).collect(),
        QuadrantSpec::FirstSecond => up_to(PI).collect(),
        QuadrantSpec::FirstFourth => {
            let mut angles: Vec<f64> = full_angles
                .iter()
                .copied()
                .filter(|&a| a >= 1.5 * PI - eps)
                .map(|a| a - TAU)
                .collect();
            angles.extend(up_to(FRAC_PI_2));
            angles
        }
    };

    selected.dedup_by(|next, kept| (*next - *kept).abs() <= eps);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_strictly_increasing(angles: &[f64]) {
        for w in angles.windows(2) {
            assert!(w[1] > w[0], "angles not increasing: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn test_plain_rectangle_closes_loop() {
        let list = build_angle_list(&AngleSamplingParams::new(32, 40.0, 25.0));
        assert_eq!(list.len(), 32);
        assert_eq!(list.points_per_quadrant, 8);
        assert_eq!(list.full_angles[0], 0.0);
        assert_strictly_increasing(&list.full_angles);
        assert!(*list.full_angles.last().unwrap() < TAU);
    }

    #[test]
    fn test_indivisible_count_falls_back_to_uniform() {
        let list = build_angle_list(&AngleSamplingParams::new(13, 40.0, 25.0).corner(5.0, 3));
        assert_eq!(list.len(), 13);
        assert_eq!(list.points_per_quadrant, 0);
        for (i, a) in list.full_angles.iter().enumerate() {
            assert!((a - i as f64 * TAU / 13.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_invalid_extents_fall_back_to_uniform() {
        let list = build_angle_list(&AngleSamplingParams::new(16, 0.0, 25.0));
        assert_eq!(list.len(), 16);
        assert!(!list.has_quadrant_structure());

        let list = build_angle_list(&AngleSamplingParams::new(16, f64::NAN, 25.0));
        assert_eq!(list.points_per_quadrant, 0);
    }

    #[test]
    fn test_square_is_symmetric_about_quadrant_boundaries() {
        let list = build_angle_list(&AngleSamplingParams::new(24, 30.0, 30.0));
        let a = &list.full_angles;
        let n = list.points_per_quadrant;
        assert_eq!(n, 6);
        assert!((a[n] - FRAC_PI_2).abs() < 1e-12);
        assert!((a[2 * n] - PI).abs() < 1e-12);
        assert!((a[3 * n] - 1.5 * PI).abs() < 1e-12);
        for i in 1..n {
            assert!((FRAC_PI_2 - a[n - i] - (a[n + i] - FRAC_PI_2)).abs() < 1e-12);
            assert!((PI - a[2 * n - i] - (a[2 * n + i] - PI)).abs() < 1e-12);
            assert!((1.5 * PI - a[3 * n - i] - (a[3 * n + i] - 1.5 * PI)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rounded_corner_keeps_loop_valid() {
        let list = build_angle_list(&AngleSamplingParams::new(48, 60.0, 35.0).corner(12.0, 4));
        assert_eq!(list.len(), 48);
        assert_eq!(list.points_per_quadrant, 12);
        assert_eq!(list.full_angles[0], 0.0);
        assert_strictly_increasing(&list.full_angles);
        assert!((list.full_angles[12] - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_corner_angles_sit_on_corner_arc() {
        let (hw, hh, r) = (50.0, 30.0, 10.0);
        let quadrant = quadrant_angles(10, hw, hh, r, 4);
        assert_eq!(quadrant.len(), 11);
        let corner_start = (hh - r).atan2(hw);
        let corner_end = hh.atan2(hw - r);
        let inside = quadrant
            .iter()
            .filter(|&&a| a >= corner_start - 1e-12 && a < corner_end - 1e-12)
            .count();
        assert_eq!(inside, 4);
    }

    #[test]
    fn test_full_circle_corner_uses_only_arc() {
        // Corner radius equal to both half-extents turns the section into a circle.
        let quadrant = quadrant_angles(6, 20.0, 20.0, 20.0, 2);
        assert_eq!(quadrant.len(), 7);
        for (i, a) in quadrant.iter().enumerate() {
            assert!((a - FRAC_PI_2 * i as f64 / 6.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_corner_segments_is_linear() {
        let quadrant = quadrant_angles(4, 50.0, 30.0, 10.0, 0);
        assert_eq!(quadrant, vec![0.0, FRAC_PI_2 / 4.0, FRAC_PI_2 / 2.0, 3.0 * FRAC_PI_2 / 4.0, FRAC_PI_2]);
    }

    #[test]
    fn test_select_first_quadrant() {
        let list = build_angle_list(&AngleSamplingParams::new(16, 40.0, 40.0));
        let first = select_angles_for_quadrants(&list.full_angles, QuadrantSpec::First);
        assert_eq!(first.len(), 5);
        assert_eq!(first[0], 0.0);
        assert!((first[4] - FRAC_PI_2).abs() < 1e-12);

        let half = select_angles_for_quadrants(&list.full_angles, QuadrantSpec::FirstSecond);
        assert_eq!(half.len(), 9);
        assert!((half[8] - PI).abs() < 1e-12);
    }

    #[test]
    fn test_select_first_fourth_is_continuous() {
        let list = build_angle_list(&AngleSamplingParams::new(32, 50.0, 30.0).corner(8.0, 3));
        let angles = select_angles_for_quadrants(&list.full_angles, QuadrantSpec::FirstFourth);
        assert_eq!(angles.len(), 17);
        assert!((angles[0] + FRAC_PI_2).abs() < 1e-12);
        assert!((angles[16] - FRAC_PI_2).abs() < 1e-12);
        assert_strictly_increasing(&angles);

        let average = (angles[16] - angles[0]) / 16.0;
        for w in angles.windows(2) {
            assert!(w[1] - w[0] <= 2.0 * average + 1e-12);
        }
    }

    #[test]
    fn test_select_full_removes_near_duplicates() {
        let angles = [0.0, 1e-12, 1.0, 2.0, 2.0 + 5e-10];
        let out = select_angles_for_quadrants(&angles, QuadrantSpec::Full);
        assert_eq!(out, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_quadrant_spec_parsing() {
        assert_eq!("1".parse::<QuadrantSpec>(), Ok(QuadrantSpec::First));
        assert_eq!("12".parse::<QuadrantSpec>(), Ok(QuadrantSpec::FirstSecond));
        assert_eq!(" 14 ".parse::<QuadrantSpec>(), Ok(QuadrantSpec::FirstFourth));
        assert_eq!("1234".parse::<QuadrantSpec>(), Ok(QuadrantSpec::Full));
        assert!("23".parse::<QuadrantSpec>().is_err());
        assert!(QuadrantSpec::Full.is_full_circle());
        assert!(!QuadrantSpec::FirstFourth.is_full_circle());
        assert_eq!(QuadrantSpec::FirstFourth.to_string(), "14");
    }
}
