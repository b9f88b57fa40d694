//! Named triangle ranges used to tag mesh regions for downstream grouping.
//!
//! Ranges are half-open and count triangles, not vertices or index-buffer
//! slots. Each region is recorded at most once and ranges never overlap, so a
//! second write is rejected when it is recorded rather than silently merged.

use std::fmt;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// Mesh regions this engine tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshRegion {
    /// The inner horn / waveguide surface.
    InnerSurface,
    /// Outer shell, mouth band and rear plate added around the inner surface.
    FreestandingWall,
}

impl MeshRegion {
    /// Key used for this region in exported group maps.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::InnerSurface => "innerSurface",
            Self::FreestandingWall => "freestandingWall",
        }
    }
}

impl fmt::Display for MeshRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Half-open range `[start, end)` over triangle indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriangleRange {
    pub start: usize,
    pub end: usize,
}

impl TriangleRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    #[must_use]
    pub const fn contains(&self, triangle: usize) -> bool {
        triangle >= self.start && triangle < self.end
    }

    /// Empty ranges overlap nothing.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    #[error("mesh region `{0}` is already recorded")]
    AlreadyRecorded(MeshRegion),

    #[error("range {start}..{end} for `{region}` overlaps `{other}`")]
    Overlap {
        region: MeshRegion,
        other: MeshRegion,
        start: usize,
        end: usize,
    },

    #[error("range {start}..{end} for `{region}` is inverted")]
    InvalidRange {
        region: MeshRegion,
        start: usize,
        end: usize,
    },
}

/// Recorded region ranges, in recording order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceGroups {
    entries: Vec<(MeshRegion, TriangleRange)>,
}

impl FaceGroups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the range for `region`.
    ///
    /// # Errors
    /// Fails when the region is already present, the range is inverted, or it
    /// overlaps a range recorded for another region.
    pub fn record(&mut self, region: MeshRegion, range: TriangleRange) -> Result<(), GroupError> {
        if range.end < range.start {
            return Err(GroupError::InvalidRange {
                region,
                start: range.start,
                end: range.end,
            });
        }
        if self.contains(region) {
            return Err(GroupError::AlreadyRecorded(region));
        }
        if let Some((other, _)) = self
            .entries
            .iter()
            .find(|(_, existing)| existing.overlaps(&range))
        {
            return Err(GroupError::Overlap {
                region,
                other: *other,
                start: range.start,
                end: range.end,
            });
        }

        self.entries.push((region, range));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, region: MeshRegion) -> Option<TriangleRange> {
        self.entries
            .iter()
            .find_map(|(r, range)| (*r == region).then_some(*range))
    }

    #[must_use]
    pub fn contains(&self, region: MeshRegion) -> bool {
        self.get(region).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeshRegion, TriangleRange)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Region owning `triangle`, if any.
    #[must_use]
    pub fn region_of(&self, triangle: usize) -> Option<MeshRegion> {
        self.entries
            .iter()
            .find_map(|(region, range)| range.contains(triangle).then_some(*region))
    }
}

impl Serialize for FaceGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (region, range) in &self.entries {
            map.serialize_entry(region.key(), range)?;
        }
        map.end()
    }
}
