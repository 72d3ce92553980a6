//! Point types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A position in engineering units: x = easting, y = northing, z = elevation
/// (negative = below surface).
pub type WorldPoint = glam::DVec3;

/// Integer block coordinates in target-world space; `y` is the vertical axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct VoxelPoint {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl VoxelPoint {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for VoxelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

/// A transformed point together with whether it was clamped into the safe
/// band. The clamp event travels in the value so callers can detect
/// information loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelSample {
    pub point: VoxelPoint,
    pub clamped: bool,
}

/// Removes duplicate voxel coordinates while preserving first-seen order.
///
/// Idempotent: `dedup_voxels(dedup_voxels(s)) == dedup_voxels(s)`.
pub fn dedup_voxels(points: impl IntoIterator<Item = VoxelPoint>) -> Vec<VoxelPoint> {
    let mut seen = HashSet::new();
    points.into_iter().filter(|p| seen.insert(*p)).collect()
}
