//! Real-world ↔ voxel-space coordinate mapping.

use crate::error::{GeoError, GeoResult};
use crate::point::{VoxelPoint, VoxelSample, WorldPoint};

/// Configuration for mapping engineering coordinates into the voxel world.
#[derive(Debug, Clone, Copy)]
pub struct TransformConfig {
    /// World-space origin subtracted before scaling.
    pub origin: WorldPoint,
    /// Engineering units per voxel in plan view (easting/northing).
    pub horizontal_scale: f64,
    /// Engineering units per voxel of height. Deep wells use a larger value
    /// here so kilometres of depth compress into the safe band.
    pub vertical_scale: f64,
    /// Voxel height the surface (elevation 0) maps to.
    pub ground_y: i64,
    /// Lowest voxel height the build may touch.
    pub y_min: i64,
    /// Highest voxel height the build may touch.
    pub y_max: i64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            origin: WorldPoint::ZERO,
            horizontal_scale: 1.0,
            vertical_scale: 1.0,
            ground_y: 100,
            y_min: 10,
            y_max: 130,
        }
    }
}

/// Pure, deterministic mapping between engineering and voxel coordinates.
///
/// Elevation maps inversely onto voxel height: deeper points (more negative
/// elevation) get smaller `y`, the surface lands on `ground_y`, and any
/// out-of-band height is clamped to the nearest bound with the clamp flag
/// set on the returned sample.
#[derive(Debug, Clone)]
pub struct CoordinateTransformer {
    config: TransformConfig,
}

impl CoordinateTransformer {
    pub fn new(config: TransformConfig) -> GeoResult<Self> {
        if !(config.horizontal_scale > 0.0) {
            return Err(GeoError::Configuration(format!(
                "horizontal scale must be positive, got {}",
                config.horizontal_scale
            )));
        }
        if !(config.vertical_scale > 0.0) {
            return Err(GeoError::Configuration(format!(
                "vertical scale must be positive, got {}",
                config.vertical_scale
            )));
        }
        if config.y_min >= config.y_max {
            return Err(GeoError::Configuration(format!(
                "safe band is inverted: y_min {} >= y_max {}",
                config.y_min, config.y_max
            )));
        }
        if config.ground_y < config.y_min || config.ground_y > config.y_max {
            return Err(GeoError::Configuration(format!(
                "ground level {} lies outside the safe band [{}, {}]",
                config.ground_y, config.y_min, config.y_max
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Maps a world point to voxel coordinates, clamping the height into the
    /// safe band. Identical inputs always yield identical outputs.
    pub fn to_voxel(&self, world: WorldPoint) -> VoxelSample {
        let local = world - self.config.origin;
        let x = (local.x / self.config.horizontal_scale).round() as i64;
        let z = (local.y / self.config.horizontal_scale).round() as i64;
        let raw_y = self.config.ground_y + (local.z / self.config.vertical_scale).round() as i64;
        let y = raw_y.clamp(self.config.y_min, self.config.y_max);
        VoxelSample {
            point: VoxelPoint::new(x, y, z),
            clamped: y != raw_y,
        }
    }

    /// Inverse of the linear portion of [`to_voxel`](Self::to_voxel).
    ///
    /// Round-trips within one voxel for points that were not clamped.
    pub fn to_world(&self, voxel: VoxelPoint) -> WorldPoint {
        self.config.origin
            + WorldPoint::new(
                voxel.x as f64 * self.config.horizontal_scale,
                voxel.z as f64 * self.config.horizontal_scale,
                (voxel.y - self.config.ground_y) as f64 * self.config.vertical_scale,
            )
    }
}
