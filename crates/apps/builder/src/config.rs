//! Builder configuration sourced from the environment.

use std::env;
use std::time::Duration;
use stratavox_geo::{TransformConfig, VoxelPoint, WorldPoint};
use stratavox_rcon::RconConfig;

/// Configuration for the Stratavox builder binary.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Remote console connection settings.
    pub rcon: RconConfig,
    /// Coordinate transform settings.
    pub transform: TransformConfig,
    /// Depth interval between interpolated trajectory samples.
    pub sample_step: f64,
    /// Inputs larger than this are rejected before any processing.
    pub max_points: usize,
    /// Corner of the build area cleared by a reset.
    pub area_min: VoxelPoint,
    /// Opposite corner of the build area cleared by a reset.
    pub area_max: VoxelPoint,
    /// Where occupants are teleported during a reset.
    pub spawn: VoxelPoint,
}

impl BuilderConfig {
    /// Builds a configuration from `STRATAVOX_*` environment variables while
    /// falling back to sensible defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("STRATAVOX_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = env_parsed("STRATAVOX_PORT", 25575u16);
        let secret = env::var("STRATAVOX_SECRET").unwrap_or_default();
        let timeout = Duration::from_millis(env_parsed("STRATAVOX_TIMEOUT_MS", 5000u64));
        let max_retries = env_parsed("STRATAVOX_MAX_RETRIES", 3u32);

        let y_min = env_parsed("STRATAVOX_Y_MIN", 10i64);
        let y_max = env_parsed("STRATAVOX_Y_MAX", 130i64);
        let ground_y = env_parsed("STRATAVOX_GROUND_Y", 100i64);
        let horizontal_scale = env_parsed("STRATAVOX_SCALE", 10.0f64);
        let vertical_scale = env_parsed("STRATAVOX_VERTICAL_SCALE", horizontal_scale);
        let origin_easting = env_parsed("STRATAVOX_ORIGIN_EASTING", 0.0f64);
        let origin_northing = env_parsed("STRATAVOX_ORIGIN_NORTHING", 0.0f64);

        let sample_step = env_parsed("STRATAVOX_SAMPLE_STEP", 5.0f64);
        let max_points = env_parsed("STRATAVOX_MAX_POINTS", 500_000usize);

        let area_min = env_voxel("STRATAVOX_AREA_MIN", VoxelPoint::new(-200, y_min, -200));
        let area_max = env_voxel("STRATAVOX_AREA_MAX", VoxelPoint::new(200, y_max, 200));
        let spawn = env_voxel("STRATAVOX_SPAWN", VoxelPoint::new(0, ground_y + 2, 0));

        anyhow::ensure!(sample_step > 0.0, "sample step must be positive");
        anyhow::ensure!(max_points >= 1, "point ceiling must be at least 1");

        Ok(Self {
            rcon: RconConfig {
                host,
                port,
                secret,
                timeout,
                max_retries,
                ..RconConfig::default()
            },
            transform: TransformConfig {
                origin: WorldPoint::new(origin_easting, origin_northing, 0.0),
                horizontal_scale,
                vertical_scale,
                ground_y,
                y_min,
                y_max,
            },
            sample_step,
            max_points,
            area_min,
            area_max,
            spawn,
        })
    }

    /// Rejects absurdly large inputs before any processing happens.
    pub fn ensure_point_budget(&self, points: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            points <= self.max_points,
            "input of {points} points exceeds the configured ceiling of {} (raise STRATAVOX_MAX_POINTS if intentional)",
            self.max_points
        );
        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_voxel(name: &str, default: VoxelPoint) -> VoxelPoint {
    env::var(name)
        .ok()
        .and_then(|v| parse_voxel(&v))
        .unwrap_or(default)
}

fn parse_voxel(text: &str) -> Option<VoxelPoint> {
    let mut parts = text.split(',').map(|p| p.trim().parse::<i64>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z)), None) => Some(VoxelPoint::new(x, y, z)),
        _ => None,
    }
}
