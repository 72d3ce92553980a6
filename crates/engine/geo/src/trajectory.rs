//! Deviation-survey trajectory calculation.

use crate::error::{GeoError, GeoResult};
use crate::point::{dedup_voxels, VoxelPoint, WorldPoint};
use crate::transform::CoordinateTransformer;
use serde::{Deserialize, Serialize};

/// One measured station of a deviation survey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyStation {
    /// True vertical depth, measured positive downward.
    pub tvd: f64,
    /// Azimuth in degrees, clockwise from north, `[0, 360)`.
    pub azimuth_deg: f64,
    /// Inclination from vertical in degrees, `[0, 180]`.
    pub inclination_deg: f64,
}

impl SurveyStation {
    fn validate(&self, index: usize) -> GeoResult<()> {
        if !self.tvd.is_finite() || self.tvd < 0.0 {
            return Err(GeoError::Validation(format!(
                "station {index}: tvd must be finite and >= 0, got {}",
                self.tvd
            )));
        }
        if !self.azimuth_deg.is_finite() || self.azimuth_deg < 0.0 || self.azimuth_deg >= 360.0 {
            return Err(GeoError::Validation(format!(
                "station {index}: azimuth must lie in [0, 360), got {}",
                self.azimuth_deg
            )));
        }
        if !self.inclination_deg.is_finite()
            || self.inclination_deg < 0.0
            || self.inclination_deg > 180.0
        {
            return Err(GeoError::Validation(format!(
                "station {index}: inclination must lie in [0, 180], got {}",
                self.inclination_deg
            )));
        }
        Ok(())
    }
}

/// Inclusive value range along one world axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    fn over(values: impl Iterator<Item = f64>) -> Self {
        let mut range = Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        };
        for v in values {
            range.min = range.min.min(v);
            range.max = range.max.max(v);
        }
        range
    }
}

/// Summary statistics computed over the world-space point sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryStats {
    /// Largest absolute elevation reached.
    pub max_depth: f64,
    /// Planar distance from the start to the last point.
    pub horizontal_displacement: f64,
    /// Sum of segment lengths along the path.
    pub path_length: f64,
    pub easting: AxisRange,
    pub northing: AxisRange,
    pub elevation: AxisRange,
}

/// A computed wellbore path: the dense world-space polyline, its voxelized
/// form, and summary statistics. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Trajectory {
    world_points: Vec<WorldPoint>,
    voxels: Vec<VoxelPoint>,
    clamped: usize,
    stats: TrajectoryStats,
}

impl Trajectory {
    pub fn world_points(&self) -> &[WorldPoint] {
        &self.world_points
    }

    /// Deduplicated voxel path, first occurrence first.
    pub fn voxels(&self) -> &[VoxelPoint] {
        &self.voxels
    }

    /// Number of points clamped into the safe band during transformation.
    pub fn clamped(&self) -> usize {
        self.clamped
    }

    pub fn stats(&self) -> &TrajectoryStats {
        &self.stats
    }
}

/// Converts ordered survey stations into a dense voxel path.
#[derive(Debug)]
pub struct TrajectoryCalculator<'a> {
    transformer: &'a CoordinateTransformer,
    sample_step: f64,
}

impl<'a> TrajectoryCalculator<'a> {
    /// `sample_step` is the depth interval (engineering units) between
    /// interpolated samples; it is further capped at one voxel's real-world
    /// scale so station gaps can never leave visual holes.
    pub fn new(transformer: &'a CoordinateTransformer, sample_step: f64) -> GeoResult<Self> {
        if !(sample_step > 0.0) {
            return Err(GeoError::Configuration(format!(
                "sample step must be positive, got {sample_step}"
            )));
        }
        Ok(Self {
            transformer,
            sample_step,
        })
    }

    /// Walks consecutive station pairs, projecting each depth interval with
    /// the average-angle method and densifying it, then voxelizes the path.
    ///
    /// Fails fast without returning a partial trajectory.
    pub fn compute(
        &self,
        stations: &[SurveyStation],
        start: WorldPoint,
    ) -> GeoResult<Trajectory> {
        if stations.len() < 2 {
            return Err(GeoError::Validation(format!(
                "a trajectory requires at least 2 survey stations, got {}",
                stations.len()
            )));
        }
        for (index, station) in stations.iter().enumerate() {
            station.validate(index)?;
        }
        for (index, pair) in stations.windows(2).enumerate() {
            if pair[1].tvd < pair[0].tvd {
                return Err(GeoError::Validation(format!(
                    "station {}: tvd {} decreases from previous {}",
                    index + 1,
                    pair[1].tvd,
                    pair[0].tvd
                )));
            }
        }

        let step = self
            .sample_step
            .min(self.transformer.config().horizontal_scale);
        let mut world = vec![start];
        let mut cursor = start;

        for pair in stations.windows(2) {
            let delta_tvd = pair[1].tvd - pair[0].tvd;
            if delta_tvd == 0.0 {
                continue;
            }

            let inc = ((pair[0].inclination_deg + pair[1].inclination_deg) / 2.0).to_radians();
            let az = average_azimuth_deg(pair[0].azimuth_deg, pair[1].azimuth_deg).to_radians();

            let horizontal = delta_tvd * inc.sin();
            let delta = WorldPoint::new(
                horizontal * az.sin(),
                horizontal * az.cos(),
                -delta_tvd * inc.cos(),
            );

            let samples = (delta_tvd / step).ceil().max(1.0) as usize;
            for k in 1..=samples {
                world.push(cursor + delta * (k as f64 / samples as f64));
            }
            cursor += delta;
        }

        let stats = TrajectoryStats {
            max_depth: world.iter().map(|p| p.z.abs()).fold(0.0, f64::max),
            horizontal_displacement: (cursor.truncate() - start.truncate()).length(),
            path_length: world.windows(2).map(|w| (w[1] - w[0]).length()).sum(),
            easting: AxisRange::over(world.iter().map(|p| p.x)),
            northing: AxisRange::over(world.iter().map(|p| p.y)),
            elevation: AxisRange::over(world.iter().map(|p| p.z)),
        };

        let samples: Vec<_> = world.iter().map(|p| self.transformer.to_voxel(*p)).collect();
        let clamped = samples.iter().filter(|s| s.clamped).count();
        if clamped > 0 {
            tracing::warn!(
                "{} of {} trajectory points clamped into the safe band",
                clamped,
                samples.len()
            );
        }
        let voxels = dedup_voxels(samples.into_iter().map(|s| s.point));

        tracing::debug!(
            "trajectory computed: {} stations -> {} world points -> {} voxels",
            stations.len(),
            world.len(),
            voxels.len()
        );

        Ok(Trajectory {
            world_points: world,
            voxels,
            clamped,
            stats,
        })
    }
}

/// Averages two azimuths along the shorter arc, so 359° and 1° meet at 0°
/// rather than 180°.
fn average_azimuth_deg(a: f64, b: f64) -> f64 {
    let mut diff = b - a;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    (a + diff / 2.0).rem_euclid(360.0)
}
