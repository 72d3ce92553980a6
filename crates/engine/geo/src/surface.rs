//! Horizon surface interpolation.
//!
//! Scattered or boundary horizon picks come in two shapes: exactly four
//! corner points (bilinear quad) or several survey lines of points
//! (multi-line). Both produce a dense world-space grid which is then
//! voxelized and deduplicated.

use crate::error::{GeoError, GeoResult};
use crate::point::{dedup_voxels, VoxelPoint, WorldPoint};
use crate::transform::CoordinateTransformer;
use std::collections::{BTreeMap, HashSet};

/// Densified surfaces must exceed this multiple of the raw input count.
const DENSIFICATION_FACTOR: usize = 3;
/// Densified surfaces must span more than this many distinct values per
/// horizontal axis.
const MIN_AXIS_SPAN: usize = 3;

/// One scattered horizon pick, tagged with the survey line it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonPoint {
    pub line_id: u32,
    /// World-frame position (x = easting, y = northing, z = elevation).
    pub position: WorldPoint,
}

/// An interpolated horizon: the dense world-space grid, its voxelized form,
/// and densification diagnostics. Immutable after construction.
#[derive(Debug, Clone)]
pub struct HorizonSurface {
    world_points: Vec<WorldPoint>,
    voxels: Vec<VoxelPoint>,
    clamped: usize,
    sparse: bool,
}

impl HorizonSurface {
    pub fn world_points(&self) -> &[WorldPoint] {
        &self.world_points
    }

    /// Deduplicated voxel grid, first occurrence first.
    pub fn voxels(&self) -> &[VoxelPoint] {
        &self.voxels
    }

    /// Number of points clamped into the safe band during transformation.
    pub fn clamped(&self) -> usize {
        self.clamped
    }

    /// True when densification fell below the adequacy threshold. Callers
    /// should treat this as a warning, not a hard failure.
    pub fn is_sparse(&self) -> bool {
        self.sparse
    }
}

/// Interpolates horizon point sets into dense voxel surfaces.
#[derive(Debug)]
pub struct SurfaceInterpolator<'a> {
    transformer: &'a CoordinateTransformer,
}

impl<'a> SurfaceInterpolator<'a> {
    pub fn new(transformer: &'a CoordinateTransformer) -> Self {
        Self { transformer }
    }

    /// Bilinear interpolation over exactly four corner points.
    ///
    /// Corners are classified by sorting on (easting, northing). For every
    /// integer plan-view cell inside the bounding box the elevation is the
    /// standard bilinear blend of the corner elevations. A degenerate box
    /// (zero extent on either axis) assigns every cell the unweighted average
    /// of the four corner elevations.
    pub fn interpolate_quad(&self, corners: &[WorldPoint]) -> GeoResult<HorizonSurface> {
        if corners.len() != 4 {
            return Err(GeoError::Validation(format!(
                "quad interpolation requires exactly 4 corner points, got {}",
                corners.len()
            )));
        }

        let mut sorted: [WorldPoint; 4] = [corners[0], corners[1], corners[2], corners[3]];
        sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        let [bottom_left, top_left, bottom_right, top_right] = sorted;

        let x_min = sorted.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
        let x_max = sorted.iter().map(|c| c.x).fold(f64::NEG_INFINITY, f64::max);
        let y_min = sorted.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
        let y_max = sorted.iter().map(|c| c.y).fold(f64::NEG_INFINITY, f64::max);

        let degenerate = x_max == x_min || y_max == y_min;
        let mean_elevation = sorted.iter().map(|c| c.z).sum::<f64>() / 4.0;

        let mut world = Vec::new();
        for xi in (x_min.ceil() as i64)..=(x_max.floor() as i64) {
            for yi in (y_min.ceil() as i64)..=(y_max.floor() as i64) {
                let x = xi as f64;
                let y = yi as f64;
                let elevation = if degenerate {
                    mean_elevation
                } else {
                    let u = (x - x_min) / (x_max - x_min);
                    let v = (y - y_min) / (y_max - y_min);
                    bottom_left.z * (1.0 - u) * (1.0 - v)
                        + bottom_right.z * u * (1.0 - v)
                        + top_left.z * (1.0 - u) * v
                        + top_right.z * u * v
                };
                world.push(WorldPoint::new(x, y, elevation));
            }
        }

        if world.is_empty() {
            return Err(GeoError::Validation(
                "quad footprint does not cover any integer plan-view cell".into(),
            ));
        }

        Ok(self.finish(world, false))
    }

    /// Multi-line interpolation over points grouped by `line_id`.
    ///
    /// Each line is first densified along the dominant horizontal axis, then
    /// adjacent lines are blended at matching along-line positions to fill
    /// the cross-line plane.
    pub fn interpolate_lines(&self, points: &[HorizonPoint]) -> GeoResult<HorizonSurface> {
        if points.is_empty() {
            return Err(GeoError::Validation("empty horizon point set".into()));
        }

        let mut lines: BTreeMap<u32, Vec<WorldPoint>> = BTreeMap::new();
        for point in points {
            lines.entry(point.line_id).or_default().push(point.position);
        }
        if lines.len() < 2 {
            return Err(GeoError::Validation(format!(
                "multi-line interpolation requires at least 2 survey lines, got {}",
                lines.len()
            )));
        }

        // Dominant horizontal axis over the whole point set decides the
        // along-line coordinate; the other axis is the cross-line direction.
        let x_range = axis_extent(points.iter().map(|p| p.position.x));
        let y_range = axis_extent(points.iter().map(|p| p.position.y));
        let along_x = x_range >= y_range;

        let dense_lines: Vec<BTreeMap<i64, WorldPoint>> = {
            let mut dense: Vec<(f64, BTreeMap<i64, WorldPoint>)> = lines
                .values()
                .map(|line| {
                    let dense = densify_line(line, along_x);
                    let mean_cross = line.iter().map(|p| cross_of(p, along_x)).sum::<f64>()
                        / line.len() as f64;
                    (mean_cross, dense)
                })
                .collect();
            // Adjacency in cross-line space, not line-id order.
            dense.sort_by(|a, b| a.0.total_cmp(&b.0));
            dense.into_iter().map(|(_, line)| line).collect()
        };

        let mut world: Vec<WorldPoint> = Vec::new();
        for line in &dense_lines {
            world.extend(line.values().copied());
        }
        for pair in dense_lines.windows(2) {
            for (pos, a) in &pair[0] {
                let Some(b) = pair[1].get(pos) else { continue };
                let gap = (cross_of(b, along_x) - cross_of(a, along_x)).abs();
                let steps = gap.ceil().max(1.0) as i64;
                for j in 1..steps {
                    let t = j as f64 / steps as f64;
                    world.push(*a + (*b - *a) * t);
                }
            }
        }

        let distinct_x = distinct_rounded(world.iter().map(|p| p.x));
        let distinct_y = distinct_rounded(world.iter().map(|p| p.y));
        let sparse = world.len() < DENSIFICATION_FACTOR * points.len()
            || distinct_x <= MIN_AXIS_SPAN
            || distinct_y <= MIN_AXIS_SPAN;
        if sparse {
            tracing::warn!(
                "horizon densification below adequacy threshold: {} raw -> {} interpolated ({} x {} distinct cells)",
                points.len(),
                world.len(),
                distinct_x,
                distinct_y
            );
        }

        Ok(self.finish(world, sparse))
    }

    fn finish(&self, world: Vec<WorldPoint>, sparse: bool) -> HorizonSurface {
        let samples: Vec<_> = world.iter().map(|p| self.transformer.to_voxel(*p)).collect();
        let clamped = samples.iter().filter(|s| s.clamped).count();
        if clamped > 0 {
            tracing::warn!(
                "{} of {} horizon points clamped into the safe band",
                clamped,
                samples.len()
            );
        }
        let voxels = dedup_voxels(samples.into_iter().map(|s| s.point));
        HorizonSurface {
            world_points: world,
            voxels,
            clamped,
            sparse,
        }
    }
}

fn along_of(p: &WorldPoint, along_x: bool) -> f64 {
    if along_x {
        p.x
    } else {
        p.y
    }
}

fn cross_of(p: &WorldPoint, along_x: bool) -> f64 {
    if along_x {
        p.y
    } else {
        p.x
    }
}

fn axis_extent(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    max - min
}

fn distinct_rounded(values: impl Iterator<Item = f64>) -> usize {
    values
        .map(|v| v.round() as i64)
        .collect::<HashSet<_>>()
        .len()
}

/// Linearly interpolates between consecutive same-line points at integer
/// positions along the dominant axis. Single-point lines contribute their
/// one point at its rounded position.
fn densify_line(line: &[WorldPoint], along_x: bool) -> BTreeMap<i64, WorldPoint> {
    let mut sorted = line.to_vec();
    sorted.sort_by(|a, b| along_of(a, along_x).total_cmp(&along_of(b, along_x)));

    let mut dense = BTreeMap::new();
    if sorted.len() == 1 {
        dense.insert(along_of(&sorted[0], along_x).round() as i64, sorted[0]);
        return dense;
    }

    for pair in sorted.windows(2) {
        let a = along_of(&pair[0], along_x);
        let b = along_of(&pair[1], along_x);
        for pos in (a.ceil() as i64)..=(b.floor() as i64) {
            let t = if b == a { 0.0 } else { (pos as f64 - a) / (b - a) };
            dense.insert(pos, pair[0] + (pair[1] - pair[0]) * t);
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformConfig;

    fn transformer() -> CoordinateTransformer {
        CoordinateTransformer::new(TransformConfig {
            horizontal_scale: 1.0,
            vertical_scale: 1.0,
            ground_y: 100,
            y_min: 10,
            y_max: 130,
            ..TransformConfig::default()
        })
        .unwrap()
    }

    fn corner_elevation(surface: &HorizonSurface, x: f64, y: f64) -> f64 {
        surface
            .world_points()
            .iter()
            .find(|p| p.x == x && p.y == y)
            .map(|p| p.z)
            .expect("grid cell missing")
    }

    #[test]
    fn test_quad_requires_four_corners() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let err = interp
            .interpolate_quad(&[WorldPoint::ZERO, WorldPoint::ONE])
            .unwrap_err();
        assert!(matches!(err, GeoError::Validation(_)));
    }

    #[test]
    fn test_bilinear_exact_at_corners_and_centroid() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let corners = vec![
            WorldPoint::new(0.0, 0.0, 10.0),
            WorldPoint::new(10.0, 0.0, 20.0),
            WorldPoint::new(0.0, 10.0, 30.0),
            WorldPoint::new(10.0, 10.0, 40.0),
        ];
        let surface = interp.interpolate_quad(&corners).unwrap();

        assert_eq!(corner_elevation(&surface, 0.0, 0.0), 10.0);
        assert_eq!(corner_elevation(&surface, 10.0, 0.0), 20.0);
        assert_eq!(corner_elevation(&surface, 0.0, 10.0), 30.0);
        assert_eq!(corner_elevation(&surface, 10.0, 10.0), 40.0);

        // Centroid of a symmetric box equals the corner mean.
        assert!((corner_elevation(&surface, 5.0, 5.0) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_quad_yields_full_uniform_grid() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let corners = vec![
            WorldPoint::new(0.0, 0.0, 30.0),
            WorldPoint::new(0.0, 10.0, 30.0),
            WorldPoint::new(10.0, 0.0, 30.0),
            WorldPoint::new(10.0, 10.0, 30.0),
        ];
        let surface = interp.interpolate_quad(&corners).unwrap();
        assert_eq!(surface.world_points().len(), 121);
        assert!(surface.world_points().iter().all(|p| p.z == 30.0));
        assert_eq!(surface.voxels().len(), 121);
        assert!(surface.voxels().iter().all(|v| v.y == 130));
    }

    #[test]
    fn test_degenerate_quad_uses_corner_mean() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        // Zero extent along northing; elevations 0/10/20/30 average to 15.
        let corners = vec![
            WorldPoint::new(0.0, 5.0, 0.0),
            WorldPoint::new(4.0, 5.0, 10.0),
            WorldPoint::new(8.0, 5.0, 20.0),
            WorldPoint::new(12.0, 5.0, 30.0),
        ];
        let surface = interp.interpolate_quad(&corners).unwrap();
        assert!(!surface.world_points().is_empty());
        assert!(surface.world_points().iter().all(|p| p.z == 15.0));
    }

    fn horizon_line(line_id: u32, points: &[(f64, f64, f64)]) -> Vec<HorizonPoint> {
        points
            .iter()
            .map(|&(x, y, z)| HorizonPoint {
                line_id,
                position: WorldPoint::new(x, y, z),
            })
            .collect()
    }

    #[test]
    fn test_multi_line_requires_two_lines() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let points = horizon_line(1, &[(0.0, 0.0, 5.0), (10.0, 0.0, 5.0)]);
        let err = interp.interpolate_lines(&points).unwrap_err();
        assert!(matches!(err, GeoError::Validation(_)));
    }

    #[test]
    fn test_multi_line_fills_cross_line_plane() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let mut points = horizon_line(1, &[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0)]);
        points.extend(horizon_line(2, &[(0.0, 10.0, 10.0), (10.0, 10.0, 10.0)]));

        let surface = interp.interpolate_lines(&points).unwrap();
        assert!(!surface.is_sparse());
        // 11 per line plus 9 cross fills per along position.
        assert_eq!(surface.world_points().len(), 121);

        // Cross-line blend: halfway between elevation 0 and 10.
        let mid = surface
            .world_points()
            .iter()
            .find(|p| p.x == 5.0 && p.y == 5.0)
            .expect("cross fill missing");
        assert!((mid.z - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_under_densified_surface_is_flagged_sparse() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let mut points = horizon_line(1, &[(0.0, 0.0, 0.0), (2.0, 0.0, 0.0)]);
        points.extend(horizon_line(2, &[(0.0, 1.0, 1.0), (2.0, 1.0, 1.0)]));

        let surface = interp.interpolate_lines(&points).unwrap();
        assert!(surface.is_sparse());
    }

    #[test]
    fn test_surface_voxels_are_deduplicated() {
        let t = transformer();
        let interp = SurfaceInterpolator::new(&t);
        let corners = vec![
            WorldPoint::new(0.0, 0.0, 30.0),
            WorldPoint::new(0.0, 4.0, 30.0),
            WorldPoint::new(4.0, 0.0, 30.0),
            WorldPoint::new(4.0, 4.0, 30.0),
        ];
        let surface = interp.interpolate_quad(&corners).unwrap();
        let mut seen = std::collections::HashSet::new();
        for v in surface.voxels() {
            assert!(seen.insert(*v), "duplicate voxel {v}");
        }
    }
}
