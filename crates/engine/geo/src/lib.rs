//! Subsurface geometry pipeline for Stratavox.
//!
//! This crate provides:
//! - Real-world ↔ voxel-space coordinate transforms with safe-band clamping
//! - Deviation-survey trajectory calculation and densification
//! - Horizon surface interpolation (bilinear quad and multi-line modes)
//! - Order-preserving voxel deduplication

pub mod error;
pub mod point;
pub mod surface;
pub mod trajectory;
pub mod transform;

pub use error::{GeoError, GeoResult};
pub use point::{dedup_voxels, VoxelPoint, VoxelSample, WorldPoint};
pub use surface::{HorizonPoint, HorizonSurface, SurfaceInterpolator};
pub use trajectory::{SurveyStation, Trajectory, TrajectoryCalculator, TrajectoryStats};
pub use transform::{CoordinateTransformer, TransformConfig};
