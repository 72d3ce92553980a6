//! JSON boundary types for collaborator-supplied data.
//!
//! Survey and horizon files come from external tooling, so parsing errors
//! name the offending record index rather than a JSON byte offset.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use stratavox_geo::{HorizonPoint, SurveyStation, WorldPoint};

#[derive(Debug, Deserialize)]
struct StationRecord {
    tvd: f64,
    azimuth: f64,
    inclination: f64,
}

/// Corner files use the build-plane y-up convention: `{x, y, z}` with `y`
/// the elevation and `x`/`z` the horizontal axes.
#[derive(Debug, Deserialize)]
struct CornerRecord {
    x: f64,
    y: f64,
    z: f64,
}

/// Scattered horizon exports; point ids are carried in the source files but
/// not needed here.
#[derive(Debug, Deserialize)]
struct HorizonRecord {
    line_number: u32,
    easting: f64,
    northing: f64,
    elevation: f64,
}

pub fn load_stations(path: &Path) -> Result<Vec<SurveyStation>> {
    parse_stations(&read(path)?)
}

pub fn load_corners(path: &Path) -> Result<Vec<WorldPoint>> {
    parse_corners(&read(path)?)
}

pub fn load_horizon_points(path: &Path) -> Result<Vec<HorizonPoint>> {
    parse_horizon_points(&read(path)?)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn parse_stations(text: &str) -> Result<Vec<SurveyStation>> {
    records(text, "station")?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let record: StationRecord = serde_json::from_value(value).with_context(|| {
                format!("station {index} is missing or mistypes tvd/azimuth/inclination")
            })?;
            Ok(SurveyStation {
                tvd: record.tvd,
                azimuth_deg: record.azimuth,
                inclination_deg: record.inclination,
            })
        })
        .collect()
}

/// Parses corner records, swizzling the y-up build-plane convention into the
/// world frame (x = easting, y = northing, z = elevation).
pub fn parse_corners(text: &str) -> Result<Vec<WorldPoint>> {
    records(text, "corner")?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let record: CornerRecord = serde_json::from_value(value)
                .with_context(|| format!("corner {index} is missing or mistypes x/y/z"))?;
            Ok(WorldPoint::new(record.x, record.z, record.y))
        })
        .collect()
}

pub fn parse_horizon_points(text: &str) -> Result<Vec<HorizonPoint>> {
    records(text, "horizon point")?
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let record: HorizonRecord = serde_json::from_value(value).with_context(|| {
                format!("horizon point {index} is missing or mistypes line_number/easting/northing/elevation")
            })?;
            Ok(HorizonPoint {
                line_id: record.line_number,
                position: WorldPoint::new(record.easting, record.northing, record.elevation),
            })
        })
        .collect()
}

fn records(text: &str, kind: &str) -> Result<Vec<serde_json::Value>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(text).with_context(|| format!("expected a JSON array of {kind} records"))?;
    Ok(values)
}

/// Parses a `easting,northing,elevation` triple from the command line.
pub fn parse_world_point(text: &str) -> Result<WorldPoint> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    anyhow::ensure!(
        parts.len() == 3,
        "expected easting,northing,elevation, got {text:?}"
    );
    let mut coords = [0.0f64; 3];
    for (slot, part) in coords.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .with_context(|| format!("{part:?} is not a number in {text:?}"))?;
    }
    Ok(WorldPoint::new(coords[0], coords[1], coords[2]))
}
