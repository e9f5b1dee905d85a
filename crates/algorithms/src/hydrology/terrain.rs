//! Terrain summaries used by the nowcast model
//!
//! Slope uses Horn's 3x3 method with metric cell sizes derived from the
//! lon/lat pixel size at the raster's central latitude.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::maybe_rayon::*;
use floodsar_core::{Error, Raster, Result};

/// Metres per degree of latitude
const METERS_PER_DEG_LAT: f64 = 110_574.0;
/// Metres per degree of longitude at the equator
const METERS_PER_DEG_LON: f64 = 111_320.0;

/// Aggregate elevation and slope of an area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainStats {
    pub mean_elevation_m: f64,
    pub min_elevation_m: f64,
    pub max_elevation_m: f64,
    pub std_elevation_m: f64,
    pub mean_slope_deg: f64,
}

impl Default for TerrainStats {
    /// Moderate lowland terrain, used when no DEM is available
    fn default() -> Self {
        Self {
            mean_elevation_m: 100.0,
            min_elevation_m: 50.0,
            max_elevation_m: 150.0,
            std_elevation_m: 0.0,
            mean_slope_deg: 5.0,
        }
    }
}

/// Elevation statistics and mean Horn slope of `dem`.
///
/// Non-finite cells are ignored. Slope is averaged over interior cells with
/// a complete 3x3 neighborhood; rasters smaller than 3x3 report slope 0.
///
/// # Errors
/// [`Error::Algorithm`] when the DEM has no finite cell.
pub fn terrain_summary(dem: &Raster<f64>) -> Result<TerrainStats> {
    let valid: Vec<f64> = dem.data().iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return Err(Error::Algorithm("DEM has no valid cells".into()));
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let std = (valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let stats = TerrainStats {
        mean_elevation_m: mean,
        min_elevation_m: min,
        max_elevation_m: max,
        std_elevation_m: std,
        mean_slope_deg: mean_slope(dem),
    };
    debug!(?stats, "terrain summary");
    Ok(stats)
}

fn mean_slope(dem: &Raster<f64>) -> f64 {
    let (rows, cols) = dem.shape();
    if rows < 3 || cols < 3 {
        return 0.0;
    }

    let gt = dem.transform();
    let (_, center_lat) = dem.bbox().center();
    let dx = (gt.pixel_width * METERS_PER_DEG_LON * center_lat.to_radians().cos()).abs();
    let dy = (gt.pixel_height * METERS_PER_DEG_LAT).abs();
    if !(dx > 0.0 && dy > 0.0) {
        return 0.0;
    }

    let slopes: Vec<f64> = (1..rows - 1)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = Vec::with_capacity(cols);
            for col in 1..cols - 1 {
                let a = unsafe { dem.get_unchecked(row - 1, col - 1) };
                let b = unsafe { dem.get_unchecked(row - 1, col) };
                let c = unsafe { dem.get_unchecked(row - 1, col + 1) };
                let d = unsafe { dem.get_unchecked(row, col - 1) };
                let e = unsafe { dem.get_unchecked(row, col) };
                let f = unsafe { dem.get_unchecked(row, col + 1) };
                let g = unsafe { dem.get_unchecked(row + 1, col - 1) };
                let h = unsafe { dem.get_unchecked(row + 1, col) };
                let i = unsafe { dem.get_unchecked(row + 1, col + 1) };

                if [a, b, c, d, e, f, g, h, i].iter().any(|v| !v.is_finite()) {
                    continue;
                }

                // Horn's method
                let dz_dx = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * dx);
                let dz_dy = ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * dy);
                row_data.push((dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan().to_degrees());
            }
            row_data
        })
        .collect();

    if slopes.is_empty() {
        0.0
    } else {
        slopes.iter().sum::<f64>() / slopes.len() as f64
    }
}

/// Share and location of the lowest cells of a DEM
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LowLyingAreas {
    /// Percent of valid cells strictly below the threshold
    pub percentage: f64,
    /// Elevation at the requested percentile
    pub threshold_elevation_m: f64,
    /// Mean position of the low cells, `None` when there are none
    pub center_lon: Option<f64>,
    pub center_lat: Option<f64>,
}

/// Cells below the `percentile`-th elevation percentile (linear interpolation).
///
/// # Errors
/// `percentile` outside `[0, 100]`, or a DEM without finite cells.
pub fn low_lying_areas(dem: &Raster<f64>, percentile: f64) -> Result<LowLyingAreas> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(Error::InvalidParameter {
            name: "percentile",
            value: percentile.to_string(),
            reason: "must be within [0, 100]".to_string(),
        });
    }

    let mut sorted: Vec<f64> = dem.data().iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Err(Error::Algorithm("DEM has no valid cells".into()));
    }
    sorted.sort_by(f64::total_cmp);

    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let threshold = sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64);

    let mut count = 0usize;
    let (mut sum_row, mut sum_col) = (0.0, 0.0);
    for ((row, col), &v) in dem.data().indexed_iter() {
        if v.is_finite() && v < threshold {
            count += 1;
            sum_row += row as f64;
            sum_col += col as f64;
        }
    }

    let (center_lon, center_lat) = if count > 0 {
        let gt = dem.transform();
        let col = sum_col / count as f64 + 0.5;
        let row = sum_row / count as f64 + 0.5;
        (
            Some(gt.origin_x + col * gt.pixel_width),
            Some(gt.origin_y + row * gt.pixel_height),
        )
    } else {
        (None, None)
    };

    Ok(LowLyingAreas {
        percentage: 100.0 * count as f64 / sorted.len() as f64,
        threshold_elevation_m: threshold,
        center_lon,
        center_lat,
    })
}
