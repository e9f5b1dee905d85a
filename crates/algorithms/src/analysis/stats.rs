//! Pixel statistics of a flood analysis

use serde::{Deserialize, Serialize};

use crate::hydrology::DepthResult;
use floodsar_core::Mask;

/// Overall severity label of a detected flood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FloodSeverity {
    Moderate,
    Critical,
}

/// Counts and areas, rounded to two decimals for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodPixelStats {
    pub total_pixels: usize,
    pub flooded_pixels: usize,
    pub flood_percentage: f64,
    pub area_km2: f64,
    pub flooded_area_km2: f64,
    pub max_depth_m: f64,
    pub risk_level: FloodSeverity,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl FloodPixelStats {
    pub fn compute(mask: &Mask, depth: &DepthResult, pixel_area_km2: f64, critical_depth_m: f64) -> Self {
        let total = mask.len();
        let flooded = mask.count();
        let max_depth = depth.max_depth();

        Self {
            total_pixels: total,
            flooded_pixels: flooded,
            flood_percentage: round2(100.0 * flooded as f64 / total.max(1) as f64),
            area_km2: round2(total as f64 * pixel_area_km2),
            flooded_area_km2: round2(flooded as f64 * pixel_area_km2),
            max_depth_m: round2(max_depth),
            risk_level: if max_depth > critical_depth_m {
                FloodSeverity::Critical
            } else {
                FloodSeverity::Moderate
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrology::{estimate_depth, DepthParams};
    use floodsar_core::Raster;

    #[test]
    fn test_counts_and_areas() {
        let mut mask = Mask::new(100, 100);
        mask.fill_rect(0..10, 0..30);
        let dem = Raster::filled(100, 100, 5.0);
        let depth = estimate_depth(&mask, &dem, &DepthParams::default()).unwrap();

        let stats = FloodPixelStats::compute(&mask, &depth, 0.0001, 1.2);
        assert_eq!(stats.total_pixels, 10_000);
        assert_eq!(stats.flooded_pixels, 300);
        assert_eq!(stats.flood_percentage, 3.0);
        assert_eq!(stats.area_km2, 1.0);
        assert_eq!(stats.flooded_area_km2, 0.03);
        assert_eq!(stats.risk_level, FloodSeverity::Moderate);
    }

    #[test]
    fn test_deep_flood_is_critical() {
        let mut mask = Mask::new(1, 2);
        mask.fill_rect(0..1, 0..2);
        let dem = Raster::from_vec(vec![0.0, 3.0], 1, 2).unwrap();
        let depth = estimate_depth(&mask, &dem, &DepthParams::default()).unwrap();

        let stats = FloodPixelStats::compute(&mask, &depth, 0.0001, 1.2);
        assert_eq!(stats.max_depth_m, 1.5);
        assert_eq!(stats.risk_level, FloodSeverity::Critical);
        assert_eq!(serde_json::to_value(stats.risk_level).unwrap(), "CRITICAL");
    }

    #[test]
    fn test_empty_raster() {
        let mask = Mask::new(0, 0);
        let dem: Raster<f64> = Raster::new(0, 0);
        let depth = estimate_depth(&mask, &dem, &DepthParams::default()).unwrap();
        let stats = FloodPixelStats::compute(&mask, &depth, 0.0001, 1.2);
        assert_eq!(stats.flood_percentage, 0.0);
    }
}
