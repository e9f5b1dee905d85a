//! Precipitation/terrain flood probability
//!
//! `p = clamp((w_p·precip + w_t·terrain + w_s·slope) × time, p_min, p_max)`
//! where each factor is normalized to `[0, 1]`: heavier rain, lower ground
//! and flatter slopes all raise the probability, and longer horizons
//! inflate it up to a cap.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::evacuation::{rank_evacuation, EvacuationParams, EvacuationPriority};
use super::zones::risk_zones;
use crate::hydrology::TerrainStats;
use crate::impact::Building;
use floodsar_core::{BoundingBox, FeatureCollection};

/// Area precipitation summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecipitationStats {
    pub mean_mm: f64,
    pub max_mm: f64,
    /// Synthetic rather than measured data; lowers confidence
    pub is_simulated: bool,
}

impl Default for PrecipitationStats {
    fn default() -> Self {
        Self {
            mean_mm: 0.0,
            max_mm: 0.0,
            is_simulated: true,
        }
    }
}

/// Flood risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// ≥0.75 critical, ≥0.55 high, ≥0.35 moderate, else low
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.75 {
            RiskLevel::Critical
        } else if p >= 0.55 {
            RiskLevel::High
        } else if p >= 0.35 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized contributions behind a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub precipitation: f64,
    pub terrain: f64,
    pub slope: f64,
    pub time: f64,
}

/// Area-level flood prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Within `[min_probability, max_probability]`
    pub flood_probability: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub factors: RiskFactors,
    pub horizon_hours: f64,
}

/// Parameters for the nowcast model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NowcastParams {
    /// Mean precipitation giving a full precipitation factor (default: 50 mm)
    pub precip_saturation_mm: f64,
    /// Minimum elevation at which the terrain factor reaches 0 (default: 150 m)
    pub terrain_reference_m: f64,
    /// Mean slope at which the slope factor reaches 0 (default: 10°)
    pub slope_reference_deg: f64,
    pub precip_weight: f64,
    pub terrain_weight: f64,
    pub slope_weight: f64,
    /// Time factor growth per hour of horizon (default: 0.02)
    pub time_gain_per_hour: f64,
    pub max_time_factor: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    pub measured_confidence: f64,
    pub simulated_confidence: f64,
}

impl Default for NowcastParams {
    fn default() -> Self {
        Self {
            precip_saturation_mm: 50.0,
            terrain_reference_m: 150.0,
            slope_reference_deg: 10.0,
            precip_weight: 0.5,
            terrain_weight: 0.3,
            slope_weight: 0.2,
            time_gain_per_hour: 0.02,
            max_time_factor: 1.2,
            min_probability: 0.05,
            max_probability: 0.95,
            measured_confidence: 0.85,
            simulated_confidence: 0.70,
        }
    }
}

/// Prediction plus everything derived from it for one area
#[derive(Debug, Clone)]
pub struct NowcastReport {
    pub prediction: PredictionResult,
    pub evacuation: Vec<EvacuationPriority>,
    pub risk_zones: FeatureCollection,
}

fn finite_or(v: f64, default: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        default
    }
}

/// Imagery-free flood risk model
#[derive(Debug, Clone, Default)]
pub struct RiskPredictor {
    params: NowcastParams,
}

impl RiskPredictor {
    pub fn new(params: NowcastParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &NowcastParams {
        &self.params
    }

    /// Flood probability for the next `horizon_hours`.
    ///
    /// Non-finite inputs fall back to 0 mm rain, 50 m minimum elevation and
    /// a 5° slope; a negative or non-finite horizon counts as 0.
    pub fn predict(&self, precip: &PrecipitationStats, terrain: &TerrainStats, horizon_hours: f64) -> PredictionResult {
        let p = &self.params;
        let mean_precip = finite_or(precip.mean_mm, 0.0);
        let min_elev = finite_or(terrain.min_elevation_m, 50.0);
        let slope = finite_or(terrain.mean_slope_deg, 5.0);
        let horizon = finite_or(horizon_hours, 0.0).max(0.0);

        let factors = RiskFactors {
            precipitation: (mean_precip / p.precip_saturation_mm).clamp(0.0, 1.0),
            terrain: ((p.terrain_reference_m - min_elev) / p.terrain_reference_m).clamp(0.0, 1.0),
            slope: ((p.slope_reference_deg - slope) / p.slope_reference_deg).clamp(0.0, 1.0),
            time: (1.0 + horizon * p.time_gain_per_hour).min(p.max_time_factor),
        };

        let base = p.precip_weight * factors.precipitation
            + p.terrain_weight * factors.terrain
            + p.slope_weight * factors.slope;
        let probability = finite_or(base * factors.time, p.min_probability).clamp(p.min_probability, p.max_probability);

        let result = PredictionResult {
            flood_probability: probability,
            risk_level: RiskLevel::from_probability(probability),
            confidence: if precip.is_simulated {
                p.simulated_confidence
            } else {
                p.measured_confidence
            },
            factors,
            horizon_hours: horizon,
        };
        info!(
            probability,
            risk = %result.risk_level,
            confidence = result.confidence,
            horizon_hours = horizon,
            "flood risk predicted"
        );
        result
    }

    /// Prediction, evacuation ranking and risk zones for `bbox`.
    pub fn nowcast(
        &self,
        bbox: &BoundingBox,
        precip: &PrecipitationStats,
        terrain: &TerrainStats,
        horizon_hours: f64,
        buildings: &[Building],
        evacuation: &EvacuationParams,
    ) -> NowcastReport {
        let prediction = self.predict(precip, terrain, horizon_hours);
        NowcastReport {
            evacuation: rank_evacuation(
                buildings,
                prediction.flood_probability,
                prediction.horizon_hours,
                evacuation,
            ),
            risk_zones: risk_zones(bbox, prediction.flood_probability),
            prediction,
        }
    }
}
