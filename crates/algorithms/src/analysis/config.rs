//! Analysis configuration
//!
//! Every section is optional when deserializing; missing values take the
//! component defaults.

use serde::{Deserialize, Serialize};

use crate::classification::WaterClassifierParams;
use crate::hydrology::{DepthParams, PropagationParams};
use crate::imagery::ChangeDetectorParams;
use crate::prediction::{EvacuationParams, NowcastParams};

/// Parameters of every component in one place
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub classifier: WaterClassifierParams,
    pub change: ChangeDetectorParams,
    pub depth: DepthParams,
    pub propagation: PropagationParams,
    pub nowcast: NowcastParams,
    pub evacuation: EvacuationParams,
    /// Ground area of one pixel (default: 0.0001 km², a 10 m pixel)
    pub pixel_area_km2: f64,
    /// Maximum depth above which a flood is critical (default: 1.2 m)
    pub critical_depth_m: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            classifier: WaterClassifierParams::default(),
            change: ChangeDetectorParams::default(),
            depth: DepthParams::default(),
            propagation: PropagationParams::default(),
            nowcast: NowcastParams::default(),
            evacuation: EvacuationParams::default(),
            pixel_area_km2: 0.0001,
            critical_depth_m: 1.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imagery::TrainingPolicy;
    use floodsar_core::Connectivity;

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{"change": {"training": "pretrained"}, "propagation": {"steps": 5, "connectivity": "four"}}"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.change.training, TrainingPolicy::Pretrained);
        assert_eq!(config.change.water_threshold_db, -15.0);
        assert_eq!(config.propagation.steps, 5);
        assert_eq!(config.propagation.connectivity, Connectivity::Four);
        assert_eq!(config.classifier.max_samples, 100_000);
        assert_eq!(config.pixel_area_km2, 0.0001);
    }
}
