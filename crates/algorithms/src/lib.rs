//! # floodsar Algorithms
//!
//! Flood analytics built on `floodsar_core` rasters and masks.
//!
//! ## Categories
//!
//! - **classification**: 1-D k-means and the unsupervised water classifier
//! - **imagery**: before/after change detection on SAR backscatter
//! - **morphology**: binary dilation and majority (speckle) filtering
//! - **hydrology**: flat-surface depth, downhill propagation, terrain summaries
//! - **vector**: mask polygonization and rasterization
//! - **impact**: building records and the building × mask join
//! - **prediction**: precipitation/terrain nowcasting and evacuation ranking
//! - **analysis**: end-to-end pipeline, configuration and pixel statistics

pub mod analysis;
pub mod classification;
pub mod hydrology;
pub mod imagery;
pub mod impact;
pub(crate) mod maybe_rayon;
pub mod morphology;
pub mod prediction;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::analysis::{AnalysisConfig, FloodAnalysis, FloodPixelStats, FloodReport};
    pub use crate::classification::{ClassifierState, WaterClassifier, WaterClassifierParams};
    pub use crate::hydrology::{
        estimate_depth, simulate_propagation, terrain_summary, DepthParams, DepthResult,
        PropagationParams, RiskTier, TerrainStats,
    };
    pub use crate::imagery::{ChangeDetector, ChangeDetectorParams, TrainingPolicy};
    pub use crate::impact::{join_buildings, Building, BuildingSource};
    pub use crate::prediction::{
        rank_evacuation, EvacuationPriority, PrecipitationStats, PredictionResult, RiskLevel,
        RiskPredictor,
    };
    pub use crate::vector::{export_features, polygonize, rasterize};
    pub use floodsar_core::prelude::*;
}
