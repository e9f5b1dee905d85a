//! Imagery-free flood nowcasting
//!
//! - Nowcast: area flood probability from precipitation and terrain summaries
//! - Evacuation: per-building urgency ranking
//! - Zones: concentric probability rectangles for map display

mod evacuation;
mod nowcast;
mod zones;

pub use evacuation::{rank_evacuation, EvacuationParams, EvacuationPriority};
pub use nowcast::{
    NowcastParams, NowcastReport, PrecipitationStats, PredictionResult, RiskFactors, RiskLevel,
    RiskPredictor,
};
pub use zones::risk_zones;
