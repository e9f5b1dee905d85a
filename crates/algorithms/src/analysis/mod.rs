//! End-to-end flood analysis
//!
//! Wires change detection, depth, propagation and polygonization into one
//! run over a before/after/DEM triple.

mod config;
mod pipeline;
mod stats;

pub use config::AnalysisConfig;
pub use pipeline::{FloodAnalysis, FloodReport};
pub use stats::{FloodPixelStats, FloodSeverity};
