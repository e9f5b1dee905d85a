//! Flood hydrology from a flood mask and a DEM
//!
//! - Depth: flat water surface at the mean flooded elevation
//! - Propagation: iterative downhill spread of the flooded area
//! - Terrain: elevation/slope summaries and low-lying area detection

mod depth;
mod propagation;
mod terrain;

pub use depth::{estimate_depth, DepthEstimator, DepthParams, DepthResult, RiskTier};
pub use propagation::{simulate_propagation, PropagationParams, PropagationSimulator};
pub use terrain::{low_lying_areas, terrain_summary, LowLyingAreas, TerrainStats};
