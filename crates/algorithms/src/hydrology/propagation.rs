//! Short-horizon flood spread under gravity
//!
//! Cellular automaton: each step the flooded area may grow by one ring of
//! neighbors, admitting only cells that lie below the mean elevation of the
//! current flooded area. There is no mass or momentum conservation.

use ndarray::Zip;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::morphology::binary_dilate;
use floodsar_core::{Algorithm, Connectivity, Error, Mask, Raster, Result};

/// Parameters for flood propagation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationParams {
    /// Number of spread iterations (default: 3)
    pub steps: usize,
    /// Neighbor set used for growth (default: four)
    pub connectivity: Connectivity,
}

impl Default for PropagationParams {
    fn default() -> Self {
        Self {
            steps: 3,
            connectivity: Connectivity::Four,
        }
    }
}

/// Flood propagation algorithm
#[derive(Debug, Clone, Default)]
pub struct PropagationSimulator;

impl PropagationSimulator {
    /// Caveat carried by every forecast derived from this simulator.
    pub const LIMITATION: &'static str = "Forecast is a diffusion-limited downhill approximation \
         (one neighbor ring per step below the mean flooded elevation), not a hydrodynamic model; \
         steps are iterations, not hours.";
}

impl Algorithm for PropagationSimulator {
    type Input = (Mask, Raster<f64>);
    type Output = Mask;
    type Params = PropagationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PropagationSimulator"
    }

    fn description(&self) -> &'static str {
        "Iterative downhill spread of a flood mask over a DEM"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (mask, dem) = input;
        simulate_propagation(&mask, &dem, &params)
    }
}

/// Forecast flood extent after `params.steps` spread iterations.
///
/// The result always contains `mask`. An empty mask or a flat DEM returns
/// `mask` unchanged; iteration also stops once a step admits no cell.
/// Non-finite DEM cells count as elevation 0.
///
/// # Errors
/// [`Error::SizeMismatch`] when `dem` and `mask` differ in shape.
pub fn simulate_propagation(mask: &Mask, dem: &Raster<f64>, params: &PropagationParams) -> Result<Mask> {
    if dem.shape() != mask.shape() {
        return Err(Error::size_mismatch(mask.shape(), dem.shape()));
    }

    let mut future = mask.clone();
    if !mask.any() {
        return Ok(future);
    }

    let dem = dem.finite_or_zero();
    let (min, max) = dem
        .data()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max == min {
        debug!("flat DEM, flood extent unchanged");
        return Ok(future);
    }

    for step in 0..params.steps {
        let flooded = future.count();
        let level = future.iter_set().map(|(r, c)| dem.data()[(r, c)]).sum::<f64>() / flooded as f64;

        let grown = binary_dilate(&future, params.connectivity);
        let mut admitted = 0usize;
        Zip::from(future.data_mut())
            .and(grown.data())
            .and(dem.data())
            .for_each(|cell, &candidate, &z| {
                if !*cell && candidate && z < level {
                    *cell = true;
                    admitted += 1;
                }
            });

        debug!(step = step + 1, admitted, water_level_m = level, "propagation step");
        if admitted == 0 {
            break;
        }
    }

    Ok(future)
}
