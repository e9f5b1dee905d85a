//! Flat-surface flood depth
//!
//! The water surface is approximated by a single level: the mean DEM
//! elevation over flooded cells. Depth is how far each flooded cell lies
//! below that level. This is a proxy, not a hydraulic solve.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use floodsar_core::{Algorithm, Error, Mask, Raster, Result};

/// Ordinal flood risk of a single pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RiskTier {
    None = 0,
    Low = 1,
    Moderate = 2,
    High = 3,
}

impl RiskTier {
    /// Tier for a depth; non-decreasing in `depth`.
    pub fn from_depth(depth: f64, params: &DepthParams) -> Self {
        if depth > params.high_m {
            RiskTier::High
        } else if depth > params.moderate_m {
            RiskTier::Moderate
        } else if depth > params.low_m {
            RiskTier::Low
        } else {
            RiskTier::None
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RiskTier::None),
            1 => Some(RiskTier::Low),
            2 => Some(RiskTier::Moderate),
            3 => Some(RiskTier::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::None => "none",
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
        }
    }
}

/// Depth cutoffs (metres) for the risk tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthParams {
    /// Deeper than this is `Low` (default: 0.1)
    pub low_m: f64,
    /// Deeper than this is `Moderate` (default: 0.5)
    pub moderate_m: f64,
    /// Deeper than this is `High` (default: 1.5)
    pub high_m: f64,
}

impl Default for DepthParams {
    fn default() -> Self {
        Self {
            low_m: 0.1,
            moderate_m: 0.5,
            high_m: 1.5,
        }
    }
}

impl DepthParams {
    fn validate(&self) -> Result<()> {
        let ordered = self.low_m <= self.moderate_m && self.moderate_m <= self.high_m;
        let finite = self.low_m.is_finite() && self.moderate_m.is_finite() && self.high_m.is_finite();
        if !(ordered && finite && self.low_m >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "depth cutoffs",
                value: format!("{}/{}/{}", self.low_m, self.moderate_m, self.high_m),
                reason: "must be finite, non-negative and ascending".to_string(),
            });
        }
        Ok(())
    }
}

/// Depth raster, tier raster and the water level used
#[derive(Debug, Clone)]
pub struct DepthResult {
    /// Depth in metres; 0 outside the flood mask
    pub depth: Raster<f64>,
    /// [`RiskTier`] codes
    pub tiers: Raster<u8>,
    /// Water surface elevation; `None` for an empty mask
    pub water_level_m: Option<f64>,
}

impl DepthResult {
    /// Largest depth, 0 when nothing is flooded
    pub fn max_depth(&self) -> f64 {
        self.depth.data().iter().copied().fold(0.0, f64::max)
    }

    pub fn tier_at(&self, row: usize, col: usize) -> Result<RiskTier> {
        let code = self.tiers.get(row, col)?;
        RiskTier::from_code(code).ok_or_else(|| Error::Other(format!("invalid tier code {}", code)))
    }

    /// Pixel count per tier, indexed by tier code
    pub fn tier_counts(&self) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for &code in self.tiers.data().iter() {
            counts[(code as usize).min(3)] += 1;
        }
        counts
    }
}

/// Depth estimation algorithm
#[derive(Debug, Clone, Default)]
pub struct DepthEstimator;

impl Algorithm for DepthEstimator {
    type Input = (Mask, Raster<f64>);
    type Output = DepthResult;
    type Params = DepthParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DepthEstimator"
    }

    fn description(&self) -> &'static str {
        "Flat-surface flood depth and risk tiers from a flood mask and DEM"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (mask, dem) = input;
        estimate_depth(&mask, &dem, &params)
    }
}

/// Estimate depth and risk tier for every pixel of `mask`.
///
/// Non-finite DEM cells count as elevation 0.
///
/// # Errors
/// [`Error::SizeMismatch`] when `dem` and `mask` differ in shape.
pub fn estimate_depth(mask: &Mask, dem: &Raster<f64>, params: &DepthParams) -> Result<DepthResult> {
    params.validate()?;
    if dem.shape() != mask.shape() {
        return Err(Error::size_mismatch(mask.shape(), dem.shape()));
    }

    let (rows, cols) = mask.shape();
    let mut depth = dem.with_same_meta::<f64>(rows, cols);
    depth.set_transform(*mask.transform());
    let mut tiers = depth.with_same_meta::<u8>(rows, cols);

    let flooded = mask.count();
    if flooded == 0 {
        return Ok(DepthResult {
            depth,
            tiers,
            water_level_m: None,
        });
    }

    let dem = dem.finite_or_zero();
    let level = mask.iter_set().map(|(r, c)| dem.data()[(r, c)]).sum::<f64>() / flooded as f64;

    let depth_data = Array2::from_shape_fn((rows, cols), |(r, c)| {
        if mask.data()[(r, c)] {
            (level - dem.data()[(r, c)]).max(0.0)
        } else {
            0.0
        }
    });
    let tier_data = depth_data.mapv(|d| RiskTier::from_depth(d, params).code());
    *depth.data_mut() = depth_data;
    *tiers.data_mut() = tier_data;

    let result = DepthResult {
        depth,
        tiers,
        water_level_m: Some(level),
    };
    debug!(
        water_level_m = level,
        max_depth_m = result.max_depth(),
        "flood depth estimated"
    );
    Ok(result)
}
