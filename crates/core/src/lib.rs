//! # floodsar Core
//!
//! Core types, traits and I/O for the floodsar flood analytics engine.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid (backscatter, elevation, depth)
//! - `Mask`: Boolean raster used for water and flood masks
//! - `BoundingBox` / `GeoTransform`: lon/lat extent and the affine pixel mapping
//! - `Feature` / `FeatureCollection`: vector output ready for GeoJSON
//! - GeoTIFF I/O for single-band rasters

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{BoundingBox, Connectivity, GeoTransform, Mask, Raster, RasterElement};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{BoundingBox, Connectivity, GeoTransform, Mask, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection};
    pub use crate::Algorithm;
}

/// Core trait for the analysis components.
///
/// Components are pure functions of their input and parameters; any state
/// (such as a fitted classifier) lives in the implementing value.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
