//! Raster data structures and operations

mod bbox;
mod element;
mod geotransform;
mod grid;
mod mask;
mod neighborhood;

pub use bbox::BoundingBox;
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use mask::Mask;
pub use neighborhood::Connectivity;
