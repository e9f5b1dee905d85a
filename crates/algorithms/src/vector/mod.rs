//! Mask ↔ vector conversion
//!
//! - Polygonize: one polygon per 4-connected region, traced along pixel
//!   edges, with holes as interior rings
//! - Rasterize: polygons back to a mask by pixel-center containment

mod polygonize;
mod rasterize;

pub use polygonize::{export_features, export_features_with_bbox, label_regions, polygonize, VectorExporter};
pub use rasterize::{rasterize, rasterize_polygons};
