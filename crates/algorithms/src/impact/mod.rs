//! Building exposure
//!
//! - Building: the single building schema and its input variants
//! - Join: flag buildings whose pixel is flooded

mod building;
mod join;

pub use building::{parse_buildings, Building, BuildingKind, BuildingSource};
pub use join::{
    annotate_buildings, join_buildings, join_buildings_with_bbox, pixel_index, ImpactSummary,
};
