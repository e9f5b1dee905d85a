//! Polygon-to-mask conversion
//!
//! A cell is set when its center lies inside any polygon. For polygons
//! produced by [`polygonize`](super::polygonize) this reproduces the mask
//! exactly, since ring vertices sit on pixel corners.

use geo::{BoundingRect, Contains};
use geo_types::{Geometry, Point, Polygon};

use floodsar_core::{FeatureCollection, Mask};

/// Rasterize the polygonal features of `features` onto the grid of `like`.
///
/// Non-polygonal geometries are ignored.
pub fn rasterize(features: &FeatureCollection, like: &Mask) -> Mask {
    let mut polygons = Vec::new();
    for feature in features.iter() {
        match &feature.geometry {
            Some(Geometry::Polygon(p)) => polygons.push(p.clone()),
            Some(Geometry::MultiPolygon(mp)) => polygons.extend(mp.0.iter().cloned()),
            _ => {}
        }
    }
    rasterize_polygons(&polygons, like)
}

/// Rasterize polygons onto the grid (shape and transform) of `like`.
pub fn rasterize_polygons(polygons: &[Polygon<f64>], like: &Mask) -> Mask {
    let (rows, cols) = like.shape();
    let transform = *like.transform();
    let mut out = Mask::new(rows, cols);
    out.set_transform(transform);

    for polygon in polygons {
        let Some(rect) = polygon.bounding_rect() else {
            continue;
        };
        let (min, max) = (rect.min(), rect.max());
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = transform.pixel_to_geo(col, row);
                if x < min.x || x > max.x || y < min.y || y > max.y {
                    continue;
                }
                if polygon.contains(&Point::new(x, y)) {
                    out.data_mut()[(row, col)] = true;
                }
            }
        }
    }
    out
}
