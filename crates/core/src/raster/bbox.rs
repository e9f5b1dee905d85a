//! Geographic bounding box shared by all rasters of one analysis

use serde::{Deserialize, Serialize};

use super::GeoTransform;
use crate::error::{Error, Result};

/// Longitude/latitude extent `[min_lon, min_lat, max_lon, max_lat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse the conventional `[minLon, minLat, maxLon, maxLat]` ordering.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        match values {
            [min_lon, min_lat, max_lon, max_lat] => Ok(Self::new(*min_lon, *min_lat, *max_lon, *max_lat)),
            _ => Err(Error::InvalidParameter {
                name: "bbox",
                value: format!("{:?}", values),
                reason: "expected 4 values: minLon,minLat,maxLon,maxLat".to_string(),
            }),
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// Longitudinal extent in degrees
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitudinal extent in degrees
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Centre point as `(lon, lat)`
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// True when the box has no positive area or holds non-finite values.
    pub fn is_degenerate(&self) -> bool {
        let w = self.width();
        let h = self.height();
        !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }

    /// Shift the box by a constant offset.
    pub fn translate(&self, dlon: f64, dlat: f64) -> Self {
        Self::new(
            self.min_lon + dlon,
            self.min_lat + dlat,
            self.max_lon + dlon,
            self.max_lat + dlat,
        )
    }

    /// Affine transform for a `cols` x `rows` grid covering this box.
    pub fn transform(&self, cols: usize, rows: usize) -> GeoTransform {
        GeoTransform::from_bounds(self.min_lon, self.min_lat, self.max_lon, self.max_lat, cols, rows)
    }

    /// Recover the box covered by a grid with the given transform.
    pub fn from_transform(transform: &GeoTransform, cols: usize, rows: usize) -> Self {
        let (min_x, min_y, max_x, max_y) = transform.bounds(cols, rows);
        Self::new(min_x, min_y, max_x, max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_slice() {
        let bbox = BoundingBox::from_slice(&[17.0, 51.0, 17.1, 51.2]).unwrap();
        assert_relative_eq!(bbox.width(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(bbox.height(), 0.2, epsilon = 1e-12);
        assert!(BoundingBox::from_slice(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_degenerate() {
        assert!(BoundingBox::new(1.0, 1.0, 1.0, 2.0).is_degenerate());
        assert!(BoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_transform_roundtrip() {
        let bbox = BoundingBox::new(18.5, 50.0, 19.0, 50.5);
        let gt = bbox.transform(100, 50);
        let back = BoundingBox::from_transform(&gt, 100, 50);
        assert_relative_eq!(back.min_lon, 18.5, epsilon = 1e-12);
        assert_relative_eq!(back.max_lat, 50.5, epsilon = 1e-12);
        assert_relative_eq!(back.max_lon, 19.0, epsilon = 1e-12);
        assert_relative_eq!(back.min_lat, 50.0, epsilon = 1e-12);
    }
}
