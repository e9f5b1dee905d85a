//! Affine geotransformation for rasters

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Converts between pixel coordinates (col, row) and geographic coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// Flood rasters are always north-up lon/lat grids, so there are no rotation
/// terms and `pixel_height` is negative (row 0 is the northern edge).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// Longitude of the upper-left corner
    pub origin_x: f64,
    /// Latitude of the upper-left corner
    pub origin_y: f64,
    /// Pixel width in degrees of longitude
    pub pixel_width: f64,
    /// Pixel height in degrees of latitude (negative for north-up)
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Create a new north-up GeoTransform
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Build the transform that stretches a `cols` x `rows` grid over the given bounds.
    ///
    /// The top-left pixel corner lands on `(min_x, max_y)` and the bottom-right
    /// corner on `(max_x, min_y)`. A zero-sized grid yields zero pixel sizes.
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64, cols: usize, rows: usize) -> Self {
        let pixel_width = if cols > 0 { (max_x - min_x) / cols as f64 } else { 0.0 };
        let pixel_height = if rows > 0 { -(max_y - min_y) / rows as f64 } else { 0.0 };
        Self::new(min_x, max_y, pixel_width, pixel_height)
    }

    /// Convert pixel coordinates to geographic coordinates
    ///
    /// Returns the coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + (col as f64 + 0.5) * self.pixel_width;
        let y = self.origin_y + (row as f64 + 0.5) * self.pixel_height;
        (x, y)
    }

    /// Convert pixel coordinates to geographic coordinates (top-left corner)
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        let x = self.origin_x + col as f64 * self.pixel_width;
        let y = self.origin_y + row as f64 * self.pixel_height;
        (x, y)
    }

    /// Get the cell size in degrees (assumes square pixels)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Calculate the bounding box for a raster of given dimensions
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(width, height);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_center_and_corner() {
        let gt = GeoTransform::new(17.0, 51.2, 0.001, -0.001);

        let (x, y) = gt.pixel_to_geo(5, 10);
        assert_relative_eq!(x, 17.0055, epsilon = 1e-12);
        assert_relative_eq!(y, 51.1895, epsilon = 1e-12);

        let (x, y) = gt.pixel_to_geo_corner(5, 10);
        assert_relative_eq!(x, 17.005, epsilon = 1e-12);
        assert_relative_eq!(y, 51.19, epsilon = 1e-12);
    }

    #[test]
    fn test_from_bounds_corners() {
        let gt = GeoTransform::from_bounds(18.5, 50.0, 19.0, 50.5, 500, 250);
        assert_relative_eq!(gt.origin_x, 18.5);
        assert_relative_eq!(gt.origin_y, 50.5);

        let (x, y) = gt.pixel_to_geo_corner(500, 250);
        assert_relative_eq!(x, 19.0, epsilon = 1e-12);
        assert_relative_eq!(y, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_from_bounds_empty_grid() {
        let gt = GeoTransform::from_bounds(1.0, 1.0, 2.0, 2.0, 0, 0);
        assert_eq!(gt.pixel_width, 0.0);
        assert_eq!(gt.pixel_height, 0.0);
    }
}
