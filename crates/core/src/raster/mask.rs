//! Boolean raster used for water and flood masks

use ndarray::{Array2, Zip};

use crate::error::{Error, Result};
use crate::raster::{BoundingBox, GeoTransform, Raster, RasterElement};

/// A georeferenced boolean grid; `true` marks water or flooded cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Array2<bool>,
    transform: GeoTransform,
}

impl Mask {
    /// All-false mask of the given size
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), false))
    }

    pub fn from_array(data: Array2<bool>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
        }
    }

    /// Create a mask from row-major data
    pub fn from_vec(data: Vec<bool>, rows: usize, cols: usize) -> Result<Self> {
        let array = Array2::from_shape_vec((rows, cols), data).map_err(|_| Error::InvalidDimensions {
            width: cols,
            height: rows,
        })?;
        Ok(Self::from_array(array))
    }

    /// All-false mask with the shape and georeferencing of `raster`.
    pub fn like<T: RasterElement>(raster: &Raster<T>) -> Self {
        Self {
            data: Array2::from_elem(raster.shape(), false),
            transform: *raster.transform(),
        }
    }

    /// Georeference the mask over `bbox` (builder style).
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.transform = bbox.transform(self.cols(), self.rows());
        self
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the mask has zero cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<bool> {
        self.data.get((row, col)).copied().ok_or(Error::IndexOutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: bool) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    /// Mark every cell of the half-open window `rows x cols` as `true`.
    pub fn fill_rect(&mut self, rows: std::ops::Range<usize>, cols: std::ops::Range<usize>) {
        for r in rows.start..rows.end.min(self.rows()) {
            for c in cols.start..cols.end.min(self.cols()) {
                self.data[(r, c)] = true;
            }
        }
    }

    pub fn data(&self) -> &Array2<bool> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<bool> {
        &mut self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::from_transform(&self.transform, self.cols(), self.rows())
    }

    /// Number of `true` cells
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Whether at least one cell is set
    pub fn any(&self) -> bool {
        self.data.iter().any(|&v| v)
    }

    /// `(row, col)` of every set cell in row-major order
    pub fn iter_set(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.data
            .indexed_iter()
            .filter_map(|(idx, &v)| if v { Some(idx) } else { None })
    }

    fn ensure_same_shape(&self, other: &Mask) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::size_mismatch(self.shape(), other.shape()));
        }
        Ok(())
    }

    fn zip_with(&self, other: &Mask, f: impl Fn(bool, bool) -> bool) -> Result<Mask> {
        self.ensure_same_shape(other)?;
        let mut data = Array2::from_elem(self.shape(), false);
        Zip::from(&mut data)
            .and(&self.data)
            .and(&other.data)
            .for_each(|out, &a, &b| *out = f(a, b));
        Ok(Mask {
            data,
            transform: self.transform,
        })
    }

    /// Cells set in either mask
    pub fn union(&self, other: &Mask) -> Result<Mask> {
        self.zip_with(other, |a, b| a || b)
    }

    /// Cells set in both masks
    pub fn intersection(&self, other: &Mask) -> Result<Mask> {
        self.zip_with(other, |a, b| a && b)
    }

    /// Cells set here but not in `other`
    pub fn and_not(&self, other: &Mask) -> Result<Mask> {
        self.zip_with(other, |a, b| a && !b)
    }

    /// True when every cell set in `other` is also set here.
    pub fn contains_mask(&self, other: &Mask) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| a || !b)
    }

    /// 0/1 raster for GeoTIFF export
    pub fn to_raster(&self) -> Raster<u8> {
        let mut raster = Raster::from_array(self.data.mapv(u8::from));
        raster.set_transform(self.transform);
        raster
    }
}
