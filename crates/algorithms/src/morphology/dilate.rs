//! Binary dilation
//!
//! A cell is set in the output when it or any neighbor under the chosen
//! connectivity is set in the input. Cells beyond the grid count as unset.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::maybe_rayon::*;
use floodsar_core::{Algorithm, Connectivity, Error, Mask, Result};

/// Parameters for binary dilation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DilateParams {
    /// Neighbor set of the structuring element
    pub connectivity: Connectivity,
}

/// Dilation algorithm
#[derive(Debug, Clone, Default)]
pub struct Dilate;

impl Algorithm for Dilate {
    type Input = Mask;
    type Output = Mask;
    type Params = DilateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Dilate"
    }

    fn description(&self) -> &'static str {
        "Binary dilation of a mask by one neighbor ring"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(binary_dilate(&input, params.connectivity))
    }
}

/// Dilate `mask` by one step.
pub fn binary_dilate(mask: &Mask, connectivity: Connectivity) -> Mask {
    let (rows, cols) = mask.shape();
    let src = mask.data();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                *out = unsafe { *src.uget((row, col)) }
                    || connectivity
                        .neighbors(row, col, rows, cols)
                        .any(|(r, c)| unsafe { *src.uget((r, c)) });
            }
            row_data
        })
        .collect();

    // rows * cols elements by construction
    let mut out = Mask::from_array(Array2::from_shape_vec((rows, cols), data).unwrap_or_default());
    out.set_transform(*mask.transform());
    out
}
