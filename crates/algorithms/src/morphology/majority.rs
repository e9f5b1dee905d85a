//! 3x3 majority (binary median) filter
//!
//! A cell is set when at least 5 of the 9 cells in its window are set.
//! Windows crossing the border replicate the edge row/column, so a flooded
//! area touching the image edge is not eaten away.

use ndarray::Array2;

use crate::maybe_rayon::*;
use floodsar_core::{Algorithm, Error, Mask, Result};

/// Majority filter algorithm
#[derive(Debug, Clone, Default)]
pub struct MajorityFilter;

impl Algorithm for MajorityFilter {
    type Input = Mask;
    type Output = Mask;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "MajorityFilter"
    }

    fn description(&self) -> &'static str {
        "3x3 binary majority filter for speckle removal"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        Ok(majority_filter(&input))
    }
}

/// Apply the 3x3 majority vote.
pub fn majority_filter(mask: &Mask) -> Mask {
    let (rows, cols) = mask.shape();
    if rows == 0 || cols == 0 {
        return mask.clone();
    }
    let src = mask.data();

    let data: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![false; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let mut votes = 0;
                for dr in -1isize..=1 {
                    let r = (row as isize + dr).clamp(0, rows as isize - 1) as usize;
                    for dc in -1isize..=1 {
                        let c = (col as isize + dc).clamp(0, cols as isize - 1) as usize;
                        if unsafe { *src.uget((r, c)) } {
                            votes += 1;
                        }
                    }
                }
                *out = votes >= 5;
            }
            row_data
        })
        .collect();

    // rows * cols elements by construction
    let mut out = Mask::from_array(Array2::from_shape_vec((rows, cols), data).unwrap_or_default());
    out.set_transform(*mask.transform());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_isolated_pixel() {
        let mut m = Mask::new(5, 5);
        m.set(2, 2, true).unwrap();
        assert!(!majority_filter(&m).any());
    }

    #[test]
    fn test_fills_pinhole() {
        let mut m = Mask::new(5, 5);
        m.fill_rect(0..5, 0..5);
        m.set(2, 2, false).unwrap();
        assert_eq!(majority_filter(&m).count(), 25);
    }

    #[test]
    fn test_keeps_block_touching_edge() {
        let mut m = Mask::new(6, 6);
        m.fill_rect(0..3, 0..6);
        let f = MajorityFilter.execute(m.clone(), ()).unwrap();
        assert_eq!(f, m);
    }

    #[test]
    fn test_trims_interior_corners() {
        let mut m = Mask::new(8, 8);
        m.fill_rect(2..6, 2..6);
        let f = majority_filter(&m);
        assert_eq!(f.count(), 12);
        assert!(!f.get(2, 2).unwrap());
    }

    #[test]
    fn test_empty_mask() {
        let m = Mask::new(0, 0);
        assert!(majority_filter(&m).is_empty());
    }
}
