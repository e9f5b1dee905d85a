//! Binary morphology on flood masks
//!
//! - **Dilation**: grow a mask by one neighbor ring
//! - **Majority**: 3x3 majority vote that removes speckle

mod dilate;
mod majority;

pub use dilate::{binary_dilate, Dilate, DilateParams};
pub use majority::{majority_filter, MajorityFilter};
