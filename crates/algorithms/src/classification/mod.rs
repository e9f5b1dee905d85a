//! Unsupervised classification of backscatter intensity
//!
//! - **K-means**: 1-D Lloyd iterations with deterministic quantile seeding
//! - **Water classifier**: standardized two-cluster split where the darker
//!   cluster is open water

mod kmeans;
mod water;

pub use kmeans::{kmeans_1d, KmeansFit, KmeansParams};
pub use water::{ClassifierState, WaterClassifier, WaterClassifierParams};
