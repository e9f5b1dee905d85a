//! SAR imagery change detection
//!
//! - **ChangeDetector**: newly flooded pixels between a before/after pair
//! - **Threshold detectors**: fixed dB cut and backscatter-drop masks

mod change_detection;

pub use change_detection::{
    backscatter_drop_mask, threshold_water_mask, ChangeDetector, ChangeDetectorParams,
    TrainingPolicy,
};
