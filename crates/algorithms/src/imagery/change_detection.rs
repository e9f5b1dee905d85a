//! Flood change detection between two SAR acquisitions
//!
//! A pixel is newly flooded when the classifier sees water after the event
//! but not before, and the post-event backscatter is below an absolute dB
//! gate. A 3x3 majority filter then removes isolated speckle.

use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classification::WaterClassifier;
use crate::maybe_rayon::*;
use crate::morphology::majority_filter;
use floodsar_core::{Error, Mask, Raster, Result};

/// When the shared classifier is (re)trained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPolicy {
    /// Train on the first request only, then reuse the fitted state
    Pretrained,
    /// Retrain on every image pair
    #[default]
    PerRequest,
}

/// Parameters for flood change detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeDetectorParams {
    /// Post-event backscatter must be below this to count as water (default: -15 dB)
    pub water_threshold_db: f64,
    /// Apply the 3x3 majority filter (default: true)
    pub denoise: bool,
    /// Classifier training policy (default: per request)
    pub training: TrainingPolicy,
}

impl Default for ChangeDetectorParams {
    fn default() -> Self {
        Self {
            water_threshold_db: -15.0,
            denoise: true,
            training: TrainingPolicy::PerRequest,
        }
    }
}

/// Before/after flood detector bound to one shared water classifier.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    classifier: Arc<WaterClassifier>,
    params: ChangeDetectorParams,
}

impl ChangeDetector {
    pub fn new(classifier: Arc<WaterClassifier>, params: ChangeDetectorParams) -> Self {
        Self { classifier, params }
    }

    pub fn classifier(&self) -> &Arc<WaterClassifier> {
        &self.classifier
    }

    pub fn params(&self) -> &ChangeDetectorParams {
        &self.params
    }

    /// Newly flooded mask, shaped and georeferenced like `after`.
    ///
    /// # Errors
    /// [`Error::SizeMismatch`] when the two rasters differ in shape.
    pub fn detect(&self, before: &Raster<f64>, after: &Raster<f64>) -> Result<Mask> {
        after.ensure_same_shape(before)?;
        if after.is_empty() {
            return Ok(Mask::like(after));
        }

        let before = before.finite_or_zero();
        let after = after.finite_or_zero();

        // both images are classified with one state, even if another
        // detection refits the shared classifier meanwhile
        let state = match self.params.training {
            TrainingPolicy::PerRequest => self.classifier.refit(&[&after, &before])?,
            TrainingPolicy::Pretrained => {
                self.classifier.fit(&[&after, &before])?;
                self.classifier.state().ok_or(Error::ClassifierNotFitted)?
            }
        };

        let water_after = state.classify(&after)?;
        let water_before = state.classify(&before)?;

        let (rows, cols) = after.shape();
        let gate = self.params.water_threshold_db;
        let data: Vec<bool> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = Vec::with_capacity(cols);
                for col in 0..cols {
                    let wet = water_after.data()[(row, col)] && !water_before.data()[(row, col)];
                    let dark = unsafe { after.get_unchecked(row, col) } < gate;
                    row_data.push(wet && dark);
                }
                row_data
            })
            .collect();

        let mut mask = mask_from(data, rows, cols, &after)?;
        let raw = mask.count();
        if self.params.denoise {
            mask = majority_filter(&mask);
        }

        info!(
            raw_pixels = raw,
            flooded_pixels = mask.count(),
            total_pixels = mask.len(),
            "flood change detection complete"
        );
        Ok(mask)
    }
}

fn mask_from(data: Vec<bool>, rows: usize, cols: usize, like: &Raster<f64>) -> Result<Mask> {
    let array = Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut mask = Mask::from_array(array);
    mask.set_transform(*like.transform());
    Ok(mask)
}

/// Pixels darker than a fixed dB threshold; non-finite cells are dry.
pub fn threshold_water_mask(raster: &Raster<f64>, threshold_db: f64) -> Result<Mask> {
    let (rows, cols) = raster.shape();
    let data: Vec<bool> = raster
        .data()
        .iter()
        .map(|&v| v.is_finite() && v < threshold_db)
        .collect();
    let mask = mask_from(data, rows, cols, raster)?;
    debug!(threshold_db, water_pixels = mask.count(), "threshold water mask");
    Ok(mask)
}

/// Pixels whose backscatter changed by less than `drop_db` (typically -5 dB).
///
/// `after - before < drop_db`; cells non-finite in either image are excluded.
pub fn backscatter_drop_mask(before: &Raster<f64>, after: &Raster<f64>, drop_db: f64) -> Result<Mask> {
    after.ensure_same_shape(before)?;
    let (rows, cols) = after.shape();
    let data: Vec<bool> = after
        .data()
        .iter()
        .zip(before.data().iter())
        .map(|(&a, &b)| a.is_finite() && b.is_finite() && a - b < drop_db)
        .collect();
    mask_from(data, rows, cols, after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodsar_core::BoundingBox;

    fn scene(rows: usize, cols: usize, water: &[(std::ops::Range<usize>, std::ops::Range<usize>)]) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, -8.0).with_bbox(BoundingBox::new(17.0, 51.0, 17.2, 51.2));
        for (rr, cc) in water {
            for row in rr.clone() {
                for col in cc.clone() {
                    r.set(row, col, -22.0).unwrap();
                }
            }
        }
        r
    }

    fn detector() -> ChangeDetector {
        ChangeDetector::new(Arc::new(WaterClassifier::default()), ChangeDetectorParams::default())
    }

    #[test]
    fn test_new_water_detected() {
        // River in both images, flood block only after
        let before = scene(20, 20, &[(0..20, 0..3)]);
        let after = scene(20, 20, &[(0..20, 0..3), (5..12, 8..16)]);

        let mask = detector().detect(&before, &after).unwrap();
        // majority filter trims the four block corners
        assert_eq!(mask.count(), 7 * 8 - 4);
        assert!(mask.get(8, 10).unwrap());
        assert!(!mask.get(8, 1).unwrap(), "permanent water is not flooding");
        assert_eq!(mask.bbox(), after.bbox());
    }

    #[test]
    fn test_identical_images_give_empty_mask() {
        let img = scene(16, 16, &[(4..10, 4..10)]);
        let mask = detector().detect(&img, &img).unwrap();
        assert!(!mask.any());
    }

    #[test]
    fn test_isolated_pixel_removed_by_denoise() {
        let before = scene(10, 10, &[(0..10, 0..2)]);
        let after = scene(10, 10, &[(0..10, 0..2), (5..6, 6..7)]);
        let mask = detector().detect(&before, &after).unwrap();
        assert!(!mask.get(5, 6).unwrap());

        let raw = ChangeDetector::new(
            Arc::new(WaterClassifier::default()),
            ChangeDetectorParams { denoise: false, ..Default::default() },
        );
        assert!(raw.detect(&before, &after).unwrap().get(5, 6).unwrap());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = scene(10, 10, &[]);
        let b = scene(10, 12, &[]);
        assert!(matches!(detector().detect(&a, &b), Err(Error::SizeMismatch { .. })));
    }

    #[test]
    fn test_empty_rasters() {
        let a: Raster<f64> = Raster::new(0, 0);
        let mask = detector().detect(&a, &a).unwrap();
        assert!(mask.is_empty());
    }

    #[test]
    fn test_pretrained_policy_keeps_state() {
        let clf = Arc::new(WaterClassifier::default());
        let det = ChangeDetector::new(
            clf.clone(),
            ChangeDetectorParams { training: TrainingPolicy::Pretrained, ..Default::default() },
        );
        let before = scene(12, 12, &[(0..12, 0..2)]);
        let after = scene(12, 12, &[(0..12, 0..2), (3..9, 4..10)]);
        det.detect(&before, &after).unwrap();
        let state = clf.state();

        let other = scene(12, 12, &[(0..12, 0..6)]);
        det.detect(&before, &other).unwrap();
        assert_eq!(clf.state(), state);
    }

    #[test]
    fn test_concurrent_detections_keep_their_own_statistics() {
        fn pair(water: f64, land: f64) -> (Raster<f64>, Raster<f64>) {
            let before = Raster::filled(64, 64, land);
            let mut after = before.clone();
            for row in 0..16 {
                for col in 0..64 {
                    after.set(row, col, water).unwrap();
                }
            }
            (before, after)
        }

        let det = detector();
        let (before_a, after_a) = pair(-22.0, -8.0);
        let (before_b, after_b) = pair(-45.0, -30.0);
        let expected_a = det.detect(&before_a, &after_a).unwrap();
        let expected_b = det.detect(&before_b, &after_b).unwrap();
        assert_eq!(expected_a.count(), 1024);
        assert_eq!(expected_b.count(), 1024);

        let mismatches = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|s| {
            for (before, after, expected) in [
                (&before_a, &after_a, &expected_a),
                (&before_b, &after_b, &expected_b),
            ] {
                let det = &det;
                let mismatches = &mismatches;
                s.spawn(move || {
                    for _ in 0..150 {
                        if det.detect(before, after).unwrap() != *expected {
                            mismatches.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });
        assert_eq!(mismatches.into_inner(), 0);
    }

    #[test]
    fn test_threshold_and_drop_masks() {
        let before = scene(4, 4, &[]);
        let mut after = scene(4, 4, &[(0..1, 0..4)]);
        after.set(3, 3, f64::NAN).unwrap();

        assert_eq!(threshold_water_mask(&after, -15.0).unwrap().count(), 4);
        let drop = backscatter_drop_mask(&before, &after, -5.0).unwrap();
        assert_eq!(drop.count(), 4);
        assert!(!drop.get(3, 3).unwrap());
    }
}
