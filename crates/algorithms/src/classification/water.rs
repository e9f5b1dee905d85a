//! Unsupervised open-water classifier for SAR backscatter
//!
//! Water is a specular reflector and shows up as the darkest population in
//! a dB image. The classifier standardizes a bounded subsample of pixels,
//! splits it into two clusters and labels the lower-centered cluster as
//! water. Fitted state is shared behind a lock so one instance can serve
//! concurrent requests.

use std::path::Path;
use std::sync::{PoisonError, RwLock};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classification::kmeans::{kmeans_1d, KmeansParams};
use crate::maybe_rayon::*;
use floodsar_core::{Error, Mask, Raster, Result};

/// Parameters for the water classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterClassifierParams {
    /// Upper bound on pixels used for one fit (default: 100 000)
    pub max_samples: usize,
    /// K-means iteration cap (default: 300)
    pub max_iterations: usize,
    /// K-means convergence threshold in standardized units (default: 1e-4)
    pub convergence: f64,
}

impl Default for WaterClassifierParams {
    fn default() -> Self {
        Self {
            max_samples: 100_000,
            max_iterations: 300,
            convergence: 1e-4,
        }
    }
}

/// Fitted classifier: two centers in standardized units plus the scaler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierState {
    pub centers: [f64; 2],
    pub mean: f64,
    pub std: f64,
}

impl ClassifierState {
    /// Index of the water cluster (the lower center).
    pub fn water_cluster(&self) -> usize {
        if self.centers[0] <= self.centers[1] {
            0
        } else {
            1
        }
    }

    /// Water center back in dB.
    pub fn water_center_db(&self) -> f64 {
        self.centers[self.water_cluster()] * self.std + self.mean
    }

    /// Classify one backscatter value; non-finite values count as 0 dB.
    pub fn is_water(&self, value: f64) -> bool {
        let v = if value.is_finite() { value } else { 0.0 };
        let z = (v - self.mean) / self.std;
        let d0 = (z - self.centers[0]).abs();
        let d1 = (z - self.centers[1]).abs();
        let cluster = if d1 < d0 { 1 } else { 0 };
        cluster == self.water_cluster()
    }

    /// Per-pixel water mask with the raster's shape and georeferencing.
    pub fn classify(&self, raster: &Raster<f64>) -> Result<Mask> {
        let (rows, cols) = raster.shape();

        let data: Vec<bool> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = Vec::with_capacity(cols);
                for col in 0..cols {
                    let v = unsafe { raster.get_unchecked(row, col) };
                    row_data.push(self.is_water(v));
                }
                row_data
            })
            .collect();

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        let mut mask = Mask::from_array(array);
        mask.set_transform(*raster.transform());
        Ok(mask)
    }

    fn validate(&self) -> Result<()> {
        let finite = self.centers.iter().all(|c| c.is_finite()) && self.mean.is_finite();
        if !finite || !(self.std.is_finite() && self.std > 0.0) {
            return Err(Error::InvalidParameter {
                name: "classifier_state",
                value: format!("{:?}", self),
                reason: "centers and mean must be finite and std positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Two-cluster water/non-water classifier.
///
/// `fit` trains once and is a no-op afterwards; `refit` always retrains.
/// `classify` snapshots the fitted state, so a concurrent `refit` never
/// yields a half-updated model. Callers that classify several rasters with
/// one model take the state returned by `refit` (or [`Self::state`]) and
/// use [`ClassifierState::classify`] directly.
#[derive(Debug, Default)]
pub struct WaterClassifier {
    params: WaterClassifierParams,
    state: RwLock<Option<ClassifierState>>,
}

impl WaterClassifier {
    pub fn new(params: WaterClassifierParams) -> Self {
        Self {
            params,
            state: RwLock::new(None),
        }
    }

    /// Classifier restored from a previously fitted state.
    pub fn from_state(state: ClassifierState, params: WaterClassifierParams) -> Result<Self> {
        state.validate()?;
        Ok(Self {
            params,
            state: RwLock::new(Some(state)),
        })
    }

    pub fn params(&self) -> &WaterClassifierParams {
        &self.params
    }

    /// Snapshot of the fitted state, if any.
    pub fn state(&self) -> Option<ClassifierState> {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_fitted(&self) -> bool {
        self.state().is_some()
    }

    /// Train on `samples` unless already fitted.
    ///
    /// Returns `true` when this call trained the model. The check and the
    /// training happen under one write lock, so racing callers train once.
    pub fn fit(&self, samples: &[&Raster<f64>]) -> Result<bool> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            debug!("water classifier already fitted, skipping training");
            return Ok(false);
        }
        *guard = Some(self.train(samples)?);
        Ok(true)
    }

    /// Train on `samples`, replacing any previous state.
    ///
    /// Returns the state this call trained, which may already have been
    /// replaced in the shared slot by a concurrent `refit`.
    pub fn refit(&self, samples: &[&Raster<f64>]) -> Result<ClassifierState> {
        let state = self.train(samples)?;
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(state);
        Ok(state)
    }

    fn train(&self, samples: &[&Raster<f64>]) -> Result<ClassifierState> {
        if self.params.max_samples < 2 {
            return Err(Error::InvalidParameter {
                name: "max_samples",
                value: self.params.max_samples.to_string(),
                reason: "at least 2 samples are needed to fit two clusters".to_string(),
            });
        }

        let total: usize = samples.iter().map(|r| r.len()).sum();
        if total == 0 {
            return Err(Error::Algorithm("cannot fit water classifier on empty rasters".into()));
        }

        let pixels = samples
            .iter()
            .flat_map(|r| r.data().iter().copied())
            .map(|v| if v.is_finite() { v } else { 0.0 });
        let subset = subsample(pixels, total, self.params.max_samples);
        let n = subset.len() as f64;
        let mean = subset.iter().sum::<f64>() / n;
        let var = subset.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = if var.sqrt() > f64::EPSILON { var.sqrt() } else { 1.0 };

        let scaled: Vec<f64> = subset.iter().map(|v| (v - mean) / std).collect();
        let fit = kmeans_1d(
            &scaled,
            &KmeansParams {
                k: 2,
                max_iterations: self.params.max_iterations,
                convergence: self.params.convergence,
            },
        )?;

        let state = ClassifierState {
            centers: [fit.centroids[0], fit.centroids[1]],
            mean,
            std,
        };
        info!(
            samples = subset.len(),
            iterations = fit.iterations,
            water_center_db = state.water_center_db(),
            "water classifier fitted"
        );
        Ok(state)
    }

    /// Per-pixel water mask with the raster's shape and georeferencing.
    pub fn classify(&self, raster: &Raster<f64>) -> Result<Mask> {
        self.state().ok_or(Error::ClassifierNotFitted)?.classify(raster)
    }

    /// Fitted state as JSON; floats round-trip exactly.
    pub fn to_json(&self) -> Result<String> {
        let state = self.state().ok_or(Error::ClassifierNotFitted)?;
        Ok(serde_json::to_string_pretty(&state)?)
    }

    pub fn from_json(json: &str, params: WaterClassifierParams) -> Result<Self> {
        let state: ClassifierState = serde_json::from_str(json)?;
        Self::from_state(state, params)
    }

    /// Persist the fitted state.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        info!(path = %path.as_ref().display(), "water classifier saved");
        Ok(())
    }

    /// Restore a classifier saved with [`WaterClassifier::save`].
    pub fn load<P: AsRef<Path>>(path: P, params: WaterClassifierParams) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let classifier = Self::from_json(&json, params)?;
        info!(path = %path.as_ref().display(), "water classifier loaded");
        Ok(classifier)
    }
}

/// Evenly strided subsample of at most `max` values out of `len`.
///
/// Only the picked values are collected.
fn subsample<I: Iterator<Item = f64>>(values: I, len: usize, max: usize) -> Vec<f64> {
    if len <= max {
        return values.collect();
    }
    let step = len as f64 / max as f64;
    let mut out = Vec::with_capacity(max);
    let mut next = 0usize;
    for (i, v) in values.enumerate() {
        if i < next {
            continue;
        }
        out.push(v);
        if out.len() == max {
            break;
        }
        next = (out.len() as f64 * step) as usize;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Left half open water (-22 dB), right half land (-8 dB).
    fn half_water(rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, -8.0);
        for row in 0..rows {
            for col in 0..cols / 2 {
                r.set(row, col, -22.0).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_classify_before_fit_fails() {
        let clf = WaterClassifier::default();
        let r = half_water(4, 4);
        assert!(matches!(clf.classify(&r), Err(Error::ClassifierNotFitted)));
    }

    #[test]
    fn test_fit_and_classify() {
        let clf = WaterClassifier::default();
        let r = half_water(10, 10);
        assert!(clf.fit(&[&r]).unwrap());

        let mask = clf.classify(&r).unwrap();
        assert_eq!(mask.count(), 50);
        assert!(mask.get(0, 0).unwrap());
        assert!(!mask.get(0, 9).unwrap());
        assert_relative_eq!(clf.state().unwrap().water_center_db(), -22.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_is_noop_once_fitted() {
        let clf = WaterClassifier::default();
        let r = half_water(10, 10);
        assert!(clf.fit(&[&r]).unwrap());
        let before = clf.state();

        let other = Raster::filled(5, 5, -30.0);
        assert!(!clf.fit(&[&other]).unwrap());
        assert_eq!(clf.state(), before);

        clf.refit(&[&other]).unwrap();
        assert_ne!(clf.state(), before);
    }

    #[test]
    fn test_nan_treated_as_zero() {
        let clf = WaterClassifier::default();
        let mut r = half_water(6, 6);
        r.set(0, 0, f64::NAN).unwrap();
        clf.fit(&[&r]).unwrap();
        let mask = clf.classify(&r).unwrap();
        assert!(!mask.get(0, 0).unwrap());
    }

    #[test]
    fn test_constant_raster_does_not_fail() {
        let clf = WaterClassifier::default();
        let r = Raster::filled(5, 5, -12.0);
        clf.fit(&[&r]).unwrap();
        let mask = clf.classify(&r).unwrap();
        assert_eq!(mask.shape(), (5, 5));
        assert_eq!(clf.state().unwrap().std, 1.0);
    }

    #[test]
    fn test_subsample_is_bounded() {
        let values = (0..1000).map(|v| v as f64);
        let s = subsample(values.clone(), 1000, 100);
        assert_eq!(s.len(), 100);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[1], 10.0);
        assert_eq!(s[99], 990.0);
        assert_eq!(subsample(values.take(10), 10, 100).len(), 10);

        let uneven = subsample((0..1000).map(|v| v as f64), 1000, 300);
        assert_eq!(uneven.len(), 300);
        assert!(uneven.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_persistence_roundtrip_is_exact() {
        let clf = WaterClassifier::default();
        let r = half_water(8, 8);
        clf.fit(&[&r]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        clf.save(&path).unwrap();

        let restored = WaterClassifier::load(&path, WaterClassifierParams::default()).unwrap();
        assert_eq!(restored.state(), clf.state());
        assert_eq!(restored.classify(&r).unwrap(), clf.classify(&r).unwrap());
    }

    #[test]
    fn test_fit_caps_samples_across_rasters() {
        let clf = WaterClassifier::new(WaterClassifierParams { max_samples: 64, ..Default::default() });
        let a = half_water(20, 20);
        let b = half_water(10, 10);
        clf.fit(&[&a, &b]).unwrap();
        let mask = clf.classify(&a).unwrap();
        assert_eq!(mask.count(), 200);
    }

    #[test]
    fn test_state_classifies_without_shared_slot() {
        let clf = WaterClassifier::default();
        let r = half_water(10, 10);
        let state = clf.refit(&[&r]).unwrap();

        clf.refit(&[&Raster::filled(5, 5, -30.0)]).unwrap();
        assert_eq!(state.classify(&r).unwrap().count(), 50);
    }

    #[test]
    fn test_invalid_state_rejected() {
        let state = ClassifierState {
            centers: [0.0, 1.0],
            mean: 0.0,
            std: 0.0,
        };
        assert!(WaterClassifier::from_state(state, WaterClassifierParams::default()).is_err());
    }
}
