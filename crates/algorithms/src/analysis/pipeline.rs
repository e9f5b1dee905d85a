//! Flood analysis pipeline

use std::sync::Arc;

use tracing::info;

use super::config::AnalysisConfig;
use super::stats::FloodPixelStats;
use crate::classification::WaterClassifier;
use crate::hydrology::{estimate_depth, simulate_propagation, DepthResult, PropagationSimulator};
use crate::imagery::ChangeDetector;
use crate::impact::{annotate_buildings, Building, ImpactSummary};
use crate::vector::export_features;
use floodsar_core::vector::Properties;
use floodsar_core::{AttributeValue, FeatureCollection, Mask, Raster, Result};

/// Everything one analysis run produces
#[derive(Debug, Clone)]
pub struct FloodReport {
    /// Newly flooded pixels
    pub mask: Mask,
    /// Forecast extent, a superset of `mask`
    pub forecast: Mask,
    pub depth: DepthResult,
    pub stats: FloodPixelStats,
    /// Current flood polygons followed by forecast expansion polygons
    pub features: FeatureCollection,
}

impl FloodReport {
    /// Forecast cells that are not flooded yet
    pub fn expansion(&self) -> Result<Mask> {
        self.forecast.and_not(&self.mask)
    }
}

/// Before/after flood analysis with a shared classifier
#[derive(Debug, Clone)]
pub struct FloodAnalysis {
    detector: ChangeDetector,
    config: AnalysisConfig,
}

fn props(entries: &[(&str, AttributeValue)]) -> Properties {
    entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

impl FloodAnalysis {
    pub fn new(classifier: Arc<WaterClassifier>, config: AnalysisConfig) -> Self {
        Self {
            detector: ChangeDetector::new(classifier, config.change.clone()),
            config,
        }
    }

    /// Analysis with a fresh, unfitted classifier built from `config`.
    pub fn from_config(config: AnalysisConfig) -> Self {
        let classifier = Arc::new(WaterClassifier::new(config.classifier.clone()));
        Self::new(classifier, config)
    }

    pub fn classifier(&self) -> &Arc<WaterClassifier> {
        self.detector.classifier()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Detect, measure and forecast a flood.
    ///
    /// Without a DEM the terrain is flat, so depth is 0 and the forecast
    /// equals the detected mask. Features are georeferenced by `after`.
    ///
    /// # Errors
    /// [`floodsar_core::Error::SizeMismatch`] when the rasters differ in shape.
    pub fn run(&self, before: &Raster<f64>, after: &Raster<f64>, dem: Option<&Raster<f64>>) -> Result<FloodReport> {
        if let Some(dem) = dem {
            after.ensure_same_shape(dem)?;
        }
        let mask = self.detector.detect(before, after)?;

        let dem = match dem {
            Some(d) => d.finite_or_zero(),
            None => after.like(0.0),
        };
        let depth = estimate_depth(&mask, &dem, &self.config.depth)?;
        let forecast = simulate_propagation(&mask, &dem, &self.config.propagation)?;
        let expansion = forecast.and_not(&mask)?;

        let mut features = export_features(
            &mask,
            &props(&[
                ("status", "current".into()),
                ("type", "flood".into()),
                ("risk", "high".into()),
                ("flood_probability", 0.9.into()),
            ]),
        );
        features.extend(export_features(
            &expansion,
            &props(&[
                ("status", "forecast".into()),
                ("type", "warning".into()),
                ("risk", "medium".into()),
                ("flood_probability", 0.6.into()),
                ("note", PropagationSimulator::LIMITATION.into()),
            ]),
        ));

        let stats = FloodPixelStats::compute(
            &mask,
            &depth,
            self.config.pixel_area_km2,
            self.config.critical_depth_m,
        );
        info!(
            flooded_pixels = stats.flooded_pixels,
            forecast_pixels = forecast.count(),
            max_depth_m = stats.max_depth_m,
            features = features.len(),
            "flood analysis complete"
        );

        Ok(FloodReport {
            mask,
            forecast,
            depth,
            stats,
            features,
        })
    }

    /// Annotate `buildings` against the detected mask.
    pub fn impact(&self, report: &FloodReport, buildings: &[Building]) -> (Vec<Building>, ImpactSummary) {
        let annotated = annotate_buildings(buildings, &report.mask);
        let summary = ImpactSummary::from_buildings(&annotated);
        info!(
            total = summary.total_buildings,
            flooded = summary.flooded_buildings,
            "building impact"
        );
        (annotated, summary)
    }
}
