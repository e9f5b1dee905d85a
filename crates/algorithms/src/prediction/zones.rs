//! Concentric risk zones around the centre of an area

use geo_types::{polygon, Geometry};

use super::nowcast::RiskLevel;
use floodsar_core::{BoundingBox, Feature, FeatureCollection};

/// Three rectangles centred on `bbox`, at 30%, 60% and 100% of its extent,
/// with probabilities `p`, `0.8p` and `0.5p`. Inner zones come first.
pub fn risk_zones(bbox: &BoundingBox, probability: f64) -> FeatureCollection {
    let p = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
    let (cx, cy) = bbox.center();

    let zones = [
        ("inner", 0.3, if p > 0.6 { RiskLevel::Critical } else { RiskLevel::High }, p),
        ("middle", 0.6, if p > 0.5 { RiskLevel::High } else { RiskLevel::Moderate }, p * 0.8),
        ("outer", 1.0, if p > 0.4 { RiskLevel::Moderate } else { RiskLevel::Low }, p * 0.5),
    ];

    let mut fc = FeatureCollection::new();
    for (zone, size, level, zone_p) in zones {
        let w = bbox.width() * size / 2.0;
        let h = bbox.height() * size / 2.0;
        let rect = polygon![
            (x: cx - w, y: cy - h),
            (x: cx + w, y: cy - h),
            (x: cx + w, y: cy + h),
            (x: cx - w, y: cy + h),
            (x: cx - w, y: cy - h),
        ];
        let mut feature = Feature::new(Geometry::Polygon(rect));
        feature.set_property("zone", zone);
        feature.set_property("risk_level", level.as_str());
        feature.set_property("flood_probability", zone_p);
        fc.push(feature);
    }
    fc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{Area, Contains};

    #[test]
    fn test_zones_are_nested() {
        let bbox = BoundingBox::new(17.0, 51.0, 17.2, 51.1);
        let fc = risk_zones(&bbox, 0.7);
        assert_eq!(fc.len(), 3);

        let polys: Vec<_> = fc
            .iter()
            .map(|f| match &f.geometry {
                Some(Geometry::Polygon(p)) => p.clone(),
                _ => panic!("zone is not a polygon"),
            })
            .collect();
        assert!(polys[1].contains(&polys[0]));
        assert!(polys[2].contains(&polys[1]));
        assert_relative_eq!(polys[2].unsigned_area(), 0.2 * 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_zone_labels_follow_probability() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let high = risk_zones(&bbox, 0.7);
        let labels: Vec<_> = high
            .iter()
            .map(|f| f.get_property("risk_level").and_then(|v| v.as_str()).unwrap_or_default().to_string())
            .collect();
        assert_eq!(labels, vec!["critical", "high", "moderate"]);

        let low = risk_zones(&bbox, 0.2);
        let outer_p = low.features[2].get_property("flood_probability").and_then(|v| v.as_f64());
        assert_eq!(outer_p, Some(0.1));
        assert_eq!(low.features[2].get_property("risk_level").and_then(|v| v.as_str()), Some("low"));
    }
}
