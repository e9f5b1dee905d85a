//! Building × flood mask join
//!
//! A building is flooded when the mask pixel containing its coordinate is
//! set. Pixels are addressed from the bbox directly:
//! `col = floor((lon - min_lon) / width * cols)`,
//! `row = floor((max_lat - lat) / height * rows)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::building::Building;
use floodsar_core::{BoundingBox, Mask};

/// `(row, col)` of the pixel holding `(lon, lat)`, or `None` when the point
/// is outside the grid, non-finite, or the bbox is degenerate.
pub fn pixel_index(lon: f64, lat: f64, bbox: &BoundingBox, rows: usize, cols: usize) -> Option<(usize, usize)> {
    if bbox.is_degenerate() || !lon.is_finite() || !lat.is_finite() {
        return None;
    }
    let col = ((lon - bbox.min_lon) / bbox.width() * cols as f64).floor();
    let row = ((bbox.max_lat - lat) / bbox.height() * rows as f64).floor();
    if col < 0.0 || row < 0.0 || col >= cols as f64 || row >= rows as f64 {
        return None;
    }
    Some((row as usize, col as usize))
}

fn is_flooded(building: &Building, mask: &Mask, bbox: &BoundingBox) -> bool {
    pixel_index(building.lon, building.lat, bbox, mask.rows(), mask.cols())
        .map(|(r, c)| mask.data()[(r, c)])
        .unwrap_or(false)
}

fn flag(building: &Building) -> Building {
    let mut b = building.clone();
    b.flooded = true;
    b.flood_probability = 1.0;
    b
}

/// Flooded buildings only, in input order; the bbox is the mask's own.
pub fn join_buildings(buildings: &[Building], mask: &Mask) -> Vec<Building> {
    join_buildings_with_bbox(buildings, mask, &mask.bbox())
}

/// Flooded buildings only, with the mask georeferenced over `bbox`.
///
/// Duplicated input records stay duplicated.
pub fn join_buildings_with_bbox(buildings: &[Building], mask: &Mask, bbox: &BoundingBox) -> Vec<Building> {
    let flooded: Vec<Building> = buildings
        .iter()
        .filter(|b| is_flooded(b, mask, bbox))
        .map(flag)
        .collect();
    debug!(total = buildings.len(), flooded = flooded.len(), "building join");
    flooded
}

/// Every building, with `flooded` set from the mask.
///
/// Flooded buildings get probability 1.0; the rest keep their own.
pub fn annotate_buildings(buildings: &[Building], mask: &Mask) -> Vec<Building> {
    let bbox = mask.bbox();
    buildings
        .iter()
        .map(|b| {
            if is_flooded(b, mask, &bbox) {
                flag(b)
            } else {
                let mut b = b.clone();
                b.flooded = false;
                b
            }
        })
        .collect()
}

/// Exposure counts over annotated buildings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub total_buildings: usize,
    pub flooded_buildings: usize,
    /// Flooded count per `building_type`
    pub flooded_by_type: BTreeMap<String, usize>,
}

impl ImpactSummary {
    pub fn from_buildings(buildings: &[Building]) -> Self {
        let mut summary = ImpactSummary {
            total_buildings: buildings.len(),
            ..Default::default()
        };
        for b in buildings.iter().filter(|b| b.flooded) {
            summary.flooded_buildings += 1;
            *summary.flooded_by_type.entry(b.building_type.clone()).or_insert(0) += 1;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask() -> Mask {
        // 10x10 over [0,0,1,1], block rows 2..4, cols 5..8
        let mut m = Mask::new(10, 10).with_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        m.fill_rect(2..4, 5..8);
        m
    }

    #[test]
    fn test_pixel_index() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(pixel_index(0.55, 0.75, &bbox, 10, 10), Some((2, 5)));
        assert_eq!(pixel_index(0.0, 1.0, &bbox, 10, 10), Some((0, 0)));
        assert_eq!(pixel_index(1.0, 0.5, &bbox, 10, 10), None);
        assert_eq!(pixel_index(-0.01, 0.5, &bbox, 10, 10), None);
        assert_eq!(pixel_index(f64::NAN, 0.5, &bbox, 10, 10), None);
        let flat = BoundingBox::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(pixel_index(0.0, 0.5, &flat, 10, 10), None);
    }

    #[test]
    fn test_join_flags_and_keeps_duplicates() {
        let inside = Building::new(1, "school", 0.75, 0.55);
        let outside = Building::new(2, "yes", 0.15, 0.15);
        let off_grid = Building::new(3, "yes", 5.0, 5.0);

        let flooded = join_buildings(&[inside.clone(), outside, off_grid, inside], &mask());
        assert_eq!(flooded.len(), 2);
        assert!(flooded.iter().all(|b| b.flooded && b.flood_probability == 1.0));
        assert_eq!(flooded[0].id, 1);
    }

    #[test]
    fn test_annotate_and_summary() {
        let buildings = vec![
            Building::new(1, "school", 0.75, 0.55),
            Building::new(2, "hospital", 0.75, 0.65),
            Building::new(3, "yes", 0.15, 0.15),
        ];
        let annotated = annotate_buildings(&buildings, &mask());
        assert_eq!(annotated.len(), 3);
        assert!(!annotated[2].flooded);

        let summary = ImpactSummary::from_buildings(&annotated);
        assert_eq!(summary.total_buildings, 3);
        assert_eq!(summary.flooded_buildings, 2);
        assert_eq!(summary.flooded_by_type.get("hospital"), Some(&1));
    }

    #[test]
    fn test_explicit_bbox() {
        let m = mask();
        let shifted = BoundingBox::new(10.0, 20.0, 11.0, 21.0);
        let b = Building::new(1, "yes", 20.75, 10.55);
        assert_eq!(join_buildings_with_bbox(&[b.clone()], &m, &shifted).len(), 1);
        assert!(join_buildings(&[b], &m).is_empty());
    }
}
