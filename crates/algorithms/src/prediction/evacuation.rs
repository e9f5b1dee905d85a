//! Evacuation ranking of buildings under an area flood probability

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::nowcast::RiskLevel;
use crate::impact::Building;

/// Parameters for evacuation ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvacuationParams {
    /// Entries kept after sorting (default: 10)
    pub top_n: usize,
    /// Share of the horizon removed at probability 1 (default: 0.8)
    pub time_compression: f64,
}

impl Default for EvacuationParams {
    fn default() -> Self {
        Self {
            top_n: 10,
            time_compression: 0.8,
        }
    }
}

/// Urgency record for one building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationPriority {
    pub building: Building,
    pub risk_level: RiskLevel,
    /// `probability × type weight`, within `[0, 1]`
    pub evacuation_score: f64,
    pub hours_to_flood: f64,
    pub people_estimate: u32,
}

/// Rank `buildings` by evacuation urgency.
///
/// Sorting is stable, so equal scores keep input order; the list is cut to
/// `params.top_n`.
pub fn rank_evacuation(
    buildings: &[Building],
    probability: f64,
    horizon_hours: f64,
    params: &EvacuationParams,
) -> Vec<EvacuationPriority> {
    let p = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
    let horizon = if horizon_hours.is_finite() { horizon_hours.max(0.0) } else { 0.0 };
    let hours_to_flood = horizon * (1.0 - p * params.time_compression);

    let mut ranked: Vec<EvacuationPriority> = buildings
        .iter()
        .map(|b| {
            let kind = b.kind();
            let score = p * kind.evacuation_weight();
            let mut building = b.clone();
            building.set_flood_probability(p);
            EvacuationPriority {
                building,
                risk_level: RiskLevel::from_probability(score),
                evacuation_score: score,
                hours_to_flood,
                people_estimate: kind.people_estimate(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.evacuation_score.total_cmp(&a.evacuation_score));
    ranked.truncate(params.top_n);
    debug!(candidates = buildings.len(), ranked = ranked.len(), "evacuation ranking");
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hospital_outranks_industrial() {
        let buildings = vec![
            Building::new(1, "industrial", 51.0, 17.0),
            Building::new(2, "hospital", 51.0, 17.0),
        ];
        let ranked = rank_evacuation(&buildings, 0.8, 6.0, &EvacuationParams::default());

        assert_eq!(ranked[0].building.id, 2);
        assert!(ranked[0].evacuation_score > ranked[1].evacuation_score);
        assert_relative_eq!(ranked[0].evacuation_score, 0.8);
        assert_relative_eq!(ranked[1].evacuation_score, 0.24, epsilon = 1e-12);
        assert_eq!(ranked[0].risk_level, RiskLevel::Critical);
        assert_eq!(ranked[1].risk_level, RiskLevel::Low);
        assert_eq!(ranked[0].people_estimate, 400);
        assert_relative_eq!(ranked[0].hours_to_flood, 6.0 * (1.0 - 0.64), epsilon = 1e-12);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let buildings: Vec<Building> = (0..25).map(|i| Building::new(i, "residential", 51.0, 17.0)).collect();
        let ranked = rank_evacuation(&buildings, 0.5, 3.0, &EvacuationParams::default());
        assert_eq!(ranked.len(), 10);
        // stable: equal scores keep input order
        assert_eq!(ranked.iter().map(|r| r.building.id).collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_type_gets_mid_weight() {
        let buildings = vec![Building::new(1, "garage", 51.0, 17.0)];
        let ranked = rank_evacuation(&buildings, 1.0, 1.0, &EvacuationParams::default());
        assert_relative_eq!(ranked[0].evacuation_score, 0.5);
        assert_eq!(ranked[0].people_estimate, 50);
    }

    #[test]
    fn test_probability_is_clamped() {
        let buildings = vec![Building::new(1, "hospital", 51.0, 17.0)];
        let ranked = rank_evacuation(&buildings, 4.0, f64::NAN, &EvacuationParams::default());
        assert_relative_eq!(ranked[0].evacuation_score, 1.0);
        assert_relative_eq!(ranked[0].building.flood_probability, 1.0);
        assert_eq!(ranked[0].hours_to_flood, 0.0);
    }
}
