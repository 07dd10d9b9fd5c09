//! The priced cost structure.

use serde::{Deserialize, Serialize};

/// All unit costs and penalty rates used by the objective.
///
/// Transport cost lives on the route legs; everything else is here. Holding
/// cost is per pallet per day and state-specific (frozen storage is charged
/// differently from ambient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostStructure {
    pub production_cost_per_unit: f64,
    pub holding_cost_per_pallet_day_frozen: f64,
    pub holding_cost_per_pallet_day_ambient: f64,
    pub changeover_cost_per_start: f64,
    pub shortage_penalty_per_unit: f64,
    /// Penalty for discarding stranded stock; may be zero.
    #[serde(default)]
    pub disposal_penalty_per_unit: f64,
    /// Weight of the soft first-expired-first-out incentive, dollars per
    /// unit per age ratio.
    #[serde(default = "CostStructure::default_freshness_weight")]
    pub freshness_weight: f64,
}

impl CostStructure {
    fn default_freshness_weight() -> f64 {
        0.05
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_on_parse() {
        let parsed: CostStructure = serde_json::from_str(
            r#"{
                "production_cost_per_unit": 1.2,
                "holding_cost_per_pallet_day_frozen": 0.8,
                "holding_cost_per_pallet_day_ambient": 0.4,
                "changeover_cost_per_start": 150.0,
                "shortage_penalty_per_unit": 20.0
            }"#,
        )
        .unwrap();

        assert_eq!(parsed.disposal_penalty_per_unit, 0.0);
        assert_eq!(parsed.freshness_weight, 0.05);
    }
}
