//! Cost coefficients, shared between the objective builder and the
//! solution extractor.
//!
//! Flow-valued variables (production, shipments, consumption, shortage,
//! disposal) are modeled in thousands of units to condition the LP, so
//! their cost coefficients carry the same factor. Count-valued variables
//! (labor hours, pallet integers, binaries) stay in natural units. Keeping
//! both sides of the scaling in one module is what makes the reported cost
//! breakdown match the objective term for term.

use bnp_core::{params, CostStructure, StorageState};

/// Flow variables are modeled in thousands of units.
pub const FLOW_SCALE: f64 = 1000.0;

/// Objective coefficient per scaled production unit.
pub fn production_coeff(costs: &CostStructure) -> f64 {
    costs.production_cost_per_unit * FLOW_SCALE
}

/// Objective coefficient per scaled shipped unit on a leg.
pub fn transport_coeff(cost_per_unit: f64) -> f64 {
    cost_per_unit * FLOW_SCALE
}

/// Objective coefficient per scaled shortage unit.
pub fn shortage_coeff(costs: &CostStructure) -> f64 {
    costs.shortage_penalty_per_unit * FLOW_SCALE
}

/// Objective coefficient per scaled disposed unit.
pub fn disposal_coeff(costs: &CostStructure) -> f64 {
    costs.disposal_penalty_per_unit * FLOW_SCALE
}

/// Holding cost per pallet per day for a storage state.
pub fn holding_rate_per_pallet_day(costs: &CostStructure, state: StorageState) -> f64 {
    match state {
        StorageState::Frozen => costs.holding_cost_per_pallet_day_frozen,
        StorageState::Ambient | StorageState::Thawed => costs.holding_cost_per_pallet_day_ambient,
    }
}

/// Holding cost per scaled inventory unit per day, for the linear
/// (pallet-tracking-off) formulation.
pub fn holding_coeff_linear(costs: &CostStructure, state: StorageState) -> f64 {
    holding_rate_per_pallet_day(costs, state) / params::UNITS_PER_PALLET * FLOW_SCALE
}

/// Age ratio of a consumed cohort: calendar age over the shelf life of the
/// state it is consumed in. Frozen consumption does not occur (demand is
/// ambient-only), so no frozen arm is needed here.
pub fn age_ratio(state: StorageState, calendar_age_days: i64) -> f64 {
    debug_assert!(state.serves_demand());
    calendar_age_days.max(0) as f64 / state.shelf_life_days() as f64
}

/// Objective coefficient per scaled consumed unit: the soft
/// first-expired-first-out incentive.
pub fn freshness_coeff(weight: f64, state: StorageState, calendar_age_days: i64) -> f64 {
    weight * age_ratio(state, calendar_age_days) * FLOW_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs() -> CostStructure {
        CostStructure {
            production_cost_per_unit: 1.2,
            holding_cost_per_pallet_day_frozen: 0.8,
            holding_cost_per_pallet_day_ambient: 0.4,
            changeover_cost_per_start: 150.0,
            shortage_penalty_per_unit: 20.0,
            disposal_penalty_per_unit: 0.5,
            freshness_weight: 0.05,
        }
    }

    /// Every flow-valued coefficient carries exactly one factor of the flow
    /// scale: coefficient times a scaled value must equal the per-unit cost
    /// times the unscaled quantity. Guards against re-introducing the
    /// historical unscaled-waste-cost defect.
    #[test]
    fn test_flow_coefficients_carry_scale_exactly_once() {
        let c = costs();
        let units = 2_500.0;
        let scaled_value = units / FLOW_SCALE;

        assert!((production_coeff(&c) * scaled_value - 1.2 * units).abs() < 1e-9);
        assert!((transport_coeff(0.15) * scaled_value - 0.15 * units).abs() < 1e-9);
        assert!((shortage_coeff(&c) * scaled_value - 20.0 * units).abs() < 1e-9);
        assert!((disposal_coeff(&c) * scaled_value - 0.5 * units).abs() < 1e-9);
        assert!(
            (holding_coeff_linear(&c, StorageState::Ambient) * scaled_value
                - 0.4 / 320.0 * units)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_age_ratio_by_state() {
        assert!((age_ratio(StorageState::Ambient, 17) - 1.0).abs() < 1e-12);
        assert!((age_ratio(StorageState::Thawed, 7) - 0.5).abs() < 1e-12);
        assert_eq!(age_ratio(StorageState::Thawed, -3), 0.0);
    }

    #[test]
    fn test_holding_rate_is_state_specific() {
        let c = costs();
        assert_eq!(holding_rate_per_pallet_day(&c, StorageState::Frozen), 0.8);
        assert_eq!(holding_rate_per_pallet_day(&c, StorageState::Thawed), 0.4);
    }
}
