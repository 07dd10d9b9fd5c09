//! Total-cost objective with the soft first-expired-first-out incentive.
//!
//! Every coefficient comes from [`crate::costing`], which the extractor
//! also uses to price the solved quantities back into dollars, so the
//! reported breakdown and the objective cannot drift apart. The freshness
//! term steers the solver toward older cohorts but is excluded from the
//! reported cost identity.

use crate::catalog::Catalog;
use crate::costing;
use crate::indices::IndexSet;
use crate::variables::{BuildOptions, DecisionVars, VarRegistry};
use bnp_core::PlanInputs;
use good_lp::Expression;

/// Build the minimization objective.
pub fn build_objective(
    catalog: &Catalog,
    inputs: &PlanInputs,
    index: &IndexSet,
    vars: &DecisionVars,
    registry: &VarRegistry,
    options: &BuildOptions,
) -> Expression {
    let costs = &inputs.costs;
    let freshness_weight = options.freshness_weight.unwrap_or(costs.freshness_weight);
    let mut objective = Expression::from(0.0);

    // Labor.
    for (&date, labor) in &vars.labor {
        let day = inputs
            .labor
            .day(date)
            .expect("production dates come from the labor calendar");
        if day.is_fixed_day {
            objective += day.regular_rate * registry.variable(labor.fixed_used);
            objective += day.overtime_rate * registry.variable(labor.overtime_used);
        } else {
            objective += day.non_fixed_rate * registry.variable(labor.paid);
        }
        // Changeover cost per product start.
        for (_, active) in &labor.product_active {
            objective += costs.changeover_cost_per_start * registry.variable(*active);
        }
    }

    // Production.
    let production_coeff = costing::production_coeff(costs);
    for &var in &vars.production {
        objective += production_coeff * registry.variable(var);
    }

    // Transport, per leg.
    for (i, spec) in index.shipments.iter().enumerate() {
        let coeff = costing::transport_coeff(catalog.leg(spec.leg).cost_per_unit);
        objective += coeff * registry.variable(vars.shipments[i]);
    }

    // Holding: integer pallets when tracked, per-unit otherwise.
    if let Some(pallet_vars) = &vars.storage_pallets {
        for (group, key) in index.pallet_groups.iter().enumerate() {
            let rate = costing::holding_rate_per_pallet_day(costs, key.state);
            objective += rate * registry.variable(pallet_vars[group]);
        }
    } else {
        for (idx, key) in index.cohorts.iter().enumerate() {
            let coeff = costing::holding_coeff_linear(costs, key.state);
            objective += coeff * registry.variable(vars.inventory[idx]);
        }
    }

    // Shortage and disposal penalties.
    let shortage_coeff = costing::shortage_coeff(costs);
    for short in vars.shortage.iter().flatten() {
        objective += shortage_coeff * registry.variable(*short);
    }
    let disposal_coeff = costing::disposal_coeff(costs);
    if disposal_coeff != 0.0 {
        for &var in &vars.disposal {
            objective += disposal_coeff * registry.variable(var);
        }
    }

    // Freshness incentive on consumption.
    if freshness_weight != 0.0 {
        for (&cohort_idx, &cons) in &vars.consumption {
            let key = &index.cohorts[cohort_idx];
            let coeff = costing::freshness_coeff(freshness_weight, key.state, key.calendar_age());
            // Older cohorts carry a LOWER cost so the solver prefers them:
            // weight * (1 - age_ratio) prices remaining freshness.
            let remaining = freshness_weight * costing::FLOW_SCALE - coeff;
            objective += remaining * registry.variable(cons);
        }
    }

    objective
}
