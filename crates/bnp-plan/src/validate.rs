//! Three-layer fail-fast validation at the core boundary.
//!
//! 1. **Schema**: quantities are finite and non-negative, totals are real
//!    numbers.
//! 2. **Structural**: keys carry well-formed elements (non-empty ids,
//!    ordered dates, truck ids that are genuine strings), and cross-field
//!    structure holds (every shipment has a truck assignment).
//! 3. **Semantic**: foreign keys resolve against the inputs, the cost
//!    identity holds, labor pays at least what it uses, truck loads fit.
//!
//! A solution that fails any layer is never returned and never written to
//! disk; these are programming errors in the generator or extractor.

use crate::schema::{OptimizationSolution, ShipmentKey};
use bnp_core::{params, PlanError, PlanInputs};
use thiserror::Error;

/// Validation failure, naming the offending field and values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolutionError {
    #[error("schema violation in {field}: {message}")]
    Schema { field: String, message: String },

    #[error("structural violation in {field}: {message}")]
    Structural { field: String, message: String },

    #[error("semantic violation in {field}: {message}")]
    Semantic { field: String, message: String },
}

impl SolutionError {
    fn schema(field: &str, message: impl Into<String>) -> Self {
        SolutionError::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    fn structural(field: &str, message: impl Into<String>) -> Self {
        SolutionError::Structural {
            field: field.into(),
            message: message.into(),
        }
    }

    fn semantic(field: &str, message: impl Into<String>) -> Self {
        SolutionError::Semantic {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<SolutionError> for PlanError {
    fn from(err: SolutionError) -> Self {
        PlanError::Solution(err.to_string())
    }
}

const QUANTITY_EPS: f64 = 1e-6;
const COST_REL_TOL: f64 = 1e-4;

/// Run all three layers. The semantic layer checks foreign keys only when
/// the inputs are provided (a parsed solve file can be re-validated
/// without them).
pub fn validate_solution(
    solution: &OptimizationSolution,
    inputs: Option<&PlanInputs>,
) -> Result<(), SolutionError> {
    check_schema(solution)?;
    check_structural(solution)?;
    check_semantic(solution, inputs)?;
    Ok(())
}

fn nonnegative(field: &str, value: f64) -> Result<(), SolutionError> {
    if !value.is_finite() {
        return Err(SolutionError::schema(field, format!("non-finite value {value}")));
    }
    if value < -QUANTITY_EPS {
        return Err(SolutionError::schema(field, format!("negative quantity {value}")));
    }
    Ok(())
}

fn check_schema(solution: &OptimizationSolution) -> Result<(), SolutionError> {
    if !solution.total_cost.is_finite() {
        return Err(SolutionError::schema("total_cost", "non-finite total"));
    }
    for value in [
        solution.costs.labor,
        solution.costs.production,
        solution.costs.transport,
        solution.costs.holding,
        solution.costs.changeover,
        solution.costs.shortage,
        solution.costs.waste,
    ] {
        nonnegative("costs", value)?;
    }
    for (key, units) in &solution.production_by_date_product {
        nonnegative(&format!("production_by_date_product[{key:?}]"), *units)?;
    }
    for shipment in &solution.shipments {
        nonnegative(
            &format!("shipments[{}->{}]", shipment.origin, shipment.destination),
            shipment.units,
        )?;
    }
    for (key, units) in &solution.demand_consumed {
        nonnegative(&format!("demand_consumed[{key:?}]"), *units)?;
    }
    for (key, units) in &solution.shortages {
        nonnegative(&format!("shortages[{key:?}]"), *units)?;
    }
    for (key, units) in &solution.disposals {
        nonnegative(&format!("disposals[{key:?}]"), *units)?;
    }
    match &solution.inventory {
        crate::schema::InventoryReport::Aggregate { entries } => {
            for (key, units) in entries {
                nonnegative(&format!("inventory[{key:?}]"), *units)?;
            }
        }
        crate::schema::InventoryReport::Cohort { entries } => {
            for (key, units) in entries {
                nonnegative(&format!("inventory[{key:?}]"), *units)?;
            }
        }
    }
    for (date, hours) in &solution.labor_hours_by_date {
        for value in [hours.used, hours.paid, hours.fixed, hours.overtime] {
            nonnegative(&format!("labor_hours_by_date[{date}]"), value)?;
        }
    }
    Ok(())
}

fn check_structural(solution: &OptimizationSolution) -> Result<(), SolutionError> {
    for (key, _) in &solution.production_by_date_product {
        if key.0.is_empty() || key.1.is_empty() {
            return Err(SolutionError::structural(
                "production_by_date_product",
                format!("empty id in key {key:?}"),
            ));
        }
    }
    for shipment in &solution.shipments {
        if shipment.origin.is_empty()
            || shipment.destination.is_empty()
            || shipment.product.is_empty()
        {
            return Err(SolutionError::structural(
                "shipments",
                "empty id in shipment record",
            ));
        }
        if shipment.truck_id.is_empty() {
            return Err(SolutionError::structural("shipments", "empty truck id"));
        }
        if shipment.truck_id.parse::<i64>().is_ok() {
            return Err(SolutionError::structural(
                "shipments",
                format!(
                    "truck id '{}' is a bare integer; truck ids are strings",
                    shipment.truck_id
                ),
            ));
        }
        if shipment.delivery_date < shipment.depart_date {
            return Err(SolutionError::structural(
                "shipments",
                format!(
                    "delivery {} precedes departure {}",
                    shipment.delivery_date, shipment.depart_date
                ),
            ));
        }
        if shipment.prod_date > shipment.entry_date {
            return Err(SolutionError::structural(
                "shipments",
                format!(
                    "entry date {} precedes production {}",
                    shipment.entry_date, shipment.prod_date
                ),
            ));
        }
        let key = ShipmentKey(
            shipment.origin.clone(),
            shipment.destination.clone(),
            shipment.product.clone(),
            shipment.delivery_date,
        );
        if !solution.truck_assignments.contains_key(&key) {
            return Err(SolutionError::structural(
                "truck_assignments",
                format!("no truck assignment for shipment key {key:?}"),
            ));
        }
    }
    if let crate::schema::InventoryReport::Cohort { entries } = &solution.inventory {
        for (key, _) in entries {
            if key.2 > key.3 {
                return Err(SolutionError::structural(
                    "inventory",
                    format!("entry date precedes production in key {key:?}"),
                ));
            }
            let age = (key.5 - key.3).num_days();
            if age > key.4.shelf_life_days() {
                return Err(SolutionError::structural(
                    "inventory",
                    format!("cohort past its {} shelf life: {key:?}", key.4),
                ));
            }
        }
    }
    Ok(())
}

fn check_semantic(
    solution: &OptimizationSolution,
    inputs: Option<&PlanInputs>,
) -> Result<(), SolutionError> {
    // Cost identity.
    let component_sum = solution.costs.total();
    let tolerance = COST_REL_TOL * solution.total_cost.abs().max(1.0);
    if (solution.total_cost - component_sum).abs() > tolerance {
        return Err(SolutionError::semantic(
            "total_cost",
            format!(
                "total {} differs from component sum {} by more than {tolerance}",
                solution.total_cost, component_sum
            ),
        ));
    }

    // Labor identity.
    for (date, hours) in &solution.labor_hours_by_date {
        if hours.paid < hours.used - QUANTITY_EPS {
            return Err(SolutionError::semantic(
                "labor_hours_by_date",
                format!("{date}: paid {} below used {}", hours.paid, hours.used),
            ));
        }
    }

    // Truck loads within capacity.
    let mut per_truck_day: std::collections::BTreeMap<(&str, chrono::NaiveDate), f64> =
        std::collections::BTreeMap::new();
    for shipment in &solution.shipments {
        *per_truck_day
            .entry((shipment.truck_id.as_str(), shipment.depart_date))
            .or_insert(0.0) += shipment.units;
    }

    let Some(inputs) = inputs else {
        return Ok(());
    };

    for ((truck_id, date), units) in &per_truck_day {
        let Some(truck) = inputs.trucks.by_id(truck_id) else {
            return Err(SolutionError::semantic(
                "truck_assignments",
                format!("unknown truck id '{truck_id}'"),
            ));
        };
        let capacity = truck.pallet_capacity as f64 * params::UNITS_PER_PALLET;
        if *units > capacity + QUANTITY_EPS {
            return Err(SolutionError::semantic(
                "shipments",
                format!("truck '{truck_id}' on {date} loads {units} units over capacity {capacity}"),
            ));
        }
    }

    for truck_id in solution.truck_assignments.values() {
        if inputs.trucks.by_id(truck_id).is_none() {
            return Err(SolutionError::semantic(
                "truck_assignments",
                format!("unknown truck id '{truck_id}'"),
            ));
        }
    }

    let known_node = |id: &str| inputs.network.location(id).is_some();
    let known_product = |id: &str| inputs.products.iter().any(|p| p.id == id);

    for (key, _) in &solution.production_by_date_product {
        if !known_node(&key.0) {
            return Err(SolutionError::semantic(
                "production_by_date_product",
                format!("unknown node '{}'", key.0),
            ));
        }
        if !known_product(&key.1) {
            return Err(SolutionError::semantic(
                "production_by_date_product",
                format!("unknown product '{}'", key.1),
            ));
        }
    }
    for shipment in &solution.shipments {
        if !known_node(&shipment.origin) || !known_node(&shipment.destination) {
            return Err(SolutionError::semantic(
                "shipments",
                format!(
                    "unknown node in '{}' -> '{}'",
                    shipment.origin, shipment.destination
                ),
            ));
        }
        if !known_product(&shipment.product) {
            return Err(SolutionError::semantic(
                "shipments",
                format!("unknown product '{}'", shipment.product),
            ));
        }
    }
    for (key, _) in &solution.demand_consumed {
        if !known_node(&key.0) || !known_product(&key.1) {
            return Err(SolutionError::semantic(
                "demand_consumed",
                format!("unknown reference in key {key:?}"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn base_solution() -> OptimizationSolution {
        let costs = TotalCostBreakdown {
            labor: 100.0,
            production: 200.0,
            ..Default::default()
        };
        OptimizationSolution {
            model_type: ModelType::SlidingWindow,
            status: SolutionStatus::Optimal,
            total_cost: costs.total(),
            costs,
            production_by_date_product: BTreeMap::new(),
            shipments: Vec::new(),
            truck_assignments: BTreeMap::new(),
            labor_hours_by_date: BTreeMap::new(),
            inventory: InventoryReport::Cohort {
                entries: BTreeMap::new(),
            },
            demand_consumed: BTreeMap::new(),
            shortages: BTreeMap::new(),
            disposals: BTreeMap::new(),
            thaw_flows: BTreeMap::new(),
            freeze_flows: BTreeMap::new(),
            cohort_consumption: Vec::new(),
            windows: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_valid_solution_passes() {
        assert!(validate_solution(&base_solution(), None).is_ok());
    }

    #[test]
    fn test_cost_sum_mismatch_is_semantic() {
        let mut solution = base_solution();
        solution.total_cost += 50.0;
        let err = validate_solution(&solution, None).unwrap_err();
        assert!(matches!(err, SolutionError::Semantic { .. }));
    }

    #[test]
    fn test_negative_quantity_is_schema() {
        let mut solution = base_solution();
        solution.production_by_date_product.insert(
            ProductionKey("MFG".into(), "SKU-WHITE".into(), d("2026-06-01")),
            -10.0,
        );
        let err = validate_solution(&solution, None).unwrap_err();
        assert!(matches!(err, SolutionError::Schema { .. }));
    }

    #[test]
    fn test_integer_truck_id_is_structural() {
        let mut solution = base_solution();
        solution.shipments.push(ShipmentResult {
            origin: "MFG".into(),
            destination: "HUB-NSW".into(),
            product: "SKU-WHITE".into(),
            truck_id: "3".into(),
            depart_date: d("2026-06-01"),
            delivery_date: d("2026-06-02"),
            units: 100.0,
            state: bnp_core::StorageState::Ambient,
            prod_date: d("2026-06-01"),
            entry_date: d("2026-06-01"),
        });
        let err = validate_solution(&solution, None).unwrap_err();
        assert!(matches!(err, SolutionError::Structural { .. }));
        assert!(err.to_string().contains("bare integer"));
    }

    #[test]
    fn test_missing_truck_assignment_is_structural() {
        let mut solution = base_solution();
        solution.shipments.push(ShipmentResult {
            origin: "MFG".into(),
            destination: "HUB-NSW".into(),
            product: "SKU-WHITE".into(),
            truck_id: "T-NSW".into(),
            depart_date: d("2026-06-01"),
            delivery_date: d("2026-06-02"),
            units: 100.0,
            state: bnp_core::StorageState::Ambient,
            prod_date: d("2026-06-01"),
            entry_date: d("2026-06-01"),
        });
        let err = validate_solution(&solution, None).unwrap_err();
        assert!(err.to_string().contains("no truck assignment"));
    }

    #[test]
    fn test_paid_below_used_is_semantic() {
        let mut solution = base_solution();
        solution.labor_hours_by_date.insert(
            d("2026-06-01"),
            LaborHoursBreakdown {
                used: 8.0,
                paid: 6.0,
                fixed: 6.0,
                overtime: 0.0,
            },
        );
        let err = validate_solution(&solution, None).unwrap_err();
        assert!(matches!(err, SolutionError::Semantic { .. }));
    }

    #[test]
    fn test_expired_cohort_inventory_is_structural() {
        let mut solution = base_solution();
        let mut entries = BTreeMap::new();
        entries.insert(
            CohortInventoryKey(
                "BR-6104".into(),
                "SKU-WHITE".into(),
                d("2026-06-01"),
                d("2026-06-01"),
                bnp_core::StorageState::Thawed,
                d("2026-06-20"),
            ),
            64.0,
        );
        solution.inventory = InventoryReport::Cohort { entries };
        let err = validate_solution(&solution, None).unwrap_err();
        assert!(err.to_string().contains("shelf life"));
    }
}
