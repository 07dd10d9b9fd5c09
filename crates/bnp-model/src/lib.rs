//! # bnp-model: Cohort-Indexed MILP Formulation
//!
//! Builds the age-cohort, state-aware flow model for the bread network:
//! sparse index sets over `(node, product, prod_date, entry_date, date,
//! state)`, the constraint families that enforce mass balance, truck and
//! pallet limits, and piecewise labor, and the total-cost objective with a
//! soft first-expired-first-out incentive.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Intern | [`catalog`] | refs into node/product/leg/truck tables |
//! | Index | [`indices`] | sparse cohort, shipment, pallet index sets |
//! | Variables | [`variables`] | named decision variables + registry |
//! | Constraints | [`constraints`] | backend-independent constraint rows |
//! | Objective | [`objective`] | cost expression (coefficients from [`costing`]) |
//! | Assemble | [`build`] | a [`PlanModel`] ready for the solver driver |
//!
//! The model is backend-independent: it produces `good_lp` expressions and
//! constraints; the driver crate picks the solver.
//!
//! Flow quantities are modeled in thousands of units ([`costing::FLOW_SCALE`]);
//! labor hours, pallet counts, and binaries use natural units.

pub mod build;
pub mod catalog;
pub mod constraints;
pub mod costing;
pub mod indices;
pub mod objective;
pub mod testnet;
pub mod variables;

pub use build::{build_model, PlanModel, VarClamp};
pub use catalog::{Catalog, LegRef, NodeRef, ProductRef, TruckRef};
pub use costing::FLOW_SCALE;
pub use indices::{
    build_indices, is_within_horizon, CohortKey, DemandRow, IndexSet, PalletKey, ShipmentSpec,
    ThawSpec, TruckDeparture,
};
pub use variables::{BuildOptions, DecisionVars, LaborVars, VarId, VarRegistry};

#[cfg(test)]
mod tests {
    use super::*;
    use bnp_core::{Horizon, InventorySnapshot, StorageState};
    use chrono::Duration;

    #[test]
    fn test_single_site_model_builds() {
        let inputs = testnet::single_site();
        let catalog = Catalog::build(&inputs).unwrap();
        let horizon = Horizon::from_start(testnet::start_date(), 7);
        let snapshot = InventorySnapshot::empty(horizon.start);

        let model = build_model(
            &catalog,
            &inputs,
            horizon,
            &snapshot,
            &BuildOptions::default(),
            &[],
        )
        .unwrap();

        assert!(model.num_variables() > 0);
        assert!(model.num_constraints() > 0);
        // No legs, no trucks: nothing ships.
        assert!(model.index.shipments.is_empty());
        assert_eq!(model.index.demand_rows.len(), 1);
    }

    #[test]
    fn test_hub_spoke_admits_shipments() {
        let inputs = testnet::hub_spoke();
        let catalog = Catalog::build(&inputs).unwrap();
        let horizon = Horizon::from_start(testnet::start_date(), 7);
        let snapshot = InventorySnapshot::empty(horizon.start);

        let index = build_indices(&catalog, &inputs, horizon, &snapshot).unwrap();

        assert!(!index.shipments.is_empty());
        // Every admitted shipment departs inside the horizon.
        for spec in &index.shipments {
            assert!(is_within_horizon(&horizon, spec.depart_date));
            assert!(spec.deliver_date <= horizon.end);
            assert_eq!(
                spec.deliver_date - spec.depart_date,
                Duration::days(catalog.leg(spec.leg).transit_days)
            );
        }
    }

    #[test]
    fn test_frozen_route_thaw_on_arrival_cohorts() {
        let inputs = testnet::frozen_route();
        let catalog = Catalog::build(&inputs).unwrap();
        let horizon = Horizon::from_start(testnet::start_date(), 14);
        let snapshot = InventorySnapshot::empty(horizon.start);

        let index = build_indices(&catalog, &inputs, horizon, &snapshot).unwrap();

        let breadroom = catalog.node_ref("BR-6104").unwrap();
        let buffer = catalog.node_ref("BUF-WA").unwrap();

        // Frozen cohorts at the buffer freeze at loading: entry can trail
        // production.
        assert!(index
            .cohorts
            .iter()
            .any(|c| c.node == buffer && c.state == StorageState::Frozen));

        // Thawed cohorts at the breadroom enter on their delivery date.
        let thawed: Vec<_> = index
            .cohorts
            .iter()
            .filter(|c| c.node == breadroom && c.state == StorageState::Thawed)
            .collect();
        assert!(!thawed.is_empty());
        for cohort in &thawed {
            assert!(cohort.entry_date > cohort.prod_date);
            assert!(cohort.age_in_state() <= StorageState::Thawed.shelf_life_days());
        }

        // Deliveries into the breadroom arrive thawed with a fresh clock.
        assert!(index
            .shipments
            .iter()
            .any(|s| s.dest == breadroom
                && s.arrival_state == StorageState::Thawed
                && s.arrival_entry == s.deliver_date));
    }

    #[test]
    fn test_shelf_life_bounds_every_cohort() {
        let inputs = testnet::frozen_route();
        let catalog = Catalog::build(&inputs).unwrap();
        let horizon = Horizon::from_start(testnet::start_date(), 14);
        let snapshot = InventorySnapshot::empty(horizon.start);

        let index = build_indices(&catalog, &inputs, horizon, &snapshot).unwrap();
        for cohort in &index.cohorts {
            assert!(cohort.prod_date <= cohort.entry_date);
            assert!(cohort.entry_date <= cohort.date);
            assert!(
                cohort.age_in_state() <= cohort.state.shelf_life_days(),
                "expired cohort admitted: {cohort:?}"
            );
        }
    }

    #[test]
    fn test_empty_labor_calendar_is_model_error() {
        let mut inputs = testnet::single_site();
        inputs.labor = bnp_core::LaborCalendar::new();
        let catalog = Catalog::build(&inputs).unwrap();
        let horizon = Horizon::from_start(testnet::start_date(), 7);
        let snapshot = InventorySnapshot::empty(horizon.start);

        let err = build_indices(&catalog, &inputs, horizon, &snapshot).unwrap_err();
        assert!(err.to_string().contains("empty production set"));
    }

    #[test]
    fn test_prior_day_loading_excludes_same_day_production() {
        let mut inputs = testnet::hub_spoke();
        inputs.trucks.schedules[0].loading = bnp_core::LoadingPolicy::PriorDay;
        let catalog = Catalog::build(&inputs).unwrap();
        let horizon = Horizon::from_start(testnet::start_date(), 7);
        let snapshot = InventorySnapshot::empty(horizon.start);

        let index = build_indices(&catalog, &inputs, horizon, &snapshot).unwrap();
        for spec in &index.shipments {
            let origin = index.cohort(spec.origin_cohort);
            assert!(origin.prod_date < spec.depart_date);
        }
    }
}
