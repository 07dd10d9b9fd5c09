//! Constraint generation over the sparse index sets.
//!
//! Families: cohort mass balance, demand coupling with optional shortage,
//! truck loading with integer pallet ceilings, storage pallet ceilings,
//! leg capacity, and the piecewise labor block. Shelf life needs no
//! constraint family of its own: expired cohorts are never admitted to the
//! index, and freeze/thaw re-entry gives every cohort an accurate
//! age-in-state by construction.

use crate::catalog::{Catalog, LegRef, NodeRef};
use crate::costing::FLOW_SCALE;
use crate::indices::IndexSet;
use crate::variables::{DecisionVars, VarRegistry};
use bnp_core::{params, PlanInputs, PlanResult, StorageState};
use chrono::NaiveDate;
use good_lp::{constraint, Constraint, Expression};
use hashbrown::HashMap;

/// Generate every constraint family.
pub fn build_constraints(
    catalog: &Catalog,
    inputs: &PlanInputs,
    index: &IndexSet,
    vars: &DecisionVars,
    registry: &VarRegistry,
) -> PlanResult<Vec<Constraint>> {
    let mut constraints = Vec::new();

    // Flow accumulators per cohort. Shipments and thaws each touch exactly
    // one origin and one target cohort.
    let zero = || Expression::from(0.0);
    let mut inflow: Vec<Expression> = (0..index.cohorts.len()).map(|_| zero()).collect();
    let mut outflow: Vec<Expression> = (0..index.cohorts.len()).map(|_| zero()).collect();

    for (i, spec) in index.shipments.iter().enumerate() {
        let ship = registry.variable(vars.shipments[i]);
        outflow[spec.origin_cohort] += ship;
        inflow[spec.arrival_cohort] += ship;
    }
    for (i, spec) in index.thaws.iter().enumerate() {
        let thaw = registry.variable(vars.thaws[i]);
        outflow[spec.frozen_cohort] += thaw;
        inflow[spec.thawed_cohort] += thaw;
    }

    // Material balance, one row per cohort.
    for (idx, key) in index.cohorts.iter().enumerate() {
        let mut rhs = std::mem::replace(&mut inflow[idx], zero());

        if let Some(&prev_idx) = index.cohort_lookup.get(&key.previous()) {
            rhs += registry.variable(vars.inventory[prev_idx]);
        }
        if index.initial_units[idx] > 0.0 {
            rhs += index.initial_units[idx] / FLOW_SCALE;
        }
        if catalog.is_manufacturing(key.node)
            && key.state == StorageState::Ambient
            && key.prod_date == key.date
            && key.entry_date == key.date
        {
            if let Some(&prod_idx) = vars.production_lookup.get(&(key.product, key.date)) {
                rhs += registry.variable(vars.production[prod_idx]);
            }
        }

        if let Some(&cons) = vars.consumption.get(&idx) {
            rhs -= registry.variable(cons);
        }
        rhs -= std::mem::replace(&mut outflow[idx], zero());
        rhs -= registry.variable(vars.disposal[idx]);

        constraints.push(constraint!(registry.variable(vars.inventory[idx]) == rhs));

        // Expiry flush: on a cohort's last shelf-life day inside the
        // horizon, everything must leave as consumption, departure, or
        // disposal. Stock never vanishes off the books.
        if key.date == key.entry_date + chrono::Duration::days(key.state.shelf_life_days())
            && key.date < index.horizon.end
        {
            constraints.push(constraint!(registry.variable(vars.inventory[idx]) == 0.0));
        }
    }

    // Demand coupling: consumption draws plus shortage meet the forecast.
    for (r, row) in index.demand_rows.iter().enumerate() {
        let mut lhs = zero();
        for &cohort_idx in &row.eligible_cohorts {
            lhs += registry.variable(vars.consumption[&cohort_idx]);
        }
        if let Some(short) = vars.shortage[r] {
            lhs += registry.variable(short);
        }
        constraints.push(constraint!(lhs == row.units / FLOW_SCALE));
    }

    // Truck loading: per departure and destination, pallet ceilings over
    // the loaded units, and the shared 44-pallet capacity per departure.
    let mut loaded: HashMap<(usize, NodeRef), Expression> = HashMap::new();
    for (i, spec) in index.shipments.iter().enumerate() {
        *loaded
            .entry((spec.departure, spec.dest))
            .or_insert_with(zero) += registry.variable(vars.shipments[i]);
    }

    if let Some(tp) = &vars.truck_pallets {
        let mut per_departure: HashMap<usize, Expression> = HashMap::new();
        for ((departure, dest), units) in &loaded {
            let slot = tp.lookup[&(*departure, *dest)];
            let pallets = registry.variable(tp.vars[slot]);
            constraints.push(constraint!(
                params::UNITS_PER_PALLET * pallets - FLOW_SCALE * units.clone() >= 0.0
            ));
            constraints.push(constraint!(
                params::UNITS_PER_PALLET * pallets - FLOW_SCALE * units.clone()
                    <= params::UNITS_PER_PALLET - 1.0
            ));
            *per_departure.entry(*departure).or_insert_with(zero) += pallets;
        }
        for (departure, pallets) in per_departure {
            let truck = catalog.truck(index.truck_departures[departure].truck);
            constraints.push(constraint!(pallets <= truck.pallet_capacity as f64));
        }
    } else {
        let mut per_departure: HashMap<usize, Expression> = HashMap::new();
        for ((departure, _), units) in &loaded {
            *per_departure.entry(*departure).or_insert_with(zero) +=
                FLOW_SCALE * units.clone();
        }
        for (departure, units) in per_departure {
            let truck = catalog.truck(index.truck_departures[departure].truck);
            constraints.push(constraint!(
                units <= truck.pallet_capacity as f64 * params::UNITS_PER_PALLET
            ));
        }
    }

    // Leg capacity, where declared.
    let mut per_leg: HashMap<(LegRef, NaiveDate), Expression> = HashMap::new();
    for (i, spec) in index.shipments.iter().enumerate() {
        if catalog.leg(spec.leg).capacity_units.is_some() {
            *per_leg
                .entry((spec.leg, spec.depart_date))
                .or_insert_with(zero) += registry.variable(vars.shipments[i]);
        }
    }
    for ((leg, _date), units) in per_leg {
        let capacity = catalog
            .leg(leg)
            .capacity_units
            .expect("only capacitated legs accumulate");
        constraints.push(constraint!(FLOW_SCALE * units <= capacity));
    }

    // Storage pallet ceilings over entry-aggregated cohort inventory.
    if let Some(pallet_vars) = &vars.storage_pallets {
        let mut group_units: Vec<Expression> =
            (0..index.pallet_groups.len()).map(|_| zero()).collect();
        for (idx, &group) in index.cohort_pallet.iter().enumerate() {
            group_units[group] += registry.variable(vars.inventory[idx]);
        }
        for (group, units) in group_units.into_iter().enumerate() {
            let pallets = registry.variable(pallet_vars[group]);
            constraints.push(constraint!(
                params::UNITS_PER_PALLET * pallets - FLOW_SCALE * units.clone() >= 0.0
            ));
            constraints.push(constraint!(
                params::UNITS_PER_PALLET * pallets - FLOW_SCALE * units
                    <= params::UNITS_PER_PALLET - 1.0
            ));
        }
    }

    // Labor block, one per production date.
    let daily_capacity =
        params::PRODUCTION_RATE_UNITS_PER_HOUR * params::DAY_ACTIVE_HOURS_BIG_M / FLOW_SCALE;
    for (&date, labor) in &vars.labor {
        let day = inputs.labor.require_day(date)?;
        let day_active = registry.variable(labor.day_active);
        let used = registry.variable(labor.used);
        let paid = registry.variable(labor.paid);

        let mut production_hours = zero();
        let mut starts = zero();
        for (product, active) in &labor.product_active {
            let active = registry.variable(*active);
            starts += active;
            if let Some(&prod_idx) = vars.production_lookup.get(&(*product, date)) {
                let prod = registry.variable(vars.production[prod_idx]);
                production_hours +=
                    (FLOW_SCALE / params::PRODUCTION_RATE_UNITS_PER_HOUR) * prod;
                // A product only runs on an active day, and an active
                // product forces the day on through the hours identity.
                constraints.push(constraint!(prod - daily_capacity * active <= 0.0));
            }
        }

        constraints.push(constraint!(
            used
                == production_hours
                    + (params::STARTUP_HOURS + params::SHUTDOWN_HOURS) * day_active
                    + params::CHANGEOVER_HOURS_PER_START * starts
        ));
        constraints.push(constraint!(
            used - params::DAY_ACTIVE_HOURS_BIG_M * day_active <= 0.0
        ));

        if day.is_fixed_day {
            let fixed = registry.variable(labor.fixed_used);
            let overtime = registry.variable(labor.overtime_used);
            constraints.push(constraint!(used == fixed + overtime));
            constraints.push(constraint!(paid == fixed + overtime));
        } else {
            constraints.push(constraint!(paid - used >= 0.0));
            constraints.push(constraint!(
                paid - day.minimum_paid_hours * day_active >= 0.0
            ));
        }
    }

    Ok(constraints)
}
