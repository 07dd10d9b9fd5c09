//! Solution extraction: solver values back into typed, committed records.
//!
//! Extraction is window-scoped: only records whose governing date falls on
//! or before the window's commit boundary are emitted. Flow variables come
//! back through the same scale factor their cost coefficients carried, and
//! every component of the cost breakdown is priced here with the
//! coefficients from `bnp_model::costing`, so the reported dollars match
//! the objective term for term.

use crate::schema::{
    CohortConsumption, CohortInventoryKey, DemandKey, FlowKey, LaborHoursBreakdown, ProductionKey,
    ShipmentKey, ShipmentResult, TotalCostBreakdown,
};
use bnp_core::{
    CohortStock, InTransitStock, InventorySnapshot, PlanError, PlanInputs, PlanResult,
    StorageState, TransportMode,
};
use bnp_model::{costing, Catalog, VarId, FLOW_SCALE};
use bnp_solve::SolvedModel;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Ignore extracted flows below this many units (solver dust).
const UNIT_EPS: f64 = 1e-3;

/// Everything one window commits.
#[derive(Debug, Clone)]
pub struct WindowExtract {
    pub production: BTreeMap<ProductionKey, f64>,
    pub labor: BTreeMap<NaiveDate, LaborHoursBreakdown>,
    pub shipments: Vec<ShipmentResult>,
    pub cohort_inventory: BTreeMap<CohortInventoryKey, f64>,
    pub demand_consumed: BTreeMap<DemandKey, f64>,
    pub shortages: BTreeMap<DemandKey, f64>,
    pub disposals: BTreeMap<DemandKey, f64>,
    pub thaw_flows: BTreeMap<FlowKey, f64>,
    pub freeze_flows: BTreeMap<FlowKey, f64>,
    pub cohort_consumption: Vec<CohortConsumption>,
    pub costs: TotalCostBreakdown,
    /// Inventory at the commit boundary plus cargo still on the road:
    /// the next window's initial state.
    pub terminal_snapshot: InventorySnapshot,
}

/// Extract the committed portion of a solved window.
pub fn extract_window(
    catalog: &Catalog,
    inputs: &PlanInputs,
    solved: &SolvedModel,
    use_pallet_tracking: bool,
    commit_through: NaiveDate,
) -> PlanResult<WindowExtract> {
    let values = solved.values.as_ref().ok_or_else(|| {
        PlanError::Solution("extraction requested on a solve without values".into())
    })?;
    let index = &solved.index;
    let vars = &solved.vars;
    let costs_in = &inputs.costs;

    let units_of = |id: VarId| values.value(id) * FLOW_SCALE;

    let mut costs = TotalCostBreakdown::default();

    // Production.
    let mfg_id = catalog.node_id(catalog.manufacturing).to_string();
    let mut production = BTreeMap::new();
    for (i, (product, date)) in index.production.iter().enumerate() {
        if *date > commit_through {
            continue;
        }
        let units = units_of(vars.production[i]);
        if units > UNIT_EPS {
            production.insert(
                ProductionKey(mfg_id.clone(), catalog.product_id(*product).to_string(), *date),
                units,
            );
            costs.production += units * costs_in.production_cost_per_unit;
        }
    }

    // Labor and changeover.
    let mut labor = BTreeMap::new();
    for (&date, lv) in &vars.labor {
        if date > commit_through {
            continue;
        }
        let day = inputs.labor.require_day(date)?;
        let hours = LaborHoursBreakdown {
            used: values.value(lv.used).max(0.0),
            paid: values.value(lv.paid).max(0.0),
            fixed: values.value(lv.fixed_used).max(0.0),
            overtime: values.value(lv.overtime_used).max(0.0),
        };
        if day.is_fixed_day {
            costs.labor += day.regular_rate * hours.fixed + day.overtime_rate * hours.overtime;
        } else {
            costs.labor += day.non_fixed_rate * hours.paid;
        }
        for (_, active) in &lv.product_active {
            if values.value(*active) > 0.5 {
                costs.changeover += costs_in.changeover_cost_per_start;
            }
        }
        labor.insert(date, hours);
    }

    // Shipments (committed by departure date) and freeze-at-load flows.
    let mut shipments = Vec::new();
    let mut freeze_flows: BTreeMap<FlowKey, f64> = BTreeMap::new();
    let mut in_transit = Vec::new();
    for (i, spec) in index.shipments.iter().enumerate() {
        if spec.depart_date > commit_through {
            continue;
        }
        let units = units_of(vars.shipments[i]);
        if units <= UNIT_EPS {
            continue;
        }
        let origin = index.cohort(spec.origin_cohort);
        let leg = catalog.leg(spec.leg);
        let truck = catalog.truck(index.truck_departures[spec.departure].truck);
        costs.transport += units * leg.cost_per_unit;

        shipments.push(ShipmentResult {
            origin: catalog.node_id(leg.from).to_string(),
            destination: catalog.node_id(spec.dest).to_string(),
            product: catalog.product_id(spec.product).to_string(),
            truck_id: truck.id.clone(),
            depart_date: spec.depart_date,
            delivery_date: spec.deliver_date,
            units,
            state: spec.arrival_state,
            prod_date: origin.prod_date,
            entry_date: spec.arrival_entry,
        });

        if leg.mode == TransportMode::Frozen && origin.state == StorageState::Ambient {
            *freeze_flows
                .entry(FlowKey(
                    catalog.node_id(leg.from).to_string(),
                    catalog.product_id(spec.product).to_string(),
                    origin.prod_date,
                    spec.depart_date,
                ))
                .or_insert(0.0) += units;
        }

        if spec.deliver_date > commit_through {
            in_transit.push(InTransitStock {
                destination: catalog.node_id(spec.dest).to_string(),
                product: catalog.product_id(spec.product).to_string(),
                prod_date: origin.prod_date,
                entry_date: spec.arrival_entry,
                state: spec.arrival_state,
                units,
                arrival_date: spec.deliver_date,
            });
        }
    }

    // Thaw flows.
    let mut thaw_flows: BTreeMap<FlowKey, f64> = BTreeMap::new();
    for (i, spec) in index.thaws.iter().enumerate() {
        if spec.date > commit_through {
            continue;
        }
        let units = units_of(vars.thaws[i]);
        if units > UNIT_EPS {
            let frozen = index.cohort(spec.frozen_cohort);
            *thaw_flows
                .entry(FlowKey(
                    catalog.node_id(frozen.node).to_string(),
                    catalog.product_id(frozen.product).to_string(),
                    frozen.prod_date,
                    spec.date,
                ))
                .or_insert(0.0) += units;
        }
    }

    // Inventory, holding cost, disposal, and the terminal snapshot.
    let mut cohort_inventory = BTreeMap::new();
    let mut disposals: BTreeMap<DemandKey, f64> = BTreeMap::new();
    let mut terminal_cohorts = Vec::new();
    for (idx, key) in index.cohorts.iter().enumerate() {
        if key.date > commit_through {
            continue;
        }
        let node_id = catalog.node_id(key.node).to_string();
        let product_id = catalog.product_id(key.product).to_string();

        let inv_units = units_of(vars.inventory[idx]);
        if inv_units > UNIT_EPS {
            cohort_inventory.insert(
                CohortInventoryKey(
                    node_id.clone(),
                    product_id.clone(),
                    key.prod_date,
                    key.entry_date,
                    key.state,
                    key.date,
                ),
                inv_units,
            );
            if !use_pallet_tracking {
                costs.holding +=
                    inv_units * costing::holding_rate_per_pallet_day(costs_in, key.state)
                        / bnp_core::params::UNITS_PER_PALLET;
            }
            if key.date == commit_through {
                terminal_cohorts.push(CohortStock {
                    location: node_id.clone(),
                    product: product_id.clone(),
                    prod_date: key.prod_date,
                    entry_date: key.entry_date,
                    state: key.state,
                    units: inv_units,
                });
            }
        }

        let disposed = units_of(vars.disposal[idx]);
        if disposed > UNIT_EPS {
            costs.waste += disposed * costs_in.disposal_penalty_per_unit;
            *disposals
                .entry(DemandKey(node_id, product_id, key.date))
                .or_insert(0.0) += disposed;
        }
    }
    if use_pallet_tracking {
        if let Some(pallet_vars) = &vars.storage_pallets {
            for (group, key) in index.pallet_groups.iter().enumerate() {
                if key.date > commit_through {
                    continue;
                }
                let pallets = values.value(pallet_vars[group]).round();
                if pallets > 0.0 {
                    costs.holding +=
                        pallets * costing::holding_rate_per_pallet_day(costs_in, key.state);
                }
            }
        }
    }

    // Demand, shortage, and the batch-level consumption behind them.
    let mut demand_consumed: BTreeMap<DemandKey, f64> = BTreeMap::new();
    let mut shortages: BTreeMap<DemandKey, f64> = BTreeMap::new();
    let mut cohort_consumption = Vec::new();
    for (r, row) in index.demand_rows.iter().enumerate() {
        if row.date > commit_through {
            continue;
        }
        let demand_key = DemandKey(
            catalog.node_id(row.node).to_string(),
            catalog.product_id(row.product).to_string(),
            row.date,
        );
        let mut consumed_total = 0.0;
        for &cohort_idx in &row.eligible_cohorts {
            let key = index.cohort(cohort_idx);
            let consumed = units_of(vars.consumption[&cohort_idx]);
            let held = units_of(vars.inventory[cohort_idx]);
            let available = consumed + held;
            if consumed > UNIT_EPS || available > UNIT_EPS {
                cohort_consumption.push(CohortConsumption {
                    node: demand_key.0.clone(),
                    product: demand_key.1.clone(),
                    prod_date: key.prod_date,
                    entry_date: key.entry_date,
                    state: key.state,
                    date: row.date,
                    units: consumed.max(0.0),
                    available_units: available.max(0.0),
                });
            }
            consumed_total += consumed.max(0.0);
        }
        if consumed_total > UNIT_EPS {
            demand_consumed.insert(demand_key.clone(), consumed_total);
        }
        if let Some(short_var) = vars.shortage[r] {
            let short = units_of(short_var);
            if short > UNIT_EPS {
                costs.shortage += short * costs_in.shortage_penalty_per_unit;
                shortages.insert(demand_key, short);
            }
        }
    }

    Ok(WindowExtract {
        production,
        labor,
        shipments,
        cohort_inventory,
        demand_consumed,
        shortages,
        disposals,
        thaw_flows,
        freeze_flows,
        cohort_consumption,
        costs,
        terminal_snapshot: InventorySnapshot {
            as_of: commit_through,
            cohorts: terminal_cohorts,
            in_transit,
        },
    })
}

/// Group committed shipments into the truck-assignment map; when several
/// trucks serve one shipment key, the heaviest load names the truck.
pub fn truck_assignments(shipments: &[ShipmentResult]) -> BTreeMap<ShipmentKey, String> {
    let mut best: BTreeMap<ShipmentKey, (f64, String)> = BTreeMap::new();
    for shipment in shipments {
        let key = ShipmentKey(
            shipment.origin.clone(),
            shipment.destination.clone(),
            shipment.product.clone(),
            shipment.delivery_date,
        );
        let entry = best.entry(key).or_insert((0.0, shipment.truck_id.clone()));
        if shipment.units > entry.0 {
            *entry = (shipment.units, shipment.truck_id.clone());
        }
    }
    best.into_iter().map(|(k, (_, id))| (k, id)).collect()
}
