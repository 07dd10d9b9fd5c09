//! Decision variables and the name registry.
//!
//! Every variable is registered under a deterministic name containing its
//! domain key (ids and ISO dates). The registry is the bridge out of the
//! solver: extraction reads values back by registered handle, and the
//! sliding-window warmstart shifts the dates inside names to address the
//! matching variable in the next window.

use crate::catalog::{Catalog, NodeRef, ProductRef};
use crate::costing::FLOW_SCALE;
use crate::indices::IndexSet;
use bnp_core::{params, PlanInputs};
use chrono::NaiveDate;
use good_lp::{variable, ProblemVariables, Variable};
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Handle of a registered variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub u32);

/// Registry of every variable in one model, in creation order.
#[derive(Default)]
pub struct VarRegistry {
    names: Vec<String>,
    vars: Vec<Variable>,
    by_name: HashMap<String, VarId>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        problem: &mut ProblemVariables,
        name: String,
        definition: good_lp::variable::VariableDefinition,
    ) -> VarId {
        let var = problem.add(definition.name(name.clone()));
        let id = VarId(self.vars.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.names.push(name);
        self.vars.push(var);
        id
    }

    pub fn variable(&self, id: VarId) -> Variable {
        self.vars[id.0 as usize]
    }

    pub fn name(&self, id: VarId) -> &str {
        &self.names[id.0 as usize]
    }

    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, &str, Variable)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, v)| (VarId(i as u32), self.names[i].as_str(), *v))
    }
}

/// Labor variables for one production date.
#[derive(Debug, Clone)]
pub struct LaborVars {
    pub used: VarId,
    pub paid: VarId,
    pub fixed_used: VarId,
    pub overtime_used: VarId,
    pub day_active: VarId,
    pub product_active: Vec<(ProductRef, VarId)>,
}

/// Integer pallet variables on trucks, keyed by (departure, destination).
#[derive(Debug, Clone, Default)]
pub struct TruckPalletVars {
    pub keys: Vec<(usize, NodeRef)>,
    pub vars: Vec<VarId>,
    pub lookup: HashMap<(usize, NodeRef), usize>,
}

/// All decision variables of one model, parallel to the index sets.
pub struct DecisionVars {
    /// Parallel to `IndexSet::cohorts`.
    pub inventory: Vec<VarId>,
    /// Consumption draw per demand-eligible cohort.
    pub consumption: HashMap<usize, VarId>,
    /// Parallel to `IndexSet::cohorts`.
    pub disposal: Vec<VarId>,
    /// Parallel to `IndexSet::production`.
    pub production: Vec<VarId>,
    pub production_lookup: HashMap<(ProductRef, NaiveDate), usize>,
    /// Parallel to `IndexSet::shipments`.
    pub shipments: Vec<VarId>,
    /// Parallel to `IndexSet::thaws`.
    pub thaws: Vec<VarId>,
    /// Parallel to `IndexSet::demand_rows`; `None` when shortages are
    /// disallowed.
    pub shortage: Vec<Option<VarId>>,
    /// Parallel to `IndexSet::pallet_groups` when pallet tracking is on.
    pub storage_pallets: Option<Vec<VarId>>,
    pub truck_pallets: Option<TruckPalletVars>,
    pub labor: BTreeMap<NaiveDate, LaborVars>,
}

/// Variable-creation options (a subset of the planner configuration).
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub allow_shortages: bool,
    pub use_pallet_tracking: bool,
    pub use_truck_pallet_tracking: bool,
    /// Overrides the cost structure's freshness weight when set.
    pub freshness_weight: Option<f64>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            allow_shortages: true,
            use_pallet_tracking: true,
            use_truck_pallet_tracking: true,
            freshness_weight: None,
        }
    }
}

fn cohort_name(prefix: &str, catalog: &Catalog, key: &crate::indices::CohortKey) -> String {
    format!(
        "{}[{},{},{},{},{}]@{}",
        prefix,
        catalog.node_id(key.node),
        catalog.product_id(key.product),
        key.prod_date,
        key.entry_date,
        key.state,
        key.date
    )
}

/// Create every decision variable for the index set.
pub fn create_variables(
    catalog: &Catalog,
    inputs: &PlanInputs,
    index: &IndexSet,
    options: &BuildOptions,
    problem: &mut ProblemVariables,
    registry: &mut VarRegistry,
) -> DecisionVars {
    // Daily line capacity in scaled flow units.
    let daily_capacity = params::PRODUCTION_RATE_UNITS_PER_HOUR * params::DAY_ACTIVE_HOURS_BIG_M
        / FLOW_SCALE;

    let mut inventory = Vec::with_capacity(index.cohorts.len());
    let mut disposal = Vec::with_capacity(index.cohorts.len());
    for key in &index.cohorts {
        inventory.push(registry.add(
            problem,
            cohort_name("inv", catalog, key),
            variable().min(0.0),
        ));
        disposal.push(registry.add(
            problem,
            cohort_name("disp", catalog, key),
            variable().min(0.0),
        ));
    }

    let mut consumption = HashMap::new();
    for row in &index.demand_rows {
        for &cohort_idx in &row.eligible_cohorts {
            consumption.entry(cohort_idx).or_insert_with(|| {
                registry.add(
                    problem,
                    cohort_name("cons", catalog, &index.cohorts[cohort_idx]),
                    variable().min(0.0),
                )
            });
        }
    }

    let mut production = Vec::with_capacity(index.production.len());
    let mut production_lookup = HashMap::new();
    for (i, (product, date)) in index.production.iter().enumerate() {
        production_lookup.insert((*product, *date), i);
        production.push(registry.add(
            problem,
            format!("prod[{}]@{}", catalog.product_id(*product), date),
            variable().min(0.0).max(daily_capacity),
        ));
    }

    let mut shipments = Vec::with_capacity(index.shipments.len());
    for spec in &index.shipments {
        let origin = &index.cohorts[spec.origin_cohort];
        let truck = catalog.truck(index.truck_departures[spec.departure].truck);
        shipments.push(registry.add(
            problem,
            format!(
                "ship[{},{},{},{},{},{}]@{}",
                truck.id,
                catalog.leg(spec.leg).name,
                catalog.product_id(spec.product),
                origin.prod_date,
                origin.entry_date,
                origin.state,
                spec.depart_date
            ),
            variable().min(0.0),
        ));
    }

    let mut thaws = Vec::with_capacity(index.thaws.len());
    for spec in &index.thaws {
        let frozen = &index.cohorts[spec.frozen_cohort];
        thaws.push(registry.add(
            problem,
            format!(
                "thaw[{},{},{},{}]@{}",
                catalog.node_id(frozen.node),
                catalog.product_id(frozen.product),
                frozen.prod_date,
                frozen.entry_date,
                spec.date
            ),
            variable().min(0.0),
        ));
    }

    let mut shortage = Vec::with_capacity(index.demand_rows.len());
    for row in &index.demand_rows {
        if options.allow_shortages {
            shortage.push(Some(registry.add(
                problem,
                format!(
                    "short[{},{}]@{}",
                    catalog.node_id(row.node),
                    catalog.product_id(row.product),
                    row.date
                ),
                variable().min(0.0).max(row.units / FLOW_SCALE),
            )));
        } else {
            shortage.push(None);
        }
    }

    let storage_pallets = options.use_pallet_tracking.then(|| {
        index
            .pallet_groups
            .iter()
            .map(|g| {
                registry.add(
                    problem,
                    format!(
                        "pal[{},{},{},{}]@{}",
                        catalog.node_id(g.node),
                        catalog.product_id(g.product),
                        g.prod_date,
                        g.state,
                        g.date
                    ),
                    variable().integer().min(0.0),
                )
            })
            .collect()
    });

    let truck_pallets = options.use_truck_pallet_tracking.then(|| {
        let mut tp = TruckPalletVars::default();
        for spec in &index.shipments {
            let key = (spec.departure, spec.dest);
            if tp.lookup.contains_key(&key) {
                continue;
            }
            let departure = &index.truck_departures[spec.departure];
            let truck = catalog.truck(departure.truck);
            let var = registry.add(
                problem,
                format!(
                    "tpal[{},{}]@{}",
                    truck.id,
                    catalog.node_id(spec.dest),
                    departure.date
                ),
                variable()
                    .integer()
                    .min(0.0)
                    .max(truck.pallet_capacity as f64),
            );
            tp.lookup.insert(key, tp.keys.len());
            tp.keys.push(key);
            tp.vars.push(var);
        }
        tp
    });

    let mut labor = BTreeMap::new();
    for &date in &index.production_dates {
        let day = inputs
            .labor
            .day(date)
            .expect("production dates come from the labor calendar");
        let (fixed_cap, overtime_cap) = if day.is_fixed_day {
            (day.fixed_hours, params::MAX_OVERTIME_HOURS)
        } else {
            (0.0, 0.0)
        };
        let used = registry.add(
            problem,
            format!("labor_used@{date}"),
            variable().min(0.0).max(params::DAY_ACTIVE_HOURS_BIG_M),
        );
        let paid = registry.add(
            problem,
            format!("labor_paid@{date}"),
            variable().min(0.0).max(params::DAY_ACTIVE_HOURS_BIG_M),
        );
        let fixed_used = registry.add(
            problem,
            format!("labor_fixed@{date}"),
            variable().min(0.0).max(fixed_cap),
        );
        let overtime_used = registry.add(
            problem,
            format!("labor_overtime@{date}"),
            variable().min(0.0).max(overtime_cap),
        );
        let day_active = registry.add(
            problem,
            format!("day_active@{date}"),
            variable().binary(),
        );
        let product_active = catalog
            .product_refs()
            .map(|p| {
                (
                    p,
                    registry.add(
                        problem,
                        format!("product_active[{}]@{}", catalog.product_id(p), date),
                        variable().binary(),
                    ),
                )
            })
            .collect();
        labor.insert(
            date,
            LaborVars {
                used,
                paid,
                fixed_used,
                overtime_used,
                day_active,
                product_active,
            },
        );
    }

    DecisionVars {
        inventory,
        consumption,
        disposal,
        production,
        production_lookup,
        shipments,
        thaws,
        shortage,
        storage_pallets,
        truck_pallets,
        labor,
    }
}
