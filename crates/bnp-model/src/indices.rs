//! Sparse index construction over the cohort network.
//!
//! A cohort is a physically distinct batch: `(node, product, prod_date,
//! entry_date, state)` observed on a date. A dense index over those five
//! dimensions would be millions of entries on a multi-month horizon;
//! admission keeps only cohorts that are reachable (the node lies on a path
//! from manufacturing within the cohort's age), alive (age in state within
//! the shelf-life bound), and storable (the node supports the state).
//!
//! The builder works lineage-first: a **lineage** is a cohort identity
//! `(node, product, prod_date, entry_date, state)`; each admitted lineage is
//! then unrolled over its feasible date range. Lineages come from two
//! sources: in-horizon production (unrolled over reachable nodes and state
//! transitions) and the initial-inventory snapshot.

use crate::catalog::{Catalog, LegRef, NodeRef, ProductRef, TruckRef};
use bnp_core::{
    transit_transition, EntryRule, Horizon, InventorySnapshot, PlanError, PlanInputs, PlanResult,
    StorageState,
};
use chrono::{Duration, NaiveDate};
use hashbrown::HashMap;
use tracing::debug;

/// One element of the inventory index: a cohort observed on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CohortKey {
    pub node: NodeRef,
    pub product: ProductRef,
    pub prod_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub date: NaiveDate,
    pub state: StorageState,
}

impl CohortKey {
    /// Age in the current state, days.
    pub fn age_in_state(&self) -> i64 {
        (self.date - self.entry_date).num_days()
    }

    /// Calendar age since production, days.
    pub fn calendar_age(&self) -> i64 {
        (self.date - self.prod_date).num_days()
    }

    /// The same cohort one day earlier.
    pub fn previous(&self) -> CohortKey {
        CohortKey {
            date: self.date - Duration::days(1),
            ..*self
        }
    }
}

/// A scheduled truck leaving on a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TruckDeparture {
    pub truck: TruckRef,
    pub date: NaiveDate,
}

/// An admitted shipment decision: one origin cohort riding one truck over
/// one leg. Arrival state and entry date are resolved at admission.
#[derive(Debug, Clone, Copy)]
pub struct ShipmentSpec {
    pub departure: usize,
    pub leg: LegRef,
    pub dest: NodeRef,
    pub product: ProductRef,
    pub origin_cohort: usize,
    pub arrival_cohort: usize,
    pub depart_date: NaiveDate,
    pub deliver_date: NaiveDate,
    pub arrival_state: StorageState,
    pub arrival_entry: NaiveDate,
}

/// An admitted in-place thaw: a frozen cohort becoming a thawed cohort with
/// a fresh entry date, at a node with both frozen and ambient storage.
#[derive(Debug, Clone, Copy)]
pub struct ThawSpec {
    pub frozen_cohort: usize,
    pub thawed_cohort: usize,
    pub date: NaiveDate,
}

/// A demand row: forecast units at a node for a product on a date.
#[derive(Debug, Clone)]
pub struct DemandRow {
    pub node: NodeRef,
    pub product: ProductRef,
    pub date: NaiveDate,
    pub units: f64,
    /// Cohorts this demand may draw from (ambient-tempered states only).
    pub eligible_cohorts: Vec<usize>,
}

/// Pallet aggregation key: cohort inventory grouped over entry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PalletKey {
    pub node: NodeRef,
    pub product: ProductRef,
    pub prod_date: NaiveDate,
    pub date: NaiveDate,
    pub state: StorageState,
}

/// The complete sparse index set for one model build.
#[derive(Debug, Clone)]
pub struct IndexSet {
    pub horizon: Horizon,
    pub cohorts: Vec<CohortKey>,
    /// Initial units entering the balance at each cohort's first date.
    pub initial_units: Vec<f64>,
    pub cohort_lookup: HashMap<CohortKey, usize>,
    /// Dates with a labor-calendar entry: the permissible production days.
    pub production_dates: Vec<NaiveDate>,
    /// One entry per (product, production date).
    pub production: Vec<(ProductRef, NaiveDate)>,
    pub shipments: Vec<ShipmentSpec>,
    pub truck_departures: Vec<TruckDeparture>,
    pub thaws: Vec<ThawSpec>,
    pub demand_rows: Vec<DemandRow>,
    pub pallet_groups: Vec<PalletKey>,
    /// Pallet group of each cohort, parallel to `cohorts`.
    pub cohort_pallet: Vec<usize>,
}

impl IndexSet {
    pub fn cohort(&self, idx: usize) -> &CohortKey {
        &self.cohorts[idx]
    }

    pub fn num_variables_estimate(&self) -> usize {
        self.cohorts.len() * 2 + self.shipments.len() + self.production.len() + self.thaws.len()
    }
}

/// Departure-side horizon test. Both the departure and the arrival side of
/// mass balance are gated on this one predicate, so a shipment is either
/// wholly inside the window or absent: pre-horizon departures cannot appear
/// as phantom arrivals.
pub fn is_within_horizon(horizon: &Horizon, departure_date: NaiveDate) -> bool {
    horizon.contains(departure_date)
}

/// Lineage identity plus any snapshot units it starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LineageKey {
    node: NodeRef,
    product: ProductRef,
    prod_date: NaiveDate,
    entry_date: NaiveDate,
    state: StorageState,
}

/// Exogenous units seeding a lineage: stock on hand at the horizon start
/// and scheduled in-transit arrivals.
#[derive(Debug, Clone, Default)]
struct SeedUnits {
    on_hand: f64,
    arrivals: Vec<(NaiveDate, f64)>,
}

/// Build every index set for one window.
pub fn build_indices(
    catalog: &Catalog,
    inputs: &PlanInputs,
    horizon: Horizon,
    snapshot: &InventorySnapshot,
) -> PlanResult<IndexSet> {
    let production_dates: Vec<NaiveDate> = horizon
        .dates()
        .filter(|d| inputs.labor.day(*d).is_some())
        .collect();
    if production_dates.is_empty() {
        return Err(PlanError::Model(format!(
            "empty production set: no labor days inside {}..={}",
            horizon.start, horizon.end
        )));
    }

    let mut lineages: HashMap<LineageKey, SeedUnits> = HashMap::new();

    // Snapshot lineages carry their units into the first balance date.
    for stock in &snapshot.cohorts {
        let node = catalog.node_ref(&stock.location).ok_or_else(|| {
            PlanError::Input(format!(
                "initial inventory at unknown location '{}'",
                stock.location
            ))
        })?;
        let product = catalog.product_ref(&stock.product).ok_or_else(|| {
            PlanError::Input(format!(
                "initial inventory of unknown product '{}'",
                stock.product
            ))
        })?;
        if (horizon.start - stock.entry_date).num_days() > stock.state.shelf_life_days() {
            debug!(
                location = %stock.location,
                product = %stock.product,
                state = %stock.state,
                units = stock.units,
                "snapshot cohort already expired at horizon start; dropped"
            );
            continue;
        }
        lineages
            .entry(LineageKey {
                node,
                product,
                prod_date: stock.prod_date,
                entry_date: stock.entry_date,
                state: stock.state,
            })
            .or_default()
            .on_hand += stock.units;
    }

    // Cargo dispatched before the horizon materializes at its destination
    // on the arrival date; this is the in-transit half of the handoff.
    for cargo in &snapshot.in_transit {
        let node = catalog.node_ref(&cargo.destination).ok_or_else(|| {
            PlanError::Input(format!(
                "in-transit cargo to unknown location '{}'",
                cargo.destination
            ))
        })?;
        let product = catalog.product_ref(&cargo.product).ok_or_else(|| {
            PlanError::Input(format!(
                "in-transit cargo of unknown product '{}'",
                cargo.product
            ))
        })?;
        if (cargo.arrival_date - cargo.entry_date).num_days() > cargo.state.shelf_life_days()
            || cargo.arrival_date > horizon.end
        {
            debug!(
                destination = %cargo.destination,
                product = %cargo.product,
                units = cargo.units,
                "in-transit cargo expires before arrival or lands past the horizon; dropped"
            );
            continue;
        }
        lineages
            .entry(LineageKey {
                node,
                product,
                prod_date: cargo.prod_date,
                entry_date: cargo.entry_date,
                state: cargo.state,
            })
            .or_default()
            .arrivals
            .push((cargo.arrival_date, cargo.units));
    }

    // Production lineages, unrolled over reachable nodes and admissible
    // state transitions.
    let ambient_life = StorageState::Ambient.shelf_life_days();
    for product in catalog.product_refs() {
        for &prod_date in &production_dates {
            for node_ref in catalog.node_refs() {
                let node = catalog.node(node_ref);
                let Some(reach) = node.earliest_arrival_days else {
                    continue;
                };
                // The node cannot see this batch before prod_date + reach;
                // no date in the horizon qualifies if that is already past
                // the end.
                if prod_date + Duration::days(reach) > horizon.end {
                    continue;
                }
                if node.storage.ambient {
                    lineages
                        .entry(LineageKey {
                            node: node_ref,
                            product,
                            prod_date,
                            entry_date: prod_date,
                            state: StorageState::Ambient,
                        })
                        .or_default();
                }
                if node.storage.frozen && node.has_frozen_in_leg {
                    // Freezing happens at loading onto a frozen leg, while
                    // the batch is still ambient-alive.
                    let last_entry = (prod_date + Duration::days(ambient_life)).min(horizon.end);
                    let mut entry = prod_date;
                    while entry <= last_entry {
                        lineages
                            .entry(LineageKey {
                                node: node_ref,
                                product,
                                prod_date,
                                entry_date: entry,
                                state: StorageState::Frozen,
                            })
                            .or_default();
                        entry += Duration::days(1);
                    }
                }
                if node.storage.ambient && node.has_frozen_in_leg {
                    // Thawed entries start at delivery or at an in-place
                    // thaw, never before the batch could first travel.
                    let first_entry = (prod_date + Duration::days(reach)).max(horizon.start);
                    let mut entry = first_entry;
                    while entry <= horizon.end {
                        lineages
                            .entry(LineageKey {
                                node: node_ref,
                                product,
                                prod_date,
                                entry_date: entry,
                                state: StorageState::Thawed,
                            })
                            .or_default();
                        entry += Duration::days(1);
                    }
                }
            }
        }
    }

    // Unroll lineages over their feasible date ranges.
    let mut cohorts = Vec::new();
    let mut initial_units = Vec::new();
    let mut cohort_lookup: HashMap<CohortKey, usize> = HashMap::new();
    let mut at_node_date: HashMap<(NodeRef, ProductRef, NaiveDate, StorageState), Vec<usize>> =
        HashMap::new();

    let mut lineage_list: Vec<(LineageKey, SeedUnits)> = lineages.into_iter().collect();
    lineage_list.sort_by_key(|(k, _)| (k.node, k.product, k.prod_date, k.entry_date, k.state));

    for (lineage, seed) in lineage_list {
        let node = catalog.node(lineage.node);
        let reach = node.earliest_arrival_days.unwrap_or(0);
        let reachable_from = if seed.on_hand > 0.0 {
            // Snapshot stock is already on hand; reachability does not apply.
            horizon.start
        } else if let Some(first_arrival) = seed.arrivals.iter().map(|(d, _)| *d).min() {
            first_arrival
        } else {
            lineage.prod_date + Duration::days(reach)
        };
        let first = lineage.entry_date.max(horizon.start).max(reachable_from);
        let last = (lineage.entry_date + Duration::days(lineage.state.shelf_life_days()))
            .min(horizon.end);
        if first > last {
            continue;
        }
        let mut date = first;
        while date <= last {
            let key = CohortKey {
                node: lineage.node,
                product: lineage.product,
                prod_date: lineage.prod_date,
                entry_date: lineage.entry_date,
                date,
                state: lineage.state,
            };
            let idx = cohorts.len();
            cohorts.push(key);
            let mut exogenous = if date == first { seed.on_hand } else { 0.0 };
            for (arrival_date, units) in &seed.arrivals {
                if *arrival_date == date {
                    exogenous += units;
                }
            }
            initial_units.push(exogenous);
            cohort_lookup.insert(key, idx);
            at_node_date
                .entry((key.node, key.product, key.date, key.state))
                .or_default()
                .push(idx);
            date += Duration::days(1);
        }
    }

    // Shipment admission: truck departures inside the horizon only.
    let mut shipments = Vec::new();
    let mut truck_departures: Vec<TruckDeparture> = Vec::new();
    let mut departure_lookup: HashMap<(TruckRef, NaiveDate), usize> = HashMap::new();

    for truck_ref in catalog.truck_refs() {
        let truck = catalog.truck(truck_ref);
        let origin = match catalog.node_ref(&truck.origin) {
            Some(n) => n,
            None => {
                return Err(PlanError::Input(format!(
                    "truck '{}' departs from unknown location '{}'",
                    truck.id, truck.origin
                )))
            }
        };
        for depart_date in horizon.dates() {
            if !truck.runs_on(depart_date) || !is_within_horizon(&horizon, depart_date) {
                continue;
            }
            for stop in &truck.stops {
                let dest_ref = match catalog.node_ref(stop) {
                    Some(n) => n,
                    None => {
                        return Err(PlanError::Input(format!(
                            "truck '{}' stops at unknown location '{stop}'",
                            truck.id
                        )))
                    }
                };
                let dest = catalog.node(dest_ref);
                for leg_ref in catalog.leg_refs() {
                    let leg = catalog.leg(leg_ref);
                    if leg.from != origin || leg.to != dest_ref {
                        continue;
                    }
                    let deliver_date = depart_date + Duration::days(leg.transit_days);
                    if deliver_date > horizon.end {
                        continue;
                    }
                    for product in catalog.product_refs() {
                        for origin_state in [
                            StorageState::Ambient,
                            StorageState::Frozen,
                            StorageState::Thawed,
                        ] {
                            let Some((arrival_state, rule)) =
                                transit_transition(leg.mode, origin_state, &dest.storage)
                            else {
                                continue;
                            };
                            let Some(origin_cohorts) =
                                at_node_date.get(&(origin, product, depart_date, origin_state))
                            else {
                                continue;
                            };
                            for &oc_idx in origin_cohorts {
                                let oc = cohorts[oc_idx];
                                if catalog.is_manufacturing(origin)
                                    && oc.prod_date > truck.latest_loadable_production(depart_date)
                                {
                                    continue;
                                }
                                let arrival_entry = match rule {
                                    EntryRule::Keep => oc.entry_date,
                                    EntryRule::AtDeparture => depart_date,
                                    EntryRule::AtArrival => deliver_date,
                                };
                                let arrival_key = CohortKey {
                                    node: dest_ref,
                                    product,
                                    prod_date: oc.prod_date,
                                    entry_date: arrival_entry,
                                    date: deliver_date,
                                    state: arrival_state,
                                };
                                let Some(&arrival_idx) = cohort_lookup.get(&arrival_key) else {
                                    continue;
                                };
                                let departure = *departure_lookup
                                    .entry((truck_ref, depart_date))
                                    .or_insert_with(|| {
                                        truck_departures.push(TruckDeparture {
                                            truck: truck_ref,
                                            date: depart_date,
                                        });
                                        truck_departures.len() - 1
                                    });
                                shipments.push(ShipmentSpec {
                                    departure,
                                    leg: leg_ref,
                                    dest: dest_ref,
                                    product,
                                    origin_cohort: oc_idx,
                                    arrival_cohort: arrival_idx,
                                    depart_date,
                                    deliver_date,
                                    arrival_state,
                                    arrival_entry,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    // In-place thaws at nodes holding frozen stock with ambient storage.
    let mut thaws = Vec::new();
    for (idx, key) in cohorts.iter().enumerate() {
        if key.state != StorageState::Frozen {
            continue;
        }
        let node = catalog.node(key.node);
        if !node.storage.ambient {
            continue;
        }
        let thawed_key = CohortKey {
            entry_date: key.date,
            state: StorageState::Thawed,
            ..*key
        };
        if let Some(&thawed_idx) = cohort_lookup.get(&thawed_key) {
            thaws.push(ThawSpec {
                frozen_cohort: idx,
                thawed_cohort: thawed_idx,
                date: key.date,
            });
        }
    }

    // Demand rows, with their eligible cohort draws.
    let mut demand_units: HashMap<(NodeRef, ProductRef, NaiveDate), f64> = HashMap::new();
    for entry in &inputs.forecast.entries {
        if !horizon.contains(entry.date) || entry.units <= 0.0 {
            continue;
        }
        let node = catalog.node_ref(&entry.location).ok_or_else(|| {
            PlanError::Input(format!("forecast at unknown location '{}'", entry.location))
        })?;
        let product = catalog.product_ref(&entry.product).ok_or_else(|| {
            PlanError::Input(format!("forecast for unknown product '{}'", entry.product))
        })?;
        *demand_units.entry((node, product, entry.date)).or_insert(0.0) += entry.units;
    }
    let mut demand_rows: Vec<DemandRow> = demand_units
        .into_iter()
        .map(|((node, product, date), units)| {
            let mut eligible_cohorts = Vec::new();
            for state in [StorageState::Ambient, StorageState::Thawed] {
                if let Some(idxs) = at_node_date.get(&(node, product, date, state)) {
                    eligible_cohorts.extend_from_slice(idxs);
                }
            }
            DemandRow {
                node,
                product,
                date,
                units,
                eligible_cohorts,
            }
        })
        .collect();
    demand_rows.sort_by_key(|r| (r.node, r.product, r.date));

    // Pallet groups aggregate cohort inventory over entry date.
    let mut pallet_groups: Vec<PalletKey> = Vec::new();
    let mut pallet_lookup: HashMap<PalletKey, usize> = HashMap::new();
    let mut cohort_pallet = Vec::with_capacity(cohorts.len());
    for key in &cohorts {
        let pallet_key = PalletKey {
            node: key.node,
            product: key.product,
            prod_date: key.prod_date,
            date: key.date,
            state: key.state,
        };
        let idx = *pallet_lookup.entry(pallet_key).or_insert_with(|| {
            pallet_groups.push(pallet_key);
            pallet_groups.len() - 1
        });
        cohort_pallet.push(idx);
    }

    let index = IndexSet {
        horizon,
        cohorts,
        initial_units,
        cohort_lookup,
        production_dates: production_dates.clone(),
        production: catalog
            .product_refs()
            .flat_map(|p| production_dates.iter().map(move |d| (p, *d)))
            .collect(),
        shipments,
        truck_departures,
        thaws,
        demand_rows,
        pallet_groups,
        cohort_pallet,
    };

    debug!(
        cohorts = index.cohorts.len(),
        shipments = index.shipments.len(),
        thaws = index.thaws.len(),
        demand_rows = index.demand_rows.len(),
        pallet_groups = index.pallet_groups.len(),
        "indices built"
    );

    Ok(index)
}
