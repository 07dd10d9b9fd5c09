//! The validated solution schema: the contract between the planning core
//! and every downstream consumer.
//!
//! Tuple keys serialize as JSON arrays and dates as ISO-8601; maps with
//! tuple keys serialize as sequences of `[key, value]` pairs (JSON objects
//! cannot carry array keys). Truck ids are strings, never integer indices.
//! Exactly one inventory representation is populated, selected by the
//! batch-tracking option and tagged in the serialized form.

use bnp_core::{DiagnosticIssue, StorageState};
use bnp_solve::SolveStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialize a map with tuple keys as a sequence of `[key, value]` pairs.
pub mod serde_pairs {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<K, V, S>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize + Ord,
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, V, D>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
    where
        K: DeserializeOwned + Ord,
        V: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, V)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

/// Which formulation produced the solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    SlidingWindow,
    UnifiedCohort,
}

impl ModelType {
    pub fn file_tag(self) -> &'static str {
        match self {
            ModelType::SlidingWindow => "SLIDING_WINDOW",
            ModelType::UnifiedCohort => "UNIFIED_COHORT",
        }
    }
}

/// Terminal status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    Optimal,
    FeasibleSuboptimal,
    Infeasible,
    CancelledPartial,
    TimeoutPartial,
}

impl SolutionStatus {
    pub fn has_plan(self) -> bool {
        !matches!(self, SolutionStatus::Infeasible)
    }
}

/// `(node, product, date)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductionKey(pub String, pub String, pub NaiveDate);

/// `(node, product, date)` for demand-side maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DemandKey(pub String, pub String, pub NaiveDate);

/// `(origin, destination, product, delivery_date)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipmentKey(pub String, pub String, pub String, pub NaiveDate);

/// `(node, product, state, date)` for aggregate inventory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateInventoryKey(pub String, pub String, pub StorageState, pub NaiveDate);

/// `(node, product, prod_date, entry_date, state, date)` for cohort
/// inventory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CohortInventoryKey(
    pub String,
    pub String,
    pub NaiveDate,
    pub NaiveDate,
    pub StorageState,
    pub NaiveDate,
);

/// `(node, product, prod_date, date)` for state-transition flows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowKey(pub String, pub String, pub NaiveDate, pub NaiveDate);

/// One delivered shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentResult {
    pub origin: String,
    pub destination: String,
    pub product: String,
    pub truck_id: String,
    pub depart_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub units: f64,
    /// State on arrival.
    pub state: StorageState,
    pub prod_date: NaiveDate,
    /// State-entry date on arrival (fresh on thaw-on-arrival).
    pub entry_date: NaiveDate,
}

/// Hours on one production date.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LaborHoursBreakdown {
    pub used: f64,
    pub paid: f64,
    pub fixed: f64,
    pub overtime: f64,
}

/// Dollar cost per component. The freshness steering term is not a cost
/// and is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TotalCostBreakdown {
    pub labor: f64,
    pub production: f64,
    pub transport: f64,
    pub holding: f64,
    pub changeover: f64,
    pub shortage: f64,
    pub waste: f64,
}

impl TotalCostBreakdown {
    pub fn total(&self) -> f64 {
        self.labor
            + self.production
            + self.transport
            + self.holding
            + self.changeover
            + self.shortage
            + self.waste
    }

    pub fn add(&mut self, other: &TotalCostBreakdown) {
        self.labor += other.labor;
        self.production += other.production;
        self.transport += other.transport;
        self.holding += other.holding;
        self.changeover += other.changeover;
        self.shortage += other.shortage;
        self.waste += other.waste;
    }
}

/// Inventory in exactly one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum InventoryReport {
    Aggregate {
        #[serde(with = "serde_pairs")]
        entries: BTreeMap<AggregateInventoryKey, f64>,
    },
    Cohort {
        #[serde(with = "serde_pairs")]
        entries: BTreeMap<CohortInventoryKey, f64>,
    },
}

/// Tag of the populated inventory representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryFormat {
    Aggregate,
    Cohort,
}

impl InventoryReport {
    pub fn format(&self) -> InventoryFormat {
        match self {
            InventoryReport::Aggregate { .. } => InventoryFormat::Aggregate,
            InventoryReport::Cohort { .. } => InventoryFormat::Cohort,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            InventoryReport::Aggregate { entries } => entries.len(),
            InventoryReport::Cohort { entries } => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Batch-level demand allocation (after the FEFO post-pass).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConsumption {
    pub node: String,
    pub product: String,
    pub prod_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub state: StorageState,
    pub date: NaiveDate,
    pub units: f64,
    /// Units this cohort could have supplied on `date` (consumed plus
    /// carried inventory). Fixed at extraction; the FEFO pass reallocates
    /// `units` within this bound and is therefore idempotent.
    pub available_units: f64,
}

/// Per-window solve record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub commit_through: NaiveDate,
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub mip_gap: Option<f64>,
    pub wall_time_seconds: f64,
}

/// The validated planning solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSolution {
    pub model_type: ModelType,
    pub status: SolutionStatus,
    pub total_cost: f64,
    pub costs: TotalCostBreakdown,
    #[serde(with = "serde_pairs")]
    pub production_by_date_product: BTreeMap<ProductionKey, f64>,
    pub shipments: Vec<ShipmentResult>,
    #[serde(with = "serde_pairs")]
    pub truck_assignments: BTreeMap<ShipmentKey, String>,
    pub labor_hours_by_date: BTreeMap<NaiveDate, LaborHoursBreakdown>,
    pub inventory: InventoryReport,
    #[serde(with = "serde_pairs")]
    pub demand_consumed: BTreeMap<DemandKey, f64>,
    #[serde(with = "serde_pairs")]
    pub shortages: BTreeMap<DemandKey, f64>,
    /// Stranded stock written off, by node, product, and date.
    #[serde(with = "serde_pairs")]
    pub disposals: BTreeMap<DemandKey, f64>,
    #[serde(with = "serde_pairs")]
    pub thaw_flows: BTreeMap<FlowKey, f64>,
    #[serde(with = "serde_pairs")]
    pub freeze_flows: BTreeMap<FlowKey, f64>,
    /// Batch-level allocation behind `demand_consumed`.
    pub cohort_consumption: Vec<CohortConsumption>,
    pub windows: Vec<WindowRecord>,
    pub diagnostics: Vec<DiagnosticIssue>,
}

impl OptimizationSolution {
    pub fn get_inventory_format(&self) -> InventoryFormat {
        self.inventory.format()
    }

    /// Demand fill rate over the planned horizon, in [0, 1].
    pub fn fill_rate(&self) -> f64 {
        let consumed: f64 = self.demand_consumed.values().sum();
        let short: f64 = self.shortages.values().sum();
        let demand = consumed + short;
        if demand <= 0.0 {
            1.0
        } else {
            consumed / demand
        }
    }

    pub fn total_production_units(&self) -> f64 {
        self.production_by_date_product.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn minimal_solution() -> OptimizationSolution {
        let mut production = BTreeMap::new();
        production.insert(
            ProductionKey("MFG".into(), "SKU-WHITE".into(), d("2026-06-01")),
            1000.0,
        );
        let mut labor = BTreeMap::new();
        labor.insert(
            d("2026-06-01"),
            LaborHoursBreakdown {
                used: 2.46,
                paid: 2.46,
                fixed: 2.46,
                overtime: 0.0,
            },
        );
        let costs = TotalCostBreakdown {
            labor: 812.31,
            production: 1200.0,
            ..Default::default()
        };
        OptimizationSolution {
            model_type: ModelType::SlidingWindow,
            status: SolutionStatus::Optimal,
            total_cost: costs.total(),
            costs,
            production_by_date_product: production,
            shipments: Vec::new(),
            truck_assignments: BTreeMap::new(),
            labor_hours_by_date: labor,
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
    fn test_serialization_round_trip() {
        let solution = minimal_solution();
        let json = serde_json::to_string_pretty(&solution).unwrap();
        let parsed: OptimizationSolution = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, solution);
    }

    #[test]
    fn test_tuple_keys_serialize_as_arrays() {
        let solution = minimal_solution();
        let json = serde_json::to_value(&solution).unwrap();
        let entry = &json["production_by_date_product"][0];
        assert_eq!(entry[0][0], "MFG");
        assert_eq!(entry[0][2], "2026-06-01");
        assert_eq!(entry[1], 1000.0);
    }

    #[test]
    fn test_inventory_format_tag() {
        let solution = minimal_solution();
        assert_eq!(solution.get_inventory_format(), InventoryFormat::Cohort);
        let json = serde_json::to_value(&solution).unwrap();
        assert_eq!(json["inventory"]["format"], "cohort");
    }

    #[test]
    fn test_fill_rate_with_no_demand_is_full() {
        assert_eq!(minimal_solution().fill_rate(), 1.0);
    }
}
