//! # bnp-core: Bread Network Data Model
//!
//! Provides the typed input model for integrated production and distribution
//! planning over a perishable bread network: one manufacturing site, an
//! external frozen buffer, regional hubs, and breadrooms.
//!
//! ## Design Philosophy
//!
//! The route network is a **directed graph** where:
//! - **Nodes**: locations (manufacturing, hub, storage, breadroom)
//! - **Edges**: route legs with transit days, a transport mode, and a
//!   per-unit cost
//!
//! The graph-based representation enables:
//! - Reachability and earliest-arrival queries by BFS over transit days
//! - Type-safe access to locations by string id
//! - Multiple legs between the same pair of locations (e.g. a frozen and an
//!   ambient service on the same corridor)
//!
//! Everything else in the input bundle is calendar- or table-shaped:
//! demand forecast entries, labor days, truck schedules, the priced cost
//! structure, and the initial inventory snapshot.
//!
//! ## Modules
//!
//! - [`calendar`] - Labor days and the labor calendar
//! - [`costs`] - The priced cost structure
//! - [`diagnostics`] - Issue collection for input validation
//! - [`error`] - Unified [`PlanError`] type
//! - [`forecast`] - Demand forecast entries
//! - [`horizon`] - The inclusive planning-date span
//! - [`inputs`] - The assembled [`PlanInputs`] bundle and its validation
//! - [`inventory`] - Initial inventory snapshots and cohort stock records
//! - [`params`] - Physical and labor parameters of the network
//! - [`state`] - Storage states, transport modes, and state transitions
//! - [`trucks`] - Truck schedules and loading policies

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod calendar;
pub mod costs;
pub mod diagnostics;
pub mod error;
pub mod forecast;
pub mod horizon;
pub mod inputs;
pub mod inventory;
pub mod params;
pub mod state;
pub mod trucks;

pub use calendar::{LaborCalendar, LaborDay};
pub use costs::CostStructure;
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{PlanError, PlanResult};
pub use forecast::{Forecast, ForecastEntry};
pub use horizon::Horizon;
pub use inputs::{PlanInputs, PlanInputsFile};
pub use inventory::{CohortStock, InTransitStock, InitialInventory, InitialStock, InventorySnapshot};
pub use state::{transit_transition, EntryRule, StorageModes, StorageState, TransportMode};
pub use trucks::{DepartureWindow, LoadingPolicy, TruckSchedule, TruckSchedules};

/// Kind of a location in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The (unique) manufacturing site.
    Manufacturing,
    /// A regional hub.
    Hub,
    /// An external storage facility (frozen buffer).
    Storage,
    /// A breadroom (final demand point).
    Breadroom,
}

/// A location in the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Unique string id (e.g. "MFG", "HUB-NSW", "BR-6104").
    pub id: String,
    pub kind: NodeKind,
    /// Which storage states this location can hold.
    pub storage: StorageModes,
    /// Optional storage capacity in units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_units: Option<f64>,
}

/// A directed route leg between two locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteLeg {
    pub name: String,
    pub from: String,
    pub to: String,
    pub transit_days: u32,
    pub mode: TransportMode,
    pub cost_per_unit: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_units: Option<f64>,
}

/// A product (SKU). Quantities are in units; `case_size` units per case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default = "Product::default_case_size")]
    pub case_size: u32,
}

impl Product {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            case_size: Self::default_case_size(),
        }
    }

    fn default_case_size() -> u32 {
        params::CASE_SIZE_UNITS as u32
    }
}

/// The route network: locations connected by directed legs.
///
/// The graph field is public, mirroring the rest of the toolkit; helper
/// methods keep the id index consistent, so prefer [`Network::add_location`]
/// and [`Network::add_leg`] over raw graph mutation.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: DiGraph<Location, RouteLeg>,
    index: HashMap<String, NodeIndex>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location. Errors if the id is already present.
    pub fn add_location(&mut self, location: Location) -> PlanResult<NodeIndex> {
        if self.index.contains_key(&location.id) {
            return Err(PlanError::Input(format!(
                "duplicate location id '{}'",
                location.id
            )));
        }
        let id = location.id.clone();
        let idx = self.graph.add_node(location);
        self.index.insert(id, idx);
        Ok(idx)
    }

    /// Add a directed leg. Both endpoints must already exist.
    pub fn add_leg(&mut self, leg: RouteLeg) -> PlanResult<EdgeIndex> {
        let from = self.node_index(&leg.from).ok_or_else(|| {
            PlanError::Input(format!("leg '{}': unknown origin '{}'", leg.name, leg.from))
        })?;
        let to = self.node_index(&leg.to).ok_or_else(|| {
            PlanError::Input(format!(
                "leg '{}': unknown destination '{}'",
                leg.name, leg.to
            ))
        })?;
        Ok(self.graph.add_edge(from, to, leg))
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    /// The unique manufacturing site.
    pub fn manufacturing(&self) -> PlanResult<&Location> {
        let mut found = None;
        for idx in self.graph.node_indices() {
            if self.graph[idx].kind == NodeKind::Manufacturing {
                if found.is_some() {
                    return Err(PlanError::Input(
                        "network has more than one manufacturing site".into(),
                    ));
                }
                found = Some(&self.graph[idx]);
            }
        }
        found.ok_or_else(|| PlanError::Input("network has no manufacturing site".into()))
    }

    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    pub fn legs(&self) -> impl Iterator<Item = &RouteLeg> {
        self.graph.edge_indices().map(|idx| &self.graph[idx])
    }

    pub fn num_locations(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_legs(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mfg() -> Location {
        Location {
            id: "MFG".into(),
            kind: NodeKind::Manufacturing,
            storage: StorageModes {
                frozen: false,
                ambient: true,
            },
            capacity_units: None,
        }
    }

    fn hub(id: &str) -> Location {
        Location {
            id: id.into(),
            kind: NodeKind::Hub,
            storage: StorageModes {
                frozen: false,
                ambient: true,
            },
            capacity_units: None,
        }
    }

    #[test]
    fn test_add_location_and_lookup() {
        let mut network = Network::new();
        network.add_location(mfg()).unwrap();
        network.add_location(hub("HUB-NSW")).unwrap();

        assert_eq!(network.num_locations(), 2);
        assert_eq!(network.location("MFG").unwrap().kind, NodeKind::Manufacturing);
        assert!(network.location("HUB-VIC").is_none());
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let mut network = Network::new();
        network.add_location(mfg()).unwrap();
        let err = network.add_location(mfg()).unwrap_err();
        assert!(err.to_string().contains("duplicate location id"));
    }

    #[test]
    fn test_leg_requires_known_endpoints() {
        let mut network = Network::new();
        network.add_location(mfg()).unwrap();

        let err = network
            .add_leg(RouteLeg {
                name: "MFG->HUB-NSW".into(),
                from: "MFG".into(),
                to: "HUB-NSW".into(),
                transit_days: 1,
                mode: TransportMode::Ambient,
                cost_per_unit: 0.05,
                capacity_units: None,
            })
            .unwrap_err();
        assert!(err.to_string().contains("unknown destination"));
    }

    #[test]
    fn test_unique_manufacturing() {
        let mut network = Network::new();
        network.add_location(hub("HUB-NSW")).unwrap();
        assert!(network.manufacturing().is_err());

        network.add_location(mfg()).unwrap();
        assert_eq!(network.manufacturing().unwrap().id, "MFG");
    }
}
