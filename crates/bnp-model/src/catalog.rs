//! Interned tables for nodes, products, legs, and trucks.
//!
//! The formulation works on small copyable refs into these tables rather
//! than on string ids or graph pointers; refs index into plain vectors,
//! which keeps index sets serializable and iteration cache-friendly.

use bnp_core::{
    NodeKind, PlanError, PlanInputs, PlanResult, StorageModes, TransportMode, TruckSchedule,
};
use hashbrown::HashMap;
use petgraph::algo::dijkstra;
use serde::{Deserialize, Serialize};

/// Index of a node in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(pub u32);

/// Index of a product in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductRef(pub u32);

/// Index of a leg in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LegRef(pub u32);

/// Index of a truck schedule in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TruckRef(pub u32);

#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub id: String,
    pub kind: NodeKind,
    pub storage: StorageModes,
    /// Transit days on the fastest path from manufacturing; `None` when the
    /// node is unreachable.
    pub earliest_arrival_days: Option<i64>,
    /// Whether any frozen-mode leg terminates here (a thaw source).
    pub has_frozen_in_leg: bool,
}

#[derive(Debug, Clone)]
pub struct LegEntry {
    pub name: String,
    pub from: NodeRef,
    pub to: NodeRef,
    pub transit_days: i64,
    pub mode: TransportMode,
    pub cost_per_unit: f64,
    pub capacity_units: Option<f64>,
}

/// Interned view of the network plus truck schedules.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub nodes: Vec<NodeEntry>,
    pub products: Vec<String>,
    pub legs: Vec<LegEntry>,
    pub trucks: Vec<TruckSchedule>,
    pub manufacturing: NodeRef,
    node_by_id: HashMap<String, NodeRef>,
    product_by_id: HashMap<String, ProductRef>,
}

impl Catalog {
    pub fn build(inputs: &PlanInputs) -> PlanResult<Self> {
        let network = &inputs.network;
        let mfg = inputs.network.manufacturing()?;
        let mfg_graph_idx = network
            .node_index(&mfg.id)
            .expect("manufacturing id resolves");

        // Fastest-path transit days from manufacturing to every node.
        let reach = dijkstra(&network.graph, mfg_graph_idx, None, |e| {
            e.weight().transit_days as i64
        });

        let mut nodes = Vec::with_capacity(network.num_locations());
        let mut node_by_id = HashMap::new();
        let mut graph_to_ref = HashMap::new();
        for graph_idx in network.graph.node_indices() {
            let loc = &network.graph[graph_idx];
            let node_ref = NodeRef(nodes.len() as u32);
            node_by_id.insert(loc.id.clone(), node_ref);
            graph_to_ref.insert(graph_idx, node_ref);
            nodes.push(NodeEntry {
                id: loc.id.clone(),
                kind: loc.kind,
                storage: loc.storage,
                earliest_arrival_days: reach.get(&graph_idx).copied(),
                has_frozen_in_leg: false,
            });
        }

        let mut legs = Vec::with_capacity(network.num_legs());
        for edge_idx in network.graph.edge_indices() {
            let leg = &network.graph[edge_idx];
            let (from_idx, to_idx) = network
                .graph
                .edge_endpoints(edge_idx)
                .expect("edge endpoints");
            let from = graph_to_ref[&from_idx];
            let to = graph_to_ref[&to_idx];
            let dest = &network.graph[to_idx];
            // A leg must be able to deliver in at least one origin state.
            if !dest.storage.frozen && !dest.storage.ambient {
                return Err(PlanError::Input(format!(
                    "invalid network: leg '{}' delivers to '{}', which stores nothing",
                    leg.name, dest.id
                )));
            }
            if leg.mode == TransportMode::Ambient && !dest.storage.ambient {
                return Err(PlanError::Input(format!(
                    "invalid network: ambient leg '{}' delivers to '{}', which has no ambient \
                     storage and no thaw path",
                    leg.name, dest.id
                )));
            }
            if leg.mode == TransportMode::Frozen {
                nodes[to.0 as usize].has_frozen_in_leg = true;
            }
            legs.push(LegEntry {
                name: leg.name.clone(),
                from,
                to,
                transit_days: leg.transit_days as i64,
                mode: leg.mode,
                cost_per_unit: leg.cost_per_unit,
                capacity_units: leg.capacity_units,
            });
        }

        let manufacturing = node_by_id[&mfg.id];

        let mut products = Vec::with_capacity(inputs.products.len());
        let mut product_by_id = HashMap::new();
        for product in &inputs.products {
            let product_ref = ProductRef(products.len() as u32);
            product_by_id.insert(product.id.clone(), product_ref);
            products.push(product.id.clone());
        }

        Ok(Self {
            nodes,
            products,
            legs,
            trucks: inputs.trucks.schedules.clone(),
            manufacturing,
            node_by_id,
            product_by_id,
        })
    }

    pub fn node(&self, r: NodeRef) -> &NodeEntry {
        &self.nodes[r.0 as usize]
    }

    pub fn node_id(&self, r: NodeRef) -> &str {
        &self.nodes[r.0 as usize].id
    }

    pub fn product_id(&self, r: ProductRef) -> &str {
        &self.products[r.0 as usize]
    }

    pub fn leg(&self, r: LegRef) -> &LegEntry {
        &self.legs[r.0 as usize]
    }

    pub fn truck(&self, r: TruckRef) -> &TruckSchedule {
        &self.trucks[r.0 as usize]
    }

    pub fn node_ref(&self, id: &str) -> Option<NodeRef> {
        self.node_by_id.get(id).copied()
    }

    pub fn product_ref(&self, id: &str) -> Option<ProductRef> {
        self.product_by_id.get(id).copied()
    }

    pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> {
        (0..self.nodes.len() as u32).map(NodeRef)
    }

    pub fn product_refs(&self) -> impl Iterator<Item = ProductRef> {
        (0..self.products.len() as u32).map(ProductRef)
    }

    pub fn leg_refs(&self) -> impl Iterator<Item = LegRef> {
        (0..self.legs.len() as u32).map(LegRef)
    }

    pub fn truck_refs(&self) -> impl Iterator<Item = TruckRef> {
        (0..self.trucks.len() as u32).map(TruckRef)
    }

    pub fn is_manufacturing(&self, r: NodeRef) -> bool {
        r == self.manufacturing
    }
}
