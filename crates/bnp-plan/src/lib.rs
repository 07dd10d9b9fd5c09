//! # bnp-plan: Sliding-Window Orchestrator and Solution Schema
//!
//! Owns the outer planning loop: horizon partitioning, per-window model
//! build and solve, boundary-inventory handoff, warmstart propagation, and
//! aggregation into one validated [`OptimizationSolution`].
//!
//! ## Pipeline
//!
//! ```text
//! PlanInputs -> indices -> constraints + objective -> solver
//!                  ^                                    |
//!                  |   terminal inventory + hints       v
//!                  +--------- window loop <------- extraction
//! ```
//!
//! Windows solve strictly in order; committed dates are never revised by a
//! later window. The FEFO post-pass canonicalizes the batch-level demand
//! allocation after the last window. Solutions pass three fail-fast
//! validation layers before they are returned or persisted.

pub mod cancel;
pub mod config;
pub mod extract;
pub mod fefo;
pub mod persist;
pub mod schema;
pub mod validate;
pub mod window;

pub use cancel::CancellationToken;
pub use config::{PlannerConfig, WarmstartMode};
pub use extract::{extract_window, WindowExtract};
pub use fefo::fefo_allocate;
pub use persist::{input_hashes, load_solve, save_solve, solve_path, SolveFile, SolveMetadata};
pub use schema::{
    AggregateInventoryKey, CohortConsumption, CohortInventoryKey, DemandKey, FlowKey,
    InventoryFormat, InventoryReport, LaborHoursBreakdown, ModelType, OptimizationSolution,
    ProductionKey, ShipmentKey, ShipmentResult, SolutionStatus, TotalCostBreakdown, WindowRecord,
};
pub use validate::{validate_solution, SolutionError};
pub use window::{partition_horizon, plan_horizon, plan_horizon_cancellable, WindowSpan, WindowState};
