//! Model assembly: indices, variables, constraints, objective.

use crate::catalog::Catalog;
use crate::constraints::build_constraints;
use crate::indices::{build_indices, IndexSet};
use crate::objective::build_objective;
use crate::variables::{create_variables, BuildOptions, DecisionVars, VarRegistry};
use bnp_core::{Horizon, InventorySnapshot, PlanInputs, PlanResult};
use good_lp::{constraint, variables, Constraint, Expression, ProblemVariables};
use tracing::{debug, info};

/// Clamp a named variable to a committed value (fixed-prefix handling in
/// the sliding-window orchestrator). Names that no longer resolve in the
/// new window are skipped.
#[derive(Debug, Clone)]
pub struct VarClamp {
    pub name: String,
    pub value: f64,
}

/// A fully assembled, not yet solved model.
pub struct PlanModel {
    pub index: IndexSet,
    pub vars: DecisionVars,
    pub registry: VarRegistry,
    pub problem: ProblemVariables,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
}

impl PlanModel {
    pub fn num_variables(&self) -> usize {
        self.registry.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

/// Build the complete model for one window.
pub fn build_model(
    catalog: &Catalog,
    inputs: &PlanInputs,
    horizon: Horizon,
    snapshot: &InventorySnapshot,
    options: &BuildOptions,
    clamps: &[VarClamp],
) -> PlanResult<PlanModel> {
    let index = build_indices(catalog, inputs, horizon, snapshot)?;

    let mut problem = variables!();
    let mut registry = VarRegistry::new();
    let vars = create_variables(catalog, inputs, &index, options, &mut problem, &mut registry);

    let mut constraints = build_constraints(catalog, inputs, &index, &vars, &registry)?;

    let mut clamped = 0usize;
    for clamp in clamps {
        match registry.lookup(&clamp.name) {
            Some(id) => {
                constraints.push(constraint!(registry.variable(id) == clamp.value));
                clamped += 1;
            }
            None => debug!(name = %clamp.name, "clamp target absent in this window; skipped"),
        }
    }

    let objective = build_objective(catalog, inputs, &index, &vars, &registry, options);

    info!(
        window_start = %horizon.start,
        window_end = %horizon.end,
        variables = registry.len(),
        constraints = constraints.len(),
        cohorts = index.cohorts.len(),
        shipments = index.shipments.len(),
        clamped,
        "model built"
    );

    Ok(PlanModel {
        index,
        vars,
        registry,
        problem,
        objective,
        constraints,
    })
}
