//! # bnp-solve: Solver Driver
//!
//! Drives a MILP backend over an assembled [`PlanModel`]: applies the time
//! limit, gap target, and verbosity, normalizes backend-specific
//! termination into [`SolveStatus`], and reads every registered variable
//! back into a plain value table.
//!
//! Backends are selected by cargo feature, mirroring the rest of the
//! workspace: `solver-highs` (default) and `solver-cbc`. Warmstart hints
//! are advisory; a backend without warmstart support logs and ignores them,
//! and the driver never fails on hint rejection.

use bnp_core::{PlanError, PlanResult};
use bnp_model::{DecisionVars, IndexSet, PlanModel, VarId, VarRegistry};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Supported MILP backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverBackend {
    Highs,
    Cbc,
}

impl SolverBackend {
    pub fn name(self) -> &'static str {
        match self {
            SolverBackend::Highs => "highs",
            SolverBackend::Cbc => "cbc",
        }
    }
}

impl FromStr for SolverBackend {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highs" => Ok(SolverBackend::Highs),
            "cbc" | "coin_cbc" => Ok(SolverBackend::Cbc),
            "gurobi" => Err(PlanError::Config(
                "gurobi backend is not supported in this build; supported: highs, cbc".into(),
            )),
            other => Err(PlanError::Config(format!(
                "unknown solver '{other}'; supported: highs, cbc"
            ))),
        }
    }
}

/// Per-invocation solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub backend: SolverBackend,
    pub time_limit_seconds: f64,
    /// Relative MIP gap target.
    pub mip_gap: f64,
    pub verbose: bool,
    /// Backend parallelism; opaque to the planner.
    pub threads: Option<u32>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::Highs,
            time_limit_seconds: 300.0,
            mip_gap: 0.01,
            verbose: false,
            threads: None,
        }
    }
}

/// Normalized termination status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// Time limit reached with an incumbent; gap reported.
    FeasibleSuboptimal,
    Infeasible,
    Unbounded,
    /// Time limit reached with no incumbent.
    TimeLimit,
    Error,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::FeasibleSuboptimal)
    }
}

/// Variable values in registry order.
#[derive(Debug, Clone)]
pub struct SolvedValues {
    values: Vec<f64>,
}

impl SolvedValues {
    pub fn value(&self, id: VarId) -> f64 {
        self.values[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of one solver invocation.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    /// The gap bound the backend was asked to reach; backends do not report
    /// the achieved gap through this interface.
    pub mip_gap: Option<f64>,
    pub wall_time_seconds: f64,
    pub message: Option<String>,
}

/// A solved model: index sets and variables for extraction plus the values.
pub struct SolvedModel {
    pub index: IndexSet,
    pub vars: DecisionVars,
    pub registry: VarRegistry,
    pub result: SolveResult,
    pub values: Option<SolvedValues>,
}

/// Advisory warmstart hints: variable name to value.
#[derive(Debug, Clone, Default)]
pub struct WarmstartHints {
    pub entries: Vec<(String, f64)>,
}

impl WarmstartHints {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Solve an assembled model.
///
/// The model is consumed; its index sets, variable maps, and registry come
/// back in the [`SolvedModel`] for extraction.
pub fn solve(
    model: PlanModel,
    config: &SolverConfig,
    hints: Option<&WarmstartHints>,
) -> PlanResult<SolvedModel> {
    let PlanModel {
        index,
        vars,
        registry,
        problem,
        objective,
        constraints,
    } = model;

    info!(
        backend = config.backend.name(),
        variables = registry.len(),
        constraints = constraints.len(),
        time_limit_seconds = config.time_limit_seconds,
        mip_gap = config.mip_gap,
        "solver invocation"
    );

    if let Some(hints) = hints {
        if !hints.is_empty() {
            // good_lp exposes no warmstart surface; hints are advisory and
            // dropping them is allowed.
            debug!(
                hints = hints.len(),
                backend = config.backend.name(),
                "warmstart hints not supported by backend; ignored"
            );
        }
    }

    let objective_expr = objective.clone();
    let unsolved = problem.minimise(objective);

    let start = Instant::now();
    let outcome = match config.backend {
        SolverBackend::Highs => {
            #[cfg(feature = "solver-highs")]
            {
                solve_highs(unsolved, constraints, config, &registry)
            }
            #[cfg(not(feature = "solver-highs"))]
            {
                let _ = (unsolved, constraints);
                return Err(PlanError::Config(
                    "highs backend not compiled; enable the 'solver-highs' feature".into(),
                ));
            }
        }
        SolverBackend::Cbc => {
            #[cfg(feature = "solver-cbc")]
            {
                solve_cbc(unsolved, constraints, config, &registry)
            }
            #[cfg(not(feature = "solver-cbc"))]
            {
                let _ = (unsolved, constraints);
                return Err(PlanError::Config(
                    "cbc backend not compiled; enable the 'solver-cbc' feature".into(),
                ));
            }
        }
    };
    let wall = start.elapsed().as_secs_f64();

    let (status, values, message) = match outcome {
        Ok(values) => {
            // The abstraction does not distinguish "optimal" from "stopped
            // at the limit with an incumbent"; classify by wall time.
            let status = if wall >= config.time_limit_seconds * 0.995 {
                SolveStatus::FeasibleSuboptimal
            } else {
                SolveStatus::Optimal
            };
            (status, Some(values), None)
        }
        Err(SolveFailure::Infeasible) => (SolveStatus::Infeasible, None, None),
        Err(SolveFailure::Unbounded) => (SolveStatus::Unbounded, None, None),
        Err(SolveFailure::Other(message)) => {
            let status = if wall >= config.time_limit_seconds * 0.995 {
                SolveStatus::TimeLimit
            } else {
                SolveStatus::Error
            };
            (status, None, Some(message))
        }
    };

    let objective = values
        .as_ref()
        .map(|v| eval_expression(&objective_expr, v, &registry));

    match status {
        SolveStatus::Optimal | SolveStatus::FeasibleSuboptimal => info!(
            status = ?status,
            objective = objective.unwrap_or(f64::NAN),
            wall_time_seconds = wall,
            "solve finished"
        ),
        _ => warn!(
            status = ?status,
            wall_time_seconds = wall,
            message = message.as_deref().unwrap_or(""),
            "solve failed"
        ),
    }

    Ok(SolvedModel {
        index,
        vars,
        registry,
        result: SolveResult {
            status,
            objective,
            mip_gap: status.has_solution().then_some(config.mip_gap),
            wall_time_seconds: wall,
            message,
        },
        values,
    })
}

enum SolveFailure {
    Infeasible,
    Unbounded,
    Other(String),
}

impl From<good_lp::ResolutionError> for SolveFailure {
    fn from(err: good_lp::ResolutionError) -> Self {
        match err {
            good_lp::ResolutionError::Infeasible => SolveFailure::Infeasible,
            good_lp::ResolutionError::Unbounded => SolveFailure::Unbounded,
            other => SolveFailure::Other(format!("{other:?}")),
        }
    }
}

fn collect_values<S: good_lp::Solution>(solution: &S, registry: &VarRegistry) -> SolvedValues {
    SolvedValues {
        values: registry
            .iter()
            .map(|(_, _, var)| solution.value(var))
            .collect(),
    }
}

/// Re-evaluate an affine expression from collected values. Avoids holding
/// the backend solution beyond the solve call.
fn eval_expression(expr: &good_lp::Expression, values: &SolvedValues, registry: &VarRegistry) -> f64 {
    use good_lp::IntoAffineExpression;

    let lookup: std::collections::HashMap<good_lp::Variable, f64> = registry
        .iter()
        .map(|(id, _, var)| (var, values.value(id)))
        .collect();
    let mut total = expr.clone().constant();
    for (var, coeff) in expr.clone().linear_coefficients() {
        total += coeff * lookup.get(&var).copied().unwrap_or(0.0);
    }
    total
}

#[cfg(feature = "solver-highs")]
fn solve_highs(
    unsolved: good_lp::variable::UnsolvedProblem,
    constraints: Vec<good_lp::Constraint>,
    config: &SolverConfig,
    registry: &VarRegistry,
) -> Result<SolvedValues, SolveFailure> {
    use good_lp::solvers::highs::highs;
    use good_lp::{SolverModel, WithMipGap};

    let mut model = unsolved
        .using(highs)
        .set_verbose(config.verbose)
        .set_time_limit(config.time_limit_seconds)
        .with_mip_gap(config.mip_gap as f32)
        .map_err(|e| SolveFailure::Other(format!("invalid mip gap: {e:?}")))?;
    if config.threads.is_some() {
        // Thread control is a CBC parameter; HiGHS decides its own
        // parallelism through this interface.
        debug!("thread count ignored by the highs backend");
    }
    for constraint in constraints {
        model = model.with(constraint);
    }

    match model.solve() {
        Ok(solution) => Ok(collect_values(&solution, registry)),
        Err(err) => Err(err.into()),
    }
}

#[cfg(feature = "solver-cbc")]
fn solve_cbc(
    unsolved: good_lp::variable::UnsolvedProblem,
    constraints: Vec<good_lp::Constraint>,
    config: &SolverConfig,
    registry: &VarRegistry,
) -> Result<SolvedValues, SolveFailure> {
    use good_lp::solvers::coin_cbc::coin_cbc;
    use good_lp::SolverModel;

    let mut model = unsolved.using(coin_cbc);
    model.set_parameter("logLevel", if config.verbose { "1" } else { "0" });
    model.set_parameter("seconds", &format!("{}", config.time_limit_seconds));
    model.set_parameter("ratio", &format!("{}", config.mip_gap));
    if let Some(threads) = config.threads {
        model.set_parameter("threads", &format!("{threads}"));
    }
    for constraint in constraints {
        model = model.with(constraint);
    }

    match model.solve() {
        Ok(solution) => Ok(collect_values(&solution, registry)),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!(SolverBackend::from_str("highs").unwrap(), SolverBackend::Highs);
        assert_eq!(SolverBackend::from_str("CBC").unwrap(), SolverBackend::Cbc);

        let err = SolverBackend::from_str("gurobi").unwrap_err();
        assert!(err.to_string().contains("not supported"));

        assert!(SolverBackend::from_str("xpress").is_err());
    }

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::FeasibleSuboptimal.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::TimeLimit.has_solution());
    }

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.backend, SolverBackend::Highs);
        assert_eq!(config.mip_gap, 0.01);
    }
}
