//! Sliding-window decomposition of the planning horizon.
//!
//! Long horizons solve as overlapping windows: each window commits its
//! non-overlapping prefix, hands its boundary inventory (on-hand plus
//! in-transit) to the next window, and optionally passes its solution
//! forward as advisory warmstart hints shifted by the window stride.
//! Windows are strictly ordered; committed dates are never revisited.

use crate::cancel::CancellationToken;
use crate::config::{PlannerConfig, WarmstartMode, SINGLE_WINDOW_MAX_DAYS};
use crate::extract::{extract_window, truck_assignments, WindowExtract};
use crate::fefo::fefo_allocate;
use crate::schema::{
    AggregateInventoryKey, InventoryReport, ModelType, OptimizationSolution, SolutionStatus,
    TotalCostBreakdown, WindowRecord,
};
use crate::validate::validate_solution;
use bnp_core::{Horizon, PlanError, PlanInputs, PlanResult};
use bnp_model::{build_model, BuildOptions, Catalog, VarClamp};
use bnp_solve::{solve, SolveStatus, SolvedModel, SolverConfig, WarmstartHints};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Preparing,
    Building,
    Solving,
    Extracting,
    Committed,
    Infeasible,
    TimeoutFeasible,
    SolverError,
}

impl WindowState {
    /// Legal transitions of the window lifecycle.
    pub fn can_advance_to(self, next: WindowState) -> bool {
        use WindowState::*;
        matches!(
            (self, next),
            (Preparing, Building)
                | (Building, Solving)
                | (Solving, Extracting)
                | (Solving, Infeasible)
                | (Solving, TimeoutFeasible)
                | (Solving, SolverError)
                | (TimeoutFeasible, Extracting)
                | (Extracting, Committed)
                | (Extracting, SolverError)
        )
    }

    fn advance(&mut self, window: usize, next: WindowState) {
        debug_assert!(
            self.can_advance_to(next),
            "illegal window transition {self:?} -> {next:?}"
        );
        debug!(window, from = ?*self, to = ?next, "window state");
        *self = next;
    }
}

/// One window of the decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub horizon: Horizon,
    /// Last committed date; the next window starts the day after.
    pub commit_through: NaiveDate,
}

/// Partition the horizon into overlapping windows. Horizons of at most
/// three weeks solve as a single window.
pub fn partition_horizon(horizon: Horizon, config: &PlannerConfig) -> Vec<WindowSpan> {
    if horizon.num_days() <= SINGLE_WINDOW_MAX_DAYS {
        return vec![WindowSpan {
            horizon,
            commit_through: horizon.end,
        }];
    }
    let stride = config.stride_days();
    let length = config.window_length_days as i64;
    let mut spans = Vec::new();
    let mut start = horizon.start;
    loop {
        let end = (start + Duration::days(length - 1)).min(horizon.end);
        let last = end == horizon.end;
        spans.push(WindowSpan {
            horizon: Horizon::new(start, end),
            commit_through: if last {
                end
            } else {
                start + Duration::days(stride - 1)
            },
        });
        if last {
            break;
        }
        start += Duration::days(stride);
    }
    spans
}

/// Shift every ISO date (YYYY-MM-DD) inside a variable name by `days`.
/// Used to address the matching variable of the next window with the
/// previous window's value.
pub fn shift_dates_in_name(name: &str, days: i64) -> String {
    let bytes = name.as_bytes();
    let mut out = String::with_capacity(name.len());
    let mut i = 0;
    while i < bytes.len() {
        if i + 10 <= bytes.len() && looks_like_date(&bytes[i..i + 10]) {
            if let Ok(date) = name[i..i + 10].parse::<NaiveDate>() {
                out.push_str(&(date + Duration::days(days)).to_string());
                i += 10;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

fn looks_like_date(window: &[u8]) -> bool {
    window.len() == 10
        && window[4] == b'-'
        && window[7] == b'-'
        && window
            .iter()
            .enumerate()
            .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit())
}

/// Plan the full horizon.
pub fn plan_horizon(inputs: &PlanInputs, config: &PlannerConfig) -> PlanResult<OptimizationSolution> {
    plan_horizon_cancellable(inputs, config, &CancellationToken::new())
}

/// Plan the full horizon, observing a cancellation token between windows.
pub fn plan_horizon_cancellable(
    inputs: &PlanInputs,
    config: &PlannerConfig,
    cancel: &CancellationToken,
) -> PlanResult<OptimizationSolution> {
    config.validate()?;
    let mut diagnostics = inputs.validate()?;

    let start_date = config
        .start_date
        .or_else(|| inputs.forecast.date_span().map(|(min, _)| min))
        .ok_or_else(|| {
            PlanError::Config("no start_date configured and the forecast is empty".into())
        })?;
    let horizon = Horizon::from_start(start_date, config.horizon_days() as u32);
    let catalog = Catalog::build(inputs)?;
    let spans = partition_horizon(horizon, config);

    info!(
        start = %horizon.start,
        end = %horizon.end,
        windows = spans.len(),
        solver = config.solver.name(),
        "planning horizon"
    );

    let options = BuildOptions {
        allow_shortages: config.allow_shortages,
        use_pallet_tracking: config.use_pallet_tracking,
        use_truck_pallet_tracking: config.use_truck_pallet_tracking,
        freshness_weight: config.freshness_weight,
    };

    let mut snapshot = inputs.initial_inventory.into_snapshot(horizon.start);
    let dropped = snapshot.drop_expired();
    if dropped > 0 {
        diagnostics.add_warning(
            "inventory",
            format!("{dropped} initial cohort(s) already expired at the horizon start"),
        );
    }

    let mut merged = MergedSolution::default();
    let mut records: Vec<WindowRecord> = Vec::new();
    let mut overall = SolutionStatus::Optimal;
    let mut previous: Option<SolvedModel> = None;
    let wall_start = Instant::now();

    for (i, span) in spans.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(window = i, "cancelled between windows; returning partial plan");
            overall = SolutionStatus::CancelledPartial;
            break;
        }
        let remaining_budget = config
            .wall_clock_budget_seconds
            .map(|budget| budget - wall_start.elapsed().as_secs_f64());
        if matches!(remaining_budget, Some(r) if r <= 0.0) {
            warn!(window = i, "wall-clock budget exhausted; returning partial plan");
            overall = SolutionStatus::TimeoutPartial;
            break;
        }

        let mut state = WindowState::Preparing;

        // Clamps lock the previous window's provisional decisions over the
        // overlap; names keep their calendar dates, so they resolve to the
        // same decisions in this window.
        let clamps = match (&previous, config.fix_overlap_prefix) {
            (Some(prev), true) => overlap_clamps(prev, span.horizon.start),
            _ => Vec::new(),
        };
        let hints = match (&previous, config.warmstart) {
            (Some(prev), Some(WarmstartMode::ShiftPreviousWindow)) => {
                Some(shifted_hints(prev, config.stride_days()))
            }
            _ => None,
        };

        state.advance(i, WindowState::Building);
        let model = build_model(&catalog, inputs, span.horizon, &snapshot, &options, &clamps)?;

        state.advance(i, WindowState::Solving);
        let solver_config = SolverConfig {
            backend: config.solver,
            time_limit_seconds: remaining_budget
                .map(|r| r.min(config.time_limit_seconds))
                .unwrap_or(config.time_limit_seconds),
            mip_gap: config.mip_gap,
            verbose: config.solver_verbose,
            threads: config.threads,
        };
        let solved = solve(model, &solver_config, hints.as_ref())?;

        match solved.result.status {
            SolveStatus::Optimal => state.advance(i, WindowState::Extracting),
            SolveStatus::FeasibleSuboptimal => {
                overall = SolutionStatus::FeasibleSuboptimal;
                state.advance(i, WindowState::TimeoutFeasible);
                state.advance(i, WindowState::Extracting);
            }
            SolveStatus::Infeasible => {
                state.advance(i, WindowState::Infeasible);
                records.push(window_record(i, span, &solved));
                diagnostics.add_error(
                    "solver",
                    format!(
                        "window {i} ({}..={}) is infeasible; committed windows preserved",
                        span.horizon.start, span.horizon.end
                    ),
                );
                overall = SolutionStatus::Infeasible;
                break;
            }
            SolveStatus::TimeLimit => {
                state.advance(i, WindowState::SolverError);
                diagnostics.add_error(
                    "solver",
                    format!("window {i} hit the time limit with no incumbent"),
                );
                overall = SolutionStatus::TimeoutPartial;
                break;
            }
            SolveStatus::Unbounded | SolveStatus::Error => {
                state.advance(i, WindowState::SolverError);
                return Err(PlanError::Solver(format!(
                    "window {i} ({}..={}) failed: {:?} {}",
                    span.horizon.start,
                    span.horizon.end,
                    solved.result.status,
                    solved.result.message.as_deref().unwrap_or("")
                )));
            }
        }

        let extract = extract_window(
            &catalog,
            inputs,
            &solved,
            config.use_pallet_tracking,
            span.commit_through,
        )?;
        state.advance(i, WindowState::Committed);
        records.push(window_record(i, span, &solved));

        snapshot = extract.terminal_snapshot.clone();
        merged.absorb(extract);
        previous = Some(solved);
    }

    let cohort_consumption = fefo_allocate(merged.cohort_consumption);
    let costs = merged.costs;
    let inventory = if config.use_batch_tracking {
        InventoryReport::Cohort {
            entries: merged.cohort_inventory,
        }
    } else {
        let mut aggregate: BTreeMap<AggregateInventoryKey, f64> = BTreeMap::new();
        for (key, units) in merged.cohort_inventory {
            *aggregate
                .entry(AggregateInventoryKey(key.0, key.1, key.4, key.5))
                .or_insert(0.0) += units;
        }
        InventoryReport::Aggregate { entries: aggregate }
    };

    let solution = OptimizationSolution {
        model_type: ModelType::SlidingWindow,
        status: overall,
        total_cost: costs.total(),
        costs,
        production_by_date_product: merged.production,
        truck_assignments: truck_assignments(&merged.shipments),
        shipments: merged.shipments,
        labor_hours_by_date: merged.labor,
        inventory,
        demand_consumed: merged.demand_consumed,
        shortages: merged.shortages,
        disposals: merged.disposals,
        thaw_flows: merged.thaw_flows,
        freeze_flows: merged.freeze_flows,
        cohort_consumption,
        windows: records,
        diagnostics: diagnostics.issues,
    };

    validate_solution(&solution, Some(inputs))?;
    info!(
        status = ?solution.status,
        total_cost = solution.total_cost,
        fill_rate = solution.fill_rate(),
        wall_time_seconds = wall_start.elapsed().as_secs_f64(),
        "plan complete"
    );
    Ok(solution)
}

fn window_record(index: usize, span: &WindowSpan, solved: &SolvedModel) -> WindowRecord {
    WindowRecord {
        index,
        start: span.horizon.start,
        end: span.horizon.end,
        commit_through: span.commit_through,
        status: solved.result.status,
        objective: solved.result.objective,
        mip_gap: solved.result.mip_gap,
        wall_time_seconds: solved.result.wall_time_seconds,
    }
}

/// Clamp production, shipment, and consumption decisions dated in the
/// overlap (on or after the next window's start) to the previous window's
/// values.
fn overlap_clamps(previous: &SolvedModel, next_start: NaiveDate) -> Vec<VarClamp> {
    let Some(values) = previous.values.as_ref() else {
        return Vec::new();
    };
    let mut clamps = Vec::new();
    for (id, name, _) in previous.registry.iter() {
        let clampable =
            name.starts_with("prod[") || name.starts_with("ship[") || name.starts_with("cons[");
        if !clampable {
            continue;
        }
        let Some(date) = name
            .rsplit('@')
            .next()
            .and_then(|tail| tail.parse::<NaiveDate>().ok())
        else {
            continue;
        };
        if date >= next_start {
            clamps.push(VarClamp {
                name: name.to_string(),
                value: values.value(id),
            });
        }
    }
    debug!(clamps = clamps.len(), "fixed-prefix clamps prepared");
    clamps
}

/// The previous window's nonzero values, shifted by the stride, as
/// advisory hints.
fn shifted_hints(previous: &SolvedModel, stride_days: i64) -> WarmstartHints {
    let Some(values) = previous.values.as_ref() else {
        return WarmstartHints::default();
    };
    let mut hints = WarmstartHints::default();
    for (id, name, _) in previous.registry.iter() {
        let value = values.value(id);
        if value.abs() > 1e-9 {
            hints
                .entries
                .push((shift_dates_in_name(name, stride_days), value));
        }
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_partition_single_window_short_horizon() {
        let config = PlannerConfig::default();
        let horizon = Horizon::from_start(d("2026-06-01"), 14);
        let spans = partition_horizon(horizon, &config);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].commit_through, horizon.end);
    }

    #[test]
    fn test_partition_covers_horizon_without_gaps() {
        let config = PlannerConfig {
            horizon_weeks: 12,
            ..Default::default()
        };
        let horizon = Horizon::from_start(d("2026-06-01"), 84);
        let spans = partition_horizon(horizon, &config);

        assert!(spans.len() > 1);
        // Commit regions tile the horizon exactly.
        let mut expected_start = horizon.start;
        for span in &spans {
            assert_eq!(span.horizon.start, expected_start);
            assert!(span.commit_through <= span.horizon.end);
            expected_start = span.commit_through + Duration::days(1);
        }
        assert_eq!(expected_start, horizon.end + Duration::days(1));
        assert_eq!(spans.last().unwrap().horizon.end, horizon.end);
    }

    #[test]
    fn test_windows_overlap_by_configured_days() {
        let config = PlannerConfig {
            horizon_weeks: 12,
            ..Default::default()
        };
        let horizon = Horizon::from_start(d("2026-06-01"), 84);
        let spans = partition_horizon(horizon, &config);
        for pair in spans.windows(2) {
            let overlap = (pair[0].horizon.end - pair[1].horizon.start).num_days() + 1;
            assert_eq!(overlap, config.overlap_days as i64);
        }
    }

    #[test]
    fn test_shift_dates_in_name() {
        let name = "inv[MFG,SKU-WHITE,2026-06-01,2026-06-01,ambient]@2026-06-05";
        let shifted = shift_dates_in_name(name, 21);
        assert_eq!(
            shifted,
            "inv[MFG,SKU-WHITE,2026-06-22,2026-06-22,ambient]@2026-06-26"
        );
        // Non-date digits survive untouched.
        assert_eq!(shift_dates_in_name("pal[BR-6104,X]@2026-06-05", 1), "pal[BR-6104,X]@2026-06-06");
    }

    #[test]
    fn test_window_state_machine_edges() {
        use WindowState::*;
        assert!(Preparing.can_advance_to(Building));
        assert!(Solving.can_advance_to(Infeasible));
        assert!(TimeoutFeasible.can_advance_to(Extracting));
        assert!(!Committed.can_advance_to(Building));
        assert!(!Preparing.can_advance_to(Solving));
    }
}

/// Accumulator over committed window extracts.
#[derive(Default)]
struct MergedSolution {
    production: BTreeMap<crate::schema::ProductionKey, f64>,
    labor: BTreeMap<NaiveDate, crate::schema::LaborHoursBreakdown>,
    shipments: Vec<crate::schema::ShipmentResult>,
    cohort_inventory: BTreeMap<crate::schema::CohortInventoryKey, f64>,
    demand_consumed: BTreeMap<crate::schema::DemandKey, f64>,
    shortages: BTreeMap<crate::schema::DemandKey, f64>,
    disposals: BTreeMap<crate::schema::DemandKey, f64>,
    thaw_flows: BTreeMap<crate::schema::FlowKey, f64>,
    freeze_flows: BTreeMap<crate::schema::FlowKey, f64>,
    cohort_consumption: Vec<crate::schema::CohortConsumption>,
    costs: TotalCostBreakdown,
}

impl MergedSolution {
    /// Committed date regions are disjoint; additive merge keeps a key
    /// that repeats at a boundary correct.
    fn absorb(&mut self, extract: WindowExtract) {
        for (k, v) in extract.production {
            *self.production.entry(k).or_insert(0.0) += v;
        }
        self.labor.extend(extract.labor);
        self.shipments.extend(extract.shipments);
        for (k, v) in extract.cohort_inventory {
            self.cohort_inventory.insert(k, v);
        }
        for (k, v) in extract.demand_consumed {
            *self.demand_consumed.entry(k).or_insert(0.0) += v;
        }
        for (k, v) in extract.shortages {
            *self.shortages.entry(k).or_insert(0.0) += v;
        }
        for (k, v) in extract.disposals {
            *self.disposals.entry(k).or_insert(0.0) += v;
        }
        for (k, v) in extract.thaw_flows {
            *self.thaw_flows.entry(k).or_insert(0.0) += v;
        }
        for (k, v) in extract.freeze_flows {
            *self.freeze_flows.entry(k).or_insert(0.0) += v;
        }
        self.cohort_consumption.extend(extract.cohort_consumption);
        self.costs.add(&extract.costs);
    }
}
