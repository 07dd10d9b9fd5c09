//! Planner configuration.
//!
//! One typed struct for every recognized option; defaults are published as
//! constants. Dynamic option dictionaries do not survive contact with a
//! 29-week horizon.

use bnp_solve::SolverBackend;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_HORIZON_WEEKS: u32 = 4;
pub const DEFAULT_WINDOW_LENGTH_DAYS: u32 = 28;
pub const DEFAULT_OVERLAP_DAYS: u32 = 7;
pub const DEFAULT_TIME_LIMIT_SECONDS: f64 = 300.0;
pub const DEFAULT_MIP_GAP: f64 = 0.01;
/// Horizons at or under this many days solve as a single window.
pub const SINGLE_WINDOW_MAX_DAYS: i64 = 21;

/// Warmstart strategy across windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarmstartMode {
    /// Shift the previous window's solution by the window stride and offer
    /// it as advisory hints.
    ShiftPreviousWindow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// First planning date; defaults to the earliest forecast date.
    pub start_date: Option<NaiveDate>,
    pub horizon_weeks: u32,
    pub window_length_days: u32,
    pub overlap_days: u32,
    pub solver: SolverBackend,
    /// Per-window solver time limit.
    pub time_limit_seconds: f64,
    /// Wall-clock budget across all windows.
    pub wall_clock_budget_seconds: Option<f64>,
    pub mip_gap: f64,
    pub allow_shortages: bool,
    /// Cohort-level inventory in the output; aggregate totals otherwise.
    pub use_batch_tracking: bool,
    pub use_pallet_tracking: bool,
    pub use_truck_pallet_tracking: bool,
    /// Overrides the cost structure's freshness weight when set.
    pub freshness_weight: Option<f64>,
    pub warmstart: Option<WarmstartMode>,
    /// Clamp the overlap days of each window to the previous window's
    /// provisional decisions (locked executions).
    pub fix_overlap_prefix: bool,
    pub solver_verbose: bool,
    pub threads: Option<u32>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            horizon_weeks: DEFAULT_HORIZON_WEEKS,
            window_length_days: DEFAULT_WINDOW_LENGTH_DAYS,
            overlap_days: DEFAULT_OVERLAP_DAYS,
            solver: SolverBackend::Highs,
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            wall_clock_budget_seconds: None,
            mip_gap: DEFAULT_MIP_GAP,
            allow_shortages: true,
            use_batch_tracking: true,
            use_pallet_tracking: true,
            use_truck_pallet_tracking: true,
            freshness_weight: None,
            warmstart: Some(WarmstartMode::ShiftPreviousWindow),
            fix_overlap_prefix: false,
            solver_verbose: false,
            threads: None,
        }
    }
}

impl PlannerConfig {
    pub fn horizon_days(&self) -> i64 {
        self.horizon_weeks as i64 * 7
    }

    /// Window stride: days committed per window.
    pub fn stride_days(&self) -> i64 {
        (self.window_length_days.saturating_sub(self.overlap_days)).max(1) as i64
    }

    pub fn validate(&self) -> Result<(), bnp_core::PlanError> {
        if self.horizon_weeks == 0 || self.horizon_weeks > 52 {
            return Err(bnp_core::PlanError::Config(format!(
                "horizon_weeks must be in 1..=52, got {}",
                self.horizon_weeks
            )));
        }
        if self.overlap_days >= self.window_length_days {
            return Err(bnp_core::PlanError::Config(format!(
                "overlap_days ({}) must be smaller than window_length_days ({})",
                self.overlap_days, self.window_length_days
            )));
        }
        if !(0.0..1.0).contains(&self.mip_gap) {
            return Err(bnp_core::PlanError::Config(format!(
                "mip_gap must be in [0, 1), got {}",
                self.mip_gap
            )));
        }
        if self.time_limit_seconds <= 0.0 {
            return Err(bnp_core::PlanError::Config(
                "time_limit_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}
