//! Physical and labor parameters of the bread network.
//!
//! These are properties of the production line and packaging, not tunable
//! planner options; planner options live in the planner configuration.

/// Units per case. Production and shipment quantities are case multiples.
pub const CASE_SIZE_UNITS: f64 = 10.0;

/// Units per pallet.
pub const UNITS_PER_PALLET: f64 = 320.0;

/// Pallet capacity of every truck in the fleet.
pub const TRUCK_PALLET_CAPACITY: u32 = 44;

/// Production line throughput, units per labor hour.
pub const PRODUCTION_RATE_UNITS_PER_HOUR: f64 = 1400.0;

/// Line startup overhead on any active production day, hours.
pub const STARTUP_HOURS: f64 = 0.5;

/// Line shutdown overhead on any active production day, hours.
pub const SHUTDOWN_HOURS: f64 = 0.25;

/// Changeover overhead per product started on a day, hours.
pub const CHANGEOVER_HOURS_PER_START: f64 = 1.0;

/// Maximum overtime on a fixed labor day, hours.
pub const MAX_OVERTIME_HOURS: f64 = 2.0;

/// Minimum paid hours on a non-fixed day with any production.
pub const MIN_PAID_HOURS_NON_FIXED: f64 = 4.0;

/// Big-M for the day-active indicator: no day uses more hours than this.
pub const DAY_ACTIVE_HOURS_BIG_M: f64 = 24.0;
