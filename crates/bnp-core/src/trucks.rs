//! Truck schedules: day-of-week service patterns, departure windows, and
//! loading policies.

use crate::params;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Departure window of a scheduled truck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureWindow {
    Morning,
    Afternoon,
}

/// Which production a departure can carry.
///
/// Morning trucks are loaded overnight and can only take production through
/// the prior day; afternoon trucks can take same-day production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPolicy {
    SameDay,
    PriorDay,
}

/// A scheduled truck service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckSchedule {
    /// Truck id; referenced as a string in solution truck assignments.
    pub id: String,
    pub origin: String,
    /// Destination, or an ordered intermediate-stop list. Pallet capacity is
    /// shared across all stops of a departure.
    pub stops: Vec<String>,
    pub weekdays: Vec<Weekday>,
    pub departure: DepartureWindow,
    #[serde(default = "TruckSchedule::default_pallet_capacity")]
    pub pallet_capacity: u32,
    pub loading: LoadingPolicy,
}

impl TruckSchedule {
    fn default_pallet_capacity() -> u32 {
        params::TRUCK_PALLET_CAPACITY
    }

    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(&date.weekday())
    }

    pub fn serves(&self, origin: &str, dest: &str) -> bool {
        self.origin == origin && self.stops.iter().any(|s| s == dest)
    }

    /// Latest production date this departure may carry, for cargo loaded
    /// at the manufacturing site.
    pub fn latest_loadable_production(&self, departure: NaiveDate) -> NaiveDate {
        match self.loading {
            LoadingPolicy::SameDay => departure,
            LoadingPolicy::PriorDay => departure.pred_opt().unwrap_or(departure),
        }
    }
}

/// The full truck schedule table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TruckSchedules {
    pub schedules: Vec<TruckSchedule>,
}

impl TruckSchedules {
    pub fn new(schedules: Vec<TruckSchedule>) -> Self {
        Self { schedules }
    }

    pub fn by_id(&self, id: &str) -> Option<&TruckSchedule> {
        self.schedules.iter().find(|s| s.id == id)
    }

    /// Trucks serving `origin -> dest` on `date`.
    pub fn serving<'a>(
        &'a self,
        origin: &'a str,
        dest: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a TruckSchedule> {
        self.schedules
            .iter()
            .filter(move |s| s.serves(origin, dest) && s.runs_on(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(id: &str, weekdays: Vec<Weekday>, loading: LoadingPolicy) -> TruckSchedule {
        TruckSchedule {
            id: id.into(),
            origin: "MFG".into(),
            stops: vec!["HUB-NSW".into(), "HUB-VIC".into()],
            weekdays,
            departure: DepartureWindow::Morning,
            pallet_capacity: 44,
            loading,
        }
    }

    #[test]
    fn test_runs_on_weekday_pattern() {
        let truck = schedule("T1", vec![Weekday::Mon, Weekday::Wed], LoadingPolicy::PriorDay);
        // 2026-06-01 is a Monday.
        assert!(truck.runs_on("2026-06-01".parse().unwrap()));
        assert!(!truck.runs_on("2026-06-02".parse().unwrap()));
    }

    #[test]
    fn test_serves_stop_list() {
        let truck = schedule("T1", vec![Weekday::Mon], LoadingPolicy::SameDay);
        assert!(truck.serves("MFG", "HUB-VIC"));
        assert!(!truck.serves("MFG", "BR-6104"));
        assert!(!truck.serves("HUB-NSW", "HUB-VIC"));
    }

    #[test]
    fn test_loading_policy_window() {
        let departure: NaiveDate = "2026-06-01".parse().unwrap();
        let morning = schedule("T1", vec![Weekday::Mon], LoadingPolicy::PriorDay);
        let afternoon = schedule("T2", vec![Weekday::Mon], LoadingPolicy::SameDay);

        assert_eq!(
            morning.latest_loadable_production(departure),
            "2026-05-31".parse().unwrap()
        );
        assert_eq!(afternoon.latest_loadable_production(departure), departure);
    }
}
