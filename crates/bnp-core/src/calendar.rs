//! Labor days and the labor calendar.

use crate::error::{PlanError, PlanResult};
use crate::params;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labor terms for a single date.
///
/// Fixed days carry a paid fixed-hour block plus up to two overtime hours;
/// non-fixed days (weekends, holidays) pay a premium rate with a four-hour
/// minimum whenever the line runs at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborDay {
    pub date: NaiveDate,
    pub is_fixed_day: bool,
    /// Cap on fixed (regular-rate) hours; zero on non-fixed days.
    pub fixed_hours: f64,
    pub regular_rate: f64,
    pub overtime_rate: f64,
    pub non_fixed_rate: f64,
    #[serde(default = "LaborDay::default_minimum_paid_hours")]
    pub minimum_paid_hours: f64,
}

impl LaborDay {
    /// A weekday with the given fixed-hour block and rates.
    pub fn fixed(date: NaiveDate, fixed_hours: f64, regular_rate: f64, overtime_rate: f64) -> Self {
        Self {
            date,
            is_fixed_day: true,
            fixed_hours,
            regular_rate,
            overtime_rate,
            non_fixed_rate: overtime_rate,
            minimum_paid_hours: Self::default_minimum_paid_hours(),
        }
    }

    /// A weekend or holiday paid at the premium rate.
    pub fn non_fixed(date: NaiveDate, non_fixed_rate: f64) -> Self {
        Self {
            date,
            is_fixed_day: false,
            fixed_hours: 0.0,
            regular_rate: 0.0,
            overtime_rate: 0.0,
            non_fixed_rate,
            minimum_paid_hours: Self::default_minimum_paid_hours(),
        }
    }

    fn default_minimum_paid_hours() -> f64 {
        params::MIN_PAID_HOURS_NON_FIXED
    }
}

/// The labor calendar over the planning horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaborCalendar {
    days: BTreeMap<NaiveDate, LaborDay>,
}

impl LaborCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_days(days: impl IntoIterator<Item = LaborDay>) -> Self {
        Self {
            days: days.into_iter().map(|d| (d.date, d)).collect(),
        }
    }

    pub fn insert(&mut self, day: LaborDay) {
        self.days.insert(day.date, day);
    }

    pub fn day(&self, date: NaiveDate) -> Option<&LaborDay> {
        self.days.get(&date)
    }

    /// The labor day for `date`, or a model error suggesting the missing
    /// parameter.
    pub fn require_day(&self, date: NaiveDate) -> PlanResult<&LaborDay> {
        self.days.get(&date).ok_or_else(|| {
            PlanError::Model(format!(
                "no labor day for {date}; add a labor calendar entry for every horizon date"
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &LaborDay> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_require_day_names_missing_date() {
        let calendar = LaborCalendar::from_days([LaborDay::fixed(d("2026-06-01"), 12.0, 330.0, 660.0)]);
        assert!(calendar.require_day(d("2026-06-01")).is_ok());

        let err = calendar.require_day(d("2026-06-02")).unwrap_err();
        assert!(err.to_string().contains("2026-06-02"));
    }

    #[test]
    fn test_non_fixed_day_defaults() {
        let day = LaborDay::non_fixed(d("2026-06-06"), 1320.0);
        assert!(!day.is_fixed_day);
        assert_eq!(day.fixed_hours, 0.0);
        assert_eq!(day.minimum_paid_hours, 4.0);
    }
}
