//! The planning horizon: an inclusive, contiguous span of dates.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive date span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Horizon {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// A horizon of `days` days beginning at `start`.
    pub fn from_start(start: NaiveDate, days: u32) -> Self {
        Self {
            start,
            end: start + Duration::days(days.max(1) as i64 - 1),
        }
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.num_days()).map(move |i| start + Duration::days(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_inclusive_span() {
        let horizon = Horizon::from_start(d("2026-06-01"), 7);
        assert_eq!(horizon.end, d("2026-06-07"));
        assert_eq!(horizon.num_days(), 7);
        assert!(horizon.contains(d("2026-06-07")));
        assert!(!horizon.contains(d("2026-06-08")));
        assert_eq!(horizon.dates().count(), 7);
    }
}
