//! Demand forecast entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One forecast record: demand in units at a location on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub location: String,
    pub product: String,
    pub date: NaiveDate,
    pub units: f64,
}

/// The demand forecast. Demand is served from ambient-tempered stock only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    pub fn new(entries: Vec<ForecastEntry>) -> Self {
        Self { entries }
    }

    pub fn total_units(&self) -> f64 {
        self.entries.iter().map(|e| e.units).sum()
    }

    /// Entries with dates inside `[start, end]` inclusive.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Forecast {
        Forecast {
            entries: self
                .entries
                .iter()
                .filter(|e| e.date >= start && e.date <= end)
                .cloned()
                .collect(),
        }
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.entries.iter().map(|e| e.date).min()?;
        let max = self.entries.iter().map(|e| e.date).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(date: &str, units: f64) -> ForecastEntry {
        ForecastEntry {
            location: "BR-6104".into(),
            product: "SKU-WHITE".into(),
            date: d(date),
            units,
        }
    }

    #[test]
    fn test_slice_is_inclusive() {
        let forecast = Forecast::new(vec![
            entry("2026-06-01", 100.0),
            entry("2026-06-02", 200.0),
            entry("2026-06-03", 300.0),
        ]);

        let window = forecast.slice(d("2026-06-01"), d("2026-06-02"));
        assert_eq!(window.entries.len(), 2);
        assert_eq!(window.total_units(), 300.0);
    }

    #[test]
    fn test_date_span() {
        let forecast = Forecast::new(vec![entry("2026-06-05", 10.0), entry("2026-06-01", 10.0)]);
        assert_eq!(
            forecast.date_span(),
            Some((d("2026-06-01"), d("2026-06-05")))
        );
        assert_eq!(Forecast::default().date_span(), None);
    }
}
