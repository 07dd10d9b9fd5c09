//! Initial inventory snapshots and cohort-level stock records.
//!
//! The external snapshot ([`InitialInventory`]) is coarse: units by
//! `(location, product, state)` as counted on the snapshot date. Inside the
//! planner, inventory handed from one window to the next keeps full cohort
//! identity ([`InventorySnapshot`]) so shelf-life clocks survive window
//! boundaries.

use crate::state::StorageState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One record of the external inventory snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialStock {
    pub location: String,
    pub product: String,
    pub state: StorageState,
    pub units: f64,
}

/// Pre-horizon stock counted at `snapshot_date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialInventory {
    pub snapshot_date: Option<NaiveDate>,
    pub entries: Vec<InitialStock>,
}

impl InitialInventory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total_units(&self) -> f64 {
        self.entries.iter().map(|e| e.units).sum()
    }

    /// Expand into cohort records, dating every batch at the snapshot. The
    /// snapshot does not carry batch ages, so production and state-entry
    /// dates both resolve to `as_of`.
    pub fn into_snapshot(&self, as_of: NaiveDate) -> InventorySnapshot {
        InventorySnapshot {
            as_of,
            cohorts: self
                .entries
                .iter()
                .filter(|e| e.units > 0.0)
                .map(|e| CohortStock {
                    location: e.location.clone(),
                    product: e.product.clone(),
                    prod_date: as_of,
                    entry_date: as_of,
                    state: e.state,
                    units: e.units,
                })
                .collect(),
            in_transit: Vec::new(),
        }
    }
}

/// Cohort-level stock at a point in time: the window handoff state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStock {
    pub location: String,
    pub product: String,
    pub prod_date: NaiveDate,
    pub entry_date: NaiveDate,
    pub state: StorageState,
    pub units: f64,
}

/// Cargo already dispatched but not yet delivered at the snapshot: it
/// materializes at its destination on the arrival date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InTransitStock {
    pub destination: String,
    pub product: String,
    pub prod_date: NaiveDate,
    /// State-entry date the cargo will carry on arrival.
    pub entry_date: NaiveDate,
    pub state: StorageState,
    pub units: f64,
    pub arrival_date: NaiveDate,
}

/// Inventory on hand at the end of `as_of`, by cohort, plus cargo still on
/// the road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub as_of: NaiveDate,
    pub cohorts: Vec<CohortStock>,
    #[serde(default)]
    pub in_transit: Vec<InTransitStock>,
}

impl InventorySnapshot {
    pub fn empty(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            cohorts: Vec::new(),
            in_transit: Vec::new(),
        }
    }

    pub fn total_units(&self) -> f64 {
        self.cohorts.iter().map(|c| c.units).sum::<f64>()
            + self.in_transit.iter().map(|c| c.units).sum::<f64>()
    }

    /// Drop cohorts whose state clock has already run out at `as_of`.
    pub fn drop_expired(&mut self) -> usize {
        let as_of = self.as_of;
        let before = self.cohorts.len();
        self.cohorts
            .retain(|c| (as_of - c.entry_date).num_days() <= c.state.shelf_life_days());
        before - self.cohorts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_snapshot_expansion_dates_at_as_of() {
        let initial = InitialInventory {
            snapshot_date: Some(d("2026-06-01")),
            entries: vec![
                InitialStock {
                    location: "HUB-NSW".into(),
                    product: "SKU-WHITE".into(),
                    state: StorageState::Ambient,
                    units: 640.0,
                },
                InitialStock {
                    location: "HUB-NSW".into(),
                    product: "SKU-RYE".into(),
                    state: StorageState::Ambient,
                    units: 0.0,
                },
            ],
        };

        let snapshot = initial.into_snapshot(d("2026-06-01"));
        assert_eq!(snapshot.cohorts.len(), 1);
        assert_eq!(snapshot.cohorts[0].prod_date, d("2026-06-01"));
        assert_eq!(snapshot.cohorts[0].entry_date, d("2026-06-01"));
        assert_eq!(snapshot.total_units(), 640.0);
    }

    #[test]
    fn test_drop_expired() {
        let mut snapshot = InventorySnapshot {
            as_of: d("2026-06-20"),
            cohorts: vec![
                CohortStock {
                    location: "BR-6104".into(),
                    product: "SKU-WHITE".into(),
                    prod_date: d("2026-06-01"),
                    entry_date: d("2026-06-01"),
                    state: StorageState::Ambient,
                    units: 100.0,
                },
                CohortStock {
                    location: "BR-6104".into(),
                    product: "SKU-WHITE".into(),
                    prod_date: d("2026-06-15"),
                    entry_date: d("2026-06-15"),
                    state: StorageState::Ambient,
                    units: 50.0,
                },
            ],
            in_transit: Vec::new(),
        };

        // 19 days in ambient state exceeds the 17-day clock.
        assert_eq!(snapshot.drop_expired(), 1);
        assert_eq!(snapshot.total_units(), 50.0);
    }
}
