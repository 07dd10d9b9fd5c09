//! Storage states, transport modes, and the transit state-transition rules.
//!
//! A batch of bread is always in exactly one storage state. The shelf-life
//! clock counts days since the batch entered its current state, so a freeze
//! or thaw resets the clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage state of a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageState {
    Frozen,
    Ambient,
    Thawed,
}

impl StorageState {
    /// Maximum age in the current state, in days.
    pub fn shelf_life_days(self) -> i64 {
        match self {
            StorageState::Frozen => 120,
            StorageState::Ambient => 17,
            StorageState::Thawed => 14,
        }
    }

    /// Demand is served from ambient-tempered stock only.
    pub fn serves_demand(self) -> bool {
        matches!(self, StorageState::Ambient | StorageState::Thawed)
    }
}

impl fmt::Display for StorageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageState::Frozen => write!(f, "frozen"),
            StorageState::Ambient => write!(f, "ambient"),
            StorageState::Thawed => write!(f, "thawed"),
        }
    }
}

/// Transport mode of a route leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Frozen,
    Ambient,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Frozen => write!(f, "frozen"),
            TransportMode::Ambient => write!(f, "ambient"),
        }
    }
}

/// Which storage states a location can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageModes {
    pub frozen: bool,
    pub ambient: bool,
}

impl StorageModes {
    pub fn supports(&self, state: StorageState) -> bool {
        match state {
            StorageState::Frozen => self.frozen,
            // Thawed stock lives in ambient storage.
            StorageState::Ambient | StorageState::Thawed => self.ambient,
        }
    }
}

/// How the state-entry date of arriving cargo is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRule {
    /// The cohort keeps its origin entry date (no state change).
    Keep,
    /// The state changed at loading; entry date is the departure date.
    AtDeparture,
    /// The state changed on arrival (thaw-on-arrival); entry date is the
    /// arrival date, starting a fresh 14-day clock.
    AtArrival,
}

/// Resolve the arrival state and entry-date rule for cargo in `origin_state`
/// shipped on a leg with `mode` to a destination with `dest` storage.
///
/// Returns `None` when the combination is not a valid movement:
/// - frozen stock cannot ride an ambient truck,
/// - thawed stock is never refrozen,
/// - the destination must be able to store the arrival state.
pub fn transit_transition(
    mode: TransportMode,
    origin_state: StorageState,
    dest: &StorageModes,
) -> Option<(StorageState, EntryRule)> {
    match (mode, origin_state) {
        (TransportMode::Ambient, StorageState::Ambient) => dest
            .supports(StorageState::Ambient)
            .then_some((StorageState::Ambient, EntryRule::Keep)),
        (TransportMode::Ambient, StorageState::Thawed) => dest
            .supports(StorageState::Thawed)
            .then_some((StorageState::Thawed, EntryRule::Keep)),
        (TransportMode::Ambient, StorageState::Frozen) => None,
        (TransportMode::Frozen, StorageState::Thawed) => None,
        (TransportMode::Frozen, origin) => {
            // Ambient stock freezes at loading; already-frozen stock keeps
            // its entry date. Destinations without frozen storage take
            // delivery thawed with a fresh clock.
            let entry_if_frozen = if origin == StorageState::Ambient {
                EntryRule::AtDeparture
            } else {
                EntryRule::Keep
            };
            if dest.frozen {
                Some((StorageState::Frozen, entry_if_frozen))
            } else if dest.ambient {
                Some((StorageState::Thawed, EntryRule::AtArrival))
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROZEN_BUFFER: StorageModes = StorageModes {
        frozen: true,
        ambient: false,
    };
    const BREADROOM: StorageModes = StorageModes {
        frozen: false,
        ambient: true,
    };

    #[test]
    fn test_shelf_life_table() {
        assert_eq!(StorageState::Frozen.shelf_life_days(), 120);
        assert_eq!(StorageState::Ambient.shelf_life_days(), 17);
        assert_eq!(StorageState::Thawed.shelf_life_days(), 14);
    }

    #[test]
    fn test_freeze_at_loading() {
        let (state, rule) =
            transit_transition(TransportMode::Frozen, StorageState::Ambient, &FROZEN_BUFFER)
                .unwrap();
        assert_eq!(state, StorageState::Frozen);
        assert_eq!(rule, EntryRule::AtDeparture);
    }

    #[test]
    fn test_thaw_on_arrival() {
        let (state, rule) =
            transit_transition(TransportMode::Frozen, StorageState::Frozen, &BREADROOM).unwrap();
        assert_eq!(state, StorageState::Thawed);
        assert_eq!(rule, EntryRule::AtArrival);
    }

    #[test]
    fn test_frozen_cargo_needs_frozen_truck() {
        assert!(
            transit_transition(TransportMode::Ambient, StorageState::Frozen, &BREADROOM).is_none()
        );
    }

    #[test]
    fn test_thawed_never_refrozen() {
        assert!(
            transit_transition(TransportMode::Frozen, StorageState::Thawed, &FROZEN_BUFFER)
                .is_none()
        );
    }

    #[test]
    fn test_ambient_transfer_keeps_entry() {
        let (state, rule) =
            transit_transition(TransportMode::Ambient, StorageState::Ambient, &BREADROOM).unwrap();
        assert_eq!(state, StorageState::Ambient);
        assert_eq!(rule, EntryRule::Keep);
    }
}
