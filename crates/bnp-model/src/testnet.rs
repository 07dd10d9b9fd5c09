//! Canonical small networks for tests and examples.
//!
//! These mirror the production topology at toy scale: a single site, a
//! hub-spoke pair, and the frozen-buffer route with thaw-on-arrival.

use bnp_core::{
    CostStructure, Forecast, ForecastEntry, InitialInventory, LaborCalendar, LaborDay, Location,
    Network, NodeKind, PlanInputs, Product, RouteLeg, StorageModes, TransportMode, TruckSchedule,
    TruckSchedules,
};
use bnp_core::{DepartureWindow, LoadingPolicy};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub const START: &str = "2026-06-01"; // a Monday

pub fn start_date() -> NaiveDate {
    START.parse().unwrap()
}

pub fn default_costs() -> CostStructure {
    CostStructure {
        production_cost_per_unit: 1.2,
        holding_cost_per_pallet_day_frozen: 0.8,
        holding_cost_per_pallet_day_ambient: 0.4,
        changeover_cost_per_start: 150.0,
        shortage_penalty_per_unit: 20.0,
        disposal_penalty_per_unit: 0.5,
        freshness_weight: 0.05,
    }
}

/// Weekday-fixed calendar: 12 fixed hours at $330/$660, weekends at $1320.
pub fn calendar(start: NaiveDate, days: i64) -> LaborCalendar {
    LaborCalendar::from_days((0..days).map(|i| {
        let date = start + Duration::days(i);
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => LaborDay::non_fixed(date, 1320.0),
            _ => LaborDay::fixed(date, 12.0, 330.0, 660.0),
        }
    }))
}

pub fn ambient_location(id: &str, kind: NodeKind) -> Location {
    Location {
        id: id.into(),
        kind,
        storage: StorageModes {
            frozen: false,
            ambient: true,
        },
        capacity_units: None,
    }
}

pub fn frozen_location(id: &str, kind: NodeKind) -> Location {
    Location {
        id: id.into(),
        kind,
        storage: StorageModes {
            frozen: true,
            ambient: false,
        },
        capacity_units: None,
    }
}

/// A truck running every day of the week.
pub fn daily_truck(id: &str, origin: &str, stops: &[&str], loading: LoadingPolicy) -> TruckSchedule {
    TruckSchedule {
        id: id.into(),
        origin: origin.into(),
        stops: stops.iter().map(|s| s.to_string()).collect(),
        weekdays: vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ],
        departure: DepartureWindow::Afternoon,
        pallet_capacity: 44,
        loading,
    }
}

/// Manufacturing only: one product, demand at the site itself.
pub fn single_site() -> PlanInputs {
    let start = start_date();
    let mut network = Network::new();
    network
        .add_location(ambient_location("MFG", NodeKind::Manufacturing))
        .unwrap();

    PlanInputs {
        network,
        products: vec![Product::new("SKU-WHITE")],
        forecast: Forecast::new(vec![ForecastEntry {
            location: "MFG".into(),
            product: "SKU-WHITE".into(),
            date: start,
            units: 1000.0,
        }]),
        labor: calendar(start, 7),
        trucks: TruckSchedules::default(),
        costs: default_costs(),
        initial_inventory: InitialInventory::empty(),
    }
}

/// Manufacturing plus one hub over a one-day ambient leg.
pub fn hub_spoke() -> PlanInputs {
    let start = start_date();
    let mut network = Network::new();
    network
        .add_location(ambient_location("MFG", NodeKind::Manufacturing))
        .unwrap();
    network
        .add_location(ambient_location("HUB-NSW", NodeKind::Hub))
        .unwrap();
    network
        .add_leg(RouteLeg {
            name: "MFG->HUB-NSW".into(),
            from: "MFG".into(),
            to: "HUB-NSW".into(),
            transit_days: 1,
            mode: TransportMode::Ambient,
            cost_per_unit: 0.1,
            capacity_units: None,
        })
        .unwrap();

    PlanInputs {
        network,
        products: vec![Product::new("SKU-WHITE")],
        forecast: Forecast::new(vec![ForecastEntry {
            location: "HUB-NSW".into(),
            product: "SKU-WHITE".into(),
            date: start + Duration::days(1),
            units: 500.0,
        }]),
        labor: calendar(start, 7),
        trucks: TruckSchedules::new(vec![daily_truck(
            "T-NSW",
            "MFG",
            &["HUB-NSW"],
            LoadingPolicy::SameDay,
        )]),
        costs: default_costs(),
        initial_inventory: InitialInventory::empty(),
    }
}

/// The frozen-buffer route: ambient production freezes at loading, sits in
/// the buffer, and thaws on arrival at the breadroom.
pub fn frozen_route() -> PlanInputs {
    let start = start_date();
    let mut network = Network::new();
    network
        .add_location(ambient_location("MFG", NodeKind::Manufacturing))
        .unwrap();
    network
        .add_location(frozen_location("BUF-WA", NodeKind::Storage))
        .unwrap();
    network
        .add_location(ambient_location("BR-6104", NodeKind::Breadroom))
        .unwrap();
    network
        .add_leg(RouteLeg {
            name: "MFG->BUF-WA".into(),
            from: "MFG".into(),
            to: "BUF-WA".into(),
            transit_days: 1,
            mode: TransportMode::Frozen,
            cost_per_unit: 0.2,
            capacity_units: None,
        })
        .unwrap();
    network
        .add_leg(RouteLeg {
            name: "BUF-WA->BR-6104".into(),
            from: "BUF-WA".into(),
            to: "BR-6104".into(),
            transit_days: 1,
            mode: TransportMode::Frozen,
            cost_per_unit: 0.3,
            capacity_units: None,
        })
        .unwrap();

    PlanInputs {
        network,
        products: vec![Product::new("SKU-WHITE")],
        forecast: Forecast::new(vec![ForecastEntry {
            location: "BR-6104".into(),
            product: "SKU-WHITE".into(),
            date: start + Duration::days(9),
            units: 320.0,
        }]),
        labor: calendar(start, 14),
        trucks: TruckSchedules::new(vec![
            daily_truck("T-BUF", "MFG", &["BUF-WA"], LoadingPolicy::SameDay),
            daily_truck("T-WA", "BUF-WA", &["BR-6104"], LoadingPolicy::SameDay),
        ]),
        costs: default_costs(),
        initial_inventory: InitialInventory::empty(),
    }
}
