//! The assembled input bundle and its pre-solve validation.

use crate::calendar::LaborCalendar;
use crate::costs::CostStructure;
use crate::diagnostics::Diagnostics;
use crate::error::{PlanError, PlanResult};
use crate::forecast::Forecast;
use crate::inventory::InitialInventory;
use crate::state::StorageState;
use crate::trucks::TruckSchedules;
use crate::{Network, Product};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything the planner consumes, parsed and typed.
///
/// Upstream ingestion (spreadsheets, IBP exports) is an adapter concern;
/// this bundle is the boundary.
#[derive(Debug, Clone)]
pub struct PlanInputs {
    pub network: Network,
    pub products: Vec<Product>,
    pub forecast: Forecast,
    pub labor: LaborCalendar,
    pub trucks: TruckSchedules,
    pub costs: CostStructure,
    pub initial_inventory: InitialInventory,
}

/// Serialized form of [`PlanInputs`] (the network flattened to tables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanInputsFile {
    pub locations: Vec<crate::Location>,
    pub legs: Vec<crate::RouteLeg>,
    pub products: Vec<Product>,
    pub forecast: Forecast,
    pub labor: LaborCalendar,
    pub trucks: TruckSchedules,
    pub costs: CostStructure,
    #[serde(default)]
    pub initial_inventory: InitialInventory,
}

impl PlanInputs {
    /// Assemble from the flattened file form, wiring the network graph.
    pub fn from_file(file: PlanInputsFile) -> PlanResult<Self> {
        let mut network = Network::new();
        for location in file.locations {
            network.add_location(location)?;
        }
        for leg in file.legs {
            network.add_leg(leg)?;
        }
        Ok(Self {
            network,
            products: file.products,
            forecast: file.forecast,
            labor: file.labor,
            trucks: file.trucks,
            costs: file.costs,
            initial_inventory: file.initial_inventory,
        })
    }

    /// Pre-solve validation. Collects every issue, then fails fast if any
    /// error-severity issue was found, naming the first offending record.
    pub fn validate(&self) -> PlanResult<Diagnostics> {
        let mut diag = Diagnostics::new();

        self.network.manufacturing().map_err(|e| {
            PlanError::Input(format!("network: {e}"))
        })?;

        let product_ids: HashSet<&str> = self.products.iter().map(|p| p.id.as_str()).collect();
        if product_ids.len() != self.products.len() {
            diag.add_error("products", "duplicate product ids");
        }
        if self.products.is_empty() {
            diag.add_error("products", "no products defined");
        }

        for entry in &self.forecast.entries {
            let entity = format!(
                "forecast[{}, {}, {}]",
                entry.location, entry.product, entry.date
            );
            match self.network.location(&entry.location) {
                None => diag.add_error_with_entity(
                    "forecast",
                    format!("unknown location '{}'", entry.location),
                    entity.clone(),
                ),
                Some(loc) if !loc.storage.ambient => diag.add_error_with_entity(
                    "forecast",
                    "demand at a location without ambient storage",
                    entity.clone(),
                ),
                Some(_) => {}
            }
            if !product_ids.contains(entry.product.as_str()) {
                diag.add_error_with_entity(
                    "forecast",
                    format!("unknown product '{}'", entry.product),
                    entity.clone(),
                );
            }
            if entry.units < 0.0 || !entry.units.is_finite() {
                diag.add_error_with_entity(
                    "forecast",
                    format!("negative or non-finite quantity {}", entry.units),
                    entity,
                );
            }
        }

        for day in self.labor.iter() {
            if day.is_fixed_day && day.fixed_hours <= 0.0 {
                diag.add_error_with_entity(
                    "labor",
                    "fixed day with a zero fixed-hour block",
                    day.date.to_string(),
                );
            }
            if day.regular_rate < 0.0 || day.overtime_rate < 0.0 || day.non_fixed_rate < 0.0 {
                diag.add_error_with_entity("labor", "negative labor rate", day.date.to_string());
            }
        }

        let mut truck_ids = HashSet::new();
        for truck in &self.trucks.schedules {
            if !truck_ids.insert(truck.id.as_str()) {
                diag.add_error_with_entity("trucks", "duplicate truck id", truck.id.clone());
            }
            if truck.pallet_capacity == 0 {
                diag.add_error_with_entity("trucks", "zero pallet capacity", truck.id.clone());
            }
            if truck.stops.is_empty() {
                diag.add_error_with_entity("trucks", "empty stop list", truck.id.clone());
            }
            if truck.weekdays.is_empty() {
                diag.add_warning(
                    "trucks",
                    format!("truck '{}' has no service days and will never run", truck.id),
                );
            }
            if self.network.location(&truck.origin).is_none() {
                diag.add_error_with_entity(
                    "trucks",
                    format!("unknown origin '{}'", truck.origin),
                    truck.id.clone(),
                );
            }
            for stop in &truck.stops {
                if self.network.location(stop).is_none() {
                    diag.add_error_with_entity(
                        "trucks",
                        format!("unknown stop '{stop}'"),
                        truck.id.clone(),
                    );
                }
            }
        }

        for stock in &self.initial_inventory.entries {
            let entity = format!(
                "initial_inventory[{}, {}, {}]",
                stock.location, stock.product, stock.state
            );
            match self.network.location(&stock.location) {
                None => diag.add_error_with_entity(
                    "inventory",
                    format!("unknown location '{}'", stock.location),
                    entity.clone(),
                ),
                Some(loc) if !loc.storage.supports(stock.state) => diag.add_error_with_entity(
                    "inventory",
                    format!(
                        "{} stock at a location without {} storage",
                        stock.state,
                        match stock.state {
                            StorageState::Frozen => "frozen",
                            _ => "ambient",
                        }
                    ),
                    entity.clone(),
                ),
                Some(_) => {}
            }
            if !product_ids.contains(stock.product.as_str()) {
                diag.add_error_with_entity(
                    "inventory",
                    format!("unknown product '{}'", stock.product),
                    entity.clone(),
                );
            }
            if stock.units < 0.0 || !stock.units.is_finite() {
                diag.add_error_with_entity(
                    "inventory",
                    format!("negative or non-finite quantity {}", stock.units),
                    entity,
                );
            }
        }

        if diag.has_errors() {
            let first = diag.first_error().map(|i| i.to_string()).unwrap_or_default();
            return Err(PlanError::Input(format!(
                "{} input error(s); first: {first}",
                diag.error_count()
            )));
        }
        Ok(diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::LaborDay;
    use crate::forecast::ForecastEntry;
    use crate::state::{StorageModes, TransportMode};
    use crate::{Location, NodeKind, RouteLeg};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn valid_inputs() -> PlanInputs {
        let mut network = Network::new();
        network
            .add_location(Location {
                id: "MFG".into(),
                kind: NodeKind::Manufacturing,
                storage: StorageModes {
                    frozen: false,
                    ambient: true,
                },
                capacity_units: None,
            })
            .unwrap();
        network
            .add_location(Location {
                id: "BR-6104".into(),
                kind: NodeKind::Breadroom,
                storage: StorageModes {
                    frozen: false,
                    ambient: true,
                },
                capacity_units: None,
            })
            .unwrap();
        network
            .add_leg(RouteLeg {
                name: "MFG->BR-6104".into(),
                from: "MFG".into(),
                to: "BR-6104".into(),
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
                location: "BR-6104".into(),
                product: "SKU-WHITE".into(),
                date: d("2026-06-02"),
                units: 500.0,
            }]),
            labor: LaborCalendar::from_days([
                LaborDay::fixed(d("2026-06-01"), 12.0, 330.0, 660.0),
                LaborDay::fixed(d("2026-06-02"), 12.0, 330.0, 660.0),
            ]),
            trucks: TruckSchedules::default(),
            costs: CostStructure {
                production_cost_per_unit: 1.2,
                holding_cost_per_pallet_day_frozen: 0.8,
                holding_cost_per_pallet_day_ambient: 0.4,
                changeover_cost_per_start: 150.0,
                shortage_penalty_per_unit: 20.0,
                disposal_penalty_per_unit: 0.5,
                freshness_weight: 0.05,
            },
            initial_inventory: InitialInventory::empty(),
        }
    }

    #[test]
    fn test_valid_inputs_pass() {
        let diag = valid_inputs().validate().unwrap();
        assert!(!diag.has_errors());
    }

    #[test]
    fn test_unknown_forecast_product_fails_with_record() {
        let mut inputs = valid_inputs();
        inputs.forecast.entries[0].product = "SKU-NONE".into();

        let err = inputs.validate().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("SKU-NONE"), "{text}");
        assert!(text.contains("forecast["), "{text}");
    }

    #[test]
    fn test_negative_quantity_fails() {
        let mut inputs = valid_inputs();
        inputs.forecast.entries[0].units = -1.0;
        assert!(inputs.validate().is_err());
    }

    #[test]
    fn test_frozen_stock_needs_frozen_storage() {
        let mut inputs = valid_inputs();
        inputs.initial_inventory.entries.push(crate::InitialStock {
            location: "BR-6104".into(),
            product: "SKU-WHITE".into(),
            state: StorageState::Frozen,
            units: 320.0,
        });
        let err = inputs.validate().unwrap_err();
        assert!(err.to_string().contains("frozen"));
    }
}
