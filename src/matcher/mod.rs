//! The incremental dock/carriage/vehicle matcher used by drop-pull and internal
//! queueing. Grounded in `utils.py::find_earliest_and_efficient_dock`,
//! `haversine_distance`, and `find_closest_vehicle`.

use std::collections::BTreeMap;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::ledger::BusyWindow;
use crate::model::dock::OrderDirection;
use crate::model::{Carriage, CarriageId, Dock, DockId, Vehicle, VehicleId, Warehouse, WarehouseId};
use crate::model::warehouse::Location;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers.
pub fn haversine(a: Location, b: Location) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

#[derive(Debug, Clone, Copy)]
pub struct DockChoice {
    pub dock_id: DockId,
    pub available_time: i64,
    pub lay_time: f64,
}

/// Picks the earliest-available, carriage-compatible dock at `warehouse`, tie-broken
/// by historical-load-adjusted efficiency, then insertion order, then a uniform random
/// draw among exact ties (spec §4.5).
pub fn select_dock(
    warehouse: &Warehouse,
    docks: &BTreeMap<DockId, Dock>,
    direction: OrderDirection,
    required_carriage: &str,
    load: i64,
    busy: &BTreeMap<(WarehouseId, DockId), Vec<BusyWindow>>,
    rng: &mut impl Rng,
) -> Option<DockChoice> {
    struct Candidate {
        dock_id: DockId,
        available_time: i64,
        adjusted_efficiency: f64,
        efficiency: f64,
    }

    let mut candidates = Vec::new();
    for dock_id in &warehouse.docks {
        let Some(dock) = docks.get(dock_id) else {
            continue;
        };
        if !dock.admits(direction, required_carriage) {
            continue;
        }
        let windows = busy.get(&(warehouse.warehouse_id.clone(), dock_id.clone()));
        let available_time = windows
            .map(|ws| ws.iter().map(|w| w.end).max().unwrap_or(0))
            .unwrap_or(0)
            .max(0);
        let historical_load = windows.map(|ws| ws.len() as f64).unwrap_or(0.0);
        let efficiency = dock.efficiency_for(direction);
        candidates.push(Candidate {
            dock_id: dock_id.clone(),
            available_time,
            adjusted_efficiency: efficiency / (historical_load + 1.0),
            efficiency,
        });
    }

    if candidates.is_empty() {
        return None;
    }

    let best_available = candidates.iter().map(|c| c.available_time).min().unwrap();
    let best_efficiency = candidates
        .iter()
        .filter(|c| c.available_time == best_available)
        .map(|c| c.adjusted_efficiency)
        .fold(f64::MIN, f64::max);

    let tied: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| {
            c.available_time == best_available
                && (c.adjusted_efficiency - best_efficiency).abs() < 1e-9
        })
        .collect();

    let chosen = if tied.len() == 1 {
        tied[0]
    } else {
        tied.choose(rng).expect("tied is non-empty")
    };

    Some(DockChoice {
        dock_id: chosen.dock_id.clone(),
        available_time: chosen.available_time,
        lay_time: load as f64 / chosen.efficiency,
    })
}

/// Picks a carriage to serve `warehouse`: prefers one already idle at `dock_id` of the
/// required type; otherwise the nearest idle carriage of that type.
pub fn select_carriage<'a>(
    carriages: &'a BTreeMap<CarriageId, Carriage>,
    dock_id: &DockId,
    warehouse_location: Location,
    required_carriage: &str,
) -> Option<&'a Carriage> {
    if let Some(at_dock) = carriages.values().find(|c| {
        c.is_idle() && c.carriage_type == required_carriage && c.current_dock_id.as_ref() == Some(dock_id)
    }) {
        return Some(at_dock);
    }

    carriages
        .values()
        .filter(|c| c.is_idle() && c.carriage_type == required_carriage)
        .min_by(|a, b| {
            let da = haversine(a.location, warehouse_location);
            let db = haversine(b.location, warehouse_location);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Picks an idle vehicle minimizing `distance + workload_factor`, where
/// `workload_factor = max(0, 1 + (workload - mean_workload) / mean_workload)`
/// (`1` when `mean_workload` is zero). `mean_workload` is the mean over *all* vehicles
/// passed in, not only the idle candidates — matching `find_closest_vehicle`.
pub fn select_vehicle<'a>(
    vehicles: &'a BTreeMap<VehicleId, Vehicle>,
    carriage_location: Location,
) -> Option<&'a Vehicle> {
    if vehicles.is_empty() {
        return None;
    }
    let mean_workload: f64 =
        vehicles.values().map(|v| v.workload as f64).sum::<f64>() / vehicles.len() as f64;

    vehicles
        .values()
        .filter(|v| v.is_idle())
        .min_by(|a, b| {
            let score_a = vehicle_score(a, carriage_location, mean_workload);
            let score_b = vehicle_score(b, carriage_location, mean_workload);
            score_a.partial_cmp(&score_b).unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn vehicle_score(vehicle: &Vehicle, carriage_location: Location, mean_workload: f64) -> f64 {
    let distance = haversine(vehicle.location, carriage_location);
    let workload_factor = if mean_workload == 0.0 {
        1.0
    } else {
        (1.0 + (vehicle.workload as f64 - mean_workload) / mean_workload).max(0.0)
    };
    distance + workload_factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vehicle::VehicleState;

    #[test]
    fn haversine_is_symmetric_and_zero_for_same_point() {
        let a = Location {
            latitude: 30.0,
            longitude: 120.0,
        };
        let b = Location {
            latitude: 31.5,
            longitude: 121.2,
        };
        assert_eq!(haversine(a, a), 0.0);
        assert!((haversine(a, b) - haversine(b, a)).abs() < 1e-9);
        assert!(haversine(a, b) > 0.0);
    }

    #[test]
    fn select_vehicle_prefers_lower_workload_when_distance_comparable() {
        let carriage_at = Location {
            latitude: 30.0,
            longitude: 120.0,
        };
        let mut vehicles = BTreeMap::new();
        vehicles.insert(
            VehicleId::new("busy"),
            Vehicle {
                vehicle_id: VehicleId::new("busy"),
                location: Location {
                    latitude: 30.0,
                    longitude: 120.1,
                },
                state: VehicleState::Idle,
                workload: 10,
            },
        );
        vehicles.insert(
            VehicleId::new("free"),
            Vehicle {
                vehicle_id: VehicleId::new("free"),
                location: Location {
                    latitude: 30.1,
                    longitude: 120.0,
                },
                state: VehicleState::Idle,
                workload: 0,
            },
        );
        let chosen = select_vehicle(&vehicles, carriage_at).unwrap();
        assert_eq!(chosen.vehicle_id, VehicleId::new("free"));
    }
}
