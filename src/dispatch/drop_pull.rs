//! Drop-pull scheduling: incremental, per-order dock and vehicle selection against
//! whatever single candidate warehouse the caller names next. Grounded in
//! `app.py::drop_pull_scheduling` and `utils.py::find_earliest_and_efficient_dock`/
//! `find_closest_vehicle`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dispatch::external::ExternalDock;
use crate::dispatch::SchedulingContext;
use crate::error::SchedulingError;
use crate::ledger::{Ledger, LedgerEntry, LedgerMode};
use crate::matcher;
use crate::model::ids::CarriageId;
use crate::model::warehouse::Location;
use crate::model::{Dock, DockId, OrderId, OrderType, Vehicle, VehicleId, Warehouse, WarehouseId};
use crate::response::DropPullAssignment;
use crate::timefmt::wallclock_from_minutes;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropPullWarehouse {
    pub warehouse_id: WarehouseId,
    pub docks: Vec<ExternalDock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropPullOrderCarriage {
    pub order_id: OrderId,
    pub required_carriage: String,
    pub order_type: OrderType,
    pub carriage_id: CarriageId,
    pub carriage_location: Location,
    pub next_warehouse: DropPullWarehouse,
    pub perform_vehicle_matching: bool,
    pub perform_dock_matching: bool,
    pub add_cx_task: Option<bool>,
    pub sort_no: Option<i64>,
    pub current_dock_id: Option<DockId>,
    pub load: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropPullVehicle {
    pub vehicle_id: VehicleId,
    pub location: Location,
    pub vehicle_state: crate::model::vehicle::VehicleState,
    pub vehicle_workload: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropPullRequest {
    pub order_carriage_info: Vec<DropPullOrderCarriage>,
    pub vehicles: Vec<DropPullVehicle>,
}

/// Processes each entry independently against the shared drop-pull ledger, in the
/// order given (`sort_no` is carried through untouched, never used to reorder — see
/// `DESIGN.md`). Dock matching is skipped when `perform_dock_matching` is false, in
/// which case `dock_id` stays `None`; `current_dock_id` is always copied through
/// verbatim as opaque metadata, never read or substituted into `dock_id`.
pub fn drop_pull_scheduling(
    request: &DropPullRequest,
    ctx: &SchedulingContext,
    now: NaiveDateTime,
) -> Result<Vec<DropPullAssignment>, SchedulingError> {
    let mut vehicles: BTreeMap<VehicleId, Vehicle> = request
        .vehicles
        .iter()
        .map(|v| {
            (
                v.vehicle_id.clone(),
                Vehicle {
                    vehicle_id: v.vehicle_id.clone(),
                    location: v.location,
                    state: v.vehicle_state,
                    workload: v.vehicle_workload,
                },
            )
        })
        .collect();

    let ledger = Ledger::new(&ctx.drop_pull_schedule_path);
    let order_ids: Vec<OrderId> = request
        .order_carriage_info
        .iter()
        .map(|o| o.order_id.clone())
        .collect();
    let existing = ledger.load_raw()?;
    let mut busy = ledger.load_and_prepare(&order_ids, now)?;

    let mut rng = rand::rng();
    let mut assignments = Vec::new();
    let mut ledger_entries = Vec::new();

    for info in &request.order_carriage_info {
        let mut docks: BTreeMap<DockId, Dock> = BTreeMap::new();
        let mut dock_ids = Vec::new();
        for d in &info.next_warehouse.docks {
            dock_ids.push(d.dock_id.clone());
            docks.insert(
                d.dock_id.clone(),
                Dock {
                    dock_id: d.dock_id.clone(),
                    outbound_efficiency: d.outbound_efficiency,
                    inbound_efficiency: d.inbound_efficiency,
                    weight: d.weight,
                    dock_type: d.dock_type,
                    compatible_carriage: d.compatible_carriage.clone(),
                },
            );
        }
        let warehouse = Warehouse {
            warehouse_id: info.next_warehouse.warehouse_id.clone(),
            docks: dock_ids,
            location: None,
        };

        let mut dock_id = None;
        let mut lay_time = None;

        if info.perform_dock_matching {
            let direction = info.order_type.as_direction();
            if let Some(choice) = matcher::select_dock(
                &warehouse,
                &docks,
                direction,
                &info.required_carriage,
                info.load,
                &busy,
                &mut rng,
            ) {
                let start_minutes = choice.available_time;
                let end_minutes = start_minutes + choice.lay_time.round() as i64;
                busy
                    .entry((warehouse.warehouse_id.clone(), choice.dock_id.clone()))
                    .or_default()
                    .push(crate::ledger::BusyWindow {
                        start: start_minutes,
                        end: end_minutes,
                    });
                ledger_entries.push(LedgerEntry {
                    order_id: info.order_id.clone(),
                    warehouse_id: warehouse.warehouse_id.clone(),
                    dock_id: choice.dock_id.clone(),
                    start: wallclock_from_minutes(now, start_minutes),
                    end: wallclock_from_minutes(now, end_minutes),
                });
                lay_time = Some(choice.lay_time);
                dock_id = Some(choice.dock_id);
            }
        }

        let vehicle_id = if info.perform_vehicle_matching {
            let matched = matcher::select_vehicle(&vehicles, info.carriage_location)
                .map(|v| v.vehicle_id.clone());
            if let Some(vid) = &matched {
                vehicles.get_mut(vid).expect("matched vehicle exists").reserve();
            }
            matched
        } else {
            None
        };

        assignments.push(DropPullAssignment {
            order_id: info.order_id.clone(),
            warehouse_id: warehouse.warehouse_id.clone(),
            dock_id,
            vehicle_id,
            lay_time,
            perform_vehicle_matching: info.perform_vehicle_matching,
            perform_dock_matching: info.perform_dock_matching,
            current_dock_id: info.current_dock_id.clone(),
            add_cx_task: info.add_cx_task,
            sort_no: info.sort_no,
        });
    }

    let merged = Ledger::merge(existing, ledger_entries, LedgerMode::Drop, now, ctx.retention);
    ledger.save(&merged)?;

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dock::DockType;
    use crate::model::vehicle::VehicleState;

    #[test]
    fn e6_drop_pull_prefers_lower_workload_vehicle() {
        let request = DropPullRequest {
            order_carriage_info: vec![DropPullOrderCarriage {
                order_id: OrderId::new("1"),
                required_carriage: "A".to_string(),
                order_type: OrderType::Outbound,
                carriage_id: CarriageId::new("c1"),
                carriage_location: Location {
                    latitude: 30.0,
                    longitude: 120.0,
                },
                next_warehouse: DropPullWarehouse {
                    warehouse_id: WarehouseId::new("10"),
                    docks: vec![ExternalDock {
                        dock_id: DockId::new("100"),
                        outbound_efficiency: 1.0,
                        inbound_efficiency: 1.0,
                        weight: 1.0,
                        dock_type: DockType::Dual,
                        compatible_carriage: vec!["A".to_string()],
                    }],
                },
                perform_vehicle_matching: true,
                perform_dock_matching: false,
                add_cx_task: Some(true),
                sort_no: Some(1),
                current_dock_id: Some(DockId::new("100")),
                load: 10,
            }],
            vehicles: vec![
                DropPullVehicle {
                    vehicle_id: VehicleId::new("busy"),
                    location: Location {
                        latitude: 30.0,
                        longitude: 120.1,
                    },
                    vehicle_state: VehicleState::Idle,
                    vehicle_workload: 10,
                },
                DropPullVehicle {
                    vehicle_id: VehicleId::new("free"),
                    location: Location {
                        latitude: 30.1,
                        longitude: 120.0,
                    },
                    vehicle_state: VehicleState::Idle,
                    vehicle_workload: 0,
                },
            ],
        };
        let ctx = SchedulingContext {
            drop_pull_schedule_path: std::env::temp_dir().join(format!(
                "dock_scheduler_test_e6_{}.csv",
                std::process::id()
            )),
            ..SchedulingContext::default()
        };
        let now = crate::timefmt::parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
        let assignments = drop_pull_scheduling(&request, &ctx, now).unwrap();
        assert_eq!(assignments[0].vehicle_id, Some(VehicleId::new("free")));
        assert_eq!(assignments[0].dock_id, None);
        assert_eq!(assignments[0].current_dock_id, Some(DockId::new("100")));
        let _ = std::fs::remove_file(&ctx.drop_pull_schedule_path);
    }
}
