//! Internal queueing: route planning plus greedy dock/carriage/vehicle matching for
//! intra-site moves. Grounded in `internal_utils.py::schedule_internal_orders` and
//! `app.py`'s `/internal_queueing` handler.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dispatch::external::{ExternalDock, ExternalWarehouse};
use crate::dispatch::SchedulingContext;
use crate::error::SchedulingError;
use crate::ledger::{BusyWindow, Ledger, LedgerEntry, LedgerMode};
use crate::matcher;
use crate::model::carriage::CarriageState;
use crate::model::ids::CarriageId;
use crate::model::order::{Operation, WarehouseLoad};
use crate::model::vehicle::VehicleState;
use crate::model::{Carriage, Dock, DockId, Order, OrderId, OrderType, Vehicle, VehicleId, Warehouse, WarehouseId};
use crate::response::{shape_internal, InternalResponse};
use crate::route;
use crate::timefmt::wallclock_from_minutes;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalWarehouseLoad {
    pub warehouse_id: WarehouseId,
    pub item_code: String,
    pub load: i64,
    #[serde(rename = "loadUnloadStatus")]
    pub load_unload_status: Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalOrder {
    pub order_id: OrderId,
    pub warehouse_loads: Vec<InternalWarehouseLoad>,
    pub priority: i64,
    pub sequential: bool,
    pub required_carriage: String,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalVehicle {
    pub vehicle_id: VehicleId,
    pub location: crate::model::warehouse::Location,
    pub vehicle_state: VehicleState,
    pub vehicle_workload: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalCarriage {
    pub carriage_id: CarriageId,
    pub location: crate::model::warehouse::Location,
    pub carriage_type: String,
    pub carriage_state: CarriageState,
    pub current_dock_id: Option<DockId>,
    pub current_warehouse_id: Option<WarehouseId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalRequest {
    pub warehouses: Vec<ExternalWarehouse>,
    pub orders: Vec<InternalOrder>,
    pub vehicles: Vec<InternalVehicle>,
    pub carriages: Vec<InternalCarriage>,
}

fn to_order(order: &InternalOrder) -> Order {
    Order {
        order_id: order.order_id.clone(),
        warehouse_loads: order
            .warehouse_loads
            .iter()
            .map(|wl| WarehouseLoad {
                warehouse_id: wl.warehouse_id.clone(),
                cargo_type: wl.item_code.clone(),
                quantity: wl.load,
                operation: wl.load_unload_status,
            })
            .collect(),
        priority: order.priority,
        sequential: order.sequential,
        required_carriage: order.required_carriage.clone(),
        order_type: order.order_type,
    }
}

fn dock_from_wire(dock: &ExternalDock) -> Dock {
    Dock {
        dock_id: dock.dock_id.clone(),
        outbound_efficiency: dock.outbound_efficiency,
        inbound_efficiency: dock.inbound_efficiency,
        weight: dock.weight,
        dock_type: dock.dock_type,
        compatible_carriage: dock.compatible_carriage.clone(),
    }
}

/// Greedily walks each order's internal route, picking the earliest-available
/// compatible dock and the closest idle carriage/vehicle at each leg, reserving both
/// in-memory before moving to the next order (spec §4.5). Orders are processed in
/// the priority order they were given, highest first.
pub fn internal_orders_queueing(
    request: &InternalRequest,
    ctx: &SchedulingContext,
    now: NaiveDateTime,
) -> Result<InternalResponse, SchedulingError> {
    let mut docks: BTreeMap<DockId, Dock> = BTreeMap::new();
    let mut warehouses: BTreeMap<WarehouseId, Warehouse> = BTreeMap::new();
    for w in &request.warehouses {
        let mut dock_ids = Vec::new();
        for d in &w.docks {
            dock_ids.push(d.dock_id.clone());
            docks.insert(d.dock_id.clone(), dock_from_wire(d));
        }
        warehouses.insert(
            w.warehouse_id.clone(),
            Warehouse {
                warehouse_id: w.warehouse_id.clone(),
                docks: dock_ids,
                location: None,
            },
        );
    }

    let mut carriages: BTreeMap<CarriageId, Carriage> = request
        .carriages
        .iter()
        .map(|c| {
            (
                c.carriage_id.clone(),
                Carriage {
                    carriage_id: c.carriage_id.clone(),
                    location: c.location,
                    carriage_type: c.carriage_type.clone(),
                    state: c.carriage_state,
                    current_dock_id: c.current_dock_id.clone(),
                    current_warehouse_id: c.current_warehouse_id.clone(),
                },
            )
        })
        .collect();

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

    let mut orders: Vec<Order> = request.orders.iter().map(to_order).collect();
    orders.sort_by(|a, b| b.priority.cmp(&a.priority));

    let ledger = Ledger::new(&ctx.internal_schedule_path);
    let order_ids: Vec<OrderId> = orders.iter().map(|o| o.order_id.clone()).collect();
    let existing = ledger.load_raw()?;
    let mut busy = ledger.load_and_prepare(&order_ids, now)?;

    let mut rng = rand::rng();
    let mut order_sequences: BTreeMap<OrderId, Vec<WarehouseId>> = BTreeMap::new();
    let mut raw_assignments: BTreeMap<
        OrderId,
        Vec<(WarehouseId, DockId, Option<CarriageId>, Option<VehicleId>, f64)>,
    > = BTreeMap::new();
    let mut ledger_entries: Vec<LedgerEntry> = Vec::new();

    for order in &orders {
        let route = route::internal_route(order);
        order_sequences.insert(order.order_id.clone(), route.clone());

        let direction = order.order_type.as_direction();
        let mut records = Vec::new();

        for warehouse_id in route {
            let Some(warehouse) = warehouses.get(&warehouse_id) else {
                continue;
            };
            let load = order.load_at(&warehouse_id);
            let choice = matcher::select_dock(
                warehouse,
                &docks,
                direction,
                &order.required_carriage,
                load,
                &busy,
                &mut rng,
            );
            let Some(choice) = choice else {
                // No admitting dock at this warehouse for this order's direction and
                // carriage type: nothing to assign for this leg.
                continue;
            };

            let warehouse_location = warehouse
                .location
                .unwrap_or(crate::model::warehouse::Location {
                    latitude: 0.0,
                    longitude: 0.0,
                });
            let carriage_id = matcher::select_carriage(
                &carriages,
                &choice.dock_id,
                warehouse_location,
                &order.required_carriage,
            )
            .map(|c| c.carriage_id.clone());

            let vehicle_id = carriage_id.as_ref().and_then(|cid| {
                let carriage_location = carriages[cid].location;
                matcher::select_vehicle(&vehicles, carriage_location).map(|v| v.vehicle_id.clone())
            });

            if let Some(cid) = &carriage_id {
                carriages.get_mut(cid).expect("matched carriage exists").reserve();
            }
            if let Some(vid) = &vehicle_id {
                vehicles.get_mut(vid).expect("matched vehicle exists").reserve();
            }

            let start_minutes = choice.available_time;
            let end_minutes = start_minutes + choice.lay_time.round() as i64;
            busy
                .entry((warehouse_id.clone(), choice.dock_id.clone()))
                .or_default()
                .push(BusyWindow {
                    start: start_minutes,
                    end: end_minutes,
                });

            if carriage_id.is_some() {
                ledger_entries.push(LedgerEntry {
                    order_id: order.order_id.clone(),
                    warehouse_id: warehouse_id.clone(),
                    dock_id: choice.dock_id.clone(),
                    start: wallclock_from_minutes(now, start_minutes),
                    end: wallclock_from_minutes(now, end_minutes),
                });
            }

            records.push((
                warehouse_id.clone(),
                choice.dock_id.clone(),
                carriage_id,
                vehicle_id,
                choice.lay_time,
            ));
        }

        raw_assignments.insert(order.order_id.clone(), records);
    }

    let merged = Ledger::merge(existing, ledger_entries, LedgerMode::Queue, now, ctx.retention);
    ledger.save(&merged)?;

    Ok(shape_internal(order_sequences, raw_assignments))
}
