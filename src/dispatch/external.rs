//! External queueing: batch MILP optimization for inbound/outbound orders arriving
//! from outside. Runs two stage-1/stage-2 passes — loading (outbound) then unloading
//! (inbound) — sharing one ledger, per §5's ordering guarantee. Grounded in
//! `app.py`'s `/external_queueing` handler and `lp.py::create_lp_model`/`create_queue_model`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dispatch::SchedulingContext;
use crate::error::SchedulingError;
use crate::ledger::{Ledger, LedgerMode};
use crate::lp;
use crate::model::dock::OrderDirection;
use crate::model::{Dock, DockId, DockType, Order, OrderId, OrderType, Warehouse, WarehouseId};
use crate::model::order::{Operation, WarehouseLoad};
use crate::response::{shape_external, ExternalResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalDock {
    pub dock_id: DockId,
    pub outbound_efficiency: f64,
    pub inbound_efficiency: f64,
    pub weight: f64,
    pub dock_type: DockType,
    pub compatible_carriage: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalWarehouse {
    pub warehouse_id: WarehouseId,
    pub docks: Vec<ExternalDock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalWarehouseLoad {
    pub warehouse_id: WarehouseId,
    pub load: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalOrder {
    pub order_id: OrderId,
    pub warehouse_loads: Vec<ExternalWarehouseLoad>,
    pub priority: i64,
    pub sequential: bool,
    pub required_carriage: String,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalRequest {
    pub warehouses: Vec<ExternalWarehouse>,
    pub orders: Vec<ExternalOrder>,
}

fn to_order(order: &ExternalOrder) -> Order {
    // An external order carries a single direction; each warehouse_load's operation
    // is derived from it rather than stated on the wire (unlike internal queueing,
    // where load/unload can be mixed within one order).
    let operation = match order.order_type {
        OrderType::Inbound => Operation::Unload,
        OrderType::Outbound => Operation::Load,
    };
    Order {
        order_id: order.order_id.clone(),
        warehouse_loads: order
            .warehouse_loads
            .iter()
            .map(|wl| WarehouseLoad {
                warehouse_id: wl.warehouse_id.clone(),
                cargo_type: String::new(),
                quantity: wl.load,
                operation,
            })
            .collect(),
        priority: order.priority,
        sequential: order.sequential,
        required_carriage: order.required_carriage.clone(),
        order_type: order.order_type,
    }
}

pub fn external_orders_queueing(
    request: &ExternalRequest,
    ctx: &SchedulingContext,
    now: NaiveDateTime,
) -> Result<ExternalResponse, SchedulingError> {
    let mut docks: BTreeMap<DockId, Dock> = BTreeMap::new();
    let mut warehouses: Vec<Warehouse> = Vec::new();
    for w in &request.warehouses {
        let mut dock_ids = Vec::new();
        for d in &w.docks {
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
        warehouses.push(Warehouse {
            warehouse_id: w.warehouse_id.clone(),
            docks: dock_ids,
            location: None,
        });
    }

    let orders: Vec<Order> = request.orders.iter().map(to_order).collect();
    for order in &orders {
        if order.required_carriage.is_empty() {
            return Err(SchedulingError::InputMalformed {
                order: order.order_id.clone(),
                reason: "required_carriage is empty".to_string(),
            });
        }
    }

    let ledger = Ledger::new(&ctx.local_schedule_path);
    let loading_orders: Vec<Order> = orders
        .iter()
        .filter(|o| o.order_type == OrderType::Outbound)
        .cloned()
        .collect();
    let unloading_orders: Vec<Order> = orders
        .iter()
        .filter(|o| o.order_type == OrderType::Inbound)
        .cloned()
        .collect();

    let mut combined = ExternalResponse {
        order_sequences: BTreeMap::new(),
        order_dock_assignments: BTreeMap::new(),
        docks_queues: BTreeMap::new(),
    };

    for (direction, pass_orders) in [
        (OrderDirection::Outbound, &loading_orders),
        (OrderDirection::Inbound, &unloading_orders),
    ] {
        if pass_orders.is_empty() {
            continue;
        }
        run_pass(
            pass_orders,
            direction,
            &warehouses,
            &docks,
            &ledger,
            ctx,
            now,
            &mut combined,
        )?;
    }

    Ok(combined)
}

#[allow(clippy::too_many_arguments)]
fn run_pass(
    pass_orders: &[Order],
    direction: OrderDirection,
    warehouses: &[Warehouse],
    docks: &BTreeMap<DockId, Dock>,
    ledger: &Ledger,
    ctx: &SchedulingContext,
    now: NaiveDateTime,
    combined: &mut ExternalResponse,
) -> Result<(), SchedulingError> {
    let order_ids: Vec<OrderId> = pass_orders.iter().map(|o| o.order_id.clone()).collect();
    let existing = ledger.load_raw()?;
    let loaded = ledger.load_and_prepare(&order_ids, now)?;
    let busy = Ledger::compute_busy(&loaded);
    let existing_busy: BTreeMap<(WarehouseId, DockId), i64> =
        busy.iter().map(|(k, (total, _))| (k.clone(), *total)).collect();

    let stage1 = lp::solve_stage1(pass_orders, warehouses, docks, &existing_busy, direction)?;
    let stage2 = lp::solve_stage2(
        pass_orders,
        &stage1.assignment,
        docks,
        direction,
        &loaded,
        ctx.tau,
        ctx.big_m,
    )?;

    let (shaped, new_entries) = shape_external(&stage1, &stage2, now);
    let merged = Ledger::merge(existing, new_entries, LedgerMode::Queue, now, ctx.retention);
    ledger.save(&merged)?;

    combined.order_sequences.extend(shaped.order_sequences);
    combined.order_dock_assignments.extend(shaped.order_dock_assignments);
    for (dock_id, entries) in shaped.docks_queues {
        combined.docks_queues.entry(dock_id).or_default().extend(entries);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e1_single_order_single_dock() {
        let request = ExternalRequest {
            warehouses: vec![ExternalWarehouse {
                warehouse_id: WarehouseId::new("10"),
                docks: vec![ExternalDock {
                    dock_id: DockId::new("100"),
                    outbound_efficiency: 1.0,
                    inbound_efficiency: 1.0,
                    weight: 1.0,
                    dock_type: DockType::Dual,
                    compatible_carriage: vec!["A".to_string()],
                }],
            }],
            orders: vec![ExternalOrder {
                order_id: OrderId::new("1"),
                warehouse_loads: vec![ExternalWarehouseLoad {
                    warehouse_id: WarehouseId::new("10"),
                    load: 60,
                }],
                priority: 1,
                sequential: false,
                required_carriage: "A".to_string(),
                order_type: OrderType::Outbound,
            }],
        };
        let ctx = SchedulingContext {
            local_schedule_path: std::env::temp_dir().join(format!(
                "dock_scheduler_test_e1_{}.csv",
                std::process::id()
            )),
            ..SchedulingContext::default()
        };
        let now = crate::timefmt::parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
        let response = external_orders_queueing(&request, &ctx, now).unwrap();
        assert_eq!(
            response.order_dock_assignments[&OrderId::new("1")][&WarehouseId::new("10")],
            DockId::new("100")
        );
        let _ = std::fs::remove_file(&ctx.local_schedule_path);
    }
}
