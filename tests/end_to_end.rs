//! Integration coverage for the end-to-end scenarios named in the spec's testable
//! properties (E1-E6), exercised against the public `dispatch` API the way the
//! pack's VRP/scheduling repos place their construction-heuristic tests under `tests/`.

use dock_scheduler::dispatch::external::ExternalWarehouseLoad;
use dock_scheduler::dispatch::{
    drop_pull_scheduling, external_orders_queueing, DropPullOrderCarriage, DropPullRequest,
    DropPullVehicle, DropPullWarehouse, ExternalDock, ExternalOrder, ExternalRequest,
    ExternalWarehouse, SchedulingContext,
};
use dock_scheduler::error::{SchedulingError, Stage};
use dock_scheduler::ledger::{Ledger, LedgerEntry};
use dock_scheduler::model::dock::DockType;
use dock_scheduler::model::ids::{CarriageId, DockId, OrderId, VehicleId, WarehouseId};
use dock_scheduler::model::vehicle::VehicleState;
use dock_scheduler::model::warehouse::Location;
use dock_scheduler::model::OrderType;
use dock_scheduler::timefmt::{format_ledger_timestamp, parse_ledger_timestamp, wallclock_from_minutes};

fn tmp_ctx(tag: &str) -> SchedulingContext {
    let unique = format!("{}_{}_{}", tag, std::process::id(), tag.len());
    SchedulingContext {
        local_schedule_path: std::env::temp_dir().join(format!("dock_scheduler_{unique}_local.csv")),
        internal_schedule_path: std::env::temp_dir()
            .join(format!("dock_scheduler_{unique}_internal.csv")),
        drop_pull_schedule_path: std::env::temp_dir()
            .join(format!("dock_scheduler_{unique}_droppull.csv")),
        ..SchedulingContext::default()
    }
}

fn dock(id: &str, dock_type: DockType, carriage: &str) -> ExternalDock {
    ExternalDock {
        dock_id: DockId::new(id),
        outbound_efficiency: 1.0,
        inbound_efficiency: 1.0,
        weight: 1.0,
        dock_type,
        compatible_carriage: vec![carriage.to_string()],
    }
}

#[test]
fn e1_single_order_single_dock() {
    let ctx = tmp_ctx("e1");
    let now = parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
    let request = ExternalRequest {
        warehouses: vec![ExternalWarehouse {
            warehouse_id: WarehouseId::new("10"),
            docks: vec![dock("100", DockType::Dual, "A")],
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

    let response = external_orders_queueing(&request, &ctx, now).unwrap();
    assert_eq!(
        response.order_dock_assignments[&OrderId::new("1")][&WarehouseId::new("10")],
        DockId::new("100")
    );
    let queue = &response.docks_queues[&DockId::new("100")];
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].start_time, format_ledger_timestamp(now));
    assert_eq!(
        queue[0].end_time,
        format_ledger_timestamp(wallclock_from_minutes(now, 66))
    );
    let _ = std::fs::remove_file(&ctx.local_schedule_path);
}

#[test]
fn e2_priority_ordering() {
    let ctx = tmp_ctx("e2");
    let now = parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
    let request = ExternalRequest {
        warehouses: vec![ExternalWarehouse {
            warehouse_id: WarehouseId::new("10"),
            docks: vec![dock("100", DockType::Dual, "A")],
        }],
        orders: vec![
            ExternalOrder {
                order_id: OrderId::new("low"),
                warehouse_loads: vec![ExternalWarehouseLoad {
                    warehouse_id: WarehouseId::new("10"),
                    load: 10,
                }],
                priority: 1,
                sequential: false,
                required_carriage: "A".to_string(),
                order_type: OrderType::Outbound,
            },
            ExternalOrder {
                order_id: OrderId::new("high"),
                warehouse_loads: vec![ExternalWarehouseLoad {
                    warehouse_id: WarehouseId::new("10"),
                    load: 10,
                }],
                priority: 2,
                sequential: false,
                required_carriage: "A".to_string(),
                order_type: OrderType::Outbound,
            },
        ],
    };

    let response = external_orders_queueing(&request, &ctx, now).unwrap();
    let queue = &response.docks_queues[&DockId::new("100")];
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0].order_id, OrderId::new("high"));
    assert!(queue[0].end_time <= queue[1].start_time);
    let _ = std::fs::remove_file(&ctx.local_schedule_path);
}

#[test]
fn e3_sequential_route_orders_docks_across_warehouses() {
    let ctx = tmp_ctx("e3");
    let now = parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
    let request = ExternalRequest {
        warehouses: vec![
            ExternalWarehouse {
                warehouse_id: WarehouseId::new("10"),
                docks: vec![dock("100", DockType::Dual, "A")],
            },
            ExternalWarehouse {
                warehouse_id: WarehouseId::new("20"),
                docks: vec![dock("200", DockType::Dual, "A")],
            },
        ],
        orders: vec![ExternalOrder {
            order_id: OrderId::new("1"),
            warehouse_loads: vec![
                ExternalWarehouseLoad {
                    warehouse_id: WarehouseId::new("10"),
                    load: 10,
                },
                ExternalWarehouseLoad {
                    warehouse_id: WarehouseId::new("20"),
                    load: 10,
                },
            ],
            priority: 1,
            sequential: true,
            required_carriage: "A".to_string(),
            order_type: OrderType::Outbound,
        }],
    };

    let response = external_orders_queueing(&request, &ctx, now).unwrap();
    let end_10 = response.docks_queues[&DockId::new("100")][0].end_time.clone();
    let start_20 = response.docks_queues[&DockId::new("200")][0].start_time.clone();
    assert!(end_10 <= start_20);
    let _ = std::fs::remove_file(&ctx.local_schedule_path);
}

#[test]
fn e4_ledger_honor_pushes_new_order_past_existing_reservation() {
    let ctx = tmp_ctx("e4");
    let now = parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
    let ledger = Ledger::new(&ctx.local_schedule_path);
    ledger
        .save(&[LedgerEntry {
            order_id: OrderId::new("pre-existing"),
            warehouse_id: WarehouseId::new("10"),
            dock_id: DockId::new("100"),
            start: now,
            end: wallclock_from_minutes(now, 30),
        }])
        .unwrap();

    let request = ExternalRequest {
        warehouses: vec![ExternalWarehouse {
            warehouse_id: WarehouseId::new("10"),
            docks: vec![dock("100", DockType::Dual, "A")],
        }],
        orders: vec![ExternalOrder {
            order_id: OrderId::new("1"),
            warehouse_loads: vec![ExternalWarehouseLoad {
                warehouse_id: WarehouseId::new("10"),
                load: 10,
            }],
            priority: 1,
            sequential: false,
            required_carriage: "A".to_string(),
            order_type: OrderType::Outbound,
        }],
    };

    let response = external_orders_queueing(&request, &ctx, now).unwrap();
    let start = response.docks_queues[&DockId::new("100")][0].start_time.clone();
    assert!(start >= format_ledger_timestamp(wallclock_from_minutes(now, 30)));
    let _ = std::fs::remove_file(&ctx.local_schedule_path);
}

#[test]
fn e5_carriage_mismatch_is_infeasible_and_does_not_write_ledger() {
    let ctx = tmp_ctx("e5");
    let now = parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
    let request = ExternalRequest {
        warehouses: vec![ExternalWarehouse {
            warehouse_id: WarehouseId::new("10"),
            docks: vec![dock("100", DockType::Dual, "A")],
        }],
        orders: vec![ExternalOrder {
            order_id: OrderId::new("1"),
            warehouse_loads: vec![ExternalWarehouseLoad {
                warehouse_id: WarehouseId::new("10"),
                load: 10,
            }],
            priority: 1,
            sequential: false,
            required_carriage: "B".to_string(),
            order_type: OrderType::Outbound,
        }],
    };

    let err = external_orders_queueing(&request, &ctx, now).unwrap_err();
    assert!(matches!(
        err,
        SchedulingError::Infeasible {
            stage: Stage::Assignment
        }
    ));
    assert!(!ctx.local_schedule_path.exists());
}

#[test]
fn e6_drop_pull_nearest_vehicle_prefers_lower_workload() {
    let ctx = tmp_ctx("e6");
    let now = parse_ledger_timestamp("2026-01-01 00:00:00").unwrap();
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
                docks: vec![dock("100", DockType::Dual, "A")],
            },
            perform_vehicle_matching: true,
            perform_dock_matching: false,
            add_cx_task: None,
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

    let assignments = drop_pull_scheduling(&request, &ctx, now).unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].vehicle_id, Some(VehicleId::new("free")));
    let _ = std::fs::remove_file(&ctx.drop_pull_schedule_path);
}
