use chrono::Local;
use dock_scheduler::dispatch::{
    external_orders_queueing, ExternalDock, ExternalOrder, ExternalRequest, ExternalWarehouse,
    SchedulingContext,
};
use dock_scheduler::model::dock::DockType;
use dock_scheduler::model::ids::{DockId, OrderId, WarehouseId};
use dock_scheduler::model::OrderType;

/// Minimal runnable example: one outbound order against one dual-mode dock, wired
/// through the external-queueing pathway end to end (MILP solve + ledger write).
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

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
            warehouse_loads: vec![dock_scheduler::dispatch::external::ExternalWarehouseLoad {
                warehouse_id: WarehouseId::new("10"),
                load: 60,
            }],
            priority: 1,
            sequential: false,
            required_carriage: "A".to_string(),
            order_type: OrderType::Outbound,
        }],
    };

    let ctx = SchedulingContext::default();
    let now = Local::now().naive_local();
    let response = external_orders_queueing(&request, &ctx, now)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
