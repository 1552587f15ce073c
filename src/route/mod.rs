//! Route synthesis: for external (queue) orders, the declared sequential visit order;
//! for internal orders, a LIFO-consistent load-then-unload route.
//!
//! Grounded in `lp.py::generate_specific_order_route` and
//! `internal_utils.py::generate_loading_route`/`generate_unloading_route`. The LIFO
//! consumption rule mirrors the teacher's `Simulator::begin_vehicle_loading`, which pops
//! `work.unload_items` and asserts the popped id against the vehicle's `item_stack` top.

use crate::model::order::{Operation, Order};
use crate::model::ids::WarehouseId;

/// For a sequential order, the warehouse ids in declared visit order. Non-sequential
/// orders have no explicit route (stage-2's cross-dock non-overlap constraint handles
/// ordering among their docks freely).
pub fn external_route(order: &Order) -> Option<Vec<WarehouseId>> {
    if !order.sequential {
        return None;
    }
    let mut route = Vec::new();
    for wl in &order.warehouse_loads {
        if !route.contains(&wl.warehouse_id) {
            route.push(wl.warehouse_id.clone());
        }
    }
    Some(route)
}

/// The internal load→unload route: loading sub-route groups `Operation::Load` entries by
/// warehouse in first-seen order; the unloading sub-route consumes that stack LIFO,
/// matching each stack entry against the first unconsumed `Operation::Unload` entry with
/// the same `(cargo_type, quantity)`.
pub fn internal_route(order: &Order) -> Vec<WarehouseId> {
    let mut load_stack: Vec<&crate::model::order::WarehouseLoad> = Vec::new();
    let mut loading_route: Vec<WarehouseId> = Vec::new();
    for wl in &order.warehouse_loads {
        if wl.operation == Operation::Load {
            load_stack.push(wl);
            if !loading_route.contains(&wl.warehouse_id) {
                loading_route.push(wl.warehouse_id.clone());
            }
        }
    }

    let mut unload_candidates: Vec<&crate::model::order::WarehouseLoad> = order
        .warehouse_loads
        .iter()
        .filter(|wl| wl.operation == Operation::Unload)
        .collect();

    let mut unloading_route: Vec<WarehouseId> = Vec::new();
    for stack_entry in load_stack.iter().rev() {
        if let Some(pos) = unload_candidates.iter().position(|u| {
            u.cargo_type == stack_entry.cargo_type && u.quantity == stack_entry.quantity
        }) {
            let consumed = unload_candidates.remove(pos);
            if !unloading_route.contains(&consumed.warehouse_id) {
                unloading_route.push(consumed.warehouse_id.clone());
            }
        }
    }

    loading_route.into_iter().chain(unloading_route).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{OrderId, WarehouseId};
    use crate::model::order::{OrderType, WarehouseLoad};

    fn wl(warehouse_id: &str, cargo: &str, qty: i64, op: Operation) -> WarehouseLoad {
        WarehouseLoad {
            warehouse_id: WarehouseId::new(warehouse_id),
            cargo_type: cargo.to_string(),
            quantity: qty,
            operation: op,
        }
    }

    fn order(sequential: bool, loads: Vec<WarehouseLoad>) -> Order {
        Order {
            order_id: OrderId::new("1"),
            warehouse_loads: loads,
            priority: 1,
            sequential,
            required_carriage: "A".to_string(),
            order_type: OrderType::Outbound,
        }
    }

    #[test]
    fn external_route_none_when_not_sequential() {
        let o = order(false, vec![wl("10", "x", 1, Operation::Load)]);
        assert_eq!(external_route(&o), None);
    }

    #[test]
    fn external_route_preserves_declared_order_and_dedups() {
        let o = order(
            true,
            vec![
                wl("10", "x", 1, Operation::Load),
                wl("20", "x", 1, Operation::Load),
                wl("10", "y", 1, Operation::Load),
            ],
        );
        assert_eq!(
            external_route(&o).unwrap(),
            vec![WarehouseId::new("10"), WarehouseId::new("20")]
        );
    }

    #[test]
    fn internal_route_unloads_in_lifo_order() {
        // Load at 10 then 20 (20 is loaded last, on top of the stack); unload should
        // visit 20 before 10.
        let o = order(
            false,
            vec![
                wl("10", "pallet", 4, Operation::Load),
                wl("20", "box", 2, Operation::Load),
                wl("10", "pallet", 4, Operation::Unload),
                wl("20", "box", 2, Operation::Unload),
            ],
        );
        assert_eq!(
            internal_route(&o),
            vec![
                WarehouseId::new("10"),
                WarehouseId::new("20"),
                WarehouseId::new("20"),
                WarehouseId::new("10"),
            ]
        );
    }

    #[test]
    fn internal_route_skips_unmatched_unload() {
        let o = order(
            false,
            vec![
                wl("10", "pallet", 4, Operation::Load),
                wl("30", "crate", 9, Operation::Unload),
            ],
        );
        assert_eq!(internal_route(&o), vec![WarehouseId::new("10")]);
    }
}
