//! The canonical in-memory order shape. Wire requests (external/internal/drop-pull) each
//! have their own JSON field names (see [`crate::dispatch`]); they are normalized into this
//! shape before route synthesis and MILP modeling ever see them.

use serde::{Deserialize, Serialize};

use super::ids::{OrderId, WarehouseId};

/// Direction of an order, per §6's enumeration: `1=inbound` (truck unloads *into* the
/// warehouse), `2=outbound` (truck loads cargo *out of* the warehouse).
///
/// This is the single convention used everywhere, including internal queueing — see
/// `DESIGN.md`'s Open Question decision for why the internal-queueing source's own
/// comments (which label `1` the other way) are not followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum OrderType {
    Inbound = 1,
    Outbound = 2,
}

impl OrderType {
    pub fn as_direction(self) -> super::dock::OrderDirection {
        match self {
            OrderType::Inbound => super::dock::OrderDirection::Inbound,
            OrderType::Outbound => super::dock::OrderDirection::Outbound,
        }
    }
}

impl TryFrom<u8> for OrderType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OrderType::Inbound),
            2 => Ok(OrderType::Outbound),
            other => Err(format!("order_type must be 1 or 2, got {other}")),
        }
    }
}

impl From<OrderType> for u8 {
    fn from(value: OrderType) -> Self {
        value as u8
    }
}

/// A single load/unload operation within an order's visit to a warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Operation {
    Load = 1,
    Unload = 2,
}

impl TryFrom<u8> for Operation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Operation::Load),
            2 => Ok(Operation::Unload),
            other => Err(format!("operation must be 1 or 2, got {other}")),
        }
    }
}

impl From<Operation> for u8 {
    fn from(value: Operation) -> Self {
        value as u8
    }
}

/// One line of an order's cargo manifest at a given warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseLoad {
    pub warehouse_id: WarehouseId,
    pub cargo_type: String,
    pub quantity: i64,
    pub operation: Operation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub warehouse_loads: Vec<WarehouseLoad>,
    pub priority: i64,
    pub sequential: bool,
    pub required_carriage: String,
    pub order_type: OrderType,
}

impl Order {
    /// Sum of positive `quantity` for this order at `warehouse` — `load[o,w]` in the
    /// stage-1 formulation. Zero if the order never visits `warehouse`.
    pub fn load_at(&self, warehouse: &WarehouseId) -> i64 {
        self.warehouse_loads
            .iter()
            .filter(|wl| &wl.warehouse_id == warehouse && wl.quantity > 0)
            .map(|wl| wl.quantity)
            .sum()
    }

    /// Distinct warehouses this order has a non-zero load at, in first-seen order.
    pub fn warehouses_with_load(&self) -> Vec<WarehouseId> {
        let mut seen = Vec::new();
        for wl in &self.warehouse_loads {
            if wl.quantity > 0 && !seen.contains(&wl.warehouse_id) {
                seen.push(wl.warehouse_id.clone());
            }
        }
        seen
    }
}
