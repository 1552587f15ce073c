//! Warehouse data model, grounded in the teacher's `FactoryInfo` (id + lat/lon) and
//! `common.py::Warehouse` (id + docks).

use serde::{Deserialize, Serialize};

use super::ids::{DockId, WarehouseId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub warehouse_id: WarehouseId,
    pub docks: Vec<DockId>,
    pub location: Option<Location>,
}
