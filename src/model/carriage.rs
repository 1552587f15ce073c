//! Carriage (trailer) data model, grounded in `internal_utils.py::parse_internal_data`
//! and `utils.py`'s carriage-matching helpers.

use serde::{Deserialize, Serialize};

use super::ids::{CarriageId, DockId, WarehouseId};
use super::warehouse::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum CarriageState {
    Idle = 0,
    Busy = 1,
}

impl TryFrom<u8> for CarriageState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CarriageState::Idle),
            1 => Ok(CarriageState::Busy),
            other => Err(format!("carriage_state must be 0 or 1, got {other}")),
        }
    }
}

impl From<CarriageState> for u8 {
    fn from(value: CarriageState) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Carriage {
    pub carriage_id: CarriageId,
    pub location: Location,
    pub carriage_type: String,
    pub state: CarriageState,
    pub current_dock_id: Option<DockId>,
    pub current_warehouse_id: Option<WarehouseId>,
}

impl Carriage {
    pub fn is_idle(&self) -> bool {
        self.state == CarriageState::Idle
    }

    /// Flips this carriage IDLE→BUSY. Per §3's reservation invariant, this is the only
    /// mutation a planning pass performs on a carriage, and it happens exactly once per
    /// match within the pass.
    pub fn reserve(&mut self) {
        self.state = CarriageState::Busy;
    }
}
