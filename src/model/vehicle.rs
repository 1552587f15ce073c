//! Tractor (vehicle) data model, grounded in the teacher's `VehicleInfo` and
//! `utils.py::find_closest_vehicle`'s workload-bias matching.

use serde::{Deserialize, Serialize};

use super::ids::VehicleId;
use super::warehouse::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum VehicleState {
    Idle = 0,
    Busy = 1,
}

impl TryFrom<u8> for VehicleState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VehicleState::Idle),
            1 => Ok(VehicleState::Busy),
            other => Err(format!("vehicle_state must be 0 or 1, got {other}")),
        }
    }
}

impl From<VehicleState> for u8 {
    fn from(value: VehicleState) -> Self {
        value as u8
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: VehicleId,
    pub location: Location,
    pub state: VehicleState,
    pub workload: i64,
}

impl Vehicle {
    pub fn is_idle(&self) -> bool {
        self.state == VehicleState::Idle
    }

    pub fn reserve(&mut self) {
        self.state = VehicleState::Busy;
    }
}
