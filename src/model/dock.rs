//! Dock data model. Per the REDESIGN FLAG (spec §9), a dock never carries a live, mutated
//! `efficiency` field the way `common.py`'s `Dock.set_efficiency` does — the resolved
//! efficiency for a planning pass is always computed on demand by [`Dock::efficiency_for`].

use serde::{Deserialize, Serialize};

use super::ids::DockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum DockType {
    InboundOnly = 1,
    OutboundOnly = 2,
    Dual = 3,
}

impl TryFrom<u8> for DockType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DockType::InboundOnly),
            2 => Ok(DockType::OutboundOnly),
            3 => Ok(DockType::Dual),
            other => Err(format!("dock_type must be 1, 2, or 3, got {other}")),
        }
    }
}

impl From<DockType> for u8 {
    fn from(value: DockType) -> Self {
        value as u8
    }
}

impl DockType {
    /// Whether this dock's type admits an order travelling in `direction`.
    pub fn admits(self, direction: OrderDirection) -> bool {
        matches!(
            (self, direction),
            (DockType::Dual, _)
                | (DockType::InboundOnly, OrderDirection::Inbound)
                | (DockType::OutboundOnly, OrderDirection::Outbound)
        )
    }
}

/// Which way cargo is moving for the order currently being planned. Derived from
/// [`crate::model::order::OrderType`]; kept as its own type so dock admission and
/// efficiency selection don't need to reach back into the order model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dock {
    pub dock_id: DockId,
    pub outbound_efficiency: f64,
    pub inbound_efficiency: f64,
    /// Reserved for weighted extensions; never read by any objective or constraint
    /// generator here, matching the source's own dead attribute (see DESIGN.md).
    pub weight: f64,
    pub dock_type: DockType,
    pub compatible_carriage: Vec<String>,
}

impl Dock {
    /// The units/minute this dock processes at for the given direction. This is the
    /// planning-pass-local replacement for the source's mutable `set_efficiency`.
    pub fn efficiency_for(&self, direction: OrderDirection) -> f64 {
        match direction {
            OrderDirection::Inbound => self.inbound_efficiency,
            OrderDirection::Outbound => self.outbound_efficiency,
        }
    }

    pub fn admits(&self, direction: OrderDirection, required_carriage: &str) -> bool {
        self.dock_type.admits(direction)
            && self
                .compatible_carriage
                .iter()
                .any(|c| c == required_carriage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dock(dock_type: DockType) -> Dock {
        Dock {
            dock_id: DockId::new("100"),
            outbound_efficiency: 2.0,
            inbound_efficiency: 1.0,
            weight: 1.0,
            dock_type,
            compatible_carriage: vec!["A".to_string()],
        }
    }

    #[test]
    fn efficiency_for_never_mutates_and_picks_by_direction() {
        let d = dock(DockType::Dual);
        assert_eq!(d.efficiency_for(OrderDirection::Outbound), 2.0);
        assert_eq!(d.efficiency_for(OrderDirection::Inbound), 1.0);
        assert_eq!(d.efficiency_for(OrderDirection::Outbound), 2.0);
    }

    #[test]
    fn admits_checks_both_direction_and_carriage() {
        let d = dock(DockType::OutboundOnly);
        assert!(d.admits(OrderDirection::Outbound, "A"));
        assert!(!d.admits(OrderDirection::Inbound, "A"));
        assert!(!d.admits(OrderDirection::Outbound, "B"));
    }
}
