//! Shapes solver/matcher output into the three pathways' response envelopes.
//! Grounded in `lp.py::solve_and_generate_response`/`visualization.py`'s queue
//! listings and `internal_utils.py::build_response`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerEntry;
use crate::lp::{Stage1Solution, Stage2Solution};
use crate::model::{DockId, OrderId, VehicleId, WarehouseId};
use crate::model::ids::CarriageId;
use crate::timefmt::{format_ledger_timestamp, wallclock_from_minutes};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockQueueEntry {
    pub order_id: OrderId,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalResponse {
    pub order_sequences: BTreeMap<OrderId, Vec<WarehouseId>>,
    pub order_dock_assignments: BTreeMap<OrderId, BTreeMap<WarehouseId, DockId>>,
    pub docks_queues: BTreeMap<DockId, Vec<DockQueueEntry>>,
}

/// Combines a stage-1/stage-2 pair from one direction pass into the external response
/// shape and the ledger entries that pass should write. `now` rebases stage-2's
/// minutes-from-now windows back to wallclock for the queue listing and ledger.
pub fn shape_external(
    stage1: &Stage1Solution,
    stage2: &Stage2Solution,
    now: NaiveDateTime,
) -> (ExternalResponse, Vec<LedgerEntry>) {
    // order -> [(start, warehouse)], sorted by start to derive the visit sequence.
    let mut per_order_visits: BTreeMap<OrderId, Vec<(f64, WarehouseId, DockId)>> = BTreeMap::new();
    let mut docks_queues: BTreeMap<DockId, Vec<(f64, DockQueueEntry)>> = BTreeMap::new();
    let mut ledger_entries = Vec::new();

    for ((order_id, warehouse_id, dock_id), window) in &stage2.windows {
        per_order_visits.entry(order_id.clone()).or_default().push((
            window.start,
            warehouse_id.clone(),
            dock_id.clone(),
        ));

        let start_dt = wallclock_from_minutes(now, window.start.round() as i64);
        let end_dt = wallclock_from_minutes(now, window.end.round() as i64);
        docks_queues.entry(dock_id.clone()).or_default().push((
            window.start,
            DockQueueEntry {
                order_id: order_id.clone(),
                start_time: format_ledger_timestamp(start_dt),
                end_time: format_ledger_timestamp(end_dt),
            },
        ));
        ledger_entries.push(LedgerEntry {
            order_id: order_id.clone(),
            warehouse_id: warehouse_id.clone(),
            dock_id: dock_id.clone(),
            start: start_dt,
            end: end_dt,
        });
    }

    let mut order_sequences = BTreeMap::new();
    for (order_id, mut visits) in per_order_visits {
        visits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        order_sequences.insert(order_id, visits.into_iter().map(|(_, w, _)| w).collect());
    }

    let mut queues = BTreeMap::new();
    for (dock_id, mut entries) in docks_queues {
        entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        queues.insert(dock_id, entries.into_iter().map(|(_, e)| e).collect());
    }

    let order_dock_assignments = stage1.assignment.iter().fold(
        BTreeMap::<OrderId, BTreeMap<WarehouseId, DockId>>::new(),
        |mut acc, ((order_id, warehouse_id), dock_id)| {
            acc.entry(order_id.clone())
                .or_default()
                .insert(warehouse_id.clone(), dock_id.clone());
            acc
        },
    );

    (
        ExternalResponse {
            order_sequences,
            order_dock_assignments,
            docks_queues: queues,
        },
        ledger_entries,
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalAssignment {
    pub warehouse_id: WarehouseId,
    pub dock_id: DockId,
    pub carriage_id: CarriageId,
    pub vehicle_id: Option<VehicleId>,
    pub lay_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalResponse {
    pub order_sequences: BTreeMap<OrderId, Vec<WarehouseId>>,
    pub assignments: BTreeMap<OrderId, Vec<InternalAssignment>>,
}

/// Drops any candidate assignment with no matched carriage, per §4.6.
pub fn shape_internal(
    order_sequences: BTreeMap<OrderId, Vec<WarehouseId>>,
    raw_assignments: BTreeMap<OrderId, Vec<(WarehouseId, DockId, Option<CarriageId>, Option<VehicleId>, f64)>>,
) -> InternalResponse {
    let mut assignments = BTreeMap::new();
    for (order_id, records) in raw_assignments {
        let kept: Vec<InternalAssignment> = records
            .into_iter()
            .filter_map(|(warehouse_id, dock_id, carriage_id, vehicle_id, lay_time)| {
                carriage_id.map(|carriage_id| InternalAssignment {
                    warehouse_id,
                    dock_id,
                    carriage_id,
                    vehicle_id,
                    lay_time,
                })
            })
            .collect();
        assignments.insert(order_id, kept);
    }
    InternalResponse {
        order_sequences,
        assignments,
    }
}

/// Drop-pull is a flat per-order list. `perform_vehicle_matching`/`perform_dock_matching`
/// drive this pathway's control flow (whether to run the matcher at all); `dock_id` is
/// only ever populated by a successful dock match, never seeded from `current_dock_id`.
/// `current_dock_id`, `add_cx_task`, and `sort_no` are opaque pass-through fields, copied
/// from the request onto the response record without interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropPullAssignment {
    pub order_id: OrderId,
    pub warehouse_id: WarehouseId,
    pub dock_id: Option<DockId>,
    pub vehicle_id: Option<VehicleId>,
    pub lay_time: Option<f64>,
    pub perform_vehicle_matching: bool,
    pub perform_dock_matching: bool,
    pub current_dock_id: Option<DockId>,
    pub add_cx_task: Option<bool>,
    pub sort_no: Option<i64>,
}
