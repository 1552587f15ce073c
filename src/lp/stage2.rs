//! Stage-2 time-window MILP: given stage-1's dock assignment, picks concrete start/end
//! minutes respecting priority order, sequential routes, per-order cross-dock
//! non-overlap, and non-overlap with the ledger's existing busy windows. Grounded in
//! `lp.py::create_queue_model`.

use std::collections::BTreeMap;

use good_lp::{
    constraint, solvers::coin_cbc::coin_cbc, variable, Expression, ProblemVariables, Solution,
    SolverModel, Variable,
};
use tracing::{debug, info};

use crate::error::{SchedulingError, Stage};
use crate::ledger::BusyWindow;
use crate::model::dock::OrderDirection;
use crate::model::{Dock, DockId, Order, OrderId, WarehouseId};
use crate::route;

/// Fixed per-visit ingress/egress overhead, minutes.
pub const TAU: f64 = 6.0;
/// Big-M used by every disjunctive (non-overlap) constraint.
pub const BIG_M: f64 = 100_000.0;

#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

pub struct Stage2Solution {
    /// `windows[(order, warehouse, dock)] = {start, end}`, minutes from now.
    pub windows: BTreeMap<(OrderId, WarehouseId, DockId), Window>,
    pub makespan: f64,
}

type VisitKey = (OrderId, WarehouseId, DockId);

/// `tau`/`big_m` default to [`TAU`]/[`BIG_M`] but are accepted as parameters so a
/// caller's [`crate::dispatch::SchedulingContext`] can override them per request.
pub fn solve(
    orders: &[Order],
    assignment: &BTreeMap<(OrderId, WarehouseId), DockId>,
    docks: &BTreeMap<DockId, Dock>,
    direction: OrderDirection,
    busy_windows: &BTreeMap<(WarehouseId, DockId), Vec<BusyWindow>>,
    tau: f64,
    big_m: f64,
) -> Result<Stage2Solution, SchedulingError> {
    let mut vars = ProblemVariables::new();

    // One (S, E) pair per assigned (order, warehouse, dock) visit.
    let mut visits: Vec<VisitKey> = Vec::new();
    let mut start: BTreeMap<VisitKey, Variable> = BTreeMap::new();
    let mut end: BTreeMap<VisitKey, Variable> = BTreeMap::new();

    for order in orders {
        for warehouse_id in order.warehouses_with_load() {
            let Some(dock_id) = assignment.get(&(order.order_id.clone(), warehouse_id.clone()))
            else {
                continue;
            };
            let key = (order.order_id.clone(), warehouse_id.clone(), dock_id.clone());
            start.insert(key.clone(), vars.add(variable().min(0.0)));
            end.insert(key.clone(), vars.add(variable().min(0.0)));
            visits.push(key);
        }
    }
    let makespan = vars.add(variable().min(0.0));

    // Same-order non-overlap pairs: one binary helper `B` per pair of an order's own
    // assigned docks, created up front since `good_lp` variables can't be added once a
    // solver model is built from `ProblemVariables`.
    let mut per_order_visits: BTreeMap<OrderId, Vec<(WarehouseId, DockId)>> = BTreeMap::new();
    for (order, warehouse_id, dock_id) in &visits {
        per_order_visits
            .entry(order.clone())
            .or_default()
            .push((warehouse_id.clone(), dock_id.clone()));
    }
    let mut same_order_pairs: Vec<(OrderId, VisitKey, VisitKey, Variable)> = Vec::new();
    for (order, docks_for_order) in &per_order_visits {
        for i in 0..docks_for_order.len() {
            for j in (i + 1)..docks_for_order.len() {
                let (w1, d1) = &docks_for_order[i];
                let (w2, d2) = &docks_for_order[j];
                let key1 = (order.clone(), w1.clone(), d1.clone());
                let key2 = (order.clone(), w2.clone(), d2.clone());
                let b = vars.add(variable().binary());
                same_order_pairs.push((order.clone(), key1, key2, b));
            }
        }
    }

    // Ledger non-overlap: one binary helper `O` per (visit, existing busy window).
    let mut ledger_overlaps: Vec<(VisitKey, BusyWindow, Variable)> = Vec::new();
    for key @ (_, warehouse_id, dock_id) in &visits {
        if let Some(windows) = busy_windows.get(&(warehouse_id.clone(), dock_id.clone())) {
            for window in windows {
                let o = vars.add(variable().binary());
                ledger_overlaps.push((key.clone(), *window, o));
            }
        }
    }

    debug!(
        visits = visits.len(),
        same_order_pairs = same_order_pairs.len(),
        ledger_overlaps = ledger_overlaps.len(),
        "stage-2 variables built"
    );

    let mut problem = coin_cbc(vars.minimise(makespan));
    problem.set_parameter("logLevel", "0");

    // Constraint 1: processing duration.
    for key @ (order_id, warehouse_id, dock_id) in &visits {
        let order = orders
            .iter()
            .find(|o| &o.order_id == order_id)
            .expect("visit built from orders slice");
        let load = order.load_at(warehouse_id) as f64;
        let dock = docks.get(dock_id).expect("stage-1 only assigns known docks");
        let efficiency = dock.efficiency_for(direction).max(f64::EPSILON);
        let s = start[key];
        let e = end[key];
        problem.add_constraint(constraint!(e == s + tau + load / efficiency));
        problem.add_constraint(constraint!(e <= makespan));
    }

    // Constraint 2: priority ordering on each dock — implemented as a full pairwise
    // E_i <= S_j over the fixed (priority desc, insertion order) sequence; see
    // DESIGN.md's Open Question decision for why this is sound only because the order
    // is fixed before constraints are generated.
    let mut by_dock: BTreeMap<(WarehouseId, DockId), Vec<(usize, &Order)>> = BTreeMap::new();
    for (index, order) in orders.iter().enumerate() {
        for warehouse_id in order.warehouses_with_load() {
            if assignment
                .get(&(order.order_id.clone(), warehouse_id.clone()))
                .is_some()
            {
                let dock_id = assignment[&(order.order_id.clone(), warehouse_id.clone())].clone();
                by_dock
                    .entry((warehouse_id.clone(), dock_id))
                    .or_default()
                    .push((index, order));
            }
        }
    }
    for ((warehouse_id, dock_id), mut entries) in by_dock {
        entries.sort_by(|a, b| b.1.priority.cmp(&a.1.priority).then(a.0.cmp(&b.0)));
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let key_i = (entries[i].1.order_id.clone(), warehouse_id.clone(), dock_id.clone());
                let key_j = (entries[j].1.order_id.clone(), warehouse_id.clone(), dock_id.clone());
                let e_i = end[&key_i];
                let s_j = start[&key_j];
                problem.add_constraint(constraint!(e_i <= s_j));
            }
        }
    }

    // Constraint 3: sequential routes.
    for order in orders {
        if !order.sequential {
            continue;
        }
        let Some(route) = route::external_route(order) else {
            continue;
        };
        let assigned_route: Vec<(WarehouseId, DockId)> = route
            .into_iter()
            .filter_map(|w| {
                assignment
                    .get(&(order.order_id.clone(), w.clone()))
                    .map(|d| (w, d.clone()))
            })
            .collect();
        for pair in assigned_route.windows(2) {
            let (w1, d1) = &pair[0];
            let (w2, d2) = &pair[1];
            let key1 = (order.order_id.clone(), w1.clone(), d1.clone());
            let key2 = (order.order_id.clone(), w2.clone(), d2.clone());
            let e1 = end[&key1];
            let s2 = start[&key2];
            problem.add_constraint(constraint!(e1 <= s2));
        }
    }

    // Constraint 4: same-order non-overlap across its own assigned docks (big-M disjunction).
    for (_order, key1, key2, b) in &same_order_pairs {
        let s1 = start[key1];
        let e1 = end[key1];
        let s2 = start[key2];
        let e2 = end[key2];
        let b_expr: Expression = (*b).into();
        let not_b = Expression::from(1.0) - b_expr.clone();
        problem.add_constraint(constraint!(e1 <= s2 + not_b * big_m));
        problem.add_constraint(constraint!(e2 <= s1 + b_expr * big_m));
    }

    // Constraint 5: non-overlap with pre-existing ledger busy windows (big-M disjunction).
    for (key, window, o) in &ledger_overlaps {
        let s = start[key];
        let e = end[key];
        let u = window.start as f64;
        let v = window.end as f64;
        let o_expr: Expression = (*o).into();
        let not_o = Expression::from(1.0) - o_expr.clone();
        problem.add_constraint(constraint!(e <= u + not_o * big_m));
        problem.add_constraint(constraint!(v <= s + o_expr * big_m));
    }

    info!(stage = "stage-2", "solving time-window MILP");
    let solution = problem.solve().map_err(|_| SchedulingError::Infeasible {
        stage: Stage::Window,
    })?;

    let mut windows = BTreeMap::new();
    for key in &visits {
        let s = solution.value(start[key]);
        let e = solution.value(end[key]);
        windows.insert(key.clone(), Window { start: s, end: e });
    }

    Ok(Stage2Solution {
        windows,
        makespan: solution.value(makespan),
    })
}
