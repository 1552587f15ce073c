//! Stage-1 dock-assignment MILP: one dock per `(order, warehouse-with-load)`, minimizing
//! the latest per-dock predicted completion time. Grounded in `lp.py::create_lp_model`,
//! modeled with `good_lp` the way `examples/other_examples/...Chameleon…ilp_scheduler`
//! builds and solves its own MILP (`ProblemVariables`, `variable()`, `constraint!`,
//! `solvers::coin_cbc`).

use std::collections::BTreeMap;

use good_lp::{
    constraint, solvers::coin_cbc::coin_cbc, variable, Expression, ProblemVariables, Solution,
    SolverModel, Variable,
};
use tracing::{debug, info};

use crate::error::{SchedulingError, Stage};
use crate::model::dock::OrderDirection;
use crate::model::{Dock, DockId, Order, OrderId, Warehouse, WarehouseId};

pub struct Stage1Solution {
    /// `assignment[(order, warehouse)] = dock`.
    pub assignment: BTreeMap<(OrderId, WarehouseId), DockId>,
    pub makespan: f64,
}

/// Solves stage-1 for a single planning pass. `orders` must all share `direction`
/// (the dispatcher runs one pass for loading orders, one for unloading, per §5's
/// ordering guarantee); `existing_busy` is `total_busy[w,d]` from the ledger.
pub fn solve(
    orders: &[Order],
    warehouses: &[Warehouse],
    docks: &BTreeMap<DockId, Dock>,
    existing_busy: &BTreeMap<(WarehouseId, DockId), i64>,
    direction: OrderDirection,
) -> Result<Stage1Solution, SchedulingError> {
    let mut vars = ProblemVariables::new();

    let mut completion: BTreeMap<(WarehouseId, DockId), Variable> = BTreeMap::new();
    for warehouse in warehouses {
        for dock_id in &warehouse.docks {
            let key = (warehouse.warehouse_id.clone(), dock_id.clone());
            completion
                .entry(key)
                .or_insert_with(|| vars.add(variable().integer().min(0.0)));
        }
    }
    let makespan = vars.add(variable().integer().min(0.0));

    let mut assignment_vars: BTreeMap<(OrderId, WarehouseId, DockId), Variable> = BTreeMap::new();
    for order in orders {
        for warehouse_id in order.warehouses_with_load() {
            let Some(warehouse) = warehouses.iter().find(|w| w.warehouse_id == warehouse_id)
            else {
                continue;
            };
            for dock_id in &warehouse.docks {
                let Some(dock) = docks.get(dock_id) else {
                    continue;
                };
                if !dock.admits(direction, &order.required_carriage) {
                    continue;
                }
                assignment_vars.insert(
                    (order.order_id.clone(), warehouse_id.clone(), dock_id.clone()),
                    vars.add(variable().binary()),
                );
            }
        }
    }

    debug!(
        vars = assignment_vars.len() + completion.len() + 1,
        docks = completion.len(),
        "stage-1 variables built"
    );

    let mut problem = coin_cbc(vars.minimise(makespan));
    problem.set_parameter("logLevel", "0");

    // Constraint 1: capacity/makespan per (w, d).
    for (key, &c_wd) in &completion {
        problem.add_constraint(constraint!(c_wd <= makespan));

        let busy = *existing_busy.get(key).unwrap_or(&0) as f64;
        let mut load_sum = Expression::from(busy);
        for order in orders {
            let load = order.load_at(&key.0) as f64;
            if load <= 0.0 {
                continue;
            }
            if let Some(&x) = assignment_vars.get(&(order.order_id.clone(), key.0.clone(), key.1.clone()))
            {
                let Some(dock) = docks.get(&key.1) else {
                    continue;
                };
                let efficiency = dock.efficiency_for(direction).max(f64::EPSILON);
                load_sum = load_sum + (load / efficiency) * x;
            }
        }
        problem.add_constraint(constraint!(c_wd >= load_sum));
    }

    // Constraint 2: assignment exactness — exactly one dock per (order, warehouse-with-load).
    for order in orders {
        for warehouse_id in order.warehouses_with_load() {
            let mut sum = Expression::from(0.0);
            let mut any = false;
            for ((o, w, _d), &x) in &assignment_vars {
                if o == &order.order_id && w == &warehouse_id {
                    sum = sum + x;
                    any = true;
                }
            }
            if !any {
                return Err(SchedulingError::Infeasible {
                    stage: Stage::Assignment,
                });
            }
            problem.add_constraint(constraint!(sum == 1.0));
        }
    }

    info!(stage = "stage-1", "solving dock-assignment MILP");
    let solution = problem.solve().map_err(|_| SchedulingError::Infeasible {
        stage: Stage::Assignment,
    })?;

    let mut assignment = BTreeMap::new();
    for ((order_id, warehouse_id, dock_id), &x) in &assignment_vars {
        if solution.value(x).round() > 0.5 {
            assignment.insert((order_id.clone(), warehouse_id.clone()), dock_id.clone());
        }
    }

    Ok(Stage1Solution {
        assignment,
        makespan: solution.value(makespan),
    })
}
