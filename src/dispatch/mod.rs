//! Request dispatch: the three pathway entry points, composing the ledger, route
//! synthesizer, MILP stages, and incremental matcher into end-to-end scheduling
//! passes. Grounded in `app.py`'s three Flask handlers, wired the teacher's way —
//! explicit constructor arguments (`Simulator::new(initial_position, inst_num,
//! callbacks)`) rather than module-level globals (see the REDESIGN FLAG against a
//! global `app`/`logger`).

pub mod drop_pull;
pub mod external;
pub mod internal;

pub use drop_pull::{
    drop_pull_scheduling, DropPullOrderCarriage, DropPullRequest, DropPullVehicle, DropPullWarehouse,
};
pub use external::{external_orders_queueing, ExternalDock, ExternalOrder, ExternalRequest, ExternalWarehouse};
pub use internal::{
    internal_orders_queueing, InternalCarriage, InternalOrder, InternalRequest, InternalVehicle,
};

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;

/// Threaded, explicit configuration for a scheduling pass — no global statics, no
/// environment reads. Defaults mirror §6/§10's stated constants.
#[derive(Debug, Clone)]
pub struct SchedulingContext {
    pub local_schedule_path: PathBuf,
    pub internal_schedule_path: PathBuf,
    pub drop_pull_schedule_path: PathBuf,
    pub big_m: f64,
    pub tau: f64,
    pub retention: Duration,
    pub solver_timeout: Option<StdDuration>,
}

impl Default for SchedulingContext {
    fn default() -> Self {
        Self {
            local_schedule_path: PathBuf::from("local_schedule.csv"),
            internal_schedule_path: PathBuf::from("internal_schedule.csv"),
            drop_pull_schedule_path: PathBuf::from("DropPull_schedule.csv"),
            big_m: crate::lp::BIG_M,
            tau: crate::lp::TAU,
            retention: crate::ledger::RETENTION,
            solver_timeout: None,
        }
    }
}
