use thiserror::Error;

use crate::model::ids::OrderId;

/// The stage at which a MILP solve was attempted, used to report infeasibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Assignment,
    Window,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Assignment => write!(f, "stage-1 (dock assignment)"),
            Stage::Window => write!(f, "stage-2 (time window)"),
        }
    }
}

/// Typed error surface for the scheduling pathways.
///
/// Recovery policy: none inside a request. Callers (the out-of-scope HTTP layer) map
/// these to the `{code, message}` envelope; the ledger is never written when a
/// solve fails, whatever kind of failure it is.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("order {order} is malformed: {reason}")]
    InputMalformed { order: OrderId, reason: String },

    #[error("{stage} produced no feasible solution")]
    Infeasible { stage: Stage },

    #[error("ledger I/O failed: {0}")]
    LedgerIo(#[from] std::io::Error),

    #[error("failed to shape response: {0}")]
    ResponseShaping(String),
}
