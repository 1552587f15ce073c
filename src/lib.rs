//! Dock/vehicle scheduling engine: MILP-based external queueing, route-planning
//! internal queueing, and incremental drop-pull scheduling over a persistent
//! reservation ledger.

pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod lp;
pub mod matcher;
pub mod model;
pub mod response;
pub mod route;
pub mod timefmt;

pub use error::SchedulingError;
