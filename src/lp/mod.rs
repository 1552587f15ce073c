//! The two-stage MILP formulation: dock assignment (stage 1) followed by time-window
//! sequencing (stage 2). Both stages model the problem via `good_lp` and solve through
//! its `coin_cbc` backend — the actual branch-and-bound solver is an external
//! collaborator, consumed as a black box (spec §1).

pub mod stage1;
pub mod stage2;

pub use stage1::{solve as solve_stage1, Stage1Solution};
pub use stage2::{solve as solve_stage2, Stage2Solution, Window, BIG_M, TAU};
