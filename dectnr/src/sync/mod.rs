//! Executor independent async helpers for running a capture producer and its
//! consumer inside a single task.
pub mod join;
pub mod yield_now;
