//! Report orchestration.
//!
//! Covers batch and streaming report generation, report packaging and
//! deadline alert fan-out, and the periodic scheduler.

pub mod delivery;
pub mod generator;
pub mod scheduler;
pub mod stream;
