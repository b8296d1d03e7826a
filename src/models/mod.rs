//! Domain model module declarations.

pub mod classification;
pub mod report;
pub mod task;
