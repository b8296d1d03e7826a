//! Task classification and report aggregation engine.
//!
//! Pure, synchronous functions over already-fetched data: the
//! [`normalizer`] turns provider payloads into canonical tasks, the
//! [`classifier`] derives status buckets and deadline views, and the
//! [`assembler`] renders them into a deterministic markdown report.

pub mod assembler;
pub mod classifier;
pub mod format;
pub mod normalizer;
