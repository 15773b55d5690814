//! Fieldwave State - Per-device state of the round engine
//!
//! This crate holds everything a device keeps between and within rounds:
//! - Neighbor fields and their reductions
//! - Temporal state (one slot per alignment point)
//! - Neighbor table with retention eviction

pub mod field;
pub mod hood;
pub mod neighbors;
pub mod store;

pub use field::*;
pub use hood::*;
pub use neighbors::*;
pub use store::*;
