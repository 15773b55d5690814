//! Fieldwave Simulator - In-memory networks for testing and evaluation
//!
//! This crate runs many devices in one process:
//! - Topologies with per-link distances
//! - Synchronous, multithreaded and event-queue stepping
//! - Network-wide summaries of device outputs
//! - The diameter evaluation scenario behind the `fieldwave-sim` binary

pub mod aggregate;
pub mod network;
pub mod scenario;
pub mod schedule;
pub mod topology;

pub use aggregate::*;
pub use network::*;
pub use scenario::*;
pub use schedule::*;
pub use topology::*;
