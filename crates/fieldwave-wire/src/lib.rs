//! Fieldwave Wire Protocol - Binary message format
//!
//! One message per device per round:
//! - Fixed header (22 bytes): version, flags, sender, timestamp, entry count
//! - Entries: alignment id followed by a tagged value
//!
//! Type tags travel with every value so a receiver can tell when a neighbor
//! exported something of a different shape at the same alignment point.

pub mod frame;
pub mod header;
pub mod value;

pub use frame::*;
pub use header::*;
pub use value::*;
