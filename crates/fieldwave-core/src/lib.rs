//! Fieldwave Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every layer of the aggregate runtime:
//! - Identifiers (DeviceId, AlignmentId)
//! - Logical time and round clocks
//! - Tagged values exchanged between devices
//! - Export bundles and the messages that carry them

pub mod bundle;
pub mod error;
pub mod id;
pub mod time;
pub mod value;

pub use bundle::*;
pub use error::*;
pub use id::*;
pub use time::*;
pub use value::*;
