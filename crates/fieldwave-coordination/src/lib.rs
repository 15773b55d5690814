//! Fieldwave Coordination - Self-stabilizing building blocks
//!
//! Every routine enters its own alignment scope, so calling one twice in a
//! program keeps two independent states. None of them terminates: each is a
//! fixed-point iteration that re-converges when its inputs change.

pub mod basics;
pub mod diameter;
pub mod distance;
pub mod election;
pub mod gossip;

pub use basics::*;
pub use diameter::*;
pub use distance::*;
pub use election::*;
pub use gossip::*;
