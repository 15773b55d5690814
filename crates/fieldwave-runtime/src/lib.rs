//! Fieldwave Runtime - Round engine
//!
//! One round of a device:
//! 1. Advance the round clock (warn on a clock that did not move forward)
//! 2. Evict neighbors older than the retention window
//! 3. Record link distances reported by the connectivity layer
//! 4. Run the program once against a [`Context`]
//! 5. Drop temporal slots the program stopped visiting
//! 6. Stamp the export bundle with device id and round time

pub mod config;
pub mod context;
pub mod device;
pub mod storage;

pub use config::*;
pub use context::*;
pub use device::*;
pub use storage::*;

pub use fieldwave_state::{Field, ReceiveOutcome};
