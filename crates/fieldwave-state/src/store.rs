//! Temporal state store
//!
//! One slot per alignment point a device has visited. A slot is created on
//! the first visit, overwritten on every later one, and only ever read by the
//! device that owns the store.

use std::collections::HashMap;

use fieldwave_core::{AlignmentId, LogicalTime, Value};
use tracing::trace;

/// Last value stored at one alignment point
#[derive(Clone, Debug, PartialEq)]
pub struct TemporalSlot {
    pub value: Value,
    /// Round time of the visit that wrote `value`
    pub last_visit: LogicalTime,
}

/// Per-device temporal state, keyed by alignment id
#[derive(Debug, Default)]
pub struct TemporalStore {
    slots: HashMap<AlignmentId, TemporalSlot>,
}

impl TemporalStore {
    pub fn new() -> Self {
        TemporalStore::default()
    }

    pub fn get(&self, id: AlignmentId) -> Option<&TemporalSlot> {
        self.slots.get(&id)
    }

    /// Value written at the previous visit, if any
    pub fn value(&self, id: AlignmentId) -> Option<&Value> {
        self.slots.get(&id).map(|slot| &slot.value)
    }

    pub fn contains(&self, id: AlignmentId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Record a visit. Returns true when this was the first one.
    pub fn update(&mut self, id: AlignmentId, value: Value, now: LogicalTime) -> bool {
        self.slots
            .insert(
                id,
                TemporalSlot {
                    value,
                    last_visit: now,
                },
            )
            .is_none()
    }

    /// Drop slots not visited since `horizon`. Returns how many were dropped.
    pub fn evict_unvisited(&mut self, horizon: LogicalTime) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.last_visit >= horizon);
        let dropped = before - self.slots.len();
        if dropped > 0 {
            trace!(dropped, horizon = horizon.as_secs(), "evicted temporal slots");
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
