//! Neighbor table
//!
//! Latest export bundle per neighbor, with retention-based eviction. Owned by
//! exactly one device. A neighbor leaves the table only by aging out.

use std::collections::BTreeMap;
use std::sync::Arc;

use fieldwave_core::{AlignmentId, DeviceId, ExportBundle, LogicalTime, Message, Value};
use tracing::{debug, trace};

/// What the table did with a received message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// First message from this neighbor (or first since it aged out)
    Inserted,
    /// Newer message replaced the previous one
    Updated,
    /// Not newer than what the table already holds
    Stale,
    /// Sent by the owner itself
    OwnMessage,
}

impl ReceiveOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, ReceiveOutcome::Inserted | ReceiveOutcome::Updated)
    }
}

/// One neighbor as currently known
#[derive(Clone, Debug)]
pub struct NeighborEntry {
    pub id: DeviceId,
    /// Timestamp of the newest message received
    pub last_seen: LogicalTime,
    pub bundle: Arc<ExportBundle>,
    /// Distance reported by the connectivity layer for the current round
    pub distance: Option<f64>,
}

impl NeighborEntry {
    /// Whether the entry is still visible at `now`
    #[inline]
    pub fn is_fresh(&self, now: LogicalTime, retention: f64) -> bool {
        !(now - self.last_seen > retention)
    }
}

/// Neighbor table of one device
#[derive(Debug)]
pub struct NeighborTable {
    owner: DeviceId,
    entries: BTreeMap<DeviceId, NeighborEntry>,
}

impl NeighborTable {
    pub fn new(owner: DeviceId) -> Self {
        NeighborTable {
            owner,
            entries: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> DeviceId {
        self.owner
    }

    /// Store a message if it is newer than what we hold for its sender
    pub fn receive(&mut self, message: &Message) -> ReceiveOutcome {
        if message.sender == self.owner {
            return ReceiveOutcome::OwnMessage;
        }

        match self.entries.get_mut(&message.sender) {
            Some(entry) => {
                if message.timestamp > entry.last_seen {
                    entry.last_seen = message.timestamp;
                    entry.bundle = Arc::clone(&message.bundle);
                    ReceiveOutcome::Updated
                } else {
                    trace!(
                        device = %self.owner,
                        neighbor = %message.sender,
                        timestamp = message.timestamp.as_secs(),
                        "ignored stale message"
                    );
                    ReceiveOutcome::Stale
                }
            }
            None => {
                debug!(device = %self.owner, neighbor = %message.sender, "new neighbor");
                self.entries.insert(
                    message.sender,
                    NeighborEntry {
                        id: message.sender,
                        last_seen: message.timestamp,
                        bundle: Arc::clone(&message.bundle),
                        distance: None,
                    },
                );
                ReceiveOutcome::Inserted
            }
        }
    }

    /// Record the measured distance to a known neighbor
    pub fn set_distance(&mut self, id: DeviceId, distance: f64) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.distance = Some(distance);
                true
            }
            None => false,
        }
    }

    /// Forget every measured distance; links not reported again read as absent
    pub fn clear_distances(&mut self) {
        for entry in self.entries.values_mut() {
            entry.distance = None;
        }
    }

    /// Drop every entry last seen before `now - retention`
    pub fn evict(&mut self, now: LogicalTime, retention: f64) -> Vec<DeviceId> {
        let expired: Vec<DeviceId> = self
            .entries
            .values()
            .filter(|entry| !entry.is_fresh(now, retention))
            .map(|entry| entry.id)
            .collect();

        for id in &expired {
            self.entries.remove(id);
            debug!(device = %self.owner, neighbor = %id, now = now.as_secs(), "neighbor expired");
        }

        expired
    }

    pub fn get(&self, id: DeviceId) -> Option<&NeighborEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Values neighbors exported at `alignment`; neighbors without one are skipped
    pub fn values_at(&self, alignment: AlignmentId) -> impl Iterator<Item = (DeviceId, &Value)> {
        self.entries
            .values()
            .filter_map(move |entry| entry.bundle.get(alignment).map(|v| (entry.id, v)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &NeighborEntry> {
        self.entries.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
