//! Export bundles and the messages that carry them

use std::collections::HashMap;
use std::sync::Arc;

use crate::{AlignmentId, DeviceId, LogicalTime, Value};

/// Values a device shares in one round, keyed by alignment id
///
/// Entries keep the order in which the program produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportBundle {
    entries: Vec<(AlignmentId, Value)>,
    index: HashMap<AlignmentId, usize>,
}

impl ExportBundle {
    pub fn new() -> Self {
        ExportBundle::default()
    }

    /// Insert a value; an id exported twice keeps its first position
    pub fn insert(&mut self, id: AlignmentId, value: Value) {
        match self.index.get(&id) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push((id, value));
            }
        }
    }

    pub fn get(&self, id: AlignmentId) -> Option<&Value> {
        self.index.get(&id).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, id: AlignmentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AlignmentId, &Value)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    pub fn ids(&self) -> impl Iterator<Item = AlignmentId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

impl FromIterator<(AlignmentId, Value)> for ExportBundle {
    fn from_iter<I: IntoIterator<Item = (AlignmentId, Value)>>(iter: I) -> Self {
        let mut bundle = ExportBundle::new();
        for (id, value) in iter {
            bundle.insert(id, value);
        }
        bundle
    }
}

/// One device's output for one round, as seen by its neighbors
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub sender: DeviceId,
    pub timestamp: LogicalTime,
    pub bundle: Arc<ExportBundle>,
}

impl Message {
    pub fn new(sender: DeviceId, timestamp: LogicalTime, bundle: ExportBundle) -> Self {
        Message {
            sender,
            timestamp,
            bundle: Arc::new(bundle),
        }
    }
}
