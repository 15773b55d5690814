//! Named output slots read by observers

use std::collections::BTreeMap;

use fieldwave_core::{Exportable, Value};

/// Values a program publishes for observers, by slot name
///
/// Programs only write; a slot keeps its last written value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Storage {
    slots: BTreeMap<String, Value>,
}

impl Storage {
    pub fn new() -> Self {
        Storage::default()
    }

    pub fn set<T: Exportable>(&mut self, name: &str, value: T) {
        let value = value.to_value();
        match self.slots.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.slots.insert(name.to_string(), value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Slot read back as a concrete type
    pub fn get_as<T: Exportable>(&self, name: &str) -> Option<T> {
        self.slots.get(name).and_then(T::from_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
