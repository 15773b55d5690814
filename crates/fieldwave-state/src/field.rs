//! Neighbor fields
//!
//! A field is the device's own value plus one value per neighbor that had a
//! usable export at the same alignment point. Neighbors without a value are
//! simply absent, never filled with a default.

use std::collections::BTreeMap;

use fieldwave_core::DeviceId;

/// Neighbor-indexed values plus the device's own value
#[derive(Clone, Debug, PartialEq)]
pub struct Field<T> {
    own: T,
    neighbors: BTreeMap<DeviceId, T>,
}

impl<T> Field<T> {
    /// Field with no neighbor values
    pub fn new(own: T) -> Self {
        Field {
            own,
            neighbors: BTreeMap::new(),
        }
    }

    pub fn from_neighbors<I>(own: T, neighbors: I) -> Self
    where
        I: IntoIterator<Item = (DeviceId, T)>,
    {
        Field {
            own,
            neighbors: neighbors.into_iter().collect(),
        }
    }

    /// Builder-style neighbor insertion
    pub fn with_neighbor(mut self, id: DeviceId, value: T) -> Self {
        self.neighbors.insert(id, value);
        self
    }

    /// The device's own value
    pub fn own(&self) -> &T {
        &self.own
    }

    /// Value held by a neighbor
    pub fn get(&self, id: DeviceId) -> Option<&T> {
        self.neighbors.get(&id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.neighbors.contains_key(&id)
    }

    /// Number of neighbor values (own value not counted)
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Iterate over neighbor values in device id order
    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &T)> {
        self.neighbors.iter().map(|(id, v)| (*id, v))
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.neighbors.keys().copied()
    }

    /// Apply `f` pointwise, own value included
    pub fn map<U, F>(&self, mut f: F) -> Field<U>
    where
        F: FnMut(&T) -> U,
    {
        Field {
            own: f(&self.own),
            neighbors: self.neighbors.iter().map(|(id, v)| (*id, f(v))).collect(),
        }
    }

    /// Combine two fields pointwise; a neighbor survives only if both have it
    pub fn zip_with<U, V, F>(&self, other: &Field<U>, mut f: F) -> Field<V>
    where
        F: FnMut(&T, &U) -> V,
    {
        Field {
            own: f(&self.own, &other.own),
            neighbors: self
                .neighbors
                .iter()
                .filter_map(|(id, a)| other.neighbors.get(id).map(|b| (*id, f(a, b))))
                .collect(),
        }
    }

    pub fn into_own(self) -> T {
        self.own
    }

    pub fn into_parts(self) -> (T, BTreeMap<DeviceId, T>) {
        (self.own, self.neighbors)
    }
}
