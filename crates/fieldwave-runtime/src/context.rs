//! Per-round execution context
//!
//! Every construct that touches state (`old`, `rep`, `nbr`, `share`) and every
//! routine entered through [`Context::call`] takes the next alignment id of
//! the current scope. Ids depend on the call path alone, so devices running
//! the same program line up their exports even when their data differ.

use std::collections::HashMap;

use fieldwave_core::{AlignmentId, DeviceId, ExportBundle, Exportable, LogicalTime, RoundClock};
use fieldwave_state::{Field, NeighborTable, TemporalStore};
use tracing::trace;

use crate::Storage;

/// One alignment scope: its id and how often each name was entered in it
#[derive(Debug)]
struct Scope {
    id: AlignmentId,
    occurrences: HashMap<&'static str, u32>,
}

impl Scope {
    fn new(id: AlignmentId) -> Self {
        Scope {
            id,
            occurrences: HashMap::new(),
        }
    }

    fn next(&mut self, name: &'static str) -> AlignmentId {
        let counter = self.occurrences.entry(name).or_insert(0);
        let id = self.id.child(name, *counter);
        *counter += 1;
        id
    }
}

/// View of one device during one round
pub struct Context<'a> {
    uid: DeviceId,
    clock: RoundClock,
    neighbors: &'a NeighborTable,
    store: &'a mut TemporalStore,
    storage: &'a mut Storage,
    exports: ExportBundle,
    scopes: Vec<Scope>,
    rejected: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        uid: DeviceId,
        clock: RoundClock,
        neighbors: &'a NeighborTable,
        store: &'a mut TemporalStore,
        storage: &'a mut Storage,
    ) -> Self {
        Context {
            uid,
            clock,
            neighbors,
            store,
            storage,
            exports: ExportBundle::new(),
            scopes: vec![Scope::new(AlignmentId::ROOT)],
            rejected: 0,
        }
    }

    /// Export bundle and number of rejected neighbor values
    pub(crate) fn finish(self) -> (ExportBundle, usize) {
        (self.exports, self.rejected)
    }

    /// Identity of the executing device
    pub fn uid(&self) -> DeviceId {
        self.uid
    }

    pub fn current_time(&self) -> LogicalTime {
        self.clock.current
    }

    pub fn previous_time(&self) -> Option<LogicalTime> {
        self.clock.previous
    }

    /// Seconds since the previous round (1 on the first, never negative)
    pub fn delta_time(&self) -> f64 {
        self.clock.delta()
    }

    /// Id of the innermost scope
    pub fn alignment(&self) -> AlignmentId {
        self.scope().id
    }

    /// Number of neighbors currently in the table
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut *self.storage
    }

    fn scope(&self) -> &Scope {
        // root scope is pushed at construction and never popped
        &self.scopes[self.scopes.len() - 1]
    }

    fn next_id(&mut self, name: &'static str) -> AlignmentId {
        let last = self.scopes.len() - 1;
        self.scopes[last].next(name)
    }

    /// Run `f` inside a new alignment scope named `name`
    pub fn call<R, F>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let id = self.next_id(name);
        self.scopes.push(Scope::new(id));
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Run one of two arms; the arms never align with each other
    pub fn branch<R, T, E>(&mut self, cond: bool, then: T, otherwise: E) -> R
    where
        T: FnOnce(&mut Self) -> R,
        E: FnOnce(&mut Self) -> R,
    {
        let site = self.next_id("branch");
        let arm = site.child(if cond { "then" } else { "else" }, 0);
        self.scopes.push(Scope::new(arm));
        let result = if cond { then(self) } else { otherwise(self) };
        self.scopes.pop();
        result
    }

    fn previous<T: Exportable>(&self, id: AlignmentId) -> Option<T> {
        self.store.value(id).and_then(T::from_value)
    }

    /// `seed` on the first visit, then `update` of the previous result
    pub fn old<T, F>(&mut self, seed: T, update: F) -> T
    where
        T: Exportable,
        F: FnOnce(T) -> T,
    {
        let id = self.next_id("old");
        let next = match self.previous(id) {
            Some(previous) => update(previous),
            None => seed,
        };
        self.store.update(id, next.to_value(), self.clock.current);
        next
    }

    /// `update` of the previous result, or of `seed` on the first visit
    pub fn rep<T, F>(&mut self, seed: T, update: F) -> T
    where
        T: Exportable,
        F: FnOnce(T) -> T,
    {
        let id = self.next_id("rep");
        let previous = self.previous(id).unwrap_or(seed);
        let next = update(previous);
        self.store.update(id, next.to_value(), self.clock.current);
        next
    }

    /// Like [`rep`](Self::rep), but `update` also sees what neighbors
    /// exported here, and the result is exported for them.
    pub fn nbr<T, F>(&mut self, seed: T, update: F) -> T
    where
        T: Exportable,
        F: FnOnce(Field<T>) -> T,
    {
        let id = self.next_id("nbr");
        let own = self.previous(id).unwrap_or(seed);
        let field = self.neighbor_field(id, own);
        let next = update(field);
        let value = next.to_value();
        self.store.update(id, value.clone(), self.clock.current);
        self.exports.insert(id, value);
        next
    }

    /// Export `value` and return it alongside the neighbors' values here
    pub fn share<T: Exportable>(&mut self, value: T) -> Field<T> {
        let id = self.next_id("share");
        self.exports.insert(id, value.to_value());
        self.neighbor_field(id, value)
    }

    /// Link distance to each neighbor (infinite when never reported)
    pub fn nbr_dist(&self) -> Field<f64> {
        Field::from_neighbors(
            0.0,
            self.neighbors
                .iter()
                .map(|entry| (entry.id, entry.distance.unwrap_or(f64::INFINITY))),
        )
    }

    /// Each neighbor's own id
    pub fn nbr_uid(&self) -> Field<DeviceId> {
        Field::from_neighbors(self.uid, self.neighbors.ids().map(|id| (id, id)))
    }

    /// Age of each neighbor's newest message
    pub fn nbr_lag(&self) -> Field<f64> {
        let now = self.clock.current;
        Field::from_neighbors(
            0.0,
            self.neighbors
                .iter()
                .map(|entry| (entry.id, now.elapsed_since(entry.last_seen))),
        )
    }

    fn neighbor_field<T: Exportable>(&mut self, id: AlignmentId, own: T) -> Field<T> {
        let uid = self.uid;
        let neighbors = self.neighbors;
        let mut rejected = 0;
        let values = neighbors.values_at(id).filter_map(|(neighbor, value)| {
            let typed = T::from_value(value);
            if typed.is_none() {
                rejected += 1;
                trace!(
                    device = %uid,
                    neighbor = %neighbor,
                    alignment = %id,
                    kind = ?value.kind(),
                    "rejected mismatched value"
                );
            }
            typed.map(|v| (neighbor, v))
        });
        let field = Field::from_neighbors(own, values);
        self.rejected += rejected;
        field
    }
}
