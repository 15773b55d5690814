//! Topology - Who hears whom
//!
//! An undirected graph with a physical distance on every link. The network
//! turns each device's adjacency into the links of its round input and the
//! set of devices its messages reach.

use std::collections::{BTreeMap, VecDeque};

use fieldwave_core::DeviceId;
use fieldwave_runtime::NeighborLink;

/// Undirected communication graph
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// device -> (neighbor -> link distance)
    adjacency: BTreeMap<DeviceId, BTreeMap<DeviceId, f64>>,
}

impl Topology {
    pub fn new() -> Self {
        Topology::default()
    }

    /// `n` devices in a row, `spacing` apart
    pub fn line(n: usize, spacing: f64) -> Self {
        let mut topology = Topology::with_devices(n);
        for i in 1..n {
            topology.connect(id(i - 1), id(i), spacing);
        }
        topology
    }

    /// A line with its ends joined
    pub fn ring(n: usize, spacing: f64) -> Self {
        let mut topology = Topology::line(n, spacing);
        if n > 2 {
            topology.connect(id(n - 1), id(0), spacing);
        }
        topology
    }

    /// `width` x `height` lattice, row-major ids, 4-neighborhood
    pub fn grid(width: usize, height: usize, spacing: f64) -> Self {
        let mut topology = Topology::with_devices(width * height);
        for row in 0..height {
            for col in 0..width {
                let here = row * width + col;
                if col + 1 < width {
                    topology.connect(id(here), id(here + 1), spacing);
                }
                if row + 1 < height {
                    topology.connect(id(here), id(here + width), spacing);
                }
            }
        }
        topology
    }

    /// Device 0 linked to every other device
    pub fn star(n: usize, spacing: f64) -> Self {
        let mut topology = Topology::with_devices(n);
        for i in 1..n {
            topology.connect(id(0), id(i), spacing);
        }
        topology
    }

    fn with_devices(n: usize) -> Self {
        let mut topology = Topology::new();
        for i in 0..n {
            topology.add_device(id(i));
        }
        topology
    }

    /// Add an isolated device; returns false if it was already present
    pub fn add_device(&mut self, device: DeviceId) -> bool {
        if self.adjacency.contains_key(&device) {
            return false;
        }
        self.adjacency.insert(device, BTreeMap::new());
        true
    }

    /// Link two devices, adding them if needed. Self-links are ignored.
    pub fn connect(&mut self, a: DeviceId, b: DeviceId, distance: f64) {
        if a == b {
            return;
        }
        self.adjacency.entry(a).or_default().insert(b, distance);
        self.adjacency.entry(b).or_default().insert(a, distance);
    }

    /// Remove the link between two devices; returns true if it existed
    pub fn disconnect(&mut self, a: DeviceId, b: DeviceId) -> bool {
        let removed = self
            .adjacency
            .get_mut(&a)
            .map(|links| links.remove(&b).is_some())
            .unwrap_or(false);
        if let Some(links) = self.adjacency.get_mut(&b) {
            links.remove(&a);
        }
        removed
    }

    pub fn contains(&self, device: DeviceId) -> bool {
        self.adjacency.contains_key(&device)
    }

    pub fn devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn neighbors(&self, device: DeviceId) -> impl Iterator<Item = DeviceId> + '_ {
        self.adjacency
            .get(&device)
            .into_iter()
            .flat_map(|links| links.keys().copied())
    }

    pub fn distance(&self, a: DeviceId, b: DeviceId) -> Option<f64> {
        self.adjacency.get(&a)?.get(&b).copied()
    }

    pub fn degree(&self, device: DeviceId) -> usize {
        self.adjacency.get(&device).map_or(0, BTreeMap::len)
    }

    /// Links of `device` in round-input form
    pub fn links_of(&self, device: DeviceId) -> Vec<NeighborLink> {
        self.adjacency
            .get(&device)
            .map(|links| {
                links
                    .iter()
                    .map(|(id, distance)| NeighborLink {
                        id: *id,
                        distance: *distance,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Hop count from `from` to every reachable device
    pub fn hop_distances(&self, from: DeviceId) -> BTreeMap<DeviceId, u32> {
        let mut hops = BTreeMap::new();
        if !self.contains(from) {
            return hops;
        }
        let mut queue = VecDeque::new();
        hops.insert(from, 0);
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            let next = hops[&current] + 1;
            for neighbor in self.neighbors(current) {
                if !hops.contains_key(&neighbor) {
                    hops.insert(neighbor, next);
                    queue.push_back(neighbor);
                }
            }
        }
        hops
    }

    /// Largest hop count from `device`, `None` if some device is unreachable
    pub fn eccentricity(&self, device: DeviceId) -> Option<u32> {
        let hops = self.hop_distances(device);
        if hops.len() != self.len() {
            return None;
        }
        hops.values().copied().max()
    }

    /// Largest eccentricity, `None` for an empty or disconnected graph
    pub fn hop_diameter(&self) -> Option<u32> {
        let mut diameter = None;
        for device in self.devices() {
            let e = self.eccentricity(device)?;
            diameter = Some(diameter.map_or(e, |d: u32| d.max(e)));
        }
        diameter
    }
}

fn id(index: usize) -> DeviceId {
    DeviceId::new(index as u64)
}
