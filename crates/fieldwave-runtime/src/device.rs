//! Device - the round engine

use fieldwave_core::{DeviceId, FieldwaveResult, LogicalTime, Message, RoundClock};
use fieldwave_state::{NeighborTable, ReceiveOutcome, TemporalStore};
use tracing::{debug, trace, warn};

use crate::{Context, RuntimeConfig, Storage};

/// A neighbor reported by the connectivity layer for this round
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborLink {
    pub id: DeviceId,
    /// Physical distance to the neighbor
    pub distance: f64,
}

/// What the scheduler hands a device at round start
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundInput {
    pub time: LogicalTime,
    pub links: Vec<NeighborLink>,
}

impl RoundInput {
    pub fn at(time: LogicalTime) -> Self {
        RoundInput {
            time,
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, id: DeviceId, distance: f64) -> Self {
        self.links.push(NeighborLink { id, distance });
        self
    }
}

/// Bookkeeping of one round
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoundReport {
    /// Entries in the produced export bundle
    pub exported: usize,
    /// Neighbors visible to the program
    pub neighbors: usize,
    /// Neighbor values dropped for not matching the expected type
    pub rejected: usize,
    /// Neighbors that aged out at round start
    pub evicted: Vec<DeviceId>,
    /// Temporal slots dropped for not being visited
    pub slots_dropped: usize,
    /// Round time did not lie after the previous one
    pub non_monotonic: bool,
}

/// Result of one round
#[derive(Clone, Debug)]
pub struct RoundOutput<R> {
    /// Program result
    pub value: R,
    /// Export bundle stamped with device id and round time
    pub message: Message,
    pub report: RoundReport,
}

#[derive(Clone, Debug, Default)]
pub struct DeviceStats {
    pub rounds: u64,
    pub messages_accepted: u64,
    pub messages_ignored: u64,
    pub neighbors_evicted: u64,
    pub values_rejected: u64,
    pub clock_anomalies: u64,
}

/// One device: temporal state, neighbor table and output slots
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    config: RuntimeConfig,
    clock: Option<RoundClock>,
    store: TemporalStore,
    neighbors: NeighborTable,
    storage: Storage,
    stats: DeviceStats,
}

impl Device {
    pub fn new(id: DeviceId, config: RuntimeConfig) -> FieldwaveResult<Self> {
        config.validate()?;
        Ok(Device {
            id,
            config,
            clock: None,
            store: TemporalStore::new(),
            neighbors: NeighborTable::new(id),
            storage: Storage::new(),
            stats: DeviceStats::default(),
        })
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Clock of the last round run, `None` before the first
    pub fn clock(&self) -> Option<RoundClock> {
        self.clock
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    pub fn store(&self) -> &TemporalStore {
        &self.store
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    /// Deliver a neighbor's message; it is read at the next round start
    pub fn receive(&mut self, message: &Message) -> ReceiveOutcome {
        let outcome = self.neighbors.receive(message);
        if outcome.is_accepted() {
            self.stats.messages_accepted += 1;
        } else {
            self.stats.messages_ignored += 1;
        }
        outcome
    }

    /// Execute `program` once
    pub fn run_round<R, F>(&mut self, input: RoundInput, program: F) -> RoundOutput<R>
    where
        F: FnOnce(&mut Context<'_>) -> R,
    {
        // Stage 1: advance the clock
        let clock = match self.clock {
            Some(clock) => clock.advance(input.time),
            None => RoundClock::first(input.time),
        };
        let non_monotonic = clock.is_non_monotonic();
        if non_monotonic {
            warn!(
                device = %self.id,
                time = clock.current.as_secs(),
                previous = clock.previous.map(LogicalTime::as_secs),
                "round clock did not advance, elapsed time clamped to zero"
            );
            self.stats.clock_anomalies += 1;
        }
        self.clock = Some(clock);

        // Stage 2: evict stale neighbors
        let evicted = self.neighbors.evict(clock.current, self.config.retention);

        // Stage 3: link distances, only the ones reported this round
        self.neighbors.clear_distances();
        for link in &input.links {
            if !self.neighbors.set_distance(link.id, link.distance) {
                trace!(device = %self.id, neighbor = %link.id, "link to neighbor without data");
            }
        }

        // Stage 4: run the program
        let mut ctx = Context::new(
            self.id,
            clock,
            &self.neighbors,
            &mut self.store,
            &mut self.storage,
        );
        let value = program(&mut ctx);
        let (exports, rejected) = ctx.finish();

        // Stage 5: forget slots the program no longer visits
        let slots_dropped = self
            .store
            .evict_unvisited(clock.current - self.config.state_window());

        // Stage 6: stamp the bundle
        let message = Message::new(self.id, clock.current, exports);

        self.stats.rounds += 1;
        self.stats.neighbors_evicted += evicted.len() as u64;
        self.stats.values_rejected += rejected as u64;

        let report = RoundReport {
            exported: message.bundle.len(),
            neighbors: self.neighbors.len(),
            rejected,
            evicted,
            slots_dropped,
            non_monotonic,
        };

        debug!(
            device = %self.id,
            time = clock.current.as_secs(),
            exported = report.exported,
            neighbors = report.neighbors,
            "round complete"
        );

        RoundOutput {
            value,
            message,
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwave_core::{AlignmentId, ExportBundle};

    fn device(id: u64, retention: f64) -> Device {
        Device::new(DeviceId::new(id), RuntimeConfig::new(retention).unwrap()).unwrap()
    }

    fn at(secs: f64) -> RoundInput {
        RoundInput::at(LogicalTime::from_secs(secs))
    }

    fn empty_message(sender: u64, secs: f64) -> Message {
        Message::new(DeviceId::new(sender), LogicalTime::from_secs(secs), ExportBundle::new())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RuntimeConfig {
            retention: 0.0,
            state_retention: None,
        };
        assert!(Device::new(DeviceId::new(1), config).is_err());
    }

    #[test]
    fn test_message_is_stamped() {
        let mut dev = device(9, 3.0);
        let out = dev.run_round(at(4.5), |ctx| ctx.nbr(0u32, |f| *f.own()));
        assert_eq!(out.message.sender, DeviceId::new(9));
        assert_eq!(out.message.timestamp, LogicalTime::from_secs(4.5));
        assert_eq!(out.report.exported, 1);
        assert_eq!(dev.stats().rounds, 1);
    }

    #[test]
    fn test_neighbor_ages_out() {
        let mut dev = device(0, 3.0);
        dev.receive(&empty_message(1, 1.0));

        let out = dev.run_round(at(4.0), |ctx| ctx.neighbor_count());
        assert_eq!(out.value, 1);
        assert!(out.report.evicted.is_empty());

        let out = dev.run_round(at(4.25), |ctx| ctx.neighbor_count());
        assert_eq!(out.value, 0);
        assert_eq!(out.report.evicted, vec![DeviceId::new(1)]);
        assert_eq!(dev.stats().neighbors_evicted, 1);
    }

    #[test]
    fn test_receive_counts_outcomes() {
        let mut dev = device(0, 3.0);
        assert_eq!(dev.receive(&empty_message(1, 1.0)), ReceiveOutcome::Inserted);
        assert_eq!(dev.receive(&empty_message(1, 0.5)), ReceiveOutcome::Stale);
        assert_eq!(dev.receive(&empty_message(0, 2.0)), ReceiveOutcome::OwnMessage);
        assert_eq!(dev.stats().messages_accepted, 1);
        assert_eq!(dev.stats().messages_ignored, 2);
    }

    #[test]
    fn test_backwards_clock_clamps_delta() {
        let mut dev = device(0, 3.0);
        dev.run_round(at(5.0), |_| ());
        let out = dev.run_round(at(4.0), |ctx| ctx.delta_time());
        assert_eq!(out.value, 0.0);
        assert!(out.report.non_monotonic);
        assert_eq!(dev.stats().clock_anomalies, 1);

        let out = dev.run_round(at(4.0), |ctx| ctx.delta_time());
        assert_eq!(out.value, 0.0);
        assert!(out.report.non_monotonic);
    }

    #[test]
    fn test_first_round_delta_is_one() {
        let mut dev = device(0, 3.0);
        let out = dev.run_round(at(10.0), |ctx| (ctx.delta_time(), ctx.previous_time()));
        assert_eq!(out.value, (1.0, None));
    }

    #[test]
    fn test_unvisited_slots_are_dropped() {
        let mut dev = device(0, 2.0);
        let program = |on: bool| {
            move |ctx: &mut Context<'_>| {
                ctx.branch(on, |ctx| ctx.rep(0u32, |x| x + 1), |_| 0)
            }
        };

        assert_eq!(dev.run_round(at(0.0), program(true)).value, 1);
        assert_eq!(dev.run_round(at(1.0), program(true)).value, 2);

        // branch not taken for longer than the state window
        dev.run_round(at(2.0), program(false));
        let out = dev.run_round(at(3.5), program(false));
        assert_eq!(out.report.slots_dropped, 1);

        // re-entering restarts from the seed
        assert_eq!(dev.run_round(at(4.0), program(true)).value, 1);
    }

    #[test]
    fn test_slot_survives_short_gap() {
        let mut dev = device(0, 2.0);
        let program = |on: bool| {
            move |ctx: &mut Context<'_>| ctx.branch(on, |ctx| ctx.rep(0u32, |x| x + 1), |_| 0)
        };
        dev.run_round(at(0.0), program(true));
        dev.run_round(at(1.0), program(false));
        assert_eq!(dev.run_round(at(2.0), program(true)).value, 2);
        assert!(!dev.store().is_empty());
    }

    #[test]
    fn test_links_set_distance() {
        let mut dev = device(0, 3.0);
        dev.receive(&empty_message(3, 0.0));
        dev.run_round(at(0.5).with_link(DeviceId::new(3), 12.5), |_| ());
        assert_eq!(dev.neighbors().get(DeviceId::new(3)).unwrap().distance, Some(12.5));
    }

    #[test]
    fn test_unreported_link_loses_its_distance() {
        let mut dev = device(0, 3.0);
        dev.receive(&empty_message(3, 0.0));
        dev.run_round(at(0.5).with_link(DeviceId::new(3), 12.5), |_| ());

        let link = dev.run_round(at(1.0), |ctx| ctx.nbr_dist().get(DeviceId::new(3)).copied());
        assert_eq!(link.value, Some(f64::INFINITY));
        assert_eq!(dev.neighbors().get(DeviceId::new(3)).unwrap().distance, None);
    }

    #[test]
    fn test_storage_written_by_program() {
        let mut dev = device(0, 3.0);
        dev.run_round(at(0.0), |ctx| ctx.storage_mut().set("hop_dist", 4u32));
        assert_eq!(dev.storage().get_as::<u32>("hop_dist"), Some(4));
    }

    #[test]
    fn test_alignment_is_shared_across_devices() {
        let mut a = device(1, 3.0);
        let mut b = device(2, 3.0);
        let program = |ctx: &mut Context<'_>| ctx.call("routine", |ctx| ctx.share(ctx.uid()));
        let out_a = a.run_round(at(0.0), program);
        let out_b = b.run_round(at(0.0), program);
        let ids_a: Vec<AlignmentId> = out_a.message.bundle.ids().collect();
        let ids_b: Vec<AlignmentId> = out_b.message.bundle.ids().collect();
        assert_eq!(ids_a, ids_b);
    }
}
