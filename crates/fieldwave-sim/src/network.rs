//! In-memory network of devices
//!
//! Devices are wired by a [`Topology`]. A finished round is broadcast to the
//! live neighbors of its sender, optionally through the wire codec. Rounds
//! can run in synchronous steps (every live device once, messages delivered
//! afterwards) or one at a time from a [`Scheduler`].

use std::collections::{BTreeMap, BTreeSet};

use fieldwave_core::{DeviceId, FieldwaveError, FieldwaveResult, LogicalTime, Message};
use fieldwave_runtime::{Context, Device, RoundInput, RoundOutput, RuntimeConfig};
use fieldwave_wire::{decode_message, encode_message};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{Scheduler, Topology};

/// Network-wide counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStats {
    pub rounds: u64,
    pub messages_sent: u64,
    pub deliveries: u64,
    pub bytes_encoded: u64,
    pub neighbors_evicted: u64,
    pub values_rejected: u64,
}

/// Devices, links and message delivery
pub struct Network {
    topology: Topology,
    config: RuntimeConfig,
    devices: BTreeMap<DeviceId, Device>,
    halted: BTreeSet<DeviceId>,
    encode_messages: bool,
    stats: NetworkStats,
}

impl Network {
    /// One device per topology node, all sharing `config`
    pub fn new(topology: Topology, config: RuntimeConfig) -> FieldwaveResult<Self> {
        let mut devices = BTreeMap::new();
        for id in topology.devices() {
            devices.insert(id, Device::new(id, config.clone())?);
        }
        Ok(Network {
            topology,
            config,
            devices,
            halted: BTreeSet::new(),
            encode_messages: false,
            stats: NetworkStats::default(),
        })
    }

    /// Route every message through the binary codec
    pub fn with_encoding(mut self, encode_messages: bool) -> Self {
        self.encode_messages = encode_messages;
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Devices that still run rounds
    pub fn live_devices(&self) -> impl Iterator<Item = &Device> {
        self.devices
            .values()
            .filter(|device| !self.halted.contains(&device.id()))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Add an unlinked device
    pub fn add_device(&mut self, id: DeviceId) -> FieldwaveResult<()> {
        if self.devices.contains_key(&id) {
            return Err(FieldwaveError::DuplicateDevice(id));
        }
        self.devices.insert(id, Device::new(id, self.config.clone())?);
        self.topology.add_device(id);
        Ok(())
    }

    /// Link two existing devices
    pub fn connect(&mut self, a: DeviceId, b: DeviceId, distance: f64) -> FieldwaveResult<()> {
        self.require(a)?;
        self.require(b)?;
        self.topology.connect(a, b, distance);
        Ok(())
    }

    pub fn disconnect(&mut self, a: DeviceId, b: DeviceId) -> bool {
        self.topology.disconnect(a, b)
    }

    /// Stop running rounds on `id`; its neighbors age it out on their own
    pub fn halt(&mut self, id: DeviceId) -> FieldwaveResult<()> {
        self.require(id)?;
        if self.halted.insert(id) {
            info!(device = %id, "device halted");
        }
        Ok(())
    }

    pub fn resume(&mut self, id: DeviceId) -> FieldwaveResult<()> {
        self.require(id)?;
        if self.halted.remove(&id) {
            info!(device = %id, "device resumed");
        }
        Ok(())
    }

    pub fn is_halted(&self, id: DeviceId) -> bool {
        self.halted.contains(&id)
    }

    fn require(&self, id: DeviceId) -> FieldwaveResult<()> {
        if self.devices.contains_key(&id) {
            Ok(())
        } else {
            Err(FieldwaveError::UnknownDevice(id))
        }
    }

    /// One synchronous round: every live device runs at `time`, then all
    /// messages are delivered
    pub fn step<R, P>(
        &mut self,
        time: LogicalTime,
        program: &P,
    ) -> FieldwaveResult<BTreeMap<DeviceId, R>>
    where
        P: Fn(&mut Context<'_>) -> R,
    {
        let topology = &self.topology;
        let halted = &self.halted;
        let outputs: Vec<(DeviceId, RoundOutput<R>)> = self
            .devices
            .values_mut()
            .filter(|device| !halted.contains(&device.id()))
            .map(|device| {
                let input = round_input(topology, halted, device.id(), time);
                (device.id(), device.run_round(input, |ctx| program(ctx)))
            })
            .collect();
        self.finish_step(time, outputs)
    }

    /// [`Network::step`] with device rounds spread over `workers` threads
    ///
    /// Rounds of one step only read state from earlier steps, so the result
    /// equals the sequential one.
    pub fn step_parallel<R, P>(
        &mut self,
        time: LogicalTime,
        program: &P,
        workers: usize,
    ) -> FieldwaveResult<BTreeMap<DeviceId, R>>
    where
        R: Send,
        P: Fn(&mut Context<'_>) -> R + Sync,
    {
        let topology = &self.topology;
        let halted = &self.halted;
        let mut live: Vec<&mut Device> = self
            .devices
            .values_mut()
            .filter(|device| !halted.contains(&device.id()))
            .collect();
        let chunk_size = live.len().div_ceil(workers.max(1)).max(1);
        let finished = Mutex::new(Vec::with_capacity(live.len()));

        std::thread::scope(|scope| {
            for chunk in live.chunks_mut(chunk_size) {
                let finished = &finished;
                scope.spawn(move || {
                    let outputs: Vec<(DeviceId, RoundOutput<R>)> = chunk
                        .iter_mut()
                        .map(|device| {
                            let input = round_input(topology, halted, device.id(), time);
                            (device.id(), device.run_round(input, |ctx| program(ctx)))
                        })
                        .collect();
                    finished.lock().extend(outputs);
                });
            }
        });

        let mut outputs = finished.into_inner();
        outputs.sort_by_key(|(id, _)| *id);
        self.finish_step(time, outputs)
    }

    fn finish_step<R>(
        &mut self,
        time: LogicalTime,
        outputs: Vec<(DeviceId, RoundOutput<R>)>,
    ) -> FieldwaveResult<BTreeMap<DeviceId, R>> {
        let mut values = BTreeMap::new();
        let mut messages = Vec::with_capacity(outputs.len());
        for (id, output) in outputs {
            self.record(&output);
            messages.push(output.message);
            values.insert(id, output.value);
        }
        for message in messages {
            self.broadcast(message)?;
        }
        debug!(time = time.as_secs(), devices = values.len(), "network step complete");
        Ok(values)
    }

    /// Run one round of `id` and deliver its message right away
    ///
    /// Returns `None` for a halted device.
    pub fn run_device_round<R, P>(
        &mut self,
        id: DeviceId,
        time: LogicalTime,
        program: &P,
    ) -> FieldwaveResult<Option<R>>
    where
        P: Fn(&mut Context<'_>) -> R,
    {
        if self.halted.contains(&id) {
            self.require(id)?;
            return Ok(None);
        }
        let input = round_input(&self.topology, &self.halted, id, time);
        let device = self
            .devices
            .get_mut(&id)
            .ok_or(FieldwaveError::UnknownDevice(id))?;
        let output = device.run_round(input, |ctx| program(ctx));
        self.record(&output);
        self.broadcast(output.message)?;
        Ok(Some(output.value))
    }

    /// Fire scheduled rounds up to and including `until`
    ///
    /// Returns the number of rounds run.
    pub fn run_scheduled<R, P>(
        &mut self,
        scheduler: &mut Scheduler,
        until: LogicalTime,
        program: &P,
    ) -> FieldwaveResult<usize>
    where
        P: Fn(&mut Context<'_>) -> R,
    {
        let mut rounds = 0;
        while let Some(next) = scheduler.peek_time() {
            if next > until {
                break;
            }
            let Some((time, id)) = scheduler.pop() else {
                break;
            };
            if self.run_device_round(id, time, program)?.is_some() {
                rounds += 1;
            }
        }
        Ok(rounds)
    }

    fn record<R>(&mut self, output: &RoundOutput<R>) {
        self.stats.rounds += 1;
        self.stats.neighbors_evicted += output.report.evicted.len() as u64;
        self.stats.values_rejected += output.report.rejected as u64;
    }

    /// Hand `message` to every live neighbor of its sender
    fn broadcast(&mut self, message: Message) -> FieldwaveResult<usize> {
        let message = self.transmit(message)?;
        self.stats.messages_sent += 1;

        let mut delivered = 0;
        for neighbor in self.topology.neighbors(message.sender) {
            if self.halted.contains(&neighbor) {
                continue;
            }
            if let Some(device) = self.devices.get_mut(&neighbor) {
                device.receive(&message);
                delivered += 1;
            }
        }
        self.stats.deliveries += delivered as u64;
        Ok(delivered)
    }

    fn transmit(&mut self, message: Message) -> FieldwaveResult<Message> {
        if !self.encode_messages {
            return Ok(message);
        }
        let frame = encode_message(&message)?;
        self.stats.bytes_encoded += frame.len() as u64;
        decode_message(&frame)
    }
}

/// Round input of `id`: its links to devices that are still running
fn round_input(
    topology: &Topology,
    halted: &BTreeSet<DeviceId>,
    id: DeviceId,
    time: LogicalTime,
) -> RoundInput {
    let mut input = RoundInput::at(time);
    input.links = topology
        .links_of(id)
        .into_iter()
        .filter(|link| !halted.contains(&link.id))
        .collect();
    input
}
