//! Diameter evaluation scenario
//!
//! A grid of devices runs both diameter estimators on jittered, unsynchronized
//! rounds. After a quarter of the run the reference point of the stable
//! estimate moves to another device, and the device that wins the hop-count
//! election is halted, so both estimators have to re-converge. One
//! [`Snapshot`] is taken per time unit.

use std::path::Path;

use fieldwave_coordination::{hop_diameter_within, stable_diameter, DEFAULT_WAVE_BOUND, HOPS_MAX};
use fieldwave_core::{DeviceId, FieldwaveError, FieldwaveResult, LogicalTime};
use fieldwave_runtime::{Context, Device, RuntimeConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{count_flagged, summarize, Network, ScheduleConfig, Scheduler, Summary, Topology};

/// Output slot names
pub mod slots {
    pub const HOP_DIST: &str = "hop_dist";
    pub const HOP_DIAM: &str = "hop_diam";
    pub const STABLE_DIST: &str = "stable_dist";
    pub const STABLE_DIAM: &str = "stable_diam";
    pub const IS_LEADER: &str = "is_leader";
    pub const IS_SOURCE: &str = "is_source";
}

/// Evaluation scenario parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Grid columns
    pub width: usize,
    /// Grid rows
    pub height: usize,
    /// Link length; hop counts are scaled by it
    pub spacing: f64,
    /// Last snapshot time
    pub end_time: f64,
    /// Neighbor retention window
    pub retention: f64,
    /// Age after which gossiped hop distances are dropped
    pub discard_time: f64,
    /// Reference point of the stable estimate in the first quarter
    pub first_source: u64,
    /// Reference point of the stable estimate afterwards
    pub second_source: u64,
    /// Device halted when the source moves
    pub halted_device: Option<u64>,
    pub schedule: ScheduleConfig,
    /// Route messages through the wire codec
    pub encode_messages: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            spacing: 100.0,
            end_time: 200.0,
            retention: 3.0,
            discard_time: 30.0,
            first_source: 45,
            second_source: 99,
            halted_device: Some(0),
            schedule: ScheduleConfig::default(),
            encode_messages: false,
        }
    }
}

impl EvaluationConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> FieldwaveResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FieldwaveError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: EvaluationConfig = serde_json::from_str(&text).map_err(|e| {
            FieldwaveError::InvalidConfig(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn device_count(&self) -> usize {
        self.width * self.height
    }

    /// Election wave relay bound, kept above the hop diameter of the grid
    pub fn wave_bound(&self) -> u32 {
        let diameter = (self.width + self.height).saturating_sub(2);
        u32::try_from(diameter.saturating_add(1))
            .unwrap_or(u32::MAX)
            .max(DEFAULT_WAVE_BOUND)
    }

    /// Time at which the source moves and the halted device stops
    pub fn switch_time(&self) -> f64 {
        self.end_time / 4.0
    }

    pub fn validate(&self) -> FieldwaveResult<()> {
        let n = self.device_count() as u64;
        if n == 0 {
            return Err(FieldwaveError::InvalidConfig("empty grid".into()));
        }
        for (name, value) in [
            ("spacing", self.spacing),
            ("end_time", self.end_time),
            ("discard_time", self.discard_time),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FieldwaveError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        for source in [self.first_source, self.second_source]
            .into_iter()
            .chain(self.halted_device)
        {
            if source >= n {
                return Err(FieldwaveError::InvalidConfig(format!(
                    "device {} outside a grid of {} devices",
                    source, n
                )));
            }
        }
        RuntimeConfig::new(self.retention)?;
        self.schedule.validate()
    }
}

/// Network state at one time unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f64,
    pub live_devices: usize,
    pub leaders: usize,
    pub sources: usize,
    pub hop_dist: Option<Summary>,
    pub hop_diam: Option<Summary>,
    pub stable_dist: Option<Summary>,
    pub stable_diam: Option<Summary>,
}

impl Snapshot {
    pub fn take(network: &Network, time: f64) -> Self {
        Snapshot {
            time,
            live_devices: network.live_devices().count(),
            leaders: count_flagged(network, slots::IS_LEADER),
            sources: count_flagged(network, slots::IS_SOURCE),
            hop_dist: summarize(network, slots::HOP_DIST),
            hop_diam: summarize(network, slots::HOP_DIAM),
            stable_dist: summarize(network, slots::STABLE_DIST),
            stable_diam: summarize(network, slots::STABLE_DIAM),
        }
    }
}

/// Per-device program of the scenario
pub fn evaluation_program(config: &EvaluationConfig) -> impl Fn(&mut Context<'_>) + Sync {
    let spacing = config.spacing;
    let discard_time = config.discard_time;
    let wave_bound = config.wave_bound();
    let switch_time = config.switch_time();
    let first_source = DeviceId::new(config.first_source);
    let second_source = DeviceId::new(config.second_source);

    move |ctx: &mut Context<'_>| {
        let source = if ctx.current_time().as_secs() > switch_time {
            second_source
        } else {
            first_source
        };
        let is_source = ctx.uid() == source;

        let hop = hop_diameter_within(ctx, discard_time, wave_bound);
        let stable = stable_diameter(ctx, is_source);

        let storage = ctx.storage_mut();
        storage.set(slots::HOP_DIST, hops_to_length(hop.distance, spacing));
        storage.set(slots::HOP_DIAM, hops_to_length(hop.diameter, spacing));
        storage.set(slots::STABLE_DIST, stable.distance);
        storage.set(slots::STABLE_DIAM, stable.diameter);
        storage.set(slots::IS_LEADER, hop.is_source);
        storage.set(slots::IS_SOURCE, stable.is_source);
    }
}

fn hops_to_length(hops: f64, spacing: f64) -> f64 {
    if hops >= HOPS_MAX as f64 {
        f64::INFINITY
    } else {
        hops * spacing
    }
}

/// Run the scenario, handing every snapshot to `emit` as soon as it is taken
pub fn run_evaluation_with<F>(config: &EvaluationConfig, mut emit: F) -> FieldwaveResult<()>
where
    F: FnMut(Snapshot),
{
    config.validate()?;
    let topology = Topology::grid(config.width, config.height, config.spacing);
    let runtime = RuntimeConfig::new(config.retention)?;
    let mut network = Network::new(topology, runtime)?.with_encoding(config.encode_messages);
    let mut scheduler = Scheduler::new(config.schedule.clone(), network.devices().map(Device::id))?;
    let program = evaluation_program(config);

    info!(
        devices = network.len(),
        end_time = config.end_time,
        switch_time = config.switch_time(),
        wave_bound = config.wave_bound(),
        "evaluation started"
    );

    let mut switched = false;
    let ticks = config.end_time.floor() as u64;
    for tick in 0..=ticks {
        let now = tick as f64;
        if !switched && now > config.switch_time() {
            if let Some(halted) = config.halted_device.map(DeviceId::new) {
                network.halt(halted)?;
                scheduler.remove(halted);
            }
            switched = true;
        }
        network.run_scheduled(&mut scheduler, LogicalTime::from_secs(now), &program)?;
        emit(Snapshot::take(&network, now));
    }

    let stats = network.stats();
    info!(
        rounds = stats.rounds,
        messages = stats.messages_sent,
        evicted = stats.neighbors_evicted,
        "evaluation finished"
    );
    Ok(())
}

/// Run the scenario and collect its snapshots
pub fn run_evaluation(config: &EvaluationConfig) -> FieldwaveResult<Vec<Snapshot>> {
    let mut snapshots = Vec::new();
    run_evaluation_with(config, |snapshot| snapshots.push(snapshot))?;
    Ok(snapshots)
}
