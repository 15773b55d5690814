//! Event-queue scheduler for asynchronous rounds
//!
//! Every device fires once per period. Start offsets are drawn in
//! `[0, period)` and every period is perturbed by up to `jitter`, so devices
//! drift apart the way unsynchronized clocks do. The random stream is
//! seeded, which makes a run reproducible.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use fieldwave_core::{DeviceId, FieldwaveError, FieldwaveResult, LogicalTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Round timing of a scheduled run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Mean time between two rounds of one device
    pub period: f64,
    /// Largest deviation of a single period
    pub jitter: f64,
    /// Seed of the offset and jitter stream
    pub seed: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            period: 1.0,
            jitter: 0.1,
            seed: 0x5eed,
        }
    }
}

impl ScheduleConfig {
    /// Every device fires together, once per time unit
    pub fn lockstep() -> Self {
        Self {
            period: 1.0,
            jitter: 0.0,
            seed: 0,
        }
    }

    pub fn validate(&self) -> FieldwaveResult<()> {
        if !self.period.is_finite() || self.period <= 0.0 {
            return Err(FieldwaveError::InvalidConfig(format!(
                "period must be a positive number, got {}",
                self.period
            )));
        }
        if !self.jitter.is_finite() || self.jitter < 0.0 || self.jitter >= self.period {
            return Err(FieldwaveError::InvalidConfig(format!(
                "jitter must lie in [0, period), got {}",
                self.jitter
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Event {
    time: LogicalTime,
    device: DeviceId,
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.device.cmp(&other.device))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Queue of upcoming rounds, earliest first
pub struct Scheduler {
    config: ScheduleConfig,
    queue: BinaryHeap<Reverse<Event>>,
    rng: StdRng,
}

impl Scheduler {
    /// Schedule the first round of every device in `devices`
    pub fn new(
        config: ScheduleConfig,
        devices: impl IntoIterator<Item = DeviceId>,
    ) -> FieldwaveResult<Self> {
        config.validate()?;
        let mut scheduler = Scheduler {
            rng: StdRng::seed_from_u64(config.seed),
            queue: BinaryHeap::new(),
            config,
        };
        for device in devices {
            let offset = if scheduler.config.jitter > 0.0 {
                scheduler.rng.gen_range(0.0..scheduler.config.period)
            } else {
                0.0
            };
            scheduler.push(LogicalTime::from_secs(offset), device);
        }
        Ok(scheduler)
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    fn push(&mut self, time: LogicalTime, device: DeviceId) {
        self.queue.push(Reverse(Event { time, device }));
    }

    /// Time of the next round
    pub fn peek_time(&self) -> Option<LogicalTime> {
        self.queue.peek().map(|Reverse(event)| event.time)
    }

    /// Take the next round and book the one after it
    pub fn pop(&mut self) -> Option<(LogicalTime, DeviceId)> {
        let Reverse(event) = self.queue.pop()?;
        let jitter = self.config.jitter;
        let deviation = if jitter > 0.0 {
            self.rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        self.push(event.time + (self.config.period + deviation), event.device);
        Some((event.time, event.device))
    }

    /// Stop scheduling `device`; returns false if it had no pending round
    pub fn remove(&mut self, device: DeviceId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|Reverse(event)| event.device != device);
        self.queue.len() != before
    }

    /// Devices with a pending round
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: u64) -> impl Iterator<Item = DeviceId> {
        (0..n).map(DeviceId::new)
    }

    #[test]
    fn test_invalid_config() {
        let bad_period = ScheduleConfig {
            period: 0.0,
            ..ScheduleConfig::default()
        };
        assert!(Scheduler::new(bad_period, ids(1)).is_err());

        let bad_jitter = ScheduleConfig {
            period: 1.0,
            jitter: 1.0,
            seed: 0,
        };
        assert!(Scheduler::new(bad_jitter, ids(1)).is_err());
    }

    #[test]
    fn test_lockstep_order() {
        let mut scheduler = Scheduler::new(ScheduleConfig::lockstep(), ids(3)).unwrap();
        let fired: Vec<_> = (0..6).map(|_| scheduler.pop().unwrap()).collect();
        let expected: Vec<_> = [0.0, 1.0]
            .iter()
            .flat_map(|t| ids(3).map(move |d| (LogicalTime::from_secs(*t), d)))
            .collect();
        assert_eq!(fired, expected);
    }

    #[test]
    fn test_same_seed_same_schedule() {
        let config = ScheduleConfig::default();
        let mut a = Scheduler::new(config.clone(), ids(10)).unwrap();
        let mut b = Scheduler::new(config, ids(10)).unwrap();
        for _ in 0..100 {
            assert_eq!(a.pop(), b.pop());
        }
    }

    #[test]
    fn test_remove_device() {
        let mut scheduler = Scheduler::new(ScheduleConfig::default(), ids(4)).unwrap();
        assert!(scheduler.remove(DeviceId::new(2)));
        assert!(!scheduler.remove(DeviceId::new(2)));
        assert_eq!(scheduler.len(), 3);
        for _ in 0..20 {
            let (_, device) = scheduler.pop().unwrap();
            assert_ne!(device, DeviceId::new(2));
        }
    }

    proptest! {
        #[test]
        fn prop_times_never_decrease(seed in any::<u64>(), jitter in 0.0f64..0.9) {
            let config = ScheduleConfig { period: 1.0, jitter, seed };
            let mut scheduler = Scheduler::new(config, ids(8)).unwrap();
            let mut last = f64::NEG_INFINITY;
            for _ in 0..200 {
                let (time, _) = scheduler.pop().unwrap();
                prop_assert!(time.as_secs() >= last);
                last = time.as_secs();
            }
        }

        #[test]
        fn prop_gaps_stay_within_jitter(seed in any::<u64>(), jitter in 0.0f64..0.9) {
            let config = ScheduleConfig { period: 1.0, jitter, seed };
            let mut scheduler = Scheduler::new(config, ids(1)).unwrap();
            let (mut previous, _) = scheduler.pop().unwrap();
            prop_assert!(previous.as_secs() >= 0.0 && previous.as_secs() < 1.0);
            for _ in 0..50 {
                let (time, _) = scheduler.pop().unwrap();
                let gap = time.as_secs() - previous.as_secs();
                prop_assert!(gap >= 1.0 - jitter - 1e-9 && gap <= 1.0 + jitter + 1e-9);
                previous = time;
            }
        }
    }
}
