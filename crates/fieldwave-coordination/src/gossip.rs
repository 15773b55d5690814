//! Gossip of a network-wide maximum
//!
//! [`maximize`] keeps one timestamped sample per device and forgets samples
//! older than a threshold, so it follows a maximum that goes away.
//! [`maxgossip`] keeps only a scalar and never forgets.

use std::collections::BTreeMap;

use fieldwave_core::{DeviceId, Exportable, LogicalTime, Value};
use fieldwave_runtime::Context;
use fieldwave_state::{fold_hood_with_self, max_hood_with_self};

/// Latest timestamped sample per device
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeDict {
    entries: BTreeMap<DeviceId, (LogicalTime, f64)>,
}

impl TimeDict {
    pub fn new() -> Self {
        TimeDict::default()
    }

    /// Dictionary holding a single sample
    pub fn single(id: DeviceId, timestamp: LogicalTime, value: f64) -> Self {
        let mut dict = TimeDict::new();
        dict.insert(id, timestamp, value);
        dict
    }

    /// Store a sample unless one at least as recent is already held
    pub fn insert(&mut self, id: DeviceId, timestamp: LogicalTime, value: f64) {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                if timestamp > entry.0 {
                    *entry = (timestamp, value);
                }
            }
            None => {
                self.entries.insert(id, (timestamp, value));
            }
        }
    }

    /// Merge `other` in, per key the strictly newer sample wins
    pub fn merge(&mut self, other: &TimeDict) {
        for (id, (timestamp, value)) in &other.entries {
            self.insert(*id, *timestamp, *value);
        }
    }

    /// Drop samples older than `threshold`
    pub fn discard(&mut self, threshold: LogicalTime) {
        self.entries.retain(|_, (timestamp, _)| !(*timestamp < threshold));
    }

    /// Largest sample value, 0 when empty
    pub fn max_value(&self) -> f64 {
        self.entries
            .values()
            .fold(0.0, |max, (_, value)| if *value > max { *value } else { max })
    }

    pub fn get(&self, id: DeviceId) -> Option<(LogicalTime, f64)> {
        self.entries.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, LogicalTime, f64)> + '_ {
        self.entries.iter().map(|(id, (t, v))| (*id, *t, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Exportable for TimeDict {
    fn to_value(&self) -> Value {
        self.entries.to_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        BTreeMap::from_value(value).map(|entries| TimeDict { entries })
    }
}

/// Network-wide maximum of `value` over samples newer than `threshold`
/// seconds
///
/// `threshold` has to exceed the time a sample needs to cross the network,
/// otherwise far devices never see it.
pub fn maximize(ctx: &mut Context<'_>, value: f64, threshold: f64) -> f64 {
    ctx.call("maximize", |ctx| {
        let now = ctx.current_time();
        let local = TimeDict::single(ctx.uid(), now, value);
        let dict = ctx.nbr(local.clone(), |field| {
            let mut merged = fold_hood_with_self(&field, |mut acc: TimeDict, other: TimeDict| {
                acc.merge(&other);
                acc
            });
            merged.merge(&local);
            merged.discard(now - threshold);
            merged
        });
        dict.max_value()
    })
}

/// Largest `value` ever seen anywhere; non-decreasing on every device
pub fn maxgossip<T>(ctx: &mut Context<'_>, value: T) -> T
where
    T: Exportable + Clone + PartialOrd,
{
    ctx.call("maxgossip", |ctx| {
        ctx.nbr(value.clone(), |field| {
            let best = max_hood_with_self(&field);
            if value > best {
                value
            } else {
                best
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{values, Line};
    use fieldwave_runtime::{Device, RoundInput, RuntimeConfig};
    use proptest::prelude::*;

    fn t(secs: f64) -> LogicalTime {
        LogicalTime::from_secs(secs)
    }

    fn dict(entries: &[(u64, f64, f64)]) -> TimeDict {
        let mut dict = TimeDict::new();
        for (id, ts, v) in entries {
            dict.insert(DeviceId::new(*id), t(*ts), *v);
        }
        dict
    }

    #[test]
    fn test_newer_timestamp_wins() {
        let mut a = dict(&[(1, 1.0, 10.0), (2, 5.0, 3.0)]);
        let b = dict(&[(1, 2.0, 4.0), (2, 4.0, 99.0), (3, 0.5, 7.0)]);
        a.merge(&b);
        assert_eq!(a.get(DeviceId::new(1)), Some((t(2.0), 4.0)));
        assert_eq!(a.get(DeviceId::new(2)), Some((t(5.0), 3.0)));
        assert_eq!(a.get(DeviceId::new(3)), Some((t(0.5), 7.0)));
    }

    #[test]
    fn test_equal_timestamp_keeps_own() {
        let mut a = dict(&[(1, 1.0, 10.0)]);
        a.merge(&dict(&[(1, 1.0, 20.0)]));
        assert_eq!(a.get(DeviceId::new(1)), Some((t(1.0), 10.0)));
    }

    #[test]
    fn test_discard_boundary() {
        let mut a = dict(&[(1, 1.0, 1.0), (2, 2.0, 2.0), (3, 3.0, 3.0)]);
        a.discard(t(2.0));
        assert_eq!(a.len(), 2);
        assert!(a.get(DeviceId::new(1)).is_none());
        assert!(a.get(DeviceId::new(2)).is_some());
    }

    #[test]
    fn test_max_value_of_empty_is_zero() {
        assert_eq!(TimeDict::new().max_value(), 0.0);
        assert_eq!(dict(&[(1, 0.0, -4.0)]).max_value(), 0.0);
        assert_eq!(dict(&[(1, 0.0, 4.0), (2, 0.0, 6.5)]).max_value(), 6.5);
    }

    #[test]
    fn test_exportable_roundtrip() {
        let a = dict(&[(1, 1.0, 10.0), (7, 2.5, -1.0)]);
        assert_eq!(TimeDict::from_value(&a.to_value()), Some(a));
        assert_eq!(TimeDict::from_value(&Value::Real(1.0)), None);
    }

    #[test]
    fn test_maximize_reaches_every_device() {
        let mut line = Line::new(5);
        let maxima = values(line.run(6, |ctx| {
            let sample = if ctx.uid().0 == 2 { 9.0 } else { 1.0 };
            maximize(ctx, sample, 10.0)
        }));
        assert_eq!(maxima, vec![9.0; 5]);
    }

    #[test]
    fn test_maximize_forgets_departed_maximum() {
        let mut line = Line::new(4);
        let program = |big: bool| {
            move |ctx: &mut Context<'_>| {
                let sample = if big && ctx.uid().0 == 3 { 50.0 } else { 2.0 };
                maximize(ctx, sample, 4.0)
            }
        };
        let maxima = values(line.run(6, program(true)));
        assert_eq!(maxima, vec![50.0; 4]);

        // device 3 keeps running but now reports a small sample
        let maxima = values(line.run(10, program(false)));
        assert_eq!(maxima, vec![2.0; 4]);
    }

    #[test]
    fn test_maxgossip_never_forgets() {
        let mut line = Line::new(4);
        let program = |big: bool| {
            move |ctx: &mut Context<'_>| {
                let sample = if big && ctx.uid().0 == 0 { 8.0 } else { 1.0 };
                maxgossip(ctx, sample)
            }
        };
        values(line.run(5, program(true)));
        let maxima = values(line.run(10, program(false)));
        assert_eq!(maxima, vec![8.0; 4]);
    }

    proptest! {
        #[test]
        fn prop_merge_with_self_is_identity(
            entries in proptest::collection::vec((0u64..8, 0.0f64..100.0, -1e3f64..1e3), 0..12)
        ) {
            let a = dict(&entries);
            let mut merged = a.clone();
            merged.merge(&a);
            prop_assert_eq!(merged, a);
        }

        #[test]
        fn prop_merge_keeps_newest_per_key(
            left in proptest::collection::vec((0u64..6, 0.0f64..100.0, -1e3f64..1e3), 0..10),
            right in proptest::collection::vec((0u64..6, 0.0f64..100.0, -1e3f64..1e3), 0..10),
        ) {
            let a = dict(&left);
            let b = dict(&right);
            let mut merged = a.clone();
            merged.merge(&b);

            for (id, ts, _) in merged.iter() {
                let newest = [a.get(id), b.get(id)]
                    .into_iter()
                    .flatten()
                    .map(|(t, _)| t.as_secs())
                    .fold(f64::NEG_INFINITY, f64::max);
                prop_assert_eq!(ts.as_secs(), newest);
            }
            let keys: std::collections::BTreeSet<_> =
                a.iter().map(|e| e.0).chain(b.iter().map(|e| e.0)).collect();
            prop_assert_eq!(merged.len(), keys.len());
        }

        #[test]
        fn prop_discard_splits_at_threshold(
            entries in proptest::collection::vec((0u64..16, 0.0f64..100.0, -1e3f64..1e3), 0..16),
            threshold in 0.0f64..100.0,
        ) {
            let all = dict(&entries);
            let mut kept = all.clone();
            kept.discard(t(threshold));

            for (id, ts, _) in all.iter() {
                prop_assert_eq!(kept.get(id).is_some(), ts.as_secs() >= threshold);
            }
        }

        #[test]
        fn prop_maxgossip_is_monotone_on_one_device(
            samples in proptest::collection::vec(-1e3f64..1e3, 1..20)
        ) {
            let mut dev = Device::new(DeviceId::new(0), RuntimeConfig::new(3.0).unwrap()).unwrap();
            let mut previous = f64::NEG_INFINITY;
            for (round, sample) in samples.into_iter().enumerate() {
                let input = RoundInput::at(t(round as f64));
                let out = dev.run_round(input, |ctx| maxgossip(ctx, sample));
                prop_assert!(out.value >= previous);
                prop_assert!(out.value >= sample);
                previous = out.value;
            }
        }
    }
}
