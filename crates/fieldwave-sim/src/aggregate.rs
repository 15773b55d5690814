//! Network-wide summaries of per-device output slots

use serde::{Deserialize, Serialize};

use crate::Network;

/// Count, extremes and mean of a set of samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Summary {
    /// Summary of the finite samples, `None` if there are none
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Summary> {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for value in values.into_iter().filter(|v| v.is_finite()) {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }
        (count > 0).then(|| Summary {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

/// Summary of a numeric output slot over the live devices
pub fn summarize(network: &Network, slot: &str) -> Option<Summary> {
    Summary::from_values(
        network
            .live_devices()
            .filter_map(|device| device.storage().get(slot))
            .filter_map(|value| value.as_f64()),
    )
}

/// Live devices whose boolean slot is set
pub fn count_flagged(network: &Network, slot: &str) -> usize {
    network
        .live_devices()
        .filter(|device| device.storage().get_as::<bool>(slot) == Some(true))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Topology;
    use fieldwave_core::{DeviceId, LogicalTime};
    use fieldwave_runtime::{Context, RuntimeConfig};

    #[test]
    fn test_summary_of_values() {
        let summary = Summary::from_values([1.0, 4.0, 7.0]).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 7.0);
        assert_eq!(summary.mean, 4.0);
    }

    #[test]
    fn test_summary_skips_non_finite() {
        let summary = Summary::from_values([2.0, f64::INFINITY, f64::NAN]).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, 2.0);
        assert!(Summary::from_values([f64::INFINITY]).is_none());
        assert!(Summary::from_values(Vec::new()).is_none());
    }

    #[test]
    fn test_summarize_live_devices() {
        let config = RuntimeConfig::new(3.0).unwrap();
        let mut net = Network::new(Topology::line(4, 1.0), config).unwrap();
        let program = |ctx: &mut Context<'_>| {
            let id = ctx.uid().0;
            ctx.storage_mut().set("index", id as f64);
            ctx.storage_mut().set("even", id % 2 == 0);
        };
        net.step(LogicalTime::ZERO, &program).unwrap();

        let summary = summarize(&net, "index").unwrap();
        assert_eq!((summary.count, summary.min, summary.max), (4, 0.0, 3.0));
        assert_eq!(count_flagged(&net, "even"), 2);
        assert!(summarize(&net, "missing").is_none());

        net.halt(DeviceId::new(3)).unwrap();
        assert_eq!(summarize(&net, "index").unwrap().max, 2.0);
        assert_eq!(count_flagged(&net, "even"), 2);
    }
}
