//! Network diameter estimators

use fieldwave_runtime::Context;

use crate::{
    dist, election_within, integrate, lowpass, maximize, maxgossip, rdist, DEFAULT_WAVE_BOUND,
};

/// Per-round estimate on one device
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiameterResult {
    /// Device is the reference point of the estimate
    pub is_source: bool,
    /// Distance from the reference point
    pub distance: f64,
    /// Network-wide estimate
    pub diameter: f64,
}

/// Eccentricity of an elected leader in hops
///
/// Distances are gossiped with expiry after `threshold` seconds, so the
/// estimate follows leader changes. The election waves travel at most
/// [`DEFAULT_WAVE_BOUND`] hops; use [`hop_diameter_within`] on wider networks.
pub fn hop_diameter(ctx: &mut Context<'_>, threshold: f64) -> DiameterResult {
    hop_diameter_within(ctx, threshold, DEFAULT_WAVE_BOUND)
}

/// [`hop_diameter`] with an explicit wave relay bound
///
/// `bound` has to exceed the hop diameter of the network, otherwise devices
/// out of reach of the lowest wave elect a leader of their own.
pub fn hop_diameter_within(ctx: &mut Context<'_>, threshold: f64, bound: u32) -> DiameterResult {
    ctx.call("hop_diameter", |ctx| {
        let leader = election_within(ctx, bound);
        let hops = dist(ctx, leader) as f64;
        let diameter = maximize(ctx, hops, threshold);
        DiameterResult {
            is_source: leader,
            distance: hops,
            diameter,
        }
    })
}

/// Smoothed eccentricity of `source` along measured links
///
/// The distance is time-averaged, low-pass filtered and gossiped without
/// expiry, trading reactivity for a steady estimate. The reported distance
/// is the time average, with unreachable rounds counted as 0.
pub fn stable_diameter(ctx: &mut Context<'_>, source: bool) -> DiameterResult {
    ctx.call("stable_diameter", |ctx| {
        let distance = rdist(ctx, source);
        let sample = if distance.is_infinite() { 0.0 } else { distance };
        let exposure = integrate(ctx, 1.0);
        let area = integrate(ctx, sample);
        let average = if exposure > 0.0 { area / exposure } else { sample };
        let smooth = lowpass(ctx, average);
        DiameterResult {
            is_source: source,
            distance: average,
            diameter: maxgossip(ctx, smooth),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{values, Line};

    #[test]
    fn test_hop_diameter_on_a_line() {
        let mut line = Line::new(5);
        let results = values(line.run(30, |ctx| hop_diameter(ctx, 10.0)));

        assert!(results[0].is_source);
        assert!(results[1..].iter().all(|r| !r.is_source));
        let distances: Vec<f64> = results.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!(results.iter().all(|r| r.diameter == 4.0));
    }

    #[test]
    fn test_stable_diameter_approaches_eccentricity() {
        let mut line = Line::new(5);
        let results = values(line.run(200, |ctx| {
            let source = ctx.uid().0 == 0;
            stable_diameter(ctx, source)
        }));

        // unreachable for the first four rounds: 4 * 196 / 200
        let far = results[4].distance;
        assert!((far - 3.92).abs() < 1e-9, "distance {}", far);
        for r in &results {
            assert!(r.diameter > 3.8 && r.diameter <= 4.0, "diameter {}", r.diameter);
        }
    }

    #[test]
    fn test_stable_diameter_without_source() {
        let mut line = Line::new(3);
        let results = values(line.run(5, |ctx| stable_diameter(ctx, false)));
        for r in results {
            assert_eq!(r.distance, 0.0);
            assert_eq!(r.diameter, 0.0);
        }
    }

    #[test]
    fn test_stable_distance_is_time_averaged() {
        let mut line = Line::new(3);
        let results = values(line.run(4, |ctx| {
            let source = ctx.uid().0 == 0;
            stable_diameter(ctx, source)
        }));
        let distances: Vec<f64> = results.iter().map(|r| r.distance).collect();
        assert_eq!(distances, vec![0.0, 0.75, 1.0]);
    }

    #[test]
    fn test_hop_diameter_on_a_line_longer_than_the_default_bound() {
        let mut line = Line::new(40);
        let results = values(line.run(120, |ctx| hop_diameter_within(ctx, 200.0, 48)));

        assert_eq!(results.iter().filter(|r| r.is_source).count(), 1);
        assert!(results[0].is_source);
        assert_eq!(results[39].distance, 39.0);
        assert!(results.iter().all(|r| r.diameter == 39.0));
    }
}
