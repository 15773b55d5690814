//! Wave propagation and leader election
//!
//! Every device floods a token carrying its key. Each device keeps the
//! smallest token reaching it, so the wave of the lowest key wins. Tokens
//! are relayed at most `bound` hops: when an initiator stops running, copies
//! of its token keep gaining hops in the network until they exceed the bound
//! and vanish, and the next lowest wave takes over.

use fieldwave_core::{DeviceId, Exportable, Value};
use fieldwave_runtime::Context;

/// Default relay bound; must exceed the network hop diameter
pub const DEFAULT_WAVE_BOUND: u32 = 32;

/// A wave as seen by one device
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaveToken {
    /// Cost of the wave; the lowest wins
    pub key: u64,
    /// Device that started the wave
    pub origin: DeviceId,
    /// Hops travelled from the origin
    pub hops: u32,
}

impl WaveToken {
    pub fn new(key: u64, origin: DeviceId) -> Self {
        WaveToken {
            key,
            origin,
            hops: 0,
        }
    }

    /// Token one hop further, `None` past `bound`
    pub fn relay(&self, bound: u32) -> Option<WaveToken> {
        let hops = self.hops.checked_add(1)?;
        (hops <= bound).then_some(WaveToken { hops, ..*self })
    }
}

impl Exportable for WaveToken {
    fn to_value(&self) -> Value {
        (self.key, self.origin, self.hops).to_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        let (key, origin, hops) = <(u64, DeviceId, u32)>::from_value(value)?;
        Some(WaveToken { key, origin, hops })
    }
}

/// Smallest wave reaching this device, its own included
pub fn wave(ctx: &mut Context<'_>, key: u64, bound: u32) -> WaveToken {
    let own = WaveToken::new(key, ctx.uid());
    ctx.call("wave", |ctx| {
        ctx.nbr(own, |field| {
            field
                .iter()
                .filter_map(|(_, token)| token.relay(bound))
                .fold(own, Ord::min)
        })
    })
}

/// Device whose wave reaches this one first, keyed by device id
pub fn wave_election(ctx: &mut Context<'_>) -> DeviceId {
    election_origin(ctx, DEFAULT_WAVE_BOUND)
}

/// True on the elected leader
pub fn election(ctx: &mut Context<'_>) -> bool {
    election_within(ctx, DEFAULT_WAVE_BOUND)
}

/// [`election`] with an explicit relay bound
pub fn election_within(ctx: &mut Context<'_>, bound: u32) -> bool {
    let uid = ctx.uid();
    election_origin(ctx, bound) == uid
}

fn election_origin(ctx: &mut Context<'_>, bound: u32) -> DeviceId {
    let key = ctx.uid().0;
    ctx.call("election", |ctx| wave(ctx, key, bound).origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{values, Line};

    #[test]
    fn test_token_order() {
        let a = WaveToken::new(1, DeviceId::new(9));
        let b = WaveToken::new(2, DeviceId::new(0));
        assert!(a < b);

        let far = WaveToken { hops: 5, ..a };
        assert!(a < far);
    }

    #[test]
    fn test_relay_respects_bound() {
        let token = WaveToken::new(0, DeviceId::new(0));
        let one = token.relay(2).unwrap();
        assert_eq!(one.hops, 1);
        let two = one.relay(2).unwrap();
        assert_eq!(two.relay(2), None);

        let maxed = WaveToken { hops: u32::MAX, ..token };
        assert_eq!(maxed.relay(u32::MAX), None);
    }

    #[test]
    fn test_token_roundtrip() {
        let token = WaveToken {
            key: u64::MAX,
            origin: DeviceId::new(3),
            hops: 4,
        };
        assert_eq!(WaveToken::from_value(&token.to_value()), Some(token));
    }

    #[test]
    fn test_lowest_id_is_elected() {
        let mut line = Line::new(5);
        let leaders = values(line.run(6, |ctx| (wave_election(ctx), election(ctx))));
        for (i, (origin, leader)) in leaders.iter().enumerate() {
            assert_eq!(*origin, DeviceId::new(0));
            assert_eq!(*leader, i == 0);
        }
    }

    #[test]
    fn test_wave_carries_hop_count() {
        let mut line = Line::new(4);
        let tokens = values(line.run(5, |ctx| {
            let key = 100 - ctx.uid().0;
            wave(ctx, key, 8)
        }));
        // device 3 has the lowest key
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(token.origin, DeviceId::new(3));
            assert_eq!(token.hops, 3 - i as u32);
        }
    }

    #[test]
    fn test_reelection_after_leader_stops() {
        let bound = 6;
        let mut line = Line::new(4);
        let program = move |ctx: &mut Context<'_>| election_within(ctx, bound);

        let flags = values(line.run(5, program));
        assert_eq!(flags, vec![true, false, false, false]);

        line.alive[0] = false;
        let flags = line.run(20, program);
        assert_eq!(flags[0], None);
        assert_eq!(values(flags), vec![true, false, false]);
    }
}
