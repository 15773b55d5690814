//! Local accumulators and simple neighborhood counters

use fieldwave_runtime::Context;
use fieldwave_state::{max_hood_with_self, min_hood};

/// Exponential smoothing: the previous output averaged with the new sample
pub fn lowpass(ctx: &mut Context<'_>, value: f64) -> f64 {
    ctx.call("lowpass", |ctx| ctx.rep(value, |previous| (previous + value) / 2.0))
}

/// Time integral of `value`, using the gap since the previous round
pub fn integrate(ctx: &mut Context<'_>, value: f64) -> f64 {
    let dt = ctx.delta_time();
    ctx.call("integrate", |ctx| ctx.rep(0.0, |sum| sum + value * dt))
}

/// Running sum of every sample
pub fn accumulate(ctx: &mut Context<'_>, value: f64) -> f64 {
    ctx.call("accumulate", |ctx| ctx.rep(0.0, |sum| sum + value))
}

/// True when this device's integral of `value` is strictly below every
/// neighbor's; a tie clears the flag on both sides
pub fn minintegral(ctx: &mut Context<'_>, value: f64) -> bool {
    ctx.call("minintegral", |ctx| {
        let own = integrate(ctx, value);
        let field = ctx.share(own);
        own < min_hood(&field, f64::INFINITY)
    })
}

/// Counter that every device pushes one past the largest it has seen
pub fn sharedcount(ctx: &mut Context<'_>) -> u64 {
    ctx.call("sharedcount", |ctx| {
        ctx.nbr(0u64, |field| max_hood_with_self(&field).saturating_add(1))
    })
}
