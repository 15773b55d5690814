//! Distance gradients from a set of source devices

use fieldwave_runtime::Context;
use fieldwave_state::min_hood;

/// Hop count
pub type Hops = u32;

/// Unreachable hop count
pub const HOPS_MAX: Hops = Hops::MAX;

/// Hop distance to the nearest source, [`HOPS_MAX`] when none is reachable
pub fn dist(ctx: &mut Context<'_>, source: bool) -> Hops {
    ctx.call("dist", |ctx| {
        ctx.nbr(HOPS_MAX, |field| {
            if source {
                0
            } else {
                min_hood(&field, HOPS_MAX).saturating_add(1)
            }
        })
    })
}

/// Distance to the nearest source along measured links, infinite when none
/// is reachable
pub fn rdist(ctx: &mut Context<'_>, source: bool) -> f64 {
    let links = ctx.nbr_dist();
    ctx.call("rdist", |ctx| {
        ctx.nbr(f64::INFINITY, |field| {
            if source {
                0.0
            } else {
                min_hood(&field.zip_with(&links, |d, link| d + link), f64::INFINITY)
            }
        })
    })
}
