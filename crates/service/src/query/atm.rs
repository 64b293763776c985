//! At-the-money strike selection.
//!
//! Distances are compared in strike ticks so that exact ties (index 420.5
//! between strikes 420 and 421) are detected without float noise.

use optchain_core::{strike_from_ticks, strike_ticks};

/// The listed strike closest to `price`. Ties go to the lower strike.
pub fn atm_strike<I>(strikes: I, price: f64) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let target = strike_ticks(price);
    strikes.into_iter().min_by_key(|&strike| {
        let ticks = strike_ticks(strike);
        (ticks.abs_diff(target), ticks)
    })
}

/// `price` rounded to the nearest multiple of `increment`, ties down.
/// Used to centre the chain when no strikes are listed.
pub fn round_to_increment(price: f64, increment: f64) -> f64 {
    let step = strike_ticks(increment).max(1);
    let ticks = strike_ticks(price);
    let below = ticks.div_euclid(step);
    let remainder = ticks.rem_euclid(step);
    let multiple =
        if remainder.saturating_mul(2) > step { below.saturating_add(1) } else { below };
    strike_from_ticks(multiple.saturating_mul(step))
}
