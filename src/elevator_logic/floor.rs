//! Floor arithmetic on a continuous cabin position.
//!
//! Positions are `f64` floor units, floors are `i32`. Every "has the cabin reached
//! floor N" question in the crate goes through [`arrived_floor`] / [`is_at_floor`], so
//! telemetry, the queue and the drain worker all agree on the same tolerance band.

use crate::config;

use super::Dirn;

/// Returns the floor the position counts as standing on, if any.
///
/// A position is on a floor when its fractional part is below
/// [`config::FLOOR_TOLERANCE_LOW`] or above [`config::FLOOR_TOLERANCE_HIGH`].
pub fn arrived_floor(position: f64) -> Option<i32> {
    if !position.is_finite() {
        return None;
    }
    let frac = position - position.floor();
    if frac < config::FLOOR_TOLERANCE_LOW || frac > config::FLOOR_TOLERANCE_HIGH {
        Some(position.round() as i32)
    } else {
        None
    }
}

/// `true` if `position` is within tolerance of `floor`.
pub fn is_at_floor(position: f64, floor: i32) -> bool {
    arrived_floor(position) == Some(floor)
}

/// Direction the motor has to run to get from `position` to `floor`.
///
/// Uses [`config::DIRECTION_EPSILON`] so a cabin parked on the floor yields
/// [`Dirn::Stop`] instead of oscillating around it.
pub fn direction_towards(floor: i32, position: f64) -> Dirn {
    let delta = floor as f64 - position;
    if delta > config::DIRECTION_EPSILON {
        Dirn::Up
    } else if delta < -config::DIRECTION_EPSILON {
        Dirn::Down
    } else {
        Dirn::Stop
    }
}

/// Signed distance from `position` to `floor`, positive when the floor lies ahead
/// in `travel`. Zero when not travelling.
pub fn offset_along(floor: i32, position: f64, travel: Dirn) -> f64 {
    (floor as f64 - position) * travel.sign()
}
