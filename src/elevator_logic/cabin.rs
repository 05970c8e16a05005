//! # Cabin state
//!
//! Mutable state of one elevator cabin: position, motor direction, door state and
//! door direction, the level indicator (scale) and the emergency-stop latch.
//!
//! The fields are plain atomics. They are written from the telemetry path and from
//! the drain worker when it commands the motor, and read everywhere else. Readers
//! always re-sample and compare with a tolerance, so no lock is needed.
//!
//! Every setter range-checks its argument. Out-of-range values are clamped to the
//! nearest valid value (or rejected, for the scale) and reported with [`print::warn`].

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI8, AtomicU64, AtomicU8, Ordering};

use crate::config;
use crate::print;

use super::Dirn;

/// Live state of one cabin.
#[derive(Debug)]
pub struct CabinState {
    top_floor: i32,
    /// `f64` bits
    position: AtomicU64,
    direction: AtomicI8,
    door_state: AtomicU8,
    door_direction: AtomicI8,
    scale: AtomicI32,
    stopped: AtomicBool,
}

impl CabinState {
    /// Creates a cabin resting at the bottom floor with closed doors.
    pub fn new(top_floor: i32) -> Self {
        Self {
            top_floor,
            position: AtomicU64::new(0f64.to_bits()),
            direction: AtomicI8::new(0),
            door_state: AtomicU8::new(config::DOOR_CLOSED),
            door_direction: AtomicI8::new(0),
            scale: AtomicI32::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Current position in floor units
    pub fn position(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::SeqCst))
    }

    /// Sets the position, clamped to `0..=top_floor`. Returns the value actually stored.
    ///
    /// A non-finite position is ignored and the previous value kept.
    pub fn set_position(&self, position: f64) -> f64 {
        if !position.is_finite() {
            print::warn(format!("Cabin position not a number ({}), keeping previous", position));
            return self.position();
        }
        let top = self.top_floor as f64;
        let stored = if position < 0.0 {
            print::warn(format!("Position out of range = {}, clamped to 0", position));
            0.0
        } else if position > top {
            print::warn(format!("Position out of range = {}, clamped to {}", position, top));
            top
        } else {
            position
        };
        self.position.store(stored.to_bits(), Ordering::SeqCst);
        stored
    }

    /// Floor nearest to the current position
    pub fn current_floor(&self) -> i32 {
        self.position().round() as i32
    }

    /// Current motor direction
    pub fn direction(&self) -> Dirn {
        Dirn::from_i32(self.direction.load(Ordering::SeqCst) as i32).unwrap_or(Dirn::Stop)
    }

    /// Sets the motor direction. Anything outside {-1, 0, 1} becomes [`Dirn::Stop`].
    pub fn set_direction(&self, direction: i32) -> Dirn {
        let dirn = match Dirn::from_i32(direction) {
            Some(d) => d,
            None => {
                print::warn(format!("Direction out of range = {}, motor set to stop", direction));
                Dirn::Stop
            }
        };
        self.direction.store(dirn as i8, Ordering::SeqCst);
        dirn
    }

    /// Door openness, `0` fully closed to `5` fully open
    pub fn door_state(&self) -> u8 {
        self.door_state.load(Ordering::SeqCst)
    }

    /// Sets the door state, clamped to `0..=5`.
    pub fn set_door_state(&self, state: i32) -> u8 {
        let clamped = if state < config::DOOR_CLOSED as i32 {
            print::warn(format!("Door state out of range = {}, set to closed", state));
            config::DOOR_CLOSED
        } else if state > config::DOOR_OPEN as i32 {
            print::warn(format!("Door state out of range = {}, set to open", state));
            config::DOOR_OPEN
        } else {
            state as u8
        };
        self.door_state.store(clamped, Ordering::SeqCst);
        clamped
    }

    /// Direction the door is moving: opening (`Up`), closing (`Down`) or still
    pub fn door_direction(&self) -> Dirn {
        Dirn::from_i32(self.door_direction.load(Ordering::SeqCst) as i32).unwrap_or(Dirn::Stop)
    }

    /// Sets the door direction. Anything outside {-1, 0, 1} becomes still.
    pub fn set_door_direction(&self, direction: i32) -> Dirn {
        let dirn = match Dirn::from_i32(direction) {
            Some(d) => d,
            None => {
                print::warn(format!("Door direction out of range = {}, door held still", direction));
                Dirn::Stop
            }
        };
        self.door_direction.store(dirn as i8, Ordering::SeqCst);
        dirn
    }

    /// Floor shown on the level indicator
    pub fn scale(&self) -> i32 {
        self.scale.load(Ordering::SeqCst)
    }

    /// Sets the level indicator. Out-of-range values are rejected and the old value kept.
    pub fn set_scale(&self, floor: i32) -> bool {
        if floor < 0 || floor > self.top_floor {
            print::warn(format!("Scale value out of range = {}", floor));
            return false;
        }
        self.scale.store(floor, Ordering::SeqCst);
        true
    }

    /// `true` while the emergency-stop latch is set
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sets or clears the emergency-stop latch, returns the previous value.
    pub fn set_stopped(&self, stopped: bool) -> bool {
        self.stopped.swap(stopped, Ordering::SeqCst)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_is_clamped_into_the_shaft() {
        let cabin = CabinState::new(5);
        assert_eq!(cabin.set_position(2.5), 2.5);
        assert_eq!(cabin.set_position(-0.3), 0.0);
        assert_eq!(cabin.position(), 0.0);
        assert_eq!(cabin.set_position(7.0), 5.0);
        assert_eq!(cabin.position(), 5.0);
        assert_eq!(cabin.set_position(f64::NAN), 5.0);
    }

    #[test]
    fn current_floor_rounds() {
        let cabin = CabinState::new(5);
        cabin.set_position(2.49);
        assert_eq!(cabin.current_floor(), 2);
        cabin.set_position(2.51);
        assert_eq!(cabin.current_floor(), 3);
    }

    #[test]
    fn invalid_directions_fall_back_to_stop() {
        let cabin = CabinState::new(5);
        assert_eq!(cabin.set_direction(1), Dirn::Up);
        assert_eq!(cabin.set_direction(4), Dirn::Stop);
        assert_eq!(cabin.direction(), Dirn::Stop);
        assert_eq!(cabin.set_door_direction(-1), Dirn::Down);
        assert_eq!(cabin.set_door_direction(-2), Dirn::Stop);
    }

    #[test]
    fn door_state_clamps_to_endpoints() {
        let cabin = CabinState::new(5);
        assert_eq!(cabin.set_door_state(3), 3);
        assert_eq!(cabin.set_door_state(9), config::DOOR_OPEN);
        assert_eq!(cabin.set_door_state(-1), config::DOOR_CLOSED);
    }

    #[test]
    fn scale_rejects_out_of_range() {
        let cabin = CabinState::new(5);
        assert!(cabin.set_scale(4));
        assert!(!cabin.set_scale(6));
        assert_eq!(cabin.scale(), 4);
    }

    #[test]
    fn stop_latch_swaps() {
        let cabin = CabinState::new(5);
        assert!(!cabin.set_stopped(true));
        assert!(cabin.is_stopped());
        assert!(cabin.set_stopped(false));
        assert!(!cabin.is_stopped());
    }
}
