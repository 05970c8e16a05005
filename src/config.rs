//! # config.rs – Centralized Parameter Store
//!
//! This module holds all static program parameters used throughout the dispatcher,
//! together with [`DispatchConfig`], the runtime values that may be overridden from a
//! JSON file or from the command line (see [`crate::init`]).

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

//
// ──────────────────────────────────────────────────────────────
//   1. RIG CONNECTION
// ──────────────────────────────────────────────────────────────
//

/// Default address of the motor/door rig (the Green Elevator server listens here)
pub const DEFAULT_RIG_ADDR: &str = "localhost:4711";

/// Delay before the first connect attempt, gives the rig time to come up
pub const RIG_CONNECT_DELAY: Duration = Duration::from_millis(500);

/// Time between reconnect attempts while the rig is unreachable
pub const RIG_RETRY_DELAY: Duration = Duration::from_millis(500);

//
// ──────────────────────────────────────────────────────────────
//   2. BANK & FLOOR PARAMETERS
// ──────────────────────────────────────────────────────────────
//

/// Default number of elevators in the bank
pub const DEFAULT_NUM_ELEVATORS: usize = 1;

/// Default index of the top floor (floors are `0..=top`)
pub const DEFAULT_TOP_FLOOR: i32 = 6;

/// Reserved panel floor meaning "emergency stop this elevator"
pub const SPECIAL_FOR_STOP: i32 = 32000;

/// The bottom terminal, subject to the fairness override in the queue
pub const BOUNDARY_FLOOR: i32 = 0;

/// Positional epsilon used when deciding which way to drive
pub const DIRECTION_EPSILON: f64 = 0.001;

/// Fractional part below which a position counts as standing on a floor
pub const FLOOR_TOLERANCE_LOW: f64 = 0.04;

/// Fractional part above which a position counts as standing on the next floor
pub const FLOOR_TOLERANCE_HIGH: f64 = 0.97;

/// An idle cabin closer than this to a hall call is picked at once
pub const IDLE_PICK_RADIUS: f64 = 0.5;

/// Door state when fully closed
pub const DOOR_CLOSED: u8 = 0;

/// Door state when fully open (six degrees of openness, 0..=5)
pub const DOOR_OPEN: u8 = 5;

//
// ──────────────────────────────────────────────────────────────
//   3. TIMING
// ──────────────────────────────────────────────────────────────
//

/// How long the doors are held open at a served floor
pub const DOOR_OPEN_HOLD: Duration = Duration::from_secs(3);

/// Time the doors need to close
pub const DOOR_CLOSE_TIME: Duration = Duration::from_secs(1);

/// How often the bank status table is printed
pub const STATUS_PRINT_PERIOD: Duration = Duration::from_millis(2000);

/// Tick of the simulated rig
pub const SIM_TICK: Duration = Duration::from_millis(50);

/// Floors travelled per simulator tick
pub const SIM_SPEED: f64 = 0.02;

//
// ──────────────────────────────────────────────────────────────
//   4. LOGGING CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Enable/disable printing of the bank status table
pub static PRINT_STATUS_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of errors
pub static PRINT_ERR_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of warnings
pub static PRINT_WARN_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of success messages
pub static PRINT_OK_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

/// Enable/disable printing of general info
pub static PRINT_INFO_ON: Lazy<Mutex<bool>> = Lazy::new(|| Mutex::new(true));

//
// ──────────────────────────────────────────────────────────────
//   5. RUNTIME CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Runtime configuration of one dispatcher instance.
///
/// Every field has a default, so a JSON file only needs to name what it changes:
/// ```json
/// { "num_elevators": 3, "top_floor": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of elevators in the bank, numbered `1..=num_elevators` on the wire
    pub num_elevators: usize,
    /// Index of the top floor
    pub top_floor: i32,
    /// Panel floor value reserved for emergency stop
    pub stop_floor: i32,
    /// `host:port` of the motor/door rig
    pub rig_addr: String,
    /// Door hold time at a served floor, in milliseconds
    pub door_open_hold_ms: u64,
    /// Door closing time, in milliseconds
    pub door_close_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            num_elevators: DEFAULT_NUM_ELEVATORS,
            top_floor: DEFAULT_TOP_FLOOR,
            stop_floor: SPECIAL_FOR_STOP,
            rig_addr: DEFAULT_RIG_ADDR.to_string(),
            door_open_hold_ms: DOOR_OPEN_HOLD.as_millis() as u64,
            door_close_ms: DOOR_CLOSE_TIME.as_millis() as u64,
        }
    }
}

impl DispatchConfig {
    /// Parses a configuration from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: DispatchConfig = serde_json::from_str(json).context("invalid dispatcher configuration")?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// Checks the values no dispatcher can run without.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.num_elevators == 0 {
            return Err(DispatchError::NoElevators);
        }
        if self.top_floor < 1 {
            return Err(DispatchError::InvalidTopFloor(self.top_floor));
        }
        if (0..=self.top_floor).contains(&self.stop_floor) {
            return Err(DispatchError::StopSentinelInRange(self.stop_floor));
        }
        Ok(())
    }

    /// Door hold time as a [`Duration`]
    pub fn door_open_hold(&self) -> Duration {
        Duration::from_millis(self.door_open_hold_ms)
    }

    /// Door closing time as a [`Duration`]
    pub fn door_close(&self) -> Duration {
        Duration::from_millis(self.door_close_ms)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = DispatchConfig::from_json(r#"{ "num_elevators": 3 }"#).unwrap();
        assert_eq!(config.num_elevators, 3);
        assert_eq!(config.top_floor, DEFAULT_TOP_FLOOR);
        assert_eq!(config.stop_floor, SPECIAL_FOR_STOP);
        assert_eq!(config.door_open_hold(), DOOR_OPEN_HOLD);
    }

    #[test]
    fn garbage_json_is_rejected() {
        assert!(DispatchConfig::from_json("{ num_elevators: ").is_err());
    }

    #[test]
    fn validate_rejects_unusable_banks() {
        let mut config = DispatchConfig::default();
        assert!(config.validate().is_ok());

        config.num_elevators = 0;
        assert_eq!(config.validate(), Err(DispatchError::NoElevators));

        config.num_elevators = 2;
        config.top_floor = 0;
        assert_eq!(config.validate(), Err(DispatchError::InvalidTopFloor(0)));

        config.top_floor = 5;
        config.stop_floor = 3;
        assert_eq!(config.validate(), Err(DispatchError::StopSentinelInRange(3)));
    }
}
