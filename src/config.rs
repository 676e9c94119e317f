//! # config.rs – Centralized Parameter Store
//!
//! This module holds the default parameters of the dumbwaiter, and the runtime
//! [`DumbwaiterConfig`] built from them (and from the command line in `main.rs`).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ──────────────────────────────────────────────────────────────
//   1. SHAFT PARAMETERS
// ──────────────────────────────────────────────────────────────
//

/// Default number of floors the dumbwaiter serves
pub const DEFAULT_NUM_FLOORS: u8 = 3;

/// Floor the platform is assumed parked at when the controller starts
pub const DEFAULT_START_FLOOR: u8 = 1;

/// Lowest floor number. Floors are numbered from 1 and up.
pub const BOTTOM_FLOOR: u8 = 1;

//
// ──────────────────────────────────────────────────────────────
//   2. TIMING & INTERVALS
// ──────────────────────────────────────────────────────────────
//

/// Period of the controller decision loop
pub const DEFAULT_CONTROLLER_INTERVAL: Duration = Duration::from_millis(500);

/// Period of each floor sensor polling loop
pub const DEFAULT_SENSOR_INTERVAL: Duration = Duration::from_millis(500);

/// How often the service binary prints the status, if asked to
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(2000);

//
// ──────────────────────────────────────────────────────────────
//   3. CHANNELS
// ──────────────────────────────────────────────────────────────
//

/// Capacity of the mpsc channel carrying control requests to the controller task
pub const CONTROL_CHANNEL_CAPACITY: usize = 100;

/// Capacity of the channel carrying manual ticks in tests
pub const TICK_CHANNEL_CAPACITY: usize = 1;

//
// ──────────────────────────────────────────────────────────────
//   4. RUNTIME CONFIGURATION
// ──────────────────────────────────────────────────────────────
//

/// Errors found when validating a [`DumbwaiterConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The shaft must serve at least two floors.
    #[error("number of floors must be at least 2, got {0}")]
    TooFewFloors(u8),

    /// The start floor is not a floor of the shaft.
    #[error("start floor {start_floor} is outside 1..={num_floors}")]
    StartFloorOutOfRange {
        /// Configured start floor
        start_floor: u8,
        /// Configured number of floors
        num_floors: u8,
    },

    /// A loop interval of zero would spin the task.
    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Runtime configuration shared by the controller and the floor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumbwaiterConfig {
    /// Number of floors served. Also the top floor, since floors start at 1.
    /// Default: [DEFAULT_NUM_FLOORS]
    pub num_floors: u8,

    /// Floor the controller assumes the platform is at on startup.
    /// Default: [DEFAULT_START_FLOOR]
    pub start_floor: u8,

    /// Period of the controller decision loop.
    /// Default: [DEFAULT_CONTROLLER_INTERVAL]
    pub controller_interval: Duration,

    /// Period of the floor sensor loops.
    /// Default: [DEFAULT_SENSOR_INTERVAL]
    pub sensor_interval: Duration,

    /// Whether floor units report the platform leaving their floor.
    /// Default: false
    pub report_departures: bool,
}

impl Default for DumbwaiterConfig {
    fn default() -> Self {
        Self {
            num_floors: DEFAULT_NUM_FLOORS,
            start_floor: DEFAULT_START_FLOOR,
            controller_interval: DEFAULT_CONTROLLER_INTERVAL,
            sensor_interval: DEFAULT_SENSOR_INTERVAL,
            report_departures: false,
        }
    }
}

impl DumbwaiterConfig {
    /// The highest floor the platform can be sent to.
    pub fn top_floor(&self) -> u8 {
        self.num_floors
    }

    /// Checks that the configuration describes a usable shaft.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_floors < 2 {
            return Err(ConfigError::TooFewFloors(self.num_floors));
        }
        if !(BOTTOM_FLOOR..=self.num_floors).contains(&self.start_floor) {
            return Err(ConfigError::StartFloorOutOfRange {
                start_floor: self.start_floor,
                num_floors: self.num_floors,
            });
        }
        if self.controller_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("controller"));
        }
        if self.sensor_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("sensor"));
        }
        Ok(())
    }
}
