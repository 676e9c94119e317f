//! ## Signal device module
//!
//! The controller and every floor unit talk to the physical world through a small
//! Raspberry Pi board. This module describes that boundary:
//!
//! - [`Pin`]: the named boolean channels on the board (buttons, sensor, opener relays).
//! - [`SignalDevice`]: read a pin, or pulse a relay pin.
//! - [`RpiDevice`]: the binding used by the service binary.
//! - [`sim::SimDevice`]: an in-memory device for tests and dry runs.
//!
//! Devices are handed to the controller and floor units as `Arc<dyn SignalDevice>`,
//! so every component can be given its own substitute.

pub mod sim;

use std::fmt;

use log::trace;
use thiserror::Error;

/// A named boolean channel on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    /// Relay driving the opener upwards.
    OpenerUp,
    /// Relay driving the opener downwards.
    OpenerDown,
    /// Relay stopping the opener.
    OpenerStop,
    /// Call button asking the platform to go to the given floor.
    FloorRequested(u8),
    /// Stop button on a floor unit.
    StopRequested,
    /// Sensor that is on while the platform is level with this floor.
    AtFloor,
}

impl Pin {
    /// Whether the pin is an output relay, as opposed to a button or sensor.
    pub fn is_relay(&self) -> bool {
        matches!(self, Pin::OpenerUp | Pin::OpenerDown | Pin::OpenerStop)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::OpenerUp => write!(f, "OpenerUp"),
            Pin::OpenerDown => write!(f, "OpenerDown"),
            Pin::OpenerStop => write!(f, "OpenerStop"),
            Pin::FloorRequested(floor) => write!(f, "Floor{}Requested", floor),
            Pin::StopRequested => write!(f, "StopRequested"),
            Pin::AtFloor => write!(f, "AtFloor"),
        }
    }
}

/// Errors reported by a [`SignalDevice`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// Reading or writing the pin failed.
    #[error("I/O on pin {pin} failed: {reason}")]
    Io {
        /// Pin that failed
        pin: Pin,
        /// What the device reported
        reason: String,
    },

    /// The pin cannot be used in the requested direction (e.g. writing to a button).
    #[error("pin {0} does not support this operation")]
    Unsupported(Pin),
}

/// Read and write boolean signals on the board pins.
///
/// Calls are expected to return promptly: both loops call them once or more per tick.
pub trait SignalDevice: Send + Sync {
    /// Pulse the given relay pin.
    fn send(&self, pin: Pin) -> Result<(), SignalError>;

    /// Read the given pin, `true` when the signal is on.
    fn get(&self, pin: Pin) -> Result<bool, SignalError>;
}

/// The board binding used by the service binary.
///
/// The GPIO driver itself lives outside this crate; until it is wired in, every input
/// reads as off and relay pulses are only logged.
#[derive(Debug, Default, Clone)]
pub struct RpiDevice;

impl RpiDevice {
    /// Creates a handle to the board.
    pub fn new() -> Self {
        RpiDevice
    }
}

impl SignalDevice for RpiDevice {
    fn send(&self, pin: Pin) -> Result<(), SignalError> {
        if !pin.is_relay() {
            return Err(SignalError::Unsupported(pin));
        }
        trace!("rpi: pulse {}", pin);
        Ok(())
    }

    fn get(&self, _pin: Pin) -> Result<bool, SignalError> {
        Ok(false)
    }
}
