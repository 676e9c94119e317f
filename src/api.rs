//! # Control API
//!
//! The calls a floor unit can make on the controller. The floor units only ever see
//! `Arc<dyn ControlApi>`; in the service binary that is a
//! [`ControllerHandle`](crate::controller::ControllerHandle) talking to the controller
//! task in the same process, but any transport that implements the trait will do.
//!
//! Every call returns a `Result`. Floors outside the shaft are refused before they
//! reach the controller state.

use async_trait::async_trait;
use thiserror::Error;

pub use crate::controller::state::{Direction, Status};

/// Errors returned by [`ControlApi`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The floor number is not a floor of this shaft.
    #[error("floor {floor} is outside 1..={top_floor}")]
    FloorOutOfRange {
        /// Floor given by the caller
        floor: u8,
        /// Highest floor of the shaft
        top_floor: u8,
    },

    /// The controller task is not running (shut down or crashed).
    #[error("controller is not running")]
    ControllerUnavailable,
}

/// Calls a floor unit can make on the controller.
#[async_trait]
pub trait ControlApi: Send + Sync {
    /// Asks the platform to go to `floor`.
    async fn set_requested_floor(&self, floor: u8) -> Result<(), ApiError>;

    /// Reports the platform arriving at (`at_floor == true`) or leaving `floor`.
    async fn set_floor_status(&self, floor: u8, at_floor: bool) -> Result<(), ApiError>;

    /// Asks the platform to stop and hold where it is.
    async fn set_stop_requested(&self) -> Result<(), ApiError>;

    /// Current direction, requested floor and last seen floor.
    async fn get_status(&self) -> Result<Status, ApiError>;
}
