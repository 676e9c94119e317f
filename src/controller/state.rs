//! # Controller state and decision table
//!
//! [`ControllerState`] is the authoritative picture of the platform: the last floor it
//! was seen at, where it is relative to that floor, which way it is driven and which
//! floor it has been asked to go to. It is owned by the controller task alone.
//!
//! [`ControllerState::decide`] is the pure decision function run once per tick. It
//! never reverses the drive directly: a reversal is always a `Stop` on one tick and the
//! new direction on the next.
//!
//! A relay pulse that the device failed to deliver is sent again on every following tick
//! until one gets through or the decision changes.

use std::cmp::Ordering;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::ApiError;
use crate::config;
use crate::pi::Pin;

#[allow(missing_docs)]
/// The direction the platform is currently driven in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stopped,
}

#[allow(missing_docs)]
/// Where the platform is relative to the last seen floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformPosition {
    Above,
    Below,
    At,
}

/// What the platform has been asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// No active request; hold position.
    None,
    /// Go to this floor.
    Floor(u8),
    /// A stop was requested while the last seen floor was this one. Hold position
    /// until a new floor is requested.
    Hold(u8),
}

#[allow(missing_docs)]
/// Outcome of one tick of the decision function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveUp,
    MoveDown,
    Stop,
    NoOp,
}

impl Action {
    /// The relay pin pulsed for this action, if any.
    pub fn pin(&self) -> Option<Pin> {
        match self {
            Action::MoveUp => Some(Pin::OpenerUp),
            Action::MoveDown => Some(Pin::OpenerDown),
            Action::Stop => Some(Pin::OpenerStop),
            Action::NoOp => None,
        }
    }

    /// The direction the platform is driven in after this action, if it changes.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Action::MoveUp => Some(Direction::Up),
            Action::MoveDown => Some(Direction::Down),
            Action::Stop => Some(Direction::Stopped),
            Action::NoOp => None,
        }
    }

    /// The action that puts the platform in `direction`.
    fn towards(direction: Direction) -> Action {
        match direction {
            Direction::Up => Action::MoveUp,
            Direction::Down => Action::MoveDown,
            Direction::Stopped => Action::Stop,
        }
    }
}

/// Snapshot of the controller reported through the control API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Direction the platform is driven in.
    pub direction: Direction,
    /// Floor the platform is heading for, `None` when there is no request.
    pub requested_floor: Option<u8>,
    /// Most recent floor the platform was confirmed at.
    pub last_seen_floor: u8,
}

/// The state owned by the controller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    top_floor: u8,
    last_seen_floor: u8,
    request: Request,
    direction: Direction,
    platform_position: PlatformPosition,
    /// Whether the relay got the pulse for the current direction.
    relay_confirmed: bool,
}

impl ControllerState {
    /// A stopped platform, level with `start_floor`, with no request.
    pub fn new(top_floor: u8, start_floor: u8) -> Self {
        ControllerState {
            top_floor,
            last_seen_floor: start_floor,
            request: Request::None,
            direction: Direction::Stopped,
            platform_position: PlatformPosition::At,
            relay_confirmed: true,
        }
    }

    /// Highest floor served.
    pub fn top_floor(&self) -> u8 {
        self.top_floor
    }

    /// Most recent floor the platform was confirmed at.
    pub fn last_seen_floor(&self) -> u8 {
        self.last_seen_floor
    }

    /// The active request.
    pub fn request(&self) -> Request {
        self.request
    }

    /// Direction the platform is driven in.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Position relative to the last seen floor.
    pub fn platform_position(&self) -> PlatformPosition {
        self.platform_position
    }

    /// The floor reported as requested, `None` when there is no request.
    pub fn requested_floor(&self) -> Option<u8> {
        match self.request {
            Request::None => None,
            Request::Floor(floor) | Request::Hold(floor) => Some(floor),
        }
    }

    /// Consistent snapshot for the control API.
    pub fn status(&self) -> Status {
        Status {
            direction: self.direction,
            requested_floor: self.requested_floor(),
            last_seen_floor: self.last_seen_floor,
        }
    }

    fn check_floor(&self, floor: u8) -> Result<(), ApiError> {
        if (config::BOTTOM_FLOOR..=self.top_floor).contains(&floor) {
            Ok(())
        } else {
            Err(ApiError::FloorOutOfRange { floor, top_floor: self.top_floor })
        }
    }

    /// Asks the platform to go to `floor`. Lifts any hold left by a stop request.
    pub fn set_requested_floor(&mut self, floor: u8) -> Result<(), ApiError> {
        self.check_floor(floor)?;
        info!("controller setting requested floor to {}", floor);
        self.request = Request::Floor(floor);
        Ok(())
    }

    /// Records the platform arriving at (`at_floor == true`) or leaving `floor`.
    ///
    /// Leaving a floor puts the platform on the side of it given by the current
    /// direction: above when driven up, below when driven down. A departure reported
    /// while stopped says nothing about the side, so the position is kept.
    pub fn set_floor_status(&mut self, floor: u8, at_floor: bool) -> Result<(), ApiError> {
        self.check_floor(floor)?;
        if at_floor {
            info!("controller setting last seen floor to {}", floor);
            self.last_seen_floor = floor;
            self.platform_position = PlatformPosition::At;
            return Ok(());
        }

        self.last_seen_floor = floor;
        match self.direction {
            Direction::Up => self.platform_position = PlatformPosition::Above,
            Direction::Down => self.platform_position = PlatformPosition::Below,
            Direction::Stopped => {
                warn!(
                    "platform reported leaving floor {} while stopped, keeping position {:?}",
                    floor, self.platform_position
                );
                return Ok(());
            }
        }
        info!("platform left floor {}, now {:?} it", floor, self.platform_position);
        Ok(())
    }

    /// Stops the platform on the next tick and holds it there.
    pub fn set_stop_requested(&mut self) {
        info!("controller received a stop request");
        self.request = Request::Hold(self.last_seen_floor);
    }

    /// Whether the last relay pulse was delivered.
    pub fn relay_confirmed(&self) -> bool {
        self.relay_confirmed
    }

    /// Picks the action for this tick from the current state.
    ///
    /// A `Stop` while already stopped is reported as `NoOp`, so a settled platform
    /// causes no relay traffic. When the last pulse was not delivered, that `NoOp` becomes
    /// the pulse for the current direction again.
    pub fn decide(&self) -> Action {
        match self.decide_from_request() {
            Action::NoOp if !self.relay_confirmed => Action::towards(self.direction),
            action => action,
        }
    }

    fn decide_from_request(&self) -> Action {
        let target = match self.request {
            Request::None | Request::Hold(_) => return self.stop(),
            Request::Floor(floor) => floor,
        };

        match target.cmp(&self.last_seen_floor) {
            Ordering::Greater => self.drive(Direction::Up),
            Ordering::Less => self.drive(Direction::Down),
            Ordering::Equal => match self.platform_position {
                PlatformPosition::Below => self.drive(Direction::Up),
                PlatformPosition::Above => self.drive(Direction::Down),
                PlatformPosition::At => self.stop(),
            },
        }
    }

    fn stop(&self) -> Action {
        if self.direction == Direction::Stopped {
            Action::NoOp
        } else {
            Action::Stop
        }
    }

    /// Drive towards `wanted`, stopping first if currently driven the other way.
    fn drive(&self, wanted: Direction) -> Action {
        match (self.direction, wanted) {
            (Direction::Stopped, Direction::Up) => Action::MoveUp,
            (Direction::Stopped, Direction::Down) => Action::MoveDown,
            (current, wanted) if current == wanted => Action::NoOp,
            _ => Action::Stop,
        }
    }

    /// Records the direction an action has put the platform in.
    pub fn apply(&mut self, action: Action) {
        if let Some(direction) = action.direction() {
            self.direction = direction;
        }
    }

    /// Records whether the pulse for the last applied action reached the relay.
    pub fn record_pulse(&mut self, delivered: bool) {
        if !delivered {
            warn!("relay pulse for {:?} not delivered, resending next tick", self.direction);
        }
        self.relay_confirmed = delivered;
    }

    #[cfg(test)]
    pub(crate) fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_position(mut self, position: PlatformPosition) -> Self {
        self.platform_position = position;
        self
    }
}
