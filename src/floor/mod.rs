//! # Floor sensor units
//!
//! One [`FloorSensors`] runs per floor. Every tick it reads its board and forwards
//! changes to the controller through the [`ControlApi`]:
//!
//! 1. the `AtFloor` sensor going on reports an arrival at this floor;
//! 2. a pressed call button `FloorRequested(f)` requests floor `f`, unless `f` is the
//!    last floor this unit asked for;
//! 3. a pressed `StopRequested` button asks the platform to stop, once per press.
//!
//! The latches that suppress repeats live in [`SensorState`], which belongs to the unit
//! alone. A latch is only set after the controller has accepted the call, so a call
//! that fails is tried again on the next tick.

use std::sync::Arc;

use log::{debug, error, info};
use tokio::task::JoinHandle;

use crate::api::ControlApi;
use crate::config::{self, DumbwaiterConfig};
use crate::pi::{Pin, SignalDevice};
use crate::timing::{Shutdown, TickSource};

/// Edge-detection latches of one floor unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorState {
    /// Last floor this unit successfully requested. Never cleared, so holding or
    /// pressing the same call button again sends nothing.
    pub prior_selected_floor: Option<u8>,
    /// Whether the arrival at this floor has been reported. Cleared when the sensor goes off.
    pub prior_at_floor: bool,
    /// Whether the current stop press has been reported. Cleared when the button is released.
    pub stop_selected: bool,
}

/// The sensor loop of one floor.
pub struct FloorSensors {
    unit: FloorUnit,
    ticks: TickSource,
}

/// Everything one polling cycle needs: board, controller and latches.
struct FloorUnit {
    floor: u8,
    num_floors: u8,
    report_departures: bool,
    device: Arc<dyn SignalDevice>,
    api: Arc<dyn ControlApi>,
    state: SensorState,
}

impl FloorSensors {
    /// Creates the unit for `floor`, reading `device` and reporting to `api`.
    ///
    /// ## Parameters
    /// - `floor`: the floor this unit is mounted at (1-based)
    /// - `config`: shaft size, sensor interval and whether departures are reported
    /// - `device`: the board on this floor
    /// - `api`: the controller
    pub fn new(
        floor: u8,
        config: &DumbwaiterConfig,
        device: Arc<dyn SignalDevice>,
        api: Arc<dyn ControlApi>,
    ) -> Self {
        FloorSensors {
            unit: FloorUnit {
                floor,
                num_floors: config.num_floors,
                report_departures: config.report_departures,
                device,
                api,
                state: SensorState::default(),
            },
            ticks: TickSource::Interval(config.sensor_interval),
        }
    }

    /// Replaces the wall-clock ticks, typically with [`TickSource::manual`] in tests.
    pub fn with_tick_source(mut self, ticks: TickSource) -> Self {
        self.ticks = ticks;
        self
    }

    /// Current latches.
    pub fn state(&self) -> SensorState {
        self.unit.state
    }

    /// Runs the three checks once.
    ///
    /// A pin that cannot be read is logged and only its own check is skipped.
    pub async fn poll_once(&mut self) {
        self.unit.poll_once().await;
    }

    /// Starts the loop on its own task. It ends when `shutdown` fires or a manual tick
    /// source is dropped.
    pub fn spawn(self, shutdown: Shutdown) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: Shutdown) {
        let FloorSensors { mut unit, ticks } = self;
        let mut ticks = ticks.into_ticks();
        info!("starting floor{} sensor loop", unit.floor);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.fired() => break,

                tick = ticks.next() => match tick {
                    Some(done) => {
                        unit.poll_once().await;
                        done.done();
                    }
                    None => break,
                },
            }
        }
        info!("floor{} sensor loop stopped", unit.floor);
    }
}

impl FloorUnit {
    async fn poll_once(&mut self) {
        self.check_at_floor().await;
        self.check_floor_requests().await;
        self.check_stop().await;
    }

    fn read(&self, pin: Pin) -> Option<bool> {
        match self.device.get(pin) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("floor{}: error reading {}: {}", self.floor, pin, e);
                None
            }
        }
    }

    async fn check_at_floor(&mut self) {
        let Some(at_floor) = self.read(Pin::AtFloor) else {
            return;
        };

        match (self.state.prior_at_floor, at_floor) {
            (false, true) => {
                info!("floor{}: platform arrived, notifying controller", self.floor);
                match self.api.set_floor_status(self.floor, true).await {
                    Ok(()) => self.state.prior_at_floor = true,
                    Err(e) => error!("floor{}: arrival not accepted: {}", self.floor, e),
                }
            }
            (true, false) => {
                if self.report_departures {
                    info!("floor{}: platform left, notifying controller", self.floor);
                    if let Err(e) = self.api.set_floor_status(self.floor, false).await {
                        error!("floor{}: departure not accepted: {}", self.floor, e);
                        return;
                    }
                } else {
                    debug!("floor{}: platform left", self.floor);
                }
                self.state.prior_at_floor = false;
            }
            _ => {}
        }
    }

    async fn check_floor_requests(&mut self) {
        for floor in config::BOTTOM_FLOOR..=self.num_floors {
            let Some(pressed) = self.read(Pin::FloorRequested(floor)) else {
                continue;
            };
            if !pressed || self.state.prior_selected_floor == Some(floor) {
                continue;
            }

            info!("floor{}: sending call to floor {} to controller", self.floor, floor);
            match self.api.set_requested_floor(floor).await {
                Ok(()) => self.state.prior_selected_floor = Some(floor),
                Err(e) => error!("floor{}: call to floor {} not accepted: {}", self.floor, floor, e),
            }
        }
    }

    async fn check_stop(&mut self) {
        let Some(pressed) = self.read(Pin::StopRequested) else {
            return;
        };

        if !pressed {
            self.state.stop_selected = false;
            return;
        }
        if self.state.stop_selected {
            return;
        }

        info!("floor{}: sending stop request to controller", self.floor);
        match self.api.set_stop_requested().await {
            Ok(()) => self.state.stop_selected = true,
            Err(e) => error!("floor{}: stop request not accepted: {}", self.floor, e),
        }
    }
}
