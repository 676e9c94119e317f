//! # Controller
//!
//! The controller task owns the [`ControllerState`] and is the only place it changes.
//! It reacts to two things:
//!
//! - control requests from the floor units, arriving as messages on an `mpsc` channel
//!   through a [`ControllerHandle`];
//! - ticks, on which it runs the decision function and pulses the opener relay.
//!
//! After every change a fresh [`Status`] is published on a `watch` channel, so readers
//! always see all fields from the same moment.
//!
//! ## Example
//! ```no_run
//! # use std::sync::Arc;
//! # use dumbwaiter::{config::DumbwaiterConfig, controller::Controller, pi::RpiDevice, timing::Shutdown};
//! # async fn doc() {
//! let (trigger, shutdown) = Shutdown::channel();
//! let (handle, task) = Controller::new(&DumbwaiterConfig::default(), Arc::new(RpiDevice::new()))
//!     .spawn(shutdown);
//! // give `handle` to the floor units ...
//! trigger.fire();
//! let _ = task.await;
//! # }
//! ```

pub mod state;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::api::{ApiError, ControlApi};
use crate::config::{self, DumbwaiterConfig};
use crate::pi::SignalDevice;
use crate::timing::{Shutdown, TickSource};

use state::{Action, ControllerState, Status};

type Reply = oneshot::Sender<Result<(), ApiError>>;

/// Requests sent from a [`ControllerHandle`] to the controller task.
enum ControlMsg {
    SetRequestedFloor {
        floor: u8,
        reply: Reply,
    },
    SetFloorStatus {
        floor: u8,
        at_floor: bool,
        reply: Reply,
    },
    SetStopRequested {
        reply: Reply,
    },
}

/// A controller that has been configured but not started.
///
/// Everything the loop depends on is fixed here, before [`Controller::spawn`].
pub struct Controller {
    state: ControllerState,
    device: Arc<dyn SignalDevice>,
    ticks: TickSource,
}

impl Controller {
    /// Builds a controller for the shaft in `config`, driving the opener through `device`.
    ///
    /// The decision loop ticks every `config.controller_interval`.
    pub fn new(config: &DumbwaiterConfig, device: Arc<dyn SignalDevice>) -> Self {
        Controller {
            state: ControllerState::new(config.top_floor(), config.start_floor),
            device,
            ticks: TickSource::Interval(config.controller_interval),
        }
    }

    /// Replaces the wall-clock ticks, typically with [`TickSource::manual`] in tests.
    pub fn with_tick_source(mut self, ticks: TickSource) -> Self {
        self.ticks = ticks;
        self
    }

    /// Starts the controller task.
    ///
    /// ## Returns
    /// - a [`ControllerHandle`] implementing [`ControlApi`], cheap to clone;
    /// - the `JoinHandle` of the task, which ends when `shutdown` fires or a manual tick
    ///   source is dropped.
    pub fn spawn(self, shutdown: Shutdown) -> (ControllerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config::CONTROL_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = watch::channel(self.state.status());

        let task = tokio::spawn(self.run(rx, status_tx, shutdown));
        (ControllerHandle { tx, status_rx }, task)
    }

    async fn run(
        self,
        mut rx: mpsc::Receiver<ControlMsg>,
        status_tx: watch::Sender<Status>,
        mut shutdown: Shutdown,
    ) {
        info!("starting controller main loop");
        let Controller { mut state, device, ticks } = self;
        let mut ticks = ticks.into_ticks();

        loop {
            tokio::select! {
                biased;

                _ = shutdown.fired() => break,

                Some(msg) = rx.recv() => {
                    let (reply, result) = handle_msg(&mut state, msg);
                    publish(&status_tx, state.status());
                    let _ = reply.send(result);
                }

                tick = ticks.next() => match tick {
                    Some(done) => {
                        step(&mut state, device.as_ref());
                        publish(&status_tx, state.status());
                        done.done();
                    }
                    None => break,
                },
            }
        }
        info!("controller main loop stopped");
    }
}

/// Publishes `status` if it differs from the last one, so subscribers only wake on changes.
fn publish(status_tx: &watch::Sender<Status>, status: Status) {
    status_tx.send_if_modified(|current| {
        if *current == status {
            return false;
        }
        *current = status;
        true
    });
}

/// Applies a request to the state. The caller publishes the new status before replying,
/// so a caller that reads the status after its call returns sees its own change.
fn handle_msg(state: &mut ControllerState, msg: ControlMsg) -> (Reply, Result<(), ApiError>) {
    match msg {
        ControlMsg::SetRequestedFloor { floor, reply } => (reply, state.set_requested_floor(floor)),
        ControlMsg::SetFloorStatus { floor, at_floor, reply } => {
            (reply, state.set_floor_status(floor, at_floor))
        }
        ControlMsg::SetStopRequested { reply } => {
            state.set_stop_requested();
            (reply, Ok(()))
        }
    }
}

/// One decision cycle: decide, pulse the relay, record the new direction.
///
/// A failed pulse is logged and the direction is updated anyway. The state remembers
/// the failure, so the next tick sends the pulse again.
fn step(state: &mut ControllerState, device: &dyn SignalDevice) {
    let action = state.decide();
    let Some(pin) = action.pin() else {
        debug!("controller tick: no change ({:?})", state.status());
        return;
    };

    match action {
        Action::MoveUp => info!("controller sending up"),
        Action::MoveDown => info!("controller sending down"),
        _ => info!("controller stopping"),
    }
    let delivered = match device.send(pin) {
        Ok(()) => true,
        Err(e) => {
            error!("failed to signal {}: {}", pin, e);
            false
        }
    };
    state.apply(action);
    state.record_pulse(delivered);
}

/// Client side of the controller task. Implements [`ControlApi`].
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControlMsg>,
    status_rx: watch::Receiver<Status>,
}

impl ControllerHandle {
    /// A receiver that is notified every time the status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.status_rx.clone()
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> ControlMsg,
    ) -> Result<T, ApiError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| ApiError::ControllerUnavailable)?;
        reply_rx.await.map_err(|_| ApiError::ControllerUnavailable)
    }
}

#[async_trait]
impl ControlApi for ControllerHandle {
    async fn set_requested_floor(&self, floor: u8) -> Result<(), ApiError> {
        self.call(|reply| ControlMsg::SetRequestedFloor { floor, reply }).await?
    }

    async fn set_floor_status(&self, floor: u8, at_floor: bool) -> Result<(), ApiError> {
        self.call(|reply| ControlMsg::SetFloorStatus { floor, at_floor, reply }).await?
    }

    async fn set_stop_requested(&self) -> Result<(), ApiError> {
        self.call(|reply| ControlMsg::SetStopRequested { reply }).await?
    }

    async fn get_status(&self) -> Result<Status, ApiError> {
        if self.tx.is_closed() {
            return Err(ApiError::ControllerUnavailable);
        }
        let status = *self.status_rx.borrow();
        Ok(status)
    }
}
