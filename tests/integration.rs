//! Controller and three floor units wired together in one process, on simulated boards.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as cbc;
use dumbwaiter::api::{ControlApi, Direction, Status};
use dumbwaiter::config::DumbwaiterConfig;
use dumbwaiter::controller::{Controller, ControllerHandle};
use dumbwaiter::floor::FloorSensors;
use dumbwaiter::pi::sim::SimDevice;
use dumbwaiter::pi::Pin;
use dumbwaiter::timing::{ManualTicker, Shutdown, ShutdownTrigger, TickSource};
use tokio::task::JoinHandle;

const PULSE_TIMEOUT: Duration = Duration::from_millis(200);

struct Shaft {
    api: ControllerHandle,
    controller_ticker: ManualTicker,
    pulses: cbc::Receiver<Pin>,
    /// Board and ticker of floor `i + 1`.
    floors: Vec<(SimDevice, ManualTicker)>,
    trigger: ShutdownTrigger,
    tasks: Vec<JoinHandle<()>>,
}

impl Shaft {
    fn start(config: DumbwaiterConfig) -> Self {
        let (trigger, shutdown) = Shutdown::channel();

        let controller_dev = SimDevice::new("controller");
        let pulses = controller_dev.subscribe();
        let (controller_ticker, ticks) = TickSource::manual();
        let (api, controller_task) = Controller::new(&config, Arc::new(controller_dev))
            .with_tick_source(ticks)
            .spawn(shutdown.clone());

        let shared: Arc<dyn ControlApi> = Arc::new(api.clone());
        let mut tasks = vec![controller_task];
        let mut floors = Vec::new();
        for floor in 1..=config.num_floors {
            let dev = SimDevice::new(&format!("floor{}", floor));
            let (ticker, ticks) = TickSource::manual();
            let task = FloorSensors::new(floor, &config, Arc::new(dev.clone()), shared.clone())
                .with_tick_source(ticks)
                .spawn(shutdown.clone());
            tasks.push(task);
            floors.push((dev, ticker));
        }

        Shaft { api, controller_ticker, pulses, floors, trigger, tasks }
    }

    fn board(&self, floor: u8) -> &SimDevice {
        &self.floors[floor as usize - 1].0
    }

    /// Moves the platform sensor from one floor to the next.
    fn platform_at(&self, floor: Option<u8>) {
        for (i, (dev, _)) in self.floors.iter().enumerate() {
            dev.set(Pin::AtFloor, floor == Some(i as u8 + 1));
        }
    }

    /// One sensor tick on every floor, then one controller tick.
    async fn cycle(&self) {
        for (_, ticker) in &self.floors {
            assert!(ticker.tick().await);
        }
        assert!(self.controller_ticker.tick().await);
    }

    fn next_pulse(&self) -> Option<Pin> {
        self.pulses.recv_timeout(PULSE_TIMEOUT).ok()
    }

    async fn status(&self) -> Status {
        self.api.get_status().await.unwrap()
    }

    async fn stop(self) {
        self.trigger.fire();
        for task in self.tasks {
            task.await.unwrap();
        }
    }
}

#[tokio::test]
async fn call_from_middle_floor_brings_platform_up() {
    let shaft = Shaft::start(DumbwaiterConfig::default());
    shaft.platform_at(Some(1));
    shaft.cycle().await;
    assert_eq!(shaft.pulses.try_recv().ok(), None);

    shaft.board(2).set(Pin::FloorRequested(3), true);
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerUp));
    shaft.board(2).set(Pin::FloorRequested(3), false);

    shaft.platform_at(None);
    shaft.cycle().await;
    shaft.platform_at(Some(2));
    shaft.cycle().await;
    assert_eq!(
        shaft.status().await,
        Status { direction: Direction::Up, requested_floor: Some(3), last_seen_floor: 2 }
    );

    shaft.platform_at(Some(3));
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerStop));
    assert_eq!(
        shaft.status().await,
        Status { direction: Direction::Stopped, requested_floor: Some(3), last_seen_floor: 3 }
    );

    shaft.cycle().await;
    shaft.cycle().await;
    assert_eq!(shaft.pulses.try_recv().ok(), None);

    shaft.stop().await;
}

#[tokio::test]
async fn stop_button_halts_the_platform() {
    let shaft = Shaft::start(DumbwaiterConfig::default());
    shaft.platform_at(Some(1));
    shaft.board(1).set(Pin::FloorRequested(3), true);
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerUp));

    shaft.platform_at(Some(2));
    shaft.board(3).set(Pin::StopRequested, true);
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerStop));
    assert_eq!(
        shaft.status().await,
        Status { direction: Direction::Stopped, requested_floor: Some(2), last_seen_floor: 2 }
    );

    shaft.cycle().await;
    assert_eq!(shaft.pulses.try_recv().ok(), None);

    shaft.stop().await;
}

#[tokio::test]
async fn reported_departure_lets_the_platform_return() {
    let config = DumbwaiterConfig { report_departures: true, ..Default::default() };
    let shaft = Shaft::start(config);
    shaft.platform_at(Some(1));
    shaft.board(1).set(Pin::FloorRequested(2), true);
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerUp));

    // Platform leaves floor 1, then somebody calls it back.
    shaft.platform_at(None);
    shaft.board(3).set(Pin::FloorRequested(1), true);
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerStop));
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerDown));

    shaft.platform_at(Some(1));
    shaft.cycle().await;
    assert_eq!(shaft.next_pulse(), Some(Pin::OpenerStop));
    assert_eq!(
        shaft.status().await,
        Status { direction: Direction::Stopped, requested_floor: Some(1), last_seen_floor: 1 }
    );

    shaft.stop().await;
}
