use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dumbwaiter::api::{ApiError, ControlApi, Direction, Status};
use dumbwaiter::config::DumbwaiterConfig;
use dumbwaiter::floor::FloorSensors;
use dumbwaiter::pi::sim::SimDevice;
use dumbwaiter::pi::Pin;
use dumbwaiter::timing::{Shutdown, TickSource};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    RequestedFloor(u8),
    FloorStatus(u8, bool),
    StopRequested,
}

/// Records every call in order and accepts them all.
#[derive(Default)]
struct RecordingApi {
    calls: Mutex<Vec<Call>>,
}

impl RecordingApi {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ControlApi for RecordingApi {
    async fn set_requested_floor(&self, floor: u8) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call::RequestedFloor(floor));
        Ok(())
    }

    async fn set_floor_status(&self, floor: u8, at_floor: bool) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call::FloorStatus(floor, at_floor));
        Ok(())
    }

    async fn set_stop_requested(&self) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(Call::StopRequested);
        Ok(())
    }

    async fn get_status(&self) -> Result<Status, ApiError> {
        Ok(Status { direction: Direction::Stopped, requested_floor: None, last_seen_floor: 1 })
    }
}

#[tokio::test]
async fn sensor_loop_reports_transitions_per_tick() {
    let device = SimDevice::new("floor3");
    let api = Arc::new(RecordingApi::default());
    let (ticker, ticks) = TickSource::manual();
    let (trigger, shutdown) = Shutdown::channel();
    let task = FloorSensors::new(3, &DumbwaiterConfig::default(), Arc::new(device.clone()), api.clone())
        .with_tick_source(ticks)
        .spawn(shutdown);

    ticker.tick().await;
    assert!(api.calls().is_empty());

    device.set(Pin::AtFloor, true);
    ticker.tick_n(3).await;
    assert_eq!(api.calls(), vec![Call::FloorStatus(3, true)]);

    device.set(Pin::FloorRequested(1), true);
    device.set(Pin::StopRequested, true);
    ticker.tick_n(2).await;
    assert_eq!(
        api.calls(),
        vec![Call::FloorStatus(3, true), Call::RequestedFloor(1), Call::StopRequested]
    );

    trigger.fire();
    task.await.unwrap();
}

#[tokio::test]
async fn every_call_button_is_read() {
    let config = DumbwaiterConfig { num_floors: 5, ..Default::default() };
    let device = SimDevice::new("floor1");
    let api = Arc::new(RecordingApi::default());
    let mut sensors = FloorSensors::new(1, &config, Arc::new(device.clone()), api.clone());

    device.set(Pin::FloorRequested(5), true);
    sensors.poll_once().await;
    assert_eq!(api.calls(), vec![Call::RequestedFloor(5)]);
}

#[tokio::test]
async fn loop_ends_when_the_ticker_goes_away() {
    let (ticker, ticks) = TickSource::manual();
    let task = FloorSensors::new(
        2,
        &DumbwaiterConfig::default(),
        Arc::new(SimDevice::new("floor2")),
        Arc::new(RecordingApi::default()),
    )
    .with_tick_source(ticks)
    .spawn(Shutdown::never());

    assert!(ticker.tick().await);
    drop(ticker);
    task.await.unwrap();
}
