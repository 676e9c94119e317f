use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use log::{error, info};

use dumbwaiter::api::ControlApi;
use dumbwaiter::config::{self, DumbwaiterConfig};
use dumbwaiter::controller::{Controller, ControllerHandle};
use dumbwaiter::floor::FloorSensors;
use dumbwaiter::pi::RpiDevice;
use dumbwaiter::print;
use dumbwaiter::timing::Shutdown;

/// Runs the dumbwaiter controller and one sensor unit per floor in this process.
#[derive(Parser, Debug)]
#[command(name = "dumbwaiter", version, about)]
struct Args {
    /// Number of floors served
    #[arg(long, default_value_t = config::DEFAULT_NUM_FLOORS)]
    num_floors: u8,

    /// Floor the platform is parked at on startup
    #[arg(long, default_value_t = config::DEFAULT_START_FLOOR)]
    start_floor: u8,

    /// Controller decision loop period in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_CONTROLLER_INTERVAL.as_millis() as u64)]
    controller_interval_ms: u64,

    /// Floor sensor loop period in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_SENSOR_INTERVAL.as_millis() as u64)]
    sensor_interval_ms: u64,

    /// Report the platform leaving a floor, not only arriving
    #[arg(long)]
    report_departures: bool,

    /// Print the controller status with this period in milliseconds
    #[arg(long)]
    status_interval_ms: Option<u64>,

    /// Print the status as JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> DumbwaiterConfig {
        DumbwaiterConfig {
            num_floors: self.num_floors,
            start_floor: self.start_floor,
            controller_interval: Duration::from_millis(self.controller_interval_ms),
            sensor_interval: Duration::from_millis(self.sensor_interval_ms),
            report_departures: self.report_departures,
        }
    }

    /// Period of the status printer, if status printing was asked for.
    fn status_interval(&self) -> Option<Duration> {
        match self.status_interval_ms {
            Some(ms) => Some(Duration::from_millis(ms.max(1))),
            None if self.json => Some(config::DEFAULT_STATUS_INTERVAL),
            None => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    print::init_logger();
    let args = Args::parse();

    let config = args.config();
    config.validate().context("invalid configuration")?;
    info!(
        "starting dumbwaiter with {} floors, platform parked at floor {}",
        config.num_floors, config.start_floor
    );

    let (trigger, shutdown) = Shutdown::channel();

    /* START ----------- Controller og etasjeeiningar ---------------------- */
    let (handle, controller_task) =
        Controller::new(&config, Arc::new(RpiDevice::new())).spawn(shutdown.clone());
    let api: Arc<dyn ControlApi> = Arc::new(handle.clone());

    let mut tasks = vec![controller_task];
    for floor in config::BOTTOM_FLOOR..=config.num_floors {
        let sensors = FloorSensors::new(floor, &config, Arc::new(RpiDevice::new()), api.clone());
        tasks.push(sensors.spawn(shutdown.clone()));
    }
    /* SLUTT ----------- Controller og etasjeeiningar ---------------------- */

    if let Some(period) = args.status_interval() {
        tasks.push(tokio::spawn(status_printer(handle, period, args.json, shutdown.clone())));
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("ctrl-c received, shutting down");
    trigger.fire();

    for result in join_all(tasks).await {
        if let Err(e) = result {
            error!("task ended abnormally: {}", e);
        }
    }
    info!("dumbwaiter stopped");
    Ok(())
}

/// Prints the controller status every `period` until shutdown.
async fn status_printer(handle: ControllerHandle, period: Duration, json: bool, mut shutdown: Shutdown) {
    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = shutdown.fired() => break,
            _ = interval.tick() => {
                let status = match handle.get_status().await {
                    Ok(status) => status,
                    Err(e) => {
                        error!("could not read controller status: {}", e);
                        continue;
                    }
                };
                if json {
                    match serde_json::to_string(&status) {
                        Ok(line) => println!("{}", line),
                        Err(e) => error!("could not serialize status: {}", e),
                    }
                } else {
                    print::status(&status);
                }
            }
        }
    }
}
