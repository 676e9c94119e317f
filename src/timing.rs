//! # Tick sources and shutdown
//!
//! Both the controller and the floor units run one cycle per tick. In production the
//! ticks come from a `tokio` interval; in tests a [`ManualTicker`] drives the loop one
//! cycle at a time and waits until that cycle has been handled.
//!
//! [`Shutdown`] is the stop signal handed to every loop.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::config;

/// Where a loop gets its ticks from. Chosen when the loop is built.
pub enum TickSource {
    /// Wall-clock ticks with the given period.
    Interval(Duration),
    /// Ticks sent by a [`ManualTicker`].
    Manual(mpsc::Receiver<oneshot::Sender<()>>),
}

impl TickSource {
    /// Creates a manually driven tick source and the ticker that drives it.
    pub fn manual() -> (ManualTicker, TickSource) {
        let (tx, rx) = mpsc::channel(config::TICK_CHANNEL_CAPACITY);
        (ManualTicker { tx }, TickSource::Manual(rx))
    }

    pub(crate) fn into_ticks(self) -> Ticks {
        match self {
            TickSource::Interval(period) => {
                let mut interval = time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                Ticks::Interval(interval)
            }
            TickSource::Manual(rx) => Ticks::Manual(rx),
        }
    }
}

/// Running form of a [`TickSource`], owned by the loop task.
pub(crate) enum Ticks {
    Interval(Interval),
    Manual(mpsc::Receiver<oneshot::Sender<()>>),
}

impl Ticks {
    /// Waits for the next tick. `None` when a manual ticker has been dropped.
    pub(crate) async fn next(&mut self) -> Option<TickDone> {
        match self {
            Ticks::Interval(interval) => {
                interval.tick().await;
                Some(TickDone(None))
            }
            Ticks::Manual(rx) => rx.recv().await.map(|ack| TickDone(Some(ack))),
        }
    }
}

/// Handed out with every tick; the loop calls [`TickDone::done`] when the cycle is over.
pub(crate) struct TickDone(Option<oneshot::Sender<()>>);

impl TickDone {
    pub(crate) fn done(self) {
        if let Some(ack) = self.0 {
            let _ = ack.send(());
        }
    }
}

/// Drives a loop built with [`TickSource::manual`].
#[derive(Clone)]
pub struct ManualTicker {
    tx: mpsc::Sender<oneshot::Sender<()>>,
}

impl ManualTicker {
    /// Runs exactly one cycle of the loop and waits until it has finished.
    ///
    /// Returns `false` if the loop is no longer running.
    pub async fn tick(&self) -> bool {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(ack_tx).await.is_err() {
            return false;
        }
        ack_rx.await.is_ok()
    }

    /// Runs `n` cycles back to back.
    pub async fn tick_n(&self, n: usize) -> bool {
        for _ in 0..n {
            if !self.tick().await {
                return false;
            }
        }
        true
    }
}

/// Stop signal shared by all loops. Cloning gives another listener on the same signal.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// The sending side of [`Shutdown`].
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Creates a new signal, not yet fired.
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Shutdown {
        let (_trigger, shutdown) = Shutdown::channel();
        shutdown
    }

    /// Whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires. A dropped trigger never fires.
    pub async fn fired(&mut self) {
        loop {
            let fired = *self.rx.borrow_and_update();
            if fired {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl ShutdownTrigger {
    /// Tells every loop to exit after its current cycle.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }
}
