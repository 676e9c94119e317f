//! In-memory [`SignalDevice`] used by the tests and for dry runs without a board.
//!
//! Inputs are set by hand, relay pulses are recorded in order and can also be
//! followed live on a `crossbeam_channel` receiver. Any pin can be made to fail.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel as cbc;

use super::{Pin, SignalDevice, SignalError};

#[derive(Default)]
struct SimState {
    inputs: HashMap<Pin, bool>,
    sent: Vec<Pin>,
    failing: HashSet<Pin>,
    subscribers: Vec<cbc::Sender<Pin>>,
}

/// A simulated board. Clones share the same pins.
#[derive(Clone, Default)]
pub struct SimDevice {
    name: String,
    state: Arc<Mutex<SimState>>,
}

impl SimDevice {
    /// Creates a board with every input off. `name` shows up in error messages.
    pub fn new(name: &str) -> Self {
        SimDevice {
            name: name.to_string(),
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // Pin data stays consistent if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets the value returned for an input pin.
    pub fn set(&self, pin: Pin, value: bool) {
        self.lock().inputs.insert(pin, value);
    }

    /// Makes every `send`/`get` on `pin` fail until [`SimDevice::recover`] is called.
    pub fn fail(&self, pin: Pin) {
        self.lock().failing.insert(pin);
    }

    /// Undoes [`SimDevice::fail`].
    pub fn recover(&self, pin: Pin) {
        self.lock().failing.remove(&pin);
    }

    /// All relay pulses so far, oldest first.
    pub fn sent(&self) -> Vec<Pin> {
        self.lock().sent.clone()
    }

    /// Returns and forgets the relay pulses recorded so far.
    pub fn take_sent(&self) -> Vec<Pin> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Returns a receiver that gets every relay pulse from now on.
    pub fn subscribe(&self) -> cbc::Receiver<Pin> {
        let (tx, rx) = cbc::unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    fn check(&self, state: &SimState, pin: Pin) -> Result<(), SignalError> {
        if state.failing.contains(&pin) {
            return Err(SignalError::Io {
                pin,
                reason: format!("{} simulated failure", self.name),
            });
        }
        Ok(())
    }
}

impl SignalDevice for SimDevice {
    fn send(&self, pin: Pin) -> Result<(), SignalError> {
        if !pin.is_relay() {
            return Err(SignalError::Unsupported(pin));
        }
        let mut state = self.lock();
        self.check(&state, pin)?;
        state.sent.push(pin);
        // Drop receivers that have gone away.
        state.subscribers.retain(|tx| tx.send(pin).is_ok());
        Ok(())
    }

    fn get(&self, pin: Pin) -> Result<bool, SignalError> {
        let state = self.lock();
        self.check(&state, pin)?;
        Ok(state.inputs.get(&pin).copied().unwrap_or(false))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn inputs_default_to_off() {
        let dev = SimDevice::new("floor1");
        assert_eq!(dev.get(Pin::AtFloor), Ok(false));
        dev.set(Pin::AtFloor, true);
        assert_eq!(dev.get(Pin::AtFloor), Ok(true));
    }

    #[test]
    fn records_and_publishes_relay_pulses() {
        let dev = SimDevice::new("controller");
        let rx = dev.subscribe();

        dev.send(Pin::OpenerUp).unwrap();
        dev.send(Pin::OpenerStop).unwrap();

        assert_eq!(dev.sent(), vec![Pin::OpenerUp, Pin::OpenerStop]);
        assert_eq!(rx.recv_timeout(Duration::from_millis(100)), Ok(Pin::OpenerUp));
        assert_eq!(rx.recv_timeout(Duration::from_millis(100)), Ok(Pin::OpenerStop));
        assert_eq!(dev.take_sent().len(), 2);
        assert!(dev.sent().is_empty());
    }

    #[test]
    fn failing_pins_error_until_recovered() {
        let dev = SimDevice::new("floor2");
        dev.fail(Pin::StopRequested);
        assert!(matches!(dev.get(Pin::StopRequested), Err(SignalError::Io { .. })));
        assert_eq!(dev.get(Pin::AtFloor), Ok(false));

        dev.recover(Pin::StopRequested);
        assert_eq!(dev.get(Pin::StopRequested), Ok(false));
    }

    #[test]
    fn buttons_cannot_be_pulsed() {
        let dev = SimDevice::new("floor3");
        assert_eq!(
            dev.send(Pin::FloorRequested(1)),
            Err(SignalError::Unsupported(Pin::FloorRequested(1)))
        );
        assert!(dev.sent().is_empty());
    }
}
