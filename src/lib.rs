#![warn(missing_docs)]
//! # Dumbwaiter library
//!
//! Controls a single dumbwaiter platform driven by a garage-door style opener. A
//! controller decides once per tick whether to drive the platform up, down or stop it,
//! based on calls and arrivals reported by one sensor unit per floor.
//!
//! ## Overview
//! - **Config**: default parameters and the runtime configuration.
//! - **Pi**: the board pins and the signal device boundary, with a simulated device.
//! - **Controller**: the controller state, decision table and controller task.
//! - **Api**: the calls the floor units make on the controller.
//! - **Floor**: the per-floor sensor loop.
//! - **Timing**: tick sources and the shutdown signal.
//! - **Print**: coloured logging and status printing.

/// Default parameters and runtime configuration
pub mod config;

/// Board pins and signal devices
pub mod pi;

/// Tick sources and shutdown signal
pub mod timing;

/// Controller API used by the floor units
pub mod api;

/// Controller state machine and task
pub mod controller;

/// Floor sensor units
pub mod floor;

/// Print functions with color coding
pub mod print;
