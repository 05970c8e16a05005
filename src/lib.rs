#![warn(missing_docs)]
//! # This projects library
//!
//! This library dispatches hall calls and cabin panel calls across a bank of elevators,
//! and drives each elevator's motor and door over a line protocol to a rig that reports
//! cabin positions back.
//!
//! ## Overview
//! - **Config**: Static parameters and the runtime [`DispatchConfig`].
//! - **Error**: The [`DispatchError`] type.
//! - **Init**: Command-line parsing and config assembly.
//! - **Print**: Colour-coded terminal logging and the bank status table.
//! - **Elevio**: Wire protocol, TCP rig link and the simulated rig.
//! - **Elevator Logic**: Cabin state, request queue and the per-elevator drain worker.
//! - **Manager**: The [`Dispatcher`] and the hall-call allocator.
//!
//! ## Example
//! ```no_run
//! use crossbeam_channel as cbc;
//! use elevatordispatch::{elevio::sim, DispatchConfig, Dispatcher};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, rx) = cbc::unbounded();
//!     let dispatcher = Dispatcher::new(DispatchConfig::default(), tx).unwrap();
//!     let _rig = sim::spawn(dispatcher.clone(), rx);
//!     dispatcher.press_button(3, -1).unwrap();
//!     dispatcher.press_panel(1, 5);
//! }
//! ```

/// Global variables
pub mod config;

/// Error types
pub mod error;

/// Initialize functions
pub mod init;

/// Print functions with color coding
pub mod print;

/// Interface for the motor/door rig
pub mod elevio;

/// Elevator control logic and request handling
pub mod elevator_logic;

/// Dispatching across the bank
pub mod manager;

pub use config::DispatchConfig;
pub use error::DispatchError;
pub use manager::Dispatcher;
