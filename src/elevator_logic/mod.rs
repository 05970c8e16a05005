//! ## Elevator logic
//!
//! Everything that belongs to a single elevator:
//! - [`cabin`]: live cabin state (position, motor, door, scale, stop latch)
//! - [`floor`]: floor arithmetic on continuous positions
//! - [`request`]: hall and panel calls and the handle a worker waits on
//! - [`queue`]: the ordered request queue and its preemption rules
//! - [`task_handler`]: the drain worker that serves the queue
//! - [`door`]: the door open/close cycle
//!
//! [`Elevator`] ties them together and is the only place the motor is commanded from.

pub mod cabin;
pub mod door;
pub mod floor;
pub mod queue;
pub mod request;
pub mod task_handler;

use std::fmt;
use std::sync::{Arc, Mutex};

use crossbeam_channel as cbc;
use serde::{Deserialize, Serialize};

use crate::elevio::RigCommand;
use crate::print;

use cabin::CabinState;
use queue::{Registration, RequestQueue};
use request::{CallKey, Request, WakeReason};

#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Direction of travel, for the motor, the door and wanted directions of calls
pub enum Dirn {
    Down = -1,
    Stop = 0,
    Up = 1,
}

impl Dirn {
    /// Maps `-1`, `0`, `1` to a direction, anything else to `None`.
    pub fn from_i32(value: i32) -> Option<Dirn> {
        match value {
            -1 => Some(Dirn::Down),
            0 => Some(Dirn::Stop),
            1 => Some(Dirn::Up),
            _ => None,
        }
    }

    /// `-1.0`, `0.0` or `1.0`
    pub fn sign(self) -> f64 {
        self as i8 as f64
    }
}

impl fmt::Display for Dirn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as i8)
    }
}

/// Point-in-time copy of one elevator's state, for status printing and tests.
#[derive(Debug, Clone, Serialize)]
pub struct ElevatorSnapshot {
    /// 1-based elevator number
    pub number: usize,
    /// Position in floor units
    pub position: f64,
    /// Motor direction
    pub direction: Dirn,
    /// Door openness, 0 closed to 5 open
    pub door_state: u8,
    /// Door movement
    pub door_direction: Dirn,
    /// Emergency-stop latch
    pub stopped: bool,
    /// Level indicator
    pub scale: i32,
    /// Request being served
    pub current_target: Option<CallKey>,
    /// All pending requests in floor order
    pub pending: Vec<CallKey>,
    /// `true` while a drain worker runs for this elevator
    pub worker_active: bool,
}

/// One elevator of the bank: cabin state plus its request queue.
#[derive(Debug)]
pub struct Elevator {
    number: usize,
    cabin: CabinState,
    queue: RequestQueue,
    /// Held while commanding the motor, so the stop latch and the command agree.
    motor: Mutex<()>,
}

impl Elevator {
    /// Creates elevator `number` (1-based) parked at floor 0.
    pub fn new(number: usize, top_floor: i32) -> Self {
        Self {
            number,
            cabin: CabinState::new(top_floor),
            queue: RequestQueue::new(),
            motor: Mutex::new(()),
        }
    }

    /// 1-based elevator number
    pub fn number(&self) -> usize {
        self.number
    }

    /// Live cabin state
    pub fn cabin(&self) -> &CabinState {
        &self.cabin
    }

    /// Pending requests
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Direction the cabin is heading: the motor direction while it runs, else the
    /// direction towards the current target, else stop.
    pub fn travel_direction(&self) -> Dirn {
        match self.cabin.direction() {
            Dirn::Stop => self
                .queue
                .current_target()
                .map(|target| floor::direction_towards(target.floor(), self.cabin.position()))
                .unwrap_or(Dirn::Stop),
            moving => moving,
        }
    }

    /// Registers a request in this elevator's queue against its live position.
    pub fn register(&self, request: Arc<Request>) -> Registration {
        let outcome = self
            .queue
            .register(request.clone(), self.cabin.position(), self.travel_direction());
        match outcome {
            Registration::Rejected => {
                print::info(format!("Elevator {}: {} already queued", self.number, request.key()))
            }
            Registration::Preempted => {
                print::info(format!("Elevator {}: {} is the new target", self.number, request))
            }
            Registration::Queued => {}
        }
        outcome
    }

    /// Telemetry: stores the new position and wakes workers whose floor was reached.
    pub fn report_position(&self, position: f64) {
        let stored = self.cabin.set_position(position);
        if let Some(floor) = floor::arrived_floor(stored) {
            self.queue.signal_position(floor);
        }
    }

    /// Commands the motor. Anything but [`Dirn::Stop`] is refused while the stop latch is set.
    pub fn drive(&self, commands: &cbc::Sender<RigCommand>, direction: Dirn) -> bool {
        let _motor = self.motor.lock().unwrap_or_else(|e| e.into_inner());
        if direction != Dirn::Stop && self.cabin.is_stopped() {
            return false;
        }
        self.send(commands, RigCommand::Motor { elevator: self.number, direction });
        self.cabin.set_direction(direction as i32);
        true
    }

    /// Latches emergency stop, halts the motor and wakes the worker.
    pub fn emergency_stop(&self, commands: &cbc::Sender<RigCommand>) {
        {
            let _motor = self.motor.lock().unwrap_or_else(|e| e.into_inner());
            self.cabin.set_stopped(true);
            self.send(commands, RigCommand::Motor { elevator: self.number, direction: Dirn::Stop });
            self.cabin.set_direction(Dirn::Stop as i32);
        }
        self.queue.signal_current(WakeReason::Stopped);
        print::warn(format!("Elevator {}: emergency stop", self.number));
    }

    /// Clears the stop latch and any stop wake still pending. Returns `true` if it was set.
    pub fn clear_stop(&self) -> bool {
        let was = self.cabin.set_stopped(false);
        if was {
            self.queue.discard_signals();
            print::ok(format!("Elevator {}: stop released", self.number));
        }
        was
    }

    /// Sends a command to the rig, warning if the link is gone.
    pub fn send(&self, commands: &cbc::Sender<RigCommand>, command: RigCommand) {
        if let Err(e) = commands.send(command) {
            print::warn(format!("Elevator {}: rig link closed, dropped '{}'", self.number, e.into_inner()));
        }
    }

    /// Copies the current state.
    pub fn snapshot(&self, worker_active: bool) -> ElevatorSnapshot {
        ElevatorSnapshot {
            number: self.number,
            position: self.cabin.position(),
            direction: self.cabin.direction(),
            door_state: self.cabin.door_state(),
            door_direction: self.cabin.door_direction(),
            stopped: self.cabin.is_stopped(),
            scale: self.cabin.scale(),
            current_target: self.queue.current_target().map(|r| r.key()),
            pending: self.queue.keys(),
            worker_active,
        }
    }
}
