//! ## Manager
//!
//! The [`Dispatcher`] is the front door of the bank. It takes hall calls and panel
//! calls, runs the [`task_allocator`] for hall calls, registers the request on the
//! chosen elevator and makes sure exactly one drain worker runs per elevator with work.
//!
//! The elevator list is built once in [`Dispatcher::new`] and never changes. A
//! `Dispatcher` is a cheap handle (`Arc` inside) and is cloned into every drain
//! worker and I/O task.

pub mod task_allocator;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crossbeam_channel as cbc;
use tokio::runtime::Handle;

use crate::config::DispatchConfig;
use crate::elevator_logic::request::Request;
use crate::elevator_logic::{floor, task_handler, Dirn, Elevator, ElevatorSnapshot};
use crate::elevio::{RigCommand, RigEvent};
use crate::error::{DispatchError, Result};
use crate::print;

use task_allocator::Assignment;

#[derive(Debug)]
struct Shared {
    elevators: Vec<Arc<Elevator>>,
    config: DispatchConfig,
    commands: cbc::Sender<RigCommand>,
    /// Indices of elevators with a running drain worker
    active: Mutex<HashSet<usize>>,
    /// Held from heuristic to register so two hall calls cannot both miss each other
    assign_lock: Mutex<()>,
    runtime: Handle,
}

/// Handle to a bank of elevators.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    /// Builds a bank of `config.num_elevators` elevators, all parked at floor 0.
    ///
    /// Motor, door and scale commands go out on `commands`. Must be called from inside
    /// a tokio runtime, drain workers are spawned on it.
    pub fn new(config: DispatchConfig, commands: cbc::Sender<RigCommand>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        let elevators = (1..=config.num_elevators)
            .map(|number| Arc::new(Elevator::new(number, config.top_floor)))
            .collect();

        print::ok(format!(
            "Dispatcher up: {} elevator(s), floors 0..={}",
            config.num_elevators, config.top_floor
        ));
        Ok(Self {
            shared: Arc::new(Shared {
                elevators,
                config,
                commands,
                active: Mutex::new(HashSet::new()),
                assign_lock: Mutex::new(()),
                runtime,
            }),
        })
    }

    fn active(&self) -> MutexGuard<'_, HashSet<usize>> {
        self.shared.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn index_of(&self, number: usize) -> Result<usize> {
        if (1..=self.shared.elevators.len()).contains(&number) {
            Ok(number - 1)
        } else {
            Err(DispatchError::UnknownElevator(number))
        }
    }

    /// Hall call from a landing: `floor` in `0..=top`, `direction` in {-1, 0, 1}.
    ///
    /// Returns where the call went. Out-of-range arguments are the only error.
    pub fn press_button(&self, floor: i32, direction: i32) -> Result<Assignment> {
        let top = self.shared.config.top_floor;
        if !(0..=top).contains(&floor) {
            return Err(DispatchError::FloorOutOfRange { floor, top });
        }
        let dirn = Dirn::from_i32(direction).ok_or(DispatchError::InvalidDirection(direction))?;
        self.dispatch_hall(Request::hall(floor, dirn))
    }

    /// Runs the allocator for a hall call and registers it on the chosen elevator.
    pub(crate) fn dispatch_hall(&self, request: Arc<Request>) -> Result<Assignment> {
        let elevators = &self.shared.elevators;
        let assignment = {
            let _assign = self.shared.assign_lock.lock().unwrap_or_else(|e| e.into_inner());
            let assignment = if elevators.len() == 1 {
                if elevators[0].queue().contains_equivalent(&request.key()) {
                    Assignment::Duplicate
                } else {
                    Assignment::Assigned(0)
                }
            } else {
                task_allocator::choose_elevator(elevators, request.key())
            };
            if let Assignment::Assigned(idx) = assignment {
                elevators[idx].register(request.clone());
            }
            assignment
        };

        match assignment {
            Assignment::Assigned(idx) => {
                print::info(format!("Hall call {} -> elevator {}", request, idx + 1));
                self.ensure_worker(idx);
            }
            Assignment::Duplicate => {
                print::info(format!("Hall call {} already queued, dropped", request.key()))
            }
            Assignment::NoneAvailable => {
                print::warn(format!("Hall call {} dropped, every elevator is stopped", request.key()))
            }
        }
        Ok(assignment)
    }

    /// Button inside cabin `number` (1-based).
    ///
    /// The stop sentinel latches emergency stop. Any other floor clears the latch,
    /// is clamped into the building and queued as a panel call.
    pub fn press_panel(&self, number: usize, floor: i32) {
        let idx = match self.index_of(number) {
            Ok(idx) => idx,
            Err(e) => {
                print::warn(format!("Panel call dropped: {}", e));
                return;
            }
        };
        let elevator = &self.shared.elevators[idx];

        if floor == self.shared.config.stop_floor {
            elevator.emergency_stop(&self.shared.commands);
            return;
        }

        let top = self.shared.config.top_floor;
        let target = floor.clamp(0, top);
        if target != floor {
            print::warn(format!("Panel floor out of range = {}, clamped to {}", floor, target));
        }

        elevator.clear_stop();
        let dirn = floor::direction_towards(target, elevator.cabin().position());
        elevator.register(Request::panel(target, dirn));
        self.ensure_worker(idx);
    }

    /// Position telemetry for elevator `number` (1-based).
    pub fn report_position(&self, number: usize, position: f64) {
        match self.index_of(number) {
            Ok(idx) => self.shared.elevators[idx].report_position(position),
            Err(e) => print::warn(format!("Position report dropped: {}", e)),
        }
    }

    /// Parses one inbound line and acts on it. Bad lines are reported and dropped.
    pub fn handle_input(&self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        match line.parse::<RigEvent>() {
            Ok(RigEvent::HallCall { floor, direction }) => {
                if let Err(e) = self.press_button(floor, direction) {
                    print::warn(format!("Hall call dropped: {}", e));
                }
            }
            Ok(RigEvent::PanelCall { elevator, floor }) => self.press_panel(elevator, floor),
            Ok(RigEvent::Position { elevator, position }) => self.report_position(elevator, position),
            Err(e) => print::warn(e.to_string()),
        }
    }

    /// Starts a drain worker for elevator `idx` unless one is running.
    pub(crate) fn ensure_worker(&self, idx: usize) {
        let mut active = self.active();
        if active.insert(idx) {
            let dispatcher = self.clone();
            self.shared.runtime.spawn(task_handler::drain(dispatcher, idx));
        }
    }

    /// Called by a drain worker that found nothing to do. Deregisters it and returns
    /// `true` if the elevator is stopped or its queue is empty, `false` if work
    /// arrived in the meantime and the worker should keep going.
    pub(crate) fn finish_worker(&self, idx: usize) -> bool {
        let mut active = self.active();
        let Some(elevator) = self.shared.elevators.get(idx) else {
            active.remove(&idx);
            return true;
        };
        if elevator.cabin().is_stopped() || elevator.queue().is_empty() {
            active.remove(&idx);
            true
        } else {
            false
        }
    }

    pub(crate) fn elevator_at(&self, idx: usize) -> Option<Arc<Elevator>> {
        self.shared.elevators.get(idx).cloned()
    }

    pub(crate) fn commands(&self) -> &cbc::Sender<RigCommand> {
        &self.shared.commands
    }

    /// Runtime configuration of this bank
    pub fn config(&self) -> &DispatchConfig {
        &self.shared.config
    }

    /// All elevators, index `i` is elevator number `i + 1`
    pub fn elevators(&self) -> &[Arc<Elevator>] {
        &self.shared.elevators
    }

    /// Elevator by 1-based number
    pub fn elevator(&self, number: usize) -> Result<&Arc<Elevator>> {
        let idx = self.index_of(number)?;
        Ok(&self.shared.elevators[idx])
    }

    /// `true` while a drain worker runs for elevator `number` (1-based)
    pub fn is_worker_active(&self, number: usize) -> bool {
        match self.index_of(number) {
            Ok(idx) => self.active().contains(&idx),
            Err(_) => false,
        }
    }

    /// Number of drain workers currently running
    pub fn active_workers(&self) -> usize {
        self.active().len()
    }

    /// State of every elevator, in number order
    pub fn snapshot(&self) -> Vec<ElevatorSnapshot> {
        let active = self.active().clone();
        self.shared
            .elevators
            .iter()
            .enumerate()
            .map(|(idx, elevator)| elevator.snapshot(active.contains(&idx)))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn bank(num_elevators: usize) -> (Dispatcher, cbc::Receiver<RigCommand>) {
        let (tx, rx) = cbc::unbounded();
        let config = DispatchConfig { num_elevators, ..DispatchConfig::default() };
        (Dispatcher::new(config, tx).unwrap(), rx)
    }

    #[test]
    fn construction_outside_a_runtime_fails() {
        let (tx, _rx) = cbc::unbounded();
        let err = Dispatcher::new(DispatchConfig::default(), tx).unwrap_err();
        assert_eq!(err, DispatchError::NoRuntime);
    }

    #[tokio::test]
    async fn construction_rejects_an_empty_bank() {
        let (tx, _rx) = cbc::unbounded();
        let config = DispatchConfig { num_elevators: 0, ..DispatchConfig::default() };
        assert_eq!(Dispatcher::new(config, tx).unwrap_err(), DispatchError::NoElevators);
    }

    #[tokio::test]
    async fn press_button_validates_arguments() {
        let (dispatcher, _rx) = bank(1);
        assert_eq!(
            dispatcher.press_button(7, 1),
            Err(DispatchError::FloorOutOfRange { floor: 7, top: 6 })
        );
        assert_eq!(dispatcher.press_button(-1, 1), Err(DispatchError::FloorOutOfRange { floor: -1, top: 6 }));
        assert_eq!(dispatcher.press_button(3, 2), Err(DispatchError::InvalidDirection(2)));
        assert!(dispatcher.elevators()[0].queue().is_empty());
    }

    #[tokio::test]
    async fn second_identical_press_is_a_duplicate() {
        let (dispatcher, _rx) = bank(1);
        assert_eq!(dispatcher.press_button(4, -1), Ok(Assignment::Assigned(0)));
        assert_eq!(dispatcher.press_button(4, -1), Ok(Assignment::Duplicate));
        assert_eq!(dispatcher.elevators()[0].queue().len(), 1);
    }

    #[tokio::test]
    async fn ensure_worker_is_single_flight() {
        let (dispatcher, _rx) = bank(2);
        dispatcher.press_panel(2, 5);
        dispatcher.press_panel(2, 3);
        dispatcher.press_panel(2, 6);
        // current-thread runtime: no worker has run yet
        assert_eq!(dispatcher.active_workers(), 1);
        assert!(dispatcher.is_worker_active(2));
        assert!(!dispatcher.is_worker_active(1));
    }

    #[tokio::test]
    async fn stop_sentinel_latches_without_queueing() {
        let (dispatcher, rx) = bank(1);
        dispatcher.press_panel(1, crate::config::SPECIAL_FOR_STOP);
        let elevator = dispatcher.elevator(1).unwrap();
        assert!(elevator.cabin().is_stopped());
        assert!(elevator.queue().is_empty());
        assert_eq!(rx.try_recv(), Ok(RigCommand::Motor { elevator: 1, direction: Dirn::Stop }));
    }

    #[tokio::test]
    async fn panel_floor_is_clamped() {
        let (dispatcher, _rx) = bank(1);
        dispatcher.press_panel(1, 9);
        let pending = dispatcher.elevator(1).unwrap().queue().keys();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].floor, 6);
        assert!(pending[0].panel);
    }

    #[tokio::test]
    async fn bad_input_touches_nothing() {
        let (dispatcher, rx) = bank(2);
        for line in ["", "x 1 2", "b 3", "p one 2", "b 3 up", "p 9 2", "f 1", "b 12 1"] {
            dispatcher.handle_input(line);
        }
        assert!(dispatcher.snapshot().iter().all(|s| s.pending.is_empty()));
        assert_eq!(dispatcher.active_workers(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn input_lines_reach_the_bank() {
        let (dispatcher, _rx) = bank(2);
        dispatcher.handle_input("f 2 4.0");
        dispatcher.handle_input("B 1 1");
        dispatcher.handle_input("panel 2 6");
        assert_eq!(dispatcher.elevator(2).unwrap().cabin().position(), 4.0);
        let snaps = dispatcher.snapshot();
        assert_eq!(snaps[0].pending.len(), 1);
        assert_eq!(snaps[1].pending.len(), 1);
        assert!(snaps[1].pending[0].panel);
    }
}
