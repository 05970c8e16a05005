//! In-process stand-in for the rig.
//!
//! Every [`config::SIM_TICK`] the simulator drains the command channel, moves each
//! running cabin [`config::SIM_SPEED`] floors in its motor direction and reports the
//! new position through [`Dispatcher::report_position`]. A halted cabin close enough
//! to a floor is snapped onto it. Every command is recorded so tests can look at
//! exactly what the dispatcher sent.

use std::sync::{Arc, Mutex};

use crossbeam_channel as cbc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config;
use crate::elevator_logic::floor::arrived_floor;
use crate::elevator_logic::Dirn;
use crate::manager::Dispatcher;
use crate::print;

use super::RigCommand;

/// Running simulator. Dropping it stops the simulation.
#[derive(Debug)]
pub struct SimRig {
    log: Arc<Mutex<Vec<RigCommand>>>,
    task: JoinHandle<()>,
}

impl SimRig {
    /// Every command received so far, in order
    pub fn commands(&self) -> Vec<RigCommand> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Received commands for elevator `number` only
    pub fn commands_for(&self, number: usize) -> Vec<RigCommand> {
        self.commands().into_iter().filter(|c| c.elevator() == number).collect()
    }
}

impl Drop for SimRig {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Starts the simulator on the current tokio runtime.
pub fn spawn(dispatcher: Dispatcher, commands: cbc::Receiver<RigCommand>) -> SimRig {
    let log = Arc::new(Mutex::new(Vec::new()));
    let task = tokio::spawn(run(dispatcher, commands, log.clone()));
    SimRig { log, task }
}

async fn run(dispatcher: Dispatcher, commands: cbc::Receiver<RigCommand>, log: Arc<Mutex<Vec<RigCommand>>>) {
    let top = dispatcher.config().top_floor as f64;
    let mut motors = vec![Dirn::Stop; dispatcher.elevators().len()];
    let mut ticker = interval(config::SIM_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        loop {
            let command = match commands.try_recv() {
                Ok(command) => command,
                Err(cbc::TryRecvError::Empty) => break,
                Err(cbc::TryRecvError::Disconnected) => return,
            };
            log.lock().unwrap_or_else(|e| e.into_inner()).push(command);
            print::info(format!("rig <- {}", command));

            if let RigCommand::Motor { elevator, direction } = command {
                let Some(motor) = motors.get_mut(elevator.wrapping_sub(1)) else {
                    print::warn(format!("Simulator has no elevator {}", elevator));
                    continue;
                };
                *motor = direction;
                if direction == Dirn::Stop {
                    snap_to_floor(&dispatcher, elevator);
                }
            }
        }

        for (idx, motor) in motors.iter_mut().enumerate() {
            if *motor == Dirn::Stop {
                continue;
            }
            let Some(elevator) = dispatcher.elevators().get(idx) else { continue };
            let next = (elevator.cabin().position() + motor.sign() * config::SIM_SPEED).clamp(0.0, top);
            if next == 0.0 || next == top {
                *motor = Dirn::Stop;
            }
            dispatcher.report_position(idx + 1, next);
        }
    }
}

fn snap_to_floor(dispatcher: &Dispatcher, number: usize) {
    let Ok(elevator) = dispatcher.elevator(number) else { return };
    let position = elevator.cabin().position();
    if let Some(floor) = arrived_floor(position) {
        if position != floor as f64 {
            dispatcher.report_position(number, floor as f64);
        }
    }
}
