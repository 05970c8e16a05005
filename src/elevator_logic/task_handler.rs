//! ## Drain worker
//!
//! One tokio task per elevator with pending work. The worker repeatedly asks the
//! queue for the next request in its preferred direction, drives towards it, blocks
//! on the request's [`WaitHandle`](super::request::WaitHandle) and serves it on arrival.
//!
//! An emergency stop halts the motor and cycles the door where the cabin stands.
//! The worker exits when the queue is empty or the stop latch is set. Both checks go
//! through [`Dispatcher::finish_worker`], which holds the same lock as
//! [`Dispatcher::ensure_worker`], so a request registered while the worker is leaving
//! always gets a new worker.

use std::sync::Arc;

use crossbeam_channel as cbc;
use tokio::task::yield_now;

use crate::elevio::RigCommand;
use crate::manager::Dispatcher;
use crate::print;

use super::door::door_cycle;
use super::floor;
use super::request::{Request, WakeReason};
use super::{Dirn, Elevator};

/// Serves elevator `idx` until its queue is drained or it is stopped.
pub(crate) async fn drain(dispatcher: Dispatcher, idx: usize) {
    let Some(elevator) = dispatcher.elevator_at(idx) else {
        print::cosmic_err(format!("drain: no elevator at index {}", idx));
        return;
    };
    let commands = dispatcher.commands().clone();
    let mut preferred = Dirn::Up;

    loop {
        if elevator.cabin().is_stopped() {
            if dispatcher.finish_worker(idx) {
                break;
            }
            yield_now().await;
            continue;
        }

        let Some(request) = next_request(&elevator, preferred) else {
            if dispatcher.finish_worker(idx) {
                break;
            }
            yield_now().await;
            continue;
        };

        let position = elevator.cabin().position();
        let travel = if elevator.cabin().direction() == Dirn::Stop
            && floor::is_at_floor(position, request.floor())
        {
            Dirn::Stop
        } else {
            floor::direction_towards(request.floor(), position)
        };

        if travel != Dirn::Stop {
            if !elevator.drive(&commands, travel) {
                continue;
            }
            preferred = travel;
            match wait_for(&elevator, &request).await {
                WakeReason::Arrived => {}
                WakeReason::Cancelled => continue,
                WakeReason::Stopped => {
                    elevator.drive(&commands, Dirn::Stop);
                    let config = dispatcher.config();
                    door_cycle(&elevator, &commands, config.door_open_hold(), config.door_close()).await;
                    continue;
                }
            }
        }

        serve(&dispatcher, &elevator, &commands, &request).await;
    }
    print::info(format!("Elevator {}: queue drained, worker parked", elevator.number()));
}

fn next_request(elevator: &Elevator, preferred: Dirn) -> Option<Arc<Request>> {
    let queue = elevator.queue();
    let position = elevator.cabin().position();
    match preferred {
        Dirn::Down => queue.next_down(position).or_else(|| queue.next_up(position)),
        _ => queue.next_up(position).or_else(|| queue.next_down(position)),
    }
}

/// Blocks until the cabin is on the request's floor, the request lost its place as
/// target, or the elevator was stopped.
async fn wait_for(elevator: &Elevator, request: &Arc<Request>) -> WakeReason {
    loop {
        match request.handle().wait().await {
            WakeReason::Arrived => {
                if !elevator.queue().is_current(request) {
                    return WakeReason::Cancelled;
                }
                if floor::is_at_floor(elevator.cabin().position(), request.floor()) {
                    return WakeReason::Arrived;
                }
            }
            other => return other,
        }
    }
}

/// Cabin is on the request's floor: dequeue, halt, update the scale, then either
/// cycle the door or hand a hall call back to the bank for re-arbitration.
async fn serve(
    dispatcher: &Dispatcher,
    elevator: &Elevator,
    commands: &cbc::Sender<RigCommand>,
    request: &Arc<Request>,
) {
    let number = elevator.number();
    let floor = request.floor();

    elevator.queue().remove(request, elevator.cabin().position());
    elevator.drive(commands, Dirn::Stop);
    elevator.send(commands, RigCommand::Scale { elevator: number, floor });
    elevator.cabin().set_scale(floor);
    print::ok(format!("Elevator {}: at floor {} for {}", number, floor, request));

    if request.is_panel_call() || request.is_redispatched() {
        let config = dispatcher.config();
        door_cycle(elevator, commands, config.door_open_hold(), config.door_close()).await;
    } else if let Err(e) = dispatcher.dispatch_hall(request.redispatch()) {
        print::warn(format!("Elevator {}: could not re-dispatch {}: {}", number, request.key(), e));
    }
}
