//! Door open/close cycle run by the drain worker after serving a request.

use std::time::Duration;

use crossbeam_channel as cbc;
use tokio::time::sleep;

use crate::config;
use crate::elevio::RigCommand;

use super::{Dirn, Elevator};

/// Opens the door, holds it, closes it.
///
/// Sends `d n 1`, marks the door open, waits `hold`, sends `d n -1`, waits `close`,
/// then marks the door closed and still.
pub async fn door_cycle(
    elevator: &Elevator,
    commands: &cbc::Sender<RigCommand>,
    hold: Duration,
    close: Duration,
) {
    let number = elevator.number();
    let cabin = elevator.cabin();

    elevator.send(commands, RigCommand::Door { elevator: number, direction: Dirn::Up });
    cabin.set_door_direction(Dirn::Up as i32);
    cabin.set_door_state(config::DOOR_OPEN as i32);
    sleep(hold).await;

    elevator.send(commands, RigCommand::Door { elevator: number, direction: Dirn::Down });
    cabin.set_door_direction(Dirn::Down as i32);
    sleep(close).await;

    cabin.set_door_state(config::DOOR_CLOSED as i32);
    cabin.set_door_direction(Dirn::Stop as i32);
}
