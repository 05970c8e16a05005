//! ## Elevator I/O module
//!
//! Line protocol between the dispatcher and the motor/door rig.
//!
//! Outbound, one [`RigCommand`] per line:
//! - `m <n> <d>`: set motor direction of elevator `n`, `d` in {-1, 0, 1}
//! - `d <n> <d>`: door of elevator `n` opening (`1`) or closing (`-1`)
//! - `s <n> <f>`: level indicator of elevator `n` shows floor `f`
//!
//! Inbound, one [`RigEvent`] per line:
//! - `b <f> <d>` / `button <f> <d>`: hall call at floor `f` wanting direction `d`
//! - `p <n> <f>` / `panel <n> <f>`: panel call in elevator `n` to floor `f`
//! - `f <n> <pos>` / `position <n> <pos>`: cabin `n` is at position `pos`
//!
//! Keywords are case-insensitive, extra tokens are ignored. Elevator numbers start at 1.
//!
//! The transport lives in the submodules: [`rig`] talks TCP to a real rig, [`sim`]
//! is an in-process stand-in that moves the cabins itself.

pub mod rig;
pub mod sim;

use std::fmt;
use std::str::{FromStr, SplitWhitespace};

use serde::{Deserialize, Serialize};

use crate::elevator_logic::Dirn;
use crate::error::DispatchError;

/// Command for the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigCommand {
    /// Set the motor direction
    Motor {
        /// 1-based elevator number
        elevator: usize,
        /// Down, stop or up
        direction: Dirn,
    },
    /// Start moving the door
    Door {
        /// 1-based elevator number
        elevator: usize,
        /// Up opens, down closes
        direction: Dirn,
    },
    /// Show a floor on the level indicator
    Scale {
        /// 1-based elevator number
        elevator: usize,
        /// Floor reached
        floor: i32,
    },
}

impl RigCommand {
    /// Elevator the command is for
    pub fn elevator(&self) -> usize {
        match *self {
            RigCommand::Motor { elevator, .. }
            | RigCommand::Door { elevator, .. }
            | RigCommand::Scale { elevator, .. } => elevator,
        }
    }
}

impl fmt::Display for RigCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RigCommand::Motor { elevator, direction } => write!(f, "m {} {}", elevator, direction),
            RigCommand::Door { elevator, direction } => write!(f, "d {} {}", elevator, direction),
            RigCommand::Scale { elevator, floor } => write!(f, "s {} {}", elevator, floor),
        }
    }
}

/// Event coming from the rig or the console.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RigEvent {
    /// Landing button
    HallCall {
        /// Floor of the landing
        floor: i32,
        /// Wanted direction, unchecked
        direction: i32,
    },
    /// Button inside a cabin
    PanelCall {
        /// 1-based elevator number
        elevator: usize,
        /// Destination floor, or the stop sentinel
        floor: i32,
    },
    /// Position telemetry
    Position {
        /// 1-based elevator number
        elevator: usize,
        /// Cabin position in floor units
        position: f64,
    },
}

fn field<T: FromStr>(tokens: &mut SplitWhitespace<'_>, line: &str) -> Result<T, DispatchError> {
    tokens
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| DispatchError::MalformedCommand(line.to_string()))
}

impl FromStr for RigEvent {
    type Err = DispatchError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens
            .next()
            .ok_or_else(|| DispatchError::MalformedCommand(line.to_string()))?
            .to_ascii_lowercase();

        match keyword.as_str() {
            "b" | "button" => Ok(RigEvent::HallCall {
                floor: field(&mut tokens, line)?,
                direction: field(&mut tokens, line)?,
            }),
            "p" | "panel" => Ok(RigEvent::PanelCall {
                elevator: field(&mut tokens, line)?,
                floor: field(&mut tokens, line)?,
            }),
            "f" | "position" => Ok(RigEvent::Position {
                elevator: field(&mut tokens, line)?,
                position: field(&mut tokens, line)?,
            }),
            _ => Err(DispatchError::MalformedCommand(line.to_string())),
        }
    }
}
