//! ## Printing Module
//!
//! This module is only here to make logging in the terminal easier to read.
//! It prints in appropriate colors depending on the situation, and provides a
//! table view of the whole bank for debugging.
use crate::config;
use crate::elevator_logic::{Dirn, ElevatorSnapshot};
use ansi_term::Colour::{self, Green, Purple, Red, Yellow};
use prettytable::{Cell, Row, Table};
use std::sync::Mutex;
use unicode_width::UnicodeWidthStr;

fn enabled(flag: &Mutex<bool>) -> bool {
    match flag.lock() {
        Ok(on) => *on,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
///
/// ## Example
/// ```
/// use elevatordispatch::print;
///
/// print::err("Something went wrong!".to_string());
/// ```
pub fn err(msg: String) {
    if enabled(&config::PRINT_ERR_ON) {
        println!("{}{}", Red.paint("[ERROR]:   "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[WARNING\]: {}", msg
pub fn warn(msg: String) {
    if enabled(&config::PRINT_WARN_ON) {
        println!("{}{}", Yellow.paint("[WARNING]: "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[OK\]:      {}", msg
pub fn ok(msg: String) {
    if enabled(&config::PRINT_OK_ON) {
        println!("{}{}", Green.paint("[OK]:      "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[INFO\]:    {}", msg
pub fn info(msg: String) {
    let light_blue = Colour::RGB(102, 178, 255);
    if enabled(&config::PRINT_INFO_ON) {
        println!("{}{}", light_blue.paint("[INFO]:    "), light_blue.paint(msg));
    }
}

/// Prints an error for a state that should be impossible, label in red and
/// the rest of the line in a rainbow so it is hard to miss.
pub fn cosmic_err(fun: String) {
    print!("{}", Colour::Red.paint("[ERROR]: "));

    let colors = [
        Colour::Red,
        Colour::Yellow,
        Colour::Green,
        Colour::Cyan,
        Colour::Blue,
        Colour::Purple,
    ];

    let message = format!("Cosmic rays flipped a bit! IN: {}", fun);
    for (i, c) in message.chars().enumerate() {
        let color = colors[i % colors.len()];
        print!("{}", color.paint(c.to_string()));
    }
    println!();
}

/// Pads the input text to a fixed display width using spaces.
///
/// Accounts for characters that take more than one column (arrows, symbols),
/// so the status table stays aligned.
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

fn motor_label(dirn: Dirn, stopped: bool) -> String {
    if stopped {
        return Red.paint(pad_text("STOP", 6)).to_string();
    }
    match dirn {
        Dirn::Up => Yellow.paint(pad_text("↑ up", 6)).to_string(),
        Dirn::Down => Yellow.paint(pad_text("↓ down", 6)).to_string(),
        Dirn::Stop => Green.paint(pad_text("idle", 6)).to_string(),
    }
}

fn door_label(door_state: u8) -> String {
    if door_state == config::DOOR_CLOSED {
        Green.paint("closed").to_string()
    } else {
        Purple.paint(format!("open {}/{}", door_state, config::DOOR_OPEN)).to_string()
    }
}

/// Logs the state of every elevator in the bank as a table.
///
/// One row per elevator: number, live position, motor state, door, current target,
/// pending requests in queue order and whether a drain worker runs for it.
/// Pending entries are written `floor`+`^`/`v`/`-` for hall calls and `floor`+`*` for panel calls.
///
/// If `PRINT_STATUS_ON` is `false`, nothing is printed.
pub fn bank_status(snapshots: &[ElevatorSnapshot]) {
    if !enabled(&config::PRINT_STATUS_ON) {
        return;
    }

    let mut table = Table::new();
    table.set_titles(Row::new(vec![
        Cell::new("#"),
        Cell::new("Position"),
        Cell::new("Motor"),
        Cell::new("Door"),
        Cell::new("Target"),
        Cell::new("Pending"),
        Cell::new("Worker"),
    ]));

    for snap in snapshots {
        let target = snap
            .current_target
            .map(|key| key.to_string())
            .unwrap_or_else(|| "-".to_string());
        let pending: Vec<String> = snap.pending.iter().map(|key| key.to_string()).collect();
        let worker = if snap.worker_active { Green.paint("running") } else { Purple.paint("parked") };

        table.add_row(Row::new(vec![
            Cell::new(&snap.number.to_string()),
            Cell::new(&format!("{:>5.2}", snap.position)),
            Cell::new(&motor_label(snap.direction, snap.stopped)),
            Cell::new(&door_label(snap.door_state)),
            Cell::new(&target),
            Cell::new(&pending.join(" ")),
            Cell::new(&worker.to_string()),
        ]));
    }
    table.printstd();
}
