//! TCP link to a motor/door rig.
//!
//! A writer thread owns the connection. It waits [`config::RIG_CONNECT_DELAY`] before
//! the first attempt, then forwards every [`RigCommand`] as one line. While the rig is
//! unreachable it retries every [`config::RIG_RETRY_DELAY`] and drops commands with a
//! warning. Each successful connect starts a reader thread that feeds inbound lines to
//! [`Dispatcher::handle_input`].

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel as cbc;

use crate::config;
use crate::manager::Dispatcher;
use crate::print;

use super::RigCommand;

/// Starts the writer thread for `addr`. It runs until every command sender is gone.
pub fn spawn_link(
    dispatcher: Dispatcher,
    commands: cbc::Receiver<RigCommand>,
    addr: String,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        thread::sleep(config::RIG_CONNECT_DELAY);

        let mut link: Option<(TcpStream, Arc<AtomicBool>)> = None;
        let mut next_attempt = Instant::now();

        loop {
            if link.as_ref().is_some_and(|(_, alive)| !alive.load(Ordering::SeqCst)) {
                link = None;
            }
            if link.is_none() && Instant::now() >= next_attempt {
                link = connect(&addr, &dispatcher);
                next_attempt = Instant::now() + config::RIG_RETRY_DELAY;
            }

            match commands.recv_timeout(config::RIG_RETRY_DELAY) {
                Ok(command) => match link.as_mut() {
                    Some((stream, alive)) => {
                        if let Err(e) = writeln!(stream, "{}", command) {
                            print::err(format!("Rig write failed, '{}' lost: {}", command, e));
                            alive.store(false, Ordering::SeqCst);
                        }
                    }
                    None => print::warn(format!("Rig not connected, dropped '{}'", command)),
                },
                Err(cbc::RecvTimeoutError::Timeout) => {}
                Err(cbc::RecvTimeoutError::Disconnected) => {
                    print::info("Command channel closed, rig link shutting down".to_string());
                    break;
                }
            }
        }
    })
}

fn connect(addr: &str, dispatcher: &Dispatcher) -> Option<(TcpStream, Arc<AtomicBool>)> {
    let stream = match TcpStream::connect(addr) {
        Ok(stream) => stream,
        Err(e) => {
            print::warn(format!("Could not reach rig at {}: {}", addr, e));
            return None;
        }
    };
    let alive = Arc::new(AtomicBool::new(true));

    match stream.try_clone() {
        Ok(inbound) => {
            let dispatcher = dispatcher.clone();
            let alive = alive.clone();
            thread::spawn(move || read_events(inbound, dispatcher, alive));
        }
        Err(e) => print::warn(format!("Rig connected without inbound events: {}", e)),
    }

    print::ok(format!("Connected to rig at {}", addr));
    Some((stream, alive))
}

fn read_events(stream: TcpStream, dispatcher: Dispatcher, alive: Arc<AtomicBool>) {
    for line in BufReader::new(stream).lines() {
        match line {
            Ok(line) => dispatcher.handle_input(&line),
            Err(e) => {
                print::err(format!("Rig read failed: {}", e));
                break;
            }
        }
    }
    print::warn("Rig closed the connection".to_string());
    alive.store(false, Ordering::SeqCst);
}
