//! ## Startup
//!
//! Command-line parsing and assembly of the [`DispatchConfig`] the binary runs with.
//!
//! Arguments are `key::value` pairs, plus the bare words `debug` and `help`:
//! ```text
//! elevatordispatch simulate::true elevators::3 top::5 print_info::false
//! elevatordispatch config::bank.json rig::localhost:4711
//! ```
//! Precedence: built-in defaults, then the JSON file from `config::<path>`, then the
//! individual overrides.

use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;

use crate::config::{self, DispatchConfig};
use crate::print;

/// Everything the command line can ask for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchArgs {
    /// JSON configuration file
    pub config_path: Option<PathBuf>,
    /// Run against the built-in simulated rig and read commands from stdin
    pub simulate: bool,
    /// Override for the number of elevators
    pub elevators: Option<usize>,
    /// Override for the top floor
    pub top_floor: Option<i32>,
    /// Override for the rig address
    pub rig_addr: Option<String>,
    /// Print usage and exit
    pub help: bool,
}

fn set_flag(flag: &Mutex<bool>, on: bool) {
    *flag.lock().unwrap_or_else(|e| e.into_inner()) = on;
}

/// Parses the process arguments. Print toggles take effect immediately.
pub fn parse_args() -> LaunchArgs {
    parse_args_from(env::args().skip(1))
}

/// Parses `args` (without the program name). Print toggles take effect immediately,
/// unknown or unparsable arguments are reported and ignored.
pub fn parse_args_from<I>(args: I) -> LaunchArgs
where
    I: IntoIterator<Item = String>,
{
    let mut launch = LaunchArgs::default();

    for arg in args {
        let Some((key, value)) = arg.split_once("::") else {
            match arg.to_lowercase().as_str() {
                // Debug modus: bare feilmeldingar
                "debug" => {
                    set_flag(&config::PRINT_STATUS_ON, false);
                    set_flag(&config::PRINT_WARN_ON, false);
                    set_flag(&config::PRINT_OK_ON, false);
                    set_flag(&config::PRINT_INFO_ON, false);
                }
                "help" => launch.help = true,
                _ => print::warn(format!("Unknown argument '{}', try 'help'", arg)),
            }
            continue;
        };

        let key = key.to_lowercase();
        let is_true = value.eq_ignore_ascii_case("true");
        match key.as_str() {
            "print_status" => set_flag(&config::PRINT_STATUS_ON, is_true),
            "print_err" => set_flag(&config::PRINT_ERR_ON, is_true),
            "print_warn" => set_flag(&config::PRINT_WARN_ON, is_true),
            "print_ok" => set_flag(&config::PRINT_OK_ON, is_true),
            "print_info" => set_flag(&config::PRINT_INFO_ON, is_true),
            "simulate" => launch.simulate = is_true,
            "config" => launch.config_path = Some(PathBuf::from(value)),
            "rig" => launch.rig_addr = Some(value.to_string()),
            "elevators" => match value.parse() {
                Ok(n) => launch.elevators = Some(n),
                Err(_) => print::warn(format!("elevators::{} is not a count, ignored", value)),
            },
            "top" => match value.parse() {
                Ok(top) => launch.top_floor = Some(top),
                Err(_) => print::warn(format!("top::{} is not a floor, ignored", value)),
            },
            _ => print::warn(format!("Unknown argument '{}', try 'help'", arg)),
        }
    }
    launch
}

/// Builds and validates the configuration described by `args`.
pub fn build_config(args: &LaunchArgs) -> anyhow::Result<DispatchConfig> {
    let mut dispatch = match &args.config_path {
        Some(path) => DispatchConfig::load(path)?,
        None => DispatchConfig::default(),
    };
    if let Some(n) = args.elevators {
        dispatch.num_elevators = n;
    }
    if let Some(top) = args.top_floor {
        dispatch.top_floor = top;
    }
    if let Some(addr) = &args.rig_addr {
        dispatch.rig_addr = addr.clone();
    }
    dispatch.validate().context("unusable dispatcher configuration")?;
    Ok(dispatch)
}

/// Prints the available arguments.
pub fn print_help() {
    println!("Tilgjengelige argument:");
    println!("  config::<path>          JSON file with dispatcher settings");
    println!("  simulate::true/false    run against the built-in rig, read commands from stdin");
    println!("  elevators::<n>          number of elevators");
    println!("  top::<floor>            index of the top floor");
    println!("  rig::<host:port>        address of the motor/door rig");
    println!("  print_status::true/false");
    println!("  print_err::true/false");
    println!("  print_warn::true/false");
    println!("  print_ok::true/false");
    println!("  print_info::true/false");
    println!("  debug (kun error-meldingar vises)");
    println!("Console commands in simulate mode: 'b <floor> <dir>', 'p <elevator> <floor>', 'f <elevator> <pos>'");
}
