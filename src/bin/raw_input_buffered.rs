//! Joystick viewer that drains the Raw Input buffer on a timer.
//!
//! Usage: `raw_input_buffered [config.toml]`

use std::path::PathBuf;
use std::process::ExitCode;

use rawjoy::{backends, logging, Config};

fn main() -> ExitCode {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = match Config::load(Config::buffered(), path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("raw_input_buffered: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&cfg.log) {
        eprintln!("raw_input_buffered: {e}");
    }

    match backends::run_buffered(&cfg) {
        Ok(code) => ExitCode::from(backends::exit_status(code)),
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
