//! Joystick viewer that handles each `WM_INPUT` as it arrives.
//!
//! Usage: `raw_input_messaged [config.toml]`

use std::path::PathBuf;
use std::process::ExitCode;

use rawjoy::{backends, logging, Config};

fn main() -> ExitCode {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let cfg = match Config::load(Config::messaged(), path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("raw_input_messaged: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&cfg.log) {
        eprintln!("raw_input_messaged: {e}");
    }

    match backends::run_messaged(&cfg) {
        Ok(code) => ExitCode::from(backends::exit_status(code)),
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
