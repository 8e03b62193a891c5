//! Logger setup for the binaries.
//!
//! The library only talks to the `log` facade; this installs a `simplelog`
//! terminal logger at the configured level.

use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use crate::config::LogConfig;
use crate::error::AppError;

pub fn init(cfg: &LogConfig) -> Result<(), AppError> {
    let config = ConfigBuilder::new()
        .set_target_level(log::LevelFilter::Error)
        .set_thread_level(log::LevelFilter::Off)
        .build();

    TermLogger::init(
        cfg.level.into(),
        config,
        TerminalMode::Stdout,
        ColorChoice::Never,
    )?;
    Ok(())
}
