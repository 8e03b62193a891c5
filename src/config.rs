//! Viewer configuration.
//!
//! Both programs accept an optional TOML file path as their first argument.
//! Every key is optional; anything missing keeps the variant's default (see
//! [`Config::buffered`] and [`Config::messaged`]).
//!
//! ```toml
//! [window]
//! title = "Joystick using Raw Input API"
//! timer_interval_ms = 16
//! buffer_multiplier = 16
//!
//! [axes]
//! scale = "word"          # byte | word | logical
//! second_stick = "rx_ry"  # z_rz | rx_ry
//!
//! [log]
//! level = "debug"
//! dump_state = true
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::AxisProfile;
use crate::error::AppError;

/// Window and pump settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    /// Raw Input buffer drain period (buffered variant).
    pub timer_interval_ms: u32,
    /// The size `GetRawInputBuffer` reports is for a single block; the drain
    /// buffer is this many times larger (buffered variant).
    pub buffer_multiplier: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Joystick using Raw Input API".into(),
            timer_interval_ms: 16,
            buffer_multiplier: 16,
        }
    }
}

/// Log verbosity. Mirrors `log::LevelFilter` with serde names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Log every decoded state as a JSON line at debug level.
    pub dump_state: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: if cfg!(feature = "debug-log") {
                LogLevel::Debug
            } else {
                LogLevel::Info
            },
            dump_state: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub window: WindowConfig,
    pub axes: AxisProfile,
    pub log: LogConfig,
}

/// Partial config as written on disk; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    window: Option<toml::Table>,
    axes: Option<toml::Table>,
    log: Option<toml::Table>,
}

impl Config {
    /// Defaults for the timer-polled variant (8-bit axes, Z/Rz).
    pub fn buffered() -> Self {
        Self {
            axes: AxisProfile::BUFFERED,
            ..Self::default()
        }
    }

    /// Defaults for the per-message variant (16-bit axes, Rx/Ry).
    pub fn messaged() -> Self {
        Self {
            axes: AxisProfile::MESSAGED,
            ..Self::default()
        }
    }

    /// Apply the keys present in `text` on top of `self`.
    pub fn merge_toml(mut self, text: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(text)?;
        if let Some(t) = file.window {
            self.window = overlay(&self.window, t)?;
        }
        if let Some(t) = file.axes {
            self.axes = overlay(&self.axes, t)?;
        }
        if let Some(t) = file.log {
            self.log = overlay(&self.log, t)?;
        }
        Ok(self)
    }

    /// Load `path` on top of `base`. `None` or a missing file returns `base`
    /// unchanged.
    pub fn load(base: Config, path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(base);
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(base),
            Err(source) => {
                return Err(AppError::ConfigIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        base.merge_toml(&text).map_err(|source| AppError::ConfigParse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Re-deserialise `base` with the keys from `patch` replacing its own.
fn overlay<T>(base: &T, patch: toml::Table) -> Result<T, toml::de::Error>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let mut table = toml::Table::try_from(base).map_err(|e| {
        <toml::de::Error as serde::de::Error>::custom(e.to_string())
    })?;
    for (k, v) in patch {
        table.insert(k, v);
    }
    T::deserialize(toml::Value::Table(table))
}
