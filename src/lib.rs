//! Raw Input joystick viewers.
//!
//! Two Win32 programs share this library: `raw_input_buffered` drains the Raw
//! Input buffer on a timer, `raw_input_messaged` handles one `WM_INPUT` at a
//! time. Both decode HID joystick reports into a [`JoystickState`] and draw it.

pub mod backends;
pub mod config;
pub mod decode;
pub mod error;
pub mod layout;
pub mod logging;
pub mod metadata;
pub mod state;

pub use config::Config;
pub use decode::{decode_report, AxisProfile, AxisScale, HidpSource, SecondStick};
pub use error::{AppError, DecodeError};
pub use state::JoystickState;
