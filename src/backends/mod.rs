//! Input backends.
//!
//! [`packet`] is platform independent. The Win32 side lives in `windows` and is
//! only compiled there; elsewhere the entry points report
//! [`AppError::Unsupported`].

use crate::config::Config;
use crate::error::AppError;

pub mod packet;

#[cfg(target_os = "windows")]
pub mod windows;

/// Run the timer-drained viewer. Returns the process exit code.
pub fn run_buffered(cfg: &Config) -> Result<i32, AppError> {
    #[cfg(target_os = "windows")]
    {
        windows::buffered::run(cfg)
    }
    #[cfg(not(target_os = "windows"))]
    {
        let _ = cfg;
        Err(AppError::Unsupported)
    }
}

/// Run the per-message viewer. Returns the process exit code.
pub fn run_messaged(cfg: &Config) -> Result<i32, AppError> {
    #[cfg(target_os = "windows")]
    {
        windows::messaged::run(cfg)
    }
    #[cfg(not(target_os = "windows"))]
    {
        let _ = cfg;
        Err(AppError::Unsupported)
    }
}

/// Process exit status for a `WM_QUIT` code. Codes that do not fit a byte
/// map to 1 rather than being truncated.
pub fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
