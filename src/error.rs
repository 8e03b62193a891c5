//! Error types.
//!
//! Decoding is best-effort: a [`DecodeError`] aborts one report and is logged,
//! nothing more. [`AppError`] covers startup failures that end the program.

use thiserror::Error;

/// Why a single HID report could not be decoded.
///
/// `status` values are the raw `NTSTATUS` returned by the HID parser, or the
/// Win32 error code where the failing call is a Raw Input query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("report carries no HID payload")]
    EmptyReport,

    #[error("preparsed data query failed (code {code})")]
    PreparsedData { code: u32 },

    #[error("HidP_GetCaps failed (status 0x{status:08x})")]
    Caps { status: i32 },

    #[error("HidP_GetButtonCaps failed (status 0x{status:08x})")]
    ButtonCaps { status: i32 },

    #[error("HidP_GetValueCaps failed (status 0x{status:08x})")]
    ValueCaps { status: i32 },

    #[error("HidP_GetUsages failed on page 0x{usage_page:02x} (status 0x{status:08x})")]
    Usages { usage_page: u16, status: i32 },

    #[error("HidP_GetUsageValue failed for 0x{usage_page:02x}/0x{usage:02x} (status 0x{status:08x})")]
    UsageValue {
        usage_page: u16,
        usage: u16,
        status: i32,
    },
}

/// Startup and shell failures.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{what} failed (Win32 error {code})")]
    Register { what: &'static str, code: u32 },

    #[error("SetTimer failed (Win32 error {code})")]
    Timer { code: u32 },

    #[error("logger initialisation failed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("this program requires Windows Raw Input")]
    Unsupported,
}
