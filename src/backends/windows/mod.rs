#![cfg(target_os = "windows")]

//! Windows Raw Input backend.
//!
//! - **`raw_input`**: registration, `WM_INPUT` copies, buffer drains
//! - **`hidp`**: HID parser access through preparsed data
//! - **`discovery`**: `hidapi` lookups for device names
//! - **`window`**: window shell, GDI painter and message loop
//! - **`buffered`** / **`messaged`**: the two pump strategies

pub mod buffered;
pub mod discovery;
pub mod hidp;
pub mod messaged;
pub mod raw_input;
pub mod window;
