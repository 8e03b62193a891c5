//! Buffered viewer: Raw Input is left queued and drained on a timer.
//!
//! The helper window never sees its `WM_INPUT` dispatched; the main loop only
//! retrieves messages for the main window, so input stays in the Raw Input
//! queue until [`tick`] pulls it out with `GetRawInputBuffer`.

#![cfg(target_os = "windows")]

use windows_sys::Win32::Foundation::{GetLastError, HWND};
use windows_sys::Win32::UI::WindowsAndMessaging::{KillTimer, SetTimer};

use crate::backends::windows::{raw_input, window};
use crate::config::Config;
use crate::error::AppError;

const DRAIN_TIMER_ID: usize = 1;

unsafe extern "system" fn tick(_hwnd: HWND, _msg: u32, _id: usize, _time: u32) {
    let Some(multiplier) = window::with_viewer(|v| v.buffer_multiplier) else {
        return;
    };

    let mut dirty = false;
    let blocks = raw_input::drain_buffer(multiplier, |p| {
        dirty |= window::apply_packet(p);
    });
    if blocks > 0 {
        log::trace!("drained {blocks} HID block(s)");
    }
    if dirty {
        window::repaint();
    }
}

/// Run the buffered viewer until its window closes. Returns the exit code.
pub fn run(cfg: &Config) -> Result<i32, AppError> {
    window::install(cfg);

    let helper = window::create_helper_window(None)?;
    raw_input::register_joysticks(helper, false)?;
    let main = window::create_main_window(&cfg.window.title)?;

    let timer = unsafe { SetTimer(main, DRAIN_TIMER_ID, cfg.window.timer_interval_ms, Some(tick)) };
    if timer == 0 {
        return Err(AppError::Timer {
            code: unsafe { GetLastError() },
        });
    }
    log::info!(
        "buffered viewer running: drain every {} ms, buffer x{}",
        cfg.window.timer_interval_ms,
        cfg.window.buffer_multiplier
    );

    let code = window::message_loop(main);
    unsafe {
        KillTimer(main, timer);
    }
    Ok(code)
}
