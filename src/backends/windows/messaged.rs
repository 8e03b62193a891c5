//! Messaged viewer: every report arrives as its own `WM_INPUT`.
//!
//! The helper window procedure copies the payload, decodes it and invalidates
//! the main window. With `RIDEV_DEVNOTIFY` it also receives
//! `WM_INPUT_DEVICE_CHANGE`, which is only logged.

#![cfg(target_os = "windows")]

use std::cell::RefCell;

use windows_sys::Win32::Foundation::{HANDLE, HWND, LPARAM, LRESULT, WPARAM};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    DefWindowProcW, GIDC_ARRIVAL, GIDC_REMOVAL, WM_INPUT, WM_INPUT_DEVICE_CHANGE,
};

use crate::backends::packet;
use crate::backends::windows::discovery::Discovery;
use crate::backends::windows::{raw_input, window};
use crate::config::Config;
use crate::error::AppError;

thread_local! {
    static DISCOVERY: RefCell<Option<Discovery>> = const { RefCell::new(None) };
}

fn on_input(lparam: LPARAM) {
    let Some(buf) = raw_input::read_wm_input(lparam) else {
        log::debug!("GetRawInputData failed");
        return;
    };
    let Some(p) = packet::parse_block(&buf) else {
        return;
    };
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("HID {}", packet::hex(p.data));
    }
    if window::apply_packet(&p) {
        window::repaint();
    }
}

fn on_device_change(kind: u32, device: HANDLE) {
    match kind {
        GIDC_ARRIVAL => {
            let mut meta = raw_input::describe(device);
            DISCOVERY.with(|d| {
                if let Some(d) = d.borrow_mut().as_mut() {
                    d.enrich(&mut meta);
                }
            });
            log::info!("Device {}: Added ({})", meta.handle, meta.label());
            log::debug!(
                "  path={}",
                meta.path.as_deref().unwrap_or("<unknown>")
            );
        }
        GIDC_REMOVAL => log::info!("Device {:#010x}: Removed", device as usize),
        other => log::debug!("Device {:#010x}: change {other}", device as usize),
    }
}

unsafe extern "system" fn helper_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_INPUT => {
            on_input(lparam);
            // Lets the system clean up the input.
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_INPUT_DEVICE_CHANGE => {
            on_device_change(wparam as u32, lparam as HANDLE);
            0
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Run the messaged viewer until its window closes. Returns the exit code.
pub fn run(cfg: &Config) -> Result<i32, AppError> {
    window::install(cfg);

    let discovery = Discovery::new();
    discovery.log_present();
    DISCOVERY.with(|d| *d.borrow_mut() = Some(discovery));

    let helper = window::create_helper_window(Some(helper_wnd_proc))?;
    raw_input::register_joysticks(helper, true)?;
    window::create_main_window(&cfg.window.title)?;

    log::info!("messaged viewer running");
    Ok(window::message_loop(core::ptr::null_mut()))
}
