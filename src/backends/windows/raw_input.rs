//! Windows Raw Input plumbing for joysticks and gamepads.
//!
//! This module only moves bytes: it registers for HID joystick/gamepad input,
//! copies `WM_INPUT` payloads, drains the Raw Input buffer and answers device
//! info queries. Parsing of the copied bytes lives in
//! [`packet`](crate::backends::packet); decoding of the HID report in
//! [`decode`](crate::decode).
//!
//! ## Conventions
//! - Registration targets the message-only helper window, with
//!   `RIDEV_INPUTSINK` so input keeps flowing while the viewer is in the
//!   background.
//! - Buffered reads use a pointer-aligned buffer; block pointers handed back to
//!   `DefRawInputProc` are computed from the same alignment rules the parser
//!   uses.

#![cfg(target_os = "windows")]

use core::ffi::c_void;
use core::mem::size_of;

use windows_sys::Win32::Foundation::{GetLastError, HANDLE, HWND};
use windows_sys::Win32::UI::Input::*;

use crate::backends::packet::{self, HidPacket};
use crate::decode::USAGE_PAGE_GENERIC_DESKTOP;
use crate::error::AppError;
use crate::metadata::DeviceMeta;

/// Generic Desktop: Joystick.
pub const USAGE_JOYSTICK: u16 = 0x04;
/// Generic Desktop: Gamepad (e.g. Xbox 360 / Xbox One controllers).
pub const USAGE_GAMEPAD: u16 = 0x05;

const HEADER_SIZE: u32 = size_of::<RAWINPUTHEADER>() as u32;

/// Register joystick and gamepad Raw Input for `target`.
///
/// `notify` adds `RIDEV_DEVNOTIFY` so `target` also receives
/// `WM_INPUT_DEVICE_CHANGE`.
pub fn register_joysticks(target: HWND, notify: bool) -> Result<(), AppError> {
    let mut flags = RIDEV_INPUTSINK;
    if notify {
        flags |= RIDEV_DEVNOTIFY;
    }
    let devices = [USAGE_JOYSTICK, USAGE_GAMEPAD].map(|usage| RAWINPUTDEVICE {
        usUsagePage: USAGE_PAGE_GENERIC_DESKTOP,
        usUsage: usage,
        dwFlags: flags,
        hwndTarget: target,
    });

    let ok = unsafe {
        RegisterRawInputDevices(
            devices.as_ptr(),
            devices.len() as u32,
            size_of::<RAWINPUTDEVICE>() as u32,
        )
    };
    if ok == 0 {
        return Err(AppError::Register {
            what: "RegisterRawInputDevices",
            code: unsafe { GetLastError() },
        });
    }
    log::debug!("registered joystick/gamepad raw input (devnotify={notify})");
    Ok(())
}

/// Copy the `RAWINPUT` payload behind a `WM_INPUT` lparam.
pub fn read_wm_input(lparam: isize) -> Option<Vec<u8>> {
    unsafe {
        let mut size: u32 = 0;
        let r0 = GetRawInputData(
            lparam as HRAWINPUT,
            RID_INPUT,
            core::ptr::null_mut(),
            &mut size,
            HEADER_SIZE,
        );
        if r0 == u32::MAX || size == 0 {
            return None;
        }

        let mut buf = vec![0u8; size as usize];
        let r1 = GetRawInputData(
            lparam as HRAWINPUT,
            RID_INPUT,
            buf.as_mut_ptr() as *mut c_void,
            &mut size,
            HEADER_SIZE,
        );
        if r1 == u32::MAX {
            return None;
        }
        buf.truncate(r1 as usize);
        Some(buf)
    }
}

/// Drain every queued Raw Input block of the calling thread.
///
/// Calls `on_packet` for each HID block, then returns the batch to
/// `DefRawInputProc`. `multiplier` scales the single-block size the OS reports
/// into the buffer actually allocated. Returns the number of HID blocks seen.
pub fn drain_buffer(multiplier: u32, mut on_packet: impl FnMut(&HidPacket<'_>)) -> usize {
    let mut cb_size: u32 = 0;
    let r0 = unsafe { GetRawInputBuffer(core::ptr::null_mut(), &mut cb_size, HEADER_SIZE) };
    if r0 != 0 {
        log::warn!("GetRawInputBuffer size query failed ({})", unsafe {
            GetLastError()
        });
        return 0;
    }
    if cb_size == 0 {
        return 0;
    }

    let capacity = cb_size as usize * multiplier.max(1) as usize;
    // u64 backing: blocks must be pointer aligned.
    let mut buf = vec![0u64; capacity.div_ceil(8)];
    let base = buf.as_mut_ptr() as *mut u8;
    let mut seen = 0;

    loop {
        let mut cb = (buf.len() * 8) as u32;
        let n = unsafe { GetRawInputBuffer(base as *mut RAWINPUT, &mut cb, HEADER_SIZE) };
        if n == 0 {
            break;
        }
        if n == u32::MAX {
            log::warn!("GetRawInputBuffer failed ({})", unsafe { GetLastError() });
            break;
        }

        let bytes = unsafe { core::slice::from_raw_parts(base as *const u8, buf.len() * 8) };
        let offsets = packet::block_offsets(bytes, n as usize);
        for &at in &offsets {
            if let Some(p) = packet::parse_block(&bytes[at..]) {
                seen += 1;
                on_packet(&p);
            }
        }

        let blocks: Vec<*const RAWINPUT> = offsets
            .iter()
            .map(|&at| unsafe { base.add(at) as *const RAWINPUT })
            .collect();
        unsafe {
            DefRawInputProc(blocks.as_ptr(), blocks.len() as i32, HEADER_SIZE);
        }
    }

    seen
}

/// Element count `GetRawInputDeviceInfoW` wants for `command` (bytes for
/// blobs, WCHARs for the name).
fn info_len(hdev: HANDLE, command: RAW_INPUT_DEVICE_INFO_COMMAND) -> Option<u32> {
    let mut len: u32 = 0;
    let r = unsafe { GetRawInputDeviceInfoW(hdev, command, core::ptr::null_mut(), &mut len) };
    (r == 0 && len > 0).then_some(len)
}

/// Interface path of a Raw Input device, e.g. `\\?\HID#VID_045E&PID_028E#...`.
pub fn device_name(hdev: HANDLE) -> Option<String> {
    let mut len = info_len(hdev, RIDI_DEVICENAME)?;
    let mut name = vec![0u16; len as usize];
    let copied = unsafe {
        GetRawInputDeviceInfoW(hdev, RIDI_DEVICENAME, name.as_mut_ptr().cast(), &mut len)
    };
    if copied == u32::MAX {
        return None;
    }
    let end = name.iter().position(|&c| c == 0).unwrap_or(name.len());
    Some(String::from_utf16_lossy(&name[..end]))
}

/// Describe a Raw Input device from what Raw Input itself knows
/// (`RIDI_DEVICENAME` + `RIDI_DEVICEINFO`).
pub fn describe(hdev: HANDLE) -> DeviceMeta {
    let mut meta = DeviceMeta {
        handle: format!("{:#010x}", hdev as usize),
        path: device_name(hdev),
        ..Default::default()
    };

    unsafe {
        let mut info: RID_DEVICE_INFO = core::mem::zeroed();
        info.cbSize = size_of::<RID_DEVICE_INFO>() as u32;
        let mut size = info.cbSize;
        let r = GetRawInputDeviceInfoW(
            hdev,
            RIDI_DEVICEINFO,
            &mut info as *mut RID_DEVICE_INFO as *mut c_void,
            &mut size,
        );
        if r != u32::MAX && info.dwType == RIM_TYPEHID {
            let hid = info.Anonymous.hid;
            meta.vid = Some(hid.dwVendorId as u16);
            meta.pid = Some(hid.dwProductId as u16);
            meta.usage_page = Some(hid.usUsagePage);
            meta.usage = Some(hid.usUsage);
        }
    }

    meta
}
