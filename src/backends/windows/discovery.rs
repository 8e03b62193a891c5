//! Joystick/gamepad discovery via `hidapi`.
//!
//! Raw Input tells us *that* a device arrived and its interface path; the HID
//! stack knows its product string. [`Discovery`] keeps one `HidApi` instance
//! around to answer "what is this path" for arrival logs, and lists the
//! joysticks already present at startup.
//!
//! Discovery never gates input: a device that `hidapi` cannot see is still
//! decoded, it just gets logged with less detail.

#![cfg(target_os = "windows")]

use hidapi::{DeviceInfo, HidApi};

use crate::backends::windows::raw_input::{USAGE_GAMEPAD, USAGE_JOYSTICK};
use crate::decode::USAGE_PAGE_GENERIC_DESKTOP;
use crate::metadata::{same_interface_path, DeviceMeta};

/// Whether a `hidapi` entry is a top-level joystick or gamepad collection.
fn is_joystick(info: &DeviceInfo) -> bool {
    info.usage_page() == USAGE_PAGE_GENERIC_DESKTOP
        && matches!(info.usage(), USAGE_JOYSTICK | USAGE_GAMEPAD)
}

fn meta(info: &DeviceInfo) -> DeviceMeta {
    DeviceMeta {
        handle: String::new(),
        path: Some(info.path().to_string_lossy().to_string()),
        vid: Some(info.vendor_id()),
        pid: Some(info.product_id()),
        product_string: info.product_string().map(|s| s.to_string()),
        usage_page: Some(info.usage_page()),
        usage: Some(info.usage()),
    }
}

pub struct Discovery {
    api: Option<HidApi>,
}

impl Discovery {
    pub fn new() -> Self {
        let api = match HidApi::new() {
            Ok(api) => Some(api),
            Err(e) => {
                log::warn!("hidapi unavailable, device names will be limited: {e}");
                None
            }
        };
        Self { api }
    }

    /// Joystick/gamepad interfaces currently known to the HID stack.
    pub fn joysticks(&self) -> Vec<DeviceMeta> {
        let Some(api) = &self.api else {
            return Vec::new();
        };
        api.device_list().filter(|i| is_joystick(i)).map(meta).collect()
    }

    /// Log every joystick/gamepad present right now.
    pub fn log_present(&self) {
        let found = self.joysticks();
        log::info!("{} joystick/gamepad interface(s) present", found.len());
        for m in &found {
            log::info!(
                "  {} up=0x{:02x} u=0x{:02x} path={}",
                m.label(),
                m.usage_page.unwrap_or(0),
                m.usage.unwrap_or(0),
                m.path.as_deref().unwrap_or("")
            );
        }
    }

    /// Fill in `vid`/`pid`/`product_string` for `meta` from the HID stack,
    /// matching on the interface path. Refreshes the device list first so
    /// freshly attached devices are found.
    pub fn enrich(&mut self, meta: &mut DeviceMeta) {
        let Some(api) = self.api.as_mut() else {
            return;
        };
        if let Err(e) = api.refresh_devices() {
            log::debug!("hidapi refresh failed: {e}");
        }
        let Some(path) = meta.path.as_deref() else {
            return;
        };
        let hit = api
            .device_list()
            .find(|i| same_interface_path(&i.path().to_string_lossy(), path));
        if let Some(info) = hit {
            meta.vid = Some(info.vendor_id());
            meta.pid = Some(info.product_id());
            meta.product_string = info.product_string().map(|s| s.to_string());
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}
