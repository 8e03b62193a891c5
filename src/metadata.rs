//! Device metadata for arrival logs.
//!
//! [`DeviceMeta`] is a lightweight, serialisable description of a Raw Input
//! device. Backends populate what they know; unknown fields remain `None`.
//!
//! # Conventions
//! - `handle` is the Raw Input device handle formatted as hex. It is only
//!   valid while the device stays attached.
//! - `path` is the device interface path reported by Raw Input
//!   (`RIDI_DEVICENAME`). Treat it as opaque.
//! - `vid`, `pid` and `product_string` come from `hidapi` when the path
//!   matches one of its enumerated interfaces.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    pub handle: String,

    pub path: Option<String>,

    /// USB Vendor ID (VID), if known.
    pub vid: Option<u16>,

    /// USB Product ID (PID), if known.
    pub pid: Option<u16>,

    /// Human-readable product name from the driver/firmware.
    pub product_string: Option<String>,

    /// HID Usage Page of the top-level collection (`0x01` Generic Desktop).
    pub usage_page: Option<u16>,

    /// HID Usage (`0x04` Joystick, `0x05` Gamepad).
    pub usage: Option<u16>,
}

impl DeviceMeta {
    /// Short single-line label: product name if known, otherwise VID:PID,
    /// otherwise the handle.
    pub fn label(&self) -> String {
        match (&self.product_string, self.vid, self.pid) {
            (Some(p), _, _) if !p.is_empty() => p.clone(),
            (_, Some(v), Some(p)) => format!("{v:04x}:{p:04x}"),
            _ => self.handle.clone(),
        }
    }
}

/// Compare two device interface paths. Raw Input and the HID stack agree on
/// the path but not always on its case.
pub fn same_interface_path(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_product_then_ids() {
        let mut m = DeviceMeta {
            handle: "0x1a2b".into(),
            ..Default::default()
        };
        assert_eq!(m.label(), "0x1a2b");
        m.vid = Some(0x045e);
        m.pid = Some(0x028e);
        assert_eq!(m.label(), "045e:028e");
        m.product_string = Some("Controller (XBOX 360 For Windows)".into());
        assert_eq!(m.label(), "Controller (XBOX 360 For Windows)");
    }

    #[test]
    fn interface_paths_compare_case_insensitively() {
        assert!(same_interface_path(
            r"\\?\HID#VID_045E&PID_028E&IG_00#7&1a2b&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}",
            r"\\?\hid#vid_045e&pid_028e&ig_00#7&1a2b&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}",
        ));
        assert!(!same_interface_path(r"\\?\HID#VID_1", r"\\?\HID#VID_2"));
    }

    #[test]
    fn serializes_for_logs() {
        let m = DeviceMeta {
            handle: "0x10".into(),
            usage_page: Some(1),
            usage: Some(4),
            ..Default::default()
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["usage"], 4);
        assert!(v["product_string"].is_null());
    }
}
