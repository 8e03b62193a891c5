//! HID report decoding.
//!
//! [`decode_report`] turns one raw input report into a [`JoystickState`]. It is
//! a single linear pass over the OS HID parser:
//!
//! 1. global caps → how many input button / value caps the device has
//! 2. button caps → the **first** cap fixes the button page and usage range
//! 3. value caps
//! 4. pressed usages on the button page → button flags (offset by `UsageMin`)
//! 5. one usage value per value cap → axes and hat via the [`AxisProfile`]
//!
//! Any failing call aborts the whole decode; the caller keeps its previous
//! state. The OS parser sits behind [`HidpSource`] so the routine runs against
//! a scripted source in tests; on Windows it is backed by the preparsed blob
//! (see `backends::windows::hidp`).

use serde::{Deserialize, Serialize};

use crate::backends::packet::HidPacket;
use crate::error::DecodeError;
use crate::state::JoystickState;

/// Generic Desktop usage page.
pub const USAGE_PAGE_GENERIC_DESKTOP: u16 = 0x01;

pub const USAGE_X: u16 = 0x30;
pub const USAGE_Y: u16 = 0x31;
pub const USAGE_Z: u16 = 0x32;
pub const USAGE_RX: u16 = 0x33;
pub const USAGE_RY: u16 = 0x34;
pub const USAGE_RZ: u16 = 0x35;
pub const USAGE_HAT_SWITCH: u16 = 0x39;

/// Global input capability counts (`HIDP_CAPS` subset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportCaps {
    pub input_button_caps: u16,
    pub input_value_caps: u16,
}

/// One input button capability. A non-range cap has `usage_min == usage_max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonCaps {
    pub usage_page: u16,
    pub usage_min: u16,
    pub usage_max: u16,
}

impl ButtonCaps {
    /// Number of usages covered by the cap; an inverted range counts as none.
    pub fn len(&self) -> usize {
        if self.usage_max < self.usage_min {
            0
        } else {
            (self.usage_max - self.usage_min) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One input value capability (axis, slider, hat, ...). Range caps are
/// reported by their first usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueCaps {
    pub usage_page: u16,
    pub usage: u16,
    pub bit_size: u16,
    pub logical_min: i32,
    pub logical_max: i32,
}

/// Access to the OS HID parser for one device.
///
/// `report` is the HID payload as delivered by Raw Input (report ID byte
/// first). Implementations must not write through it.
pub trait HidpSource {
    fn caps(&self) -> Result<ReportCaps, DecodeError>;
    fn button_caps(&self, count: u16) -> Result<Vec<ButtonCaps>, DecodeError>;
    fn value_caps(&self, count: u16) -> Result<Vec<ValueCaps>, DecodeError>;
    /// Usages currently "on" for `usage_page`, at most `max_len` of them.
    fn usages(
        &self,
        usage_page: u16,
        max_len: usize,
        report: &[u8],
    ) -> Result<Vec<u16>, DecodeError>;
    /// Raw (unscaled) value of a single usage.
    fn usage_value(&self, usage_page: u16, usage: u16, report: &[u8]) -> Result<u32, DecodeError>;
}

/// How raw axis values are brought to the signed `-128..=127` range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    /// 8-bit axes: `value - 128`.
    #[default]
    Byte,
    /// 16-bit axes: `(value - 32768) / 256`.
    Word,
    /// Use the cap's logical range.
    Logical,
}

impl AxisScale {
    pub fn apply(self, raw: u32, caps: &ValueCaps) -> i32 {
        match self {
            AxisScale::Byte => (raw as i32).wrapping_sub(128),
            AxisScale::Word => ((raw as i64 - 32768) / 256) as i32,
            AxisScale::Logical => scale_logical(raw, caps),
        }
    }
}

fn scale_logical(raw: u32, caps: &ValueCaps) -> i32 {
    let lo = caps.logical_min as i64;
    let hi = caps.logical_max as i64;
    if hi <= lo {
        return 0;
    }
    let v = if lo < 0 {
        sign_extend(raw, caps.bit_size)
    } else {
        raw as i64
    };
    let v = v.clamp(lo, hi);
    ((v - lo) * 255 / (hi - lo) - 128) as i32
}

fn sign_extend(raw: u32, bits: u16) -> i64 {
    if bits == 0 || bits >= 32 {
        return raw as i32 as i64;
    }
    let shift = 32 - bits as u32;
    (((raw << shift) as i32) >> shift) as i64
}

/// Which Generic Desktop usages feed the second crosshair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondStick {
    /// Z (0x32) and Rz (0x35).
    #[default]
    ZRz,
    /// Rx (0x33) and Ry (0x34).
    RxRy,
}

impl SecondStick {
    fn usages(self) -> (u16, u16) {
        match self {
            SecondStick::ZRz => (USAGE_Z, USAGE_RZ),
            SecondStick::RxRy => (USAGE_RX, USAGE_RY),
        }
    }
}

/// Axis assignment and scaling used by [`decode_report`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AxisProfile {
    pub scale: AxisScale,
    pub second_stick: SecondStick,
}

impl AxisProfile {
    /// 8-bit sticks with Z/Rz on the second crosshair.
    pub const BUFFERED: AxisProfile = AxisProfile {
        scale: AxisScale::Byte,
        second_stick: SecondStick::ZRz,
    };

    /// 16-bit sticks with Rx/Ry on the second crosshair (XInput-style pads).
    pub const MESSAGED: AxisProfile = AxisProfile {
        scale: AxisScale::Word,
        second_stick: SecondStick::RxRy,
    };
}

/// Decode one HID input report.
///
/// Returns the complete new state. On error nothing is returned, so the
/// caller's previous state stays as it was.
pub fn decode_report<S: HidpSource + ?Sized>(
    source: &S,
    report: &[u8],
    profile: AxisProfile,
) -> Result<JoystickState, DecodeError> {
    if report.is_empty() {
        return Err(DecodeError::EmptyReport);
    }

    let caps = source.caps()?;
    let button_caps = source.button_caps(caps.input_button_caps)?;
    let value_caps = source.value_caps(caps.input_value_caps)?;

    let mut state = JoystickState::default();

    // ----- BUTTONS -----
    if let Some(first) = button_caps.first() {
        state.set_button_count(first.len());
        let pressed = source.usages(first.usage_page, state.button_count(), report)?;
        for usage in pressed {
            let Some(idx) = usage.checked_sub(first.usage_min) else {
                continue;
            };
            if !state.press(idx as usize) {
                log::trace!("usage 0x{usage:02x} outside button range, ignored");
            }
        }
    }

    // ----- VALUES (axes + hat) -----
    let (second_h, second_v) = profile.second_stick.usages();
    for vc in &value_caps {
        let usage = vc.usage;
        let raw = source.usage_value(vc.usage_page, usage, report)?;
        if vc.usage_page != USAGE_PAGE_GENERIC_DESKTOP {
            continue;
        }
        match usage {
            USAGE_X => state.x = profile.scale.apply(raw, vc),
            USAGE_Y => state.y = profile.scale.apply(raw, vc),
            u if u == second_h => state.z = profile.scale.apply(raw, vc),
            u if u == second_v => state.rz = profile.scale.apply(raw, vc),
            USAGE_HAT_SWITCH => state.hat = raw as i32,
            _ => {}
        }
    }

    Ok(state)
}

/// Decode every report batched in `packet`, oldest first.
///
/// Returns the state of the last report that decoded; `None` if none did, in
/// which case the caller keeps what it has.
pub fn decode_packet<S: HidpSource + ?Sized>(
    source: &S,
    packet: &HidPacket<'_>,
    profile: AxisProfile,
) -> Option<JoystickState> {
    let mut latest = None;
    for report in packet.reports() {
        match decode_report(source, report, profile) {
            Ok(state) => latest = Some(state),
            Err(e) => log::debug!("device {:#010x}: decode aborted: {e}", packet.device),
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Step {
        Caps,
        ButtonCaps,
        ValueCaps,
        Usages,
    }

    /// Scripted HID parser: fixed caps, fixed pressed usages, fixed values.
    #[derive(Default)]
    struct FakeSource {
        buttons: Vec<ButtonCaps>,
        values: Vec<ValueCaps>,
        pressed: Vec<u16>,
        readings: HashMap<(u16, u16), u32>,
        fail_usage: Option<u16>,
        fail_at: Option<Step>,
        /// Reports starting with this byte fail their X query.
        bad_report: Option<u8>,
        usages_max_len: RefCell<Option<usize>>,
    }

    impl HidpSource for FakeSource {
        fn caps(&self) -> Result<ReportCaps, DecodeError> {
            if self.fail_at == Some(Step::Caps) {
                return Err(DecodeError::Caps { status: -1 });
            }
            Ok(ReportCaps {
                input_button_caps: self.buttons.len() as u16,
                input_value_caps: self.values.len() as u16,
            })
        }

        fn button_caps(&self, count: u16) -> Result<Vec<ButtonCaps>, DecodeError> {
            if self.fail_at == Some(Step::ButtonCaps) {
                return Err(DecodeError::ButtonCaps { status: -3 });
            }
            Ok(self.buttons.iter().take(count as usize).copied().collect())
        }

        fn value_caps(&self, count: u16) -> Result<Vec<ValueCaps>, DecodeError> {
            if self.fail_at == Some(Step::ValueCaps) {
                return Err(DecodeError::ValueCaps { status: -4 });
            }
            Ok(self.values.iter().take(count as usize).copied().collect())
        }

        fn usages(
            &self,
            page: u16,
            max_len: usize,
            _report: &[u8],
        ) -> Result<Vec<u16>, DecodeError> {
            if self.fail_at == Some(Step::Usages) {
                return Err(DecodeError::Usages {
                    usage_page: page,
                    status: -5,
                });
            }
            *self.usages_max_len.borrow_mut() = Some(max_len);
            Ok(self.pressed.iter().take(max_len).copied().collect())
        }

        fn usage_value(&self, page: u16, usage: u16, report: &[u8]) -> Result<u32, DecodeError> {
            let bad = usage == USAGE_X
                && self
                    .bad_report
                    .is_some_and(|marker| report.first() == Some(&marker));
            if self.fail_usage == Some(usage) || bad {
                return Err(DecodeError::UsageValue {
                    usage_page: page,
                    usage,
                    status: -2,
                });
            }
            if usage == USAGE_X && self.bad_report.is_some() {
                // X follows the second report byte so batched reports differ.
                return Ok(report.get(1).copied().unwrap_or(0) as u32);
            }
            Ok(self.readings.get(&(page, usage)).copied().unwrap_or(0))
        }
    }

    fn buttons(min: u16, max: u16) -> ButtonCaps {
        ButtonCaps {
            usage_page: 0x09,
            usage_min: min,
            usage_max: max,
        }
    }

    fn value(usage: u16, bits: u16, lo: i32, hi: i32) -> ValueCaps {
        ValueCaps {
            usage_page: USAGE_PAGE_GENERIC_DESKTOP,
            usage,
            bit_size: bits,
            logical_min: lo,
            logical_max: hi,
        }
    }

    fn gamepad() -> FakeSource {
        let mut src = FakeSource {
            buttons: vec![buttons(1, 12)],
            values: vec![
                value(USAGE_X, 8, 0, 255),
                value(USAGE_Y, 8, 0, 255),
                value(USAGE_Z, 8, 0, 255),
                value(USAGE_RZ, 8, 0, 255),
                value(USAGE_HAT_SWITCH, 4, 0, 7),
            ],
            pressed: vec![1, 5, 12],
            ..Default::default()
        };
        src.readings.insert((1, USAGE_X), 0);
        src.readings.insert((1, USAGE_Y), 255);
        src.readings.insert((1, USAGE_Z), 128);
        src.readings.insert((1, USAGE_RZ), 100);
        src.readings.insert((1, USAGE_HAT_SWITCH), 6);
        src
    }

    #[test]
    fn decodes_buttons_offset_by_usage_min() {
        let src = gamepad();
        let s = decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED).unwrap();
        assert_eq!(s.button_count(), 12);
        assert_eq!(s.pressed().collect::<Vec<_>>(), vec![0, 4, 11]);
        assert_eq!(*src.usages_max_len.borrow(), Some(12));
    }

    #[test]
    fn byte_scale_and_z_rz_mapping() {
        let s = decode_report(&gamepad(), &[0u8; 8], AxisProfile::BUFFERED).unwrap();
        assert_eq!((s.x, s.y, s.z, s.rz), (-128, 127, 0, -28));
        assert_eq!(s.hat, 6);
    }

    #[test]
    fn word_scale_and_rx_ry_mapping() {
        let mut src = FakeSource {
            buttons: vec![buttons(1, 10)],
            values: vec![
                value(USAGE_X, 16, 0, 65535),
                value(USAGE_Y, 16, 0, 65535),
                value(USAGE_RX, 16, 0, 65535),
                value(USAGE_RY, 16, 0, 65535),
                value(USAGE_Z, 16, 0, 65535),
            ],
            ..Default::default()
        };
        src.readings.insert((1, USAGE_X), 0);
        src.readings.insert((1, USAGE_Y), 65535);
        src.readings.insert((1, USAGE_RX), 32768);
        src.readings.insert((1, USAGE_RY), 31900);
        // Trigger axis is read but not drawn under this profile.
        src.readings.insert((1, USAGE_Z), 1);

        let s = decode_report(&src, &[0u8; 16], AxisProfile::MESSAGED).unwrap();
        assert_eq!(s.x, -128);
        assert_eq!(s.y, 127);
        assert_eq!(s.z, 0);
        // (31900 - 32768) / 256 truncates toward zero.
        assert_eq!(s.rz, -3);
    }

    #[test]
    fn logical_scale_handles_signed_ranges() {
        let caps = value(USAGE_X, 8, -127, 127);
        assert_eq!(AxisScale::Logical.apply(0x81, &caps), -128); // -127
        assert_eq!(AxisScale::Logical.apply(0x7f, &caps), 127);
        assert_eq!(AxisScale::Logical.apply(0, &caps), -1);

        let wide = value(USAGE_X, 10, 0, 1023);
        assert_eq!(AxisScale::Logical.apply(0, &wide), -128);
        assert_eq!(AxisScale::Logical.apply(1023, &wide), 127);

        let flat = value(USAGE_X, 8, 5, 5);
        assert_eq!(AxisScale::Logical.apply(5, &flat), 0);
    }

    #[test]
    fn usages_outside_range_are_ignored() {
        let mut src = gamepad();
        src.buttons = vec![buttons(3, 200)];
        src.pressed = vec![2, 3, 130, 131];
        let s = decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED).unwrap();
        assert_eq!(s.button_count(), crate::state::MAX_BUTTONS);
        assert_eq!(s.pressed().collect::<Vec<_>>(), vec![0, 127]);
    }

    #[test]
    fn only_first_button_cap_counts() {
        let mut src = gamepad();
        src.buttons = vec![buttons(1, 4), buttons(5, 32)];
        src.pressed = vec![2];
        let s = decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED).unwrap();
        assert_eq!(s.button_count(), 4);
    }

    #[test]
    fn device_without_buttons_still_reads_axes() {
        let mut src = gamepad();
        src.buttons.clear();
        let s = decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED).unwrap();
        assert_eq!(s.button_count(), 0);
        assert_eq!(s.x, -128);
        assert!(src.usages_max_len.borrow().is_none());
    }

    #[test]
    fn failing_call_aborts_decode() {
        let mut src = gamepad();
        src.fail_usage = Some(USAGE_RZ);
        let err = decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED).unwrap_err();
        assert!(matches!(err, DecodeError::UsageValue { usage: USAGE_RZ, .. }));

        src.fail_usage = None;
        src.fail_at = Some(Step::Caps);
        assert_eq!(
            decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED),
            Err(DecodeError::Caps { status: -1 })
        );
    }

    #[test]
    fn caps_and_usage_list_failures_abort_decode() {
        let mut src = gamepad();

        src.fail_at = Some(Step::ButtonCaps);
        assert_eq!(
            decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED),
            Err(DecodeError::ButtonCaps { status: -3 })
        );

        src.fail_at = Some(Step::ValueCaps);
        assert_eq!(
            decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED),
            Err(DecodeError::ValueCaps { status: -4 })
        );

        src.fail_at = Some(Step::Usages);
        assert_eq!(
            decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED),
            Err(DecodeError::Usages {
                usage_page: 0x09,
                status: -5
            })
        );
    }

    #[test]
    fn byte_scale_wraps_out_of_range_values() {
        let caps = value(USAGE_X, 32, 0, i32::MAX);
        assert_eq!(AxisScale::Byte.apply(0x8000_0000, &caps), i32::MAX - 127);
        assert_eq!(AxisScale::Byte.apply(0x8000_007F, &caps), i32::MAX);
        assert_eq!(AxisScale::Byte.apply(u32::MAX, &caps), -129);
    }

    fn packet(reports: &[[u8; 4]]) -> Vec<u8> {
        reports.iter().flatten().copied().collect()
    }

    #[test]
    fn batched_packet_keeps_last_good_report() {
        let mut src = gamepad();
        src.bad_report = Some(0xEE);
        let data = packet(&[[0x01, 10, 0, 0], [0x01, 200, 0, 0], [0xEE, 50, 0, 0]]);
        let p = HidPacket {
            device: 7,
            size_hid: 4,
            data: &data,
        };

        let s = decode_packet(&src, &p, AxisProfile::BUFFERED).unwrap();
        // 200 - 128: the failing third report does not replace the second.
        assert_eq!(s.x, 72);
        assert_eq!(s.pressed().collect::<Vec<_>>(), vec![0, 4, 11]);
    }

    #[test]
    fn packet_with_no_good_report_yields_nothing() {
        let mut src = gamepad();
        src.bad_report = Some(0xEE);
        let data = packet(&[[0xEE, 1, 0, 0], [0xEE, 2, 0, 0]]);
        let p = HidPacket {
            device: 7,
            size_hid: 4,
            data: &data,
        };
        assert_eq!(decode_packet(&src, &p, AxisProfile::BUFFERED), None);

        let empty = HidPacket {
            device: 7,
            size_hid: 0,
            data: &[],
        };
        assert_eq!(decode_packet(&src, &empty, AxisProfile::BUFFERED), None);
    }

    #[test]
    fn empty_report_is_rejected() {
        assert_eq!(
            decode_report(&gamepad(), &[], AxisProfile::BUFFERED),
            Err(DecodeError::EmptyReport)
        );
    }

    #[test]
    fn non_generic_desktop_values_are_skipped() {
        let mut src = gamepad();
        src.values.push(ValueCaps {
            usage_page: 0x02,
            ..value(USAGE_X, 8, 0, 255)
        });
        src.readings.insert((0x02, USAGE_X), 200);
        let s = decode_report(&src, &[0u8; 8], AxisProfile::BUFFERED).unwrap();
        assert_eq!(s.x, -128);
    }
}
