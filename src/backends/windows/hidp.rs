//! Windows HID parser (HIDP) access through Raw Input preparsed data.
//!
//! [`PreparsedData`] owns the opaque capability blob Raw Input hands out for a
//! device (`RIDI_PREPARSEDDATA`) and implements [`HidpSource`] on top of the
//! `HidP_*` functions, so [`decode_report`](crate::decode::decode_report) can
//! run against a live device.
//!
//! ## Notes
//! - The blob is fetched per report, the same way the HID parser expects to
//!   be driven from `WM_INPUT`. No caching across reports.
//! - All value and usage queries use link collection 0.
//! - Caps queries size their buffers from `HidP_GetCaps` counts.

#![cfg(target_os = "windows")]

use core::ffi::c_void;
use core::mem::MaybeUninit;

use windows_sys::Win32::Devices::HumanInterfaceDevice::*;
use windows_sys::Win32::Foundation::{GetLastError, HANDLE};
use windows_sys::Win32::UI::Input::{GetRawInputDeviceInfoW, RIDI_PREPARSEDDATA};

use crate::decode::{ButtonCaps, HidpSource, ReportCaps, ValueCaps};
use crate::error::DecodeError;

const STATUS_SUCCESS: i32 = HIDP_STATUS_SUCCESS;

/// Preparsed data blob for one Raw Input device.
pub struct PreparsedData {
    // u64 backing keeps the blob 8-byte aligned for the HID parser.
    buf: Vec<u64>,
}

impl PreparsedData {
    /// Fetch the blob for a Raw Input device handle (`RAWINPUTHEADER::hDevice`).
    pub fn for_device(device: HANDLE) -> Result<Self, DecodeError> {
        unsafe {
            let mut size: u32 = 0;
            let r0 = GetRawInputDeviceInfoW(
                device,
                RIDI_PREPARSEDDATA,
                core::ptr::null_mut(),
                &mut size,
            );
            if r0 != 0 || size == 0 {
                return Err(DecodeError::PreparsedData {
                    code: GetLastError(),
                });
            }

            let mut buf = vec![0u64; (size as usize).div_ceil(8)];
            let r1 = GetRawInputDeviceInfoW(
                device,
                RIDI_PREPARSEDDATA,
                buf.as_mut_ptr() as *mut c_void,
                &mut size,
            );
            if r1 == u32::MAX {
                return Err(DecodeError::PreparsedData {
                    code: GetLastError(),
                });
            }

            Ok(Self { buf })
        }
    }

    #[inline]
    fn ppd(&self) -> PHIDP_PREPARSED_DATA {
        self.buf.as_ptr() as PHIDP_PREPARSED_DATA
    }
}

impl HidpSource for PreparsedData {
    fn caps(&self) -> Result<ReportCaps, DecodeError> {
        let mut caps = MaybeUninit::<HIDP_CAPS>::uninit();
        let status = unsafe { HidP_GetCaps(self.ppd(), caps.as_mut_ptr()) };
        if status != STATUS_SUCCESS {
            return Err(DecodeError::Caps { status });
        }
        let caps = unsafe { caps.assume_init() };
        Ok(ReportCaps {
            input_button_caps: caps.NumberInputButtonCaps,
            input_value_caps: caps.NumberInputValueCaps,
        })
    }

    fn button_caps(&self, count: u16) -> Result<Vec<ButtonCaps>, DecodeError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut raw: Vec<HIDP_BUTTON_CAPS> = vec![unsafe { core::mem::zeroed() }; count as usize];
        let mut len = count;
        let status =
            unsafe { HidP_GetButtonCaps(HidP_Input, raw.as_mut_ptr(), &mut len, self.ppd()) };
        if status != STATUS_SUCCESS {
            return Err(DecodeError::ButtonCaps { status });
        }
        raw.truncate(len as usize);

        Ok(raw
            .iter()
            .map(|c| {
                let (usage_min, usage_max) = unsafe {
                    if c.IsRange != 0 {
                        (c.Anonymous.Range.UsageMin, c.Anonymous.Range.UsageMax)
                    } else {
                        (c.Anonymous.NotRange.Usage, c.Anonymous.NotRange.Usage)
                    }
                };
                ButtonCaps {
                    usage_page: c.UsagePage,
                    usage_min,
                    usage_max,
                }
            })
            .collect())
    }

    fn value_caps(&self, count: u16) -> Result<Vec<ValueCaps>, DecodeError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut raw: Vec<HIDP_VALUE_CAPS> = vec![unsafe { core::mem::zeroed() }; count as usize];
        let mut len = count;
        let status =
            unsafe { HidP_GetValueCaps(HidP_Input, raw.as_mut_ptr(), &mut len, self.ppd()) };
        if status != STATUS_SUCCESS {
            return Err(DecodeError::ValueCaps { status });
        }
        raw.truncate(len as usize);

        Ok(raw
            .iter()
            .map(|c| {
                let usage = unsafe {
                    if c.IsRange != 0 {
                        c.Anonymous.Range.UsageMin
                    } else {
                        c.Anonymous.NotRange.Usage
                    }
                };
                ValueCaps {
                    usage_page: c.UsagePage,
                    usage,
                    bit_size: c.BitSize,
                    logical_min: c.LogicalMin,
                    logical_max: c.LogicalMax,
                }
            })
            .collect())
    }

    fn usages(
        &self,
        usage_page: u16,
        max_len: usize,
        report: &[u8],
    ) -> Result<Vec<u16>, DecodeError> {
        if max_len == 0 {
            return Ok(Vec::new());
        }
        let mut list = vec![0u16; max_len];
        let mut len = max_len as u32;
        // HidP_GetUsages only reads the report; the PSTR signature is historical.
        let status = unsafe {
            HidP_GetUsages(
                HidP_Input,
                usage_page,
                0,
                list.as_mut_ptr(),
                &mut len,
                self.ppd(),
                report.as_ptr() as *mut u8,
                report.len() as u32,
            )
        };
        if status != STATUS_SUCCESS {
            return Err(DecodeError::Usages { usage_page, status });
        }
        list.truncate(len as usize);
        Ok(list)
    }

    fn usage_value(&self, usage_page: u16, usage: u16, report: &[u8]) -> Result<u32, DecodeError> {
        let mut value: u32 = 0;
        let status = unsafe {
            HidP_GetUsageValue(
                HidP_Input,
                usage_page,
                0,
                usage,
                &mut value,
                self.ppd(),
                report.as_ptr() as *mut u8,
                report.len() as u32,
            )
        };
        if status != STATUS_SUCCESS {
            return Err(DecodeError::UsageValue {
                usage_page,
                usage,
                status,
            });
        }
        Ok(value)
    }
}
