//! Decoded joystick state.
//!
//! [`JoystickState`] is the whole picture the viewer draws: which buttons are
//! down, four stick axes and the hat switch. It is replaced wholesale by every
//! successful decode; there is no per-field merging between reports.
//!
//! ## Value conventions
//! - **Axes** are signed and centred on zero, nominally `-128..=127`
//!   (see [`AxisScale`](crate::decode::AxisScale) for how raw values get there).
//! - **Hat** is the raw hat-switch value: `0..7` = 8-way directions (Up = 0,
//!   clockwise); anything else is neutral.
//! - **Buttons** are indexed from the first usage of the device's button range.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Upper bound on the number of buttons tracked per device.
pub const MAX_BUTTONS: usize = 128;

/// Snapshot of one decoded HID input report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoystickState {
    buttons: [bool; MAX_BUTTONS],
    button_count: usize,
    /// Left stick X.
    pub x: i32,
    /// Left stick Y.
    pub y: i32,
    /// Second stick horizontal.
    pub z: i32,
    /// Second stick vertical.
    pub rz: i32,
    /// Raw hat-switch value.
    pub hat: i32,
}

impl Default for JoystickState {
    fn default() -> Self {
        Self {
            buttons: [false; MAX_BUTTONS],
            button_count: 0,
            x: 0,
            y: 0,
            z: 0,
            rz: 0,
            hat: 0,
        }
    }
}

impl JoystickState {
    /// Number of buttons the device describes (clamped to [`MAX_BUTTONS`]).
    #[inline]
    pub fn button_count(&self) -> usize {
        self.button_count
    }

    pub(crate) fn set_button_count(&mut self, count: usize) {
        self.button_count = count.min(MAX_BUTTONS);
    }

    /// Whether button `idx` is held. Out-of-range indices read as released.
    #[inline]
    pub fn is_pressed(&self, idx: usize) -> bool {
        self.buttons.get(idx).copied().unwrap_or(false)
    }

    /// Mark button `idx` as held. Returns `false` (and changes nothing) when
    /// `idx` is outside the tracked range.
    pub(crate) fn press(&mut self, idx: usize) -> bool {
        match self.buttons.get_mut(idx) {
            Some(slot) => {
                *slot = true;
                true
            }
            None => false,
        }
    }

    /// Indices of all held buttons, ascending.
    pub fn pressed(&self) -> impl Iterator<Item = usize> + '_ {
        self.buttons
            .iter()
            .enumerate()
            .filter_map(|(i, &down)| down.then_some(i))
    }
}

impl Serialize for JoystickState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let pressed: Vec<usize> = self.pressed().collect();
        let mut s = serializer.serialize_struct("JoystickState", 7)?;
        s.serialize_field("button_count", &self.button_count)?;
        s.serialize_field("pressed", &pressed)?;
        s.serialize_field("x", &self.x)?;
        s.serialize_field("y", &self.y)?;
        s.serialize_field("z", &self.z)?;
        s.serialize_field("rz", &self.rz)?;
        s.serialize_field("hat", &self.hat)?;
        s.end()
    }
}
