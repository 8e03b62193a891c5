//! Window geometry.
//!
//! [`scene`] turns a [`JoystickState`] into a flat list of [`Shape`]s in client
//! coordinates. The GDI painter only walks this list, so everything about
//! where things go lives here.

use std::f64::consts::PI;

use crate::state::JoystickState;

/// Fill colour for pressed buttons and the active D-pad slot, as `(r, g, b)`.
pub const HIGHLIGHT_RGB: (u8, u8, u8) = (192, 0, 0);

const BUTTON_ORIGIN: (i32, i32) = (20, 20);
const BUTTON_PITCH: i32 = 40;
const BUTTON_SIZE: i32 = 30;

const LEFT_STICK_ORIGIN: (i32, i32) = (20, 100);
const RIGHT_STICK_ORIGIN: (i32, i32) = (296, 100);
const CROSSHAIR_BOX: i32 = 256;
const CROSSHAIR_HALF_LEN: i32 = 5;

const DPAD_ORIGIN: (i32, i32) = (600, 140);
const DPAD_RADIUS: f64 = 80.0;
const DPAD_DOT: i32 = 20;
const DPAD_SLOTS: i32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    fn square(x: i32, y: i32, size: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + size,
            bottom: y + size,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Ellipse inscribed in `bounds`, optionally with centred text.
    Ellipse {
        bounds: Rect,
        highlighted: bool,
        label: Option<String>,
    },
    /// Outline rectangle.
    Frame(Rect),
    /// Straight line segment.
    Line { from: (i32, i32), to: (i32, i32) },
}

/// Everything to paint for `state`, back to front.
pub fn scene(state: &JoystickState) -> Vec<Shape> {
    let mut out = Vec::with_capacity(state.button_count() + 6 + DPAD_SLOTS as usize);

    for i in 0..state.button_count() {
        out.push(button(i, state.is_pressed(i)));
    }
    crosshair(&mut out, LEFT_STICK_ORIGIN, state.x, state.y);
    crosshair(&mut out, RIGHT_STICK_ORIGIN, state.z, state.rz);
    dpad(&mut out, DPAD_ORIGIN, state.hat);

    out
}

fn button(i: usize, pressed: bool) -> Shape {
    let x = BUTTON_ORIGIN.0 + i as i32 * BUTTON_PITCH;
    Shape::Ellipse {
        bounds: Rect::square(x, BUTTON_ORIGIN.1, BUTTON_SIZE),
        highlighted: pressed,
        label: Some((i + 1).to_string()),
    }
}

fn crosshair(out: &mut Vec<Shape>, (x, y): (i32, i32), xv: i32, yv: i32) {
    out.push(Shape::Frame(Rect::square(x, y, CROSSHAIR_BOX)));

    let cx = x + CROSSHAIR_BOX / 2 + xv;
    let cy = y + CROSSHAIR_BOX / 2 + yv;
    out.push(Shape::Line {
        from: (cx - CROSSHAIR_HALF_LEN, cy),
        to: (cx + CROSSHAIR_HALF_LEN, cy),
    });
    out.push(Shape::Line {
        from: (cx, cy - CROSSHAIR_HALF_LEN),
        to: (cx, cy + CROSSHAIR_HALF_LEN),
    });
}

/// Offset of D-pad slot `i` inside its box. Slot 0 is straight up, then clockwise.
fn dpad_offset(i: i32) -> (i32, i32) {
    let step = 2.0 * PI * i as f64 / DPAD_SLOTS as f64;
    let r = DPAD_RADIUS as i32;
    // `as i32` truncates toward zero, which keeps the diagonals on whole pixels.
    let dx = ((-step + PI).sin() * DPAD_RADIUS) as i32 + r;
    let dy = ((step + PI).cos() * DPAD_RADIUS) as i32 + r;
    (dx, dy)
}

fn dpad(out: &mut Vec<Shape>, (x, y): (i32, i32), hat: i32) {
    for i in 0..DPAD_SLOTS {
        let (dx, dy) = dpad_offset(i);
        out.push(Shape::Ellipse {
            bounds: Rect::square(x + dx, y + dy, DPAD_DOT),
            highlighted: hat == i,
            label: None,
        });
    }
}
