//! Win32 window shell shared by both viewers.
//!
//! - the main frame window and its `WM_PAINT` / `WM_DESTROY` handling
//! - the message-only helper window Raw Input is registered against
//! - the per-thread [`Viewer`] context (current state + decode settings)
//! - the GDI painter for [`layout::Shape`]s
//! - the message loop
//!
//! Everything here runs on the GUI thread. The viewer context is a
//! `thread_local!`; window procedures and timer callbacks borrow it briefly and
//! never across a call that can re-enter a window procedure.

#![cfg(target_os = "windows")]

use std::cell::RefCell;

use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_CLASS_ALREADY_EXISTS, HANDLE, HWND, LPARAM, LRESULT, RECT, WPARAM,
};
use windows_sys::Win32::Graphics::Gdi::*;
use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
use windows_sys::Win32::UI::WindowsAndMessaging::*;

use crate::backends::packet;
use crate::backends::windows::hidp::PreparsedData;
use crate::config::Config;
use crate::decode::{decode_packet, AxisProfile};
use crate::error::AppError;
use crate::layout::{self, Shape, HIGHLIGHT_RGB};
use crate::state::JoystickState;

const MAIN_CLASS: &str = "MainFrame";
const HELPER_CLASS: &str = "RawJoyHelperWindowInputCatcher";
const HELPER_TITLE: &str = "RawJoyHelperWindowInputMsgWindow";

/// Per-thread viewer context.
pub struct Viewer {
    pub main: HWND,
    pub state: JoystickState,
    pub profile: AxisProfile,
    pub dump_state: bool,
    pub buffer_multiplier: u32,
}

thread_local! {
    static VIEWER: RefCell<Option<Viewer>> = const { RefCell::new(None) };
}

/// Install the context for this thread. `main` is filled in once the main
/// window exists.
pub fn install(cfg: &Config) {
    VIEWER.with(|v| {
        *v.borrow_mut() = Some(Viewer {
            main: core::ptr::null_mut(),
            state: JoystickState::default(),
            profile: cfg.axes,
            dump_state: cfg.log.dump_state,
            buffer_multiplier: cfg.window.buffer_multiplier,
        })
    });
}

/// Run `f` against the context, if one is installed.
pub fn with_viewer<R>(f: impl FnOnce(&mut Viewer) -> R) -> Option<R> {
    VIEWER.with(|v| v.borrow_mut().as_mut().map(f))
}

/// Decode every report in `packet` and commit the last successful one.
///
/// Returns `true` if the state changed hands (at least one report decoded).
pub fn apply_packet(p: &packet::HidPacket<'_>) -> bool {
    let Some((profile, dump)) = with_viewer(|v| (v.profile, v.dump_state)) else {
        return false;
    };

    let ppd = match PreparsedData::for_device(p.device as HANDLE) {
        Ok(ppd) => ppd,
        Err(e) => {
            log::debug!("device {:#010x}: {e}", p.device);
            return false;
        }
    };

    let Some(state) = decode_packet(&ppd, p, profile) else {
        return false;
    };
    if dump {
        match serde_json::to_string(&state) {
            Ok(json) => log::debug!("state {json}"),
            Err(e) => log::debug!("state dump failed: {e}"),
        }
    }
    with_viewer(|v| v.state = state).is_some()
}

/// Invalidate and synchronously repaint the main window.
pub fn repaint() {
    let Some(main) = with_viewer(|v| v.main) else {
        return;
    };
    if main.is_null() {
        return;
    }
    unsafe {
        InvalidateRect(main, core::ptr::null(), 1);
        UpdateWindow(main);
    }
}

/// UTF-16 + NUL.
pub fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(what: &'static str) -> AppError {
    AppError::Register {
        what,
        code: unsafe { GetLastError() },
    }
}

/// Create the message-only window Raw Input is delivered to.
///
/// `proc` is its window procedure; `None` uses `DefWindowProcW` (the buffered
/// viewer never dispatches to it).
pub fn create_helper_window(proc: WNDPROC) -> Result<HWND, AppError> {
    let class = wide(HELPER_CLASS);
    let title = wide(HELPER_TITLE);
    unsafe {
        let instance = GetModuleHandleW(core::ptr::null());
        let wc = WNDCLASSW {
            lpfnWndProc: proc.or(Some(DefWindowProcW)),
            hInstance: instance,
            lpszClassName: class.as_ptr(),
            ..core::mem::zeroed()
        };
        if RegisterClassW(&wc) == 0 && GetLastError() != ERROR_CLASS_ALREADY_EXISTS {
            return Err(last_error("RegisterClassW(helper)"));
        }

        let hwnd = CreateWindowExW(
            0,
            class.as_ptr(),
            title.as_ptr(),
            WS_OVERLAPPED,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            HWND_MESSAGE,
            core::ptr::null_mut(),
            instance,
            core::ptr::null(),
        );
        if hwnd.is_null() {
            let err = last_error("CreateWindowExW(helper)");
            UnregisterClassW(class.as_ptr(), instance);
            return Err(err);
        }
        Ok(hwnd)
    }
}

/// Register the frame class, create and show the main window, and record it in
/// the viewer context.
pub fn create_main_window(title: &str) -> Result<HWND, AppError> {
    let class = wide(MAIN_CLASS);
    let title = wide(title);
    unsafe {
        let instance = GetModuleHandleW(core::ptr::null());
        let wcex = WNDCLASSEXW {
            cbSize: core::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(main_wnd_proc),
            cbClsExtra: 0,
            cbWndExtra: 0,
            hInstance: instance,
            hIcon: LoadIconW(core::ptr::null_mut(), IDI_APPLICATION),
            hCursor: LoadCursorW(core::ptr::null_mut(), IDC_ARROW),
            hbrBackground: (COLOR_WINDOW + 1) as usize as HBRUSH,
            lpszMenuName: core::ptr::null(),
            lpszClassName: class.as_ptr(),
            hIconSm: LoadIconW(core::ptr::null_mut(), IDI_APPLICATION),
        };
        if RegisterClassExW(&wcex) == 0 {
            return Err(last_error("RegisterClassExW(main)"));
        }

        let hwnd = CreateWindowExW(
            0,
            class.as_ptr(),
            title.as_ptr(),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            core::ptr::null_mut(),
            core::ptr::null_mut(),
            instance,
            core::ptr::null(),
        );
        if hwnd.is_null() {
            return Err(last_error("CreateWindowExW(main)"));
        }

        with_viewer(|v| v.main = hwnd);
        ShowWindow(hwnd, SW_SHOWDEFAULT);
        UpdateWindow(hwnd);
        Ok(hwnd)
    }
}

/// Pump messages until `WM_QUIT` (or until the filtered window is gone).
///
/// `filter` restricts retrieval to one window; other windows' queued messages
/// (notably `WM_INPUT` for the helper) stay in the queue. Returns the exit code.
pub fn message_loop(filter: HWND) -> i32 {
    unsafe {
        let mut msg: MSG = core::mem::zeroed();
        loop {
            let r = GetMessageW(&mut msg, filter, 0, 0);
            if r == 0 {
                return msg.wParam as i32;
            }
            if r == -1 {
                // Filtered window destroyed: WM_QUIT is a thread message and
                // never matches the filter.
                return 0;
            }
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

unsafe extern "system" fn main_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            paint(hwnd);
            0
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            0
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// --------------------- painting ---------------------

/// Solid highlight brush selected into a DC for the guard's lifetime.
struct SelectedBrush {
    hdc: HDC,
    brush: HBRUSH,
    old: HGDIOBJ,
}

impl SelectedBrush {
    fn highlight(hdc: HDC) -> Self {
        let (r, g, b) = HIGHLIGHT_RGB;
        let color = r as u32 | (g as u32) << 8 | (b as u32) << 16;
        unsafe {
            let brush = CreateSolidBrush(color);
            let old = SelectObject(hdc, brush as HGDIOBJ);
            Self { hdc, brush, old }
        }
    }
}

impl Drop for SelectedBrush {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.hdc, self.old);
            DeleteObject(self.brush as HGDIOBJ);
        }
    }
}

fn paint(hwnd: HWND) {
    let shapes = with_viewer(|v| layout::scene(&v.state)).unwrap_or_default();
    unsafe {
        let mut ps: PAINTSTRUCT = core::mem::zeroed();
        let hdc = BeginPaint(hwnd, &mut ps);
        SetBkMode(hdc, TRANSPARENT as _);
        for shape in &shapes {
            draw(hdc, shape);
        }
        EndPaint(hwnd, &ps);
    }
}

unsafe fn draw(hdc: HDC, shape: &Shape) {
    match shape {
        Shape::Ellipse {
            bounds,
            highlighted,
            label,
        } => {
            let _brush = highlighted.then(|| SelectedBrush::highlight(hdc));
            Ellipse(hdc, bounds.left, bounds.top, bounds.right, bounds.bottom);
            if let Some(text) = label {
                let text: Vec<u16> = text.encode_utf16().collect();
                let mut rc = RECT {
                    left: bounds.left,
                    top: bounds.top,
                    right: bounds.right,
                    bottom: bounds.bottom,
                };
                DrawTextW(
                    hdc,
                    text.as_ptr(),
                    text.len() as i32,
                    &mut rc,
                    DT_SINGLELINE | DT_CENTER | DT_VCENTER,
                );
            }
        }
        Shape::Frame(r) => {
            Rectangle(hdc, r.left, r.top, r.right, r.bottom);
        }
        Shape::Line { from, to } => {
            MoveToEx(hdc, from.0, from.1, core::ptr::null_mut());
            LineTo(hdc, to.0, to.1);
        }
    }
}
