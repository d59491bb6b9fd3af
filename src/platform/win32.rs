//! Win32 platform adapter: thin bindings, no business logic

use windows::Win32::Foundation::{CloseHandle, HWND, LPARAM, POINT, RECT};
use windows::Win32::System::Threading::{OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_LBUTTON};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetCursorPos, GetForegroundWindow, GetWindowRect, GetWindowTextLengthW,
    GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindowVisible, SW_RESTORE,
    SetForegroundWindow, ShowWindow,
};
use windows::core::BOOL;

use super::{ActiveWindow, CursorPos, PlatformAdapter, WindowBounds};

pub struct Win32Adapter;

impl Win32Adapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Win32Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for Win32Adapter {
    fn active_window(&self) -> Option<ActiveWindow> {
        let hwnd = unsafe { GetForegroundWindow() };
        if hwnd == HWND::default() {
            return None;
        }

        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
        if pid == 0 {
            return None;
        }

        Some(ActiveWindow {
            pid,
            title: window_title(hwnd),
        })
    }

    fn process_exists(&self, pid: u32) -> bool {
        if pid == 0 {
            return false;
        }
        match unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) } {
            Ok(handle) => {
                let _ = unsafe { CloseHandle(handle) };
                true
            }
            Err(_) => false,
        }
    }

    fn activate(&self, pid: u32) -> bool {
        let Some(hwnd) = find_main_window(pid) else {
            return false;
        };

        unsafe {
            if IsIconic(hwnd).as_bool() {
                let _ = ShowWindow(hwnd, SW_RESTORE);
            }
            SetForegroundWindow(hwnd).as_bool()
        }
    }

    fn window_rect(&self, pid: u32) -> Option<WindowBounds> {
        let hwnd = find_main_window(pid)?;
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.ok()?;
        Some(WindowBounds {
            x: rect.left,
            y: rect.top,
            width: rect.right - rect.left,
            height: rect.bottom - rect.top,
        })
    }

    fn cursor_position(&self) -> Option<CursorPos> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.ok()?;
        Some(CursorPos {
            x: point.x,
            y: point.y,
        })
    }

    fn mouse_button_down(&self) -> bool {
        let state = unsafe { GetAsyncKeyState(i32::from(VK_LBUTTON.0)) } as u16;
        state & 0x8000 != 0
    }
}

fn window_title(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len == 0 {
            return String::new();
        }

        let mut buf = vec![0u16; (len + 1) as usize];
        let copied = GetWindowTextW(hwnd, &mut buf);
        if copied == 0 {
            return String::new();
        }

        String::from_utf16_lossy(&buf[..copied as usize])
    }
}

struct FindWindow {
    pid: u32,
    hwnd: Option<HWND>,
}

/// Pick the pid's first visible top-level window
unsafe extern "system" fn enum_find_proc(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let data = unsafe { &mut *(lparam.0 as *mut FindWindow) };

    let mut pid = 0u32;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };

    if pid == data.pid && unsafe { IsWindowVisible(hwnd) }.as_bool() {
        data.hwnd = Some(hwnd);
        return BOOL(0); // stop enumeration
    }
    BOOL(1)
}

fn find_main_window(pid: u32) -> Option<HWND> {
    let mut data = FindWindow { pid, hwnd: None };
    // EnumWindows reports an error when the callback stops it early
    let _ = unsafe { EnumWindows(Some(enum_find_proc), LPARAM(&raw mut data as isize)) };
    data.hwnd
}
