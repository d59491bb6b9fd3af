//! X11 platform adapter (EWMH). Degrades to inert when no X server is
//! reachable (Wayland-only or headless sessions) so the core keeps running.

use std::path::Path;

use tracing::warn;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ClientMessageEvent, ConnectionExt, EventMask, KeyButMask, Window,
};
use x11rb::rust_connection::RustConnection;

use super::{ActiveWindow, CursorPos, PlatformAdapter, WindowBounds};

pub struct X11Adapter {
    conn: Option<RustConnection>,
    root: Window,
}

impl X11Adapter {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let root = conn.setup().roots.get(screen_num).map(|screen| screen.root);
                match root {
                    Some(root) => Self {
                        conn: Some(conn),
                        root,
                    },
                    None => {
                        warn!(screen_num, "X server reported no such screen, adapter inert");
                        Self {
                            conn: None,
                            root: 0,
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "no X server connection, adapter inert");
                Self {
                    conn: None,
                    root: 0,
                }
            }
        }
    }

    fn atom(&self, name: &str) -> Option<u32> {
        self.conn
            .as_ref()?
            .intern_atom(false, name.as_bytes())
            .ok()?
            .reply()
            .ok()
            .map(|r| r.atom)
    }

    fn active_window_id(&self) -> Option<Window> {
        let conn = self.conn.as_ref()?;
        let atom = self.atom("_NET_ACTIVE_WINDOW")?;
        let reply = conn
            .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, 1)
            .ok()?
            .reply()
            .ok()?;
        let window = reply.value32()?.next()?;
        if window == 0 { None } else { Some(window) }
    }

    fn window_pid(&self, window: Window) -> Option<u32> {
        let conn = self.conn.as_ref()?;
        let atom = self.atom("_NET_WM_PID")?;
        let reply = conn
            .get_property(false, window, atom, AtomEnum::CARDINAL, 0, 1)
            .ok()?
            .reply()
            .ok()?;
        reply.value32()?.next()
    }

    fn window_title(&self, window: Window) -> Option<String> {
        let conn = self.conn.as_ref()?;
        let net_name = self.atom("_NET_WM_NAME")?;
        for atom in [net_name, AtomEnum::WM_NAME.into()] {
            let Ok(cookie) = conn.get_property(false, window, atom, AtomEnum::ANY, 0, 1024) else {
                continue;
            };
            let Ok(reply) = cookie.reply() else { continue };
            if !reply.value.is_empty()
                && let Ok(title) = String::from_utf8(reply.value)
            {
                return Some(title);
            }
        }
        None
    }

    /// First managed window owned by `pid`, from the EWMH client list
    fn find_window(&self, pid: u32) -> Option<Window> {
        let conn = self.conn.as_ref()?;
        let atom = self.atom("_NET_CLIENT_LIST")?;
        let reply = conn
            .get_property(false, self.root, atom, AtomEnum::WINDOW, 0, 4096)
            .ok()?
            .reply()
            .ok()?;
        reply.value32()?.find(|&w| self.window_pid(w) == Some(pid))
    }
}

impl Default for X11Adapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformAdapter for X11Adapter {
    fn active_window(&self) -> Option<ActiveWindow> {
        let window = self.active_window_id()?;
        let pid = self.window_pid(window)?;
        if pid == 0 {
            return None;
        }
        Some(ActiveWindow {
            pid,
            title: self.window_title(window).unwrap_or_default(),
        })
    }

    fn process_exists(&self, pid: u32) -> bool {
        pid != 0 && Path::new(&format!("/proc/{pid}")).exists()
    }

    fn activate(&self, pid: u32) -> bool {
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let Some(window) = self.find_window(pid) else {
            return false;
        };
        let Some(atom) = self.atom("_NET_ACTIVE_WINDOW") else {
            return false;
        };

        // Ask the window manager to raise the window; source indication 1
        // marks the request as coming from a normal application
        let event = ClientMessageEvent::new(32, window, atom, [1, 0, 0, 0, 0]);
        let sent = conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        );
        sent.is_ok() && conn.flush().is_ok()
    }

    fn window_rect(&self, pid: u32) -> Option<WindowBounds> {
        let conn = self.conn.as_ref()?;
        let window = self.find_window(pid)?;
        let geometry = conn.get_geometry(window).ok()?.reply().ok()?;
        // Geometry is parent-relative; translate the origin to root space
        let origin = conn
            .translate_coordinates(window, self.root, 0, 0)
            .ok()?
            .reply()
            .ok()?;
        Some(WindowBounds {
            x: i32::from(origin.dst_x),
            y: i32::from(origin.dst_y),
            width: i32::from(geometry.width),
            height: i32::from(geometry.height),
        })
    }

    fn cursor_position(&self) -> Option<CursorPos> {
        let conn = self.conn.as_ref()?;
        let reply = conn.query_pointer(self.root).ok()?.reply().ok()?;
        Some(CursorPos {
            x: i32::from(reply.root_x),
            y: i32::from(reply.root_y),
        })
    }

    fn mouse_button_down(&self) -> bool {
        let Some(conn) = self.conn.as_ref() else {
            return false;
        };
        let Ok(cookie) = conn.query_pointer(self.root) else {
            return false;
        };
        let Ok(reply) = cookie.reply() else {
            return false;
        };
        u16::from(reply.mask) & u16::from(KeyButMask::BUTTON1) != 0
    }
}
