use std::sync::Arc;

use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt as _, EventMask,
    Window,
};
use x11rb::rust_connection::RustConnection;

use super::{Atoms, NET_WM_STATE_ADD, NET_WM_STATE_REMOVE, SOURCE_PAGER};
use crate::core::{Behavior, WindowId, WorkspaceId, ALL_WORKSPACES};
use crate::platform::{
    PlatformError, SubscriptionId, WindowInfo, WindowManipulator, WindowSystem,
};

const MAX_PROPERTY_LENGTH: u32 = 4096;

fn connection_error(e: ConnectionError) -> PlatformError {
    PlatformError::Connection(e.to_string())
}

fn reply_error(e: ReplyError) -> PlatformError {
    match e {
        ReplyError::ConnectionError(e) => connection_error(e),
        ReplyError::X11Error(e) => PlatformError::Request(format!("{:?}", e.error_kind)),
    }
}

/// EWMH client talking to whatever window manager owns the display.
/// Clones share the same connection.
#[derive(Clone)]
pub struct X11Backend {
    conn: Arc<RustConnection>,
    root: Window,
    atoms: Atoms,
}

impl X11Backend {
    /// Connects to `$DISPLAY` and selects property changes on the root
    /// window so client list and desktop changes are reported.
    pub fn connect() -> Result<Self, PlatformError> {
        let (conn, screen_num) =
            RustConnection::connect(None).map_err(|e| PlatformError::Connection(e.to_string()))?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| PlatformError::Connection(format!("no screen {}", screen_num)))?;
        let atoms = Atoms::new(&conn)
            .map_err(connection_error)?
            .reply()
            .map_err(reply_error)?;

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )
        .map_err(connection_error)?
        .check()
        .map_err(reply_error)?;

        tracing::info!("Connected to X11 display, root window {:#x}", root);
        Ok(Self {
            conn: Arc::new(conn),
            root,
            atoms,
        })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    pub fn root(&self) -> Window {
        self.root
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    fn property_bytes(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
    ) -> Option<Vec<u8>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, MAX_PROPERTY_LENGTH)
            .ok()?
            .reply()
            .ok()?;
        (!reply.value.is_empty()).then_some(reply.value)
    }

    fn property32(
        &self,
        window: Window,
        property: impl Into<Atom>,
        type_: impl Into<Atom>,
    ) -> Option<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, type_, 0, MAX_PROPERTY_LENGTH)
            .ok()?
            .reply()
            .ok()?;
        let values = reply.value32()?.collect();
        Some(values)
    }

    /// Managed client windows in mapping order.
    pub fn client_list(&self) -> Vec<Window> {
        self.property32(self.root, self.atoms._NET_CLIENT_LIST, AtomEnum::WINDOW)
            .unwrap_or_default()
    }

    pub fn current_desktop(&self) -> Option<WorkspaceId> {
        self.property32(self.root, self.atoms._NET_CURRENT_DESKTOP, AtomEnum::CARDINAL)?
            .first()
            .copied()
    }

    fn window_desktop(&self, window: Window) -> Option<WorkspaceId> {
        self.property32(window, self.atoms._NET_WM_DESKTOP, AtomEnum::CARDINAL)?
            .first()
            .copied()
    }

    fn window_states(&self, window: Window) -> Vec<Atom> {
        self.property32(window, self.atoms._NET_WM_STATE, AtomEnum::ATOM)
            .unwrap_or_default()
    }

    fn title(&self, window: Window) -> Option<String> {
        self.property_bytes(window, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)
            .or_else(|| self.property_bytes(window, AtomEnum::WM_NAME, AtomEnum::ANY))
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    fn class(&self, window: Window) -> Option<String> {
        self.property_bytes(window, AtomEnum::WM_CLASS, AtomEnum::STRING)
            .and_then(|bytes| parse_wm_class(&bytes))
    }

    fn exists(&self, window: Window) -> bool {
        self.conn
            .get_window_attributes(window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .is_some()
    }

    fn ensure_exists(&self, window: Window) -> Result<(), PlatformError> {
        if self.exists(window) {
            Ok(())
        } else {
            Err(PlatformError::WindowGone(window))
        }
    }

    /// Sends an EWMH request about `window` to the window manager.
    fn send_request(
        &self,
        window: Window,
        message_type: Atom,
        data: [u32; 5],
    ) -> Result<(), PlatformError> {
        let event = ClientMessageEvent::new(32, window, message_type, data);
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
                event,
            )
            .map_err(connection_error)?;
        self.conn.flush().map_err(connection_error)
    }

    fn change_state(&self, window: Window, add: bool, state: Atom) -> Result<(), PlatformError> {
        let action = if add {
            NET_WM_STATE_ADD
        } else {
            NET_WM_STATE_REMOVE
        };
        self.send_request(
            window,
            self.atoms._NET_WM_STATE,
            [action, state, 0, SOURCE_PAGER, 0],
        )
    }

    fn move_to_desktop(&self, window: Window, desktop: WorkspaceId) -> Result<(), PlatformError> {
        self.send_request(
            window,
            self.atoms._NET_WM_DESKTOP,
            [desktop, SOURCE_PAGER, 0, 0, 0],
        )
    }
}

impl WindowSystem for X11Backend {
    fn window_info(&self, window_id: WindowId) -> Option<WindowInfo> {
        if !self.exists(window_id) {
            return None;
        }

        let workspace = self.window_desktop(window_id);
        let states = self.window_states(window_id);
        let sticky = workspace == Some(ALL_WORKSPACES)
            || states.contains(&self.atoms._NET_WM_STATE_STICKY);
        let above = states.contains(&self.atoms._NET_WM_STATE_ABOVE);

        Some(WindowInfo {
            id: window_id,
            title: self.title(window_id),
            class: self.class(window_id),
            workspace,
            behavior: Behavior::new(above, sticky),
        })
    }

    fn active_workspace_windows(&self) -> Vec<WindowId> {
        let current = self.current_desktop().unwrap_or(0);
        self.client_list()
            .into_iter()
            .filter(|&window| {
                self.window_desktop(window)
                    .is_some_and(|d| d == current || d == ALL_WORKSPACES)
            })
            .collect()
    }
}

impl WindowManipulator for X11Backend {
    fn make_above(&self, window_id: WindowId) -> Result<(), PlatformError> {
        self.ensure_exists(window_id)?;
        self.change_state(window_id, true, self.atoms._NET_WM_STATE_ABOVE)
    }

    fn unmake_above(&self, window_id: WindowId) -> Result<(), PlatformError> {
        self.ensure_exists(window_id)?;
        self.change_state(window_id, false, self.atoms._NET_WM_STATE_ABOVE)
    }

    fn stick(&self, window_id: WindowId) -> Result<(), PlatformError> {
        self.ensure_exists(window_id)?;
        self.move_to_desktop(window_id, ALL_WORKSPACES)
    }

    fn unstick(&self, window_id: WindowId) -> Result<(), PlatformError> {
        self.ensure_exists(window_id)?;
        let desktop = self.current_desktop().unwrap_or(0);
        self.move_to_desktop(window_id, desktop)?;
        if self
            .window_states(window_id)
            .contains(&self.atoms._NET_WM_STATE_STICKY)
        {
            self.change_state(window_id, false, self.atoms._NET_WM_STATE_STICKY)?;
        }
        Ok(())
    }

    fn subscribe_title(&self, window_id: WindowId) -> Result<SubscriptionId, PlatformError> {
        let aux = ChangeWindowAttributesAux::new()
            .event_mask(EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY);
        self.conn
            .change_window_attributes(window_id, &aux)
            .map_err(connection_error)?
            .check()
            .map_err(|e| match e {
                ReplyError::X11Error(_) => PlatformError::WindowGone(window_id),
                ReplyError::ConnectionError(e) => connection_error(e),
            })?;
        Ok(SubscriptionId(u64::from(window_id)))
    }

    fn unsubscribe_title(&self, subscription: SubscriptionId) {
        let Ok(window) = Window::try_from(subscription.0) else {
            return;
        };
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::NO_EVENT);
        // BadWindow is expected when the window is already destroyed
        if let Ok(cookie) = self.conn.change_window_attributes(window, &aux) {
            cookie.ignore_error();
        }
        let _ = self.conn.flush();
    }
}

/// `WM_CLASS` holds two NUL-terminated strings, instance then class.
fn parse_wm_class(bytes: &[u8]) -> Option<String> {
    let mut parts = bytes.split(|b| *b == 0);
    parts.next()?;
    let class = parts.next().filter(|c| !c.is_empty())?;
    Some(String::from_utf8_lossy(class).into_owned())
}
