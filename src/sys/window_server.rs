//! Boundary to the platform's window/display introspection layer.
//!
//! Everything the tiling core needs from the OS is expressed on the
//! [`WindowServer`] trait: window enumeration and properties, notification
//! subscription, geometry writes, display/space queries, and the
//! space-transition predicate that gates event processing. The concrete
//! accessibility implementation lives outside this crate; the in-tree
//! [`SimulatedWindowServer`] backs the test suite and headless runs.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::common::collections::{HashMap, HashSet};
use crate::model::window::{Pid, Subscriptions, WindowId, WindowRole};
use crate::sys::geometry::{Point, Rect, Size};

pub type DisplayId = u32;

/// Identifier of a virtual desktop as reported by the platform.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpaceId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Display {
    pub id: DisplayId,
    pub frame: Rect,
    pub active_space: SpaceId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppInfo {
    pub pid: Pid,
    pub name: String,
}

/// Snapshot of a window as the server currently sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowServerInfo {
    /// `None` until the server has assigned an id (seen for windows restored
    /// from a minimized state at startup).
    pub id: Option<WindowId>,
    pub pid: Pid,
    pub title: Option<String>,
    pub frame: Rect,
    pub role: WindowRole,
    pub movable: bool,
    pub resizable: bool,
    pub minimized: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BorderKind {
    Focused,
    Marked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Error)]
pub enum WindowServerError {
    #[error("window {0:?} is gone")]
    WindowGone(WindowId),
    #[error("application {0} is not responding")]
    AppUnresponsive(Pid),
    #[error("notification registration failed")]
    RegistrationFailed,
}

pub trait WindowServer: Send + Sync {
    // Process and window enumeration.
    fn applications(&self) -> Vec<AppInfo>;
    fn application_windows(&self, pid: Pid) -> Vec<WindowServerInfo>;
    fn window_info(&self, id: WindowId) -> Option<WindowServerInfo>;
    /// Second-chance id lookup for windows reported without one.
    fn resolve_window_id(&self, pid: Pid, title: Option<&str>) -> Option<WindowId>;
    fn window_at_point(&self, point: Point) -> Option<WindowId>;
    fn on_screen_windows(&self, display: DisplayId) -> Vec<WindowId>;

    // Window properties and geometry.
    fn is_window_minimized(&self, id: WindowId) -> bool;
    fn set_window_position(&self, id: WindowId, position: Point);
    fn set_window_size(&self, id: WindowId, size: Size);

    // Notification subscription. Best-effort: a successful registration can
    // still silently drop notifications later, which is why the reactor
    // reconciles against ground truth.
    fn register_window_notifications(
        &self,
        id: WindowId,
        wanted: Subscriptions,
    ) -> Result<Subscriptions, WindowServerError>;
    fn unregister_window_notifications(&self, id: WindowId);
    fn register_application_notifications(&self, pid: Pid) -> Result<(), WindowServerError>;
    fn unregister_application_notifications(&self, pid: Pid);

    // Displays and spaces.
    fn displays(&self) -> Vec<Display>;
    fn main_display(&self) -> Option<Display>;
    fn display_under_cursor(&self) -> Option<Display>;
    fn next_display(&self, id: DisplayId) -> Option<Display>;
    fn previous_display(&self, id: DisplayId) -> Option<Display>;
    fn display_of_window(&self, id: WindowId) -> Option<Display>;
    fn active_space(&self, display: DisplayId) -> Option<SpaceId>;
    fn previous_space(&self, display: DisplayId) -> Option<SpaceId>;
    fn space_has_window(&self, space: SpaceId, id: WindowId) -> bool;
    fn space_transition_in_progress(&self) -> bool;
    fn activate_space(&self, space: SpaceId);
    fn move_window_to_space(&self, id: WindowId, space: SpaceId);
    fn focus_display(&self, id: DisplayId);

    // Focus, cursor, and the border indicator overlay.
    fn focus_window(&self, id: WindowId);
    fn cursor_position(&self) -> Point;
    fn warp_cursor(&self, point: Point);
    fn update_border(&self, kind: BorderKind, frame: Option<Rect>);
}

/// Attaches to the platform window server.
///
/// The accessibility-backed implementation is provided by the platform
/// integration layer; without one, the in-memory simulation is used so the
/// daemon can run headless (and so tests exercise the full stack).
pub fn connect() -> Arc<dyn WindowServer> {
    tracing::warn!("no platform backend attached, using the in-memory simulation");
    Arc::new(SimulatedWindowServer::new())
}

#[derive(Clone, Debug)]
struct SimWindow {
    pid: Pid,
    title: Option<String>,
    frame: Rect,
    role: WindowRole,
    movable: bool,
    resizable: bool,
    minimized: bool,
    space: SpaceId,
}

#[derive(Default)]
struct SimState {
    displays: Vec<Display>,
    apps: HashMap<Pid, String>,
    windows: HashMap<WindowId, SimWindow>,
    /// Windows the server knows about but has not identified yet, keyed by
    /// (pid, title).
    unidentified: Vec<(Pid, Option<String>, WindowId)>,
    previous_spaces: HashMap<DisplayId, SpaceId>,
    cursor: Point,
    transition_in_progress: bool,
    focused: Option<WindowId>,
    focused_display: Option<DisplayId>,
    borders: HashMap<&'static str, Option<Rect>>,
    fail_window_registration: HashSet<WindowId>,
    fail_app_registrations: HashMap<Pid, u32>,
    next_id: u32,
    /// Every geometry write, in order. Tests assert against this.
    frame_history: Vec<(WindowId, Rect)>,
}

/// In-memory window server used by tests and headless runs.
pub struct SimulatedWindowServer {
    state: Mutex<SimState>,
}

impl Default for SimulatedWindowServer {
    fn default() -> Self { Self::new() }
}

impl SimulatedWindowServer {
    pub fn new() -> SimulatedWindowServer {
        let mut state = SimState::default();
        state.displays.push(Display {
            id: 1,
            frame: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            active_space: SpaceId(1),
        });
        state.next_id = 1;
        SimulatedWindowServer { state: Mutex::new(state) }
    }

    pub fn add_display(&self, frame: Rect, active_space: SpaceId) -> DisplayId {
        let mut state = self.state.lock();
        let id = state.displays.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        state.displays.push(Display { id, frame, active_space });
        id
    }

    pub fn add_app(&self, pid: Pid, name: &str) {
        self.state.lock().apps.insert(pid, name.to_string());
    }

    pub fn add_window(&self, pid: Pid, title: &str, frame: Rect, space: SpaceId) -> WindowId {
        let mut state = self.state.lock();
        let raw = state.next_id;
        state.next_id += 1;
        let id = WindowId::new(raw).expect("simulated ids start at 1");
        state.windows.insert(id, SimWindow {
            pid,
            title: Some(title.to_string()),
            frame,
            role: WindowRole::Standard,
            movable: true,
            resizable: true,
            minimized: false,
            space,
        });
        id
    }

    pub fn set_window_role(&self, id: WindowId, role: WindowRole) {
        if let Some(w) = self.state.lock().windows.get_mut(&id) {
            w.role = role;
        }
    }

    pub fn set_window_minimized(&self, id: WindowId, minimized: bool) {
        if let Some(w) = self.state.lock().windows.get_mut(&id) {
            w.minimized = minimized;
        }
    }

    pub fn set_window_space(&self, id: WindowId, space: SpaceId) {
        if let Some(w) = self.state.lock().windows.get_mut(&id) {
            w.space = space;
        }
    }

    pub fn remove_window(&self, id: WindowId) {
        self.state.lock().windows.remove(&id);
    }

    /// Registers a window the server has not assigned an id to yet. The id it
    /// will eventually get is created now but not reported until
    /// [`Self::identify_pending`] runs.
    pub fn add_unidentified_window(&self, pid: Pid, title: &str) -> WindowId {
        let mut state = self.state.lock();
        let raw = state.next_id;
        state.next_id += 1;
        let id = WindowId::new(raw).expect("simulated ids start at 1");
        state.unidentified.push((pid, Some(title.to_string()), id));
        id
    }

    /// Promotes all unidentified windows to real ones.
    pub fn identify_pending(&self, frame: Rect, space: SpaceId) {
        let mut state = self.state.lock();
        let pending = std::mem::take(&mut state.unidentified);
        for (pid, title, id) in pending {
            state.windows.insert(id, SimWindow {
                pid,
                title,
                frame,
                role: WindowRole::Standard,
                movable: true,
                resizable: true,
                minimized: false,
                space,
            });
        }
    }

    pub fn set_active_space(&self, display: DisplayId, space: SpaceId) {
        let mut state = self.state.lock();
        if let Some(d) = state.displays.iter_mut().find(|d| d.id == display) {
            let old = d.active_space;
            d.active_space = space;
            state.previous_spaces.insert(display, old);
        }
    }

    pub fn set_transition_in_progress(&self, in_progress: bool) {
        self.state.lock().transition_in_progress = in_progress;
    }

    pub fn set_cursor(&self, point: Point) {
        self.state.lock().cursor = point;
    }

    pub fn fail_window_registration(&self, id: WindowId) {
        self.state.lock().fail_window_registration.insert(id);
    }

    /// Makes the next `count` application registrations for `pid` fail.
    pub fn fail_app_registrations(&self, pid: Pid, count: u32) {
        self.state.lock().fail_app_registrations.insert(pid, count);
    }

    pub fn frame_history(&self) -> Vec<(WindowId, Rect)> {
        self.state.lock().frame_history.clone()
    }

    pub fn clear_frame_history(&self) {
        self.state.lock().frame_history.clear();
    }

    pub fn window_frame(&self, id: WindowId) -> Option<Rect> {
        self.state.lock().windows.get(&id).map(|w| w.frame)
    }

    pub fn focused_window(&self) -> Option<WindowId> { self.state.lock().focused }

    pub fn border(&self, kind: BorderKind) -> Option<Rect> {
        self.state.lock().borders.get(Self::border_key(kind)).copied().flatten()
    }

    fn border_key(kind: BorderKind) -> &'static str {
        match kind {
            BorderKind::Focused => "focused",
            BorderKind::Marked => "marked",
        }
    }

    fn info(window: (&WindowId, &SimWindow)) -> WindowServerInfo {
        let (id, w) = window;
        WindowServerInfo {
            id: Some(*id),
            pid: w.pid,
            title: w.title.clone(),
            frame: w.frame,
            role: w.role,
            movable: w.movable,
            resizable: w.resizable,
            minimized: w.minimized,
        }
    }
}

impl WindowServer for SimulatedWindowServer {
    fn applications(&self) -> Vec<AppInfo> {
        let state = self.state.lock();
        let mut apps: Vec<AppInfo> = state
            .apps
            .iter()
            .map(|(pid, name)| AppInfo {
                pid: *pid,
                name: name.clone(),
            })
            .collect();
        apps.sort_by_key(|a| a.pid);
        apps
    }

    fn application_windows(&self, pid: Pid) -> Vec<WindowServerInfo> {
        let state = self.state.lock();
        let mut infos: Vec<WindowServerInfo> =
            state.windows.iter().filter(|(_, w)| w.pid == pid).map(Self::info).collect();
        for (p, title, _) in &state.unidentified {
            if *p == pid {
                infos.push(WindowServerInfo {
                    id: None,
                    pid,
                    title: title.clone(),
                    frame: Rect::default(),
                    role: WindowRole::Standard,
                    movable: true,
                    resizable: true,
                    minimized: false,
                });
            }
        }
        infos.sort_by_key(|i| i.id.map(|id| id.get()).unwrap_or(u32::MAX));
        infos
    }

    fn window_info(&self, id: WindowId) -> Option<WindowServerInfo> {
        let state = self.state.lock();
        state.windows.get_key_value(&id).map(Self::info)
    }

    fn resolve_window_id(&self, pid: Pid, title: Option<&str>) -> Option<WindowId> {
        let state = self.state.lock();
        state
            .windows
            .iter()
            .find(|(_, w)| w.pid == pid && w.title.as_deref() == title)
            .map(|(id, _)| *id)
    }

    fn window_at_point(&self, point: Point) -> Option<WindowId> {
        let state = self.state.lock();
        state
            .windows
            .iter()
            .filter(|(_, w)| !w.minimized && w.frame.contains(point))
            .min_by(|(_, a), (_, b)| {
                a.frame.area().partial_cmp(&b.frame.area()).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(id, _)| *id)
    }

    fn on_screen_windows(&self, display: DisplayId) -> Vec<WindowId> {
        let state = self.state.lock();
        let Some(d) = state.displays.iter().find(|d| d.id == display) else {
            return Vec::new();
        };
        let mut ids: Vec<WindowId> = state
            .windows
            .iter()
            .filter(|(_, w)| w.space == d.active_space && !w.minimized)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn is_window_minimized(&self, id: WindowId) -> bool {
        self.state.lock().windows.get(&id).map(|w| w.minimized).unwrap_or(false)
    }

    fn set_window_position(&self, id: WindowId, position: Point) {
        let mut state = self.state.lock();
        if let Some(w) = state.windows.get_mut(&id) {
            if !w.movable {
                return;
            }
            w.frame.origin = position;
            let frame = w.frame;
            state.frame_history.push((id, frame));
        }
    }

    fn set_window_size(&self, id: WindowId, size: Size) {
        let mut state = self.state.lock();
        if let Some(w) = state.windows.get_mut(&id) {
            if !w.resizable {
                return;
            }
            w.frame.size = size;
            let frame = w.frame;
            state.frame_history.push((id, frame));
        }
    }

    fn register_window_notifications(
        &self,
        id: WindowId,
        wanted: Subscriptions,
    ) -> Result<Subscriptions, WindowServerError> {
        let mut state = self.state.lock();
        if state.fail_window_registration.remove(&id) {
            return Err(WindowServerError::RegistrationFailed);
        }
        if !state.windows.contains_key(&id) {
            return Err(WindowServerError::WindowGone(id));
        }
        Ok(wanted)
    }

    fn unregister_window_notifications(&self, id: WindowId) {
        debug!(?id, "unregister window notifications");
    }

    fn register_application_notifications(&self, pid: Pid) -> Result<(), WindowServerError> {
        let mut state = self.state.lock();
        if let Some(remaining) = state.fail_app_registrations.get_mut(&pid) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WindowServerError::AppUnresponsive(pid));
            }
        }
        Ok(())
    }

    fn unregister_application_notifications(&self, pid: Pid) {
        debug!(pid, "unregister application notifications");
    }

    fn displays(&self) -> Vec<Display> { self.state.lock().displays.clone() }

    fn main_display(&self) -> Option<Display> {
        let state = self.state.lock();
        state
            .focused_display
            .and_then(|id| state.displays.iter().find(|d| d.id == id))
            .or_else(|| state.displays.first())
            .copied()
    }

    fn display_under_cursor(&self) -> Option<Display> {
        let state = self.state.lock();
        let cursor = state.cursor;
        state.displays.iter().find(|d| d.frame.contains(cursor)).copied()
    }

    fn next_display(&self, id: DisplayId) -> Option<Display> {
        let state = self.state.lock();
        let index = state.displays.iter().position(|d| d.id == id)?;
        let next = (index + 1) % state.displays.len();
        state.displays.get(next).copied()
    }

    fn previous_display(&self, id: DisplayId) -> Option<Display> {
        let state = self.state.lock();
        let index = state.displays.iter().position(|d| d.id == id)?;
        let prev = (index + state.displays.len() - 1) % state.displays.len();
        state.displays.get(prev).copied()
    }

    fn display_of_window(&self, id: WindowId) -> Option<Display> {
        let state = self.state.lock();
        let window = state.windows.get(&id)?;
        state
            .displays
            .iter()
            .find(|d| d.active_space == window.space)
            .or_else(|| {
                let center = window.frame.center();
                state.displays.iter().find(|d| d.frame.contains(center))
            })
            .copied()
    }

    fn active_space(&self, display: DisplayId) -> Option<SpaceId> {
        let state = self.state.lock();
        state.displays.iter().find(|d| d.id == display).map(|d| d.active_space)
    }

    fn previous_space(&self, display: DisplayId) -> Option<SpaceId> {
        self.state.lock().previous_spaces.get(&display).copied()
    }

    fn space_has_window(&self, space: SpaceId, id: WindowId) -> bool {
        self.state.lock().windows.get(&id).map(|w| w.space == space).unwrap_or(false)
    }

    fn space_transition_in_progress(&self) -> bool {
        self.state.lock().transition_in_progress
    }

    fn activate_space(&self, space: SpaceId) {
        let mut state = self.state.lock();
        let target = state.focused_display.unwrap_or_else(|| {
            state.displays.first().map(|d| d.id).unwrap_or_default()
        });
        if let Some(d) = state.displays.iter_mut().find(|d| d.id == target) {
            let old = d.active_space;
            d.active_space = space;
            let id = d.id;
            state.previous_spaces.insert(id, old);
        }
    }

    fn move_window_to_space(&self, id: WindowId, space: SpaceId) {
        if let Some(w) = self.state.lock().windows.get_mut(&id) {
            w.space = space;
        }
    }

    fn focus_display(&self, id: DisplayId) {
        self.state.lock().focused_display = Some(id);
    }

    fn focus_window(&self, id: WindowId) {
        self.state.lock().focused = Some(id);
    }

    fn cursor_position(&self) -> Point { self.state.lock().cursor }

    fn warp_cursor(&self, point: Point) {
        self.state.lock().cursor = point;
    }

    fn update_border(&self, kind: BorderKind, frame: Option<Rect>) {
        self.state.lock().borders.insert(Self::border_key(kind), frame);
    }
}
