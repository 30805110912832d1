//! The window/application registry: the single source of truth for window
//! metadata, shared between the reactor worker and threads answering
//! synchronous lookups.
//!
//! Guarded by its own mutex, deliberately distinct from the event queue, so
//! read paths can run from any thread without deadlocking against enqueue.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::common::collections::HashMap;
use crate::model::window::{Application, Pid, Subscriptions, Window, WindowId};
use crate::sys::window_server::{DisplayId, WindowServer};

#[derive(Default)]
struct State {
    apps: HashMap<Pid, Application>,
    /// Windows reported by the server before an id was assigned. They stay
    /// here until the id materializes (see [`Registry::resolve_pending`]).
    pending: Vec<Window>,
}

#[derive(Clone, Default)]
pub struct Registry {
    state: Arc<Mutex<State>>,
}

impl Registry {
    pub fn new() -> Registry { Registry::default() }

    pub fn add_application(&self, app: Application) {
        self.state.lock().apps.insert(app.pid, app);
    }

    pub fn has_application(&self, pid: Pid) -> bool {
        self.state.lock().apps.contains_key(&pid)
    }

    pub fn application_name(&self, pid: Pid) -> Option<String> {
        self.state.lock().apps.get(&pid).map(|a| a.name.clone())
    }

    pub fn applications(&self) -> Vec<Pid> {
        let mut pids: Vec<Pid> = self.state.lock().apps.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    pub fn update_application<R>(
        &self,
        pid: Pid,
        f: impl FnOnce(&mut Application) -> R,
    ) -> Option<R> {
        self.state.lock().apps.get_mut(&pid).map(f)
    }

    /// Removes an application, deregistering every observer first. Returns
    /// the record so the caller can cascade tree removal of its windows.
    pub fn remove_application(&self, server: &dyn WindowServer, pid: Pid) -> Option<Application> {
        let app = {
            let mut state = self.state.lock();
            state.pending.retain(|w| w.pid != pid);
            state.apps.remove(&pid)
        }?;
        for id in app.windows.keys() {
            server.unregister_window_notifications(*id);
        }
        server.unregister_application_notifications(pid);
        Some(app)
    }

    /// Window lookup by id. A linear scan over the application map followed
    /// by a per-application lookup: O(apps), not O(windows), which is the
    /// intended tradeoff.
    pub fn window(&self, id: WindowId) -> Option<Window> {
        let state = self.state.lock();
        for app in state.apps.values() {
            if let Some(window) = app.windows.get(&id) {
                return Some(window.clone());
            }
        }
        None
    }

    pub fn update_window<R>(&self, id: WindowId, f: impl FnOnce(&mut Window) -> R) -> Option<R> {
        let mut state = self.state.lock();
        for app in state.apps.values_mut() {
            if let Some(window) = app.windows.get_mut(&id) {
                return Some(f(window));
            }
        }
        None
    }

    /// Adds a window to its application.
    ///
    /// A window without an id goes to the pending side list. Otherwise the
    /// destroyed/minimized/deminimized observers must register successfully;
    /// a window we cannot observe is not manageable and is discarded.
    pub fn insert_window(&self, server: &dyn WindowServer, window: Window) -> bool {
        let Some(id) = window.id else {
            debug!(pid = window.pid, title = ?window.title, "parking window pending id assignment");
            self.state.lock().pending.push(window);
            return true;
        };

        let wanted = Subscriptions::required()
            | Subscriptions::FOCUSED
            | Subscriptions::MOVED
            | Subscriptions::RESIZED
            | Subscriptions::TITLE_CHANGED;
        let granted = match server.register_window_notifications(id, wanted) {
            Ok(granted) => granted,
            Err(err) => {
                warn!(%id, %err, "observer registration failed, discarding window");
                return false;
            }
        };
        if !granted.contains(Subscriptions::required()) {
            warn!(%id, ?granted, "required observers missing, discarding window");
            server.unregister_window_notifications(id);
            return false;
        }

        let mut state = self.state.lock();
        let Some(app) = state.apps.get_mut(&window.pid) else {
            debug!(pid = window.pid, "window for unknown application");
            return false;
        };
        app.subscriptions |= granted;
        app.windows.insert(id, window);
        true
    }

    /// Removes a window, deregistering its observers.
    pub fn remove_window(&self, server: &dyn WindowServer, id: WindowId) -> Option<Window> {
        let removed = {
            let mut state = self.state.lock();
            let mut removed = None;
            for app in state.apps.values_mut() {
                if let Some(window) = app.windows.remove(&id) {
                    if app.focus == Some(id) {
                        app.focus = None;
                    }
                    removed = Some(window);
                    break;
                }
            }
            removed
        };
        if removed.is_some() {
            server.unregister_window_notifications(id);
        }
        removed
    }

    /// Retries id assignment for parked windows. Windows whose id resolved
    /// are inserted normally and returned so the caller can tile them.
    pub fn resolve_pending(&self, server: &dyn WindowServer) -> Vec<Window> {
        let pending = std::mem::take(&mut self.state.lock().pending);
        let mut resolved = Vec::new();
        let mut still_pending = Vec::new();
        for mut window in pending {
            match server.resolve_window_id(window.pid, window.title.as_deref()) {
                Some(id) => {
                    window.id = Some(id);
                    if self.insert_window(server, window.clone()) {
                        resolved.push(window);
                    }
                }
                None => still_pending.push(window),
            }
        }
        self.state.lock().pending.append(&mut still_pending);
        resolved
    }

    pub fn pending_count(&self) -> usize { self.state.lock().pending.len() }

    pub fn set_app_focus(&self, pid: Pid, focus: Option<WindowId>) {
        if let Some(app) = self.state.lock().apps.get_mut(&pid) {
            app.focus = focus;
        }
    }

    pub fn app_focus(&self, pid: Pid) -> Option<WindowId> {
        self.state.lock().apps.get(&pid).and_then(|a| a.focus)
    }

    pub fn all_windows(&self) -> Vec<Window> {
        let state = self.state.lock();
        let mut windows: Vec<Window> =
            state.apps.values().flat_map(|a| a.windows.values().cloned()).collect();
        windows.sort_by_key(|w| w.id);
        windows
    }

    /// Windows currently visible on `display`: the server's on-screen list,
    /// restricted to known standard/custom windows that are not floating.
    pub fn visible_windows(&self, server: &dyn WindowServer, display: DisplayId) -> Vec<Window> {
        server
            .on_screen_windows(display)
            .into_iter()
            .filter_map(|id| self.window(id))
            .filter(|w| w.role.is_manageable() && !w.is_floating())
            .collect()
    }
}
