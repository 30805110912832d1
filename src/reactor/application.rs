//! Application lifecycle handlers.

use std::time::Duration;

use tracing::{info, warn};

use crate::model::window::{Application, Pid};
use crate::reactor::Reactor;

/// Observer registration retry policy for applications that are slow to
/// respond to introspection calls. This is the only retry loop in the core.
const APP_REGISTRATION_ATTEMPTS: u32 = 3;
const APP_REGISTRATION_DELAY: Duration = Duration::from_millis(10);

impl Reactor {
    pub(crate) fn on_application_launched(&mut self, pid: Pid, name: String) {
        if self.registry.has_application(pid) {
            return;
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.server.register_application_notifications(pid) {
                Ok(()) => break,
                Err(err) if attempts < APP_REGISTRATION_ATTEMPTS => {
                    warn!(pid, %err, attempts, "application observer registration failed, retrying");
                    std::thread::sleep(APP_REGISTRATION_DELAY);
                }
                Err(err) => {
                    warn!(pid, %err, "giving up on application, discarding");
                    return;
                }
            }
        }

        info!(pid, %name, "application registered");
        let mut app = Application::new(pid, name);
        app.retries = attempts - 1;
        self.registry.add_application(app);

        for window in self.server.application_windows(pid) {
            self.on_window_created(window);
        }
    }

    pub(crate) fn on_application_terminated(&mut self, pid: Pid) {
        info!(pid, "application terminated");
        if self.focused_app == Some(pid) {
            self.focused_app = None;
        }
        let Some(app) = self.registry.remove_application(self.server.as_ref(), pid) else {
            return;
        };
        for id in app.windows.keys().copied() {
            self.forget_window(id);
            if let Some(key) = self.space_of_window(id)
                && let Some(display) = self.display_for_key(key)
            {
                self.remove_window_from_tree(&display, key, id);
                self.apply_tree(key);
            }
        }
        if let Some(display) = self.main_display() {
            self.rebalance(&display);
        }
        self.update_borders();
    }

    pub(crate) fn on_application_activated(&mut self, pid: Pid) {
        if self.registry.has_application(pid) {
            self.focused_app = Some(pid);
            self.update_borders();
        }
    }

    /// Hidden applications give their tree slots back but keep their
    /// records.
    pub(crate) fn on_application_hidden(&mut self, pid: Pid) {
        let windows: Vec<_> = self
            .registry
            .all_windows()
            .into_iter()
            .filter(|w| w.pid == pid)
            .filter_map(|w| w.id)
            .collect();
        for id in windows {
            if let Some(key) = self.space_of_window(id)
                && let Some(display) = self.display_for_key(key)
            {
                self.remove_window_from_tree(&display, key, id);
                self.apply_tree(key);
            }
        }
    }

    pub(crate) fn on_application_visible(&mut self, pid: Pid) {
        let windows: Vec<_> =
            self.registry.all_windows().into_iter().filter(|w| w.pid == pid).collect();
        for window in windows {
            if !window.is_tilable() {
                continue;
            }
            let Some(id) = window.id else { continue };
            if let Some(display) = self.server.display_of_window(id)
                && self.server.space_has_window(display.active_space, id)
            {
                self.tile_window(&display, &window);
            }
        }
        if let Some(display) = self.main_display() {
            self.apply_tree(Reactor::space_key(&display));
        }
        self.update_borders();
    }
}
