//! Window lifecycle handlers.

use tracing::{debug, info};

use crate::common::config::Toggles;
use crate::model::space::SpaceKey;
use crate::model::window::{Application, Window, WindowFlags, WindowId, WindowRole};
use crate::reactor::Reactor;
use crate::rules;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::window_server::{Display, SpaceId, WindowServerInfo};

impl Reactor {
    pub(crate) fn display_for_key(&self, key: SpaceKey) -> Option<Display> {
        self.server.displays().into_iter().find(|d| d.id == key.display)
    }

    /// The space whose tree currently tracks `id`, if any.
    pub(crate) fn space_of_window(&self, id: WindowId) -> Option<SpaceKey> {
        self.spaces
            .iter()
            .find(|(_, space)| {
                space.tree.as_ref().map(|tree| tree.contains_window(id)).unwrap_or(false)
            })
            .map(|(key, _)| *key)
    }

    pub(crate) fn on_window_created(&mut self, info: WindowServerInfo) {
        if !self.registry.has_application(info.pid) {
            // Window from a process we never saw launch; adopt it.
            let name = self
                .server
                .applications()
                .into_iter()
                .find(|a| a.pid == info.pid)
                .map(|a| a.name)
                .unwrap_or_default();
            self.registry.add_application(Application::new(info.pid, name));
        }
        let app_name = self.registry.application_name(info.pid).unwrap_or_default();

        let mut flags = WindowFlags::empty();
        if info.movable {
            flags |= WindowFlags::MOVABLE;
        }
        if info.resizable {
            flags |= WindowFlags::RESIZABLE;
        }
        if info.minimized {
            flags |= WindowFlags::MINIMIZED;
        }

        let mut window = Window {
            id: info.id,
            pid: info.pid,
            title: info.title.clone(),
            position: info.frame.origin,
            size: info.frame.size,
            role: info.role,
            flags,
        };

        let outcome = rules::apply_rules(&self.rules, &app_name, info.title.as_deref());
        if outcome.float {
            window.flags |= WindowFlags::FLOATING;
        }
        if outcome.role.is_some() {
            window.role = WindowRole::Custom;
        }
        if !info.resizable && self.settings.has(Toggles::FLOAT_NON_RESIZABLE) {
            window.flags |= WindowFlags::FLOATING;
        }

        if !self.registry.insert_window(self.server.as_ref(), window.clone()) {
            return;
        }
        let Some(id) = window.id else {
            // Parked until the server assigns an id; rebalance picks it up.
            return;
        };

        if let Some(scratchpad_visible) = outcome.scratchpad {
            let slot = self.scratchpad.add(id);
            debug!(%id, slot, "window routed to scratchpad by rule");
            if !scratchpad_visible {
                return;
            }
        }

        if let Some(space) = outcome.space {
            let target = SpaceId(space as u64);
            let current = self.server.display_of_window(id).map(|d| d.active_space);
            if current != Some(target) {
                self.server.move_window_to_space(id, target);
                debug!(%id, ?target, "window routed to space by rule");
                return;
            }
        } else if let Some(disp) = outcome.display {
            if let Some(target) = self.server.displays().into_iter().find(|d| d.id == disp)
                && self.server.display_of_window(id).map(|d| d.id) != Some(disp)
            {
                self.server.move_window_to_space(id, target.active_space);
                debug!(%id, display = %disp, "window routed to display by rule");
                return;
            }
        }

        if window.is_floating() && self.settings.has(Toggles::CENTER_ON_FLOAT) {
            if let Some(display) = self.server.display_of_window(id) {
                self.center_window(&display, id);
            }
        }

        if window.is_tilable()
            && !self.scratchpad.contains(id)
            && let Some(display) = self.server.display_of_window(id)
            && self.server.space_has_window(display.active_space, id)
        {
            let window = self.registry.window(id).unwrap_or(window);
            self.tile_window(&display, &window);
        }
        self.update_borders();
    }

    pub(crate) fn on_window_destroyed(&mut self, id: WindowId) {
        info!(%id, "window destroyed");
        self.forget_window(id);
        let owner = self.space_of_window(id);
        self.registry.remove_window(self.server.as_ref(), id);
        if let Some(key) = owner
            && let Some(display) = self.display_for_key(key)
        {
            self.remove_window_from_tree(&display, key, id);
            self.rebalance(&display);
        }
        self.update_borders();
    }

    /// Minimized windows never occupy tree slots, but the record stays.
    pub(crate) fn on_window_minimized(&mut self, id: WindowId) {
        self.registry.update_window(id, |w| w.flags |= WindowFlags::MINIMIZED);
        if self.marked == Some(id) {
            self.set_marked(None);
        }
        if let Some(key) = self.space_of_window(id)
            && let Some(display) = self.display_for_key(key)
        {
            self.remove_window_from_tree(&display, key, id);
            self.apply_tree(key);
        }
        self.update_borders();
    }

    pub(crate) fn on_window_deminimized(&mut self, id: WindowId) {
        self.registry.update_window(id, |w| w.flags.remove(WindowFlags::MINIMIZED));
        let Some(window) = self.registry.window(id) else { return };
        if !window.role.is_manageable() || window.is_floating() {
            return;
        }
        let Some(display) = self.server.display_of_window(id) else { return };
        // Deminimizing can pull focus to a different space before the
        // space-changed notification lands; only tile when the window is
        // really on the active space.
        if !self.server.space_has_window(display.active_space, id) {
            debug!(%id, "deminimized window is not on the active space yet");
            return;
        }
        self.tile_window(&display, &window);
        self.apply_tree(Reactor::space_key(&display));
        self.update_borders();
    }

    pub(crate) fn on_window_focused(&mut self, id: WindowId) {
        let Some(window) = self.registry.window(id) else { return };
        self.registry.set_app_focus(window.pid, Some(id));
        self.focused_app = Some(window.pid);
        if self.settings.has(Toggles::MOUSE_FOLLOWS_FOCUS) {
            self.server.warp_cursor(window.frame().center());
        }
        self.update_borders();
    }

    pub(crate) fn on_window_moved(&mut self, id: WindowId, position: Point) {
        let intrinsic = self
            .registry
            .update_window(id, |w| {
                w.position = position;
                let was = w.flags.contains(WindowFlags::MOVE_INTRINSIC);
                w.flags.remove(WindowFlags::MOVE_INTRINSIC);
                was
            })
            .unwrap_or(false);

        if !intrinsic {
            self.snap_to_container(id);
        }
        self.update_borders();
    }

    pub(crate) fn on_window_resized(&mut self, id: WindowId, size: Size) {
        let intrinsic = self
            .registry
            .update_window(id, |w| {
                w.size = size;
                let was = w.flags.contains(WindowFlags::SIZE_INTRINSIC);
                w.flags.remove(WindowFlags::SIZE_INTRINSIC);
                was
            })
            .unwrap_or(false);

        if !intrinsic {
            self.snap_to_container(id);
        }
        self.update_borders();
    }

    /// Undoes a manual move/resize that would desync a tiled window from its
    /// container, when lock-to-container is on.
    fn snap_to_container(&mut self, id: WindowId) {
        if !self.settings.has(Toggles::LOCK_TO_CONTAINER) {
            return;
        }
        if self.drag.involves(id) {
            return;
        }
        let Some(window) = self.registry.window(id) else { return };
        if window.is_floating() {
            return;
        }
        if let Some(key) = self.space_of_window(id) {
            debug!(%id, "snapping window back to its container");
            self.resize_window_to_container(key, id);
        }
    }

    pub(crate) fn on_window_title_changed(&mut self, id: WindowId, title: Option<String>) {
        self.registry.update_window(id, |w| w.title = title);
    }

    pub(crate) fn center_window(&self, display: &Display, id: WindowId) {
        let Some(window) = self.registry.window(id) else { return };
        let frame = display.frame;
        let size = window.size;
        let centered = Rect::new(
            frame.origin.x + (frame.size.width - size.width) / 2.0,
            frame.origin.y + (frame.size.height - size.height) / 2.0,
            size.width,
            size.height,
        );
        self.apply_window_frame(id, centered);
    }
}
