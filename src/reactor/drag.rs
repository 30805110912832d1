//! Interactive drag gestures.
//!
//! Two independent state machines, armed only while the configured modifier
//! combination is held at gesture start: primary-button drags move a window
//! (swap on release), secondary-button drags adjust the split ratios that
//! govern the grabbed window's edges. Releasing with no valid target is a
//! clean no-op and never leaves preview borders or captured ancestors
//! behind.

use tracing::debug;

use crate::command::Cardinal;
use crate::common::config::{Modifiers, Toggles};
use crate::layout::container;
use crate::model::space::SpaceKey;
use crate::model::tree::NodeId;
use crate::model::window::WindowId;
use crate::reactor::Reactor;
use crate::sys::geometry::{Point, Rect};
use crate::sys::window_server::{BorderKind, MouseButton};

/// Ratio changes smaller than this are not applied mid-drag.
const MIN_RATIO_DELTA: f64 = 0.005;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) enum MoveGesture {
    #[default]
    Idle,
    Armed {
        window: WindowId,
    },
    Dragging {
        window: WindowId,
        target: Option<WindowId>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ResizeCapture {
    pub window: WindowId,
    pub key: SpaceKey,
    pub frame: Rect,
    /// Ancestor whose vertical split governs the east/west boundary.
    pub horizontal: Option<NodeId>,
    /// Ancestor whose horizontal split governs the north/south boundary.
    pub vertical: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) enum ResizeGesture {
    #[default]
    Idle,
    Armed(ResizeCapture),
    Dragging(ResizeCapture),
}

#[derive(Default)]
pub struct DragState {
    pub(crate) move_gesture: MoveGesture,
    pub(crate) resize_gesture: ResizeGesture,
}

impl DragState {
    /// Whether a gesture currently references this window (its move/resize
    /// notifications must not trigger lock-to-container snapping).
    pub(crate) fn involves(&self, id: WindowId) -> bool {
        let in_move = match self.move_gesture {
            MoveGesture::Idle => false,
            MoveGesture::Armed { window } => window == id,
            MoveGesture::Dragging { window, target } => window == id || target == Some(id),
        };
        let in_resize = match self.resize_gesture {
            ResizeGesture::Idle => false,
            ResizeGesture::Armed(c) | ResizeGesture::Dragging(c) => c.window == id,
        };
        in_move || in_resize
    }

    pub(crate) fn forget_window(&mut self, id: WindowId) {
        if self.involves(id) {
            self.move_gesture = MoveGesture::Idle;
            self.resize_gesture = ResizeGesture::Idle;
        }
    }
}

impl Reactor {
    pub(crate) fn on_mouse_moved(&mut self, location: Point) {
        if !self.settings.has(Toggles::FOCUS_FOLLOWS_MOUSE) {
            return;
        }
        if let Some(focused) = self.focused_window()
            && focused.frame().contains(location)
        {
            return;
        }
        let Some(id) = self.server.window_at_point(location) else { return };
        let Some(window) = self.registry.window(id) else { return };
        if window.role.is_manageable() {
            self.server.focus_window(id);
            self.on_window_focused(id);
        }
    }

    pub(crate) fn on_mouse_down(&mut self, button: MouseButton, location: Point, modifiers: Modifiers) {
        if !self.settings.has(Toggles::MOUSE_DRAG) {
            return;
        }
        if !modifiers.contains(self.settings.drag_modifiers) {
            return;
        }
        match button {
            MouseButton::Left => self.arm_move_gesture(location),
            MouseButton::Right => self.arm_resize_gesture(location),
        }
    }

    fn arm_move_gesture(&mut self, location: Point) {
        let Some(focused) = self.focused_window().and_then(|w| w.id) else { return };
        if self.server.window_at_point(location) != Some(focused) {
            return;
        }
        debug!(window = %focused, "move gesture armed");
        self.drag.move_gesture = MoveGesture::Armed { window: focused };
    }

    fn arm_resize_gesture(&mut self, location: Point) {
        let Some(display) = self.server.display_under_cursor() else { return };
        let key = Reactor::space_key(&display);
        let Some(tree) = self.spaces.get(&key).and_then(|s| s.tree.as_ref()) else {
            return;
        };
        let Some(leaf) = tree.leaf_at_point(location) else { return };
        let Some(window) = tree.node(leaf).and_then(|n| n.window) else { return };

        // Per axis: the lowest common ancestor shared with the nearest
        // neighbor is the split whose ratio governs that boundary.
        let neighbor_ancestor = |direction: Cardinal, fallback: Cardinal| -> Option<NodeId> {
            let neighbor = self
                .closest_window_in_direction(key, display.frame, window, direction, false)
                .or_else(|| {
                    self.closest_window_in_direction(key, display.frame, window, fallback, false)
                })?;
            let other = tree.node_for_window(neighbor)?;
            tree.lowest_common_ancestor(leaf, other)
        };
        let horizontal = neighbor_ancestor(Cardinal::East, Cardinal::West);
        let vertical = neighbor_ancestor(Cardinal::South, Cardinal::North);
        if horizontal.is_none() && vertical.is_none() {
            return;
        }

        debug!(window = %window, "resize gesture armed");
        self.drag.resize_gesture = ResizeGesture::Armed(ResizeCapture {
            window,
            key,
            frame: display.frame,
            horizontal,
            vertical,
        });
    }

    pub(crate) fn on_mouse_dragged(&mut self, button: MouseButton, location: Point) {
        match button {
            MouseButton::Left => self.drag_move_gesture(location),
            MouseButton::Right => self.drag_resize_gesture(location),
        }
    }

    fn drag_move_gesture(&mut self, location: Point) {
        let window = match self.drag.move_gesture {
            MoveGesture::Idle => return,
            MoveGesture::Armed { window } => window,
            MoveGesture::Dragging { window, .. } => window,
        };

        let target = self
            .server
            .display_under_cursor()
            .map(|d| Reactor::space_key(&d))
            .and_then(|key| {
                let tree = self.spaces.get(&key)?.tree.as_ref()?;
                let leaf = tree.leaf_at_point(location)?;
                tree.node(leaf).and_then(|n| n.window)
            })
            .filter(|t| *t != window);

        // Preview the drop target with the marked indicator border.
        let preview = target
            .and_then(|t| self.registry.window(t))
            .map(|w| w.frame());
        self.server.update_border(BorderKind::Marked, preview);

        self.drag.move_gesture = MoveGesture::Dragging { window, target };
    }

    fn drag_resize_gesture(&mut self, location: Point) {
        let capture = match self.drag.resize_gesture {
            ResizeGesture::Idle => return,
            ResizeGesture::Armed(c) | ResizeGesture::Dragging(c) => c,
        };
        self.drag.resize_gesture = ResizeGesture::Dragging(capture);

        let ctx = self.layout_ctx(capture.frame, capture.key);
        let Some(space) = self.spaces.get_mut(&capture.key) else { return };
        let Some(tree) = space.tree.as_mut() else { return };

        let mut indicator = None;
        for (ancestor, horizontal_axis) in
            [(capture.horizontal, true), (capture.vertical, false)]
        {
            let Some(ancestor) = ancestor else { continue };
            let Some(node) = tree.node(ancestor) else { continue };
            let container = node.container;
            let old_ratio = node.ratio;
            let new_ratio = if horizontal_axis {
                (location.x - container.origin.x) / container.size.width
            } else {
                (location.y - container.origin.y) / container.size.height
            };
            if (new_ratio - old_ratio).abs() <= MIN_RATIO_DELTA {
                continue;
            }
            // set_ratio rejects values outside the open interval.
            if tree.set_ratio(ancestor, new_ratio) {
                container::resize_subtree(tree, ancestor, &ctx, false);
            }
        }
        if let Some(leaf) = tree.leaf_for_window(capture.window) {
            indicator = tree.node(leaf).map(|n| n.container);
        }
        self.server.update_border(BorderKind::Marked, indicator);
    }

    pub(crate) fn on_mouse_up(&mut self, button: MouseButton, location: Point) {
        match button {
            MouseButton::Left => self.finish_move_gesture(location),
            MouseButton::Right => self.finish_resize_gesture(),
        }
    }

    fn finish_move_gesture(&mut self, location: Point) {
        let gesture = std::mem::take(&mut self.drag.move_gesture);
        let MoveGesture::Dragging { window, target } = gesture else {
            // Armed-but-never-dragged (or idle) releases are no-ops.
            self.update_borders();
            return;
        };

        let floating = self
            .registry
            .window(window)
            .map(|w| w.is_floating())
            .unwrap_or(false);
        if floating {
            if let Some(record) = self.registry.window(window) {
                let size = record.size;
                let frame = Rect::new(
                    location.x - size.width / 2.0,
                    location.y - size.height / 2.0,
                    size.width,
                    size.height,
                );
                self.apply_window_frame(window, frame);
            }
        } else if let Some(target) = target
            && let Some(key) = self.space_of_window(window)
        {
            let swapped = {
                let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                    self.update_borders();
                    return;
                };
                match (tree.node_for_window(window), tree.node_for_window(target)) {
                    (Some(a), Some(b)) => tree.swap_node_windows(a, b),
                    _ => false,
                }
            };
            if swapped {
                debug!(%window, %target, "drag swap committed");
                self.apply_tree(key);
                if self.marked == Some(window) || self.marked == Some(target) {
                    self.set_marked(None);
                }
            }
        }
        self.update_borders();
    }

    fn finish_resize_gesture(&mut self) {
        let gesture = std::mem::take(&mut self.drag.resize_gesture);
        if let ResizeGesture::Dragging(capture) = gesture {
            debug!(window = %capture.window, "resize gesture committed");
            self.apply_tree(capture.key);
        }
        self.update_borders();
    }
}
