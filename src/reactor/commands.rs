//! Command execution against the reactor state.
//!
//! Commands arrive fully decoded; every variant is matched exhaustively
//! here. Structural misses (no focused window, no tree, node not found) are
//! quiet no-ops, matching the error-handling policy for expected conditions.

use tracing::{info, warn};

use crate::command::{
    Cardinal, Command, ConfigCommand, CycleDirection, DisplayCommand, DisplayTarget, FocusTarget,
    MarkTarget, NodeTypeArg, ScratchpadCommand, SpaceCommand, SpaceTarget, SwapTarget,
    ToggleKind, TreeCommand, WindowCommand, ZoomKind,
};
use crate::common::config::{SpaceMode, Toggles};
use crate::command::{Adjustment, GapAxis, PaddingSide, SpawnPosition};
use crate::layout::{container, serializer};
use crate::model::space::SpaceKey;
use crate::model::tree::{NodeId, NodeKind, Rotation, Tree};
use crate::model::window::{WindowFlags, WindowId};
use crate::reactor::Reactor;
use crate::rules;
use crate::sys::geometry::Rect;
use crate::sys::window_server::{Display, SpaceId};

fn toggles_of(kind: ToggleKind) -> Toggles {
    match kind {
        ToggleKind::FocusFollowsMouse => Toggles::FOCUS_FOLLOWS_MOUSE,
        ToggleKind::MouseFollowsFocus => Toggles::MOUSE_FOLLOWS_FOCUS,
        ToggleKind::LockToContainer => Toggles::LOCK_TO_CONTAINER,
        ToggleKind::FloatNonResizable => Toggles::FLOAT_NON_RESIZABLE,
        ToggleKind::CenterOnFloat => Toggles::CENTER_ON_FLOAT,
        ToggleKind::MouseDrag => Toggles::MOUSE_DRAG,
    }
}

impl Reactor {
    pub(crate) fn handle_command(
        &mut self,
        command: Command,
        reply: Option<crossbeam_channel::Sender<String>>,
    ) {
        match command {
            Command::Quit => {
                info!("quit requested");
                self.quit();
            }
            Command::Query(query) => {
                let response = self.run_query(query);
                if let Some(tx) = reply {
                    let _ = tx.send(response);
                }
            }
            Command::Config(config) => self.handle_config_command(config),
            Command::Window(window) => self.handle_window_command(window),
            Command::Space(space) => self.handle_space_command(space),
            Command::Display(display) => self.handle_display_command(display),
            Command::Tree(tree) => self.handle_tree_command(tree),
            Command::Rule(text) => match rules::parse_rule(&text) {
                Ok(rule) => self.rules.push(rule),
                Err(err) => warn!(%err, "rejecting rule"),
            },
            Command::Scratchpad(scratchpad) => self.handle_scratchpad_command(scratchpad),
        }
    }

    /// Display, space key, and id of the focused window.
    fn focused_context(&self) -> Option<(Display, SpaceKey, WindowId)> {
        let id = self.focused_window()?.id?;
        let display = self.server.display_of_window(id).or_else(|| self.main_display())?;
        Some((display, Reactor::space_key(&display), id))
    }

    /// Runs every command of the config script, logging diagnostics for the
    /// lines that do not parse.
    pub(crate) fn source_config_file(&mut self) {
        let Some(path) = self.config_path.clone() else { return };
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), %err, "cannot read config");
                return;
            }
        };
        let (commands, diagnostics) = crate::command::parse_script(&text);
        for (line, err) in diagnostics {
            warn!(path = %path.display(), line, %err, "bad config line");
        }
        for command in commands {
            self.handle_command(command, None);
        }
    }

    fn handle_config_command(&mut self, command: ConfigCommand) {
        match command {
            ConfigCommand::Reload => self.source_config_file(),
            ConfigCommand::OptimalRatio(ratio) => {
                if ratio > 0.0 {
                    self.settings.optimal_ratio = ratio;
                }
            }
            ConfigCommand::SplitRatio(ratio) => {
                // Same silent clamp policy as node ratios.
                if ratio > 0.0 && ratio < 1.0 {
                    self.settings.split_ratio = ratio;
                }
            }
            ConfigCommand::Spawn(position) => {
                self.settings
                    .set_toggle(Toggles::SPAWN_AS_LEFT_CHILD, position == SpawnPosition::Left);
            }
            ConfigCommand::Tiling(mode) => self.settings.space_mode = mode,
            ConfigCommand::Padding { top, bottom, left, right } => {
                let offset = &mut self.settings.default_offset;
                offset.padding_top = top;
                offset.padding_bottom = bottom;
                offset.padding_left = left;
                offset.padding_right = right;
            }
            ConfigCommand::Gap { vertical, horizontal } => {
                self.settings.default_offset.vertical_gap = vertical;
                self.settings.default_offset.horizontal_gap = horizontal;
            }
            ConfigCommand::SetToggle { toggle, on } => {
                self.settings.set_toggle(toggles_of(toggle), on);
            }
            ConfigCommand::DragModifier(modifiers) => self.settings.drag_modifiers = modifiers,
            ConfigCommand::DisplayMode { display, mode } => {
                self.settings.display_settings.entry(display).or_default().mode = mode;
            }
            ConfigCommand::SpaceDefaults { display, space, mode, layout } => {
                let entry = self.settings.space_settings.entry((display, space)).or_default();
                if let Some(mode) = mode {
                    entry.mode = mode;
                }
                if layout.is_some() {
                    entry.layout = layout;
                }
            }
        }
    }

    fn handle_window_command(&mut self, command: WindowCommand) {
        match command {
            WindowCommand::Focus(target) => self.focus_command(target),
            WindowCommand::FocusMonocle(direction) => self.focus_monocle(direction),
            WindowCommand::Swap(target) => self.swap_command(target),
            WindowCommand::Zoom(kind) => self.zoom_command(kind),
            WindowCommand::ToggleFloat => self.toggle_float(),
            WindowCommand::ResizeToContainer => {
                if let Some((_, key, id)) = self.focused_context() {
                    self.resize_window_to_container(key, id);
                }
            }
            WindowCommand::ToggleSplitMode => self.toggle_split_mode(),
            WindowCommand::SetNodeType(arg) => self.set_node_type(arg),
            WindowCommand::AdjustRatio { delta, direction } => {
                self.adjust_ratio_command(delta, direction)
            }
            WindowCommand::MoveToSpace(target) => self.move_to_space(target),
            WindowCommand::MoveToDisplay(target) => self.move_to_display(target),
            WindowCommand::Detach(direction) => {
                if let Some((display, _, id)) = self.focused_context() {
                    self.detach_and_reinsert(&display, id, direction);
                }
            }
            WindowCommand::DetachMarked => {
                if let Some(marked) = self.marked
                    && let Some((display, _, focused)) = self.focused_context()
                    && marked != focused
                {
                    self.reinsert_next_to(&display, marked, focused);
                    self.set_marked(None);
                }
            }
            WindowCommand::MoveFloating { dx, dy } => {
                if let Some(window) = self.focused_window()
                    && window.is_floating()
                    && let Some(id) = window.id
                {
                    let mut frame = window.frame();
                    frame.origin.x += dx;
                    frame.origin.y += dy;
                    self.apply_window_frame(id, frame);
                    self.update_borders();
                }
            }
            WindowCommand::Mark(target) => self.mark_command(target),
        }
    }

    fn focus_window_and_sync(&mut self, id: WindowId) {
        self.server.focus_window(id);
        self.on_window_focused(id);
    }

    fn focus_command(&mut self, target: FocusTarget) {
        match target {
            FocusTarget::Id(id) => {
                if self.registry.window(id).is_some() {
                    self.focus_window_and_sync(id);
                }
            }
            FocusTarget::Cursor => {
                if let Some(id) = self.server.window_at_point(self.server.cursor_position()) {
                    self.focus_window_and_sync(id);
                }
            }
            FocusTarget::Direction(direction) => {
                let Some((display, key, id)) = self.focused_context() else { return };
                if let Some(next) =
                    self.closest_window_in_direction(key, display.frame, id, direction, true)
                {
                    self.focus_window_and_sync(next);
                }
            }
            FocusTarget::Cycle(direction) => {
                let Some((_, key, id)) = self.focused_context() else { return };
                if let Some(next) = self.cycled_window(key, id, direction) {
                    self.focus_window_and_sync(next);
                }
            }
        }
    }

    /// The next/previous window in tree order, wrapping at the edges. In a
    /// monocle space this walks the root link list instead.
    fn cycled_window(
        &self,
        key: SpaceKey,
        from: WindowId,
        direction: CycleDirection,
    ) -> Option<WindowId> {
        let tree = self.spaces.get(&key)?.tree.as_ref()?;
        let windows = tree.windows();
        if windows.len() < 2 {
            return None;
        }
        let index = windows.iter().position(|w| *w == from)?;
        let next = match direction {
            CycleDirection::Next => (index + 1) % windows.len(),
            CycleDirection::Prev => (index + windows.len() - 1) % windows.len(),
        };
        Some(windows[next])
    }

    /// Cycle focus within the focused leaf's embedded monocle list.
    fn focus_monocle(&mut self, direction: CycleDirection) {
        let Some((_, key, id)) = self.focused_context() else { return };
        let next = {
            let Some(tree) = self.spaces.get(&key).and_then(|s| s.tree.as_ref()) else {
                return;
            };
            let Some(node) = tree.node_for_window(id) else { return };
            let mut cycle = Vec::new();
            if let Some(window) = tree.node(node).and_then(|n| n.window) {
                cycle.push(window);
            }
            cycle.extend(tree.link_windows(node));
            if cycle.len() < 2 {
                return;
            }
            let Some(index) = cycle.iter().position(|w| *w == id) else { return };
            match direction {
                CycleDirection::Next => cycle[(index + 1) % cycle.len()],
                CycleDirection::Prev => cycle[(index + cycle.len() - 1) % cycle.len()],
            }
        };
        self.focus_window_and_sync(next);
    }

    fn swap_command(&mut self, target: SwapTarget) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let mode = self.spaces.get(&key).map(|s| s.mode()).unwrap_or(SpaceMode::Bsp);

        let other = match target {
            SwapTarget::Marked => self.marked.filter(|m| *m != id),
            SwapTarget::Direction(direction) => {
                if mode == SpaceMode::Monocle {
                    // Directional swap degenerates to list order sideways.
                    match direction {
                        Cardinal::East => self.cycled_window(key, id, CycleDirection::Next),
                        Cardinal::West => self.cycled_window(key, id, CycleDirection::Prev),
                        _ => None,
                    }
                } else {
                    self.closest_window_in_direction(key, display.frame, id, direction, true)
                }
            }
            SwapTarget::Cycle(direction) => self.cycled_window(key, id, direction),
        };
        let Some(other) = other else { return };

        let swapped = {
            let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                return;
            };
            match (tree.link_for_window(id), tree.link_for_window(other)) {
                (Some((_, a)), Some((_, b))) => tree.swap_link_windows(a, b),
                _ => match (tree.node_for_window(id), tree.node_for_window(other)) {
                    (Some(a), Some(b)) => tree.swap_node_windows(a, b),
                    _ => false,
                },
            }
        };
        if swapped {
            self.apply_tree(key);
            if target == SwapTarget::Marked {
                self.set_marked(None);
            }
            if self.settings.has(Toggles::MOUSE_FOLLOWS_FOCUS)
                && let Some(window) = self.registry.window(id)
            {
                self.server.warp_cursor(window.frame().center());
            }
            self.update_borders();
        }
    }

    /// Zoom toggles ride on the non-leaf window override: the window id is
    /// written to the root (fullscreen) or the parent, and the window is
    /// sized to that container until something else reshapes the tree.
    fn zoom_command(&mut self, kind: ZoomKind) {
        let Some((_, key, id)) = self.focused_context() else { return };
        let frame = {
            let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                return;
            };
            let Some(leaf) = tree.leaf_for_window(id) else { return };
            let target = match kind {
                ZoomKind::Fullscreen => tree.root(),
                ZoomKind::Parent => match tree.parent(leaf) {
                    Some(parent) => parent,
                    None => return,
                },
            };
            if target == leaf {
                return;
            }
            let zoomed = tree.node(target).and_then(|n| n.window) == Some(id);
            if zoomed {
                if let Some(node) = tree.node_mut(target) {
                    node.window = None;
                }
                tree.node(leaf).map(|n| n.container)
            } else {
                if let Some(node) = tree.node_mut(target) {
                    node.window = Some(id);
                }
                tree.node(target).map(|n| n.container)
            }
        };
        if let Some(frame) = frame {
            self.apply_window_frame(id, frame);
            self.update_borders();
        }
    }

    fn toggle_float(&mut self) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let now_floating = self
            .registry
            .update_window(id, |w| {
                w.flags.toggle(WindowFlags::FLOATING);
                w.flags.contains(WindowFlags::FLOATING)
            })
            .unwrap_or(false);

        if now_floating {
            self.remove_window_from_tree(&display, key, id);
            self.apply_tree(key);
            if self.settings.has(Toggles::CENTER_ON_FLOAT) {
                self.center_window(&display, id);
            }
        } else if let Some(window) = self.registry.window(id) {
            self.tile_window(&display, &window);
            self.apply_tree(key);
        }
        self.update_borders();
    }

    fn toggle_split_mode(&mut self) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let ctx = self.layout_ctx(display.frame, key);
        {
            let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                return;
            };
            let Some(node) = tree.node_for_window(id) else { return };
            let Some(parent) = tree.parent(node) else { return };
            let Some(split) = tree.node(parent).and_then(|n| n.split) else { return };
            if let Some(parent_node) = tree.node_mut(parent) {
                parent_node.split = Some(split.toggled());
            }
            container::resize_subtree(tree, parent, &ctx, false);
        }
        self.apply_tree(key);
    }

    fn set_node_type(&mut self, arg: NodeTypeArg) {
        let Some((_, key, id)) = self.focused_context() else { return };
        let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
            return;
        };
        let Some(node) = tree.node_for_window(id) else { return };
        if node == tree.root() {
            return;
        }
        let Some(current) = tree.node(node).map(|n| n.kind) else { return };
        let kind = match arg {
            NodeTypeArg::Bsp => NodeKind::Tree,
            NodeTypeArg::Monocle => NodeKind::Link,
            NodeTypeArg::Toggle => match current {
                NodeKind::Tree => NodeKind::Link,
                NodeKind::Link => NodeKind::Tree,
            },
        };
        if let Some(n) = tree.node_mut(node) {
            n.kind = kind;
        }
    }

    fn adjust_ratio_command(&mut self, delta: f64, direction: Option<Cardinal>) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let ctx = self.layout_ctx(display.frame, key);

        match direction {
            None => {
                let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                    return;
                };
                let Some(node) = tree.node_for_window(id) else { return };
                let Some(parent) = tree.parent(node) else { return };
                let Some(ratio) = tree.node(parent).map(|n| n.ratio) else { return };
                // Out-of-range results leave the ratio untouched.
                if tree.set_ratio(parent, ratio + delta) {
                    container::resize_subtree(tree, parent, &ctx, false);
                }
            }
            Some(direction) => {
                let target =
                    self.closest_window_in_direction(key, display.frame, id, direction, false);
                let Some(target) = target else { return };
                let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                    return;
                };
                let (Some(node), Some(other)) =
                    (tree.node_for_window(id), tree.node_for_window(target))
                else {
                    return;
                };
                let Some(ancestor) = tree.lowest_common_ancestor(node, other) else { return };
                // Growing toward a neighbor on the right subtree means
                // shrinking the ancestor's first half.
                let delta = if is_in_left_subtree(tree, ancestor, node) { delta } else { -delta };
                let Some(ratio) = tree.node(ancestor).map(|n| n.ratio) else { return };
                if tree.set_ratio(ancestor, ratio + delta) {
                    container::resize_subtree(tree, ancestor, &ctx, false);
                }
            }
        }
        self.apply_tree(key);
    }

    fn move_to_space(&mut self, target: SpaceTarget) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let destination = match target {
            SpaceTarget::Previous => match self.server.previous_space(display.id) {
                Some(space) => space,
                None => return,
            },
            SpaceTarget::Index(index) => SpaceId(index as u64),
        };
        if destination == display.active_space {
            return;
        }
        self.remove_window_from_tree(&display, key, id);
        self.apply_tree(key);
        self.server.move_window_to_space(id, destination);
        self.rebalance(&display);
        self.update_borders();
    }

    fn move_to_display(&mut self, target: DisplayTarget) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let destination = match target {
            DisplayTarget::Cycle(CycleDirection::Next) => self.server.next_display(display.id),
            DisplayTarget::Cycle(CycleDirection::Prev) => self.server.previous_display(display.id),
            DisplayTarget::Id(target) => {
                self.server.displays().into_iter().find(|d| d.id == target)
            }
        };
        let Some(destination) = destination else { return };
        if destination.id == display.id {
            return;
        }
        self.remove_window_from_tree(&display, key, id);
        self.apply_tree(key);
        self.server.move_window_to_space(id, destination.active_space);
        self.rebalance(&display);
        self.rebalance(&destination);
        self.update_borders();
    }

    fn mark_command(&mut self, target: MarkTarget) {
        match target {
            MarkTarget::Focused => {
                let marked = self.focused_window().and_then(|w| w.id);
                self.set_marked(marked);
            }
            MarkTarget::Direction { direction, wrap } => {
                let Some((display, key, id)) = self.focused_context() else { return };
                if let Some(found) =
                    self.closest_window_in_direction(key, display.frame, id, direction, wrap)
                {
                    self.set_marked(Some(found));
                }
            }
        }
    }

    fn handle_space_command(&mut self, command: SpaceCommand) {
        match command {
            SpaceCommand::SetMode(mode) => {
                if let Some(display) = self.main_display() {
                    self.reset_tree_mode(&display, mode);
                }
            }
            SpaceCommand::Refresh => {
                if let Some(display) = self.main_display() {
                    self.apply_tree(Reactor::space_key(&display));
                }
            }
            SpaceCommand::Padding(adjustment, side) => {
                self.adjust_space_offset(|offset, amount| match side {
                    PaddingSide::Left => offset.padding_left += amount,
                    PaddingSide::Right => offset.padding_right += amount,
                    PaddingSide::Top => offset.padding_top += amount,
                    PaddingSide::Bottom => offset.padding_bottom += amount,
                    PaddingSide::All => {
                        offset.padding_left += amount;
                        offset.padding_right += amount;
                        offset.padding_top += amount;
                        offset.padding_bottom += amount;
                    }
                }, adjustment);
            }
            SpaceCommand::Gap(adjustment, axis) => {
                self.adjust_space_offset(|offset, amount| match axis {
                    GapAxis::Vertical => offset.vertical_gap += amount,
                    GapAxis::Horizontal => offset.horizontal_gap += amount,
                    GapAxis::All => {
                        offset.vertical_gap += amount;
                        offset.horizontal_gap += amount;
                    }
                }, adjustment);
            }
            SpaceCommand::Name(name) => {
                if let Some(display) = self.main_display() {
                    let key = Reactor::space_key(&display);
                    self.ensure_space(key);
                    if let Some(space) = self.spaces.get_mut(&key) {
                        space.settings.name = Some(name);
                    }
                }
            }
        }
    }

    fn adjust_space_offset(
        &mut self,
        mutate: impl FnOnce(&mut crate::common::config::ContainerOffset, f64),
        adjustment: Adjustment,
    ) {
        let amount = match adjustment {
            Adjustment::Increase => 10.0,
            Adjustment::Decrease => -10.0,
        };
        let Some(display) = self.main_display() else { return };
        let key = Reactor::space_key(&display);
        self.ensure_space(key);
        if let Some(space) = self.spaces.get_mut(&key) {
            mutate(&mut space.settings.offset, amount);
            clamp_offset(&mut space.settings.offset);
        }
        let ctx = self.layout_ctx(display.frame, key);
        if let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) {
            container::full_layout(tree, &ctx, false);
        }
        self.apply_tree(key);
    }

    fn handle_display_command(&mut self, command: DisplayCommand) {
        match command {
            DisplayCommand::Focus(target) => {
                let Some(current) = self.main_display() else { return };
                let destination = match target {
                    DisplayTarget::Cycle(CycleDirection::Next) => {
                        self.server.next_display(current.id)
                    }
                    DisplayTarget::Cycle(CycleDirection::Prev) => {
                        self.server.previous_display(current.id)
                    }
                    DisplayTarget::Id(id) => {
                        self.server.displays().into_iter().find(|d| d.id == id)
                    }
                };
                if let Some(destination) = destination {
                    self.server.focus_display(destination.id);
                }
            }
            DisplayCommand::SetSplitPreference(preference) => {
                self.settings.split_preference = preference;
            }
        }
    }

    fn handle_tree_command(&mut self, command: TreeCommand) {
        match command {
            TreeCommand::PseudoCreate => self.create_pseudo_node(),
            TreeCommand::PseudoDestroy => self.destroy_pseudo_node(),
            TreeCommand::Rotate(degrees) => self.rotate_tree(degrees),
            TreeCommand::Save(name) => {
                let Some(display) = self.main_display() else { return };
                let key = Reactor::space_key(&display);
                let Some(tree) = self.spaces.get(&key).and_then(|s| s.tree.as_ref()) else {
                    return;
                };
                if let Err(err) = serializer::save_layout(&self.layouts_dir, &name, tree) {
                    warn!(%name, %err, "saving layout failed");
                }
            }
            TreeCommand::Restore(name) => self.restore_layout(&name),
        }
    }

    fn create_pseudo_node(&mut self) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let ctx = self.layout_ctx(display.frame, key);
        let spawn_left = self.settings.has(Toggles::SPAWN_AS_LEFT_CHILD);
        let preference = self.settings.split_preference;
        let ratio = self.settings.split_ratio;
        {
            let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                return;
            };
            let Some(leaf) = tree.leaf_for_window(id) else { return };
            let container = tree.node(leaf).map(|n| n.container).unwrap_or_default();
            let orientation =
                container::resolve_orientation(preference, &container, ctx.optimal_ratio);
            tree.insert_leaf_pair(leaf, Some(id), None, orientation, ratio, spawn_left);
            container::resize_subtree(tree, leaf, &ctx, false);
        }
        self.apply_tree(key);
    }

    fn destroy_pseudo_node(&mut self) {
        let Some((display, key, id)) = self.focused_context() else { return };
        let ctx = self.layout_ctx(display.frame, key);
        let collapsed = {
            let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) else {
                return;
            };
            let Some(leaf) = tree.leaf_for_window(id) else { return };
            let collapsed = tree.collapse_pseudo_sibling(leaf);
            if collapsed {
                let root = tree.root();
                container::resize_subtree(tree, root, &ctx, false);
            }
            collapsed
        };
        if collapsed {
            self.apply_tree(key);
        }
    }

    fn rotate_tree(&mut self, degrees: i64) {
        let Ok(rotation) = Rotation::try_from(degrees) else { return };
        let Some(display) = self.main_display() else { return };
        let key = Reactor::space_key(&display);
        if self.spaces.get(&key).map(|s| s.mode()) != Some(SpaceMode::Bsp) {
            return;
        }
        let ctx = self.layout_ctx(display.frame, key);
        if let Some(tree) = self.spaces.get_mut(&key).and_then(|s| s.tree.as_mut()) {
            tree.rotate(rotation);
            container::full_layout(tree, &ctx, false);
        }
        self.apply_tree(key);
    }

    fn restore_layout(&mut self, name: &str) {
        let Some(display) = self.main_display() else { return };
        let key = Reactor::space_key(&display);
        if self.spaces.get(&key).map(|s| s.mode()) != Some(SpaceMode::Bsp) {
            return;
        }
        let shape = match serializer::load_layout(&self.layouts_dir, name) {
            Ok(shape) => shape,
            Err(err) => {
                warn!(name, %err, "restoring layout failed");
                return;
            }
        };
        let ctx = self.layout_ctx(display.frame, key);
        let windows: Vec<WindowId> = self
            .spaces
            .get(&key)
            .and_then(|s| s.tree.as_ref())
            .map(|tree| tree.windows())
            .unwrap_or_else(|| self.windows_on_display(&display));
        if windows.is_empty() {
            return;
        }
        let mut tree: Tree = serializer::tree_from_shape(&shape, self.settings.split_ratio);
        serializer::fill_deserialized_tree(&mut tree, &windows, &ctx);
        if let Some(space) = self.spaces.get_mut(&key) {
            space.tree = Some(tree);
            space.initialized = true;
        }
        self.apply_tree(key);
    }

    fn handle_scratchpad_command(&mut self, command: ScratchpadCommand) {
        match command {
            ScratchpadCommand::Add => {
                let Some((display, key, id)) = self.focused_context() else { return };
                if self.scratchpad.contains(id) {
                    return;
                }
                self.registry.update_window(id, |w| w.flags |= WindowFlags::FLOATING);
                self.remove_window_from_tree(&display, key, id);
                self.apply_tree(key);
                let slot = self.scratchpad.add(id);
                info!(%id, slot, "window added to scratchpad");
            }
            ScratchpadCommand::Remove => {
                let Some((display, key, id)) = self.focused_context() else { return };
                if self.scratchpad.remove_window(id).is_none() {
                    return;
                }
                self.registry.update_window(id, |w| w.flags.remove(WindowFlags::FLOATING));
                if let Some(window) = self.registry.window(id) {
                    self.tile_window(&display, &window);
                }
                self.apply_tree(key);
            }
            ScratchpadCommand::Show(slot) => self.show_scratchpad(slot),
            ScratchpadCommand::Hide(slot) => self.hide_scratchpad(slot),
            ScratchpadCommand::Toggle(slot) => {
                if self.scratchpad.is_hidden(slot) {
                    self.show_scratchpad(slot);
                } else {
                    self.hide_scratchpad(slot);
                }
            }
            ScratchpadCommand::List => {}
        }
    }

    fn show_scratchpad(&mut self, slot: u32) {
        let Some(id) = self.scratchpad.window_at(slot) else { return };
        let Some(display) = self.main_display() else { return };
        self.server.move_window_to_space(id, display.active_space);
        self.scratchpad.set_hidden(slot, false);
        self.center_window(&display, id);
        self.focus_window_and_sync(id);
    }

    /// Hides a scratchpad window by parking it past the display edge; it
    /// keeps its size so `show` can bring it straight back.
    fn hide_scratchpad(&mut self, slot: u32) {
        let Some(id) = self.scratchpad.window_at(slot) else { return };
        let Some(window) = self.registry.window(id) else { return };
        let Some(display) = self.server.display_of_window(id) else { return };
        let parked = Rect::new(
            display.frame.max().x + 64.0,
            window.position.y,
            window.size.width,
            window.size.height,
        );
        self.apply_window_frame(id, parked);
        self.scratchpad.set_hidden(slot, true);
    }
}

fn clamp_offset(offset: &mut crate::common::config::ContainerOffset) {
    offset.padding_left = offset.padding_left.max(0.0);
    offset.padding_right = offset.padding_right.max(0.0);
    offset.padding_top = offset.padding_top.max(0.0);
    offset.padding_bottom = offset.padding_bottom.max(0.0);
    offset.vertical_gap = offset.vertical_gap.max(0.0);
    offset.horizontal_gap = offset.horizontal_gap.max(0.0);
}

/// Whether `node` sits in (or is) the left child subtree of `ancestor`.
fn is_in_left_subtree(tree: &Tree, ancestor: NodeId, node: NodeId) -> bool {
    let mut cursor = node;
    while let Some(parent) = tree.parent(cursor) {
        if parent == ancestor {
            return tree.left(parent) == Some(cursor);
        }
        cursor = parent;
    }
    false
}
