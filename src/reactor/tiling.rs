//! Tree lifecycle: building a space's tree from the live window set, adding
//! and removing windows, reconciliation, and pushing computed containers
//! back to the window server.

use tracing::{debug, info};

use crate::command::Cardinal;
use crate::common::collections::HashSet;
use crate::common::config::{SpaceMode, Toggles};
use crate::layout::container::{self, LayoutContext};
use crate::layout::serializer;
use crate::model::space::SpaceKey;
use crate::model::tree::{LinkRemoveOutcome, NodeId, RemoveOutcome, Tree};
use crate::model::window::{Window, WindowId};
use crate::reactor::Reactor;
use crate::sys::geometry::{Point, Rect};
use crate::sys::window_server::Display;

impl Reactor {
    /// Window ids that should occupy tree slots on this display right now.
    pub(crate) fn windows_on_display(&self, display: &Display) -> Vec<WindowId> {
        self.registry
            .visible_windows(self.server.as_ref(), display.id)
            .into_iter()
            .filter(|w| w.is_tilable())
            .filter_map(|w| w.id)
            .filter(|id| !self.scratchpad.contains(*id))
            .collect()
    }

    /// Builds the space's tree from the live window set if it does not have
    /// one yet. Respects a configured saved layout on first build.
    pub(crate) fn create_window_node_tree(&mut self, display: &Display) {
        let key = Self::space_key(display);
        self.ensure_space(key);

        let (mode, layout_name, has_tree) = {
            let space = &self.spaces[&key];
            (space.mode(), space.settings.layout.clone(), space.tree.is_some())
        };
        if has_tree || mode == SpaceMode::Float {
            if let Some(space) = self.spaces.get_mut(&key) {
                space.initialized = true;
            }
            return;
        }

        let windows = self.windows_on_display(display);
        if let Some(space) = self.spaces.get_mut(&key) {
            space.initialized = true;
        }
        if windows.is_empty() {
            return;
        }

        let ctx = self.layout_ctx(display.frame, key);
        let ratio = self.settings.split_ratio;
        let tree = match mode {
            SpaceMode::Bsp => {
                let restored = layout_name.as_deref().and_then(|name| {
                    match serializer::load_layout(&self.layouts_dir, name) {
                        Ok(shape) => {
                            let mut tree = serializer::tree_from_shape(&shape, ratio);
                            serializer::fill_deserialized_tree(&mut tree, &windows, &ctx);
                            Some(tree)
                        }
                        Err(err) => {
                            debug!(name, %err, "saved layout unavailable");
                            None
                        }
                    }
                });
                restored.unwrap_or_else(|| self.build_bsp_tree(&windows, &ctx))
            }
            SpaceMode::Monocle => Self::build_monocle_tree(&windows, &ctx, ratio),
            SpaceMode::Float => unreachable!("handled above"),
        };

        if let Some(space) = self.spaces.get_mut(&key) {
            space.tree = Some(tree);
        }
        info!(?key, windows = windows.len(), ?mode, "built space tree");
        self.apply_tree(key);
    }

    fn build_bsp_tree(&self, windows: &[WindowId], ctx: &LayoutContext) -> Tree {
        let ratio = self.settings.split_ratio;
        let mut tree = Tree::new(ratio);
        let root = tree.root();
        if let Some(node) = tree.node_mut(root) {
            node.window = Some(windows[0]);
        }
        container::full_layout(&mut tree, ctx, false);
        for &window in &windows[1..] {
            let leaf = tree.min_depth_leaf();
            let existing = tree.node(leaf).and_then(|n| n.window);
            let container = tree.node(leaf).map(|n| n.container).unwrap_or_default();
            let orientation = container::resolve_orientation(
                self.settings.split_preference,
                &container,
                ctx.optimal_ratio,
            );
            tree.insert_leaf_pair(
                leaf,
                existing,
                Some(window),
                orientation,
                ratio,
                self.settings.has(Toggles::SPAWN_AS_LEFT_CHILD),
            );
            container::resize_subtree(&mut tree, leaf, ctx, false);
        }
        tree
    }

    fn build_monocle_tree(windows: &[WindowId], ctx: &LayoutContext, ratio: f64) -> Tree {
        let mut tree = Tree::new(ratio);
        container::set_root_container(&mut tree, ctx);
        let root = tree.root();
        let container = tree.node(root).map(|n| n.container).unwrap_or_default();
        for &window in windows {
            tree.push_link(root, window, container);
        }
        tree
    }

    /// Routes a new window into the space's tree.
    pub(crate) fn tile_window(&mut self, display: &Display, window: &Window) {
        let Some(id) = window.id else { return };
        let key = Self::space_key(display);
        self.ensure_space(key);
        let (mode, has_tree) = {
            let space = &self.spaces[&key];
            (space.mode(), space.tree.is_some())
        };
        if mode == SpaceMode::Float {
            return;
        }
        if !has_tree {
            self.create_window_node_tree(display);
            return;
        }
        let already_tracked = self.spaces[&key]
            .tree
            .as_ref()
            .map(|tree| tree.contains_window(id))
            .unwrap_or(false);
        if already_tracked {
            return;
        }
        match mode {
            SpaceMode::Bsp => self.add_window_to_bsp(display, key, id),
            SpaceMode::Monocle => self.add_window_to_monocle(key, id),
            SpaceMode::Float => {}
        }
    }

    fn add_window_to_bsp(&mut self, display: &Display, key: SpaceKey, id: WindowId) {
        let ctx = self.layout_ctx(display.frame, key);
        let marked = self.marked.filter(|m| *m != id);
        let focused = self.focused_window().and_then(|w| w.id).filter(|f| *f != id);
        let spawn_left = self.settings.has(Toggles::SPAWN_AS_LEFT_CHILD);
        let preference = self.settings.split_preference;
        let ratio = self.settings.split_ratio;

        let Some(space) = self.spaces.get_mut(&key) else { return };
        let Some(tree) = space.tree.as_mut() else { return };

        // An empty placeholder slot absorbs the window without a new split.
        if let Some(pseudo) = tree.first_pseudo_leaf() {
            if let Some(node) = tree.node_mut(pseudo) {
                node.window = Some(id);
            }
            let frame = tree.node(pseudo).map(|n| n.container).unwrap_or_default();
            self.apply_window_frame(id, frame);
            return;
        }

        let target = marked
            .and_then(|m| tree.node_for_window(m))
            .or_else(|| focused.and_then(|f| tree.node_for_window(f)))
            .unwrap_or_else(|| tree.min_depth_leaf());

        // Inserting under a zoomed parent un-zooms it first.
        if let Some(parent) = tree.parent(target) {
            let parent_zoom = tree.node(parent).and_then(|n| n.window).is_some()
                && tree.node(parent).and_then(|n| n.window) == tree.node(target).and_then(|n| n.window);
            if parent_zoom
                && let Some(node) = tree.node_mut(parent)
            {
                node.window = None;
            }
        }

        match tree.node(target).map(|n| n.kind) {
            Some(crate::model::tree::NodeKind::Tree) => {
                let existing = tree.node(target).and_then(|n| n.window);
                let container = tree.node(target).map(|n| n.container).unwrap_or_default();
                let orientation =
                    container::resolve_orientation(preference, &container, ctx.optimal_ratio);
                tree.insert_leaf_pair(target, existing, Some(id), orientation, ratio, spawn_left);
                container::resize_subtree(tree, target, &ctx, false);
                self.apply_subtree(key, target);
            }
            Some(crate::model::tree::NodeKind::Link) => {
                let container = tree.node(target).map(|n| n.container).unwrap_or_default();
                tree.push_link(target, id, container);
                self.apply_window_frame(id, container);
            }
            None => {}
        }
    }

    fn add_window_to_monocle(&mut self, key: SpaceKey, id: WindowId) {
        let Some(space) = self.spaces.get_mut(&key) else { return };
        let Some(tree) = space.tree.as_mut() else { return };
        let root = tree.root();
        let container = tree.node(root).map(|n| n.container).unwrap_or_default();
        tree.push_link(root, id, container);
        self.apply_window_frame(id, container);
    }

    /// Removes a window's slot from the space's tree, splicing or dropping
    /// the tree as needed.
    pub(crate) fn remove_window_from_tree(&mut self, display: &Display, key: SpaceKey, id: WindowId) {
        let ctx = self.layout_ctx(display.frame, key);
        let Some(space) = self.spaces.get_mut(&key) else { return };
        let mode = space.mode();
        let Some(tree) = space.tree.as_mut() else { return };

        match mode {
            SpaceMode::Bsp => match tree.remove_leaf(id) {
                RemoveOutcome::Spliced(parent) => {
                    container::resize_subtree(tree, parent, &ctx, false);
                    self.apply_subtree(key, parent);
                }
                RemoveOutcome::TreeEmpty => {
                    space.tree = None;
                }
                RemoveOutcome::NotFound => match tree.remove_link_for_window(id) {
                    LinkRemoveOutcome::ListEmptied(node) if node == tree.root() => {
                        // A bare root list going empty in a BSP space means
                        // the root was a converted monocle leaf; keep the
                        // node, it is a pseudo slot now.
                    }
                    _ => {}
                },
            },
            SpaceMode::Monocle => match tree.remove_link_for_window(id) {
                LinkRemoveOutcome::ListEmptied(node) if node == tree.root() => {
                    space.tree = None;
                }
                _ => {}
            },
            SpaceMode::Float => {}
        }
    }

    /// Reconciles the tree against ground truth: the symmetric difference
    /// between what the server reports visible and what the tree tracks.
    /// Safe to call redundantly; this is what heals dropped notifications.
    pub(crate) fn rebalance(&mut self, display: &Display) {
        let key = Self::space_key(display);
        let Some(space) = self.spaces.get(&key) else { return };
        if !space.initialized {
            return;
        }

        // Windows parked without an id may have been assigned one by now.
        let resolved = self.registry.resolve_pending(self.server.as_ref());
        for window in &resolved {
            debug!(id = ?window.id, "pending window resolved during rebalance");
        }

        // Notifications are best-effort; adopt on-screen windows we never
        // heard about.
        for id in self.server.on_screen_windows(display.id) {
            if self.registry.window(id).is_none()
                && let Some(info) = self.server.window_info(id)
            {
                debug!(%id, "rebalance: adopting unannounced window");
                self.on_window_created(info);
            }
        }

        let visible: Vec<WindowId> = self.windows_on_display(display);
        let visible_set: HashSet<WindowId> = visible.iter().copied().collect();
        let in_tree: Vec<WindowId> = self
            .spaces
            .get(&key)
            .and_then(|s| s.tree.as_ref())
            .map(|tree| tree.windows())
            .unwrap_or_default();
        let tree_set: HashSet<WindowId> = in_tree.iter().copied().collect();

        for id in in_tree.iter().filter(|id| !visible_set.contains(id)) {
            debug!(%id, "rebalance: removing stale tree entry");
            self.remove_window_from_tree(display, key, *id);
        }

        let to_add: Vec<Window> = visible
            .iter()
            .filter(|id| !tree_set.contains(id))
            .filter_map(|id| self.registry.window(*id))
            .collect();
        for window in to_add {
            debug!(id = ?window.id, "rebalance: tiling untracked window");
            self.tile_window(display, &window);
        }

        self.apply_tree(key);
    }

    /// Pushes every computed container back to the window server.
    pub(crate) fn apply_tree(&mut self, key: SpaceKey) {
        let Some(tree) = self.spaces.get(&key).and_then(|s| s.tree.as_ref()) else {
            return;
        };
        let mut frames: Vec<(WindowId, Rect)> = Vec::new();
        for leaf in tree.leaves() {
            if let Some(node) = tree.node(leaf) {
                if let Some(window) = node.window {
                    frames.push((window, node.container));
                }
                for link in tree.links_of(leaf) {
                    if let Some(link) = tree.link(link) {
                        frames.push((link.window, link.container));
                    }
                }
            }
        }
        for (window, frame) in frames {
            self.apply_window_frame(window, frame);
        }
    }

    fn apply_subtree(&self, key: SpaceKey, from: NodeId) {
        let Some(tree) = self.spaces.get(&key).and_then(|s| s.tree.as_ref()) else {
            return;
        };
        let mut frames: Vec<(WindowId, Rect)> = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(node) = tree.node(id) {
                if node.left.is_none() && node.right.is_none() {
                    if let Some(window) = node.window {
                        frames.push((window, node.container));
                    }
                    for link in tree.links_of(id) {
                        if let Some(link) = tree.link(link) {
                            frames.push((link.window, link.container));
                        }
                    }
                }
            }
            if let Some(left) = tree.left(id) {
                stack.push(left);
            }
            if let Some(right) = tree.right(id) {
                stack.push(right);
            }
        }
        for (window, frame) in frames {
            self.apply_window_frame(window, frame);
        }
    }

    /// Discards the tree and rebuilds it in another mode. Rejected while a
    /// space transition is running.
    pub(crate) fn reset_tree_mode(&mut self, display: &Display, mode: SpaceMode) {
        if self.server.space_transition_in_progress() {
            return;
        }
        let key = Self::space_key(display);
        self.ensure_space(key);
        {
            let Some(space) = self.spaces.get_mut(&key) else { return };
            if space.settings.mode == mode {
                return;
            }
            space.tree = None;
            space.initialized = true;
            space.settings.mode = mode;
        }
        self.create_window_node_tree(display);
    }

    pub(crate) fn resize_window_to_container(&self, key: SpaceKey, id: WindowId) {
        let Some(tree) = self.spaces.get(&key).and_then(|s| s.tree.as_ref()) else {
            return;
        };
        if let Some(leaf) = tree.leaf_for_window(id) {
            // A zoom override wins over the leaf's own container.
            let root = tree.root();
            let target = if root != leaf
                && tree.node(root).and_then(|n| n.window) == Some(id)
            {
                root
            } else if let Some(parent) = tree.parent(leaf)
                && tree.node(parent).and_then(|n| n.window) == Some(id)
            {
                parent
            } else {
                leaf
            };
            if let Some(node) = tree.node(target) {
                self.apply_window_frame(id, node.container);
            }
        } else if let Some((_, link)) = tree.link_for_window(id)
            && let Some(link) = tree.link(link)
        {
            self.apply_window_frame(id, link.container);
        }
    }

    /// The closest tiled window in a direction, ranked by angular distance
    /// between container centers; optionally wraps around the display edge.
    pub(crate) fn closest_window_in_direction(
        &self,
        key: SpaceKey,
        frame: Rect,
        from: WindowId,
        direction: Cardinal,
        wrap: bool,
    ) -> Option<WindowId> {
        let tree = self.spaces.get(&key).and_then(|s| s.tree.as_ref())?;
        let from_node = tree.node_for_window(from)?;
        let from_rect = tree.node(from_node)?.container;

        let mut best: Option<(f64, WindowId)> = None;
        for window in tree.windows() {
            if window == from {
                continue;
            }
            let Some(node) = tree.node_for_window(window) else { continue };
            if node == from_node {
                continue;
            }
            let rect = tree.node(node)?.container;
            if !is_in_direction(&from_rect, &rect, direction) {
                continue;
            }
            let Some(rank) =
                directional_rank(from_rect.center(), rect.center(), frame, direction, wrap)
            else {
                continue;
            };
            if best.map(|(b, _)| rank < b).unwrap_or(true) {
                best = Some((rank, window));
            }
        }
        best.map(|(_, window)| window)
    }

    /// Pulls a window out of the tree and reinserts it next to the closest
    /// window in `direction` (or next to an explicit target).
    pub(crate) fn detach_and_reinsert(
        &mut self,
        display: &Display,
        id: WindowId,
        direction: Cardinal,
    ) {
        let key = Self::space_key(display);
        let target =
            self.closest_window_in_direction(key, display.frame, id, direction, false);
        let Some(target) = target else { return };
        self.reinsert_next_to(display, id, target);
    }

    pub(crate) fn reinsert_next_to(&mut self, display: &Display, id: WindowId, target: WindowId) {
        if id == target {
            return;
        }
        let key = Self::space_key(display);
        self.remove_window_from_tree(display, key, id);

        let saved_marked = self.marked;
        self.marked = Some(target);
        if let Some(window) = self.registry.window(id) {
            self.tile_window(display, &window);
        }
        self.marked = saved_marked;
    }
}

/// Container-overlap test for directional motion, matching the original's
/// semantics: vertical movement needs horizontal overlap and distinct rows.
pub(crate) fn is_in_direction(a: &Rect, b: &Rect, direction: Cardinal) -> bool {
    match direction {
        Cardinal::North | Cardinal::South => {
            a.origin.y != b.origin.y
                && f64::max(a.origin.x, b.origin.x) < f64::min(b.max().x, a.max().x)
        }
        Cardinal::East | Cardinal::West => {
            a.origin.x != b.origin.x
                && f64::max(a.origin.y, b.origin.y) < f64::min(b.max().y, a.max().y)
        }
    }
}

/// Ranks a candidate center against the origin center for a direction.
/// Smaller is better; `None` means the candidate lies the wrong way.
pub(crate) fn directional_rank(
    from: Point,
    mut to: Point,
    display_frame: Rect,
    direction: Cardinal,
    wrap: bool,
) -> Option<f64> {
    if wrap {
        match direction {
            Cardinal::North if from.y < to.y => to.y -= display_frame.size.height,
            Cardinal::South if from.y > to.y => to.y += display_frame.size.height,
            Cardinal::East if from.x > to.x => to.x += display_frame.size.width,
            Cardinal::West if from.x < to.x => to.x -= display_frame.size.width,
            _ => {}
        }
    }

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let wrong_side = match direction {
        Cardinal::North => dy >= 0.0,
        Cardinal::East => dx <= 0.0,
        Cardinal::South => dy <= 0.0,
        Cardinal::West => dx >= 0.0,
    };
    if wrong_side {
        return None;
    }

    let angle = dy.atan2(dx);
    let distance = dx.hypot(dy);
    let delta = match direction {
        Cardinal::North => -std::f64::consts::FRAC_PI_2 - angle,
        Cardinal::South => std::f64::consts::FRAC_PI_2 - angle,
        Cardinal::East => -angle,
        Cardinal::West => std::f64::consts::PI - angle.abs(),
    };
    Some(distance / (delta / 2.0).cos())
}
