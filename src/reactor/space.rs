//! Space and display transition handlers.

use tracing::{debug, info};

use crate::layout::container;
use crate::reactor::Reactor;

impl Reactor {
    /// The active space changed on some display: build or refresh the tree
    /// for what is now visible, then reconcile.
    pub(crate) fn on_space_changed(&mut self) {
        for display in self.server.displays() {
            let key = Reactor::space_key(&display);
            self.ensure_space(key);

            let needs_relayout = self
                .spaces
                .get(&key)
                .map(|space| space.resolution_changed)
                .unwrap_or(false);
            if needs_relayout {
                debug!(?key, "applying deferred re-layout");
                let ctx = self.layout_ctx(display.frame, key);
                if let Some(space) = self.spaces.get_mut(&key) {
                    space.resolution_changed = false;
                    if let Some(tree) = space.tree.as_mut() {
                        container::full_layout(tree, &ctx, false);
                    }
                }
            }

            self.create_window_node_tree(&display);
            self.rebalance(&display);
        }
        self.update_borders();
    }

    /// Display arrangement changed: tear down spaces of departed displays,
    /// adopt the new ones.
    pub(crate) fn on_displays_changed(&mut self) {
        let displays = self.server.displays();
        let live: Vec<_> = displays.iter().map(|d| d.id).collect();

        let stale: Vec<_> =
            self.spaces.keys().filter(|key| !live.contains(&key.display)).copied().collect();
        for key in stale {
            info!(?key, "display gone, tearing down space");
            self.spaces.remove(&key);
        }

        for display in displays {
            self.create_window_node_tree(&display);
            self.rebalance(&display);
        }
        self.update_borders();
    }

    /// A display changed resolution. The active space re-lays out now;
    /// inactive spaces defer until they are next visited.
    pub(crate) fn on_display_resized(&mut self, id: crate::sys::window_server::DisplayId) {
        let Some(display) = self.server.displays().into_iter().find(|d| d.id == id) else {
            return;
        };
        let active = Reactor::space_key(&display);

        let others: Vec<_> = self
            .spaces
            .keys()
            .filter(|key| key.display == id && **key != active)
            .copied()
            .collect();
        for key in others {
            if let Some(space) = self.spaces.get_mut(&key) {
                space.resolution_changed = true;
            }
        }

        self.ensure_space(active);
        let ctx = self.layout_ctx(display.frame, active);
        if let Some(space) = self.spaces.get_mut(&active)
            && let Some(tree) = space.tree.as_mut()
        {
            container::full_layout(tree, &ctx, false);
        }
        self.apply_tree(active);
        self.update_borders();
    }
}
