//! Query responses.
//!
//! Scalars are plain text; lists are JSON. Missing ids answer `-1` so
//! scripting clients can test against a single sentinel.

use serde::Serialize;

use crate::command::{QueryCommand, ToggleKind};
use crate::common::config::Toggles;
use crate::model::tree::{NodeId, Tree};
use crate::reactor::Reactor;

#[derive(Serialize)]
struct WindowEntry {
    id: u32,
    pid: i32,
    title: Option<String>,
    floating: bool,
    minimized: bool,
}

#[derive(Serialize)]
struct ScratchpadEntryOut {
    slot: u32,
    window: u32,
    hidden: bool,
}

impl Reactor {
    pub(crate) fn run_query(&mut self, query: QueryCommand) -> String {
        match query {
            QueryCommand::TilingMode => self.settings.space_mode.to_string(),
            QueryCommand::SplitMode => self.settings.split_preference.to_string(),
            QueryCommand::SplitRatio => format!("{}", self.settings.split_ratio),
            QueryCommand::SpawnPosition => {
                if self.settings.has(Toggles::SPAWN_AS_LEFT_CHILD) {
                    "left".into()
                } else {
                    "right".into()
                }
            }
            QueryCommand::Toggle(kind) => {
                let toggle = match kind {
                    ToggleKind::FocusFollowsMouse => Toggles::FOCUS_FOLLOWS_MOUSE,
                    ToggleKind::MouseFollowsFocus => Toggles::MOUSE_FOLLOWS_FOCUS,
                    ToggleKind::LockToContainer => Toggles::LOCK_TO_CONTAINER,
                    ToggleKind::FloatNonResizable => Toggles::FLOAT_NON_RESIZABLE,
                    ToggleKind::CenterOnFloat => Toggles::CENTER_ON_FLOAT,
                    ToggleKind::MouseDrag => Toggles::MOUSE_DRAG,
                };
                if self.settings.has(toggle) { "on".into() } else { "off".into() }
            }
            QueryCommand::SpaceId => self
                .main_display()
                .map(|d| d.active_space.0.to_string())
                .unwrap_or_else(|| "-1".into()),
            QueryCommand::PreviousSpaceId => self
                .main_display()
                .and_then(|d| self.server.previous_space(d.id))
                .map(|space| space.0.to_string())
                .unwrap_or_else(|| "-1".into()),
            QueryCommand::SpaceName => self
                .main_display()
                .map(|d| Reactor::space_key(&d))
                .and_then(|key| self.spaces.get(&key))
                .and_then(|space| space.settings.name.clone())
                .unwrap_or_default(),
            QueryCommand::SpaceMode => self
                .main_display()
                .map(|d| Reactor::space_key(&d))
                .and_then(|key| self.spaces.get(&key))
                .map(|space| space.mode().to_string())
                .unwrap_or_else(|| self.settings.space_mode.to_string()),
            QueryCommand::FocusedWindowId => self
                .focused_window()
                .and_then(|w| w.id)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-1".into()),
            QueryCommand::FocusedWindowName => self
                .focused_window()
                .and_then(|w| w.title)
                .unwrap_or_default(),
            QueryCommand::FocusedWindowFloat => self
                .focused_window()
                .map(|w| if w.is_floating() { "on".into() } else { "off".into() })
                .unwrap_or_else(|| "off".into()),
            QueryCommand::MarkedWindowId => self
                .marked
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-1".into()),
            QueryCommand::MarkedWindowName => self
                .marked
                .and_then(|id| self.registry.window(id))
                .and_then(|w| w.title)
                .unwrap_or_default(),
            QueryCommand::WindowList => {
                let entries: Vec<WindowEntry> = self
                    .registry
                    .all_windows()
                    .into_iter()
                    .filter_map(|w| {
                        Some(WindowEntry {
                            id: w.id?.get(),
                            pid: w.pid,
                            title: w.title.clone(),
                            floating: w.is_floating(),
                            minimized: w.is_minimized(),
                        })
                    })
                    .collect();
                serde_json::to_string(&entries).unwrap_or_else(|_| "[]".into())
            }
            QueryCommand::WindowInDirection(direction) => {
                let found = self.focused_window().and_then(|w| w.id).and_then(|id| {
                    let display = self.server.display_of_window(id)?;
                    let key = Reactor::space_key(&display);
                    self.closest_window_in_direction(key, display.frame, id, direction, false)
                });
                found.map(|id| id.to_string()).unwrap_or_else(|| "-1".into())
            }
            QueryCommand::Tree => {
                let Some(display) = self.main_display() else {
                    return String::new();
                };
                let key = Reactor::space_key(&display);
                match self.spaces.get(&key).and_then(|s| s.tree.as_ref()) {
                    Some(tree) => draw_tree(tree),
                    None => "<empty>".into(),
                }
            }
            QueryCommand::Scratchpad => {
                let entries: Vec<ScratchpadEntryOut> = self
                    .scratchpad
                    .entries()
                    .into_iter()
                    .map(|(slot, entry)| ScratchpadEntryOut {
                        slot,
                        window: entry.window.get(),
                        hidden: entry.hidden,
                    })
                    .collect();
                serde_json::to_string(&entries).unwrap_or_else(|_| "[]".into())
            }
        }
    }
}

fn draw_tree(tree: &Tree) -> String {
    let mut out = String::new();
    let _ = ascii_tree::write_tree(&mut out, &ascii_node(tree, tree.root()));
    out
}

fn ascii_node(tree: &Tree, id: NodeId) -> ascii_tree::Tree {
    let Some(node) = tree.node(id) else {
        return ascii_tree::Tree::Leaf(vec!["<gone>".into()]);
    };
    match (tree.left(id), tree.right(id)) {
        (Some(left), Some(right)) => {
            let label = match node.split {
                Some(split) => format!("{:?} {:.2}", split, node.ratio),
                None => "split".into(),
            };
            ascii_tree::Tree::Node(label, vec![ascii_node(tree, left), ascii_node(tree, right)])
        }
        _ => {
            let mut label = match node.window {
                Some(window) => format!("window {window}"),
                None => "empty".into(),
            };
            let links = tree.link_windows(id);
            if !links.is_empty() {
                let ids: Vec<String> = links.iter().map(|w| w.to_string()).collect();
                label.push_str(&format!(" [{}]", ids.join(" ")));
            }
            ascii_tree::Tree::Leaf(vec![label])
        }
    }
}
