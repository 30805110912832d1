//! Event dispatch.
//!
//! All tree-mutating work happens on one dedicated worker thread that drains
//! a FIFO channel of typed [`Event`]s. Producers (platform notification
//! callbacks, the socket daemon, the input tap) enqueue and never block.
//! Handlers run strictly serially, which is what makes the tree safe to
//! mutate without a lock of its own; the registry keeps its own mutex for
//! synchronous lookups from other threads.

mod application;
mod commands;
mod drag;
mod query;
mod space;
mod tiling;
mod window;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

pub use drag::DragState;

use crate::command::Command;
use crate::common::config::{Modifiers, Settings};
use crate::layout::container::LayoutContext;
use crate::model::registry::Registry;
use crate::model::space::{SpaceInfo, SpaceKey, SpaceMap};
use crate::model::window::{Pid, Window, WindowFlags, WindowId};
use crate::rules::Rule;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::window_server::{
    BorderKind, Display, MouseButton, WindowServer, WindowServerInfo,
};

/// Bound on the transition poll so a stuck predicate cannot wedge the
/// worker forever.
const TRANSITION_POLL_LIMIT: u32 = 1000;
const TRANSITION_POLL_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Clone, Debug)]
pub enum Event {
    ApplicationLaunched { pid: Pid, name: String },
    ApplicationTerminated(Pid),
    ApplicationActivated(Pid),
    ApplicationHidden(Pid),
    ApplicationVisible(Pid),

    WindowCreated(WindowServerInfo),
    WindowDestroyed(WindowId),
    WindowMinimized(WindowId),
    WindowDeminimized(WindowId),
    WindowFocused(WindowId),
    WindowMoved { id: WindowId, position: Point },
    WindowResized { id: WindowId, size: Size },
    WindowTitleChanged { id: WindowId, title: Option<String> },

    SpaceChanged,
    DisplaysChanged,
    DisplayResized(crate::sys::window_server::DisplayId),

    MouseMoved(Point),
    MouseDown { button: MouseButton, location: Point, modifiers: Modifiers },
    MouseDragged { button: MouseButton, location: Point },
    MouseUp { button: MouseButton, location: Point },

    Command {
        command: Command,
        reply: Option<crossbeam_channel::Sender<String>>,
    },
}

/// Fire-and-forget handle producers use to enqueue events.
#[derive(Clone)]
pub struct EventSender(crossbeam_channel::Sender<Event>);

impl EventSender {
    pub fn send(&self, event: Event) {
        // A send error only means the reactor is shutting down.
        let _ = self.0.send(event);
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("reactor::EventSender(...)")
    }
}

/// Numbered slots of windows parked outside the tree.
#[derive(Default)]
pub struct Scratchpad {
    slots: BTreeMap<u32, ScratchpadEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScratchpadEntry {
    pub window: WindowId,
    pub hidden: bool,
}

impl Scratchpad {
    pub fn add(&mut self, window: WindowId) -> u32 {
        let slot = (0..).find(|slot| !self.slots.contains_key(slot)).unwrap_or(0);
        self.slots.insert(slot, ScratchpadEntry { window, hidden: false });
        slot
    }

    pub fn remove_window(&mut self, window: WindowId) -> Option<u32> {
        let slot = self.slot_of(window)?;
        self.slots.remove(&slot);
        Some(slot)
    }

    pub fn window_at(&self, slot: u32) -> Option<WindowId> {
        self.slots.get(&slot).map(|e| e.window)
    }

    pub fn slot_of(&self, window: WindowId) -> Option<u32> {
        self.slots.iter().find(|(_, e)| e.window == window).map(|(slot, _)| *slot)
    }

    pub fn contains(&self, window: WindowId) -> bool { self.slot_of(window).is_some() }

    pub fn set_hidden(&mut self, slot: u32, hidden: bool) -> bool {
        match self.slots.get_mut(&slot) {
            Some(entry) => {
                entry.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn is_hidden(&self, slot: u32) -> bool {
        self.slots.get(&slot).map(|e| e.hidden).unwrap_or(false)
    }

    pub fn entries(&self) -> Vec<(u32, ScratchpadEntry)> {
        self.slots.iter().map(|(slot, entry)| (*slot, *entry)).collect()
    }
}

pub struct Reactor {
    pub(crate) server: Arc<dyn WindowServer>,
    pub(crate) registry: Registry,
    pub(crate) settings: Settings,
    pub(crate) spaces: SpaceMap,
    pub(crate) rules: Vec<Rule>,
    pub(crate) marked: Option<WindowId>,
    pub(crate) focused_app: Option<Pid>,
    pub(crate) scratchpad: Scratchpad,
    pub(crate) drag: DragState,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) layouts_dir: PathBuf,
    quitting: bool,
}

impl Reactor {
    pub fn new(
        server: Arc<dyn WindowServer>,
        settings: Settings,
        config_path: Option<PathBuf>,
        layouts_dir: PathBuf,
    ) -> Reactor {
        Reactor {
            server,
            registry: Registry::new(),
            settings,
            spaces: SpaceMap::default(),
            rules: Vec::new(),
            marked: None,
            focused_app: None,
            scratchpad: Scratchpad::default(),
            drag: DragState::default(),
            config_path,
            layouts_dir,
            quitting: false,
        }
    }

    /// Starts the worker thread and returns the enqueue handle.
    pub fn spawn(mut self) -> (EventSender, JoinHandle<()>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name("reactor".into())
            .spawn(move || {
                self.bootstrap();
                self.run(rx);
            })
            .expect("spawning the reactor thread");
        (EventSender(tx), handle)
    }

    /// Discovers already-running applications and tiles the active spaces.
    pub fn bootstrap(&mut self) {
        let apps = self.server.applications();
        info!(count = apps.len(), "discovering running applications");
        for app in apps {
            self.on_application_launched(app.pid, app.name);
        }
        for display in self.server.displays() {
            self.create_window_node_tree(&display);
        }
        self.update_borders();
    }

    fn run(&mut self, rx: crossbeam_channel::Receiver<Event>) {
        while let Ok(event) = rx.recv() {
            self.wait_for_space_transition();
            self.handle_event(event);
            if self.quitting {
                break;
            }
        }
        info!("reactor loop finished");
    }

    /// Defers (never drops) work while a space transition animation is in
    /// progress; window geometry read mid-animation is stale.
    fn wait_for_space_transition(&self) {
        let mut polls = 0;
        while self.server.space_transition_in_progress() {
            polls += 1;
            if polls > TRANSITION_POLL_LIMIT {
                warn!("space transition did not settle, proceeding anyway");
                return;
            }
            std::thread::sleep(TRANSITION_POLL_INTERVAL);
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        debug!(?event, "handling");
        match event {
            Event::ApplicationLaunched { pid, name } => self.on_application_launched(pid, name),
            Event::ApplicationTerminated(pid) => self.on_application_terminated(pid),
            Event::ApplicationActivated(pid) => self.on_application_activated(pid),
            Event::ApplicationHidden(pid) => self.on_application_hidden(pid),
            Event::ApplicationVisible(pid) => self.on_application_visible(pid),

            Event::WindowCreated(info) => self.on_window_created(info),
            Event::WindowDestroyed(id) => self.on_window_destroyed(id),
            Event::WindowMinimized(id) => self.on_window_minimized(id),
            Event::WindowDeminimized(id) => self.on_window_deminimized(id),
            Event::WindowFocused(id) => self.on_window_focused(id),
            Event::WindowMoved { id, position } => self.on_window_moved(id, position),
            Event::WindowResized { id, size } => self.on_window_resized(id, size),
            Event::WindowTitleChanged { id, title } => self.on_window_title_changed(id, title),

            Event::SpaceChanged => self.on_space_changed(),
            Event::DisplaysChanged => self.on_displays_changed(),
            Event::DisplayResized(id) => self.on_display_resized(id),

            Event::MouseMoved(location) => self.on_mouse_moved(location),
            Event::MouseDown { button, location, modifiers } => {
                self.on_mouse_down(button, location, modifiers)
            }
            Event::MouseDragged { button, location } => self.on_mouse_dragged(button, location),
            Event::MouseUp { button, location } => self.on_mouse_up(button, location),

            Event::Command { command, reply } => self.handle_command(command, reply),
        }
    }

    pub(crate) fn quit(&mut self) { self.quitting = true; }

    // Shared helpers.

    pub(crate) fn main_display(&self) -> Option<Display> { self.server.main_display() }

    pub(crate) fn space_key(display: &Display) -> SpaceKey {
        SpaceKey {
            display: display.id,
            space: display.active_space,
        }
    }

    pub(crate) fn ensure_space(&mut self, key: SpaceKey) {
        if !self.spaces.contains_key(&key) {
            let settings = self.settings.space_settings_for(key.display, key.space.0);
            self.spaces.insert(key, SpaceInfo::new(settings));
        }
    }

    pub(crate) fn layout_ctx(&self, frame: Rect, key: SpaceKey) -> LayoutContext {
        let offset = self
            .spaces
            .get(&key)
            .map(|space| space.settings.offset)
            .unwrap_or(self.settings.default_offset);
        LayoutContext {
            display_frame: frame,
            offset,
            optimal_ratio: self.settings.optimal_ratio,
        }
    }

    pub(crate) fn focused_window(&self) -> Option<Window> {
        let pid = self.focused_app?;
        let id = self.registry.app_focus(pid)?;
        self.registry.window(id)
    }

    /// Moves and resizes a window, flagging the change as self-initiated so
    /// the resulting notifications do not trigger lock-to-container
    /// snapping.
    pub(crate) fn apply_window_frame(&self, id: WindowId, frame: Rect) {
        self.registry.update_window(id, |window| {
            window.flags |= WindowFlags::MOVE_INTRINSIC | WindowFlags::SIZE_INTRINSIC;
            window.position = frame.origin;
            window.size = frame.size;
        });
        self.server.set_window_position(id, frame.origin);
        self.server.set_window_size(id, frame.size);
    }

    pub(crate) fn update_borders(&self) {
        let focused = self.focused_window().map(|w| w.frame());
        self.server.update_border(BorderKind::Focused, focused);
        let marked = self
            .marked
            .and_then(|id| self.registry.window(id))
            .map(|w| w.frame());
        self.server.update_border(BorderKind::Marked, marked);
    }

    pub(crate) fn set_marked(&mut self, marked: Option<WindowId>) {
        self.marked = marked;
        self.update_borders();
    }

    /// Drops stale references to a window that is going away.
    pub(crate) fn forget_window(&mut self, id: WindowId) {
        if self.marked == Some(id) {
            self.set_marked(None);
        }
        self.scratchpad.remove_window(id);
        self.drag.forget_window(id);
    }
}

#[cfg(test)]
mod tests;
