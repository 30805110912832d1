//! Window and application records.

use std::fmt;
use std::num::NonZeroU32;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::sys::geometry::{Point, Rect, Size};

pub type Pid = i32;

/// Stable id the window server assigns to a window.
///
/// The server reports some windows (notably ones restored from a minimized
/// state at startup) before an id has been assigned; those are represented as
/// `Option<WindowId>` and parked in the registry's pending list until the id
/// materializes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct WindowId(NonZeroU32);

impl WindowId {
    pub fn new(raw: u32) -> Option<WindowId> { NonZeroU32::new(raw).map(WindowId) }

    pub fn get(self) -> u32 { self.0.get() }
}

impl fmt::Debug for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowId({})", self.0.get())
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0.get()) }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowRole {
    Standard,
    Custom,
    #[default]
    Other,
}

impl WindowRole {
    /// Only standard and custom windows participate in tiling.
    pub fn is_manageable(self) -> bool {
        matches!(self, WindowRole::Standard | WindowRole::Custom)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct WindowFlags: u32 {
        const MOVABLE = 1 << 0;
        const RESIZABLE = 1 << 1;
        const MINIMIZED = 1 << 2;
        const FLOATING = 1 << 3;
        /// The next observed position change was initiated by us.
        const MOVE_INTRINSIC = 1 << 4;
        /// The next observed size change was initiated by us.
        const SIZE_INTRINSIC = 1 << 5;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub id: Option<WindowId>,
    pub pid: Pid,
    pub title: Option<String>,
    pub position: Point,
    pub size: Size,
    pub role: WindowRole,
    pub flags: WindowFlags,
}

impl Window {
    pub fn frame(&self) -> Rect {
        Rect {
            origin: self.position,
            size: self.size,
        }
    }

    pub fn is_floating(&self) -> bool { self.flags.contains(WindowFlags::FLOATING) }

    pub fn is_minimized(&self) -> bool { self.flags.contains(WindowFlags::MINIMIZED) }

    /// Whether this window should occupy a tree slot at all.
    pub fn is_tilable(&self) -> bool {
        self.id.is_some() && self.role.is_manageable() && !self.is_floating() && !self.is_minimized()
    }
}

bitflags! {
    /// Which per-window notifications were successfully registered with the
    /// window server. Registration is best-effort; the reconciliation pass
    /// papers over any notification the server never delivers.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Subscriptions: u32 {
        const DESTROYED = 1 << 0;
        const MINIMIZED = 1 << 1;
        const DEMINIMIZED = 1 << 2;
        const FOCUSED = 1 << 3;
        const MOVED = 1 << 4;
        const RESIZED = 1 << 5;
        const TITLE_CHANGED = 1 << 6;
    }
}

impl Subscriptions {
    /// The subscriptions a window must have for its record to be kept.
    pub fn required() -> Subscriptions {
        Subscriptions::DESTROYED | Subscriptions::MINIMIZED | Subscriptions::DEMINIMIZED
    }
}

#[derive(Clone, Debug)]
pub struct Application {
    pub pid: Pid,
    pub name: String,
    /// The application's own notion of its focused window. Weak: the window
    /// lives in `windows`, this is only a key into it.
    pub focus: Option<WindowId>,
    /// Attempts spent registering observers for a slow-to-respond process.
    pub retries: u32,
    pub subscriptions: Subscriptions,
    pub windows: HashMap<WindowId, Window>,
}

impl Application {
    pub fn new(pid: Pid, name: impl Into<String>) -> Application {
        Application {
            pid,
            name: name.into(),
            focus: None,
            retries: 0,
            subscriptions: Subscriptions::empty(),
            windows: HashMap::default(),
        }
    }

    pub fn focused_window(&self) -> Option<&Window> {
        self.focus.and_then(|id| self.windows.get(&id))
    }
}
