//! Runtime settings and their defaults.
//!
//! There is no declarative config format: the config file is a script of the
//! same commands the socket accepts, and executing `config …` commands
//! mutates the [`Settings`] held by the reactor.

use std::path::PathBuf;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::collections::HashMap;
use crate::sys::window_server::DisplayId;

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap_or_default().join(".tatami") }

pub fn layouts_dir() -> PathBuf { data_dir().join("layouts") }

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".config").join("tatami").join("tatamirc")
}

/// Tiling mode of a space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum SpaceMode {
    #[default]
    Bsp,
    Monocle,
    Float,
}

/// How the orientation of a new split is chosen when one is not forced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum SplitPreference {
    #[default]
    Optimal,
    Vertical,
    Horizontal,
}

/// Display padding and inter-container gaps.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerOffset {
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub padding_left: f64,
    pub padding_right: f64,
    /// Gap inserted at vertical (side-by-side) splits.
    pub vertical_gap: f64,
    /// Gap inserted at horizontal (stacked) splits.
    pub horizontal_gap: f64,
}

impl Default for ContainerOffset {
    fn default() -> Self {
        ContainerOffset {
            padding_top: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            padding_right: 0.0,
            vertical_gap: 0.0,
            horizontal_gap: 0.0,
        }
    }
}

bitflags! {
    /// Boolean settings toggled from the command interpreter.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Toggles: u32 {
        const MOUSE_FOLLOWS_FOCUS = 1 << 0;
        const FOCUS_FOLLOWS_MOUSE = 1 << 1;
        const CENTER_ON_FLOAT = 1 << 2;
        const SPAWN_AS_LEFT_CHILD = 1 << 3;
        const FLOAT_NON_RESIZABLE = 1 << 4;
        const LOCK_TO_CONTAINER = 1 << 5;
        const MOUSE_DRAG = 1 << 6;
    }
}

bitflags! {
    /// Keyboard modifiers required to arm a drag gesture.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const COMMAND = 1 << 3;
    }
}

impl Modifiers {
    /// Parses a `alt+shift` style modifier spec.
    pub fn from_spec(spec: &str) -> Option<Modifiers> {
        let mut mods = Modifiers::empty();
        for part in spec.split('+') {
            match part.trim() {
                "shift" => mods |= Modifiers::SHIFT,
                "ctrl" | "control" => mods |= Modifiers::CONTROL,
                "alt" | "option" => mods |= Modifiers::ALT,
                "cmd" | "command" => mods |= Modifiers::COMMAND,
                _ => return None,
            }
        }
        if mods.is_empty() { None } else { Some(mods) }
    }
}

/// Settings a space is created with. Resolution order when a space is first
/// visited: explicit per-space entry, then per-display entry, then the
/// global defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceSettings {
    pub mode: SpaceMode,
    pub offset: ContainerOffset,
    /// Saved layout to overlay when the space's tree is first built.
    pub layout: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub space_mode: SpaceMode,
    pub split_preference: SplitPreference,
    pub split_ratio: f64,
    pub optimal_ratio: f64,
    pub default_offset: ContainerOffset,
    pub toggles: Toggles,
    pub drag_modifiers: Modifiers,
    pub display_settings: HashMap<DisplayId, SpaceSettings>,
    pub space_settings: HashMap<(DisplayId, u64), SpaceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            space_mode: SpaceMode::Bsp,
            split_preference: SplitPreference::Optimal,
            split_ratio: 0.5,
            optimal_ratio: 1.618,
            default_offset: ContainerOffset::default(),
            toggles: Toggles::LOCK_TO_CONTAINER | Toggles::MOUSE_DRAG,
            drag_modifiers: Modifiers::ALT,
            display_settings: HashMap::default(),
            space_settings: HashMap::default(),
        }
    }
}

impl Settings {
    pub fn has(&self, toggle: Toggles) -> bool { self.toggles.contains(toggle) }

    pub fn set_toggle(&mut self, toggle: Toggles, on: bool) { self.toggles.set(toggle, on); }

    /// Settings for a space that has not been visited before.
    pub fn space_settings_for(&self, display: DisplayId, space: u64) -> SpaceSettings {
        if let Some(settings) = self.space_settings.get(&(display, space)) {
            return settings.clone();
        }
        if let Some(settings) = self.display_settings.get(&display) {
            return settings.clone();
        }
        SpaceSettings {
            mode: self.space_mode,
            offset: self.default_offset,
            layout: None,
            name: None,
        }
    }
}
