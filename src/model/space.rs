//! Per-space layout state.

use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::common::config::{SpaceMode, SpaceSettings};
use crate::model::tree::Tree;
use crate::sys::window_server::{DisplayId, SpaceId};

/// Key of a space in the global space map: the display it belongs to plus
/// the platform's space identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceKey {
    pub display: DisplayId,
    pub space: SpaceId,
}

#[derive(Clone, Default)]
pub struct SpaceInfo {
    pub settings: SpaceSettings,
    /// Set once the space has been visited and its tree built (or found to
    /// have nothing to tile).
    pub initialized: bool,
    /// A display resolution change happened while this space was inactive;
    /// its containers need recomputing on the next visit.
    pub resolution_changed: bool,
    pub tree: Option<Tree>,
}

impl SpaceInfo {
    pub fn new(settings: SpaceSettings) -> SpaceInfo {
        SpaceInfo {
            settings,
            initialized: false,
            resolution_changed: false,
            tree: None,
        }
    }

    pub fn mode(&self) -> SpaceMode { self.settings.mode }

    pub fn is_tiling(&self) -> bool { self.settings.mode != SpaceMode::Float }
}

pub type SpaceMap = HashMap<SpaceKey, SpaceInfo>;
