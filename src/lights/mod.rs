//! Smart-lighting control
//!
//! - [`DeviceTarget`] / [`ZoneTable`]: the fixed set of named zones and the
//!   bridge device ids behind each one
//! - [`DeviceActuator`]: state-change requests against the bridge, with a
//!   best-effort fallback transport
//! - [`ColorResolver`]: free-text color to bridge chromaticity

mod bridge;
mod color;

use std::fmt;

pub use bridge::{
    BridgeTransport, CurlTransport, DeviceActuator, HttpTransport, LightPayload,
    resource_path,
};
pub use color::{
    ChatCompletion, Chromaticity, ColorResolver, DEFAULT_CHROMATICITY, OpenAiCompletion,
    color_prompt, parse_chromaticity,
};

/// A named lighting zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceTarget {
    Bedroom,
    Fireplace,
    Vine,
    Fox,
    LivingRoom,
}

impl DeviceTarget {
    /// Every zone, in resolution order
    pub const ALL: [Self; 5] = [
        Self::Bedroom,
        Self::Fireplace,
        Self::Vine,
        Self::Fox,
        Self::LivingRoom,
    ];

    /// Substring that identifies this zone in a free-form target name
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bedroom => "bedroom",
            Self::Fireplace => "fire",
            Self::Vine => "vine",
            Self::Fox => "fox",
            Self::LivingRoom => "living",
        }
    }

    /// Resolve a model-supplied target name to a zone
    ///
    /// Case-insensitive substring match; the first zone in [`Self::ALL`]
    /// whose key appears wins, so `"fireplace-zone"` is the fireplace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        Self::ALL.into_iter().find(|zone| name.contains(zone.key()))
    }
}

impl fmt::Display for DeviceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bedroom => "bedroom",
            Self::Fireplace => "fireplace",
            Self::Vine => "vine",
            Self::Fox => "fox",
            Self::LivingRoom => "living_room",
        };
        f.write_str(name)
    }
}

/// Bridge device ids for each zone
///
/// Loaded once at startup. A zone with no ids configured resolves to an
/// empty set, which makes every action on it a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneTable {
    pub bedroom: Vec<String>,
    pub fireplace: Vec<String>,
    pub vine: Vec<String>,
    pub fox: Vec<String>,
    pub living_room: Vec<String>,
}

impl ZoneTable {
    /// Device ids for a zone
    #[must_use]
    pub fn device_ids(&self, target: DeviceTarget) -> &[String] {
        match target {
            DeviceTarget::Bedroom => &self.bedroom,
            DeviceTarget::Fireplace => &self.fireplace,
            DeviceTarget::Vine => &self.vine,
            DeviceTarget::Fox => &self.fox,
            DeviceTarget::LivingRoom => &self.living_room,
        }
    }

    /// Device ids for a free-form target name; empty when nothing matches
    #[must_use]
    pub fn resolve(&self, name: &str) -> &[String] {
        match DeviceTarget::from_name(name) {
            Some(target) => self.device_ids(target),
            None => &[],
        }
    }

    /// Iterate over every zone and its device ids
    pub fn iter(&self) -> impl Iterator<Item = (DeviceTarget, &[String])> {
        DeviceTarget::ALL
            .into_iter()
            .map(|target| (target, self.device_ids(target)))
    }
}
