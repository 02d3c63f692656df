//! Player preferences
//!
//! Persisted separately from progress, under their own storage key.

use serde::{Deserialize, Serialize};

use crate::persistence;
use crate::platform::KeyValueStore;
use crate::sim::Difficulty;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    pub sound_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Gameplay ===
    /// Last difficulty picked on the start screen
    pub difficulty: Difficulty,

    // === HUD ===
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            difficulty: Difficulty::Medium,
            show_fps: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "tap_rush_settings";

    /// Load settings, falling back to defaults on anything unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut settings: Self = persistence::load_or_default(store, Self::STORAGE_KEY);
        settings.master_volume = settings.master_volume.clamp(0.0, 1.0);
        settings.sfx_volume = settings.sfx_volume.clamp(0.0, 1.0);
        settings
    }

    /// Save settings (best effort)
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match persistence::save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {}", e),
        }
    }

    /// Volume actually applied to sound effects
    pub fn effective_volume(&self) -> f32 {
        if self.sound_enabled {
            self.master_volume * self.sfx_volume
        } else {
            0.0
        }
    }
}
