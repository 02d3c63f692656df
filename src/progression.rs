//! Player progression
//!
//! Levels, XP and the gem balance carried between rounds. The round engine
//! computes rewards and applies the level curve; storage is behind
//! `ProgressStore`.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence;
use crate::platform::KeyValueStore;
use crate::sim::Difficulty;

/// Persistent player progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    /// XP toward the next level
    pub xp: u64,
    pub total_gems: u64,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            total_gems: 0,
        }
    }
}

/// XP required to go from `level` to `level + 1`
pub fn xp_needed_for_level(level: u32) -> u64 {
    100 + 50 * (level.max(1) as u64 - 1)
}

/// Gems and XP earned by one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundReward {
    pub gems: u64,
    pub xp: u64,
}

impl RoundReward {
    /// Score-derived reward scaled by the difficulty's multipliers
    pub fn for_score(score: u64, difficulty: Difficulty) -> Self {
        let policy = difficulty.policy();
        let gems = (score as f64 / GEMS_PER_SCORE * policy.gem_multiplier).floor() as u64;
        let xp = (score as f64 / XP_SCORE_DIV * policy.xp_multiplier).floor() as u64;
        Self { gems, xp }
    }
}

impl Progress {
    /// Credit a round reward. Returns the number of levels gained.
    pub fn apply(&mut self, reward: &RoundReward) -> u32 {
        self.total_gems = self.total_gems.saturating_add(reward.gems);
        self.add_xp(reward.xp)
    }

    /// Add XP and level up along the standard curve
    pub fn add_xp(&mut self, xp: u64) -> u32 {
        self.add_xp_with(xp, xp_needed_for_level)
    }

    /// Add XP against an arbitrary curve. At most `MAX_LEVEL_UPS_PER_CALL`
    /// levels are granted per call, so a degenerate curve can't spin forever.
    pub fn add_xp_with(&mut self, xp: u64, needed: impl Fn(u32) -> u64) -> u32 {
        self.level = self.level.max(1);
        self.xp = self.xp.saturating_add(xp);

        let mut gained = 0;
        while gained < MAX_LEVEL_UPS_PER_CALL {
            let need = needed(self.level);
            if self.xp < need {
                break;
            }
            self.xp -= need;
            self.level += 1;
            gained += 1;
        }
        gained
    }

    /// Fraction of the way to the next level (HUD xp readout)
    pub fn level_progress(&self) -> f32 {
        let need = xp_needed_for_level(self.level);
        (self.xp as f32 / need as f32).clamp(0.0, 1.0)
    }
}

/// Where progress lives between rounds
pub trait ProgressStore {
    fn load_progress(&self) -> Progress;
    fn save_progress(&mut self, progress: &Progress);
}

/// Progress kept as JSON in a key-value store
pub struct StoredProgress<K: KeyValueStore> {
    store: K,
}

impl<K: KeyValueStore> StoredProgress<K> {
    pub const STORAGE_KEY: &'static str = "tap_rush_progress";

    pub fn new(store: K) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut K {
        &mut self.store
    }
}

impl<K: KeyValueStore> ProgressStore for StoredProgress<K> {
    fn load_progress(&self) -> Progress {
        persistence::load_or_default(&self.store, Self::STORAGE_KEY)
    }

    fn save_progress(&mut self, progress: &Progress) {
        match persistence::save_json(&mut self.store, Self::STORAGE_KEY, progress) {
            Ok(()) => log::info!(
                "Progress saved (level {}, {} gems)",
                progress.level,
                progress.total_gems
            ),
            Err(e) => log::warn!("Progress not saved: {}", e),
        }
    }
}
