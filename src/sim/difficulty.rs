//! Difficulty policy
//!
//! Pure lookup from the chosen tier to spawn rhythm, target mix and reward
//! multipliers. Nothing here holds state.

use serde::{Deserialize, Serialize};

use super::state::EntityKind;

/// Difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Parameters for this tier
    pub fn policy(&self) -> &'static DifficultyPolicy {
        match self {
            Difficulty::Easy => &EASY,
            Difficulty::Medium => &MEDIUM,
            Difficulty::Hard => &HARD,
        }
    }
}

/// Spawn and reward parameters for one tier
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyPolicy {
    /// Type weights, sampled as cumulative thresholds in this order
    pub kind_weights: [(EntityKind, f32); 3],
    pub spawn_interval_ms: f32,
    pub gem_multiplier: f64,
    pub xp_multiplier: f64,
}

const EASY: DifficultyPolicy = DifficultyPolicy {
    kind_weights: [
        (EntityKind::Normal, 1.0),
        (EntityKind::Shield, 0.0),
        (EntityKind::Spike, 0.0),
    ],
    spawn_interval_ms: 700.0,
    gem_multiplier: 0.9,
    xp_multiplier: 0.7,
};

const MEDIUM: DifficultyPolicy = DifficultyPolicy {
    kind_weights: [
        (EntityKind::Normal, 0.7),
        (EntityKind::Shield, 0.3),
        (EntityKind::Spike, 0.0),
    ],
    spawn_interval_ms: 500.0,
    gem_multiplier: 1.0,
    xp_multiplier: 1.0,
};

const HARD: DifficultyPolicy = DifficultyPolicy {
    kind_weights: [
        (EntityKind::Normal, 0.6),
        (EntityKind::Shield, 0.25),
        (EntityKind::Spike, 0.15),
    ],
    spawn_interval_ms: 350.0,
    gem_multiplier: 1.25,
    xp_multiplier: 1.4,
};

impl DifficultyPolicy {
    /// Map one uniform sample in `[0, 1)` to a target type
    pub fn pick_kind(&self, roll: f32) -> EntityKind {
        let mut threshold = 0.0;
        // Float sums can land just under 1.0; fall through to the last weighted kind
        let mut last = EntityKind::Normal;
        for &(kind, weight) in &self.kind_weights {
            if weight <= 0.0 {
                continue;
            }
            threshold += weight;
            last = kind;
            if roll < threshold {
                return kind;
            }
        }
        last
    }

    /// Probability of a given type (shown on the start buttons)
    pub fn chance(&self, kind: EntityKind) -> f32 {
        self.kind_weights
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }
}
