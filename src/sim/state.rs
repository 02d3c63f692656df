//! Round state and core simulation types
//!
//! Everything the round engine mutates lives here. The lifecycle controller
//! (`Session`) is the only owner; other modules borrow what they need.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;
use crate::consts::*;

/// Target types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityKind {
    /// Scores and extends the combo
    #[default]
    Normal,
    /// Breaks the combo and stays on screen
    Shield,
    /// Breaks the combo, freezes input and costs time
    Spike,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Normal => "normal",
            EntityKind::Shield => "shield",
            EntityKind::Spike => "spike",
        }
    }
}

/// A moving tappable target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub pos: Vec2,
    /// Velocity in px/s
    pub vel: Vec2,
    pub radius: f32,
    pub kind: EntityKind,
    /// Resolved by a tap and playing its vanish animation
    pub hit: bool,
    /// Remaining vanish time (seconds)
    pub hit_timer: f32,
    /// Idle animation angle (no gameplay effect)
    pub walk_phase: f32,
}

impl Entity {
    pub fn new(id: u32, pos: Vec2, vel: Vec2, kind: EntityKind) -> Self {
        Self {
            id,
            pos,
            vel,
            radius: ENTITY_RADIUS,
            kind,
            hit: false,
            hit_timer: 0.0,
            walk_phase: 0.0,
        }
    }

    /// Still on the field and tappable
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.hit
    }

    /// Squared-distance containment test
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance_squared(point) <= self.radius * self.radius
    }

    /// Start the vanish animation. Removal happens on the next population tick.
    pub fn mark_hit(&mut self) {
        self.hit = true;
        self.hit_timer = HIT_VANISH_SECS;
    }

    /// Whole disc is more than `EXPIRY_MARGIN` past any canvas edge
    pub fn is_off_screen(&self, bounds: &Bounds) -> bool {
        let reach = self.radius + EXPIRY_MARGIN;
        self.pos.x < -reach
            || self.pos.y < -reach
            || self.pos.x > bounds.width + reach
            || self.pos.y > bounds.height + reach
    }
}

/// Playable canvas area in CSS pixels (device pixel ratio already divided out)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when a target of `radius` cannot be placed along both axes.
    /// Unsized (zero or NaN) canvases count as degenerate.
    pub fn is_degenerate(&self, radius: f32) -> bool {
        !(self.width > 2.0 * radius && self.height > 2.0 * radius)
    }
}

/// Round lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Waiting for a difficulty and a start trigger
    #[default]
    Idle,
    /// 3-2-1 before play; `remaining` is the number currently shown
    Countdown { remaining: u32 },
    /// Round in progress
    Active,
    /// Round finalized, summary available
    Ended,
}

/// Why a round finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The 1-second timer reached zero
    TimeUp,
    /// A spike hit drained the remaining time
    SpikePenalty,
}

/// Final result of a round, after rewards were applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub score: u64,
    pub difficulty: Difficulty,
    pub gems_earned: u64,
    pub xp_earned: u64,
    pub levels_gained: u32,
    /// Player level after the reward was applied
    pub level: u32,
    pub best_combo: u32,
    pub targets_hit: u32,
    pub reason: EndReason,
}

/// Fire-and-forget notifications for audio, toasts and HUD
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Countdown number shown (3, 2, 1)
    Countdown { remaining: u32 },
    RoundStart { difficulty: Difficulty },
    /// A tap resolved on a target. `combo` is the streak after the hit.
    Hit {
        kind: EntityKind,
        points: u64,
        combo: u32,
    },
    /// A shield or spike hit reset a running combo
    ComboBreak { combo: u32 },
    /// Input suspended by a spike
    Frozen,
    LevelUp { level: u32 },
    RoundEnd(RoundSummary),
}

/// Mutable state of the single active round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub score: u64,
    /// Whole seconds remaining, never negative
    pub time_left: u32,
    /// Consecutive scoring hits
    pub combo: u32,
    /// Seconds until the combo resets
    pub combo_timer: f32,
    pub running: bool,
    /// Fixed for the round's duration
    pub difficulty: Difficulty,
    /// Hit resolution disabled
    pub frozen: bool,
    /// Milliseconds since the last spawn attempt
    pub spawn_accumulator: f32,
    /// Player level captured at round start (score bonus)
    pub level: u32,
    pub best_combo: u32,
    pub targets_hit: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new(Difficulty::default(), 1)
    }
}

impl RoundState {
    pub fn new(difficulty: Difficulty, level: u32) -> Self {
        Self {
            score: 0,
            time_left: ROUND_SECONDS,
            combo: 0,
            combo_timer: 0.0,
            running: false,
            difficulty,
            frozen: false,
            spawn_accumulator: 0.0,
            level: level.max(1),
            best_combo: 0,
            targets_hit: 0,
        }
    }

    /// Score multiplier for the current combo
    pub fn multiplier(&self) -> u32 {
        combo_multiplier(self.combo)
    }
}

/// 4x at 20+, 3x at 10+, 2x at 5+, else 1x
pub fn combo_multiplier(combo: u32) -> u32 {
    match combo {
        20.. => 4,
        10.. => 3,
        5.. => 2,
        _ => 1,
    }
}
