//! Tap Rush - a reflex "tap the target" arcade game
//!
//! Core modules:
//! - `sim`: Round engine (entities, hit resolution, combo, timers, lifecycle)
//! - `progression`: XP curve, levels and gem rewards
//! - `persistence`: Versioned JSON save/load over a key-value store
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Persisted player preferences
//! - `audio`: Event-driven sound effects
//! - `renderer`: Canvas 2D drawing of the round snapshot

pub mod audio;
pub mod persistence;
pub mod platform;
pub mod progression;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use progression::{Progress, ProgressStore, StoredProgress};
pub use settings::Settings;
pub use sim::{Difficulty, GameEvent, RoundPhase, Session};

/// Game configuration constants
pub mod consts {
    /// Largest simulated step per frame (seconds); longer pauses are clamped
    pub const MAX_FRAME_DT: f32 = 0.033;

    /// Round length in whole seconds
    pub const ROUND_SECONDS: u32 = 45;
    /// Period of the round countdown timer (ms)
    pub const ROUND_TICK_MS: f64 = 1000.0;
    /// Pre-round countdown: 3-2-1, one step every 700ms
    pub const COUNTDOWN_STEPS: u32 = 3;
    pub const COUNTDOWN_STEP_MS: f64 = 700.0;

    /// Target defaults
    pub const ENTITY_RADIUS: f32 = 22.0;
    pub const BASE_SPEED: f32 = 140.0;
    /// Random speed factor range applied to `BASE_SPEED`
    pub const SPEED_JITTER_MIN: f32 = 0.8;
    pub const SPEED_JITTER_MAX: f32 = 1.2;
    /// Lateral drift along the spawn edge (px/s)
    pub const LATERAL_JITTER: f32 = 20.0;
    /// Live target cap
    pub const MAX_ENTITIES: usize = 8;
    /// Distance past the canvas edge (measured from the target's rim) before removal
    pub const EXPIRY_MARGIN: f32 = 20.0;
    /// Idle animation angular rate (rad/s, cosmetic)
    pub const WALK_PHASE_RATE: f32 = 10.0;
    /// Vanish animation length after a scoring hit (seconds)
    pub const HIT_VANISH_SECS: f32 = 0.12;

    /// Combo
    pub const COMBO_TIMEOUT_SECS: f32 = 1.2;
    pub const BASE_POINTS: f64 = 10.0;
    /// Score bonus per player level above 1
    pub const LEVEL_SCORE_BONUS: f64 = 0.01;

    /// Spike penalty
    pub const SPIKE_TIME_PENALTY: u32 = 2;
    pub const FREEZE_MS: f64 = 800.0;

    /// Rewards
    pub const GEMS_PER_SCORE: f64 = 10.0;
    pub const XP_SCORE_DIV: f64 = 5.0;
    /// Upper bound on level-ups applied in one reward call
    pub const MAX_LEVEL_UPS_PER_CALL: u32 = 50;

    /// Visual effects
    pub const MAX_VFX: usize = 64;
    pub const RING_LIFE_SECS: f32 = 0.35;
    pub const RING_GROWTH: f32 = 2.2;
    pub const TEXT_LIFE_SECS: f32 = 0.7;
    pub const TEXT_RISE_SPEED: f32 = 40.0;
}
