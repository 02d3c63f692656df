//! Sound effects
//!
//! The event-to-sound mapping and the throttling rules are plain Rust so the
//! headless build and the tests share them. Synthesis lives in `web` and is
//! only built for the browser.

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

use crate::sim::{EntityKind, GameEvent};

/// Combo length at which the combo chime starts layering over taps
pub const COMBO_SOUND_THRESHOLD: u32 = 5;
/// Combo steps that still raise the pitch
pub const COMBO_PITCH_STEPS: u32 = 20;
/// Pitch increase per combo step
pub const COMBO_PITCH_PER_STEP: f32 = 0.015;
/// Taps closer together than this are dropped
pub const TAP_MIN_INTERVAL_MS: f64 = 12.0;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Normal target popped
    Tap,
    /// Combo chime, pitched by combo length
    Combo(u32),
    /// Shield tapped
    Block,
    /// Spike tapped
    Spike,
    /// A running combo was reset
    ComboBreak,
    /// Countdown tick
    Beep,
    /// Round begins
    Go,
    LevelUp,
    RoundEnd,
}

impl SoundEffect {
    /// Sounds to play for a game event, in order
    pub fn for_event(event: &GameEvent) -> Vec<SoundEffect> {
        match event {
            GameEvent::Hit { kind, combo, .. } => match kind {
                EntityKind::Normal if *combo >= COMBO_SOUND_THRESHOLD => {
                    vec![SoundEffect::Tap, SoundEffect::Combo(*combo)]
                }
                EntityKind::Normal => vec![SoundEffect::Tap],
                EntityKind::Shield => vec![SoundEffect::Block],
                EntityKind::Spike => vec![SoundEffect::Spike],
            },
            GameEvent::ComboBreak { .. } => vec![SoundEffect::ComboBreak],
            GameEvent::Countdown { .. } => vec![SoundEffect::Beep],
            GameEvent::RoundStart { .. } => vec![SoundEffect::Go],
            GameEvent::LevelUp { .. } => vec![SoundEffect::LevelUp],
            GameEvent::RoundEnd(_) => vec![SoundEffect::RoundEnd],
            GameEvent::Frozen => Vec::new(),
        }
    }
}

/// Playback-rate multiplier for a combo chime
pub fn combo_pitch(combo: u32) -> f32 {
    1.0 + combo.min(COMBO_PITCH_STEPS) as f32 * COMBO_PITCH_PER_STEP
}

/// Relative loudness for a combo chime
pub fn combo_volume(combo: u32) -> f32 {
    (0.25 + combo.min(COMBO_PITCH_STEPS) as f32 * 0.02).min(0.75)
}

/// Drops taps that arrive faster than `TAP_MIN_INTERVAL_MS`
#[derive(Debug, Clone, Default)]
pub struct TapLimiter {
    last_ms: Option<f64>,
}

impl TapLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a tap at `now_ms` may sound. Accepted taps reset the window.
    pub fn allow(&mut self, now_ms: f64) -> bool {
        if self
            .last_ms
            .is_some_and(|last| now_ms - last < TAP_MIN_INTERVAL_MS)
        {
            return false;
        }
        self.last_ms = Some(now_ms);
        true
    }
}
