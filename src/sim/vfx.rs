//! Ephemeral hit feedback (not gameplay-affecting)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::EntityKind;
use crate::consts::*;

/// What to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VfxKind {
    /// Expanding ring from `start_radius` to `start_radius * RING_GROWTH`
    Ring { start_radius: f32, tint: EntityKind },
    /// Text drifting upward
    FloatText { text: String, tint: EntityKind },
}

/// A visual effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vfx {
    pub kind: VfxKind,
    pub pos: Vec2,
    /// Seconds remaining
    pub life: f32,
    /// Total lifetime in seconds
    pub ttl: f32,
}

impl Vfx {
    pub fn ring(pos: Vec2, start_radius: f32, tint: EntityKind) -> Self {
        Self {
            kind: VfxKind::Ring { start_radius, tint },
            pos,
            life: RING_LIFE_SECS,
            ttl: RING_LIFE_SECS,
        }
    }

    pub fn text(pos: Vec2, text: impl Into<String>, tint: EntityKind) -> Self {
        Self {
            kind: VfxKind::FloatText {
                text: text.into(),
                tint,
            },
            pos,
            life: TEXT_LIFE_SECS,
            ttl: TEXT_LIFE_SECS,
        }
    }

    /// Elapsed fraction, 0 at spawn and 1 at expiry
    pub fn progress(&self) -> f32 {
        if self.ttl <= 0.0 {
            return 1.0;
        }
        (1.0 - self.life / self.ttl).clamp(0.0, 1.0)
    }

    /// Opacity fading out over the lifetime
    pub fn alpha(&self) -> f32 {
        1.0 - self.progress()
    }

    /// Current ring radius, `None` for text
    pub fn ring_radius(&self) -> Option<f32> {
        match self.kind {
            VfxKind::Ring { start_radius, .. } => {
                Some(start_radius * (1.0 + (RING_GROWTH - 1.0) * self.progress()))
            }
            VfxKind::FloatText { .. } => None,
        }
    }
}

/// Live effects, oldest first
#[derive(Debug, Clone, Default)]
pub struct VfxTracker {
    effects: Vec<Vfx>,
}

impl VfxTracker {
    pub fn new() -> Self {
        Self {
            effects: Vec::with_capacity(MAX_VFX),
        }
    }

    pub fn effects(&self) -> &[Vfx] {
        &self.effects
    }

    /// Add an effect, dropping the oldest when full
    pub fn push(&mut self, vfx: Vfx) {
        if self.effects.len() >= MAX_VFX {
            self.effects.remove(0);
        }
        self.effects.push(vfx);
    }

    pub fn tick(&mut self, dt: f32) {
        for vfx in &mut self.effects {
            vfx.life -= dt;
            if matches!(vfx.kind, VfxKind::FloatText { .. }) {
                vfx.pos.y -= TEXT_RISE_SPEED * dt;
            }
        }
        self.effects.retain(|v| v.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}
