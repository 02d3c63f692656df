//! Hit resolution and the combo state machine
//!
//! A tap resolves against at most one live target. The most recently spawned
//! target is drawn on top, so it is checked first.

use glam::Vec2;

use super::state::{Entity, EntityKind, RoundState, combo_multiplier};
use crate::consts::*;

/// What a tap did to the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitEffect {
    /// Frozen, or nothing under the pointer
    None,
    /// A normal target scored this many points
    Scored(u64),
    /// A shield reset the combo
    ComboBroken,
    /// A spike reset the combo, cost time and requests a freeze
    Frozen,
}

/// Result of resolving one tap
#[derive(Debug, Clone)]
pub struct HitResult {
    pub effect: HitEffect,
    /// Type of the target that was tapped
    pub kind: Option<EntityKind>,
    /// Center of the tapped target
    pub point: Vec2,
    /// Combo before this tap (what a shield/spike broke)
    pub combo_before: u32,
}

impl HitResult {
    pub fn miss() -> Self {
        Self {
            effect: HitEffect::None,
            kind: None,
            point: Vec2::ZERO,
            combo_before: 0,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.effect == HitEffect::None
    }
}

/// Points for a normal hit at `combo` (already incremented) and player `level`
pub fn points_for(combo: u32, level: u32) -> u64 {
    let multiplier = combo_multiplier(combo) as f64;
    let level_bonus = 1.0 + (level.max(1) - 1) as f64 * LEVEL_SCORE_BONUS;
    (BASE_POINTS * multiplier * level_bonus).floor() as u64
}

/// Resolve a tap at `pointer` against the live targets.
///
/// Only flags the tapped target; removal is left to the population tick.
/// A spike drains `SPIKE_TIME_PENALTY` seconds (floored at zero); the caller
/// starts the freeze and ends the round if time ran out.
pub fn resolve_hit(pointer: Vec2, entities: &mut [Entity], round: &mut RoundState) -> HitResult {
    if round.frozen {
        return HitResult::miss();
    }

    let Some(entity) = entities
        .iter_mut()
        .rev()
        .find(|e| e.is_live() && e.contains(pointer))
    else {
        return HitResult::miss();
    };

    let combo_before = round.combo;
    let effect = match entity.kind {
        EntityKind::Normal => {
            round.combo += 1;
            round.combo_timer = COMBO_TIMEOUT_SECS;
            round.best_combo = round.best_combo.max(round.combo);
            round.targets_hit += 1;

            let points = points_for(round.combo, round.level);
            round.score += points;
            entity.mark_hit();
            HitEffect::Scored(points)
        }
        EntityKind::Shield => {
            round.combo = 0;
            HitEffect::ComboBroken
        }
        EntityKind::Spike => {
            round.combo = 0;
            round.time_left = round.time_left.saturating_sub(SPIKE_TIME_PENALTY);
            HitEffect::Frozen
        }
    };

    HitResult {
        effect,
        kind: Some(entity.kind),
        point: entity.pos,
        combo_before,
    }
}

/// Count down the combo window. Returns true if the combo just expired.
pub fn decay_combo(round: &mut RoundState, dt: f32) -> bool {
    if round.combo == 0 {
        return false;
    }
    round.combo_timer -= dt;
    if round.combo_timer <= 0.0 {
        round.combo = 0;
        round.combo_timer = 0.0;
        return true;
    }
    false
}
