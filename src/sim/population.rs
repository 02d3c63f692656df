//! Entity population manager
//!
//! Owns the live targets: spawns them from the screen edges, moves them,
//! expires them, and keeps the field winnable (at least one live `Normal`).
//! Hit resolution may flag a target as hit but never removes it; removal
//! happens here on the next tick.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::difficulty::Difficulty;
use super::state::{Bounds, Entity, EntityKind, RoundState};
use crate::consts::*;

/// Screen edge a target enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Build a target just outside a random edge, heading inward.
///
/// Returns `None` when the canvas is too small to place a target, so an
/// unsized canvas never produces out-of-range positions.
pub fn spawn_entity<R: Rng>(
    rng: &mut R,
    id: u32,
    difficulty: Difficulty,
    bounds: &Bounds,
) -> Option<Entity> {
    let r = ENTITY_RADIUS;
    if bounds.is_degenerate(r) {
        return None;
    }

    let edge = Edge::ALL[rng.random_range(0..Edge::ALL.len())];
    let speed = BASE_SPEED * rng.random_range(SPEED_JITTER_MIN..SPEED_JITTER_MAX);
    let lateral = rng.random_range(-LATERAL_JITTER..LATERAL_JITTER);

    let (pos, vel) = match edge {
        Edge::Top => (
            Vec2::new(rng.random_range(r..bounds.width - r), -r),
            Vec2::new(lateral, speed),
        ),
        Edge::Right => (
            Vec2::new(bounds.width + r, rng.random_range(r..bounds.height - r)),
            Vec2::new(-speed, lateral),
        ),
        Edge::Bottom => (
            Vec2::new(rng.random_range(r..bounds.width - r), bounds.height + r),
            Vec2::new(lateral, -speed),
        ),
        Edge::Left => (
            Vec2::new(-r, rng.random_range(r..bounds.height - r)),
            Vec2::new(speed, lateral),
        ),
    };

    let kind = difficulty.policy().pick_kind(rng.random::<f32>());
    Some(Entity::new(id, pos, vel, kind))
}

/// The set of on-screen targets, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Population {
    entities: Vec<Entity>,
    next_id: u32,
}

impl Population {
    pub fn new() -> Self {
        Self {
            entities: Vec::with_capacity(MAX_ENTITIES * 2),
            next_id: 1,
        }
    }

    /// All targets, including ones still vanishing
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Mutable view for hit resolution. A slice cannot add or remove targets.
    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    /// Targets that are not yet hit
    pub fn live_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_live()).count()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Append a target as-is (scripted setups and tests)
    pub fn push(&mut self, mut entity: Entity) -> u32 {
        entity.id = self.allocate_id();
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    fn allocate_id(&mut self) -> u32 {
        // Default-constructed populations start at 0
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn one target from a random edge. Skipped on a degenerate canvas.
    pub fn spawn<R: Rng>(&mut self, rng: &mut R, difficulty: Difficulty, bounds: &Bounds) -> bool {
        let id = self.allocate_id();
        match spawn_entity(rng, id, difficulty, bounds) {
            Some(entity) => {
                self.entities.push(entity);
                true
            }
            None => {
                log::debug!("Spawn skipped: degenerate bounds {:?}", bounds);
                false
            }
        }
    }

    /// Advance one simulation step: move, expire, spawn, then repair the
    /// minimum-normal invariant.
    pub fn tick<R: Rng>(&mut self, rng: &mut R, round: &mut RoundState, dt: f32, bounds: &Bounds) {
        for entity in &mut self.entities {
            if entity.hit {
                entity.hit_timer -= dt;
            } else {
                entity.pos += entity.vel * dt;
                entity.walk_phase = (entity.walk_phase + WALK_PHASE_RATE * dt) % TAU;
            }
        }

        self.entities.retain(|e| {
            if e.hit {
                e.hit_timer > 0.0
            } else {
                !e.is_off_screen(bounds)
            }
        });

        // The rhythm keeps running while capped, so a freed slot fills on the
        // next firing rather than after a fresh interval.
        round.spawn_accumulator += dt * 1000.0;
        if round.spawn_accumulator >= round.difficulty.policy().spawn_interval_ms {
            round.spawn_accumulator = 0.0;
            if self.live_count() < MAX_ENTITIES {
                self.spawn(rng, round.difficulty, bounds);
            }
        }

        self.enforce_minimum_normal(rng);
    }

    /// If live targets exist but none is `Normal`, retype a random live one.
    /// Returns true when a correction was made.
    pub fn enforce_minimum_normal<R: Rng>(&mut self, rng: &mut R) -> bool {
        let live: Vec<usize> = self
            .entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_live())
            .map(|(i, _)| i)
            .collect();

        if live.is_empty() {
            return false;
        }
        if live.iter().any(|&i| self.entities[i].kind == EntityKind::Normal) {
            return false;
        }

        let pick = live[rng.random_range(0..live.len())];
        self.entities[pick].kind = EntityKind::Normal;
        true
    }
}
