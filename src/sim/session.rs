//! Round lifecycle controller
//!
//! `Session` is the single authority over a round: it moves through
//! `Idle -> Countdown -> Active -> Ended -> Idle`, owns every timer in one
//! `TimerBag`, and is the only place that flips `running`. Both ways a round
//! can end (timer expiry, spike penalty) go through `end_round`, which is
//! guarded so rewards are applied exactly once.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::clock::FrameClock;
use super::difficulty::Difficulty;
use super::hit::{self, HitEffect, HitResult};
use super::population::Population;
use super::state::{
    Bounds, EndReason, Entity, EntityKind, GameEvent, RoundPhase, RoundState, RoundSummary,
    combo_multiplier,
};
use super::timer::{FrameSubscription, Interval, TimerBag, Timeout};
use super::vfx::{Vfx, VfxTracker};
use crate::consts::*;
use crate::progression::{Progress, ProgressStore, RoundReward};

/// Read-only view handed to the renderer each frame
#[derive(Debug, Clone, Copy)]
pub struct RenderSnapshot<'a> {
    pub phase: RoundPhase,
    pub bounds: Bounds,
    pub entities: &'a [Entity],
    pub vfx: &'a [Vfx],
    pub score: u64,
    pub time_left: u32,
    pub combo: u32,
    pub multiplier: u32,
    pub frozen: bool,
}

/// One game instance: the current round plus everything it needs
pub struct Session<S: ProgressStore> {
    phase: RoundPhase,
    round: RoundState,
    population: Population,
    vfx: VfxTracker,
    clock: FrameClock,
    timers: TimerBag,
    rng: Pcg32,
    bounds: Bounds,
    store: S,
    events: Vec<GameEvent>,
    last_summary: Option<RoundSummary>,
}

impl<S: ProgressStore> Session<S> {
    pub fn new(store: S, seed: u64) -> Self {
        Self {
            phase: RoundPhase::Idle,
            round: RoundState::default(),
            population: Population::new(),
            vfx: VfxTracker::new(),
            clock: FrameClock::new(),
            timers: TimerBag::default(),
            rng: Pcg32::seed_from_u64(seed),
            bounds: Bounds::default(),
            store,
            events: Vec::new(),
            last_summary: None,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn entities(&self) -> &[Entity] {
        self.population.entities()
    }

    /// Direct access to the targets for scripted setups
    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    pub fn vfx(&self) -> &[Vfx] {
        self.vfx.effects()
    }

    pub fn timers(&self) -> &TimerBag {
        &self.timers
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Canvas size in CSS pixels. Safe to call mid-round.
    pub fn set_bounds(&mut self, width: f32, height: f32) {
        self.bounds = Bounds::new(width, height);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn progress(&self) -> Progress {
        self.store.load_progress()
    }

    pub fn last_summary(&self) -> Option<&RoundSummary> {
        self.last_summary.as_ref()
    }

    /// Take all queued notifications
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether the host should keep requesting animation frames
    pub fn needs_frames(&self) -> bool {
        matches!(self.phase, RoundPhase::Countdown { .. } | RoundPhase::Active)
    }

    pub fn snapshot(&self) -> RenderSnapshot<'_> {
        RenderSnapshot {
            phase: self.phase,
            bounds: self.bounds,
            entities: self.population.entities(),
            vfx: self.vfx.effects(),
            score: self.round.score,
            time_left: self.round.time_left,
            combo: self.round.combo,
            multiplier: self.round.multiplier(),
            frozen: self.round.frozen,
        }
    }

    /// Begin the 3-2-1 countdown for a round at `difficulty`.
    ///
    /// Rejected (returns false) while a countdown or round is in progress.
    /// Starting from `Ended` acknowledges the previous result.
    pub fn start(&mut self, difficulty: Difficulty, now_ms: f64) -> bool {
        match self.phase {
            RoundPhase::Countdown { .. } | RoundPhase::Active => {
                log::debug!("Start ignored: round already in progress");
                return false;
            }
            RoundPhase::Ended => {
                self.acknowledge_end();
            }
            RoundPhase::Idle => {}
        }

        self.timers.clear();
        self.round = RoundState::new(difficulty, self.store.load_progress().level);
        self.phase = RoundPhase::Countdown {
            remaining: COUNTDOWN_STEPS,
        };
        self.timers.countdown = Some(Interval::new(now_ms, COUNTDOWN_STEP_MS));
        self.events.push(GameEvent::Countdown {
            remaining: COUNTDOWN_STEPS,
        });
        log::info!("Countdown started ({})", difficulty.as_str());
        true
    }

    /// Return to `Idle` after a round ended
    pub fn acknowledge_end(&mut self) -> bool {
        if self.phase != RoundPhase::Ended {
            return false;
        }
        self.phase = RoundPhase::Idle;
        true
    }

    /// Host frame callback with a monotonic timestamp in milliseconds
    pub fn on_frame(&mut self, now_ms: f64) {
        self.poll_timers(now_ms);

        if !self.round.running || self.timers.frame.is_none() {
            return;
        }
        let dt = self.clock.step(now_ms);
        self.step(dt);
    }

    /// Advance the simulation by `dt` seconds. Movement, spawning and combo
    /// decay continue while input is frozen.
    fn step(&mut self, dt: f32) {
        self.population
            .tick(&mut self.rng, &mut self.round, dt, &self.bounds);
        hit::decay_combo(&mut self.round, dt);
        self.vfx.tick(dt);
    }

    fn poll_timers(&mut self, now_ms: f64) {
        while self
            .timers
            .countdown
            .as_mut()
            .is_some_and(|t| t.fire(now_ms))
        {
            let RoundPhase::Countdown { remaining } = self.phase else {
                self.timers.countdown = None;
                break;
            };
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.begin_round(now_ms);
                break;
            }
            self.phase = RoundPhase::Countdown { remaining };
            self.events.push(GameEvent::Countdown { remaining });
        }

        if self.timers.freeze.as_ref().is_some_and(|t| t.is_due(now_ms)) {
            self.timers.freeze = None;
            self.round.frozen = false;
        }

        while self.timers.round.as_mut().is_some_and(|t| t.fire(now_ms)) {
            self.round.time_left = self.round.time_left.saturating_sub(1);
            if self.round.time_left == 0 {
                self.end_round(EndReason::TimeUp);
                break;
            }
        }
    }

    fn begin_round(&mut self, now_ms: f64) {
        self.timers.clear();

        let difficulty = self.round.difficulty;
        let level = self.store.load_progress().level;
        self.round = RoundState::new(difficulty, level);
        // First active frame spawns a target right away
        self.round.spawn_accumulator = difficulty.policy().spawn_interval_ms;
        self.round.running = true;

        self.population.clear();
        self.vfx.clear();
        self.clock.reset();

        self.timers.frame = Some(FrameSubscription);
        self.timers.round = Some(Interval::new(now_ms, ROUND_TICK_MS));
        self.phase = RoundPhase::Active;

        self.events.push(GameEvent::RoundStart { difficulty });
        log::info!(
            "Round started ({}, level {}, {}s)",
            difficulty.as_str(),
            level,
            ROUND_SECONDS
        );
    }

    /// Resolve a pointer-down at canvas coordinates. Ignored outside `Active`.
    ///
    /// Timers are polled first, so an expired freeze or round takes effect
    /// even when no frame has run since it lapsed.
    pub fn pointer_down(&mut self, x: f32, y: f32, now_ms: f64) -> HitEffect {
        self.poll_timers(now_ms);
        if self.phase != RoundPhase::Active || !self.round.running {
            return HitEffect::None;
        }

        let result = hit::resolve_hit(
            Vec2::new(x, y),
            self.population.entities_mut(),
            &mut self.round,
        );

        match result.effect {
            HitEffect::None => {}
            HitEffect::Scored(points) => self.on_scored(&result, points),
            HitEffect::ComboBroken => {
                self.on_penalty_hit(&result, EntityKind::Shield);
                self.vfx
                    .push(Vfx::text(result.point, "BLOCKED", EntityKind::Shield));
            }
            HitEffect::Frozen => {
                self.on_penalty_hit(&result, EntityKind::Spike);
                self.vfx.push(Vfx::text(
                    result.point,
                    format!("-{}s", SPIKE_TIME_PENALTY),
                    EntityKind::Spike,
                ));
                self.activate_freeze(now_ms);
                if self.round.time_left == 0 {
                    self.end_round(EndReason::SpikePenalty);
                }
            }
        }

        result.effect
    }

    fn on_scored(&mut self, result: &HitResult, points: u64) {
        let combo = self.round.combo;
        self.events.push(GameEvent::Hit {
            kind: EntityKind::Normal,
            points,
            combo,
        });
        self.vfx
            .push(Vfx::ring(result.point, ENTITY_RADIUS, EntityKind::Normal));
        self.vfx
            .push(Vfx::text(result.point, format!("+{points}"), EntityKind::Normal));

        let multiplier = combo_multiplier(combo);
        if multiplier > combo_multiplier(result.combo_before) {
            let above = result.point - Vec2::new(0.0, ENTITY_RADIUS);
            self.vfx
                .push(Vfx::text(above, format!("x{multiplier}"), EntityKind::Normal));
        }
    }

    fn on_penalty_hit(&mut self, result: &HitResult, kind: EntityKind) {
        self.events.push(GameEvent::Hit {
            kind,
            points: 0,
            combo: 0,
        });
        if result.combo_before > 0 {
            self.events.push(GameEvent::ComboBreak {
                combo: result.combo_before,
            });
        }
        self.vfx.push(Vfx::ring(result.point, ENTITY_RADIUS, kind));
    }

    /// Suspend input for `FREEZE_MS`. A new freeze restarts the window.
    fn activate_freeze(&mut self, now_ms: f64) {
        self.round.frozen = true;
        self.timers.freeze = Some(Timeout::new(now_ms, FREEZE_MS));
        self.events.push(GameEvent::Frozen);
    }

    /// Finalize the round: tear down every timer, compute and persist rewards.
    ///
    /// Returns `None` if the round was already finalized (or never ran).
    pub fn end_round(&mut self, reason: EndReason) -> Option<RoundSummary> {
        if !self.round.running {
            return None;
        }
        self.round.running = false;
        self.timers.clear();
        self.round.frozen = false;

        let difficulty = self.round.difficulty;
        let reward = RoundReward::for_score(self.round.score, difficulty);
        let mut progress = self.store.load_progress();
        let start_level = progress.level.max(1);
        let levels_gained = progress.apply(&reward);
        self.store.save_progress(&progress);

        for level in (start_level + 1)..=(start_level + levels_gained) {
            self.events.push(GameEvent::LevelUp { level });
        }

        let summary = RoundSummary {
            score: self.round.score,
            difficulty,
            gems_earned: reward.gems,
            xp_earned: reward.xp,
            levels_gained,
            level: progress.level,
            best_combo: self.round.best_combo,
            targets_hit: self.round.targets_hit,
            reason,
        };

        log::info!(
            "Round over ({:?}): score {}, +{} gems, +{} xp",
            reason,
            summary.score,
            summary.gems_earned,
            summary.xp_earned
        );

        self.phase = RoundPhase::Ended;
        self.events.push(GameEvent::RoundEnd(summary.clone()));
        self.last_summary = Some(summary.clone());
        Some(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;
    use crate::progression::StoredProgress;

    type TestSession = Session<StoredProgress<MemoryStorage>>;

    fn session() -> TestSession {
        let mut s = Session::new(StoredProgress::new(MemoryStorage::new()), 42);
        s.set_bounds(480.0, 800.0);
        s
    }

    /// Start and run the countdown; returns the timestamp play began
    fn start_active(s: &mut TestSession, difficulty: Difficulty) -> f64 {
        assert!(s.start(difficulty, 0.0));
        let begin = COUNTDOWN_STEP_MS * COUNTDOWN_STEPS as f64;
        s.on_frame(begin);
        assert_eq!(s.phase(), RoundPhase::Active);
        begin
    }

    fn place(s: &mut TestSession, kind: EntityKind, x: f32, y: f32) -> u32 {
        s.population_mut()
            .push(Entity::new(0, Vec2::new(x, y), Vec2::ZERO, kind))
    }

    #[test]
    fn test_countdown_steps() {
        let mut s = session();
        assert!(s.start(Difficulty::Easy, 0.0));
        assert_eq!(s.phase(), RoundPhase::Countdown { remaining: 3 });

        s.on_frame(699.0);
        assert_eq!(s.phase(), RoundPhase::Countdown { remaining: 3 });
        s.on_frame(700.0);
        assert_eq!(s.phase(), RoundPhase::Countdown { remaining: 2 });
        s.on_frame(1400.0);
        assert_eq!(s.phase(), RoundPhase::Countdown { remaining: 1 });
        assert!(!s.round().running);
        s.on_frame(2100.0);
        assert_eq!(s.phase(), RoundPhase::Active);
        assert!(s.round().running);

        let events = s.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::Countdown { remaining: 3 },
                GameEvent::Countdown { remaining: 2 },
                GameEvent::Countdown { remaining: 1 },
                GameEvent::RoundStart {
                    difficulty: Difficulty::Easy
                },
            ]
        );
    }

    #[test]
    fn test_start_rejected_while_busy() {
        let mut s = session();
        assert!(s.start(Difficulty::Medium, 0.0));
        assert!(!s.start(Difficulty::Hard, 10.0));
        assert_eq!(s.round().difficulty, Difficulty::Medium);

        s.on_frame(2100.0);
        assert!(!s.start(Difficulty::Hard, 2200.0));
        assert_eq!(s.timers().active_count(), 2);
    }

    #[test]
    fn test_active_round_holds_frame_and_round_timers() {
        let mut s = session();
        start_active(&mut s, Difficulty::Medium);
        let timers = s.timers();
        assert!(timers.frame.is_some());
        assert!(timers.round.is_some());
        assert!(timers.countdown.is_none());
        assert!(s.needs_frames());
    }

    #[test]
    fn test_first_active_frame_spawns() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Easy);
        // on_frame at begin already ran the first (dt = 0) tick
        assert_eq!(s.entities().len(), 1);
        s.on_frame(begin + 16.0);
        assert_eq!(s.entities().len(), 1);
    }

    #[test]
    fn test_time_runs_out() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Easy);

        s.on_frame(begin + 1000.0);
        assert_eq!(s.round().time_left, ROUND_SECONDS - 1);

        let mut now = begin + 1000.0;
        while s.phase() == RoundPhase::Active {
            now += 250.0;
            s.on_frame(now);
        }
        assert_eq!(s.phase(), RoundPhase::Ended);
        assert!(now >= begin + ROUND_SECONDS as f64 * 1000.0);
        assert_eq!(s.round().time_left, 0);
        assert!(s.timers().is_empty());
        assert!(!s.needs_frames());
        assert_eq!(s.last_summary().unwrap().reason, EndReason::TimeUp);
    }

    #[test]
    fn test_end_round_is_idempotent() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Medium);
        place(&mut s, EntityKind::Normal, 100.0, 100.0);
        s.pointer_down(100.0, 100.0, begin + 5.0);
        assert_eq!(s.round().score, 10);

        let first = s.end_round(EndReason::TimeUp);
        let second = s.end_round(EndReason::SpikePenalty);
        assert!(first.is_some());
        assert!(second.is_none());
        // 10 / 10 = 1 gem, 10 / 5 = 2 xp, applied once
        assert_eq!(s.progress().total_gems, 1);
        assert_eq!(s.progress().xp, 2);

        let round_ends = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::RoundEnd(_)))
            .count();
        assert_eq!(round_ends, 1);
    }

    #[test]
    fn test_spike_at_one_second_ends_round_immediately() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Hard);
        s.on_frame(begin + 16.0);
        s.population_mut().clear();
        place(&mut s, EntityKind::Spike, 200.0, 200.0);

        // One second left, without crossing a timer boundary
        s.round.time_left = 1;

        let effect = s.pointer_down(200.0, 200.0, begin + 20.0);
        assert_eq!(effect, HitEffect::Frozen);
        assert_eq!(s.round().time_left, 0);
        assert_eq!(s.phase(), RoundPhase::Ended);
        assert_eq!(s.last_summary().unwrap().reason, EndReason::SpikePenalty);
        assert!(s.timers().is_empty());
        assert!(!s.round().frozen);

        // The 1-second timer can no longer fire a second finalization
        s.on_frame(begin + 5000.0);
        assert_eq!(s.phase(), RoundPhase::Ended);
    }

    #[test]
    fn test_freeze_blocks_taps_but_not_motion() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Hard);
        s.population_mut().clear();
        place(&mut s, EntityKind::Spike, 100.0, 100.0);
        s.population_mut().push(Entity::new(
            0,
            Vec2::new(240.0, 400.0),
            Vec2::new(100.0, 0.0),
            EntityKind::Normal,
        ));

        assert_eq!(s.pointer_down(100.0, 100.0, begin), HitEffect::Frozen);
        assert!(s.round().frozen);
        assert!(s.timers().freeze.is_some());

        s.on_frame(begin + 16.0);
        s.on_frame(begin + 32.0);
        let x = s
            .entities()
            .iter()
            .find(|e| e.kind == EntityKind::Normal && e.vel.x == 100.0)
            .unwrap()
            .pos
            .x;
        assert!(x > 240.0);

        let tapped = s.pointer_down(x, 400.0, begin + 40.0);
        assert_eq!(tapped, HitEffect::None);
        assert_eq!(s.round().score, 0);

        s.on_frame(begin + FREEZE_MS + 1.0);
        assert!(!s.round().frozen);
        assert!(s.timers().freeze.is_none());
    }

    #[test]
    fn test_second_freeze_restarts_window() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Hard);
        s.population_mut().clear();
        place(&mut s, EntityKind::Spike, 100.0, 100.0);
        place(&mut s, EntityKind::Spike, 300.0, 300.0);

        s.pointer_down(100.0, 100.0, begin);
        // Unfreeze, then freeze again late in a fresh window
        s.on_frame(begin + 801.0);
        assert!(!s.round().frozen);
        assert_eq!(s.pointer_down(300.0, 300.0, begin + 900.0), HitEffect::Frozen);
        s.on_frame(begin + 1600.0);
        assert!(s.round().frozen);
        s.on_frame(begin + 1701.0);
        assert!(!s.round().frozen);
    }

    #[test]
    fn test_tap_polls_expired_freeze_and_round() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Hard);
        s.population_mut().clear();
        place(&mut s, EntityKind::Spike, 100.0, 100.0);
        place(&mut s, EntityKind::Normal, 300.0, 300.0);

        s.pointer_down(100.0, 100.0, begin + 10.0);
        assert!(s.round().frozen);
        // No frame in between: the tap itself lifts the freeze
        let effect = s.pointer_down(300.0, 300.0, begin + 10.0 + FREEZE_MS + 1.0);
        assert!(matches!(effect, HitEffect::Scored(_)));
        assert!(s.timers().freeze.is_none());

        place(&mut s, EntityKind::Normal, 200.0, 200.0);
        let score = s.round().score;
        let late = begin + ROUND_SECONDS as f64 * 1000.0 + 5.0;
        assert_eq!(s.pointer_down(200.0, 200.0, late), HitEffect::None);
        assert_eq!(s.phase(), RoundPhase::Ended);
        assert_eq!(s.round().score, score);
        assert_eq!(s.last_summary().unwrap().reason, EndReason::TimeUp);
    }

    #[test]
    fn test_penalty_events() {
        let mut s = session();
        let begin = start_active(&mut s, Difficulty::Hard);
        s.population_mut().clear();
        place(&mut s, EntityKind::Normal, 100.0, 100.0);
        place(&mut s, EntityKind::Shield, 300.0, 300.0);
        s.drain_events();

        s.pointer_down(100.0, 100.0, begin);
        s.pointer_down(300.0, 300.0, begin + 10.0);
        let events = s.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::Hit {
                    kind: EntityKind::Normal,
                    points: 10,
                    combo: 1
                },
                GameEvent::Hit {
                    kind: EntityKind::Shield,
                    points: 0,
                    combo: 0
                },
                GameEvent::ComboBreak { combo: 1 },
            ]
        );
    }

    #[test]
    fn test_level_up_events_and_restart() {
        let mut store = StoredProgress::new(MemoryStorage::new());
        store.save_progress(&Progress {
            level: 3,
            xp: 190,
            total_gems: 0,
        });
        let mut s = Session::new(store, 9);
        s.set_bounds(480.0, 800.0);

        let begin = start_active(&mut s, Difficulty::Medium);
        assert_eq!(s.round().level, 3);
        s.population_mut().clear();
        place(&mut s, EntityKind::Normal, 100.0, 100.0);
        // Level 3: 10 * 1.02 = 10.2 -> 10 points -> 2 xp, needs 200 at level 3
        s.pointer_down(100.0, 100.0, begin);
        s.drain_events();

        let summary = s.end_round(EndReason::TimeUp).unwrap();
        assert_eq!(summary.levels_gained, 0);
        assert_eq!(s.progress().xp, 192);

        // Restart straight from Ended
        assert!(s.start(Difficulty::Medium, begin + 100.0));
        assert_eq!(s.timers().active_count(), 1);
        s.on_frame(begin + 100.0 + 2100.0);
        assert_eq!(s.phase(), RoundPhase::Active);
        s.population_mut().clear();
        for i in 0..10 {
            place(&mut s, EntityKind::Normal, 30.0 + 45.0 * i as f32, 400.0);
        }
        for i in 0..10 {
            s.pointer_down(30.0 + 45.0 * i as f32, 400.0, begin + 2300.0);
        }
        s.drain_events();
        let summary = s.end_round(EndReason::TimeUp).unwrap();
        assert_eq!(summary.levels_gained, 1);
        assert_eq!(summary.level, 4);
        let level_ups: Vec<_> = s
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::LevelUp { .. }))
            .collect();
        assert_eq!(level_ups, vec![GameEvent::LevelUp { level: 4 }]);
    }

    #[test]
    fn test_taps_ignored_outside_active() {
        let mut s = session();
        place(&mut s, EntityKind::Normal, 100.0, 100.0);
        assert_eq!(s.pointer_down(100.0, 100.0, 0.0), HitEffect::None);
        s.start(Difficulty::Easy, 0.0);
        assert_eq!(s.pointer_down(100.0, 100.0, 10.0), HitEffect::None);
        assert_eq!(s.round().score, 0);
    }
}
