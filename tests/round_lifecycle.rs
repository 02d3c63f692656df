//! End-to-end round lifecycle through the public `Session` API.

use glam::Vec2;
use tap_rush::consts::*;
use tap_rush::platform::MemoryStorage;
use tap_rush::sim::{EndReason, Entity, EntityKind, HitEffect};
use tap_rush::{Difficulty, GameEvent, ProgressStore, RoundPhase, Session, StoredProgress};

type TestSession = Session<StoredProgress<MemoryStorage>>;

const FRAME_MS: f64 = 1000.0 / 60.0;

fn new_session(store: MemoryStorage, seed: u64) -> TestSession {
    let mut session = Session::new(StoredProgress::new(store), seed);
    session.set_bounds(480.0, 800.0);
    session
}

/// Start a round and run the countdown. Returns the time play began.
fn begin(session: &mut TestSession, difficulty: Difficulty, at: f64) -> f64 {
    assert!(session.start(difficulty, at));
    let start = at + COUNTDOWN_STEP_MS * COUNTDOWN_STEPS as f64;
    session.on_frame(start);
    assert_eq!(session.phase(), RoundPhase::Active);
    start
}

fn place(session: &mut TestSession, kind: EntityKind, pos: Vec2, vel: Vec2) -> u32 {
    session.population_mut().push(Entity::new(0, pos, vel, kind))
}

fn entity(session: &TestSession, id: u32) -> &Entity {
    session
        .entities()
        .iter()
        .find(|e| e.id == id)
        .expect("entity still present")
}

#[test]
fn five_normal_hits_score_sixty_on_medium() {
    let mut s = new_session(MemoryStorage::new(), 1);
    let t = begin(&mut s, Difficulty::Medium, 0.0);
    s.population_mut().clear();

    let mut scores = Vec::new();
    for i in 0..5 {
        let pos = Vec2::new(60.0 + 80.0 * i as f32, 300.0);
        place(&mut s, EntityKind::Normal, pos, Vec2::ZERO);
        match s.pointer_down(pos.x, pos.y, t + 10.0 * i as f64) {
            HitEffect::Scored(points) => scores.push(points),
            other => panic!("expected a score, got {:?}", other),
        }
    }

    assert_eq!(scores, vec![10, 10, 10, 10, 20]);
    assert_eq!(s.round().score, 60);
    assert_eq!(s.round().combo, 5);
    assert_eq!(s.round().multiplier(), 2);
}

#[test]
fn spike_with_one_second_left_ends_round_now() {
    let mut s = new_session(MemoryStorage::new(), 2);
    let t = begin(&mut s, Difficulty::Hard, 0.0);

    let mut now = t;
    while now < t + 44_000.0 {
        now += FRAME_MS;
        s.on_frame(now);
    }
    assert_eq!(s.round().time_left, 1);
    assert_eq!(s.phase(), RoundPhase::Active);

    s.population_mut().clear();
    let pos = Vec2::new(240.0, 400.0);
    place(&mut s, EntityKind::Spike, pos, Vec2::ZERO);
    assert_eq!(s.pointer_down(pos.x, pos.y, now), HitEffect::Frozen);

    assert_eq!(s.round().time_left, 0);
    assert_eq!(s.phase(), RoundPhase::Ended);
    assert!(s.timers().is_empty());
    assert_eq!(s.last_summary().map(|r| r.reason), Some(EndReason::SpikePenalty));

    // The second that was about to tick can't finalize again
    s.on_frame(now + 2000.0);
    let ends = s
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, GameEvent::RoundEnd(_)))
        .count();
    assert_eq!(ends, 1);
}

#[test]
fn long_stall_is_clamped() {
    let mut s = new_session(MemoryStorage::new(), 3);
    let t = begin(&mut s, Difficulty::Easy, 0.0);
    s.population_mut().clear();
    let id = place(
        &mut s,
        EntityKind::Normal,
        Vec2::new(100.0, 400.0),
        Vec2::new(100.0, 0.0),
    );

    s.on_frame(t + 16.0);
    let before = entity(&s, id).pos.x;
    s.on_frame(t + 516.0);
    let moved = entity(&s, id).pos.x - before;
    assert!((moved - 100.0 * MAX_FRAME_DT).abs() < 1e-3, "moved {}", moved);
}

#[test]
fn freeze_swallows_taps_while_targets_keep_moving() {
    let mut s = new_session(MemoryStorage::new(), 4);
    let t = begin(&mut s, Difficulty::Hard, 0.0);
    s.population_mut().clear();
    let spike = Vec2::new(60.0, 60.0);
    place(&mut s, EntityKind::Spike, spike, Vec2::ZERO);
    let id = place(
        &mut s,
        EntityKind::Normal,
        Vec2::new(240.0, 400.0),
        Vec2::new(0.0, -60.0),
    );

    s.pointer_down(spike.x, spike.y, t);
    assert!(s.round().frozen);

    let y0 = entity(&s, id).pos.y;
    s.on_frame(t + 16.0);
    s.on_frame(t + 32.0);
    let target = entity(&s, id).pos;
    assert!(target.y < y0);

    assert_eq!(s.pointer_down(target.x, target.y, t + 40.0), HitEffect::None);
    assert_eq!(s.round().score, 0);
    assert!(entity(&s, id).is_live());

    s.on_frame(t + FREEZE_MS + 16.0);
    assert!(!s.round().frozen);
    let target = entity(&s, id).pos;
    assert!(matches!(
        s.pointer_down(target.x, target.y, t + FREEZE_MS + 20.0),
        HitEffect::Scored(_)
    ));
}

#[test]
fn tap_after_freeze_lapses_scores_without_a_frame() {
    let mut s = new_session(MemoryStorage::new(), 10);
    let t = begin(&mut s, Difficulty::Hard, 0.0);
    s.population_mut().clear();
    let spike = Vec2::new(60.0, 60.0);
    let normal = Vec2::new(240.0, 400.0);
    place(&mut s, EntityKind::Spike, spike, Vec2::ZERO);
    place(&mut s, EntityKind::Normal, normal, Vec2::ZERO);

    assert_eq!(s.pointer_down(spike.x, spike.y, t), HitEffect::Frozen);
    assert!(matches!(
        s.pointer_down(normal.x, normal.y, t + 900.0),
        HitEffect::Scored(_)
    ));
    assert!(!s.round().frozen);
}

#[test]
fn tap_after_time_runs_out_finishes_the_round() {
    let mut s = new_session(MemoryStorage::new(), 11);
    let t = begin(&mut s, Difficulty::Medium, 0.0);

    let mut now = t;
    while now + FRAME_MS < t + 44_990.0 {
        now += FRAME_MS;
        s.on_frame(now);
    }
    s.on_frame(t + 44_990.0);
    assert_eq!(s.round().time_left, 1);

    s.population_mut().clear();
    let pos = Vec2::new(240.0, 400.0);
    place(&mut s, EntityKind::Normal, pos, Vec2::ZERO);
    let score = s.round().score;

    assert_eq!(s.pointer_down(pos.x, pos.y, t + 45_010.0), HitEffect::None);
    assert_eq!(s.phase(), RoundPhase::Ended);
    assert_eq!(s.round().time_left, 0);
    assert_eq!(s.round().score, score);
    assert!(s.timers().is_empty());
    assert_eq!(s.last_summary().map(|r| r.reason), Some(EndReason::TimeUp));
}

#[test]
fn shield_stays_and_breaks_combo() {
    let mut s = new_session(MemoryStorage::new(), 5);
    let t = begin(&mut s, Difficulty::Medium, 0.0);
    s.population_mut().clear();
    let a = Vec2::new(100.0, 100.0);
    let shield = Vec2::new(300.0, 300.0);
    place(&mut s, EntityKind::Normal, a, Vec2::ZERO);
    let shield_id = place(&mut s, EntityKind::Shield, shield, Vec2::ZERO);

    s.pointer_down(a.x, a.y, t);
    assert_eq!(s.round().combo, 1);
    assert_eq!(s.pointer_down(shield.x, shield.y, t + 5.0), HitEffect::ComboBroken);
    assert_eq!(s.round().combo, 0);
    assert!(entity(&s, shield_id).is_live());
    assert_eq!(s.pointer_down(shield.x, shield.y, t + 10.0), HitEffect::ComboBroken);
}

#[test]
fn restart_never_stacks_timers() {
    let mut s = new_session(MemoryStorage::new(), 6);
    let t = begin(&mut s, Difficulty::Easy, 0.0);

    assert!(!s.start(Difficulty::Hard, t + 100.0));
    assert_eq!(s.timers().active_count(), 2);

    s.end_round(EndReason::TimeUp);
    assert!(s.timers().is_empty());
    assert!(!s.needs_frames());

    let t2 = begin(&mut s, Difficulty::Hard, t + 200.0);
    assert_eq!(s.timers().active_count(), 2);
    assert_eq!(s.round().time_left, ROUND_SECONDS);
    assert_eq!(s.round().difficulty, Difficulty::Hard);

    // Only one second elapses per second, whatever happened before
    s.on_frame(t2 + 1000.0);
    assert_eq!(s.round().time_left, ROUND_SECONDS - 1);
}

#[test]
fn rewards_persist_between_sessions() {
    let mut s = new_session(MemoryStorage::new(), 7);
    let t = begin(&mut s, Difficulty::Medium, 0.0);
    s.population_mut().clear();
    for i in 0..5 {
        let pos = Vec2::new(60.0 + 80.0 * i as f32, 300.0);
        place(&mut s, EntityKind::Normal, pos, Vec2::ZERO);
        s.pointer_down(pos.x, pos.y, t);
    }

    let mut now = t;
    while s.phase() == RoundPhase::Active {
        now += 100.0;
        s.on_frame(now);
    }
    let summary = s.last_summary().cloned().expect("round finished");
    assert_eq!(summary.reason, EndReason::TimeUp);
    assert_eq!(summary.score, 60);
    assert_eq!(summary.gems_earned, 6);
    assert_eq!(summary.xp_earned, 12);

    let saved = s.store().store().clone();
    let reopened = StoredProgress::new(saved);
    let progress = reopened.load_progress();
    assert_eq!(progress.total_gems, 6);
    assert_eq!(progress.xp, 12);

    let mut next = new_session(reopened.store().clone(), 8);
    begin(&mut next, Difficulty::Easy, 0.0);
    assert_eq!(next.progress().total_gems, 6);
}

#[test]
fn events_follow_the_round() {
    let mut s = new_session(MemoryStorage::new(), 9);
    begin(&mut s, Difficulty::Easy, 0.0);
    s.end_round(EndReason::TimeUp);
    assert!(s.acknowledge_end());
    assert_eq!(s.phase(), RoundPhase::Idle);
    assert!(!s.acknowledge_end());

    let events = s.drain_events();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            GameEvent::Countdown { .. } => "countdown",
            GameEvent::RoundStart { .. } => "start",
            GameEvent::RoundEnd(_) => "end",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["countdown", "countdown", "countdown", "start", "end"]);
    assert!(s.drain_events().is_empty());
}
