//! Round simulation
//!
//! All gameplay logic lives here. Nothing in this module touches the DOM,
//! audio or a canvas:
//! - Seeded RNG only
//! - Time comes in as host timestamps, never read from a clock
//! - Timers are owned by the session and polled each frame

pub mod clock;
pub mod difficulty;
pub mod hit;
pub mod population;
pub mod session;
pub mod state;
pub mod timer;
pub mod vfx;

pub use clock::FrameClock;
pub use difficulty::{Difficulty, DifficultyPolicy};
pub use hit::{HitEffect, HitResult, decay_combo, points_for, resolve_hit};
pub use population::{Population, spawn_entity};
pub use session::{RenderSnapshot, Session};
pub use state::{
    Bounds, EndReason, Entity, EntityKind, GameEvent, RoundPhase, RoundState, RoundSummary,
    combo_multiplier,
};
pub use timer::{FrameSubscription, Interval, TimerBag, Timeout};
pub use vfx::{Vfx, VfxKind, VfxTracker};
