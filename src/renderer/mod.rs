//! Canvas 2D rendering
//!
//! Palette and animation helpers are pure so the native build and tests can
//! use them. The drawing itself (`canvas`) only exists in the browser and
//! reads nothing but a `RenderSnapshot`.

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;

use crate::consts::*;
use crate::sim::{Entity, EntityKind};

/// Arena background
pub const BACKGROUND: &str = "#151a22";
/// Glint drawn on every target
pub const HIGHLIGHT: &str = "rgba(255,255,255,0.25)";
/// Veil over the arena while input is frozen
pub const FREEZE_TINT: &str = "rgba(120,180,255,0.12)";
pub const TEXT_COLOR: &str = "#ffffff";

/// Device pixel ratio range the backing store is scaled by
pub const MIN_DPR: f64 = 1.0;
pub const MAX_DPR: f64 = 2.0;

/// Bob amplitude in px for the walk cycle
const BOB_AMPLITUDE: f32 = 2.0;

/// Fill color for a target type
pub fn kind_color(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Normal => "#ff3b30",
        EntityKind::Shield => "#ffd60a",
        EntityKind::Spike => "#ff006e",
    }
}

/// Same color as an `rgba()` string with `alpha`
pub fn kind_rgba(kind: EntityKind, alpha: f32) -> String {
    let (r, g, b) = match kind {
        EntityKind::Normal => (255, 59, 48),
        EntityKind::Shield => (255, 214, 10),
        EntityKind::Spike => (255, 0, 110),
    };
    format!("rgba({},{},{},{:.3})", r, g, b, alpha.clamp(0.0, 1.0))
}

/// Clamp the browser's device pixel ratio
pub fn clamp_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() {
        dpr.clamp(MIN_DPR, MAX_DPR)
    } else {
        MIN_DPR
    }
}

/// Scale applied while a tapped target vanishes (1 when live)
pub fn vanish_scale(entity: &Entity) -> f32 {
    if entity.hit {
        (entity.hit_timer / HIT_VANISH_SECS).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Vertical offset of the walk cycle
pub fn bob_offset(entity: &Entity) -> f32 {
    entity.walk_phase.sin() * BOB_AMPLITUDE
}
