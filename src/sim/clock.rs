//! Frame clock
//!
//! Turns the host's per-refresh timestamps into a clamped simulation step.
//! A long pause (background tab, slow frame) simulates as `MAX_FRAME_DT`.

use crate::consts::MAX_FRAME_DT;

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    /// Previous frame timestamp (ms); `None` right after a (re)start
    last_ts: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self { last_ts: None }
    }

    /// Forget the previous sample so the next step is zero
    pub fn reset(&mut self) {
        self.last_ts = None;
    }

    /// Seconds to simulate for the frame at `now_ms`, in `[0, MAX_FRAME_DT]`
    pub fn step(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ts {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ts = Some(now_ms);
        // NaN from a bad timestamp becomes 0
        if dt.is_nan() {
            return 0.0;
        }
        dt.clamp(0.0, MAX_FRAME_DT)
    }
}
