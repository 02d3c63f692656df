//! Round timers
//!
//! Wall-clock timers polled from the frame callback. Each timer class has one
//! slot in the `TimerBag`; installing a timer replaces whatever was in its
//! slot, and `clear` drops every slot at once.

/// Repeating timer firing every `period_ms`
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    period_ms: f64,
    next_due_ms: f64,
}

impl Interval {
    pub fn new(now_ms: f64, period_ms: f64) -> Self {
        Self {
            period_ms,
            next_due_ms: now_ms + period_ms,
        }
    }

    /// Fire once if due. Call in a loop to catch up after a stall.
    pub fn fire(&mut self, now_ms: f64) -> bool {
        if now_ms >= self.next_due_ms {
            self.next_due_ms += self.period_ms;
            true
        } else {
            false
        }
    }
}

/// One-shot timer
#[derive(Debug, Clone, PartialEq)]
pub struct Timeout {
    due_ms: f64,
}

impl Timeout {
    pub fn new(now_ms: f64, delay_ms: f64) -> Self {
        Self {
            due_ms: now_ms + delay_ms,
        }
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        now_ms >= self.due_ms
    }
}

/// Marker for an active frame-loop subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSubscription;

/// Every timer the round engine can hold, one slot per class
#[derive(Debug, Clone, Default)]
pub struct TimerBag {
    pub frame: Option<FrameSubscription>,
    /// 1-second round countdown
    pub round: Option<Interval>,
    /// 3-2-1 pre-round countdown
    pub countdown: Option<Interval>,
    /// Input freeze after a spike
    pub freeze: Option<Timeout>,
}

impl TimerBag {
    /// Cancel everything
    pub fn clear(&mut self) {
        self.frame = None;
        self.round = None;
        self.countdown = None;
        self.freeze = None;
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_none()
            && self.round.is_none()
            && self.countdown.is_none()
            && self.freeze.is_none()
    }

    /// Number of occupied slots
    pub fn active_count(&self) -> usize {
        [
            self.frame.is_some(),
            self.round.is_some(),
            self.countdown.is_some(),
            self.freeze.is_some(),
        ]
        .iter()
        .filter(|&&on| on)
        .count()
    }
}
