use std::time::{Duration, Instant};

use super::events::Point;

/// A finished tap waiting to learn whether a second one follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTap {
    pub time: Instant,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapDown {
    /// No tap was waiting
    Fresh,
    /// Close enough in time and space to the waiting tap
    DoubleTap,
    /// A tap was waiting but this touch is too far away; the old one stands alone
    ConfirmsPrevious,
}

/// Single vs double tap disambiguation across touch sequences.
#[derive(Debug, Clone)]
pub struct TapTracker {
    pending: Option<PendingTap>,
    timeout: Duration,
    slop: f32,
}

impl TapTracker {
    pub fn new(timeout: Duration, slop: f32) -> Self {
        Self {
            pending: None,
            timeout,
            slop,
        }
    }

    pub fn pending(&self) -> Option<PendingTap> {
        self.pending
    }

    pub fn record_tap(&mut self, time: Instant, position: Point) {
        self.pending = Some(PendingTap { time, position });
    }

    /// Takes the waiting tap once its double-tap window has passed.
    pub fn take_expired(&mut self, now: Instant) -> Option<PendingTap> {
        match self.pending {
            Some(tap) if now.saturating_duration_since(tap.time) >= self.timeout => self.pending.take(),
            _ => None,
        }
    }

    /// Classifies a new first-pointer down against the waiting tap.
    pub fn on_down(&mut self, time: Instant, position: Point) -> TapDown {
        let Some(tap) = self.pending.take() else {
            return TapDown::Fresh;
        };
        let in_time = time.saturating_duration_since(tap.time) < self.timeout;
        if in_time && tap.position.distance(&position) <= self.slop {
            TapDown::DoubleTap
        } else {
            TapDown::ConfirmsPrevious
        }
    }
}

/// Counts quick repeats of the same gesture, e.g. two-finger touches.
#[derive(Debug, Clone)]
pub struct MultiTapCounter {
    count: u32,
    last: Option<Instant>,
    window: Duration,
    target: u32,
}

impl MultiTapCounter {
    pub fn new(window: Duration, target: u32) -> Self {
        Self {
            count: 0,
            last: None,
            window,
            target: target.max(1),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns true when this repeat completes the sequence.
    pub fn register(&mut self, now: Instant) -> bool {
        self.count = match self.last {
            Some(last) if now.saturating_duration_since(last) <= self.window => self.count + 1,
            _ => 1,
        };
        self.last = Some(now);

        if self.count >= self.target {
            self.count = 0;
            self.last = None;
            true
        } else {
            false
        }
    }
}
