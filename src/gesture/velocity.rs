use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::events::Point;

/// Estimates pointer velocity over a short trailing window.
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    samples: VecDeque<(Instant, Point)>,
    window: Duration,
}

impl VelocityTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            samples: VecDeque::with_capacity(8),
            window,
        }
    }

    pub fn add(&mut self, time: Instant, position: Point) {
        self.samples.push_back((time, position));
        // Always keep two samples so a pause followed by one move reads slow
        while self.samples.len() > 2 {
            match self.samples.front() {
                Some((t, _)) if time.saturating_duration_since(*t) > self.window => {
                    self.samples.pop_front();
                }
                _ => break,
            }
        }
    }

    /// Pixels per second.
    pub fn velocity(&self) -> Point {
        let (Some((t0, p0)), Some((t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return Point::default();
        };
        let dt = t1.saturating_duration_since(*t0).as_secs_f32();
        if dt <= 0.0 {
            return Point::default();
        }
        Point::new((p1.x - p0.x) / dt, (p1.y - p0.y) / dt)
    }
}
