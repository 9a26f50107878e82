use std::time::{Duration, Instant};

use super::PhysicalBrightness;

/// A time-bounded transition between two physical brightness values.
///
/// The animation holds no timer of its own: whoever drives frames calls
/// [`BrightnessAnimation::sample`] with the current time. Dropping or replacing
/// the animation is the cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessAnimation {
    from: PhysicalBrightness,
    to: PhysicalBrightness,
    started: Instant,
    duration: Duration,
}

impl BrightnessAnimation {
    pub fn new(
        from: PhysicalBrightness,
        to: PhysicalBrightness,
        started: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    pub fn target(&self) -> PhysicalBrightness {
        self.to
    }

    /// Linear progress in `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    pub fn sample(&self, now: Instant) -> PhysicalBrightness {
        let t = self.progress(now);
        if t >= 1.0 {
            return self.to;
        }
        self.from.lerp(&self.to, decelerate(t))
    }

    /// Samples at fixed intervals from the start up to and including the end.
    pub fn samples(&self, interval: Duration) -> Vec<PhysicalBrightness> {
        let interval = interval.max(Duration::from_millis(1));
        let mut out = Vec::new();
        let mut offset = Duration::ZERO;
        while offset < self.duration {
            out.push(self.sample(self.started + offset));
            offset += interval;
        }
        out.push(self.to);
        out
    }
}

/// Decelerating curve: fast start, gentle landing.
pub fn decelerate(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}
