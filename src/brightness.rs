mod animation;

pub use animation::{decelerate, BrightnessAnimation};

use std::time::{Duration, Instant};

use crate::settings::BrightnessSettings;

/// Lowest value sent to the device. Zero makes some panels flash black.
pub const DEVICE_MIN: f32 = 0.01;

/// What the display sink receives: device backlight plus the opacity of a
/// black overlay composited above the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicalBrightness {
    pub device: f32,
    pub overlay_alpha: f32,
}

impl PhysicalBrightness {
    pub fn lerp(&self, to: &PhysicalBrightness, t: f32) -> PhysicalBrightness {
        PhysicalBrightness {
            device: self.device + (to.device - self.device) * t,
            overlay_alpha: self.overlay_alpha + (to.overlay_alpha - self.overlay_alpha) * t,
        }
    }
}

/// Maps a level in `0..=1` to physical values.
///
/// The lower half keeps the backlight at its floor and fades the overlay out,
/// the upper half has no overlay and ramps the backlight, so the usable range
/// reaches below what the device can dim to on its own.
pub fn level_to_physical(level: f32) -> PhysicalBrightness {
    let level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
    if level < 0.5 {
        PhysicalBrightness {
            device: DEVICE_MIN,
            overlay_alpha: 1.0 - 2.0 * level,
        }
    } else {
        PhysicalBrightness {
            device: DEVICE_MIN + (level - 0.5) * 2.0 * (1.0 - DEVICE_MIN),
            overlay_alpha: 0.0,
        }
    }
}

/// The two remembered presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrightnessMode {
    /// Mode A, "bright"
    #[default]
    Bright,
    /// Mode B, "dark"
    Dark,
}

impl BrightnessMode {
    pub fn other(self) -> Self {
        match self {
            BrightnessMode::Bright => BrightnessMode::Dark,
            BrightnessMode::Dark => BrightnessMode::Bright,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessState {
    pub level_a: f32,
    pub level_b: f32,
    pub active_mode: BrightnessMode,
    /// Physical values currently shown, mid-animation included
    pub current: PhysicalBrightness,
}

impl BrightnessState {
    pub fn level(&self, mode: BrightnessMode) -> f32 {
        match mode {
            BrightnessMode::Bright => self.level_a,
            BrightnessMode::Dark => self.level_b,
        }
    }

    pub fn active_level(&self) -> f32 {
        self.level(self.active_mode)
    }

    fn set_level(&mut self, mode: BrightnessMode, level: f32) {
        match mode {
            BrightnessMode::Bright => self.level_a = level,
            BrightnessMode::Dark => self.level_b = level,
        }
    }
}

/// Brightness levels per mode and the transition currently playing.
#[derive(Debug, Clone)]
pub struct BrightnessModel {
    state: BrightnessState,
    animation: Option<BrightnessAnimation>,
    duration: Duration,
}

impl BrightnessModel {
    pub fn new(settings: &BrightnessSettings) -> Self {
        let level_a = clamp_level(settings.default_level_a);
        let level_b = clamp_level(settings.default_level_b);
        Self {
            state: BrightnessState {
                level_a,
                level_b,
                active_mode: BrightnessMode::Bright,
                current: level_to_physical(level_a),
            },
            animation: None,
            duration: settings.animation_duration(),
        }
    }

    pub fn state(&self) -> BrightnessState {
        self.state
    }

    pub fn active_mode(&self) -> BrightnessMode {
        self.state.active_mode
    }

    pub fn active_level(&self) -> f32 {
        self.state.active_level()
    }

    pub fn level(&self, mode: BrightnessMode) -> f32 {
        self.state.level(mode)
    }

    pub fn current(&self) -> PhysicalBrightness {
        self.state.current
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Sets the active mode's level.
    pub fn set_level(&mut self, level: f32, animate: bool, now: Instant) -> PhysicalBrightness {
        self.set_mode_level(self.state.active_mode, level, animate, now)
    }

    /// Sets `mode`'s level and makes it the active one.
    pub fn set_mode_level(
        &mut self,
        mode: BrightnessMode,
        level: f32,
        animate: bool,
        now: Instant,
    ) -> PhysicalBrightness {
        let level = clamp_level(level);
        self.state.set_level(mode, level);
        self.state.active_mode = mode;
        self.transition_to(level_to_physical(level), animate, now)
    }

    /// Step control: no animation.
    pub fn adjust(&mut self, delta: f32) -> PhysicalBrightness {
        let level = self.state.active_level() + delta;
        // The instant is unused without animation
        self.set_level(level, false, Instant::now())
    }

    /// Swaps the active preset, always animated.
    pub fn toggle_mode(&mut self, now: Instant) -> PhysicalBrightness {
        let mode = self.state.active_mode.other();
        let level = self.state.level(mode);
        self.set_mode_level(mode, level, true, now)
    }

    /// Replaces levels and mode, e.g. from persisted preferences.
    pub fn restore(&mut self, level_a: f32, level_b: f32, mode: BrightnessMode) -> PhysicalBrightness {
        self.cancel_animation();
        self.state.level_a = clamp_level(level_a);
        self.state.level_b = clamp_level(level_b);
        self.state.active_mode = mode;
        self.state.current = level_to_physical(self.state.active_level());
        self.state.current
    }

    /// Advances a running animation. `None` when idle.
    pub fn tick(&mut self, now: Instant) -> Option<PhysicalBrightness> {
        let animation = self.animation.as_ref()?;
        self.state.current = animation.sample(now);
        if animation.is_finished(now) {
            self.animation = None;
        }
        Some(self.state.current)
    }

    /// Stops the running animation where it is. Safe to call when idle.
    pub fn cancel_animation(&mut self) {
        if self.animation.take().is_some() {
            tracing::trace!("brightness animation cancelled");
        }
    }

    fn transition_to(&mut self, target: PhysicalBrightness, animate: bool, now: Instant) -> PhysicalBrightness {
        self.cancel_animation();
        if animate && !self.duration.is_zero() {
            self.animation = Some(BrightnessAnimation::new(
                self.state.current,
                target,
                now,
                self.duration,
            ));
        } else {
            self.state.current = target;
        }
        self.state.current
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
