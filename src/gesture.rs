//! Turns a raw pointer stream into pan/zoom, brightness drags, taps, flings
//! and the two-finger private-mode toggle.
//!
//! Every transition lives in [`GestureMachine::handle`] and
//! [`GestureMachine::poll`]; the machine never touches widgets and reports
//! what the presentation layer has to do as [`GestureCommand`]s.

mod events;
mod tap;
mod velocity;

pub use events::{Point, PointerEvent, PointerId, PointerPhase};
pub use tap::{MultiTapCounter, PendingTap, TapDown, TapTracker};
pub use velocity::VelocityTracker;

use std::time::Instant;

use crate::brightness::{BrightnessMode, BrightnessState, PhysicalBrightness};
use crate::playlist::NavDirection;
use crate::settings::GestureSettings;
use crate::transform::Transform;
use crate::view::ViewContext;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureCommand {
    TransformChanged(Transform),
    BrightnessChanged(PhysicalBrightness),
    /// A confirmed single tap swapped the brightness preset
    BrightnessModeToggled(BrightnessMode),
    ToggleConfigPanel,
    Navigate(NavDirection),
    ToggleVisibilityMode,
    /// Last pointer left the screen; time to persist transform and brightness
    GestureFinished,
}

/// Disambiguated intent of the current touch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureIntent {
    Undetermined,
    PanZoom,
    BrightnessHorizontal,
    BrightnessVertical,
    SwipeNav,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinch {
    pub centroid: Point,
    pub span: f32,
}

impl Pinch {
    fn between(a: Point, b: Point) -> Self {
        Self {
            centroid: a.midpoint(&b),
            span: a.distance(&b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    SingleDown,
    /// Drives `mode`'s level from horizontal travel relative to `origin`
    BrightnessHorizontal {
        origin: Point,
        baseline_level: f32,
        mode: BrightnessMode,
    },
    /// Drives `mode`'s level from vertical travel; up brightens
    BrightnessVertical {
        origin: Point,
        baseline_level: f32,
        mode: BrightnessMode,
    },
    SwipeCandidate,
    /// `pinch` is `None` once the sequence drops back to one pointer; the rest
    /// of the sequence is then locked out of brightness handling
    PanZoom { pinch: Option<Pinch> },
}

impl GestureState {
    pub fn intent(&self) -> GestureIntent {
        match self {
            GestureState::Idle | GestureState::SingleDown => GestureIntent::Undetermined,
            GestureState::BrightnessHorizontal { .. } => GestureIntent::BrightnessHorizontal,
            GestureState::BrightnessVertical { .. } => GestureIntent::BrightnessVertical,
            GestureState::SwipeCandidate => GestureIntent::SwipeNav,
            GestureState::PanZoom { .. } => GestureIntent::PanZoom,
        }
    }
}

/// Per touch sequence, from first down to last up.
#[derive(Debug, Clone)]
struct GestureSession {
    pointers: Vec<(PointerId, Point)>,
    start: Point,
    /// Brightness when the first finger landed, both presets included
    baseline: BrightnessState,
    velocity: VelocityTracker,
    had_multiple: bool,
    /// The second tap of a double tap already fired on down
    double_tap: bool,
}

impl GestureSession {
    fn position(&self, id: PointerId) -> Option<Point> {
        self.pointers.iter().find(|(pid, _)| *pid == id).map(|(_, p)| *p)
    }

    fn primary(&self) -> Option<(PointerId, Point)> {
        self.pointers.first().copied()
    }

    fn pinch(&self) -> Option<Pinch> {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => Some(Pinch::between(*a, *b)),
            _ => None,
        }
    }
}

pub struct GestureMachine {
    settings: GestureSettings,
    state: GestureState,
    session: Option<GestureSession>,
    taps: TapTracker,
    two_finger_taps: MultiTapCounter,
}

impl GestureMachine {
    pub fn new(settings: GestureSettings) -> Self {
        let taps = TapTracker::new(settings.double_tap_timeout(), settings.double_tap_slop);
        let two_finger_taps = MultiTapCounter::new(settings.multi_tap_window(), settings.multi_tap_count);
        Self {
            settings,
            state: GestureState::Idle,
            session: None,
            taps,
            two_finger_taps,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn intent(&self) -> GestureIntent {
        self.state.intent()
    }

    pub fn active_pointers(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.pointers.len())
    }

    pub fn has_pending_tap(&self) -> bool {
        self.taps.pending().is_some()
    }

    pub fn handle(&mut self, event: &PointerEvent, ctx: &mut ViewContext) -> Vec<GestureCommand> {
        let mut out = Vec::new();
        self.confirm_expired_tap(event.time, ctx, &mut out);

        match event.phase {
            PointerPhase::Down => self.on_down(event, ctx, &mut out),
            PointerPhase::Move => self.on_move(event, ctx, &mut out),
            PointerPhase::Up => self.on_up(event, ctx, &mut out),
            PointerPhase::Cancel => self.on_cancel(&mut out),
        }
        out
    }

    /// Time-driven transitions: confirms a single tap once no second tap came.
    pub fn poll(&mut self, now: Instant, ctx: &mut ViewContext) -> Vec<GestureCommand> {
        let mut out = Vec::new();
        self.confirm_expired_tap(now, ctx, &mut out);
        out
    }

    fn confirm_expired_tap(&mut self, now: Instant, ctx: &mut ViewContext, out: &mut Vec<GestureCommand>) {
        if self.taps.take_expired(now).is_some() {
            self.single_tap_confirmed(now, ctx, out);
        }
    }

    fn single_tap_confirmed(&mut self, now: Instant, ctx: &mut ViewContext, out: &mut Vec<GestureCommand>) {
        let physical = ctx.brightness.toggle_mode(now);
        tracing::debug!(mode = ?ctx.brightness.active_mode(), "single tap toggled brightness mode");
        out.push(GestureCommand::BrightnessChanged(physical));
        out.push(GestureCommand::BrightnessModeToggled(ctx.brightness.active_mode()));
    }

    fn on_down(&mut self, event: &PointerEvent, ctx: &mut ViewContext, out: &mut Vec<GestureCommand>) {
        let Some(session) = self.session.as_mut() else {
            self.begin_session(event, ctx, out);
            return;
        };

        if let Some(entry) = session.pointers.iter_mut().find(|(id, _)| *id == event.id) {
            entry.1 = event.position;
            return;
        }
        session.pointers.push((event.id, event.position));
        session.had_multiple = true;

        if session.pointers.len() == 2 && self.two_finger_taps.register(event.time) {
            tracing::debug!("two-finger multi-tap toggles visibility mode");
            out.push(GestureCommand::ToggleVisibilityMode);
        }

        match self.state {
            GestureState::BrightnessHorizontal { .. } | GestureState::BrightnessVertical { .. } => {
                // A vertical drag touches the other preset, so both levels go back
                let baseline = session.baseline;
                let physical = ctx.brightness.restore(
                    baseline.level_a,
                    baseline.level_b,
                    baseline.active_mode,
                );
                out.push(GestureCommand::BrightnessChanged(physical));
            }
            _ => {}
        }

        self.state = GestureState::PanZoom { pinch: session.pinch() };
    }

    fn begin_session(&mut self, event: &PointerEvent, ctx: &mut ViewContext, out: &mut Vec<GestureCommand>) {
        let mut velocity = VelocityTracker::new(self.settings.velocity_window());
        velocity.add(event.time, event.position);

        let double_tap = match self.taps.on_down(event.time, event.position) {
            TapDown::DoubleTap => {
                out.push(GestureCommand::ToggleConfigPanel);
                true
            }
            TapDown::ConfirmsPrevious => {
                self.single_tap_confirmed(event.time, ctx, out);
                false
            }
            TapDown::Fresh => false,
        };

        self.session = Some(GestureSession {
            pointers: vec![(event.id, event.position)],
            start: event.position,
            baseline: ctx.brightness.state(),
            velocity,
            had_multiple: false,
            double_tap,
        });
        self.state = GestureState::SingleDown;
    }

    fn on_move(&mut self, event: &PointerEvent, ctx: &mut ViewContext, out: &mut Vec<GestureCommand>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(entry) = session.pointers.iter_mut().find(|(id, _)| *id == event.id) else {
            return;
        };
        entry.1 = event.position;

        let is_primary = session.primary().map(|(id, _)| id) == Some(event.id);
        if is_primary && session.pointers.len() == 1 {
            session.velocity.add(event.time, event.position);
        }

        let position = event.position;
        let viewport = ctx.viewport;

        match self.state {
            GestureState::Idle => {}
            GestureState::SingleDown => {
                if session.pointers.len() != 1 {
                    return;
                }
                let dx = position.x - session.start.x;
                let dy = position.y - session.start.y;
                if dx.hypot(dy) <= self.settings.touch_slop {
                    return;
                }

                // Ties go to the horizontal axis
                if dx.abs() >= dy.abs() {
                    let vx = session.velocity.velocity().x;
                    if vx.abs() >= self.settings.fling_min_velocity {
                        self.state = GestureState::SwipeCandidate;
                    } else {
                        let origin = session.start;
                        let baseline_level = session.baseline.active_level();
                        let mode = session.baseline.active_mode;
                        let level = baseline_level + dx / viewport.width();
                        let physical = ctx.brightness.set_mode_level(mode, level, false, event.time);
                        out.push(GestureCommand::BrightnessChanged(physical));
                        self.state = GestureState::BrightnessHorizontal {
                            origin,
                            baseline_level,
                            mode,
                        };
                    }
                } else {
                    // Switching presets: restart from here so the level does not jump
                    let mode = session.baseline.active_mode.other();
                    let baseline_level = ctx.brightness.level(mode);
                    let physical = ctx.brightness.set_mode_level(mode, baseline_level, false, event.time);
                    out.push(GestureCommand::BrightnessChanged(physical));
                    self.state = GestureState::BrightnessVertical {
                        origin: position,
                        baseline_level,
                        mode,
                    };
                }
            }
            GestureState::BrightnessHorizontal {
                origin,
                baseline_level,
                mode,
            } => {
                let level = baseline_level + (position.x - origin.x) / viewport.width();
                let physical = ctx.brightness.set_mode_level(mode, level, false, event.time);
                out.push(GestureCommand::BrightnessChanged(physical));
            }
            GestureState::BrightnessVertical {
                origin,
                baseline_level,
                mode,
            } => {
                let level = baseline_level - (position.y - origin.y) / viewport.height();
                let physical = ctx.brightness.set_mode_level(mode, level, false, event.time);
                out.push(GestureCommand::BrightnessChanged(physical));
            }
            GestureState::SwipeCandidate => {
                let vx = session.velocity.velocity().x;
                if vx.abs() < self.settings.fling_min_velocity {
                    // Finger slowed down: this is a brightness drag after all
                    tracing::trace!(vx, "swipe degraded into brightness drag");
                    self.state = GestureState::BrightnessHorizontal {
                        origin: position,
                        baseline_level: session.baseline.active_level(),
                        mode: session.baseline.active_mode,
                    };
                }
            }
            GestureState::PanZoom { pinch: Some(previous) } => {
                let Some(current) = session.pinch() else {
                    return;
                };
                if let Some(model) = ctx.transform.as_mut() {
                    model.pan(
                        current.centroid.x - previous.centroid.x,
                        current.centroid.y - previous.centroid.y,
                    );
                    let min_span = self.settings.min_pinch_span;
                    if previous.span >= min_span && current.span >= min_span {
                        model.zoom(current.span / previous.span, current.centroid.x, current.centroid.y);
                    }
                    out.push(GestureCommand::TransformChanged(model.transform()));
                }
                self.state = GestureState::PanZoom { pinch: Some(current) };
            }
            GestureState::PanZoom { pinch: None } => {}
        }
    }

    fn on_up(&mut self, event: &PointerEvent, _ctx: &mut ViewContext, out: &mut Vec<GestureCommand>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.position(event.id).is_none() {
            return;
        }
        let is_primary = session.primary().map(|(id, _)| id) == Some(event.id);
        if is_primary && session.pointers.len() == 1 {
            session.velocity.add(event.time, event.position);
        }
        session.pointers.retain(|(id, _)| *id != event.id);

        match session.pointers.len() {
            0 => self.finish_sequence(event, out),
            1 => {
                if let GestureState::PanZoom { .. } = self.state {
                    self.state = GestureState::PanZoom { pinch: None };
                }
            }
            _ => {
                if let GestureState::PanZoom { .. } = self.state {
                    self.state = GestureState::PanZoom { pinch: session.pinch() };
                }
            }
        }
    }

    fn finish_sequence(&mut self, event: &PointerEvent, out: &mut Vec<GestureCommand>) {
        let Some(session) = self.session.take() else {
            return;
        };

        match self.state {
            GestureState::SingleDown if !session.had_multiple && !session.double_tap => {
                self.taps.record_tap(event.time, event.position);
            }
            GestureState::SwipeCandidate => {
                let dx = event.position.x - session.start.x;
                let dy = event.position.y - session.start.y;
                let vx = session.velocity.velocity().x;
                if dx.abs() > dy.abs()
                    && dx.abs() >= self.settings.fling_min_distance
                    && vx.abs() >= self.settings.fling_min_velocity
                {
                    // Content follows the finger: a leftward fling brings in the next image
                    let direction = if dx < 0.0 {
                        NavDirection::Next
                    } else {
                        NavDirection::Previous
                    };
                    tracing::debug!(?direction, dx, vx, "fling navigation");
                    out.push(GestureCommand::Navigate(direction));
                }
            }
            _ => {}
        }

        self.state = GestureState::Idle;
        out.push(GestureCommand::GestureFinished);
    }

    fn on_cancel(&mut self, out: &mut Vec<GestureCommand>) {
        if self.session.take().is_some() {
            self.state = GestureState::Idle;
            out.push(GestureCommand::GestureFinished);
        }
    }
}
