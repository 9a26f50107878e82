use super::{FrameApp, ViewCommand};
use crate::gesture::{GestureCommand, PointerEvent};
use crate::transform::Viewport;

use std::time::Instant;

impl FrameApp {
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<ViewCommand> {
        let commands = self.gestures.handle(&event, &mut self.view);
        self.apply_gesture_commands(commands)
    }

    pub(crate) fn apply_gesture_commands(&mut self, commands: Vec<GestureCommand>) -> Vec<ViewCommand> {
        let mut out = Vec::new();
        for command in commands {
            match command {
                GestureCommand::TransformChanged(transform) => out.push(ViewCommand::Render(transform)),
                GestureCommand::BrightnessChanged(physical) => {
                    out.push(ViewCommand::ApplyBrightness(physical))
                }
                GestureCommand::BrightnessModeToggled(mode) => {
                    tracing::debug!(?mode, "brightness mode toggled");
                    self.persistence.save_brightness(&self.view.brightness.state());
                }
                GestureCommand::ToggleConfigPanel => {
                    self.config_panel_visible = !self.config_panel_visible;
                    out.push(ViewCommand::ConfigPanel(self.config_panel_visible));
                }
                GestureCommand::Navigate(direction) => out.extend(self.navigate(direction)),
                GestureCommand::ToggleVisibilityMode => out.extend(self.toggle_visibility_mode()),
                GestureCommand::GestureFinished => self.persist_view_state(),
            }
        }
        out
    }

    /// Advances the brightness animation. Call once per display frame.
    pub fn tick(&mut self, now: Instant) -> Option<ViewCommand> {
        self.view.brightness.tick(now).map(ViewCommand::ApplyBrightness)
    }

    /// Rotation or resume with a new screen size.
    pub fn resize(&mut self, viewport: Viewport) -> Vec<ViewCommand> {
        if viewport == self.view.viewport {
            return Vec::new();
        }
        tracing::debug!(width = viewport.width(), height = viewport.height(), "viewport changed");
        match self.view.set_viewport(viewport) {
            Some(transform) => vec![ViewCommand::Render(transform)],
            None => Vec::new(),
        }
    }

    /// Discrete brightness buttons: `steps` multiples of the configured step.
    pub fn step_brightness(&mut self, steps: i32) -> ViewCommand {
        let delta = steps as f32 * self.settings.brightness.step;
        let physical = self.view.brightness.adjust(delta);
        self.persistence.save_brightness(&self.view.brightness.state());
        ViewCommand::ApplyBrightness(physical)
    }
}
