use super::{FrameApp, Notice, ViewCommand};
use crate::playlist::{Locator, NavDirection, Navigation, VisibilityMode};

impl FrameApp {
    /// Shows `locator`: records it in the playlist, history and the scope's
    /// last-URI key, then starts loading it.
    pub fn open(&mut self, locator: Locator) -> Vec<ViewCommand> {
        let mut out = Vec::new();
        if self.config_panel_visible {
            self.config_panel_visible = false;
            out.push(ViewCommand::ConfigPanel(false));
        }
        self.playlist.record_view(&locator);
        self.show_locator(locator, &mut out);
        out
    }

    pub fn navigate(&mut self, direction: NavDirection) -> Vec<ViewCommand> {
        let mut out = Vec::new();
        match self.playlist.navigate(direction) {
            Navigation::Load(entry) => {
                tracing::debug!(locator = %entry.locator, ?direction, "navigating");
                self.show_locator(entry.locator, &mut out);
            }
            Navigation::NoImages => {
                tracing::info!("navigation requested with an empty playlist");
                out.push(ViewCommand::Notify(Notice::NoImages));
            }
        }
        out
    }

    fn show_locator(&mut self, locator: Locator, out: &mut Vec<ViewCommand>) {
        // Leave the outgoing image where the user put it
        self.persist_view_state();
        self.playlist.add_to_history(&locator);
        self.persistence
            .set_last_uri(self.playlist.visibility_mode(), &locator);
        out.extend(self.request_load(locator));
    }

    /// Public ↔ private. The new scope shows its own last image, or nothing.
    pub fn toggle_visibility_mode(&mut self) -> Vec<ViewCommand> {
        self.persist_view_state();
        let target = self.playlist.toggle_visibility_mode();
        let private = self.playlist.visibility_mode() == VisibilityMode::Private;

        let mut out = vec![ViewCommand::Notify(Notice::PrivateMode(private))];
        match target {
            Some(locator) => {
                self.playlist.record_view(&locator);
                out.extend(self.request_load(locator));
            }
            None => {
                let was_loading = self.pending_load.take().is_some();
                self.current_locator = None;
                self.current_image = None;
                self.view.clear_image();
                if was_loading {
                    out.push(ViewCommand::Loading(false));
                }
                out.push(ViewCommand::ClearImage);
            }
        }
        out
    }

    /// Startup: visibility scope, brightness (no animation) and the scope's
    /// last image.
    pub fn restore_session(&mut self) -> Vec<ViewCommand> {
        let saved = self.persistence.brightness();
        let defaults = &self.settings.brightness;
        let physical = self.view.brightness.restore(
            saved.level_a.unwrap_or(defaults.default_level_a),
            saved.level_b.unwrap_or(defaults.default_level_b),
            saved.mode,
        );

        let mut out = vec![ViewCommand::ApplyBrightness(physical)];
        if self.playlist.visibility_mode() == VisibilityMode::Private {
            out.push(ViewCommand::Notify(Notice::PrivateMode(true)));
        }

        match self.playlist.restore_target() {
            Some(locator) => {
                tracing::info!(%locator, "restoring last image");
                self.playlist.record_view(&locator);
                out.extend(self.request_load(locator));
            }
            None => tracing::info!("nothing to restore"),
        }
        out
    }
}
