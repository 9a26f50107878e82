//! Typed access to everything the frame remembers between runs.

mod store;

pub use store::{float_value, JsonFileStore, KeyValueStore, MemoryStore};

use serde_json::Value;
use std::sync::Arc;

use crate::brightness::{BrightnessMode, BrightnessState};
use crate::errors::Result;
use crate::playlist::{Locator, VisibilityMode};
use crate::transform::PerImageState;

const KEY_VISIBILITY_PRIVATE: &str = "visibility_private";
const KEY_LAST_URI: &str = "last_uri";
const KEY_LAST_URI_PRIVATE: &str = "last_uri_private";
const KEY_LEVEL_A: &str = "brightness_level_a";
const KEY_LEVEL_B: &str = "brightness_level_b";
const KEY_MODE_B: &str = "brightness_mode_b";
const KEY_HISTORY: &str = "history";
const KEY_HISTORY_PRIVATE: &str = "history_private";

fn position_key(locator: &Locator, field: &str) -> String {
    format!("position:{}:{}", locator.as_str(), field)
}

/// Brightness as it was last persisted. Missing levels fall back to settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SavedBrightness {
    pub level_a: Option<f32>,
    pub level_b: Option<f32>,
    pub mode: BrightnessMode,
}

/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence").finish_non_exhaustive()
    }
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    pub fn visibility_mode(&self) -> VisibilityMode {
        match self.store.get_bool(KEY_VISIBILITY_PRIVATE) {
            Some(true) => VisibilityMode::Private,
            _ => VisibilityMode::Public,
        }
    }

    pub fn set_visibility_mode(&self, mode: VisibilityMode) {
        self.store
            .set_bool(KEY_VISIBILITY_PRIVATE, mode == VisibilityMode::Private);
    }

    pub fn last_uri(&self, mode: VisibilityMode) -> Option<Locator> {
        self.store
            .get_string(last_uri_key(mode))
            .filter(|s| !s.is_empty())
            .map(Locator::new)
    }

    pub fn set_last_uri(&self, mode: VisibilityMode, locator: &Locator) {
        self.store.set_string(last_uri_key(mode), locator.as_str());
    }

    pub fn brightness(&self) -> SavedBrightness {
        let mode = match self.store.get_bool(KEY_MODE_B) {
            Some(true) => BrightnessMode::Dark,
            _ => BrightnessMode::Bright,
        };
        SavedBrightness {
            level_a: self.store.get_float(KEY_LEVEL_A),
            level_b: self.store.get_float(KEY_LEVEL_B),
            mode,
        }
    }

    pub fn save_brightness(&self, state: &BrightnessState) {
        self.store.set_many(vec![
            (KEY_LEVEL_A.to_string(), float_value(state.level_a)),
            (KEY_LEVEL_B.to_string(), float_value(state.level_b)),
            (
                KEY_MODE_B.to_string(),
                Some(Value::Bool(state.active_mode == BrightnessMode::Dark)),
            ),
        ]);
    }

    /// All three components must be present, otherwise the image opens fit-width.
    pub fn position(&self, locator: &Locator) -> Option<PerImageState> {
        let state = PerImageState {
            translate_x: self.store.get_float(&position_key(locator, "x"))?,
            translate_y: self.store.get_float(&position_key(locator, "y"))?,
            scale: self.store.get_float(&position_key(locator, "scale"))?,
        };
        state.is_finite().then_some(state)
    }

    pub fn save_position(&self, locator: &Locator, state: PerImageState) {
        self.store.set_many(vec![
            (position_key(locator, "x"), float_value(state.translate_x)),
            (position_key(locator, "y"), float_value(state.translate_y)),
            (position_key(locator, "scale"), float_value(state.scale)),
        ]);
    }

    /// Most recent first. A malformed entry yields an empty history.
    pub fn history(&self, mode: VisibilityMode) -> Vec<Locator> {
        let key = history_key(mode);
        let Some(raw) = self.store.get_string(key) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<Locator>>(&raw) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding malformed history");
                Vec::new()
            }
        }
    }

    pub fn save_history(&self, mode: VisibilityMode, history: &[Locator]) {
        match serde_json::to_string(history) {
            Ok(json) => self.store.set_string(history_key(mode), &json),
            Err(e) => tracing::warn!(error = %e, "failed to encode history"),
        }
    }
}

fn last_uri_key(mode: VisibilityMode) -> &'static str {
    match mode {
        VisibilityMode::Public => KEY_LAST_URI,
        VisibilityMode::Private => KEY_LAST_URI_PRIVATE,
    }
}

fn history_key(mode: VisibilityMode) -> &'static str {
    match mode {
        VisibilityMode::Public => KEY_HISTORY,
        VisibilityMode::Private => KEY_HISTORY_PRIVATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brightness::level_to_physical;

    #[test]
    fn test_defaults_when_empty() {
        let p = Persistence::in_memory();
        assert_eq!(p.visibility_mode(), VisibilityMode::Public);
        assert_eq!(p.last_uri(VisibilityMode::Public), None);
        assert_eq!(p.brightness(), SavedBrightness::default());
        assert!(p.history(VisibilityMode::Private).is_empty());
    }

    #[test]
    fn test_scopes_are_separate() {
        let p = Persistence::in_memory();
        p.set_last_uri(VisibilityMode::Private, &Locator::new("/secret/b.png"));
        p.save_history(VisibilityMode::Private, &[Locator::new("/secret/b.png")]);
        assert_eq!(p.last_uri(VisibilityMode::Public), None);
        assert!(p.history(VisibilityMode::Public).is_empty());
        assert_eq!(
            p.last_uri(VisibilityMode::Private),
            Some(Locator::new("/secret/b.png"))
        );
        assert_eq!(p.store().get_string("last_uri_private").as_deref(), Some("/secret/b.png"));
    }

    #[test]
    fn test_position_needs_every_component() {
        let p = Persistence::in_memory();
        let locator = Locator::new("https://example.com/pic.jpg");
        p.save_position(
            &locator,
            PerImageState { translate_x: -10.0, translate_y: -20.0, scale: 1.5 },
        );
        assert_eq!(p.position(&locator).map(|s| s.scale), Some(1.5));
        assert_eq!(
            p.store().get_float("position:https://example.com/pic.jpg:y"),
            Some(-20.0)
        );

        p.store().remove("position:https://example.com/pic.jpg:x");
        assert_eq!(p.position(&locator), None);
    }

    #[test]
    fn test_brightness_round_trip_through_keys() {
        let p = Persistence::in_memory();
        let state = BrightnessState {
            level_a: 0.9,
            level_b: 0.1,
            active_mode: BrightnessMode::Dark,
            current: level_to_physical(0.1),
        };
        p.save_brightness(&state);
        assert_eq!(p.store().get_bool("brightness_mode_b"), Some(true));
        let saved = p.brightness();
        assert_eq!(saved.level_a, Some(0.9));
        assert_eq!(saved.level_b, Some(0.1));
        assert_eq!(saved.mode, BrightnessMode::Dark);
    }

    #[test]
    fn test_malformed_history_reads_empty() {
        let p = Persistence::in_memory();
        p.store().set_string("history", "[\"/a.jpg\", 42");
        assert!(p.history(VisibilityMode::Public).is_empty());

        p.store().set_bool("history", true);
        assert!(p.history(VisibilityMode::Public).is_empty());
    }

    #[test]
    fn test_history_is_a_json_array() {
        let p = Persistence::in_memory();
        p.save_history(
            VisibilityMode::Public,
            &[Locator::new("/b.jpg"), Locator::new("/a.jpg")],
        );
        assert_eq!(
            p.store().get_string("history").as_deref(),
            Some("[\"/b.jpg\",\"/a.jpg\"]")
        );
    }
}
