use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{FrameError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub gestures: GestureSettings,
    pub brightness: BrightnessSettings,
    pub view: ViewSettings,
    pub library: LibrarySettings,
    pub images: ImageSettings,
}

/// Thresholds used to tell taps, drags, flings and pinches apart.
/// Distances are device pixels, velocities device pixels per second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureSettings {
    pub touch_slop: f32,
    pub double_tap_timeout_ms: u64,
    pub double_tap_slop: f32,
    pub multi_tap_window_ms: u64,
    pub multi_tap_count: u32,
    pub fling_min_velocity: f32,
    pub fling_min_distance: f32,
    pub velocity_window_ms: u64,
    pub min_pinch_span: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            touch_slop: 16.0,
            double_tap_timeout_ms: 300,
            double_tap_slop: 100.0,
            multi_tap_window_ms: 500,
            multi_tap_count: 3,
            fling_min_velocity: 800.0,
            fling_min_distance: 120.0,
            velocity_window_ms: 100,
            min_pinch_span: 1.0,
        }
    }
}

impl GestureSettings {
    pub fn double_tap_timeout(&self) -> Duration {
        Duration::from_millis(self.double_tap_timeout_ms)
    }

    pub fn multi_tap_window(&self) -> Duration {
        Duration::from_millis(self.multi_tap_window_ms)
    }

    pub fn velocity_window(&self) -> Duration {
        Duration::from_millis(self.velocity_window_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrightnessSettings {
    /// Mode A ("bright") level used until the user calibrates it
    pub default_level_a: f32,
    /// Mode B ("dark") level
    pub default_level_b: f32,
    pub animation_ms: u64,
    pub frame_interval_ms: u64,
    /// Delta applied by the discrete step controls
    pub step: f32,
}

impl Default for BrightnessSettings {
    fn default() -> Self {
        Self {
            default_level_a: 0.8,
            default_level_b: 0.2,
            animation_ms: 300,
            frame_interval_ms: 16,
            step: 0.1,
        }
    }
}

impl BrightnessSettings {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewSettings {
    /// Upper zoom bound as a multiple of the fit-width scale
    pub max_zoom: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self { max_zoom: 4.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    /// Case-insensitive comparison of the full locator string
    #[default]
    Lexical,
    /// Case-insensitive, digit runs compared numerically
    Natural,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LibrarySettings {
    pub scan_roots: Vec<PathBuf>,
    pub history_limit: usize,
    pub sort_order: SortOrder,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            scan_roots: default_scan_roots(),
            history_limit: 10,
            sort_order: SortOrder::Lexical,
        }
    }
}

fn default_scan_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(user_dirs) = directories::UserDirs::new() {
        if let Some(pictures) = user_dirs.picture_dir() {
            roots.push(pictures.to_path_buf());
        }
        if let Some(downloads) = user_dirs.download_dir() {
            roots.push(downloads.to_path_buf());
        }
    }
    roots
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageSettings {
    pub max_width: u32,
    pub max_height: u32,
    pub load_timeout_secs: u64,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            load_timeout_secs: 30,
        }
    }
}

impl ImageSettings {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

pub(crate) fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "picframe", "PicFrame")
}

impl Settings {
    pub fn load() -> Self {
        if let Some(proj_dirs) = project_dirs() {
            let config_path = proj_dirs.config_dir().join("settings.json");
            if config_path.exists() {
                match Self::load_from(&config_path) {
                    Ok(settings) => return settings,
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring unreadable settings");
                    }
                }
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validated()
    }

    pub fn save(&self) {
        if let Some(proj_dirs) = project_dirs() {
            let config_dir = proj_dirs.config_dir();
            let _ = std::fs::create_dir_all(config_dir);
            if let Err(e) = self.save_to(&config_dir.join("settings.json")) {
                tracing::warn!(error = %e, "failed to save settings");
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Rejects values that would break the gesture or view invariants
    pub fn validated(self) -> Result<Self> {
        let g = &self.gestures;
        if !(g.touch_slop >= 0.0) || !(g.fling_min_velocity >= 0.0) || !(g.min_pinch_span > 0.0) {
            return Err(FrameError::SettingsError {
                message: "gesture thresholds must be non-negative".to_string(),
            });
        }
        if !(self.view.max_zoom >= 1.0) {
            return Err(FrameError::SettingsError {
                message: format!("max_zoom must be at least 1.0, got {}", self.view.max_zoom),
            });
        }
        let b = &self.brightness;
        if !(0.0..=1.0).contains(&b.default_level_a) || !(0.0..=1.0).contains(&b.default_level_b) {
            return Err(FrameError::SettingsError {
                message: "default brightness levels must be within 0..=1".to_string(),
            });
        }
        if self.library.history_limit == 0 {
            return Err(FrameError::SettingsError {
                message: "history_limit must be positive".to_string(),
            });
        }
        Ok(self)
    }
}
