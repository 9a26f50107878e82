//! Core of an always-on touch photo frame.
//!
//! Pointer events go into [`app::FrameApp`], which turns them into pan/zoom
//! transforms, brightness changes and navigation, and hands the display a list
//! of [`app::ViewCommand`]s. Image decoding, directory scanning and persistence
//! sit behind small traits with default implementations.

pub mod app;
pub mod brightness;
pub mod errors;
pub mod gesture;
pub mod image_source;
pub mod logging;
pub mod persistence;
pub mod playlist;
pub mod scan;
pub mod settings;
pub mod task_scheduler;
pub mod transform;
pub mod view;


pub use app::{FrameApp, Notice, ScanRequest, ViewCommand};
pub use errors::{FrameError, Result};
pub use gesture::{GestureCommand, GestureMachine, PointerEvent};
pub use playlist::{Locator, NavDirection};
pub use settings::Settings;
pub use transform::{Transform, TransformModel, Viewport};
