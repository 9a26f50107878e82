use crate::brightness::PhysicalBrightness;
use crate::gesture::GestureMachine;
use crate::image_source::LoadedImage;
use crate::persistence::Persistence;
use crate::playlist::{Locator, PlaylistManager, VisibilityMode};
use crate::settings::Settings;
use crate::task_scheduler::TaskScheduler;
use crate::transform::{Transform, Viewport};
use crate::view::{RenderState, ViewContext};

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Short messages for the presentation layer to surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    NoImages,
    ScanStarted,
    ScanFinished(usize),
    ScanRejected,
    PrivateMode(bool),
    LoadError(String),
}

/// Everything the display has to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCommand {
    Render(Transform),
    ApplyBrightness(PhysicalBrightness),
    /// New pixels are available through `FrameApp::current_image`
    ImageReady {
        locator: Locator,
        width: u32,
        height: u32,
    },
    ClearImage,
    Loading(bool),
    LoadFailed {
        locator: Locator,
        message: String,
    },
    ConfigPanel(bool),
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRequest {
    Started,
    AlreadyRunning,
}

impl ScanRequest {
    pub fn notice(self) -> Notice {
        match self {
            ScanRequest::Started => Notice::ScanStarted,
            ScanRequest::AlreadyRunning => Notice::ScanRejected,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PendingLoad {
    pub locator: Locator,
    pub generation: u64,
    pub started: Instant,
    pub timeout: Duration,
}

/// One viewing session: the view models, gesture machine, playlist and the
/// background workers feeding them.
pub struct FrameApp {
    pub(crate) settings: Settings,
    pub(crate) view: ViewContext,
    pub(crate) gestures: GestureMachine,
    pub(crate) playlist: PlaylistManager,
    pub(crate) persistence: Persistence,
    pub(crate) scheduler: TaskScheduler,

    pub(crate) current_locator: Option<Locator>,
    pub(crate) current_image: Option<LoadedImage>,
    pub(crate) pending_load: Option<PendingLoad>,
    pub(crate) next_generation: u64,

    pub(crate) scan_cancel: Option<Arc<AtomicBool>>,
    pub(crate) config_panel_visible: bool,
}

impl FrameApp {
    pub fn new(
        settings: Settings,
        viewport: Viewport,
        persistence: Persistence,
        scheduler: TaskScheduler,
    ) -> Self {
        let view = ViewContext::new(viewport, &settings);
        let gestures = GestureMachine::new(settings.gestures.clone());
        let playlist = PlaylistManager::new(persistence.clone(), settings.library.history_limit);

        Self {
            settings,
            view,
            gestures,
            playlist,
            persistence,
            scheduler,
            current_locator: None,
            current_image: None,
            pending_load: None,
            next_generation: 0,
            scan_cancel: None,
            config_panel_visible: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn view(&self) -> &ViewContext {
        &self.view
    }

    pub fn render_state(&self) -> RenderState {
        self.view.render_state()
    }

    pub fn playlist(&self) -> &PlaylistManager {
        &self.playlist
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn current_locator(&self) -> Option<&Locator> {
        self.current_locator.as_ref()
    }

    pub fn current_image(&self) -> Option<&LoadedImage> {
        self.current_image.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    pub fn config_panel_visible(&self) -> bool {
        self.config_panel_visible
    }

    pub fn visibility_mode(&self) -> VisibilityMode {
        self.playlist.visibility_mode()
    }

    /// Writes the current image's pan/zoom and the brightness levels.
    pub fn persist_view_state(&self) {
        if let (Some(locator), Some(model)) = (&self.current_locator, &self.view.transform) {
            self.persistence.save_position(locator, model.snapshot());
        }
        self.persistence.save_brightness(&self.view.brightness.state());
    }
}
