use crate::brightness::{BrightnessModel, PhysicalBrightness};
use crate::settings::Settings;
use crate::transform::{ImageExtent, PerImageState, Transform, TransformModel, Viewport};

/// Everything the gesture machine is allowed to mutate for the session on
/// screen. Passed explicitly instead of living in globals.
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub viewport: Viewport,
    /// `None` until the first image is displayed
    pub transform: Option<TransformModel>,
    pub brightness: BrightnessModel,
    max_zoom: f32,
}

/// What the presentation layer draws for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub transform: Option<Transform>,
    pub brightness: PhysicalBrightness,
}

impl ViewContext {
    pub fn new(viewport: Viewport, settings: &Settings) -> Self {
        Self {
            viewport,
            transform: None,
            brightness: BrightnessModel::new(&settings.brightness),
            max_zoom: settings.view.max_zoom,
        }
    }

    /// Installs a fresh fit-width transform for a newly loaded image and
    /// applies the persisted pan/zoom for it, if any.
    pub fn show_image(&mut self, extent: ImageExtent, saved: Option<PerImageState>) -> Transform {
        let mut model = TransformModel::load_with_max_zoom(extent, self.viewport, self.max_zoom);
        if let Some(state) = saved {
            model.restore(state);
        }
        let transform = model.transform();
        self.transform = Some(model);
        transform
    }

    pub fn clear_image(&mut self) {
        self.transform = None;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> Option<Transform> {
        self.viewport = viewport;
        let model = self.transform.as_mut()?;
        model.set_viewport(viewport);
        Some(model.transform())
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            transform: self.transform.as_ref().map(|m| m.transform()),
            brightness: self.brightness.current(),
        }
    }
}
