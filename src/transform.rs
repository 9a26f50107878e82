use serde::{Deserialize, Serialize};

use crate::errors::{FrameError, Result};

/// Screen size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: f32,
    height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self { width, height })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

/// Intrinsic pixel size of the loaded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageExtent {
    width: f32,
    height: f32,
}

impl ImageExtent {
    pub fn new(width: f32, height: f32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self { width, height })
    }

    pub fn from_pixels(width: u32, height: u32) -> Result<Self> {
        Self::new(width as f32, height as f32)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }
}

fn check_dimensions(width: f32, height: f32) -> Result<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(FrameError::InvalidDimensions { width, height })
    }
}

/// Image-space to screen-space map. Scale is always uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Transform {
    fn uniform(scale: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale_x: scale,
            scale_y: scale,
            translate_x,
            translate_y,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale_x
    }

    /// Maps an image-space point to the screen.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale_x + self.translate_x,
            y * self.scale_y + self.translate_y,
        )
    }
}

/// Last pan/zoom of one image, persisted per locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerImageState {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl PerImageState {
    pub fn is_finite(&self) -> bool {
        self.translate_x.is_finite() && self.translate_y.is_finite() && self.scale.is_finite()
    }
}

/// Owns the transform of the image on screen and keeps it inside legal bounds.
///
/// A model only exists once an image has been loaded, so pan and zoom can never
/// run against an empty viewport.
#[derive(Debug, Clone)]
pub struct TransformModel {
    transform: Transform,
    viewport: Viewport,
    extent: ImageExtent,
    base_scale: f32,
    max_zoom: f32,
}

impl TransformModel {
    pub const DEFAULT_MAX_ZOOM: f32 = 4.0;

    /// Fit-width placement: full image width on screen, vertically centered
    /// when it is shorter than the viewport, otherwise top-aligned.
    pub fn load(extent: ImageExtent, viewport: Viewport) -> Self {
        Self::load_with_max_zoom(extent, viewport, Self::DEFAULT_MAX_ZOOM)
    }

    pub fn load_with_max_zoom(extent: ImageExtent, viewport: Viewport, max_zoom: f32) -> Self {
        let scale = viewport.width / extent.width;
        let displayed_height = extent.height * scale;
        let translate_y = if displayed_height < viewport.height {
            (viewport.height - displayed_height) / 2.0
        } else {
            0.0
        };

        Self {
            transform: Transform::uniform(scale, 0.0, translate_y),
            viewport,
            extent,
            base_scale: scale,
            max_zoom: max_zoom.max(1.0),
        }
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn extent(&self) -> ImageExtent {
        self.extent
    }

    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    pub fn max_scale(&self) -> f32 {
        self.base_scale * self.max_zoom
    }

    pub fn displayed_width(&self) -> f32 {
        self.extent.width * self.transform.scale_x
    }

    pub fn displayed_height(&self) -> f32 {
        self.extent.height * self.transform.scale_y
    }

    /// Applies a persisted pan/zoom. Values out of range are clamped.
    pub fn restore(&mut self, state: PerImageState) {
        if !state.is_finite() {
            tracing::debug!("ignoring non-finite persisted transform");
            return;
        }
        let scale = state.scale.clamp(self.base_scale, self.max_scale());
        self.transform = Transform::uniform(scale, state.translate_x, state.translate_y);
        self.clamp_bounds();
    }

    pub fn snapshot(&self) -> PerImageState {
        PerImageState {
            translate_x: self.transform.translate_x,
            translate_y: self.transform.translate_y,
            scale: self.transform.scale_x,
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
        self.clamp_bounds();
    }

    /// Scales about a screen point that stays visually fixed.
    pub fn zoom(&mut self, factor: f32, focal_x: f32, focal_y: f32) {
        if !factor.is_finite() || factor <= 0.0 || !focal_x.is_finite() || !focal_y.is_finite() {
            return;
        }

        let old_scale = self.transform.scale_x;
        let new_scale = (old_scale * factor).clamp(self.base_scale, self.max_scale());
        let ratio = new_scale / old_scale;

        // Keep the image point under the focal point where it is
        let t = &mut self.transform;
        t.translate_x = focal_x - (focal_x - t.translate_x) * ratio;
        t.translate_y = focal_y - (focal_y - t.translate_y) * ratio;
        t.scale_x = new_scale;
        t.scale_y = new_scale;

        self.clamp_bounds();
    }

    /// Enforces the minimum-scale floor, then the pan bounds.
    ///
    /// Horizontally an image that fits is pinned to the left edge and an
    /// overflowing one may pan edge to edge. Vertically an image that fits is
    /// always recentered.
    pub fn clamp_bounds(&mut self) {
        if self.displayed_width() < self.viewport.width {
            let floor = self.viewport.width / self.extent.width;
            self.transform.scale_x = floor;
            self.transform.scale_y = floor;
        }

        let displayed_width = self.displayed_width();
        let displayed_height = self.displayed_height();
        let t = &mut self.transform;

        if displayed_width <= self.viewport.width {
            t.translate_x = 0.0;
        } else {
            let min_x = self.viewport.width - displayed_width;
            t.translate_x = t.translate_x.clamp(min_x, 0.0);
        }

        if displayed_height <= self.viewport.height {
            t.translate_y = (self.viewport.height - displayed_height) / 2.0;
        } else {
            let min_y = self.viewport.height - displayed_height;
            t.translate_y = t.translate_y.clamp(min_y, 0.0);
        }
    }

    /// Rotation or resume with a different screen size: keep the relative zoom.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        let relative_zoom = self.transform.scale_x / self.base_scale;
        self.viewport = viewport;
        self.base_scale = viewport.width / self.extent.width;
        let scale = (self.base_scale * relative_zoom).clamp(self.base_scale, self.max_scale());
        self.transform.scale_x = scale;
        self.transform.scale_y = scale;
        self.clamp_bounds();
    }
}
