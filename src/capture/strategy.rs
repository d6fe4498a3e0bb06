use std::sync::Arc;

use crate::assets::fonts::FontBook;
use crate::assets::image::ImageAsset;
use crate::edit::state::EditState;
use crate::foundation::core::Rgb8;
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::render::compose::{ComposeOutcome, Compositor};
use crate::render::preview::{ViewTree, rasterize_tree};
use crate::render::surface::Surface;

/// Everything a capture needs, snapshotted when the export starts.
#[derive(Clone, Debug)]
pub struct CaptureRequest {
    pub image: Arc<ImageAsset>,
    pub edit: EditState,
    pub fonts: Arc<FontBook>,
    /// Retained live view, if a preview has been rendered.
    pub view: Option<Arc<ViewTree>>,
    /// Width preview-scale lengths were chosen at.
    pub reference_width: u32,
}

/// A way of turning the current edit into a full surface.
pub trait CaptureStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn capture(&self, req: &CaptureRequest) -> RetouchResult<Surface>;
}

/// Recompose from the source pixels at natural resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectRedraw;

impl CaptureStrategy for DirectRedraw {
    fn name(&self) -> &str {
        "direct-redraw"
    }

    #[tracing::instrument(skip_all, fields(image = req.image.name()))]
    fn capture(&self, req: &CaptureRequest) -> RetouchResult<Surface> {
        let pixels = req.image.pixels()?;
        if !req.image.pixel_read_allowed() {
            return Err(RetouchError::capture(
                "source pixels cannot be read back for redraw",
            ));
        }
        let mut surface = Surface::new(pixels.size);
        let mut compositor = Compositor::new(req.fonts.clone());
        match compositor.compose(
            &mut surface,
            &req.image,
            &req.edit.channel_values(),
            req.edit.effects(),
            req.edit.text(),
            req.reference_width,
        )? {
            ComposeOutcome::NotReady => Err(RetouchError::NotReady),
            ComposeOutcome::Drawn(_) => Ok(surface),
        }
    }
}

/// Rasterize the retained live view at `scale` times its displayed size.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceSnapshot {
    pub scale: f64,
    pub background: Rgb8,
}

impl SurfaceSnapshot {
    pub fn new(scale: f64, background: Rgb8) -> Self {
        Self { scale, background }
    }
}

impl CaptureStrategy for SurfaceSnapshot {
    fn name(&self) -> &str {
        "surface-snapshot"
    }

    #[tracing::instrument(skip_all, fields(scale = self.scale))]
    fn capture(&self, req: &CaptureRequest) -> RetouchResult<Surface> {
        let tree = req
            .view
            .as_ref()
            .ok_or_else(|| RetouchError::capture("no live view to snapshot"))?;
        let mut compositor = Compositor::new(req.fonts.clone());
        rasterize_tree(&mut compositor, tree, self.scale, self.background)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/strategy.rs"]
mod tests;
