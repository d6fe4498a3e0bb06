use std::sync::Arc;

use vello_cpu::kurbo::Affine;

use crate::assets::fonts::FontBook;
use crate::assets::image::ImageAsset;
use crate::edit::state::{EditState, TextSpec};
use crate::effects::catalog::{EffectId, EffectSet};
use crate::filters::catalog::FilterDefinition;
use crate::filters::channels::{INTENSITY_NOMINAL, compute_channel_values};
use crate::foundation::core::{PixelSize, Rgb8};
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::render::compose::{ComposeOutcome, Compositor};
use crate::render::surface::Surface;

/// One displayed layer of the live preview, in display order.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewNode {
    /// The filtered photo bitmap at preview resolution.
    Photo(Arc<Surface>),
    Overlay(EffectId),
    Text(TextSpec),
}

/// Retained structure of what the live preview currently shows.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTree {
    /// Displayed size; preview-scale lengths are relative to its width.
    pub size: PixelSize,
    pub nodes: Vec<ViewNode>,
}

impl ViewTree {
    pub fn reference_width(&self) -> u32 {
        self.size.width
    }

    pub fn photo(&self) -> Option<&Arc<Surface>> {
        self.nodes.iter().find_map(|n| match n {
            ViewNode::Photo(p) => Some(p),
            _ => None,
        })
    }
}

/// On-screen preview renderer.
///
/// Renders at the image size fitted inside the preview box and keeps the resulting view tree
/// around so an export can fall back to rasterizing what is on screen.
pub struct LiveView {
    compositor: Compositor,
    surface: Option<Surface>,
    tree: Option<Arc<ViewTree>>,
}

impl LiveView {
    pub fn new(fonts: Arc<FontBook>) -> Self {
        Self {
            compositor: Compositor::new(fonts),
            surface: None,
            tree: None,
        }
    }

    /// Re-render the preview for `edit`.
    ///
    /// A pending image yields [`ComposeOutcome::NotReady`] and keeps the previous frame.
    #[tracing::instrument(skip_all, fields(image = image.name(), preview_box = %preview_box))]
    pub fn render(
        &mut self,
        image: &ImageAsset,
        edit: &EditState,
        preview_box: PixelSize,
    ) -> RetouchResult<ComposeOutcome> {
        let Some(natural) = image.size() else {
            // Let the compositor decide between not-ready and a decode error.
            let mut scratch = Surface::new(preview_box);
            let out = self.compositor.compose(
                &mut scratch,
                image,
                &edit.channel_values(),
                edit.effects(),
                edit.text(),
                preview_box.width,
            )?;
            return Ok(out);
        };
        let size = natural.fit_within(preview_box);
        let mut surface = Surface::new(size);
        let Some((report, photo)) = self.compositor.compose_layers(
            &mut surface,
            image,
            &edit.channel_values(),
            edit.effects(),
            edit.text(),
            size.width,
        )?
        else {
            return Ok(ComposeOutcome::NotReady);
        };

        let mut nodes = Vec::with_capacity(2 + report.overlays.len());
        nodes.push(ViewNode::Photo(Arc::new(photo)));
        nodes.extend(report.overlays.iter().copied().map(ViewNode::Overlay));
        if report.text_size_px.is_some() {
            nodes.push(ViewNode::Text(edit.text().clone()));
        }
        self.tree = Some(Arc::new(ViewTree { size, nodes }));
        self.surface = Some(surface);
        Ok(ComposeOutcome::Drawn(report))
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    pub fn tree(&self) -> Option<Arc<ViewTree>> {
        self.tree.clone()
    }

    /// Drop the displayed frame, e.g. when the source image is replaced.
    pub fn clear(&mut self) {
        self.surface = None;
        self.tree = None;
    }
}

/// Rasterize a retained view tree at `scale` times its displayed size over `background`.
pub(crate) fn rasterize_tree(
    compositor: &mut Compositor,
    tree: &ViewTree,
    scale: f64,
    background: Rgb8,
) -> RetouchResult<Surface> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RetouchError::validation(format!(
            "snapshot scale must be finite and > 0, got {scale}"
        )));
    }
    let size = tree.size.scaled(scale);
    let mut surface = Surface::filled(size, background);
    let ratio = f64::from(size.width) / f64::from(tree.reference_width());

    let mut overlays = EffectSet::new();
    for node in &tree.nodes {
        match node {
            ViewNode::Photo(bitmap) => compositor.draw_bitmap(&mut surface, bitmap)?,
            ViewNode::Overlay(effect) => {
                overlays.set(*effect, true);
            }
            ViewNode::Text(_) => {}
        }
    }
    compositor.draw_overlays(&mut surface, &overlays, ratio)?;
    for node in &tree.nodes {
        if let ViewNode::Text(text) = node {
            compositor.draw_text(&mut surface, text, ratio)?;
        }
    }
    Ok(surface)
}

/// Square filter preview tile: the image cover-cropped to `edge_px` with `filter` at full strength.
#[tracing::instrument(skip_all, fields(filter = filter.id, edge_px = edge_px))]
pub fn render_thumbnail(
    image: &ImageAsset,
    filter: &FilterDefinition,
    edge_px: u32,
) -> RetouchResult<Surface> {
    let pixels = image.pixels()?;
    let target = PixelSize::new(edge_px, edge_px)?;
    let (iw, ih) = (
        f64::from(pixels.size.width),
        f64::from(pixels.size.height),
    );
    let edge = f64::from(edge_px);
    let s = (edge / iw).max(edge / ih);
    let transform =
        Affine::translate(((edge - iw * s) / 2.0, (edge - ih * s) / 2.0)) * Affine::scale(s);

    let mut compositor = Compositor::new(Arc::new(FontBook::new()));
    compositor.photo_layer(
        pixels,
        target,
        transform,
        &compute_channel_values(filter, INTENSITY_NOMINAL),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/preview.rs"]
mod tests;
