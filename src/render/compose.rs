use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect, Vec2};

use crate::assets::fonts::{FontBook, TextBrushRgba8, TextLayoutEngine};
use crate::assets::image::{DecodeStatus, DecodedPixels, ImageAsset};
use crate::edit::state::{FontId, TextSpec};
use crate::effects::blur::{blur_rgba8_premul, radius_for_sigma};
use crate::effects::catalog::{EffectId, EffectSet};
use crate::effects::composite::{over_in_place, over_region_in_place};
use crate::effects::overlay::OverlayRenderer;
use crate::filters::channels::ChannelValues;
use crate::filters::color::apply_channels_rgba8_premul;
use crate::foundation::core::PixelSize;
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::render::surface::{Surface, image_paint, pixmap_dims};

/// Drop shadow offset in reference pixels.
const TEXT_SHADOW_OFFSET: f64 = 2.0;
/// Drop shadow blur radius in reference pixels; sigma is half of it.
const TEXT_SHADOW_BLUR: f64 = 8.0;
const TEXT_SHADOW_OPACITY: f32 = 0.7;
/// Glyph ink may extend past the layout box by this fraction of the font size.
const TEXT_INK_OVERHANG: f64 = 0.25;

/// Result of a compose call.
#[derive(Clone, Debug, PartialEq)]
pub enum ComposeOutcome {
    /// The source is still decoding; the surface was left untouched.
    NotReady,
    Drawn(ComposeReport),
}

impl ComposeOutcome {
    pub fn report(&self) -> Option<&ComposeReport> {
        match self {
            Self::NotReady => None,
            Self::Drawn(r) => Some(r),
        }
    }
}

/// What a successful compose actually drew.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeReport {
    pub size: PixelSize,
    /// Channel values applied to the photo layer, after resolution scaling.
    pub channels: ChannelValues,
    /// Overlays in the order they were drawn.
    pub overlays: Vec<EffectId>,
    /// Text size at output resolution; `None` when no text was drawn.
    pub text_size_px: Option<f32>,
    pub font: Option<FontId>,
    /// True when text was requested but no font was available.
    pub text_skipped: bool,
}

pub(crate) struct TextDrawn {
    pub(crate) size_px: Option<f32>,
    pub(crate) font: Option<FontId>,
    pub(crate) skipped: bool,
}

/// CPU compositor for the photo, overlay and text layers.
///
/// Holds reusable raster state (render context, overlay tiles, text shaping caches); one instance
/// per thread.
pub struct Compositor {
    fonts: Arc<FontBook>,
    ctx: Option<vello_cpu::RenderContext>,
    overlays: OverlayRenderer,
    text_engine: TextLayoutEngine,
}

impl Compositor {
    pub fn new(fonts: Arc<FontBook>) -> Self {
        Self {
            fonts,
            ctx: None,
            overlays: OverlayRenderer::new(),
            text_engine: TextLayoutEngine::new(),
        }
    }

    pub fn fonts(&self) -> &Arc<FontBook> {
        &self.fonts
    }

    /// Compose `image` with its edits onto `surface` in the fixed layer order.
    ///
    /// The photo is scaled to the surface and colour-transformed; overlays and text are drawn on
    /// top without the transform. Lengths given at preview scale (text size, shadow, blur) are
    /// multiplied by `surface.width / reference_width`.
    #[tracing::instrument(skip_all, fields(size = %surface.size(), reference_width = reference_width))]
    pub fn compose(
        &mut self,
        surface: &mut Surface,
        image: &ImageAsset,
        channels: &ChannelValues,
        effects: &EffectSet,
        text: &TextSpec,
        reference_width: u32,
    ) -> RetouchResult<ComposeOutcome> {
        Ok(self
            .compose_layers(surface, image, channels, effects, text, reference_width)?
            .map(|(report, _photo)| report)
            .map_or(ComposeOutcome::NotReady, ComposeOutcome::Drawn))
    }

    /// Same as [`Compositor::compose`], also returning the filtered photo layer on its own.
    pub(crate) fn compose_layers(
        &mut self,
        surface: &mut Surface,
        image: &ImageAsset,
        channels: &ChannelValues,
        effects: &EffectSet,
        text: &TextSpec,
        reference_width: u32,
    ) -> RetouchResult<Option<(ComposeReport, Surface)>> {
        let pixels = match image.status() {
            DecodeStatus::Pending => {
                tracing::debug!("compose skipped: image still decoding");
                return Ok(None);
            }
            DecodeStatus::Failed(reason) => return Err(RetouchError::decode(reason.clone())),
            DecodeStatus::Decoded(p) => p,
        };
        let ratio = scale_ratio(surface.width(), reference_width)?;
        let size = surface.size();

        let applied = channels.scaled_for(ratio);
        let sx = f64::from(size.width) / f64::from(pixels.size.width);
        let sy = f64::from(size.height) / f64::from(pixels.size.height);
        let photo = self.photo_layer(
            pixels,
            size,
            Affine::scale_non_uniform(sx, sy),
            &applied,
        )?;
        over_in_place(surface.data_mut(), photo.data(), 1.0)?;

        let overlays = self.draw_overlays(surface, effects, ratio)?;
        let drawn = self.draw_text(surface, text, ratio)?;

        Ok(Some((
            ComposeReport {
                size,
                channels: applied,
                overlays,
                text_size_px: drawn.size_px,
                font: drawn.font,
                text_skipped: drawn.skipped,
            },
            photo,
        )))
    }

    /// Draw the decoded photo through `transform` into a fresh `target`-sized layer and apply the
    /// channel transform to that layer only.
    pub(crate) fn photo_layer(
        &mut self,
        pixels: &DecodedPixels,
        target: PixelSize,
        transform: Affine,
        channels: &ChannelValues,
    ) -> RetouchResult<Surface> {
        let mut layer = if target == pixels.size && transform == Affine::IDENTITY {
            Surface::from_premul_bytes(target, pixels.rgba8_premul.as_ref().clone())?
        } else {
            let paint = image_paint(
                &pixels.rgba8_premul,
                pixels.size.width,
                pixels.size.height,
            )?;
            let (iw, ih) = (
                f64::from(pixels.size.width),
                f64::from(pixels.size.height),
            );
            self.rasterize(target, |ctx| {
                ctx.set_transform(transform);
                ctx.set_paint(paint);
                ctx.fill_rect(&Rect::new(0.0, 0.0, iw, ih));
                Ok(())
            })?
        };
        apply_channels_rgba8_premul(layer.data_mut(), target.width, target.height, channels)?;
        Ok(layer)
    }

    /// Draw an already-filtered bitmap scaled to cover `surface`, compositing over its contents.
    pub(crate) fn draw_bitmap(&mut self, surface: &mut Surface, bitmap: &Surface) -> RetouchResult<()> {
        let size = surface.size();
        let layer = if bitmap.size() == size {
            bitmap.clone()
        } else {
            let paint = image_paint(bitmap.data(), bitmap.width(), bitmap.height())?;
            let sx = f64::from(size.width) / f64::from(bitmap.width());
            let sy = f64::from(size.height) / f64::from(bitmap.height());
            let (bw, bh) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
            self.rasterize(size, |ctx| {
                ctx.set_transform(Affine::scale_non_uniform(sx, sy));
                ctx.set_paint(paint);
                ctx.fill_rect(&Rect::new(0.0, 0.0, bw, bh));
                Ok(())
            })?
        };
        over_in_place(surface.data_mut(), layer.data(), 1.0)
    }

    /// Draw `effects` in canonical order.
    pub(crate) fn draw_overlays(
        &mut self,
        surface: &mut Surface,
        effects: &EffectSet,
        ratio: f64,
    ) -> RetouchResult<Vec<EffectId>> {
        let (w, h) = (surface.width(), surface.height());
        let mut drawn = Vec::with_capacity(effects.len());
        for effect in effects.iter() {
            self.overlays.draw(effect, surface.data_mut(), w, h, ratio)?;
            drawn.push(effect);
        }
        Ok(drawn)
    }

    /// Draw centred text with its drop shadow.
    pub(crate) fn draw_text(
        &mut self,
        surface: &mut Surface,
        text: &TextSpec,
        ratio: f64,
    ) -> RetouchResult<TextDrawn> {
        if text.is_empty() {
            return Ok(TextDrawn {
                size_px: None,
                font: None,
                skipped: false,
            });
        }
        let Some(font) = self.fonts.resolve(text.font) else {
            tracing::warn!(font = %text.font, "no fonts registered, skipping text layer");
            return Ok(TextDrawn {
                size_px: None,
                font: None,
                skipped: true,
            });
        };

        let size_px = text.scaled_size(ratio);
        let brush = TextBrushRgba8 {
            r: text.color.r,
            g: text.color.g,
            b: text.color.b,
            a: 255,
        };
        let layout = self
            .text_engine
            .layout_plain(&text.content, &font, size_px, brush)?;
        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            0,
        );

        let size = surface.size();
        let (text_w, text_h) = (f64::from(layout.width()), f64::from(layout.height()));
        let origin_x = (f64::from(size.width) - text_w) / 2.0;
        let origin_y = (f64::from(size.height) - text_h) / 2.0;
        let offset = TEXT_SHADOW_OFFSET * ratio;
        let sigma = (TEXT_SHADOW_BLUR * ratio / 2.0) as f32;
        let blur_radius = radius_for_sigma(sigma);

        // Only the text box, its shadow and the blur reach are rasterized.
        let ink_pad = f64::from(size_px) * TEXT_INK_OVERHANG;
        let text_box = Rect::new(origin_x, origin_y, origin_x + text_w, origin_y + text_h);
        let shadow_reach = ink_pad + f64::from(blur_radius);
        let shadow_box = text_box + Vec2::new(offset, offset);
        let bounds = text_box
            .inflate(ink_pad, ink_pad)
            .union(shadow_box.inflate(shadow_reach, shadow_reach));
        let Some((x0, y0, region)) = pixel_region(bounds, size) else {
            tracing::debug!("text lies outside the surface");
            return Ok(TextDrawn {
                size_px: Some(size_px),
                font: Some(font.used),
                skipped: false,
            });
        };
        let (left, top) = (origin_x - f64::from(x0), origin_y - f64::from(y0));

        let mut shadow = self.rasterize(region, |ctx| {
            fill_layout(
                ctx,
                &layout,
                &font_data,
                Affine::translate((left + offset, top + offset)),
                Some(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255)),
            );
            Ok(())
        })?;
        let blurred = blur_rgba8_premul(
            shadow.data(),
            region.width,
            region.height,
            blur_radius,
            sigma,
        )?;
        shadow.data_mut().copy_from_slice(&blurred);
        over_region_in_place(
            surface.data_mut(),
            size.width,
            size.height,
            shadow.data(),
            region.width,
            region.height,
            x0,
            y0,
            TEXT_SHADOW_OPACITY,
        )?;

        let glyphs = self.rasterize(region, |ctx| {
            fill_layout(
                ctx,
                &layout,
                &font_data,
                Affine::translate((left, top)),
                None,
            );
            Ok(())
        })?;
        over_region_in_place(
            surface.data_mut(),
            size.width,
            size.height,
            glyphs.data(),
            region.width,
            region.height,
            x0,
            y0,
            1.0,
        )?;

        Ok(TextDrawn {
            size_px: Some(size_px),
            font: Some(font.used),
            skipped: false,
        })
    }

    /// Run `f` against a reset render context and read the result back as a fresh surface.
    fn rasterize(
        &mut self,
        size: PixelSize,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> RetouchResult<()>,
    ) -> RetouchResult<Surface> {
        let (w, h) = pixmap_dims(size.width, size.height)?;
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(w, h),
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            Some(_) => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        f(&mut ctx)?;
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        Surface::from_pixmap(&pixmap)
    }
}

fn fill_layout(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    transform: Affine,
    paint_override: Option<vello_cpu::peniko::Color>,
) {
    ctx.set_transform(transform);
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let paint = paint_override.unwrap_or_else(|| {
                let brush = run.style().brush;
                vello_cpu::peniko::Color::from_rgba8(brush.r, brush.g, brush.b, brush.a)
            });
            ctx.set_paint(paint);
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

/// Pixel-aligned part of `rect` that lies on a `size` surface: its top-left corner and size.
fn pixel_region(rect: Rect, size: PixelSize) -> Option<(u32, u32, PixelSize)> {
    let surface = Rect::new(0.0, 0.0, f64::from(size.width), f64::from(size.height));
    let clipped = rect.expand().intersect(surface);
    if !(clipped.width() >= 1.0 && clipped.height() >= 1.0) {
        return None;
    }
    let region = PixelSize::new(clipped.width() as u32, clipped.height() as u32).ok()?;
    Some((clipped.x0 as u32, clipped.y0 as u32, region))
}

/// Ratio between output width and the width preview-scale lengths were chosen at.
pub(crate) fn scale_ratio(width: u32, reference_width: u32) -> RetouchResult<f64> {
    if reference_width == 0 {
        return Err(RetouchError::validation("reference width must be > 0"));
    }
    Ok(f64::from(width) / f64::from(reference_width))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compose.rs"]
mod tests;
