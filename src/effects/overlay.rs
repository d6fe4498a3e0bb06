use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use crate::effects::catalog::EffectId;
use crate::effects::composite::{over, tile_over_in_place};
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::foundation::math::normal_cdf;

/// Inset shadow blur radius as a fraction of the surface width.
const VIGNETTE_BLUR: f64 = 0.10;
/// Inset shadow spread as a fraction of the surface width.
const VIGNETTE_SPREAD: f64 = 0.02;

/// 6x6 diagonal scratch tile, white at 10% opacity.
const DUST_TILE_SVG: &str = r##"<svg width="6" height="6" viewBox="0 0 6 6" xmlns="http://www.w3.org/2000/svg"><g fill="#ffffff" fill-opacity="0.1" fill-rule="evenodd"><path d="M5 0h1L0 6V5zM6 5v1H5z"/></g></svg>"##;
const DUST_TILE_PX: f64 = 6.0;

/// 300x300 stitched fractal-noise tile at 15% opacity.
const GRAIN_TILE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="300" height="300" viewBox="0 0 300 300"><filter id="n"><feTurbulence type="fractalNoise" baseFrequency="0.75" numOctaves="3" stitchTiles="stitch"/></filter><rect width="100%" height="100%" filter="url(#n)" opacity="0.15"/></svg>"##;
const GRAIN_TILE_PX: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TileKey {
    effect: EffectId,
    size: u32,
}

struct Tile {
    width: u32,
    height: u32,
    rgba8_premul: Vec<u8>,
}

/// Draws overlay effects, caching rasterized pattern tiles per output scale.
#[derive(Default)]
pub(crate) struct OverlayRenderer {
    tiles: HashMap<TileKey, Arc<Tile>>,
}

impl OverlayRenderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Composite `effect` over a premultiplied `width`x`height` buffer.
    ///
    /// `ratio` is the output width divided by the preview reference width; tiled patterns are
    /// rasterized at that scale so they cover the same fraction of the frame at any resolution.
    pub(crate) fn draw(
        &mut self,
        effect: EffectId,
        dst: &mut [u8],
        width: u32,
        height: u32,
        ratio: f64,
    ) -> RetouchResult<()> {
        match effect {
            EffectId::Vignette => draw_vignette(dst, width, height),
            EffectId::Dust | EffectId::Grain => {
                let tile = self.tile_for(effect, ratio)?;
                tile_over_in_place(
                    dst,
                    width,
                    height,
                    &tile.rgba8_premul,
                    tile.width,
                    tile.height,
                )
            }
        }
    }

    fn tile_for(&mut self, effect: EffectId, ratio: f64) -> RetouchResult<Arc<Tile>> {
        let (svg, base_px) = match effect {
            EffectId::Dust => (DUST_TILE_SVG, DUST_TILE_PX),
            EffectId::Grain => (GRAIN_TILE_SVG, GRAIN_TILE_PX),
            EffectId::Vignette => {
                return Err(RetouchError::validation("vignette is not a tiled overlay"));
            }
        };
        let size = tile_size_px(base_px, ratio)?;
        let key = TileKey { effect, size };
        if let Some(tile) = self.tiles.get(&key) {
            return Ok(tile.clone());
        }

        let rgba8_premul = rasterize_tile(svg, size)?;
        let tile = Arc::new(Tile {
            width: size,
            height: size,
            rgba8_premul,
        });
        tracing::debug!(effect = %effect, size, "rasterized overlay tile");
        self.tiles.insert(key, tile.clone());
        Ok(tile)
    }
}

fn tile_size_px(base_px: f64, ratio: f64) -> RetouchResult<u32> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(RetouchError::validation(format!(
            "overlay scale ratio must be finite and > 0, got {ratio}"
        )));
    }
    const MAX_TILE: f64 = 8_192.0;
    Ok((base_px * ratio).round().clamp(1.0, MAX_TILE) as u32)
}

fn rasterize_tile(svg: &str, size: u32) -> RetouchResult<Vec<u8>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &opts).context("parse overlay tile svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(size, size)
        .ok_or_else(|| RetouchError::validation("failed to allocate overlay tile pixmap"))?;
    let sx = (size as f32) / tree.size().width();
    let sy = (size as f32) / tree.size().height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap.data().to_vec())
}

/// Vignette opacity at pixel centre `(x, y)`.
///
/// Modelled as a black inset box shadow: the frame inset by the spread is the unshadowed hole,
/// and the hole's edges are blurred with sigma = blur / 2. Both lengths are relative to the
/// surface width, so the look is the same at any resolution.
pub(crate) fn vignette_alpha(x: u32, y: u32, width: u32, height: u32) -> f32 {
    let w = f64::from(width);
    let h = f64::from(height);
    let spread = VIGNETTE_SPREAD * w;
    let sigma = (VIGNETTE_BLUR * w / 2.0).max(1e-3);
    let coverage = |p: f64, len: f64| {
        normal_cdf((p - spread) / sigma) - normal_cdf((p - (len - spread)) / sigma)
    };
    let hole = coverage(f64::from(x) + 0.5, w) * coverage(f64::from(y) + 0.5, h);
    (1.0 - hole).clamp(0.0, 1.0) as f32
}

fn draw_vignette(dst: &mut [u8], width: u32, height: u32) -> RetouchResult<()> {
    if dst.len() != (width as usize) * (height as usize) * 4 {
        return Err(RetouchError::validation(
            "vignette expects dst matching width*height*4",
        ));
    }
    for y in 0..height {
        for x in 0..width {
            let a = vignette_alpha(x, y, width, height);
            if a < 1.0 / 512.0 {
                continue;
            }
            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let d = [dst[idx], dst[idx + 1], dst[idx + 2], dst[idx + 3]];
            dst[idx..idx + 4].copy_from_slice(&over(d, [0, 0, 0, 255], a));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/overlay.rs"]
mod tests;
