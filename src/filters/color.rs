use rayon::prelude::*;

use crate::effects::blur::blur_rgba8_premul;
use crate::filters::channels::ChannelValues;
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::foundation::math::unit_to_u8;

/// 3x3 colour matrix plus per-row offset, applied to straight-alpha RGB in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ColorStage {
    pub(crate) m: [[f32; 3]; 3],
    pub(crate) offset: [f32; 3],
}

impl ColorStage {
    const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        offset: [0.0; 3],
    };

    fn brightness(amount: f32) -> Self {
        let a = amount.max(0.0);
        Self {
            m: [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]],
            offset: [0.0; 3],
        }
    }

    fn contrast(amount: f32) -> Self {
        let a = amount.max(0.0);
        let o = 0.5 - 0.5 * a;
        Self {
            m: [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]],
            offset: [o; 3],
        }
    }

    fn saturate(amount: f32) -> Self {
        let s = amount.max(0.0);
        Self {
            m: [
                [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
                [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
            ],
            offset: [0.0; 3],
        }
    }

    fn grayscale(amount: f32) -> Self {
        let a = 1.0 - amount.clamp(0.0, 1.0);
        Self {
            m: [
                [0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a],
                [0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a],
                [0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a],
            ],
            offset: [0.0; 3],
        }
    }

    fn sepia(amount: f32) -> Self {
        let a = 1.0 - amount.clamp(0.0, 1.0);
        Self {
            m: [
                [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
                [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
                [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
            ],
            offset: [0.0; 3],
        }
    }

    fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [
                [
                    0.213 + cos * 0.787 - sin * 0.213,
                    0.715 - cos * 0.715 - sin * 0.715,
                    0.072 - cos * 0.072 + sin * 0.928,
                ],
                [
                    0.213 - cos * 0.213 + sin * 0.143,
                    0.715 + cos * 0.285 + sin * 0.140,
                    0.072 - cos * 0.072 - sin * 0.283,
                ],
                [
                    0.213 - cos * 0.213 - sin * 0.787,
                    0.715 - cos * 0.715 + sin * 0.715,
                    0.072 + cos * 0.928 + sin * 0.072,
                ],
            ],
            offset: [0.0; 3],
        }
    }

    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0f32; 3];
        for (row, o) in out.iter_mut().enumerate() {
            let m = self.m[row];
            *o = (m[0] * rgb[0] + m[1] * rgb[1] + m[2] * rgb[2] + self.offset[row]).clamp(0.0, 1.0);
        }
        out
    }
}

/// Build the stage list for a channel record, in record order, skipping channels at baseline.
pub(crate) fn color_stages(values: &ChannelValues) -> Vec<ColorStage> {
    let base = ChannelValues::BASELINE;
    let mut stages = Vec::with_capacity(6);
    if values.brightness != base.brightness {
        stages.push(ColorStage::brightness((values.brightness / 100.0) as f32));
    }
    if values.contrast != base.contrast {
        stages.push(ColorStage::contrast((values.contrast / 100.0) as f32));
    }
    if values.saturate != base.saturate {
        stages.push(ColorStage::saturate((values.saturate / 100.0) as f32));
    }
    if values.grayscale != base.grayscale {
        stages.push(ColorStage::grayscale((values.grayscale / 100.0) as f32));
    }
    if values.sepia != base.sepia {
        stages.push(ColorStage::sepia((values.sepia / 100.0) as f32));
    }
    if values.hue_rotate != base.hue_rotate {
        stages.push(ColorStage::hue_rotate(values.hue_rotate as f32));
    }
    stages.retain(|s| *s != ColorStage::IDENTITY);
    stages
}

/// Apply `values` as a whole-image colour transform to premultiplied RGBA8 pixels in place.
///
/// Colour stages run on straight alpha with a clamp between stages; alpha is preserved. A non-zero
/// blur is applied last as a Gaussian with sigma equal to the blur length in pixels.
pub(crate) fn apply_channels_rgba8_premul(
    data: &mut [u8],
    width: u32,
    height: u32,
    values: &ChannelValues,
) -> RetouchResult<()> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| RetouchError::validation("colour transform buffer size overflow"))?;
    if data.len() != expected_len {
        return Err(RetouchError::validation(
            "colour transform expects data matching width*height*4",
        ));
    }

    let stages = color_stages(values);
    if !stages.is_empty() {
        let row_len = (width as usize) * 4;
        data.par_chunks_mut(row_len.max(4))
            .for_each(|row| apply_stages_to_row(row, &stages));
    }

    if values.blur > 0.0 && values.blur.is_finite() {
        let sigma = values.blur as f32;
        let radius = (sigma * 3.0).ceil() as u32;
        let blurred = blur_rgba8_premul(data, width, height, radius, sigma)?;
        data.copy_from_slice(&blurred);
    }
    Ok(())
}

fn apply_stages_to_row(row: &mut [u8], stages: &[ColorStage]) {
    for px in row.chunks_exact_mut(4) {
        let pa = px[3] as f32 / 255.0;
        if pa <= 0.0 {
            continue;
        }
        // Premul -> straight for matrix application.
        let inv_a = 1.0 / pa;
        let mut rgb = [
            (px[0] as f32 / 255.0 * inv_a).min(1.0),
            (px[1] as f32 / 255.0 * inv_a).min(1.0),
            (px[2] as f32 / 255.0 * inv_a).min(1.0),
        ];
        for stage in stages {
            rgb = stage.apply(rgb);
        }
        px[0] = unit_to_u8(rgb[0] * pa);
        px[1] = unit_to_u8(rgb[1] * pa);
        px[2] = unit_to_u8(rgb[2] * pa);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/color.rs"]
mod tests;
