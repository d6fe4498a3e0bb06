use std::sync::Arc;

use crate::foundation::core::{PixelSize, Rgb8};
use crate::foundation::error::{RetouchError, RetouchResult};

/// Composited raster: premultiplied RGBA8, row-major, no padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    size: PixelSize,
    data: Vec<u8>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            data: vec![0; size.byte_len()],
        }
    }

    /// Opaque surface filled with `color`.
    pub fn filled(size: PixelSize, color: Rgb8) -> Self {
        let mut data = Vec::with_capacity(size.byte_len());
        for _ in 0..(size.width as usize) * (size.height as usize) {
            data.extend_from_slice(&[color.r, color.g, color.b, 255]);
        }
        Self { size, data }
    }

    pub fn from_premul_bytes(size: PixelSize, data: Vec<u8>) -> RetouchResult<Self> {
        if data.len() != size.byte_len() {
            return Err(RetouchError::validation(format!(
                "surface data length {} does not match {size}",
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Premultiplied RGBA at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let i = ((y as usize) * (self.size.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// True when nothing was drawn: every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Un-premultiplied copy, as image encoders expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = px[3] as u16;
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = (((*c as u16) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }

    pub(crate) fn from_pixmap(pixmap: &vello_cpu::Pixmap) -> RetouchResult<Self> {
        let size = PixelSize::new(u32::from(pixmap.width()), u32::from(pixmap.height()))?;
        Self::from_premul_bytes(size, pixmap.data_as_u8_slice().to_vec())
    }
}

/// Vello CPU pixmap dimensions are u16; larger images cannot be drawn.
pub(crate) fn pixmap_dims(width: u32, height: u32) -> RetouchResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| RetouchError::validation("surface width exceeds 65535"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| RetouchError::validation("surface height exceeds 65535"))?;
    Ok((w, h))
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> RetouchResult<vello_cpu::Pixmap> {
    let (w, h) = pixmap_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(RetouchError::validation("pixmap byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

/// Wrap premultiplied bytes as an image paint.
pub(crate) fn image_paint(bytes: &[u8], width: u32, height: u32) -> RetouchResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
