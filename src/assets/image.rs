use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::PixelSize;
use crate::foundation::error::{RetouchError, RetouchResult};

/// Decoded source pixels, premultiplied RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPixels {
    pub size: PixelSize,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode lifecycle of a source image.
#[derive(Clone, Debug)]
pub enum DecodeStatus {
    /// Bytes were accepted but decoding has not completed.
    Pending,
    Decoded(DecodedPixels),
    /// Decoding failed; the asset is unusable until a new file is provided.
    Failed(String),
}

/// A user-supplied source image. Immutable once decoded.
#[derive(Clone, Debug)]
pub struct ImageAsset {
    name: String,
    status: DecodeStatus,
    pixel_read_allowed: bool,
}

impl ImageAsset {
    /// An asset whose decode has not finished yet.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: DecodeStatus::Pending,
            pixel_read_allowed: true,
        }
    }

    /// Decode encoded bytes. Failures are recorded in the status rather than returned.
    #[tracing::instrument(skip_all, fields(len = bytes.len()))]
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> Self {
        let name = name.into();
        let status = match decode_image(bytes) {
            Ok(pixels) => {
                tracing::debug!(size = %pixels.size, "decoded source image");
                DecodeStatus::Decoded(pixels)
            }
            Err(e) => {
                tracing::warn!(error = %e, "source image failed to decode");
                DecodeStatus::Failed(e.to_string())
            }
        };
        Self {
            name,
            status,
            pixel_read_allowed: true,
        }
    }

    /// Wrap already decoded pixels.
    pub fn from_pixels(name: impl Into<String>, pixels: DecodedPixels) -> Self {
        Self {
            name: name.into(),
            status: DecodeStatus::Decoded(pixels),
            pixel_read_allowed: true,
        }
    }

    /// Mark whether pixel read-back of this image is permitted by its origin.
    pub fn with_pixel_read(mut self, allowed: bool) -> Self {
        self.pixel_read_allowed = allowed;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without its final extension; used to name exports.
    pub fn base_name(&self) -> &str {
        let file = self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name);
        match file.rfind('.') {
            Some(0) | None => file,
            Some(i) => &file[..i],
        }
    }

    pub fn status(&self) -> &DecodeStatus {
        &self.status
    }

    pub fn pixel_read_allowed(&self) -> bool {
        self.pixel_read_allowed
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.status, DecodeStatus::Decoded(_))
    }

    pub fn size(&self) -> Option<PixelSize> {
        match &self.status {
            DecodeStatus::Decoded(p) => Some(p.size),
            _ => None,
        }
    }

    /// Decoded pixels, or the error a render attempt should surface.
    pub fn pixels(&self) -> RetouchResult<&DecodedPixels> {
        match &self.status {
            DecodeStatus::Decoded(p) => Ok(p),
            DecodeStatus::Pending => Err(RetouchError::NotReady),
            DecodeStatus::Failed(reason) => Err(RetouchError::decode(reason.clone())),
        }
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> RetouchResult<DecodedPixels> {
    if bytes.is_empty() {
        return Err(RetouchError::decode("image data is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| RetouchError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let size = PixelSize::new(width, height)
        .map_err(|_| RetouchError::decode("image has zero width or height"))?;

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedPixels {
        size,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/image.rs"]
mod tests;
