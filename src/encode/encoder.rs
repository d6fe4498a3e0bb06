use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use anyhow::Context;
use image::ImageEncoder;

use crate::effects::composite::flatten_onto;
use crate::foundation::core::Rgb8;
use crate::foundation::error::{RetouchError, RetouchResult};
use crate::render::surface::Surface;

/// Default JPEG quality on the unit scale.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.9;
const MIN_JPEG_QUALITY: f32 = 0.01;

/// Encoded export format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = RetouchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(RetouchError::validation(format!(
                "unknown export format '{other}' (expected jpeg or png)"
            ))),
        }
    }
}

/// Encoder settings for one export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeSettings {
    pub format: ExportFormat,
    /// JPEG quality in (0, 1]; ignored for PNG.
    pub quality: f32,
    /// Opaque colour transparent pixels are flattened onto for formats without alpha.
    pub background: Rgb8,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Jpeg,
            quality: DEFAULT_JPEG_QUALITY,
            background: Rgb8::new(17, 17, 17),
        }
    }
}

/// Encoded export ready for delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
}

impl fmt::Debug for ExportArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportArtifact")
            .field("bytes_len", &self.bytes.len())
            .field("mime", &self.mime)
            .field("filename", &self.filename)
            .finish()
    }
}

/// `{base}-edited.{ext}`; an empty base becomes `image`.
pub fn export_filename(base_name: &str, format: ExportFormat) -> String {
    let base = base_name.trim();
    let base = if base.is_empty() { "image" } else { base };
    format!("{base}-edited.{}", format.extension())
}

/// Serialize `surface` into `settings.format`.
#[tracing::instrument(skip(surface), fields(size = %surface.size()))]
pub fn encode(
    surface: &Surface,
    settings: &EncodeSettings,
    base_name: &str,
) -> RetouchResult<ExportArtifact> {
    let (w, h) = (surface.width(), surface.height());
    let mut buf = Vec::new();
    match settings.format {
        ExportFormat::Png => {
            let straight = surface.to_straight_rgba8();
            image::codecs::png::PngEncoder::new(Cursor::new(&mut buf))
                .write_image(&straight, w, h, image::ColorType::Rgba8.into())
                .context("encode png")
                .map_err(|e| RetouchError::encode(format!("{e:#}")))?;
        }
        ExportFormat::Jpeg => {
            let quality = jpeg_quality_percent(settings.quality)?;
            let mut flat = surface.data().to_vec();
            flatten_onto(
                &mut flat,
                [settings.background.r, settings.background.g, settings.background.b],
            );
            let rgb: Vec<u8> = flat
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality)
                .write_image(&rgb, w, h, image::ColorType::Rgb8.into())
                .context("encode jpeg")
                .map_err(|e| RetouchError::encode(format!("{e:#}")))?;
        }
    }
    tracing::debug!(format = %settings.format, bytes = buf.len(), "encoded export");
    Ok(ExportArtifact {
        bytes: buf,
        mime: settings.format.mime(),
        filename: export_filename(base_name, settings.format),
    })
}

/// [`encode`] on the blocking pool, keeping the async caller responsive.
pub async fn encode_async(
    surface: Surface,
    settings: EncodeSettings,
    base_name: String,
) -> RetouchResult<ExportArtifact> {
    tokio::task::spawn_blocking(move || encode(&surface, &settings, &base_name))
        .await
        .map_err(|e| RetouchError::encode(format!("encode worker failed: {e}")))?
}

fn jpeg_quality_percent(quality: f32) -> RetouchResult<u8> {
    if !quality.is_finite() || quality <= 0.0 {
        return Err(RetouchError::validation(format!(
            "jpeg quality must be in (0, 1], got {quality}"
        )));
    }
    let q = quality.clamp(MIN_JPEG_QUALITY, 1.0);
    Ok(((q * 100.0).round() as u8).max(1))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
