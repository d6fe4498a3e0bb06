use std::time::Duration;

use crate::encode::encoder::{DEFAULT_JPEG_QUALITY, EncodeSettings, ExportFormat};
use crate::foundation::core::{PixelSize, Rgb8};
use crate::foundation::error::{RetouchError, RetouchResult};

/// Session and export options.
///
/// Every field has a default, so a JSON document only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetouchOpts {
    pub export_format: ExportFormat,
    /// JPEG quality in (0, 1].
    pub jpeg_quality: f32,
    /// Colour JPEG exports are flattened onto.
    pub jpeg_background: Rgb8,
    /// Snapshot capture scale on touch-class devices.
    pub snapshot_scale_touch: f64,
    /// Snapshot capture scale everywhere else.
    pub snapshot_scale_desktop: f64,
    pub snapshot_background: Rgb8,
    /// Box the live preview is fitted into.
    pub preview_box: PixelSize,
    /// Overrides the preview width as the reference for preview-scale lengths.
    pub reference_width: Option<u32>,
    pub stage_timeout_ms: u64,
    /// Bound for the delivery stage, which may wait on a share sheet.
    pub delivery_timeout_ms: u64,
    /// Lifetime of blob URLs handed to the manual-save path.
    pub blob_url_ttl_ms: u64,
}

impl Default for RetouchOpts {
    fn default() -> Self {
        Self {
            export_format: ExportFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            jpeg_background: Rgb8::new(17, 17, 17),
            snapshot_scale_touch: 1.0,
            snapshot_scale_desktop: 2.0,
            snapshot_background: Rgb8::new(17, 17, 17),
            preview_box: PixelSize {
                width: 960,
                height: 720,
            },
            reference_width: None,
            stage_timeout_ms: 30_000,
            delivery_timeout_ms: 300_000,
            blob_url_ttl_ms: 60_000,
        }
    }
}

impl RetouchOpts {
    /// Parse options from JSON and validate them.
    pub fn from_json(json: &str) -> RetouchResult<Self> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| RetouchError::validation(format!("invalid options json: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> RetouchResult<()> {
        if !self.jpeg_quality.is_finite() || self.jpeg_quality <= 0.0 || self.jpeg_quality > 1.0 {
            return Err(RetouchError::validation(format!(
                "jpeg_quality must be in (0, 1], got {}",
                self.jpeg_quality
            )));
        }
        for (name, scale) in [
            ("snapshot_scale_touch", self.snapshot_scale_touch),
            ("snapshot_scale_desktop", self.snapshot_scale_desktop),
        ] {
            if !scale.is_finite() || scale <= 0.0 || scale > 8.0 {
                return Err(RetouchError::validation(format!(
                    "{name} must be in (0, 8], got {scale}"
                )));
            }
        }
        if self.preview_box.width == 0 || self.preview_box.height == 0 {
            return Err(RetouchError::validation("preview_box must be non-zero"));
        }
        if self.reference_width == Some(0) {
            return Err(RetouchError::validation("reference_width must be > 0"));
        }
        if self.stage_timeout_ms == 0 || self.delivery_timeout_ms == 0 {
            return Err(RetouchError::validation("timeouts must be > 0"));
        }
        Ok(())
    }

    pub fn snapshot_scale(&self, is_touch_device: bool) -> f64 {
        if is_touch_device {
            self.snapshot_scale_touch
        } else {
            self.snapshot_scale_desktop
        }
    }

    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            format: self.export_format,
            quality: self.jpeg_quality,
            background: self.jpeg_background,
        }
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn blob_url_ttl(&self) -> Duration {
        Duration::from_millis(self.blob_url_ttl_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
