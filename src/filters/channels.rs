use std::fmt::Write as _;

use crate::filters::catalog::{Channel, FilterDefinition};

/// Lowest accepted intensity (filter fully neutralized).
pub const INTENSITY_MIN: f64 = 0.0;
/// Intensity at which every defined channel reaches its target.
pub const INTENSITY_NOMINAL: f64 = 100.0;
/// Highest accepted intensity; values past nominal extrapolate beyond the target.
pub const INTENSITY_MAX: f64 = 150.0;

/// Resolved per-channel values for one filter at one intensity.
///
/// Preview and export both consume this record (never a pre-formatted string), so the two paths
/// can only diverge if they disagree on the record itself.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelValues {
    /// Percent, 100 = unchanged.
    pub brightness: f64,
    /// Percent, 100 = unchanged.
    pub contrast: f64,
    /// Percent, 100 = unchanged.
    pub saturate: f64,
    /// Percent, 0 = unchanged.
    pub grayscale: f64,
    /// Percent, 0 = unchanged.
    pub sepia: f64,
    /// Degrees, 0 = unchanged.
    pub hue_rotate: f64,
    /// Pixels at preview resolution, 0 = unchanged.
    #[serde(default)]
    pub blur: f64,
}

impl ChannelValues {
    /// Every channel at its baseline.
    pub const BASELINE: Self = Self {
        brightness: 100.0,
        contrast: 100.0,
        saturate: 100.0,
        grayscale: 0.0,
        sepia: 0.0,
        hue_rotate: 0.0,
        blur: 0.0,
    };

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Brightness => self.brightness,
            Channel::Contrast => self.contrast,
            Channel::Saturate => self.saturate,
            Channel::Grayscale => self.grayscale,
            Channel::Sepia => self.sepia,
            Channel::HueRotate => self.hue_rotate,
            Channel::Blur => self.blur,
        }
    }

    fn set(&mut self, channel: Channel, value: f64) {
        let slot = match channel {
            Channel::Brightness => &mut self.brightness,
            Channel::Contrast => &mut self.contrast,
            Channel::Saturate => &mut self.saturate,
            Channel::Grayscale => &mut self.grayscale,
            Channel::Sepia => &mut self.sepia,
            Channel::HueRotate => &mut self.hue_rotate,
            Channel::Blur => &mut self.blur,
        };
        *slot = value;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::BASELINE
    }

    /// Copy with the resolution-dependent channels multiplied by `ratio`.
    ///
    /// Only blur is measured in pixels; the photometric channels are resolution independent.
    pub fn scaled_for(&self, ratio: f64) -> Self {
        Self {
            blur: self.blur * ratio,
            ..*self
        }
    }

    /// Format as a CSS `filter` value for web preview consumers.
    ///
    /// Channel order is fixed; blur is only emitted when non-zero.
    pub fn to_css_filter(&self) -> String {
        let mut out = String::new();
        for channel in Channel::ALL {
            let value = self.get(channel);
            if channel == Channel::Blur && value == 0.0 {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            let _ = write!(
                out,
                "{}({}{})",
                channel.css_name(),
                value,
                channel.unit().suffix()
            );
        }
        out
    }
}

impl Default for ChannelValues {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Resolve `filter` at `intensity` into concrete channel values.
///
/// `value = baseline + (target - baseline) * intensity / 100` for each channel the filter defines;
/// every other channel stays at its baseline. Intensity is not clamped, so values above 100
/// extrapolate past the target.
pub fn compute_channel_values(filter: &FilterDefinition, intensity: f64) -> ChannelValues {
    let mut out = ChannelValues::BASELINE;
    for channel in Channel::ALL {
        let Some(target) = filter.target(channel) else {
            continue;
        };
        let baseline = channel.baseline();
        out.set(channel, baseline + (target - baseline) * (intensity / 100.0));
    }
    out
}

/// CSS `filter` value for a filter, as used by preview consumers: `"none"` for the neutral filter.
pub fn css_filter_for(filter: &FilterDefinition, intensity: f64) -> String {
    if filter.is_none() {
        return "none".to_owned();
    }
    compute_channel_values(filter, intensity).to_css_filter()
}

#[cfg(test)]
#[path = "../../tests/unit/filters/channels.rs"]
mod tests;
