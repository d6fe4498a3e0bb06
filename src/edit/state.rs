use std::fmt;
use std::str::FromStr;

use crate::effects::catalog::{EffectId, EffectSet};
use crate::filters::catalog::{FilterDefinition, NONE_FILTER_ID, find_filter, resolve_filter};
use crate::filters::channels::{
    ChannelValues, INTENSITY_MAX, INTENSITY_MIN, INTENSITY_NOMINAL, compute_channel_values,
};
use crate::foundation::core::Rgb8;
use crate::foundation::error::{RetouchError, RetouchResult};

/// Font choices offered for the text overlay. Font bytes are supplied separately.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum FontId {
    #[default]
    Inter,
    Lobster,
    BebasNeue,
    SpecialElite,
}

impl FontId {
    pub const ALL: [FontId; 4] = [
        FontId::Inter,
        FontId::Lobster,
        FontId::BebasNeue,
        FontId::SpecialElite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inter => "inter",
            Self::Lobster => "lobster",
            Self::BebasNeue => "bebasNeue",
            Self::SpecialElite => "specialElite",
        }
    }

    /// Family name the font files are expected to carry.
    pub fn family_name(self) -> &'static str {
        match self {
            Self::Inter => "Inter",
            Self::Lobster => "Lobster",
            Self::BebasNeue => "Bebas Neue",
            Self::SpecialElite => "Special Elite",
        }
    }
}

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontId {
    type Err = RetouchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RetouchError::validation(format!("unknown font '{s}'")))
    }
}

/// Default overlay text shown before the user types anything.
pub const DEFAULT_TEXT: &str = "Your Text";
/// Default text size in preview pixels.
pub const DEFAULT_TEXT_SIZE_PX: f32 = 50.0;

/// Text overlay parameters. `size_px` is measured at the preview reference width.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextSpec {
    pub content: String,
    pub color: Rgb8,
    pub font: FontId,
    pub size_px: f32,
}

impl Default for TextSpec {
    fn default() -> Self {
        Self {
            content: DEFAULT_TEXT.to_owned(),
            color: Rgb8::WHITE,
            font: FontId::Inter,
            size_px: DEFAULT_TEXT_SIZE_PX,
        }
    }
}

impl TextSpec {
    /// Text size when drawing at `ratio` = target width / reference width.
    pub fn scaled_size(&self, ratio: f64) -> f32 {
        (f64::from(self.size_px) * ratio) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Declarative edit state owned by the UI layer.
///
/// The pipeline only ever sees clones of this value, so later edits never leak into a render or
/// export that is already running.
///
/// Deserializing runs [`EditState::validate`], so JSON cannot smuggle in values the setters reject.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "UncheckedEditState")]
pub struct EditState {
    filter_id: String,
    intensity: f64,
    effects: EffectSet,
    text: TextSpec,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            filter_id: NONE_FILTER_ID.to_owned(),
            intensity: INTENSITY_NOMINAL,
            effects: EffectSet::new(),
            text: TextSpec::default(),
        }
    }
}

/// Serialized form of [`EditState`] before its invariants are checked.
#[derive(serde::Deserialize)]
#[serde(default)]
struct UncheckedEditState {
    filter_id: String,
    intensity: f64,
    effects: EffectSet,
    text: TextSpec,
}

impl Default for UncheckedEditState {
    fn default() -> Self {
        let EditState {
            filter_id,
            intensity,
            effects,
            text,
        } = EditState::default();
        Self {
            filter_id,
            intensity,
            effects,
            text,
        }
    }
}

impl TryFrom<UncheckedEditState> for EditState {
    type Error = RetouchError;

    fn try_from(raw: UncheckedEditState) -> RetouchResult<Self> {
        let state = Self {
            filter_id: raw.filter_id,
            intensity: raw.intensity,
            effects: raw.effects,
            text: raw.text,
        };
        state.validate()?;
        Ok(state)
    }
}

impl EditState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    pub fn filter(&self) -> &'static FilterDefinition {
        resolve_filter(&self.filter_id)
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn effects(&self) -> &EffectSet {
        &self.effects
    }

    pub fn text(&self) -> &TextSpec {
        &self.text
    }

    pub fn select_filter(&mut self, id: &str) -> RetouchResult<()> {
        if find_filter(id).is_none() {
            return Err(RetouchError::validation(format!("unknown filter '{id}'")));
        }
        self.filter_id = id.to_owned();
        Ok(())
    }

    pub fn set_intensity(&mut self, intensity: f64) -> RetouchResult<()> {
        if !intensity.is_finite() || !(INTENSITY_MIN..=INTENSITY_MAX).contains(&intensity) {
            return Err(RetouchError::validation(format!(
                "intensity must be within [{INTENSITY_MIN}, {INTENSITY_MAX}], got {intensity}"
            )));
        }
        self.intensity = intensity;
        Ok(())
    }

    pub fn toggle_effect(&mut self, id: EffectId) -> bool {
        self.effects.toggle(id)
    }

    pub fn set_effect(&mut self, id: EffectId, active: bool) {
        self.effects.set(id, active);
    }

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.text.content = content.into();
    }

    pub fn set_text_color(&mut self, color: Rgb8) {
        self.text.color = color;
    }

    pub fn set_text_color_hex(&mut self, hex: &str) -> RetouchResult<()> {
        self.text.color = Rgb8::parse_hex(hex)?;
        Ok(())
    }

    pub fn set_font(&mut self, font: FontId) {
        self.text.font = font;
    }

    pub fn set_text_size(&mut self, size_px: f32) -> RetouchResult<()> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(RetouchError::validation(format!(
                "text size must be finite and > 0, got {size_px}"
            )));
        }
        self.text.size_px = size_px;
        Ok(())
    }

    /// Channel values for the current filter and intensity.
    pub fn channel_values(&self) -> ChannelValues {
        compute_channel_values(self.filter(), self.intensity)
    }

    /// Re-check invariants, e.g. after deserializing an edit state from JSON.
    pub fn validate(&self) -> RetouchResult<()> {
        if find_filter(&self.filter_id).is_none() {
            return Err(RetouchError::validation(format!(
                "unknown filter '{}'",
                self.filter_id
            )));
        }
        if !self.intensity.is_finite()
            || !(INTENSITY_MIN..=INTENSITY_MAX).contains(&self.intensity)
        {
            return Err(RetouchError::validation("intensity out of range"));
        }
        if !self.text.size_px.is_finite() || self.text.size_px <= 0.0 {
            return Err(RetouchError::validation("text size must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/state.rs"]
mod tests;
