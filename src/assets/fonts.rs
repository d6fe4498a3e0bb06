use std::collections::HashMap;
use std::sync::Arc;

use crate::edit::state::FontId;
use crate::foundation::error::{RetouchError, RetouchResult};

/// Font bytes registered by the host, keyed by catalog id.
///
/// Loading fonts is the host's job; the book only maps ids to bytes and applies the fallback rule.
#[derive(Clone, Debug, Default)]
pub struct FontBook {
    fonts: Vec<(FontId, Arc<Vec<u8>>)>,
}

/// Font bytes chosen for a requested id.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    pub requested: FontId,
    pub used: FontId,
    pub bytes: Arc<Vec<u8>>,
}

impl ResolvedFont {
    pub fn is_fallback(&self) -> bool {
        self.requested != self.used
    }
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the bytes for `id`.
    pub fn register(&mut self, id: FontId, bytes: Vec<u8>) -> RetouchResult<()> {
        if bytes.is_empty() {
            return Err(RetouchError::validation(format!("font '{id}' has no bytes")));
        }
        let bytes = Arc::new(bytes);
        match self.fonts.iter_mut().find(|(f, _)| *f == id) {
            Some(slot) => slot.1 = bytes,
            None => self.fonts.push((id, bytes)),
        }
        Ok(())
    }

    pub fn with_font(mut self, id: FontId, bytes: Vec<u8>) -> RetouchResult<Self> {
        self.register(id, bytes)?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    pub fn contains(&self, id: FontId) -> bool {
        self.fonts.iter().any(|(f, _)| *f == id)
    }

    /// Bytes for `id`, falling back to the first registered font. `None` when the book is empty.
    pub fn resolve(&self, id: FontId) -> Option<ResolvedFont> {
        let (used, bytes) = self
            .fonts
            .iter()
            .find(|(f, _)| *f == id)
            .or_else(|| self.fonts.first())?;
        if *used != id {
            tracing::warn!(requested = %id, fallback = %used, "font not registered, using fallback");
        }
        Some(ResolvedFont {
            requested: id,
            used: *used,
            bytes: bytes.clone(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Parley-backed text layout helper with family registration cached per font.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<FontId, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &ResolvedFont) -> RetouchResult<String> {
        if let Some(name) = self.families.get(&font.used) {
            return Ok(name.clone());
        }
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            RetouchError::validation(format!("no font families found in '{}' bytes", font.used))
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RetouchError::validation("registered font family has no name"))?
            .to_string();
        tracing::debug!(font = %font.used, family = %family_name, "registered font family");
        self.families.insert(font.used, family_name.clone());
        Ok(family_name)
    }

    /// Shape and lay out a single paragraph of plain text.
    pub fn layout_plain(
        &mut self,
        text: &str,
        font: &ResolvedFont,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> RetouchResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(RetouchError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
