use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{RetouchError, RetouchResult};

/// A non-photometric overlay layer. Membership only: effects carry no parameters.
///
/// The declaration order is the canonical draw order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EffectId {
    Vignette,
    Dust,
    Grain,
}

impl EffectId {
    pub const ALL: [EffectId; 3] = [EffectId::Vignette, EffectId::Dust, EffectId::Grain];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vignette => "vignette",
            Self::Dust => "dust",
            Self::Grain => "grain",
        }
    }

    /// Display name used by the effect picker.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vignette => "Vignette",
            Self::Dust => "Dust & Scratches",
            Self::Grain => "Film Grain",
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EffectId {
    type Err = RetouchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| RetouchError::validation(format!("unknown effect '{s}'")))
    }
}

/// Set of active overlay effects.
///
/// Backed by an ordered set, so iteration order is the canonical draw order no matter in which
/// order effects were toggled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EffectSet(BTreeSet<EffectId>);

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`; returns whether it is active afterwards.
    pub fn toggle(&mut self, id: EffectId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn set(&mut self, id: EffectId, active: bool) {
        if active {
            self.0.insert(id);
        } else {
            self.0.remove(&id);
        }
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Active effects in canonical draw order.
    pub fn iter(&self) -> impl Iterator<Item = EffectId> + '_ {
        self.0.iter().copied()
    }

    /// Parse a list of effect ids, e.g. from the command line.
    pub fn parse_list<'a>(ids: impl IntoIterator<Item = &'a str>) -> RetouchResult<Self> {
        ids.into_iter()
            .map(EffectId::from_str)
            .collect::<RetouchResult<BTreeSet<_>>>()
            .map(Self)
    }
}

impl FromIterator<EffectId> for EffectSet {
    fn from_iter<I: IntoIterator<Item = EffectId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/catalog.rs"]
mod tests;
