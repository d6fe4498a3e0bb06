use std::fmt;

/// One scalar colour-adjustment axis.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Channel {
    Brightness,
    Contrast,
    #[serde(alias = "saturation")]
    Saturate,
    Grayscale,
    Sepia,
    HueRotate,
    Blur,
}

/// Unit a channel value is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelUnit {
    Percent,
    Degrees,
    Pixels,
}

impl ChannelUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Percent => "%",
            Self::Degrees => "deg",
            Self::Pixels => "px",
        }
    }
}

impl Channel {
    /// Channels in the fixed order they are applied and formatted.
    pub const ALL: [Channel; 7] = [
        Channel::Brightness,
        Channel::Contrast,
        Channel::Saturate,
        Channel::Grayscale,
        Channel::Sepia,
        Channel::HueRotate,
        Channel::Blur,
    ];

    /// The "no change" value of this channel.
    pub fn baseline(self) -> f64 {
        match self {
            Self::Brightness | Self::Contrast | Self::Saturate => 100.0,
            Self::Grayscale | Self::Sepia | Self::HueRotate | Self::Blur => 0.0,
        }
    }

    pub fn unit(self) -> ChannelUnit {
        match self {
            Self::HueRotate => ChannelUnit::Degrees,
            Self::Blur => ChannelUnit::Pixels,
            _ => ChannelUnit::Percent,
        }
    }

    /// CSS filter-function name.
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturate => "saturate",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::HueRotate => "hue-rotate",
            Self::Blur => "blur",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

/// A named preset: the channel targets reached at intensity 100.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FilterDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub targets: &'static [(Channel, f64)],
}

impl FilterDefinition {
    /// Target value for `channel`, or `None` when this filter leaves it at baseline.
    pub fn target(&self, channel: Channel) -> Option<f64> {
        self.targets
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, v)| *v)
    }

    pub fn is_none(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Id of the neutral filter.
pub const NONE_FILTER_ID: &str = "none";

static FILTERS: [FilterDefinition; 6] = [
    FilterDefinition {
        id: NONE_FILTER_ID,
        name: "None",
        targets: &[],
    },
    FilterDefinition {
        id: "midnight",
        name: "Midnight",
        targets: &[
            (Channel::Brightness, 85.0),
            (Channel::Contrast, 120.0),
            (Channel::Saturate, 80.0),
            (Channel::Sepia, 20.0),
        ],
    },
    FilterDefinition {
        id: "noir",
        name: "Noir",
        targets: &[
            (Channel::Grayscale, 100.0),
            (Channel::Contrast, 150.0),
            (Channel::Brightness, 90.0),
        ],
    },
    FilterDefinition {
        id: "cinematic",
        name: "Cinematic",
        targets: &[
            (Channel::Sepia, 40.0),
            (Channel::Contrast, 110.0),
            (Channel::Brightness, 95.0),
            (Channel::Saturate, 120.0),
        ],
    },
    FilterDefinition {
        id: "vintage",
        name: "Vintage",
        targets: &[
            (Channel::Sepia, 70.0),
            (Channel::Contrast, 90.0),
            (Channel::Brightness, 110.0),
        ],
    },
    FilterDefinition {
        id: "daydream",
        name: "Daydream",
        targets: &[
            (Channel::Brightness, 110.0),
            (Channel::Saturate, 130.0),
            (Channel::HueRotate, -10.0),
        ],
    },
];

/// The full read-only filter catalog, in display order.
pub fn filters() -> &'static [FilterDefinition] {
    &FILTERS
}

/// Look up a filter by id.
pub fn find_filter(id: &str) -> Option<&'static FilterDefinition> {
    FILTERS.iter().find(|f| f.id == id)
}

/// Look up a filter by id, falling back to the neutral filter for unknown ids.
pub fn resolve_filter(id: &str) -> &'static FilterDefinition {
    match find_filter(id) {
        Some(f) => f,
        None => {
            tracing::warn!(filter_id = id, "unknown filter id, rendering without a filter");
            &FILTERS[0]
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/catalog.rs"]
mod tests;
