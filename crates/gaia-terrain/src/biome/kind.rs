//! Biome kind definition: the immutable catalog record for one terrain archetype.

use serde::{Deserialize, Serialize};

/// Linear RGB color with channels in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a packed `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f64 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Returns `self * weight`, channel-wise.
    pub fn scaled(self, weight: f64) -> Self {
        Self::new(self.r * weight, self.g * weight, self.b * weight)
    }

    /// Channel-wise sum.
    pub fn add(self, other: Self) -> Self {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r as f32, self.g as f32, self.b as f32]
    }

    /// Largest absolute per-channel difference, used for tolerance checks.
    pub fn max_channel_delta(self, other: Self) -> f64 {
        (self.r - other.r)
            .abs()
            .max((self.g - other.g).abs())
            .max((self.b - other.b).abs())
    }
}

/// Built-in biome archetypes.
///
/// The tag selects the preset values a kind starts from. Catalogs built from
/// user data use [`BiomeTag::Custom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeTag {
    Lake,
    Plain,
    Mountain,
    Forest,
    Grassland,
    Custom,
}

impl BiomeTag {
    /// Every built-in tag, in standard catalog order.
    pub const BUILT_IN: [BiomeTag; 5] = [
        BiomeTag::Lake,
        BiomeTag::Plain,
        BiomeTag::Mountain,
        BiomeTag::Forest,
        BiomeTag::Grassland,
    ];

    /// Returns the preset [`BiomeKind`] for this tag.
    pub fn preset(self) -> BiomeKind {
        let base = BiomeKind {
            name: self.default_name().to_string(),
            tag: self,
            spawn_weight: 1.0,
            color: Rgb::new(0.5, 0.5, 0.5),
            amplitude_modifier: 1.0,
            frequency_modifier: 1.0,
            base_altitude: 1.0,
            influence: 1.0,
        };
        match self {
            BiomeTag::Lake => BiomeKind {
                spawn_weight: 10.0,
                color: Rgb::from_hex(0x1e90ff),
                amplitude_modifier: 0.03,
                base_altitude: -10.0,
                influence: 2.0,
                ..base
            },
            BiomeTag::Plain => BiomeKind {
                spawn_weight: 10.0,
                color: Rgb::from_hex(0xd2b48c),
                amplitude_modifier: 0.33,
                frequency_modifier: 0.8,
                ..base
            },
            BiomeTag::Mountain => BiomeKind {
                spawn_weight: 50.0,
                color: Rgb::from_hex(0x777777),
                amplitude_modifier: 1.2,
                frequency_modifier: 0.75,
                base_altitude: 20.0,
                influence: 2.0,
                ..base
            },
            BiomeTag::Forest => BiomeKind {
                spawn_weight: 30.0,
                color: Rgb::from_hex(0x228b22),
                ..base
            },
            BiomeTag::Grassland => BiomeKind {
                spawn_weight: 30.0,
                color: Rgb::from_hex(0x7cfc00),
                amplitude_modifier: 0.5,
                ..base
            },
            BiomeTag::Custom => base,
        }
    }

    fn default_name(self) -> &'static str {
        match self {
            BiomeTag::Lake => "lake",
            BiomeTag::Plain => "plain",
            BiomeTag::Mountain => "mountain",
            BiomeTag::Forest => "forest",
            BiomeTag::Grassland => "grassland",
            BiomeTag::Custom => "custom",
        }
    }
}

/// Full descriptor for a biome kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeKind {
    /// Human-readable name, unique within a catalog (e.g. "mountain").
    pub name: String,
    /// Archetype this kind was derived from.
    pub tag: BiomeTag,
    /// Relative probability of this kind being picked for a placed seed.
    pub spawn_weight: f64,
    /// Base vertex color.
    pub color: Rgb,
    /// Multiplier on the first-octave noise amplitude.
    pub amplitude_modifier: f64,
    /// Multiplier on the first-octave noise frequency.
    pub frequency_modifier: f64,
    /// Elevation the noise layers are added to.
    pub base_altitude: f64,
    /// Scales how strongly this kind pulls neighboring vertices when blending.
    pub influence: f64,
}

impl BiomeKind {
    /// Creates a custom kind with neutral modifiers.
    pub fn custom(name: impl Into<String>, color: Rgb) -> Self {
        Self {
            name: name.into(),
            color,
            ..BiomeTag::Custom.preset()
        }
    }

    pub fn with_spawn_weight(mut self, spawn_weight: f64) -> Self {
        self.spawn_weight = spawn_weight;
        self
    }

    pub fn with_amplitude_modifier(mut self, amplitude_modifier: f64) -> Self {
        self.amplitude_modifier = amplitude_modifier;
        self
    }

    pub fn with_frequency_modifier(mut self, frequency_modifier: f64) -> Self {
        self.frequency_modifier = frequency_modifier;
        self
    }

    pub fn with_base_altitude(mut self, base_altitude: f64) -> Self {
        self.base_altitude = base_altitude;
        self
    }

    pub fn with_influence(mut self, influence: f64) -> Self {
        self.influence = influence;
        self
    }
}
