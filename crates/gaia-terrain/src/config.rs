//! Terrain generation parameters, partial updates and the parameter schema.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Pipeline stages in execution order. A parameter change invalidates its
/// stage and every later one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Seed placement, Voronoi cells and the neighbor graph.
    Placement,
    /// Per-vertex biome weights.
    Influence,
    /// Elevation.
    Height,
    /// Vertex colors.
    Color,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Placement, Stage::Influence, Stage::Height, Stage::Color];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Placement => "placement",
            Stage::Influence => "influence",
            Stage::Height => "height",
            Stage::Color => "color",
        }
    }
}

/// How per-vertex biome weights are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendStrategy {
    /// Distance from the vertex to each nearby seed, perturbed by noise.
    /// Cell borders farther than the threshold from every seed stay sharp.
    SeedDistance,
    /// Distance from the vertex to the edges of its home cell. Continuous
    /// across every shared edge.
    #[default]
    EdgeDistance,
}

/// Altitude-driven snow overlay applied after biome color blending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowConfig {
    pub enabled: bool,
    /// Elevation where white starts mixing into the biome color.
    pub blend_start: f64,
    /// Elevation span over which the white weight grows by 1.
    pub blend_range: f64,
    /// Elevation above which the color is pure white, before noise.
    pub line: f64,
    /// Frequency of the noise that makes the snow line irregular.
    pub noise_frequency: f64,
    /// Height of the snow line wobble.
    pub noise_amplitude: f64,
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blend_start: 5.0,
            blend_range: 10.0,
            line: 20.0,
            noise_frequency: 0.02,
            noise_amplitude: 5.0,
        }
    }
}

/// Full parameter set of one terrain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Domain extent along x, centred on the origin.
    pub terrain_width: f64,
    /// Domain extent along y, centred on the origin.
    pub terrain_height: f64,
    /// Grid cells per side; the mesh has `(subdivisions + 1)^2` vertices.
    pub subdivisions: u32,
    pub biome_count: u32,
    /// Blend radius.
    pub blend_threshold: f64,
    /// Frequency of the blend distance perturbation.
    pub noise_frequency: f64,
    /// Amplitude of the blend distance perturbation.
    pub noise_amplitude: f64,
    pub octaves: u32,
    /// Horizontal divisor applied to coordinates before octave sampling.
    pub scale: f64,
    /// Amplitude multiplier between octaves. May be negative or above 1.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    pub seed: u64,
    /// Extra border around the domain covered by Voronoi cells.
    pub partition_margin: f64,
    pub blend_strategy: BlendStrategy,
    /// Skip octave noise: elevation is the blended base altitude.
    pub flat_preview: bool,
    pub snow: SnowConfig,
    /// Worker threads for the vertex loops. 0 uses every core.
    pub worker_threads: u32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            terrain_width: 500.0,
            terrain_height: 500.0,
            subdivisions: 50,
            biome_count: 15,
            blend_threshold: 30.0,
            noise_frequency: 0.008,
            noise_amplitude: 2.0,
            octaves: 4,
            scale: 12.0,
            persistence: -2.5,
            lacunarity: 0.4,
            seed: 0,
            partition_margin: 50.0,
            blend_strategy: BlendStrategy::EdgeDistance,
            flat_preview: false,
            snow: SnowConfig::default(),
            worker_threads: 0,
        }
    }
}

/// Description of one tunable parameter, for external editors.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// First stage recomputed when the field changes. `None` for fields that
    /// do not affect the output.
    pub stage: Option<Stage>,
    pub description: &'static str,
}

const fn field(
    name: &'static str,
    min: Option<f64>,
    max: Option<f64>,
    stage: Option<Stage>,
    description: &'static str,
) -> FieldSpec {
    FieldSpec {
        name,
        min,
        max,
        stage,
        description,
    }
}

const SCHEMA: &[FieldSpec] = &[
    field("terrain_width", Some(1.0), Some(100_000.0), Some(Stage::Placement), "Domain width"),
    field("terrain_height", Some(1.0), Some(100_000.0), Some(Stage::Placement), "Domain height"),
    field("subdivisions", Some(1.0), Some(2048.0), Some(Stage::Influence), "Grid cells per side"),
    field("biome_count", Some(1.0), Some(10_000.0), Some(Stage::Placement), "Number of biome seeds"),
    field("blend_threshold", Some(0.0), Some(1_000.0), Some(Stage::Influence), "Blend radius"),
    field("noise_frequency", Some(0.0), Some(1.0), Some(Stage::Influence), "Blend perturbation frequency"),
    field("noise_amplitude", Some(0.0), Some(100.0), Some(Stage::Influence), "Blend perturbation amplitude"),
    field("octaves", Some(0.0), Some(16.0), Some(Stage::Height), "Noise layers"),
    field("scale", Some(0.001), Some(10_000.0), Some(Stage::Height), "Octave coordinate divisor"),
    field("persistence", Some(-10.0), Some(10.0), Some(Stage::Height), "Amplitude factor per octave"),
    field("lacunarity", Some(0.0), Some(10.0), Some(Stage::Height), "Frequency factor per octave"),
    field("seed", Some(0.0), None, Some(Stage::Placement), "World seed"),
    field("partition_margin", Some(0.0), Some(10_000.0), Some(Stage::Placement), "Voronoi border margin"),
    field("blend_strategy", None, None, Some(Stage::Influence), "Seed or edge distance blending"),
    field("flat_preview", None, None, Some(Stage::Height), "Skip octave noise"),
    field("snow", None, None, Some(Stage::Color), "Snow overlay"),
    field("worker_threads", Some(0.0), Some(1024.0), None, "Vertex loop threads, 0 for all cores"),
];

impl TerrainConfig {
    /// Explicit parameter schema for external editors.
    pub fn schema() -> &'static [FieldSpec] {
        SCHEMA
    }

    pub fn vertices_per_side(&self) -> usize {
        self.subdivisions as usize + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices_per_side() * self.vertices_per_side()
    }

    /// Checks every range constraint.
    ///
    /// # Errors
    ///
    /// [`TerrainError::Configuration`] naming the first offending field.
    pub fn validate(&self) -> Result<(), TerrainError> {
        fn positive(name: &str, v: f64) -> Result<(), TerrainError> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(TerrainError::Configuration(format!(
                    "{name} must be positive, got {v}"
                )))
            }
        }
        fn non_negative(name: &str, v: f64) -> Result<(), TerrainError> {
            if v >= 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(TerrainError::Configuration(format!(
                    "{name} must be non-negative, got {v}"
                )))
            }
        }
        fn finite(name: &str, v: f64) -> Result<(), TerrainError> {
            if v.is_finite() {
                Ok(())
            } else {
                Err(TerrainError::Configuration(format!(
                    "{name} must be finite, got {v}"
                )))
            }
        }

        positive("terrain_width", self.terrain_width)?;
        positive("terrain_height", self.terrain_height)?;
        if self.subdivisions < 1 {
            return Err(TerrainError::Configuration(
                "subdivisions must be at least 1".into(),
            ));
        }
        if self.biome_count < 1 {
            return Err(TerrainError::Configuration(
                "biome_count must be at least 1".into(),
            ));
        }
        non_negative("blend_threshold", self.blend_threshold)?;
        non_negative("noise_frequency", self.noise_frequency)?;
        finite("noise_amplitude", self.noise_amplitude)?;
        positive("scale", self.scale)?;
        finite("persistence", self.persistence)?;
        finite("lacunarity", self.lacunarity)?;
        non_negative("partition_margin", self.partition_margin)?;
        if self.snow.enabled {
            finite("snow.blend_start", self.snow.blend_start)?;
            non_negative("snow.blend_range", self.snow.blend_range)?;
            finite("snow.line", self.snow.line)?;
            non_negative("snow.noise_frequency", self.snow.noise_frequency)?;
            finite("snow.noise_amplitude", self.snow.noise_amplitude)?;
        }
        for spec in SCHEMA {
            let Some(value) = self.numeric_value(spec.name) else {
                continue;
            };
            if let Some(min) = spec.min
                && value < min
            {
                return Err(TerrainError::Configuration(format!(
                    "{} must be at least {min}, got {value}",
                    spec.name
                )));
            }
            if let Some(max) = spec.max
                && value > max
            {
                return Err(TerrainError::Configuration(format!(
                    "{} must be at most {max}, got {value}",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    /// Value of a numeric schema field, `None` for the non-numeric ones.
    fn numeric_value(&self, name: &str) -> Option<f64> {
        let value = match name {
            "terrain_width" => self.terrain_width,
            "terrain_height" => self.terrain_height,
            "subdivisions" => f64::from(self.subdivisions),
            "biome_count" => f64::from(self.biome_count),
            "blend_threshold" => self.blend_threshold,
            "noise_frequency" => self.noise_frequency,
            "noise_amplitude" => self.noise_amplitude,
            "octaves" => f64::from(self.octaves),
            "scale" => self.scale,
            "persistence" => self.persistence,
            "lacunarity" => self.lacunarity,
            "seed" => self.seed as f64,
            "partition_margin" => self.partition_margin,
            "worker_threads" => f64::from(self.worker_threads),
            _ => return None,
        };
        Some(value)
    }

    /// Merges `patch` into `self` and returns the earliest stage a changed
    /// field belongs to, or `None` if nothing that affects output changed.
    pub fn merge(&mut self, patch: &TerrainConfigPatch) -> Option<Stage> {
        let mut earliest: Option<Stage> = None;
        let mut touch = |stage: Stage| {
            earliest = Some(earliest.map_or(stage, |s| s.min(stage)));
        };

        macro_rules! merge_field {
            ($field:ident, $stage:expr) => {
                if let Some(value) = &patch.$field
                    && self.$field != *value
                {
                    self.$field = value.clone();
                    if let Some(stage) = $stage {
                        touch(stage);
                    }
                }
            };
        }

        merge_field!(terrain_width, Some(Stage::Placement));
        merge_field!(terrain_height, Some(Stage::Placement));
        merge_field!(subdivisions, Some(Stage::Influence));
        merge_field!(biome_count, Some(Stage::Placement));
        merge_field!(blend_threshold, Some(Stage::Influence));
        merge_field!(noise_frequency, Some(Stage::Influence));
        merge_field!(noise_amplitude, Some(Stage::Influence));
        merge_field!(octaves, Some(Stage::Height));
        merge_field!(scale, Some(Stage::Height));
        merge_field!(persistence, Some(Stage::Height));
        merge_field!(lacunarity, Some(Stage::Height));
        merge_field!(seed, Some(Stage::Placement));
        merge_field!(partition_margin, Some(Stage::Placement));
        merge_field!(blend_strategy, Some(Stage::Influence));
        merge_field!(flat_preview, Some(Stage::Height));
        merge_field!(snow, Some(Stage::Color));
        merge_field!(worker_threads, None::<Stage>);

        earliest
    }

    /// Earliest stage that differs between two configurations.
    pub fn first_changed_stage(&self, other: &TerrainConfig) -> Option<Stage> {
        let mut probe = self.clone();
        probe.merge(&TerrainConfigPatch::from(other.clone()))
    }
}

/// A partial [`TerrainConfig`]: `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfigPatch {
    pub terrain_width: Option<f64>,
    pub terrain_height: Option<f64>,
    pub subdivisions: Option<u32>,
    pub biome_count: Option<u32>,
    pub blend_threshold: Option<f64>,
    pub noise_frequency: Option<f64>,
    pub noise_amplitude: Option<f64>,
    pub octaves: Option<u32>,
    pub scale: Option<f64>,
    pub persistence: Option<f64>,
    pub lacunarity: Option<f64>,
    pub seed: Option<u64>,
    pub partition_margin: Option<f64>,
    pub blend_strategy: Option<BlendStrategy>,
    pub flat_preview: Option<bool>,
    pub snow: Option<SnowConfig>,
    pub worker_threads: Option<u32>,
}

impl TerrainConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<TerrainConfig> for TerrainConfigPatch {
    fn from(c: TerrainConfig) -> Self {
        Self {
            terrain_width: Some(c.terrain_width),
            terrain_height: Some(c.terrain_height),
            subdivisions: Some(c.subdivisions),
            biome_count: Some(c.biome_count),
            blend_threshold: Some(c.blend_threshold),
            noise_frequency: Some(c.noise_frequency),
            noise_amplitude: Some(c.noise_amplitude),
            octaves: Some(c.octaves),
            scale: Some(c.scale),
            persistence: Some(c.persistence),
            lacunarity: Some(c.lacunarity),
            seed: Some(c.seed),
            partition_margin: Some(c.partition_margin),
            blend_strategy: Some(c.blend_strategy),
            flat_preview: Some(c.flat_preview),
            snow: Some(c.snow),
            worker_threads: Some(c.worker_threads),
        }
    }
}
