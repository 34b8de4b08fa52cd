//! Multi-octave elevation over blended biome parameters.
//!
//! Each vertex starts at the influence-weighted base altitude of the biomes
//! around it and adds octaves of simplex noise whose starting amplitude and
//! frequency are the weighted biome modifiers.

use crate::biome::{BiomeCatalog, BiomeKind};
use crate::config::TerrainConfig;
use crate::influence::{VertexInfluence, weighted_average};
use crate::noise_source::NoiseSource;
use crate::partition::Partition;

/// Octave settings shared by every vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightParams {
    /// Number of noise layers. Zero leaves the base altitude untouched.
    pub octaves: u32,
    /// Divisor applied to vertex coordinates before sampling.
    pub scale: f64,
    /// Amplitude multiplier between octaves. Applied as given, including
    /// negative values and magnitudes above 1.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Skip the octaves entirely.
    pub flat_preview: bool,
}

impl Default for HeightParams {
    fn default() -> Self {
        Self::from(&TerrainConfig::default())
    }
}

impl From<&TerrainConfig> for HeightParams {
    fn from(config: &TerrainConfig) -> Self {
        Self {
            octaves: config.octaves,
            scale: config.scale,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
            flat_preview: config.flat_preview,
        }
    }
}

/// Influence-weighted biome parameters of one vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendedParameters {
    pub amplitude: f64,
    pub frequency: f64,
    pub altitude: f64,
}

impl BlendedParameters {
    /// Weighted average of the kinds' modifiers. Falls back to the home kind
    /// when the weights cannot be averaged.
    pub fn from_influence(
        influence: &VertexInfluence,
        partition: &Partition,
        catalog: &BiomeCatalog,
    ) -> Self {
        let kind_of = |instance: usize| catalog.get(partition.instance(instance).kind);
        let weights: Vec<f64> = influence.weights.iter().map(|&(_, w)| w).collect();
        let collect = |field: fn(&BiomeKind) -> f64| -> Vec<f64> {
            influence
                .weights
                .iter()
                .map(|&(i, _)| field(kind_of(i)))
                .collect()
        };

        let blended = weighted_average(&collect(|k| k.amplitude_modifier), &weights).and_then(
            |amplitude| {
                Ok(Self {
                    amplitude,
                    frequency: weighted_average(&collect(|k| k.frequency_modifier), &weights)?,
                    altitude: weighted_average(&collect(|k| k.base_altitude), &weights)?,
                })
            },
        );
        blended.unwrap_or_else(|_| {
            let home = kind_of(influence.home);
            Self {
                amplitude: home.amplitude_modifier,
                frequency: home.frequency_modifier,
                altitude: home.base_altitude,
            }
        })
    }
}

/// Samples elevation with fractal noise on top of blended biome parameters.
pub struct HeightSampler<'a> {
    noise: &'a NoiseSource,
    params: HeightParams,
}

impl<'a> HeightSampler<'a> {
    pub fn new(noise: &'a NoiseSource, params: HeightParams) -> Self {
        Self { noise, params }
    }

    /// Elevation at `(x, y)` for the given blended parameters.
    pub fn sample(&self, x: f64, y: f64, blended: &BlendedParameters) -> f64 {
        let mut z = blended.altitude;
        if self.params.flat_preview {
            return z;
        }

        let mut amplitude = blended.amplitude;
        let mut frequency = blended.frequency;
        for _ in 0..self.params.octaves {
            let nx = x / self.params.scale * frequency;
            let ny = y / self.params.scale * frequency;
            z += self.noise.sample(nx, ny) * amplitude;

            amplitude *= self.params.persistence;
            frequency *= self.params.lacunarity;
        }
        z
    }

    /// Largest possible deviation from the base altitude for a starting
    /// amplitude: `Σ |amplitude · persistence^k|` over the octaves.
    pub fn max_amplitude(&self, amplitude: f64) -> f64 {
        if self.params.flat_preview {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut amp = amplitude;
        for _ in 0..self.params.octaves {
            sum += amp.abs();
            amp *= self.params.persistence;
        }
        sum
    }

    pub fn params(&self) -> &HeightParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn blended(amplitude: f64, altitude: f64) -> BlendedParameters {
        BlendedParameters {
            amplitude,
            frequency: 1.0,
            altitude,
        }
    }

    #[test]
    fn test_determinism_same_seed_same_coord() {
        let noise_a = NoiseSource::new(42);
        let noise_b = NoiseSource::new(42);
        let a = HeightSampler::new(&noise_a, HeightParams::default());
        let b = HeightSampler::new(&noise_b, HeightParams::default());
        let p = blended(1.2, 20.0);

        let h1 = a.sample(100.0, 200.0, &p);
        let h2 = b.sample(100.0, 200.0, &p);
        assert!(
            (h1 - h2).abs() < EPSILON,
            "Same seed + same coord must produce identical height: {h1} vs {h2}"
        );
    }

    #[test]
    fn test_height_within_expected_range() {
        let noise = NoiseSource::new(3);
        let sampler = HeightSampler::new(&noise, HeightParams::default());
        let p = blended(1.0, 5.0);
        let max_amp = sampler.max_amplitude(p.amplitude);

        for x in (0..100).map(|i| i as f64 * 5.0 - 250.0) {
            for y in (0..100).map(|i| i as f64 * 5.0 - 250.0) {
                let h = sampler.sample(x, y, &p);
                assert!(
                    (h - p.altitude).abs() <= max_amp + EPSILON,
                    "Height {h} deviates more than {max_amp} from altitude at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_negative_persistence_applied_exactly() {
        let noise = NoiseSource::new(11);
        let params = HeightParams {
            octaves: 3,
            scale: 12.0,
            persistence: -2.5,
            lacunarity: 0.4,
            flat_preview: false,
        };
        let sampler = HeightSampler::new(&noise, params);
        let (x, y) = (37.0, -81.0);
        let expected = 1.0
            + noise.sample(x / 12.0 * 0.75, y / 12.0 * 0.75) * 2.0
            + noise.sample(x / 12.0 * 0.3, y / 12.0 * 0.3) * -5.0
            + noise.sample(x / 12.0 * 0.12, y / 12.0 * 0.12) * 12.5;
        let h = sampler.sample(
            x,
            y,
            &BlendedParameters {
                amplitude: 2.0,
                frequency: 0.75,
                altitude: 1.0,
            },
        );
        assert!((h - expected).abs() < 1e-9, "expected {expected}, got {h}");
    }

    #[test]
    fn test_max_amplitude_calculation() {
        let noise = NoiseSource::new(0);
        let sampler = HeightSampler::new(
            &noise,
            HeightParams {
                octaves: 4,
                persistence: -0.5,
                ..Default::default()
            },
        );
        let expected = 1000.0 + 500.0 + 250.0 + 125.0;
        assert!(
            (sampler.max_amplitude(1000.0) - expected).abs() < EPSILON,
            "Max amplitude should be {expected}, got {}",
            sampler.max_amplitude(1000.0)
        );
    }

    #[test]
    fn test_zero_amplitude_returns_altitude() {
        let noise = NoiseSource::new(5);
        let sampler = HeightSampler::new(&noise, HeightParams::default());
        let h = sampler.sample(123.0, 456.0, &blended(0.0, 5.0));
        assert!(
            (h - 5.0).abs() < EPSILON,
            "Zero amplitude should produce the base altitude, got {h}"
        );
    }

    #[test]
    fn test_flat_preview_ignores_octaves() {
        let noise = NoiseSource::new(5);
        let sampler = HeightSampler::new(
            &noise,
            HeightParams {
                flat_preview: true,
                ..Default::default()
            },
        );
        assert_eq!(sampler.sample(7.0, 9.0, &blended(3.0, -10.0)), -10.0);
        assert_eq!(sampler.max_amplitude(3.0), 0.0);
    }

    #[test]
    fn test_smooth_gradient_no_discontinuities() {
        let noise = NoiseSource::new(42);
        let sampler = HeightSampler::new(
            &noise,
            HeightParams {
                persistence: 0.5,
                lacunarity: 2.0,
                ..Default::default()
            },
        );
        let p = blended(1.0, 0.0);
        let step = 0.01;
        let max_allowed_delta = sampler.max_amplitude(1.0) * 0.1;

        for i in 0..10_000 {
            let x = i as f64 * step;
            let delta = (sampler.sample(x + step, 0.0, &p) - sampler.sample(x, 0.0, &p)).abs();
            assert!(
                delta < max_allowed_delta,
                "Discontinuity at x={x}: delta={delta} exceeds max={max_allowed_delta}"
            );
        }
    }
}
