//! Vertex color: weighted biome color mix followed by the snow overlay.

use crate::biome::{BiomeCatalog, Rgb};
use crate::config::SnowConfig;
use crate::influence::VertexInfluence;
use crate::noise_source::NoiseSource;
use crate::partition::Partition;

/// Linear weighted sum of the influencing biomes' base colors.
///
/// Weights are renormalized here as well; a zero or non-finite total yields
/// the home biome's color.
pub fn blend_biome_color(
    influence: &VertexInfluence,
    partition: &Partition,
    catalog: &BiomeCatalog,
) -> Rgb {
    let color_of = |instance: usize| catalog.get(partition.instance(instance).kind).color;
    let total = influence.weight_sum();
    if total <= 0.0 || !total.is_finite() {
        return color_of(influence.home);
    }
    influence
        .weights
        .iter()
        .fold(Rgb::BLACK, |acc, &(instance, w)| {
            acc.add(color_of(instance).scaled(w / total))
        })
}

/// Altitude overlay that whitens high terrain independently of biome weights.
pub struct SnowLayer<'a> {
    config: &'a SnowConfig,
    noise: &'a NoiseSource,
}

impl<'a> SnowLayer<'a> {
    pub fn new(config: &'a SnowConfig, noise: &'a NoiseSource) -> Self {
        Self { config, noise }
    }

    /// Snow line at `(x, y)`, wobbled by low-frequency noise.
    pub fn line_at(&self, x: f64, y: f64) -> f64 {
        let f = self.config.noise_frequency;
        self.config.line + self.noise.sample(x * f, y * f) * self.config.noise_amplitude
    }

    pub fn apply(&self, color: Rgb, x: f64, y: f64, z: f64) -> Rgb {
        if !self.config.enabled {
            return color;
        }
        if z > self.line_at(x, y) {
            return Rgb::WHITE;
        }
        if z > self.config.blend_start && self.config.blend_range > 0.0 {
            // White gains weight t against the biome mix's weight of 1.
            let t = (z - self.config.blend_start) / self.config.blend_range;
            return color.add(Rgb::WHITE.scaled(t)).scaled(1.0 / (1.0 + t));
        }
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeKind;
    use crate::geometry::Bounds;
    use crate::placement::SeedPlacement;
    use glam::DVec2;

    fn two_biomes() -> (Partition, BiomeCatalog) {
        let catalog = BiomeCatalog::from_kinds([
            BiomeKind::custom("red", Rgb::new(1.0, 0.0, 0.0)),
            BiomeKind::custom("blue", Rgb::new(0.0, 0.0, 1.0)),
        ])
        .unwrap();
        let seeds = [
            SeedPlacement {
                kind: 0,
                position: DVec2::new(-5.0, 0.0),
            },
            SeedPlacement {
                kind: 1,
                position: DVec2::new(5.0, 0.0),
            },
        ];
        let partition = Partition::build(&seeds, Bounds::centered(50.0, 50.0), 0.0).unwrap();
        (partition, catalog)
    }

    #[test]
    fn test_blend_is_weighted_sum() {
        let (partition, catalog) = two_biomes();
        let influence = VertexInfluence {
            home: 0,
            weights: vec![(0, 0.25), (1, 0.75)],
        };
        let c = blend_biome_color(&influence, &partition, &catalog);
        assert!(c.max_channel_delta(Rgb::new(0.25, 0.0, 0.75)) < 1e-12, "got {c:?}");
    }

    #[test]
    fn test_blend_renormalizes() {
        let (partition, catalog) = two_biomes();
        let influence = VertexInfluence {
            home: 0,
            weights: vec![(0, 2.0), (1, 2.0)],
        };
        let c = blend_biome_color(&influence, &partition, &catalog);
        assert!(c.max_channel_delta(Rgb::new(0.5, 0.0, 0.5)) < 1e-12);
    }

    #[test]
    fn test_blend_zero_weights_uses_home() {
        let (partition, catalog) = two_biomes();
        let influence = VertexInfluence {
            home: 1,
            weights: vec![(0, 0.0)],
        };
        assert_eq!(
            blend_biome_color(&influence, &partition, &catalog),
            Rgb::new(0.0, 0.0, 1.0)
        );
    }

    fn flat_snow() -> SnowConfig {
        SnowConfig {
            enabled: true,
            blend_start: 5.0,
            blend_range: 10.0,
            line: 20.0,
            noise_frequency: 0.0,
            noise_amplitude: 0.0,
        }
    }

    #[test]
    fn test_snow_below_band_untouched() {
        let config = flat_snow();
        let noise = NoiseSource::new(0);
        let layer = SnowLayer::new(&config, &noise);
        let green = Rgb::new(0.0, 1.0, 0.0);
        assert_eq!(layer.apply(green, 0.0, 0.0, 4.0), green);
    }

    #[test]
    fn test_snow_band_mixes_white() {
        let config = flat_snow();
        let noise = NoiseSource::new(0);
        let layer = SnowLayer::new(&config, &noise);
        // t = 1: equal parts biome color and white.
        let c = layer.apply(Rgb::BLACK, 0.0, 0.0, 15.0);
        assert!(c.max_channel_delta(Rgb::new(0.5, 0.5, 0.5)) < 1e-12, "got {c:?}");
    }

    #[test]
    fn test_snow_line_is_white() {
        let config = flat_snow();
        let noise = NoiseSource::new(0);
        let layer = SnowLayer::new(&config, &noise);
        assert_eq!(layer.apply(Rgb::BLACK, 3.0, 4.0, 20.5), Rgb::WHITE);
    }

    #[test]
    fn test_snow_line_follows_noise() {
        let config = SnowConfig {
            noise_frequency: 0.05,
            noise_amplitude: 8.0,
            ..flat_snow()
        };
        let noise = NoiseSource::new(21);
        let layer = SnowLayer::new(&config, &noise);
        let lines: Vec<f64> = (0..50).map(|i| layer.line_at(i as f64 * 7.0, 3.0)).collect();
        assert!(lines.iter().all(|l| (12.0..=28.0).contains(l)));
        assert!(lines.iter().any(|&l| (l - 20.0).abs() > 1e-3));
    }

    #[test]
    fn test_disabled_snow_is_noop() {
        let config = SnowConfig {
            enabled: false,
            ..flat_snow()
        };
        let noise = NoiseSource::new(0);
        let layer = SnowLayer::new(&config, &noise);
        assert_eq!(layer.apply(Rgb::BLACK, 0.0, 0.0, 1_000.0), Rgb::BLACK);
    }
}
