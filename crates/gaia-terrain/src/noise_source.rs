//! Seeded 2D coherent noise shared by every terrain stage.

use noise::{NoiseFn, Simplex};

/// Offsets that decorrelate the independent noise fields derived from one
/// world seed.
const PERTURBATION_SEED_OFFSET: u64 = 0xDEAD_BEEF;
const SNOW_SEED_OFFSET: u64 = 0x5EED_0F5A;

/// Deterministic 2D simplex noise with output clamped to `[-1, 1]`.
#[derive(Clone, Debug)]
pub struct NoiseSource {
    simplex: Simplex,
    seed: u32,
}

impl NoiseSource {
    pub fn new(seed: u32) -> Self {
        Self {
            simplex: Simplex::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples the field at `(x, y)`, in `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.simplex.get([x, y]).clamp(-1.0, 1.0)
    }

    /// Samples the field at `(x, y)`, remapped to `[0, 1]`.
    pub fn sample_unit(&self, x: f64, y: f64) -> f64 {
        (self.sample(x, y) + 1.0) * 0.5
    }
}

/// The independent noise fields one terrain uses, all derived from the world seed.
#[derive(Clone, Debug)]
pub struct NoiseFields {
    /// Octave noise for elevation.
    pub elevation: NoiseSource,
    /// Low-amplitude field that wobbles blend distances.
    pub perturbation: NoiseSource,
    /// Low-frequency field that makes the snow line irregular.
    pub snow: NoiseSource,
}

impl NoiseFields {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            elevation: NoiseSource::new(fold_seed(seed)),
            perturbation: NoiseSource::new(fold_seed(seed.wrapping_add(PERTURBATION_SEED_OFFSET))),
            snow: NoiseSource::new(fold_seed(seed.wrapping_add(SNOW_SEED_OFFSET))),
        }
    }
}

/// Narrows a world seed to the noise seed width, keeping the high half.
fn fold_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_value() {
        let a = NoiseSource::new(42);
        let b = NoiseSource::new(42);
        assert_eq!(a.sample(12.5, -3.25), b.sample(12.5, -3.25));
    }

    #[test]
    fn test_output_range() {
        let noise = NoiseSource::new(3);
        for i in 0..200 {
            for j in 0..200 {
                let v = noise.sample(i as f64 * 0.137, j as f64 * 0.071);
                assert!((-1.0..=1.0).contains(&v));
                let u = noise.sample_unit(i as f64 * 0.137, j as f64 * 0.071);
                assert!((0.0..=1.0).contains(&u));
            }
        }
    }

    #[test]
    fn test_fields_are_decorrelated() {
        let fields = NoiseFields::from_seed(9);
        let differs = (0..50).any(|i| {
            let x = i as f64 * 0.31 + 0.1;
            fields.elevation.sample(x, x * 0.5) != fields.perturbation.sample(x, x * 0.5)
        });
        assert!(differs);
        assert_ne!(fields.elevation.seed(), fields.snow.seed());
    }

    #[test]
    fn test_high_seed_bits_change_noise() {
        let low = NoiseFields::from_seed(7);
        let high = NoiseFields::from_seed(7 + (1 << 32));
        assert_ne!(low.elevation.seed(), high.elevation.seed());
        assert_ne!(low.perturbation.seed(), high.perturbation.seed());
        assert_ne!(low.snow.seed(), high.snow.seed());
    }
}
