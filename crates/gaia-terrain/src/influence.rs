//! Per-vertex biome influence: home biome plus normalized blend weights.

use glam::DVec2;

use crate::biome::BiomeCatalog;
use crate::config::BlendStrategy;
use crate::error::TerrainError;
use crate::geometry::point_segment_distance;
use crate::noise_source::NoiseSource;
use crate::partition::Partition;
use crate::seed_grid::SeedGrid;

/// Tolerance on the sum of normalized weights.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Blend weights of one vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexInfluence {
    /// Instance whose seed is nearest.
    pub home: usize,
    /// `(instance, weight)` pairs, weights summing to 1.
    pub weights: Vec<(usize, f64)>,
}

impl VertexInfluence {
    pub fn home_only(home: usize) -> Self {
        Self {
            home,
            weights: vec![(home, 1.0)],
        }
    }

    pub fn is_home_only(&self) -> bool {
        self.weights.len() == 1 && self.weights[0] == (self.home, 1.0)
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().map(|&(_, w)| w).sum()
    }
}

/// Influence of every mesh vertex, in vertex order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InfluenceMap {
    pub vertices: Vec<VertexInfluence>,
    /// Vertices that fell back to home-only because their weights degenerated.
    pub degenerate: usize,
}

/// `Σ values[i]·weights[i] / Σ weights[i]`.
///
/// # Errors
///
/// [`TerrainError::Configuration`] when the slices differ in length,
/// [`TerrainError::DegenerateGeometry`] when the weights sum to zero or a
/// non-finite value.
pub fn weighted_average(values: &[f64], weights: &[f64]) -> Result<f64, TerrainError> {
    if values.len() != weights.len() {
        return Err(TerrainError::Configuration(format!(
            "weighted average of {} values with {} weights",
            values.len(),
            weights.len()
        )));
    }
    let total: f64 = weights.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(TerrainError::DegenerateGeometry(format!(
            "weights sum to {total}"
        )));
    }
    let sum: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Ok(sum / total)
}

/// Scales weights in place so they sum to 1.
///
/// # Errors
///
/// [`TerrainError::DegenerateGeometry`] on a zero or non-finite total.
pub fn normalize(weights: &mut [(usize, f64)]) -> Result<(), TerrainError> {
    let total: f64 = weights.iter().map(|&(_, w)| w).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(TerrainError::DegenerateGeometry(format!(
            "influence weights sum to {total}"
        )));
    }
    for (_, w) in weights.iter_mut() {
        *w /= total;
    }
    Ok(())
}

/// Resolution parameters shared by every vertex of one rebuild.
pub struct InfluenceResolver<'a> {
    partition: &'a Partition,
    catalog: &'a BiomeCatalog,
    strategy: BlendStrategy,
    threshold: f64,
    perturbation: &'a NoiseSource,
    noise_frequency: f64,
    noise_amplitude: f64,
    grid: SeedGrid,
}

impl<'a> InfluenceResolver<'a> {
    pub fn new(
        partition: &'a Partition,
        catalog: &'a BiomeCatalog,
        strategy: BlendStrategy,
        threshold: f64,
        perturbation: &'a NoiseSource,
        noise_frequency: f64,
        noise_amplitude: f64,
    ) -> Self {
        let reach = threshold + noise_amplitude.abs();
        let grid = SeedGrid::new(partition.instances().iter().map(|i| i.position), reach);
        Self {
            partition,
            catalog,
            strategy,
            threshold,
            perturbation,
            noise_frequency,
            noise_amplitude,
            grid,
        }
    }

    fn influence_of(&self, instance: usize) -> f64 {
        self.catalog
            .get(self.partition.instance(instance).kind)
            .influence
    }

    /// Resolves one vertex. The flag is `true` when the weights degenerated
    /// and the home-only fallback was used.
    pub fn resolve(&self, p: DVec2, scratch: &mut Vec<usize>) -> (VertexInfluence, bool) {
        let home = self.partition.home_of(p);
        if self.threshold <= 0.0 {
            return (VertexInfluence::home_only(home), false);
        }

        let mut weights = match self.strategy {
            BlendStrategy::SeedDistance => self.seed_distance_weights(p, scratch),
            BlendStrategy::EdgeDistance => self.edge_distance_weights(p, home),
        };
        if weights.is_empty() {
            return (VertexInfluence::home_only(home), false);
        }
        match normalize(&mut weights) {
            Ok(()) => (VertexInfluence { home, weights }, false),
            Err(_) => (VertexInfluence::home_only(home), true),
        }
    }

    fn seed_distance_weights(&self, p: DVec2, scratch: &mut Vec<usize>) -> Vec<(usize, f64)> {
        let offset = self.perturbation.sample(
            p.x * self.noise_frequency,
            p.y * self.noise_frequency,
        ) * self.noise_amplitude;

        self.grid
            .candidates(p, self.threshold + self.noise_amplitude.abs(), scratch);
        scratch
            .iter()
            .filter_map(|&index| {
                let instance = self.partition.instance(index);
                // Coincident duplicates own no cell and must not double-count.
                if instance.cell.is_empty() {
                    return None;
                }
                let distance = (instance.position.distance(p) + offset).max(0.0);
                if distance >= self.threshold {
                    return None;
                }
                let weight = (self.threshold - distance) * self.influence_of(index);
                (weight > 0.0).then_some((index, weight))
            })
            .collect()
    }

    fn edge_distance_weights(&self, p: DVec2, home: usize) -> Vec<(usize, f64)> {
        let mut weights = vec![(home, self.threshold * self.influence_of(home))];
        for (a, b, neighbor) in self.partition.instance(home).cell_edges() {
            let Some(neighbor) = neighbor else {
                continue;
            };
            let distance = point_segment_distance(p, a, b);
            if distance >= self.threshold {
                continue;
            }
            let weight = (self.threshold - distance) * self.influence_of(neighbor);
            match weights.iter_mut().find(|(i, _)| *i == neighbor) {
                Some((_, w)) => *w = w.max(weight),
                None => weights.push((neighbor, weight)),
            }
        }
        weights.retain(|&(_, w)| w > 0.0);
        weights
    }
}
