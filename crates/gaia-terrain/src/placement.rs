//! Biome seed placement: uniform seed positions with weighted kind selection.

use glam::DVec2;

use crate::biome::BiomeCatalog;
use crate::error::TerrainError;
use crate::geometry::Bounds;
use crate::random::RandomSource;

/// A seed drawn for one biome instance, before partitioning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeedPlacement {
    /// Index into the [`BiomeCatalog`].
    pub kind: usize,
    pub position: DVec2,
}

/// Draws `count` seeds uniformly over `domain`, each with a kind picked by
/// spawn weight.
///
/// Per seed the draw order is: kind, x, y.
///
/// # Errors
///
/// [`TerrainError::Configuration`] when `count` is zero or the domain has a
/// non-positive or non-finite extent; catalog errors when the catalog cannot
/// be sampled.
pub fn place_seeds(
    catalog: &BiomeCatalog,
    domain: Bounds,
    count: usize,
    rng: &mut dyn RandomSource,
) -> Result<Vec<SeedPlacement>, TerrainError> {
    if count < 1 {
        return Err(TerrainError::Configuration(
            "biome count must be at least 1".into(),
        ));
    }
    let size = domain.size();
    if !(size.x > 0.0 && size.y > 0.0 && size.is_finite()) {
        return Err(TerrainError::Configuration(format!(
            "placement domain must have positive extent, got {}x{}",
            size.x, size.y
        )));
    }
    catalog.validate()?;

    let seeds = (0..count)
        .map(|_| {
            let kind = catalog.pick(rng.next_unit());
            let x = domain.min.x + rng.next_unit() * size.x;
            let y = domain.min.y + rng.next_unit() * size.y;
            SeedPlacement {
                kind,
                position: DVec2::new(x, y),
            }
        })
        .collect();
    Ok(seeds)
}
