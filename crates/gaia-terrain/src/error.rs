//! Terrain generation error types.

use crate::biome::CatalogError;

/// Errors reported by the terrain pipeline.
///
/// Configuration problems are detected eagerly at rebuild entry and returned to
/// the caller. [`TerrainError::DegenerateGeometry`] is produced by the blending
/// helpers and recovered per vertex; it never aborts a rebuild.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// A configuration value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The biome catalog cannot be used for placement.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Zero total weight or a similar geometric degeneracy.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

impl TerrainError {
    /// Returns `true` for errors the caller has to fix in its configuration
    /// or catalog before retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Catalog(_))
    }
}
