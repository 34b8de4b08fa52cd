//! Biome catalog: ordered [`BiomeKind`] list with name-based lookup and
//! weighted kind selection.

use hashbrown::HashMap;

use super::{BiomeKind, BiomeTag};

/// Errors that make a catalog unusable for placement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// A kind with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),

    /// Placement needs at least one kind.
    #[error("biome catalog is empty")]
    Empty,

    /// Spawn weights must be finite and non-negative.
    #[error("biome {name} has invalid spawn weight {weight}")]
    InvalidSpawnWeight { name: String, weight: f64 },

    /// Blend influence must be finite and non-negative.
    #[error("biome {name} has invalid influence {influence}")]
    InvalidInfluence { name: String, influence: f64 },

    /// At least one kind must have a positive spawn weight.
    #[error("total spawn weight of the catalog is zero")]
    ZeroTotalWeight,
}

fn check_kind(kind: &BiomeKind) -> Result<(), CatalogError> {
    if !kind.spawn_weight.is_finite() || kind.spawn_weight < 0.0 {
        return Err(CatalogError::InvalidSpawnWeight {
            name: kind.name.clone(),
            weight: kind.spawn_weight,
        });
    }
    if !kind.influence.is_finite() || kind.influence < 0.0 {
        return Err(CatalogError::InvalidInfluence {
            name: kind.name.clone(),
            influence: kind.influence,
        });
    }
    Ok(())
}

/// Ordered list of biome kinds. Instances refer to kinds by index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BiomeCatalog {
    kinds: Vec<BiomeKind>,
    name_to_index: HashMap<String, usize>,
}

impl BiomeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The five built-in kinds: lake, plain, mountain, forest, grassland.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for tag in BiomeTag::BUILT_IN {
            catalog.kinds.push(tag.preset());
        }
        catalog.reindex();
        catalog
    }

    /// Builds a catalog from an ordered list of kinds.
    ///
    /// # Errors
    ///
    /// Fails on duplicate names or invalid spawn weights.
    pub fn from_kinds(kinds: impl IntoIterator<Item = BiomeKind>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for kind in kinds {
            catalog.register(kind)?;
        }
        Ok(catalog)
    }

    /// Appends a kind, returning its index.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] if the name is taken, and
    /// [`CatalogError::InvalidSpawnWeight`] or [`CatalogError::InvalidInfluence`]
    /// for negative or non-finite factors.
    pub fn register(&mut self, kind: BiomeKind) -> Result<usize, CatalogError> {
        if self.name_to_index.contains_key(&kind.name) {
            return Err(CatalogError::DuplicateName(kind.name));
        }
        check_kind(&kind)?;
        let index = self.kinds.len();
        self.name_to_index.insert(kind.name.clone(), index);
        self.kinds.push(kind);
        Ok(index)
    }

    /// Returns the kind at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get(&self, index: usize) -> &BiomeKind {
        &self.kinds[index]
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiomeKind> {
        self.kinds.iter()
    }

    pub fn total_spawn_weight(&self) -> f64 {
        self.kinds.iter().map(|k| k.spawn_weight).sum()
    }

    /// Checks the catalog can be used for placement.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.kinds.is_empty() {
            return Err(CatalogError::Empty);
        }
        for kind in &self.kinds {
            check_kind(kind)?;
        }
        if self.total_spawn_weight() <= 0.0 {
            return Err(CatalogError::ZeroTotalWeight);
        }
        Ok(())
    }

    /// Weighted kind selection from a uniform draw `unit` in `[0, 1)`.
    ///
    /// Scales the draw to `[0, total)` and returns the first kind whose
    /// cumulative weight exceeds it. Kinds with zero weight are never picked.
    /// Call [`validate`](Self::validate) first.
    pub fn pick(&self, unit: f64) -> usize {
        let r = unit * self.total_spawn_weight();
        let mut cumulative = 0.0;
        for (index, kind) in self.kinds.iter().enumerate() {
            cumulative += kind.spawn_weight;
            if r < cumulative {
                return index;
            }
        }
        // Rounding can leave r == total; fall back to the last spawnable kind.
        self.kinds
            .iter()
            .rposition(|k| k.spawn_weight > 0.0)
            .unwrap_or(0)
    }

    fn reindex(&mut self) {
        self.name_to_index = self
            .kinds
            .iter()
            .enumerate()
            .map(|(i, k)| (k.name.clone(), i))
            .collect();
    }
}
