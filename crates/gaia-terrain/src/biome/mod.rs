//! Biome system: kind definitions and the ordered catalog they live in.

mod catalog;
mod kind;

pub use catalog::{BiomeCatalog, CatalogError};
pub use kind::{BiomeKind, BiomeTag, Rgb};
