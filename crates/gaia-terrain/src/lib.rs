//! Procedural biome terrain: seeded biome placement, Voronoi partition,
//! cross-biome blending, multi-octave elevation and vertex coloring.

mod color;
mod config;
mod error;
mod geometry;
mod height;
mod influence;
mod mesh;
mod noise_source;
mod parallel;
mod partition;
mod pipeline;
mod placement;
mod random;
mod seed_grid;

pub mod biome;

pub use biome::{BiomeCatalog, BiomeKind, BiomeTag, CatalogError, Rgb};
pub use color::{SnowLayer, blend_biome_color};
pub use config::{
    BlendStrategy, FieldSpec, SnowConfig, Stage, TerrainConfig, TerrainConfigPatch,
};
pub use error::TerrainError;
pub use geometry::{Bounds, point_segment_distance, polygon_area, polygon_contains};
pub use height::{BlendedParameters, HeightParams, HeightSampler};
pub use influence::{
    InfluenceMap, InfluenceResolver, VertexInfluence, WEIGHT_SUM_TOLERANCE, normalize,
    weighted_average,
};
pub use mesh::{GridLayout, MeshBuffer, TerrainVertex};
pub use noise_source::{NoiseFields, NoiseSource};
pub use partition::{BiomeInstance, Partition};
pub use pipeline::{MeshReader, PipelineState, RebuildReport, TerrainPipeline};
pub use placement::{SeedPlacement, place_seeds};
pub use random::{RandomSource, SeededRandom};
