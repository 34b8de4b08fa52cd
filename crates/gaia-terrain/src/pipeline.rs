//! The terrain pipeline: staged rebuilds with minimal recomputation and
//! lock-free publication of completed meshes.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwapOption;

use crate::biome::BiomeCatalog;
use crate::color::{SnowLayer, blend_biome_color};
use crate::config::{Stage, TerrainConfig, TerrainConfigPatch};
use crate::error::TerrainError;
use crate::geometry::Bounds;
use crate::height::{BlendedParameters, HeightParams, HeightSampler};
use crate::influence::{InfluenceMap, InfluenceResolver};
use crate::mesh::{GridLayout, MeshBuffer};
use crate::noise_source::NoiseFields;
use crate::parallel::{par_map, worker_count};
use crate::partition::Partition;
use crate::placement::place_seeds;
use crate::random::SeededRandom;

/// Whether the published mesh reflects the current configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Stale,
    Fresh,
}

/// Summary of the most recent refresh.
#[derive(Clone, Debug, PartialEq)]
pub struct RebuildReport {
    /// First stage that was recomputed, `None` when nothing had changed.
    pub recomputed_from: Option<Stage>,
    /// Vertices whose blend weights degenerated and fell back to home-only.
    pub degenerate_vertices: usize,
    pub vertex_count: usize,
    pub elapsed_us: u64,
}

/// Cloneable read handle on the latest published mesh.
///
/// Readers on other threads always observe either the previous complete
/// buffer or the new complete buffer.
#[derive(Clone, Debug, Default)]
pub struct MeshReader {
    slot: Arc<ArcSwapOption<MeshBuffer>>,
}

impl MeshReader {
    /// Latest completed mesh, if any rebuild has finished.
    pub fn load(&self) -> Option<Arc<MeshBuffer>> {
        self.slot.load_full()
    }
}

/// Owns the configuration, catalog and every intermediate product of one
/// terrain. Several pipelines can coexist; they share nothing.
pub struct TerrainPipeline {
    config: TerrainConfig,
    catalog: BiomeCatalog,
    noise: NoiseFields,
    state: PipelineState,
    /// Earliest stage that has to be recomputed on the next refresh.
    dirty: Option<Stage>,
    partition: Option<Partition>,
    influences: Option<InfluenceMap>,
    elevations: Vec<f64>,
    published: MeshReader,
    last_report: Option<RebuildReport>,
}

impl TerrainPipeline {
    /// Creates a stale pipeline. Nothing is generated until the first
    /// [`refresh`](Self::refresh) or [`rebuild`](Self::rebuild).
    ///
    /// # Errors
    ///
    /// Configuration or catalog errors.
    pub fn new(config: TerrainConfig, catalog: BiomeCatalog) -> Result<Self, TerrainError> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self {
            noise: NoiseFields::from_seed(config.seed),
            config,
            catalog,
            state: PipelineState::Stale,
            dirty: Some(Stage::Placement),
            partition: None,
            influences: None,
            elevations: Vec::new(),
            published: MeshReader::default(),
            last_report: None,
        })
    }

    /// Replaces the whole configuration and refreshes synchronously.
    ///
    /// Only the stages affected by the differences are recomputed. On error
    /// the previous configuration is kept.
    pub fn rebuild(&mut self, config: TerrainConfig) -> Result<Arc<MeshBuffer>, TerrainError> {
        self.update(TerrainConfigPatch::from(config))
    }

    /// Merges `patch` into the configuration and marks the affected stages
    /// stale without recomputing anything.
    ///
    /// Returns the earliest affected stage. On a validation error the
    /// configuration is left unchanged.
    pub fn apply(&mut self, patch: TerrainConfigPatch) -> Result<Option<Stage>, TerrainError> {
        let mut candidate = self.config.clone();
        let changed = candidate.merge(&patch);
        candidate.validate()?;
        self.config = candidate;
        if let Some(stage) = changed {
            self.invalidate(stage);
        }
        Ok(changed)
    }

    /// [`apply`](Self::apply) followed by [`refresh`](Self::refresh).
    pub fn update(&mut self, patch: TerrainConfigPatch) -> Result<Arc<MeshBuffer>, TerrainError> {
        self.apply(patch)?;
        self.refresh()
    }

    /// Swaps the biome catalog. Placement is redone on the next refresh.
    pub fn set_catalog(&mut self, catalog: BiomeCatalog) -> Result<(), TerrainError> {
        catalog.validate()?;
        self.catalog = catalog;
        self.invalidate(Stage::Placement);
        Ok(())
    }

    fn invalidate(&mut self, stage: Stage) {
        self.dirty = Some(self.dirty.map_or(stage, |d| d.min(stage)));
        self.state = PipelineState::Stale;
    }

    /// Recomputes every stale stage, publishes the new mesh and returns it.
    ///
    /// When the pipeline is already fresh the current mesh is returned as is.
    pub fn refresh(&mut self) -> Result<Arc<MeshBuffer>, TerrainError> {
        let start = Instant::now();
        let from = match (self.dirty, self.published.load()) {
            (None, Some(mesh)) => {
                self.state = PipelineState::Fresh;
                self.last_report = Some(RebuildReport {
                    recomputed_from: None,
                    degenerate_vertices: self.degenerate_vertices(),
                    vertex_count: mesh.len(),
                    elapsed_us: start.elapsed().as_micros() as u64,
                });
                return Ok(mesh);
            }
            (Some(stage), _) => stage,
            (None, None) => Stage::Placement,
        };

        let threads = worker_count(self.config.worker_threads);
        tracing::debug!(
            "Refreshing terrain from {} stage on {threads} threads",
            from.name()
        );

        if from <= Stage::Placement {
            self.run_placement()?;
        }
        if from <= Stage::Influence {
            self.run_influence(threads)?;
        }
        if from <= Stage::Height {
            self.run_height(threads)?;
        }
        let mesh = Arc::new(self.run_color(threads)?);

        self.published.slot.store(Some(Arc::clone(&mesh)));
        self.dirty = None;
        self.state = PipelineState::Fresh;

        let report = RebuildReport {
            recomputed_from: Some(from),
            degenerate_vertices: self.degenerate_vertices(),
            vertex_count: mesh.len(),
            elapsed_us: start.elapsed().as_micros() as u64,
        };
        if report.degenerate_vertices > 0 {
            tracing::warn!(
                "{} vertices had degenerate blend weights and use their home biome only",
                report.degenerate_vertices
            );
        }
        tracing::info!(
            "Terrain rebuilt from {} stage: {} vertices in {} us",
            from.name(),
            report.vertex_count,
            report.elapsed_us
        );
        self.last_report = Some(report);
        Ok(mesh)
    }

    fn domain(&self) -> Bounds {
        Bounds::centered(self.config.terrain_width, self.config.terrain_height)
    }

    fn layout(&self) -> GridLayout {
        GridLayout::new(self.domain(), self.config.subdivisions)
    }

    fn run_placement(&mut self) -> Result<(), TerrainError> {
        let start = Instant::now();
        let mut rng = SeededRandom::new(self.config.seed);
        let seeds = place_seeds(
            &self.catalog,
            self.domain(),
            self.config.biome_count as usize,
            &mut rng,
        )?;
        let partition = Partition::build(&seeds, self.domain(), self.config.partition_margin)?;
        self.noise = NoiseFields::from_seed(self.config.seed);
        tracing::debug!(
            "Placed {} biomes in {:.2} ms",
            partition.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.partition = Some(partition);
        Ok(())
    }

    fn run_influence(&mut self, threads: usize) -> Result<(), TerrainError> {
        let start = Instant::now();
        let partition = self.partition_ready()?;
        let layout = self.layout();
        let resolver = InfluenceResolver::new(
            partition,
            &self.catalog,
            self.config.blend_strategy,
            self.config.blend_threshold,
            &self.noise.perturbation,
            self.config.noise_frequency,
            self.config.noise_amplitude,
        );
        let resolved = par_map(layout.vertex_count(), threads, |i| {
            resolver.resolve(layout.position_of(i), &mut Vec::new())
        });
        let degenerate = resolved.iter().filter(|(_, d)| *d).count();
        let vertices = resolved.into_iter().map(|(v, _)| v).collect();
        tracing::debug!(
            "Resolved influences for {} vertices in {:.2} ms",
            layout.vertex_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.influences = Some(InfluenceMap {
            vertices,
            degenerate,
        });
        Ok(())
    }

    fn run_height(&mut self, threads: usize) -> Result<(), TerrainError> {
        let start = Instant::now();
        let partition = self.partition_ready()?;
        let influences = self.influences_ready()?;
        let layout = self.layout();
        let sampler = HeightSampler::new(&self.noise.elevation, HeightParams::from(&self.config));
        let catalog = &self.catalog;
        let elevations = par_map(layout.vertex_count(), threads, |i| {
            let blended =
                BlendedParameters::from_influence(&influences.vertices[i], partition, catalog);
            let p = layout.position_of(i);
            sampler.sample(p.x, p.y, &blended)
        });
        tracing::debug!(
            "Synthesized heights in {:.2} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        self.elevations = elevations;
        Ok(())
    }

    fn run_color(&self, threads: usize) -> Result<MeshBuffer, TerrainError> {
        let start = Instant::now();
        let partition = self.partition_ready()?;
        let influences = self.influences_ready()?;
        let layout = self.layout();
        let snow = SnowLayer::new(&self.config.snow, &self.noise.snow);
        let colors = par_map(layout.vertex_count(), threads, |i| {
            let base = blend_biome_color(&influences.vertices[i], partition, &self.catalog);
            let p = layout.position_of(i);
            snow.apply(base, p.x, p.y, self.elevations[i]).to_array()
        });
        let mesh = MeshBuffer::from_grid(layout, &self.elevations, colors);
        tracing::debug!(
            "Colored mesh in {:.2} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(mesh)
    }

    fn partition_ready(&self) -> Result<&Partition, TerrainError> {
        self.partition
            .as_ref()
            .ok_or_else(|| TerrainError::Configuration("placement has not run".into()))
    }

    fn influences_ready(&self) -> Result<&InfluenceMap, TerrainError> {
        self.influences
            .as_ref()
            .ok_or_else(|| TerrainError::Configuration("influence has not run".into()))
    }

    fn degenerate_vertices(&self) -> usize {
        self.influences.as_ref().map_or(0, |i| i.degenerate)
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Earliest stage the next refresh will recompute.
    pub fn pending_stage(&self) -> Option<Stage> {
        self.dirty
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn catalog(&self) -> &BiomeCatalog {
        &self.catalog
    }

    pub fn partition(&self) -> Option<&Partition> {
        self.partition.as_ref()
    }

    pub fn influences(&self) -> Option<&InfluenceMap> {
        self.influences.as_ref()
    }

    /// Handle renderers keep to pick up new meshes.
    pub fn reader(&self) -> MeshReader {
        self.published.clone()
    }

    pub fn current(&self) -> Option<Arc<MeshBuffer>> {
        self.published.load()
    }

    pub fn last_report(&self) -> Option<&RebuildReport> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            terrain_width: 100.0,
            terrain_height: 100.0,
            subdivisions: 10,
            biome_count: 5,
            blend_threshold: 15.0,
            seed: 3,
            worker_threads: 1,
            ..Default::default()
        }
    }

    fn pipeline() -> TerrainPipeline {
        TerrainPipeline::new(small_config(), BiomeCatalog::standard()).unwrap()
    }

    #[test]
    fn test_new_pipeline_is_stale_and_empty() {
        let p = pipeline();
        assert_eq!(p.state(), PipelineState::Stale);
        assert!(p.current().is_none());
        assert_eq!(p.pending_stage(), Some(Stage::Placement));
    }

    #[test]
    fn test_refresh_publishes_fresh_mesh() {
        let mut p = pipeline();
        let mesh = p.refresh().unwrap();
        assert_eq!(p.state(), PipelineState::Fresh);
        assert_eq!(mesh.len(), 11 * 11);
        assert!(Arc::ptr_eq(&mesh, &p.current().unwrap()));
        let report = p.last_report().unwrap();
        assert_eq!(report.recomputed_from, Some(Stage::Placement));
        assert_eq!(report.vertex_count, 121);
    }

    #[test]
    fn test_apply_marks_stale_without_rebuilding() {
        let mut p = pipeline();
        let before = p.refresh().unwrap();
        let stage = p
            .apply(TerrainConfigPatch {
                octaves: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(stage, Some(Stage::Height));
        assert_eq!(p.state(), PipelineState::Stale);
        assert!(Arc::ptr_eq(&before, &p.current().unwrap()));
    }

    #[test]
    fn test_height_change_skips_earlier_stages() {
        let mut p = pipeline();
        p.refresh().unwrap();
        let partition_before = p.partition().unwrap().clone();
        p.update(TerrainConfigPatch {
            persistence: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            p.last_report().unwrap().recomputed_from,
            Some(Stage::Height)
        );
        assert_eq!(p.partition().unwrap().instances(), partition_before.instances());
    }

    #[test]
    fn test_invalid_patch_leaves_config_unchanged() {
        let mut p = pipeline();
        p.refresh().unwrap();
        let result = p.apply(TerrainConfigPatch {
            biome_count: Some(0),
            octaves: Some(7),
            ..Default::default()
        });
        assert!(matches!(result, Err(TerrainError::Configuration(_))));
        assert_eq!(p.config(), &small_config());
        assert_eq!(p.state(), PipelineState::Fresh);
    }

    #[test]
    fn test_refresh_when_fresh_is_noop() {
        let mut p = pipeline();
        let first = p.refresh().unwrap();
        let second = p.refresh().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(p.last_report().unwrap().recomputed_from, None);
    }

    #[test]
    fn test_set_catalog_forces_placement() {
        let mut p = pipeline();
        p.refresh().unwrap();
        let catalog = BiomeCatalog::from_kinds([crate::BiomeTag::Lake.preset()]).unwrap();
        p.set_catalog(catalog).unwrap();
        assert_eq!(p.pending_stage(), Some(Stage::Placement));
        p.refresh().unwrap();
        assert!(p.partition().unwrap().instances().iter().all(|i| i.kind == 0));
    }

    #[test]
    fn test_invalid_catalog_rejected() {
        let mut p = pipeline();
        assert!(matches!(
            p.set_catalog(BiomeCatalog::new()),
            Err(TerrainError::Catalog(_))
        ));
        assert_eq!(p.catalog(), &BiomeCatalog::standard());
    }

    #[test]
    fn test_reader_sees_latest_mesh() {
        let mut p = pipeline();
        let reader = p.reader();
        assert!(reader.load().is_none());
        let first = p.refresh().unwrap();
        assert!(Arc::ptr_eq(&first, &reader.load().unwrap()));
        let second = p
            .update(TerrainConfigPatch {
                seed: Some(99),
                ..Default::default()
            })
            .unwrap();
        assert!(Arc::ptr_eq(&second, &reader.load().unwrap()));
        assert_eq!(first.len(), 121, "old buffer stays complete");
    }
}
