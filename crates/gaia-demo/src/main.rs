//! Headless terrain driver: loads the config, generates a terrain and logs a
//! summary of what was built.

use std::process::ExitCode;

use clap::Parser;
use gaia_config::{CliArgs, Config, default_config_dir};
use gaia_terrain::{
    MeshBuffer, RebuildReport, Stage, TerrainConfig, TerrainConfigPatch, TerrainPipeline,
};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| std::path::PathBuf::from(".gaia"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    gaia_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Terrain generation failed: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = config.catalog()?;
    info!(
        "Catalog: {}",
        catalog
            .iter()
            .map(|k| format!("{} (weight {})", k.name, k.spawn_weight))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut pipeline = TerrainPipeline::new(config.terrain.clone(), catalog)?;
    let mesh = pipeline.refresh()?;
    summarize(&pipeline, &mesh, config.debug.log_rebuild_report);

    // A height-only change keeps placement and blending.
    let mesh = pipeline.update(TerrainConfigPatch {
        octaves: Some(config.terrain.octaves + 1),
        ..Default::default()
    })?;
    summarize(&pipeline, &mesh, config.debug.log_rebuild_report);

    if let Some(report) = pipeline.last_report()
        && !is_height_only(report)
    {
        warn!(
            "Octave change recomputed from {:?}, expected the height stage",
            report.recomputed_from
        );
    }

    // Same configuration again: nothing to recompute.
    let unchanged: TerrainConfig = pipeline.config().clone();
    pipeline.rebuild(unchanged)?;
    if let Some(report) = pipeline.last_report() {
        info!("Idempotent rebuild recomputed {:?}", report.recomputed_from);
    }
    Ok(())
}

fn is_height_only(report: &RebuildReport) -> bool {
    report.recomputed_from == Some(Stage::Height)
}

fn summarize(pipeline: &TerrainPipeline, mesh: &MeshBuffer, log_report: bool) {
    let (min_z, max_z) = mesh
        .positions
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[2]), hi.max(p[2]))
        });
    info!(
        "Mesh: {} vertices, {} triangles, elevation {min_z:.2}..{max_z:.2}",
        mesh.len(),
        mesh.triangle_indices().len() / 3
    );

    if let Some(partition) = pipeline.partition() {
        let catalog = pipeline.catalog();
        let mut counts = vec![0usize; catalog.len()];
        for instance in partition.instances() {
            counts[instance.kind] += 1;
        }
        let placed: Vec<String> = catalog
            .iter()
            .zip(&counts)
            .filter(|(_, n)| **n > 0)
            .map(|(k, n)| format!("{n} {}", k.name))
            .collect();
        info!("Biomes: {}", placed.join(", "));
    }

    if log_report && let Some(report) = pipeline.last_report() {
        log_rebuild_report(report);
    }
}

fn log_rebuild_report(report: &RebuildReport) {
    info!(
        recomputed_from = ?report.recomputed_from,
        degenerate = report.degenerate_vertices,
        vertices = report.vertex_count,
        elapsed_us = report.elapsed_us,
        "Rebuild report"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_small_terrain() {
        let mut config = Config::default();
        config.terrain.subdivisions = 8;
        config.terrain.biome_count = 4;
        assert!(run(&config).is_ok());
    }

    #[test]
    fn test_height_only_check() {
        let report = RebuildReport {
            recomputed_from: Some(Stage::Placement),
            degenerate_vertices: 0,
            vertex_count: 25,
            elapsed_us: 1,
        };
        assert!(!is_height_only(&report));
        assert!(is_height_only(&RebuildReport {
            recomputed_from: Some(Stage::Height),
            ..report
        }));
    }
}
