//! Command-line argument parsing for the Gaia terrain tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Gaia command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "gaia", about = "Procedural biome terrain generator")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of biome seeds to place.
    #[arg(long)]
    pub biomes: Option<u32>,

    /// Grid cells per side.
    #[arg(long)]
    pub subdivisions: Option<u32>,

    /// Blend radius between biomes.
    #[arg(long)]
    pub blend_threshold: Option<f64>,

    /// Number of noise octaves.
    #[arg(long)]
    pub octaves: Option<u32>,

    /// Skip octave noise and show base altitudes only.
    #[arg(long)]
    pub flat_preview: Option<bool>,

    /// Worker threads for vertex loops (0 = all cores).
    #[arg(long)]
    pub threads: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(count) = args.biomes {
            self.terrain.biome_count = count;
        }
        if let Some(subdivisions) = args.subdivisions {
            self.terrain.subdivisions = subdivisions;
        }
        if let Some(threshold) = args.blend_threshold {
            self.terrain.blend_threshold = threshold;
        }
        if let Some(octaves) = args.octaves {
            self.terrain.octaves = octaves;
        }
        if let Some(flat) = args.flat_preview {
            self.terrain.flat_preview = flat;
        }
        if let Some(threads) = args.threads {
            self.terrain.worker_threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(77),
            biomes: Some(40),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.terrain.seed, 77);
        assert_eq!(config.terrain.biome_count, 40);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.terrain.subdivisions, 50);
        assert_eq!(config.terrain.octaves, 4);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "gaia",
            "--seed",
            "5",
            "--blend-threshold",
            "12.5",
            "--flat-preview",
            "true",
        ]);
        assert_eq!(args.seed, Some(5));
        assert_eq!(args.blend_threshold, Some(12.5));
        assert_eq!(args.flat_preview, Some(true));
        assert!(args.config.is_none());
    }
}
