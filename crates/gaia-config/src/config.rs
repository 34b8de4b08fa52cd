//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use gaia_terrain::{BiomeCatalog, BiomeKind, TerrainConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Default config directory: `<platform config dir>/gaia`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gaia"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Terrain generation parameters.
    pub terrain: TerrainConfig,
    /// Biome catalog, in placement order.
    pub biomes: Vec<BiomeKind>,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log the per-stage rebuild report after every rebuild.
    pub log_rebuild_report: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terrain: TerrainConfig::default(),
            biomes: BiomeCatalog::standard().iter().cloned().collect(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_rebuild_report: true,
        }
    }
}

// --- Validation ---

impl Config {
    /// Builds the biome catalog described by `biomes`.
    pub fn catalog(&self) -> Result<BiomeCatalog, ConfigError> {
        let catalog = BiomeCatalog::from_kinds(self.biomes.iter().cloned())
            .map_err(gaia_terrain::TerrainError::from)?;
        catalog.validate().map_err(gaia_terrain::TerrainError::from)?;
        Ok(catalog)
    }

    /// Checks the terrain parameters and the biome catalog.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate()?;
        self.catalog()?;
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    fn read(config_path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(config_path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    ///
    /// A changed file that fails validation is reported as an error and the
    /// caller keeps its current config.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            new_config.validate()?;
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
