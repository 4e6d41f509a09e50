use crate::artifact::ArtifactPaths;
use crate::enrich::{EnrichmentSettings, InvalidEnrichment};
use crate::pipeline::level::{
    DEFAULT_LOW_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD, InvalidThresholds, LevelThresholds,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_ARTIFACT_DIR: &str = "models";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub artifacts: Option<ArtifactsSection>,
    #[serde(default)]
    pub thresholds: Option<ThresholdsSection>,
    #[serde(default)]
    pub enrichment: Option<EnrichmentSettings>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    /// One of trace, debug, info, warn, error
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArtifactsSection {
    /// Directory holding the artifact files (default: models)
    pub dir: Option<PathBuf>,
    /// Per-artifact overrides, relative to `dir` unless absolute
    pub fault_scaler: Option<PathBuf>,
    pub fault_classifier: Option<PathBuf>,
    pub emission_preprocessor: Option<PathBuf>,
    pub emission_regressor: Option<PathBuf>,
    pub index_preprocessor: Option<PathBuf>,
    pub index_regressor: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdsSection {
    pub low: Option<f64>,
    pub medium: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Thresholds(#[from] InvalidThresholds),
    #[error(transparent)]
    Enrichment(#[from] InvalidEnrichment),
    #[error("invalid logging level: {0:?}")]
    LogLevel(String),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    config.level_thresholds()?;
    config.enrichment().validate()?;
    config.log_level()?;
    Ok(config)
}

impl Config {
    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        self.logging
            .level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.logging.level.clone()))
    }

    pub fn artifact_dir(&self) -> &Path {
        self.artifacts
            .as_ref()
            .and_then(|a| a.dir.as_deref())
            .unwrap_or(Path::new(DEFAULT_ARTIFACT_DIR))
    }

    /// Resolves the six artifact locations, applying per-file overrides.
    pub fn artifact_paths(&self) -> ArtifactPaths {
        let dir = self.artifact_dir();
        let mut paths = ArtifactPaths::in_dir(dir);
        let Some(section) = &self.artifacts else {
            return paths;
        };

        let overrides = [
            (&section.fault_scaler, &mut paths.fault_scaler),
            (&section.fault_classifier, &mut paths.fault_classifier),
            (&section.emission_preprocessor, &mut paths.emission_preprocessor),
            (&section.emission_regressor, &mut paths.emission_regressor),
            (&section.index_preprocessor, &mut paths.index_preprocessor),
            (&section.index_regressor, &mut paths.index_regressor),
        ];
        for (file, path) in overrides {
            if let Some(file) = file {
                *path = dir.join(file);
            }
        }
        paths
    }

    /// Returns the level thresholds, falling back to the fitted quantiles.
    pub fn level_thresholds(&self) -> Result<LevelThresholds, InvalidThresholds> {
        let section = self.thresholds.as_ref();
        let low = section
            .and_then(|t| t.low)
            .unwrap_or(DEFAULT_LOW_THRESHOLD);
        let medium = section
            .and_then(|t| t.medium)
            .unwrap_or(DEFAULT_MEDIUM_THRESHOLD);
        LevelThresholds::new(low, medium)
    }

    pub fn enrichment(&self) -> EnrichmentSettings {
        self.enrichment.clone().unwrap_or_default()
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}
