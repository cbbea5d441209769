//! Optional project-local configuration.
//!
//! Read from `.spam-detector.toml`, searched from the working directory up
//! through its parents. Every field is optional; anything missing falls back
//! to the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::loader::{
    DEFAULT_CLASSIFIER_FILE, DEFAULT_MODEL_DIR, DEFAULT_VECTORIZER_FILE, ModelPaths,
};

pub const CONFIG_FILE_NAME: &str = ".spam-detector.toml";
pub const DEFAULT_PARTICLES: usize = 120;
pub const MAX_PARTICLES: usize = 10_000;
pub const DEFAULT_TICK_MS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub animation: AnimationConfig,
    pub logging: LoggingConfig,
}

/// Location of the model artifacts.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding both artifacts. A relative path is taken relative to
    /// the config file; without a config file, to the working directory.
    pub dir: Option<PathBuf>,
    /// Classifier file name inside `dir`.
    pub classifier: Option<String>,
    /// Vectorizer file name inside `dir`.
    pub vectorizer: Option<String>,
}

/// Background animation settings.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub particles: Option<usize>,
    pub tick_ms: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: Option<String>,
}

/// A configuration together with where it came from and what was wrong with it.
#[derive(Debug, Default)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
    /// Problems found while loading. Logging is not set up yet at that point,
    /// so they are reported by the caller.
    pub warnings: Vec<String>,
}

impl AppConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load and parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Drops out-of-range values so their defaults apply, describing each one.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        match self.animation.particles {
            Some(0) => {
                warnings.push(format!(
                    "animation.particles must be at least 1, using {}",
                    DEFAULT_PARTICLES
                ));
                self.animation.particles = None;
            }
            Some(n) if n > MAX_PARTICLES => {
                warnings.push(format!(
                    "animation.particles must be at most {}, using {}",
                    MAX_PARTICLES, DEFAULT_PARTICLES
                ));
                self.animation.particles = None;
            }
            _ => {}
        }
        if self.animation.tick_ms == Some(0) {
            warnings.push(format!(
                "animation.tick_ms must be at least 1, using {}",
                DEFAULT_TICK_MS
            ));
            self.animation.tick_ms = None;
        }
        for (key, value) in [
            ("models.classifier", &mut self.models.classifier),
            ("models.vectorizer", &mut self.models.vectorizer),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                warnings.push(format!("{} must not be empty, using the default", key));
                *value = None;
            }
        }
        warnings
    }

    /// Anchors a relative `models.dir` at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(dir) = self.models.dir.as_mut().filter(|d| d.is_relative()) {
            *dir = base.join(&*dir);
        }
    }

    pub fn model_paths(&self) -> ModelPaths {
        let dir = self
            .models
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_DIR));
        ModelPaths::new(
            dir,
            self.models
                .classifier
                .as_deref()
                .unwrap_or(DEFAULT_CLASSIFIER_FILE),
            self.models
                .vectorizer
                .as_deref()
                .unwrap_or(DEFAULT_VECTORIZER_FILE),
        )
    }

    pub fn particle_count(&self) -> usize {
        self.animation.particles.unwrap_or(DEFAULT_PARTICLES)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.animation.tick_ms.unwrap_or(DEFAULT_TICK_MS))
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Finds and loads the project config. Never fails: a missing file gives the
/// defaults, and a broken one gives the defaults plus a warning.
pub fn load() -> LoadedConfig {
    match std::env::current_dir() {
        Ok(cwd) => load_from(&cwd),
        Err(e) => LoadedConfig {
            warnings: vec![format!("cannot determine working directory: {}", e)],
            ..LoadedConfig::default()
        },
    }
}

/// Like [`load`], searching upward from `start`.
pub fn load_from(start: &Path) -> LoadedConfig {
    let Some(path) = find_config_in_parents(start) else {
        return LoadedConfig::default();
    };
    match AppConfig::from_file(&path) {
        Ok(mut config) => {
            let warnings = config.sanitize();
            if let Some(base) = path.parent() {
                config.resolve_paths(base);
            }
            LoadedConfig {
                config,
                source: Some(path),
                warnings,
            }
        }
        Err(e) => LoadedConfig {
            warnings: vec![e.to_string()],
            ..LoadedConfig::default()
        },
    }
}

/// Search for the config file in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.is_file() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}
