//! TOML configuration file loading
//!
//! Supports `~/.config/voice-cart/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Product vocabulary configuration
    #[serde(default)]
    pub vocabulary: VocabularyFileConfig,

    /// Recognition configuration
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Product list configuration
    #[serde(default)]
    pub list: ListFileConfig,

    /// Audio configuration
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Directory the file was read from, for resolving relative paths
    #[serde(skip)]
    pub source_dir: Option<PathBuf>,
}

/// Product vocabulary configuration
#[derive(Debug, Default, Deserialize)]
pub struct VocabularyFileConfig {
    /// Path to a `{"products": [...]}` JSON file
    pub products: Option<String>,
}

/// Recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    /// Recognition locale (e.g. "en-US")
    pub locale: Option<String>,

    /// Classify partial results as they arrive
    pub partial_results: Option<bool>,
}

/// Product list configuration
#[derive(Debug, Default, Deserialize)]
pub struct ListFileConfig {
    /// Drop repeated products on reconciliation
    pub dedupe: Option<bool>,
}

/// Audio configuration
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Capture from the default microphone
    pub microphone: Option<bool>,
}

impl ConfigFile {
    /// Product file path, resolved against the config file's directory
    #[must_use]
    pub fn products_path(&self) -> Option<PathBuf> {
        let raw = PathBuf::from(self.vocabulary.products.as_ref()?);
        if raw.is_absolute() {
            return Some(raw);
        }
        Some(
            self.source_dir
                .as_ref()
                .map_or_else(|| raw.clone(), |dir| dir.join(&raw)),
        )
    }
}

/// Load the TOML config file from the standard path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ConfigFile {
    let Some(path) = config_file_path() else {
        return ConfigFile::default();
    };
    load_config_file_from(&path)
}

/// Load a TOML config file from an explicit path
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file_from(path: &Path) -> ConfigFile {
    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(mut config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config.source_dir = path.parent().map(Path::to_path_buf);
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-cart/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-cart").join("config.toml"))
}
