use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::dataset::ImageExtensions;
use crate::core::split::SplitOptions;
use crate::error::ConfigError;

/// Application configuration.
///
/// Model and label locations are always configured here rather than baked
/// into the code, since the class-index order must match whatever model is
/// being served.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub split: SplitSettings,
    pub classifier: ClassifierSettings,
    /// Directory for timestamped log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSettings {
    pub val_ratio: f64,
    pub seed: Option<u64>,
    pub workers: usize,
    pub extensions: Vec<String>,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            val_ratio: 0.2,
            seed: None,
            workers: 4,
            extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
        }
    }
}

impl SplitSettings {
    pub fn to_options(&self) -> SplitOptions {
        SplitOptions {
            val_ratio: self.val_ratio,
            seed: self.seed,
            extensions: ImageExtensions::new(&self.extensions),
            workers: self.workers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// JSON array of labels in training-time class index order
    pub labels_path: Option<PathBuf>,
    /// JSON object mapping label to plant details
    pub plant_info_path: Option<PathBuf>,
    /// Side length of the square model input
    pub image_size: u32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            labels_path: None,
            plant_info_path: None,
            image_size: 224,
        }
    }
}

/// A loaded configuration and where it came from.
///
/// Loading happens before logging is set up, so anything worth reporting is
/// carried here and logged by the caller afterwards.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// File the settings were read from; `None` when defaults are in use
    pub path: Option<PathBuf>,
    /// Why the default config file was passed over, if it was
    pub fallback: Option<String>,
}

impl LoadedConfig {
    pub fn log_outcome(&self) {
        match (&self.path, &self.fallback) {
            (_, Some(reason)) => warn!("{}", reason),
            (Some(path), None) => info!("Loaded config from {:?}", path),
            (None, None) => info!("No config file found. Using defaults."),
        }
    }
}

impl AppConfig {
    /// Default config location, e.g. `~/.config/plant-classifier/config.json`
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "plant-classifier")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load from an explicit path. A missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let config: AppConfig = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given. Otherwise try the default location and fall
    /// back to defaults when it is absent or unusable.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        Self::load_with_default(explicit, Self::default_path())
    }

    fn load_with_default(
        explicit: Option<&Path>,
        default_path: Option<PathBuf>,
    ) -> Result<LoadedConfig, ConfigError> {
        if let Some(path) = explicit {
            return Ok(LoadedConfig {
                config: Self::load_from(path)?,
                path: Some(path.to_path_buf()),
                fallback: None,
            });
        }

        let (config, path, fallback) = match default_path {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => (config, Some(path), None),
                Err(e) => (Self::default(), None, Some(format!("{}. Using defaults.", e))),
            },
            Some(_) => (Self::default(), None, None),
            None => (
                Self::default(),
                None,
                Some("Could not determine config directory. Using defaults.".to_string()),
            ),
        };
        Ok(LoadedConfig {
            config,
            path,
            fallback,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.split
            .to_options()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.classifier.image_size == 0 {
            return Err(ConfigError::Invalid(
                "classifier.image_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
