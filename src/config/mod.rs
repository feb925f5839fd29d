mod app_config;

pub use app_config::{AppConfig, ClassifierSettings, LoadedConfig, SplitSettings};
