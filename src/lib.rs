//! Dataset preparation and classification support for plant species models.
//!
//! - [`core`]: train/validation splitting of a class-per-directory image
//!   collection, plus balance analysis of an existing split tree
//! - [`classify`]: preprocessing, label mapping and plant details around an
//!   injected [`classify::Classifier`]
//! - [`config`], [`logging`]: ambient setup shared by the CLI

pub mod classify;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use crate::core::split::{split, DatasetSplitter, SplitOptions, SplitReport};
pub use crate::error::{ClassifyError, ConfigError, SplitError};
