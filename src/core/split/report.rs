use serde::Serialize;
use std::path::PathBuf;

use crate::core::dataset::DatasetSplit;

/// A single file that could not be placed in its assigned split.
#[derive(Debug, Clone, Serialize)]
pub struct CopyFailure {
    pub class_name: String,
    pub split: DatasetSplit,
    pub source: PathBuf,
    pub cause: String,
}

/// Outcome for one class.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassReport {
    pub class_name: String,
    /// Images assigned to train
    pub train_planned: usize,
    /// Images assigned to val
    pub val_planned: usize,
    pub train_copied: usize,
    pub val_copied: usize,
    pub failures: Vec<CopyFailure>,
    /// Set when the class directory itself could not be listed
    pub error: Option<String>,
    /// Cancellation stopped this class before all its files were handled
    pub interrupted: bool,
}

impl ClassReport {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Default::default()
        }
    }

    pub fn planned(&self, split: DatasetSplit) -> usize {
        match split {
            DatasetSplit::Train => self.train_planned,
            DatasetSplit::Val => self.val_planned,
        }
    }

    pub fn copied(&self, split: DatasetSplit) -> usize {
        match split {
            DatasetSplit::Train => self.train_copied,
            DatasetSplit::Val => self.val_copied,
        }
    }

    pub fn total_images(&self) -> usize {
        self.train_planned + self.val_planned
    }

    pub(crate) fn record_copied(&mut self, split: DatasetSplit) {
        match split {
            DatasetSplit::Train => self.train_copied += 1,
            DatasetSplit::Val => self.val_copied += 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
            && !self.interrupted
            && self.failures.is_empty()
            && self.train_copied == self.train_planned
            && self.val_copied == self.val_planned
    }
}

/// Result of a split run.
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub train_dir: PathBuf,
    pub val_dir: PathBuf,
    pub val_ratio: f64,
    pub seed: Option<u64>,
    /// Sorted by class name
    pub classes: Vec<ClassReport>,
    pub cancelled: bool,
}

impl SplitReport {
    pub fn class(&self, name: &str) -> Option<&ClassReport> {
        self.classes.iter().find(|c| c.class_name == name)
    }

    pub fn total_planned(&self, split: DatasetSplit) -> usize {
        self.classes.iter().map(|c| c.planned(split)).sum()
    }

    pub fn total_copied(&self, split: DatasetSplit) -> usize {
        self.classes.iter().map(|c| c.copied(split)).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CopyFailure> {
        self.classes.iter().flat_map(|c| c.failures.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.classes.iter().map(|c| c.failures.len()).sum()
    }

    pub fn class_errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.classes
            .iter()
            .filter_map(|c| c.error.as_deref().map(|e| (c.class_name.as_str(), e)))
    }

    /// True when the run was not cancelled and every planned file was copied.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.classes.iter().all(ClassReport::is_complete)
    }
}
