use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::core::dataset::discover_classes;
use crate::error::{ClassifyError, ClassifyResult, SplitResult};

/// Ordered class labels: entry `i` is the label for model output index `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> ClassifyResult<Self> {
        if labels.is_empty() {
            return Err(ClassifyError::EmptyLabelTable);
        }
        Ok(Self { labels })
    }

    /// Load a JSON array of label strings
    pub fn load(path: &Path) -> ClassifyResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ClassifyError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let labels: Vec<String> = serde_json::from_str(&contents).map_err(|e| ClassifyError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Loaded {} labels from {:?}", labels.len(), path);
        Self::new(labels)
    }

    /// Labels in the order training tools assign indices: class directory
    /// names sorted lexicographically.
    pub fn class_order_of(train_dir: &Path) -> SplitResult<Vec<String>> {
        Ok(discover_classes(train_dir, None)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Compare the table against the class directories of a training tree.
    pub fn verify_against_dir(&self, train_dir: &Path) -> SplitResult<LabelCheck> {
        let on_disk = Self::class_order_of(train_dir)?;
        let check = LabelCheck::compare(&self.labels, &on_disk);
        if check.is_consistent() {
            info!("Label table matches {} classes in {:?}", on_disk.len(), train_dir);
        } else {
            warn!(
                "Label table does not match {:?}: {} missing on disk, {} missing from table, {} misplaced",
                train_dir,
                check.missing_on_disk.len(),
                check.missing_from_table.len(),
                check.misplaced.len()
            );
        }
        Ok(check)
    }
}

/// A label whose table index differs from its position among the sorted
/// class directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MisplacedLabel {
    pub label: String,
    pub table_index: usize,
    pub expected_index: usize,
}

/// Result of comparing a label table with a training tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelCheck {
    /// In the table but not a class directory
    pub missing_on_disk: Vec<String>,
    /// A class directory with no table entry
    pub missing_from_table: Vec<String>,
    pub misplaced: Vec<MisplacedLabel>,
}

impl LabelCheck {
    pub fn compare(table: &[String], on_disk: &[String]) -> Self {
        let missing_on_disk = table
            .iter()
            .filter(|l| !on_disk.contains(*l))
            .cloned()
            .collect();
        let missing_from_table = on_disk
            .iter()
            .filter(|d| !table.contains(*d))
            .cloned()
            .collect();
        let misplaced = table
            .iter()
            .enumerate()
            .filter_map(|(table_index, label)| {
                let expected_index = on_disk.iter().position(|d| d == label)?;
                (expected_index != table_index).then(|| MisplacedLabel {
                    label: label.clone(),
                    table_index,
                    expected_index,
                })
            })
            .collect();

        Self {
            missing_on_disk,
            missing_from_table,
            misplaced,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.missing_on_disk.is_empty() && self.missing_from_table.is_empty() && self.misplaced.is_empty()
    }
}
