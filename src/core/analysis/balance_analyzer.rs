use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::core::dataset::{list_class_images, DatasetSplit, ImageExtensions};
use crate::error::{SplitError, SplitResult};

/// Image counts for one class across both splits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassBalance {
    pub class_name: String,
    pub train: usize,
    pub val: usize,
    /// Set when the class directory is absent from one of the splits
    pub missing_from: Option<DatasetSplit>,
}

impl ClassBalance {
    pub fn total(&self) -> usize {
        self.train + self.val
    }

    /// Share of this class's images that are in validation, in percent
    pub fn val_percentage(&self) -> f32 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.val as f32 / self.total() as f32) * 100.0
    }
}

/// Statistics about an existing train/val tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct SplitBalance {
    /// Sorted by class name
    pub classes: Vec<ClassBalance>,
}

impl SplitBalance {
    pub fn total_train(&self) -> usize {
        self.classes.iter().map(|c| c.train).sum()
    }

    pub fn total_val(&self) -> usize {
        self.classes.iter().map(|c| c.val).sum()
    }

    pub fn total_images(&self) -> usize {
        self.total_train() + self.total_val()
    }

    pub fn val_percentage(&self) -> f32 {
        if self.total_images() == 0 {
            return 0.0;
        }
        (self.total_val() as f32 / self.total_images() as f32) * 100.0
    }

    pub fn class(&self, name: &str) -> Option<&ClassBalance> {
        self.classes.iter().find(|c| c.class_name == name)
    }

    /// Generate recommendations for classes whose validation share is off
    /// target by more than `tolerance` (both given as fractions).
    ///
    /// Classes too small to receive a single validation image at the target
    /// ratio are not flagged.
    pub fn recommendations(&self, target_ratio: f32, tolerance: f32) -> Vec<String> {
        let mut recommendations = Vec::new();

        if self.total_images() == 0 {
            recommendations.push("No images found in split tree.".to_string());
            return recommendations;
        }

        let target_pct = target_ratio * 100.0;
        for class in &self.classes {
            if let Some(split) = class.missing_from {
                recommendations.push(format!(
                    "Class '{}' has no {} directory",
                    class.class_name, split
                ));
                continue;
            }

            let expected_val = (class.total() as f32 * target_ratio).floor() as usize;
            if expected_val == 0 && class.val == 0 {
                continue;
            }

            let actual_pct = class.val_percentage();
            if (actual_pct - target_pct).abs() > tolerance * 100.0 {
                recommendations.push(format!(
                    "Class '{}' has {:.1}% in val (target {:.1}%): expected {} of {} images, found {}",
                    class.class_name,
                    actual_pct,
                    target_pct,
                    expected_val,
                    class.total(),
                    class.val
                ));
            }
        }

        if recommendations.is_empty() {
            recommendations.push(format!(
                "All classes are within {:.1}% of the {:.1}% validation target",
                tolerance * 100.0,
                target_pct
            ));
        }

        recommendations
    }
}

fn count_split(
    split_dir: &Path,
    extensions: &ImageExtensions,
) -> SplitResult<Option<BTreeMap<String, usize>>> {
    if !split_dir.is_dir() {
        warn!("Split directory not found: {:?}", split_dir);
        return Ok(None);
    }

    let entries = fs::read_dir(split_dir).map_err(|e| SplitError::ReadDir {
        path: split_dir.to_path_buf(),
        source: e,
    })?;

    let mut counts = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let count = match list_class_images(&path, extensions) {
            Ok(images) => images.len(),
            Err(e) => {
                warn!("Failed to read class directory {:?}: {}", path, e);
                0
            }
        };
        counts.insert(entry.file_name().to_string_lossy().into_owned(), count);
    }
    Ok(Some(counts))
}

/// Analyze the class balance of a `dest/{train,val}/<class>` tree
pub fn analyze_split_tree(dest_dir: &Path, extensions: &ImageExtensions) -> SplitResult<SplitBalance> {
    if !dest_dir.exists() {
        return Err(SplitError::NotFound(dest_dir.to_path_buf()));
    }
    if !dest_dir.is_dir() {
        return Err(SplitError::NotADirectory(dest_dir.to_path_buf()));
    }

    info!("Analyzing split tree: {:?}", dest_dir);

    let train = count_split(&dest_dir.join(DatasetSplit::Train.as_str()), extensions)?.unwrap_or_default();
    let val = count_split(&dest_dir.join(DatasetSplit::Val.as_str()), extensions)?.unwrap_or_default();

    let mut names: Vec<&String> = train.keys().chain(val.keys()).collect();
    names.sort();
    names.dedup();

    let classes: Vec<ClassBalance> = names
        .into_iter()
        .map(|name| {
            let missing_from = if !train.contains_key(name) {
                Some(DatasetSplit::Train)
            } else if !val.contains_key(name) {
                Some(DatasetSplit::Val)
            } else {
                None
            };
            ClassBalance {
                class_name: name.clone(),
                train: train.get(name).copied().unwrap_or(0),
                val: val.get(name).copied().unwrap_or(0),
                missing_from,
            }
        })
        .collect();

    let balance = SplitBalance { classes };
    info!(
        "Analysis complete: {} classes, {} train, {} val ({:.1}% val)",
        balance.classes.len(),
        balance.total_train(),
        balance.total_val(),
        balance.val_percentage()
    );
    Ok(balance)
}
