//! Train/validation splitting of a class-per-directory image collection.
//!
//! Each class is partitioned independently: its images are shuffled and the
//! first `floor(count * val_ratio)` go to validation, the rest to training.
//! Files are copied into `dest/train/<class>` and `dest/val/<class>`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
    Arc,
};
use tracing::{debug, error, info, warn};

use crate::core::dataset::{discover_classes, list_class_images, ClassDir, DatasetSplit, ImageExtensions};
use crate::core::operations::{copy_into_dir, ensure_dir};
use crate::error::{SplitError, SplitResult};

use super::{ClassReport, CopyFailure, SplitReport};

/// Options for a split run
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Fraction of each class assigned to validation, in `[0, 1)`
    pub val_ratio: f64,
    /// `None` shuffles non-deterministically
    pub seed: Option<u64>,
    pub extensions: ImageExtensions,
    /// Number of classes processed concurrently
    pub workers: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            val_ratio: 0.2,
            seed: None,
            extensions: ImageExtensions::default(),
            workers: 4,
        }
    }
}

impl SplitOptions {
    pub fn validate(&self) -> SplitResult<()> {
        if !(0.0..1.0).contains(&self.val_ratio) {
            return Err(SplitError::InvalidArgument(format!(
                "val_ratio must be in [0, 1), got {}",
                self.val_ratio
            )));
        }
        if self.workers == 0 {
            return Err(SplitError::InvalidArgument(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.extensions.is_empty() {
            return Err(SplitError::InvalidArgument(
                "at least one image extension is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress message for split execution
#[derive(Debug, Clone)]
pub enum SplitProgressMessage {
    ClassStarted {
        class_name: String,
        image_count: usize,
    },
    ClassFinished {
        class_name: String,
        copied: usize,
        failed: usize,
    },
    Complete {
        classes: usize,
        copied: usize,
        failed: usize,
    },
    Cancelled {
        copied: usize,
    },
}

/// Number of images assigned to validation for a class of `total` images.
/// Always rounds down.
pub fn val_count(total: usize, val_ratio: f64) -> usize {
    ((total as f64 * val_ratio).floor() as usize).min(total)
}

/// Shuffle `images` and split them into `(train, val)`.
pub fn partition_images<R: Rng + ?Sized>(
    mut images: Vec<PathBuf>,
    val_ratio: f64,
    rng: &mut R,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    images.shuffle(rng);
    let val_len = val_count(images.len(), val_ratio);
    let train = images.split_off(val_len);
    (train, images)
}

/// RNG for one class. With a seed, the stream depends only on the seed and
/// the raw class directory name, never on the order in which classes are
/// processed.
fn class_rng(seed: Option<u64>, class_key: &[u8]) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(class_key)),
        None => StdRng::from_entropy(),
    }
}

// Stable across Rust releases, unlike DefaultHasher.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Runs a split over a source tree.
pub struct DatasetSplitter {
    options: SplitOptions,
    progress_tx: Option<Sender<SplitProgressMessage>>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl DatasetSplitter {
    pub fn new(options: SplitOptions) -> Self {
        Self {
            options,
            progress_tx: None,
            cancel_flag: None,
        }
    }

    pub fn with_progress(mut self, tx: Sender<SplitProgressMessage>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Checked between files; once set, no further copies start.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .map(|f| f.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn send(&self, message: SplitProgressMessage) {
        if let Some(ref tx) = self.progress_tx {
            let _ = tx.send(message);
        }
    }

    /// Split `source_dir` into `dest_dir/train` and `dest_dir/val`.
    ///
    /// Fails before writing anything when the options are invalid or the
    /// source cannot be enumerated. Per-file problems end up in the report.
    pub fn run(&self, source_dir: &Path, dest_dir: &Path) -> SplitResult<SplitReport> {
        self.options.validate()?;
        let classes = discover_classes(source_dir, Some(dest_dir))?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers)
            .build()
            .map_err(|e| SplitError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;

        let train_dir = dest_dir.join(DatasetSplit::Train.as_str());
        let val_dir = dest_dir.join(DatasetSplit::Val.as_str());
        std::fs::create_dir_all(&train_dir)?;
        std::fs::create_dir_all(&val_dir)?;

        info!(
            "Splitting {} classes from {:?} into {:?} (val_ratio={}, seed={:?}, workers={})",
            classes.len(),
            source_dir,
            dest_dir,
            self.options.val_ratio,
            self.options.seed,
            self.options.workers
        );

        let class_reports: Vec<ClassReport> = pool.install(|| {
            classes
                .par_iter()
                .map(|class| self.process_class(class, &train_dir, &val_dir))
                .collect()
        });

        // Only work that was actually skipped counts; a flag raised after the
        // last copy leaves a complete run
        let cancelled = class_reports.iter().any(|c| c.interrupted);
        let report = SplitReport {
            source_dir: source_dir.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            train_dir,
            val_dir,
            val_ratio: self.options.val_ratio,
            seed: self.options.seed,
            classes: class_reports,
            cancelled,
        };

        let copied = report.total_copied(DatasetSplit::Train) + report.total_copied(DatasetSplit::Val);
        if report.cancelled {
            warn!("Split cancelled after copying {} files", copied);
            self.send(SplitProgressMessage::Cancelled { copied });
        } else {
            info!(
                "Split complete: {} classes, {} train, {} val, {} failures",
                report.classes.len(),
                report.total_copied(DatasetSplit::Train),
                report.total_copied(DatasetSplit::Val),
                report.failure_count()
            );
            self.send(SplitProgressMessage::Complete {
                classes: report.classes.len(),
                copied,
                failed: report.failure_count(),
            });
        }

        Ok(report)
    }

    fn process_class(&self, class: &ClassDir, train_root: &Path, val_root: &Path) -> ClassReport {
        let mut report = ClassReport::new(&class.name);

        if self.is_cancelled() {
            debug!("Skipping class {} after cancellation", class.name);
            report.interrupted = true;
            return report;
        }

        let images = match list_class_images(&class.path, &self.options.extensions) {
            Ok(images) => images,
            Err(e) => {
                error!("Failed to list images for class {}: {}", class.name, e);
                report.error = Some(format!("Failed to read {:?}: {}", class.path, e));
                return report;
            }
        };

        self.send(SplitProgressMessage::ClassStarted {
            class_name: class.name.clone(),
            image_count: images.len(),
        });

        let mut rng = class_rng(self.options.seed, class.dir_name.as_encoded_bytes());
        let (train, val) = partition_images(images, self.options.val_ratio, &mut rng);
        report.train_planned = train.len();
        report.val_planned = val.len();
        debug!(
            "Class {}: {} train, {} val",
            class.name,
            train.len(),
            val.len()
        );

        for (split, root, files) in [
            (DatasetSplit::Train, train_root, &train),
            (DatasetSplit::Val, val_root, &val),
        ] {
            let class_dest = root.join(&class.dir_name);

            // Created even when empty so every class shows up in both splits
            if let Err(e) = ensure_dir(&class_dest) {
                let cause = e.to_string();
                report.failures.extend(files.iter().map(|src| CopyFailure {
                    class_name: class.name.clone(),
                    split,
                    source: src.clone(),
                    cause: cause.clone(),
                }));
                continue;
            }

            if report.interrupted {
                break;
            }
            for src in files {
                if self.is_cancelled() {
                    warn!("Class {} interrupted by cancellation", class.name);
                    report.interrupted = true;
                    break;
                }
                match copy_into_dir(src, &class_dest) {
                    Ok(_) => report.record_copied(split),
                    Err(e) => report.failures.push(CopyFailure {
                        class_name: class.name.clone(),
                        split,
                        source: src.clone(),
                        cause: e.to_string(),
                    }),
                }
            }
        }

        self.send(SplitProgressMessage::ClassFinished {
            class_name: class.name.clone(),
            copied: report.train_copied + report.val_copied,
            failed: report.failures.len(),
        });

        report
    }
}

/// Split with default extensions and worker count.
pub fn split(
    source_dir: &Path,
    dest_dir: &Path,
    val_ratio: f64,
    seed: Option<u64>,
) -> SplitResult<SplitReport> {
    let options = SplitOptions {
        val_ratio,
        seed,
        ..Default::default()
    };
    DatasetSplitter::new(options).run(source_dir, dest_dir)
}
