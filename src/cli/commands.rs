use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

use plant_classifier::classify::LabelTable;
use plant_classifier::config::AppConfig;
use plant_classifier::core::analysis::analyze_split_tree;
use plant_classifier::core::dataset::{DatasetSplit, ImageExtensions};
use plant_classifier::core::split::{DatasetSplitter, SplitProgressMessage, SplitReport};

/// Exit code when the split finished but some files were not copied
const EXIT_INCOMPLETE: i32 = 2;
/// Exit code when the label table and the training tree disagree
const EXIT_LABEL_MISMATCH: i32 = 3;

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Directory with one subdirectory of images per class
    pub source: PathBuf,

    /// Destination; train/ and val/ are created inside it
    pub dest: PathBuf,

    /// Fraction of each class copied to val, in [0, 1)
    #[arg(long)]
    pub val_ratio: Option<f64>,

    /// Seed for a reproducible split; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of classes processed in parallel
    #[arg(long)]
    pub workers: Option<usize>,

    /// Recognized image extensions, comma separated
    #[arg(long, value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,

    /// Write the full report as JSON to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Split root containing train/ and val/
    pub dest: PathBuf,

    /// Expected validation fraction; defaults to the configured ratio
    #[arg(long)]
    pub target_ratio: Option<f32>,

    /// Allowed deviation from the target, as a fraction
    #[arg(long, default_value_t = 0.02)]
    pub tolerance: f32,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VerifyLabelsArgs {
    /// Label table (JSON array); defaults to classifier.labels_path
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Training tree whose class directories define the index order
    pub train_dir: PathBuf,
}

pub fn run_split(args: SplitArgs, config: &AppConfig) -> Result<i32> {
    let cancel = Arc::new(AtomicBool::new(false));
    watch_for_interrupt(Arc::clone(&cancel));
    split_with_cancel(args, config, cancel)
}

/// Raise `flag` on Ctrl-C so a running split stops between files.
fn watch_for_interrupt(flag: Arc<AtomicBool>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Interrupt handling unavailable: {}", e);
                return;
            }
        };
        runtime.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; finishing the files in progress");
                flag.store(true, Ordering::Relaxed);
            }
        });
    });
}

fn split_with_cancel(args: SplitArgs, config: &AppConfig, cancel: Arc<AtomicBool>) -> Result<i32> {
    let mut options = config.split.to_options();
    if let Some(val_ratio) = args.val_ratio {
        options.val_ratio = val_ratio;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }
    if let Some(workers) = args.workers {
        options.workers = workers;
    }
    if let Some(ref extensions) = args.extensions {
        options.extensions = ImageExtensions::new(extensions);
    }

    if options.seed.is_none() {
        info!("No seed given; the file assignment will differ between runs");
    }

    let (tx, rx) = channel::<SplitProgressMessage>();
    let progress = thread::spawn(move || {
        for message in rx {
            match message {
                SplitProgressMessage::ClassStarted {
                    class_name,
                    image_count,
                } => info!("Class {}: {} images", class_name, image_count),
                SplitProgressMessage::ClassFinished {
                    class_name,
                    copied,
                    failed,
                } => {
                    if failed > 0 {
                        warn!("Class {} done: {} copied, {} failed", class_name, copied, failed);
                    } else {
                        info!("Class {} done: {} copied", class_name, copied);
                    }
                }
                SplitProgressMessage::Complete { .. } | SplitProgressMessage::Cancelled { .. } => {}
            }
        }
    });

    let result = DatasetSplitter::new(options)
        .with_progress(tx)
        .with_cancel_flag(cancel)
        .run(&args.source, &args.dest);
    // The splitter owned the sender, so the progress loop has ended
    let _ = progress.join();
    let report = result?;

    print_split_report(&report);

    if let Some(ref path) = args.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("failed to write report to {:?}", path))?;
        info!("Report written to {:?}", path);
    }

    Ok(if report.is_complete() { 0 } else { EXIT_INCOMPLETE })
}

fn print_split_report(report: &SplitReport) {
    println!(
        "Split {:?} -> {:?} (val_ratio {}, seed {})",
        report.source_dir,
        report.dest_dir,
        report.val_ratio,
        report
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "random".to_string())
    );
    println!("{:<40} {:>8} {:>8} {:>8}", "class", "train", "val", "failed");
    for class in &report.classes {
        println!(
            "{:<40} {:>8} {:>8} {:>8}",
            class.class_name,
            class.train_copied,
            class.val_copied,
            class.failures.len()
        );
    }
    println!(
        "{:<40} {:>8} {:>8} {:>8}",
        "total",
        report.total_copied(DatasetSplit::Train),
        report.total_copied(DatasetSplit::Val),
        report.failure_count()
    );
    println!("train: {:?}", report.train_dir);
    println!("val:   {:?}", report.val_dir);

    for (class_name, error) in report.class_errors() {
        println!("error in class {}: {}", class_name, error);
    }
    for failure in report.failures() {
        println!(
            "failed [{}/{}] {:?}: {}",
            failure.split, failure.class_name, failure.source, failure.cause
        );
    }
    if report.cancelled {
        println!("Cancelled before completion; rerun to finish.");
    }
}

pub fn run_stats(args: StatsArgs, config: &AppConfig) -> Result<i32> {
    let extensions = ImageExtensions::new(&config.split.extensions);
    let balance = analyze_split_tree(&args.dest, &extensions)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&balance)?);
        return Ok(0);
    }

    println!("{:<40} {:>8} {:>8} {:>8}", "class", "train", "val", "val %");
    for class in &balance.classes {
        println!(
            "{:<40} {:>8} {:>8} {:>7.1}%",
            class.class_name,
            class.train,
            class.val,
            class.val_percentage()
        );
    }
    println!(
        "{:<40} {:>8} {:>8} {:>7.1}%",
        "total",
        balance.total_train(),
        balance.total_val(),
        balance.val_percentage()
    );

    let target = args.target_ratio.unwrap_or(config.split.val_ratio as f32);
    println!();
    for recommendation in balance.recommendations(target, args.tolerance) {
        println!("{}", recommendation);
    }
    Ok(0)
}

pub fn run_verify_labels(args: VerifyLabelsArgs, config: &AppConfig) -> Result<i32> {
    let labels_path = args
        .labels
        .or_else(|| config.classifier.labels_path.clone())
        .context("no label table given; pass --labels or set classifier.labels_path")?;

    let table = LabelTable::load(&labels_path)?;
    let check = table.verify_against_dir(&args.train_dir)?;

    if check.is_consistent() {
        println!(
            "{:?} matches {} classes in {:?}",
            labels_path,
            table.len(),
            args.train_dir
        );
        return Ok(0);
    }

    for label in &check.missing_on_disk {
        println!("label without class directory: {}", label);
    }
    for name in &check.missing_from_table {
        println!("class directory without label: {}", name);
    }
    for misplaced in &check.misplaced {
        println!(
            "label {} is at index {} but training order puts it at {}",
            misplaced.label, misplaced.table_index, misplaced.expected_index
        );
    }
    Ok(EXIT_LABEL_MISMATCH)
}
