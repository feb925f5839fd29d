mod report;
mod splitter;

pub use report::{ClassReport, CopyFailure, SplitReport};
pub use splitter::{
    partition_images, split, val_count, DatasetSplitter, SplitOptions, SplitProgressMessage,
};
