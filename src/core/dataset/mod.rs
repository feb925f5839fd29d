mod dataset;

pub use dataset::{
    discover_classes, list_class_images, validate_source_dir, ClassDir, DatasetSplit,
    ImageExtensions,
};
