//! Classification of single plant images with an injected model.
//!
//! The model itself is behind the [`Classifier`] trait; this module owns
//! everything around it: preprocessing, argmax, the label table that maps
//! output indices to class names, and the plant info catalog.

mod classifier;
mod labels;
mod plant_info;
mod service;

pub use classifier::{preprocess, top_prediction, Classifier, Prediction, UNKNOWN_LABEL};
pub use labels::{LabelCheck, LabelTable, MisplacedLabel};
pub use plant_info::{PlantInfoCatalog, PlantSummary};
pub use service::{Classification, ClassificationService};
