use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::config::ClassifierSettings;
use crate::error::{ClassifyError, ClassifyResult};

use super::{preprocess, top_prediction, Classifier, LabelTable, PlantInfoCatalog};

/// Answer for one classified image
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub predicted_class: String,
    pub class_index: usize,
    /// Percentage, two decimals
    pub confidence: f32,
    pub info: Value,
}

/// Owns a loaded classifier together with its label table and plant catalog.
///
/// Build one at startup, share it across requests, drop it on shutdown.
pub struct ClassificationService<C: Classifier> {
    classifier: C,
    labels: LabelTable,
    catalog: PlantInfoCatalog,
    input_size: u32,
}

impl<C: Classifier> ClassificationService<C> {
    pub fn new(classifier: C, labels: LabelTable, catalog: PlantInfoCatalog) -> Self {
        info!(
            "Classification service ready: {} labels, {} plant info entries, input {}px",
            labels.len(),
            catalog.len(),
            classifier.input_size()
        );
        Self {
            input_size: classifier.input_size(),
            classifier,
            labels,
            catalog,
        }
    }

    /// Override the side length images are resized to before `predict`
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// Build from configured file locations. The label table is required;
    /// the plant catalog is optional.
    pub fn from_settings(classifier: C, settings: &ClassifierSettings) -> ClassifyResult<Self> {
        let labels_path = settings
            .labels_path
            .as_deref()
            .ok_or(ClassifyError::MissingConfig("classifier.labels_path"))?;
        let labels = LabelTable::load(labels_path)?;
        let catalog = match settings.plant_info_path.as_deref() {
            Some(path) => PlantInfoCatalog::load(path)?,
            None => PlantInfoCatalog::default(),
        };
        Ok(Self::new(classifier, labels, catalog).with_input_size(settings.image_size))
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn catalog(&self) -> &PlantInfoCatalog {
        &self.catalog
    }

    pub fn classify_image(&self, image: &image::DynamicImage) -> ClassifyResult<Classification> {
        let input = preprocess(image, self.input_size);
        let scores = self.classifier.predict(&input)?;
        let prediction = top_prediction(&scores, &self.labels)?;
        debug!(
            "Predicted {} (index {}, score {:.4})",
            prediction.label, prediction.class_index, prediction.score
        );

        Ok(Classification {
            info: self.catalog.info_for(&prediction.label),
            confidence: prediction.confidence_percent(),
            class_index: prediction.class_index,
            predicted_class: prediction.label,
        })
    }

    /// Classify an encoded image (any format the `image` crate decodes)
    pub fn classify_bytes(&self, bytes: &[u8]) -> ClassifyResult<Classification> {
        let image = image::load_from_memory(bytes)?;
        self.classify_image(&image)
    }

    pub fn classify_path(&self, path: &Path) -> ClassifyResult<Classification> {
        let image = image::open(path)?;
        self.classify_image(&image)
    }
}
