use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use serde::Serialize;

use crate::error::{ClassifyError, ClassifyResult};

use super::LabelTable;

/// Label reported when the model returns an index the table does not cover.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A trained image classifier.
///
/// `predict` receives an RGB image already resized to `input_size()` and
/// returns one score per class, in training-time class index order.
pub trait Classifier: Send + Sync {
    fn predict(&self, image: &RgbImage) -> ClassifyResult<Vec<f32>>;

    fn input_size(&self) -> u32 {
        224
    }
}

/// Convert to RGB and resize to a `size` x `size` model input.
pub fn preprocess(image: &DynamicImage, size: u32) -> RgbImage {
    image
        .resize_exact(size, size, FilterType::Triangle)
        .to_rgb8()
}

/// Best class for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_index: usize,
    pub label: String,
    /// Raw top score
    pub score: f32,
}

impl Prediction {
    /// Score as a percentage rounded to two decimals
    pub fn confidence_percent(&self) -> f32 {
        (self.score * 100.0 * 100.0).round() / 100.0
    }
}

/// Argmax over `scores`, mapped through `labels`. NaN scores never win.
pub fn top_prediction(scores: &[f32], labels: &LabelTable) -> ClassifyResult<Prediction> {
    let (class_index, score) = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or(ClassifyError::EmptyScores)?;

    let label = labels.label(class_index).unwrap_or(UNKNOWN_LABEL).to_string();
    Ok(Prediction {
        class_index,
        label,
        score,
    })
}
