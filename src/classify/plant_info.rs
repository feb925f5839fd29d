use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{ClassifyError, ClassifyResult};

/// Short per-plant entry for listing every known plant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantSummary {
    pub name: String,
    pub description: String,
    pub growth: Value,
    pub diseases: Value,
}

/// Descriptive details per plant label, loaded from a JSON object.
#[derive(Debug, Clone, Default)]
pub struct PlantInfoCatalog {
    entries: Map<String, Value>,
}

impl PlantInfoCatalog {
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Load the catalog. A missing file yields an empty catalog, since the
    /// details are optional; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> ClassifyResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Plant info file {:?} not found. Continuing without extra info.", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ClassifyError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let entries: Map<String, Value> = serde_json::from_str(&contents).map_err(|e| ClassifyError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Loaded plant info for {} plants", entries.len());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Details for `label`, or a placeholder message when unknown
    pub fn info_for(&self, label: &str) -> Value {
        self.entries
            .get(label)
            .cloned()
            .unwrap_or_else(|| json!({ "message": "No detailed info available for this plant." }))
    }

    pub fn summaries(&self) -> Vec<PlantSummary> {
        self.entries
            .iter()
            .map(|(name, details)| PlantSummary {
                name: name.clone(),
                description: details
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("No description available.")
                    .to_string(),
                growth: details.get("growth").cloned().unwrap_or_else(|| json!({})),
                diseases: details.get("diseases").cloned().unwrap_or_else(|| json!({})),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_catalog() {
        let dir = tempdir().unwrap();
        let catalog = PlantInfoCatalog::load(&dir.path().join("plant_info.json")).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(
            catalog.info_for("Tulip"),
            json!({ "message": "No detailed info available for this plant." })
        );
    }

    #[test]
    fn test_lookup_and_summaries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plant_info.json");
        fs::write(
            &path,
            r#"{
                "Aloe Vera": { "description": "Succulent", "growth": { "light": "bright" } },
                "Tulip": {}
            }"#,
        )
        .unwrap();

        let catalog = PlantInfoCatalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.info_for("Aloe Vera")["description"], "Succulent");

        let summaries = catalog.summaries();
        let tulip = summaries.iter().find(|s| s.name == "Tulip").unwrap();
        assert_eq!(tulip.description, "No description available.");
        assert_eq!(tulip.diseases, json!({}));
        let aloe = summaries.iter().find(|s| s.name == "Aloe Vera").unwrap();
        assert_eq!(aloe.growth["light"], "bright");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plant_info.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            PlantInfoCatalog::load(&path),
            Err(ClassifyError::Parse { .. })
        ));
    }
}
