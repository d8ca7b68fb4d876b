use crate::error::{AppError, Result};
use crate::risk::models::RiskCategory;
use crate::risk::registry::ModelRegistry;
use std::collections::BTreeSet;

/// Diagnosis-indicator feature name prefix
pub const DIAGNOSIS_PREFIX: &str = "icd_";

/// The fixed, ordered universe of feature names across all loaded models.
///
/// Computed once at startup as the union of every model's required features
/// and immutable thereafter. Column order is lexicographic; every model
/// input matrix must present columns in the order the model was trained
/// with, and a fixed catalog order is what makes that reproducible.
#[derive(Debug, Clone)]
pub struct FeatureCatalog {
    columns: Vec<String>,
    diagnosis_features: Vec<String>,
    measurement_features: Vec<String>,
}

impl FeatureCatalog {
    /// Derive the catalog from the loaded model set.
    ///
    /// A model reporting zero required features indicates a malformed
    /// artifact; the process must refuse to start on it.
    pub fn build(registry: &ModelRegistry) -> Result<Self> {
        let mut names = BTreeSet::new();
        for category in RiskCategory::ALL {
            let required = registry.required_features(category);
            if required.is_empty() {
                return Err(AppError::ModelLoad(format!(
                    "model for {} reports zero required features",
                    category
                )));
            }
            names.extend(required.iter().cloned());
        }

        let columns: Vec<String> = names.into_iter().collect();
        let (diagnosis_features, measurement_features) = columns
            .iter()
            .cloned()
            .partition(|name| Self::is_diagnosis_feature(name));

        Ok(Self {
            columns,
            diagnosis_features,
            measurement_features,
        })
    }

    /// Whether a feature name follows the diagnosis-indicator convention
    pub fn is_diagnosis_feature(name: &str) -> bool {
        name.starts_with(DIAGNOSIS_PREFIX)
    }

    /// The diagnosis code a feature name refers to, if it is one
    pub fn diagnosis_code(name: &str) -> Option<&str> {
        name.strip_prefix(DIAGNOSIS_PREFIX)
    }

    /// All feature names, lexicographically ordered
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Diagnosis-indicator feature names, lexicographically ordered
    pub fn diagnosis_features(&self) -> &[String] {
        &self.diagnosis_features
    }

    /// Clinical-measurement feature names, lexicographically ordered
    pub fn measurement_features(&self) -> &[String] {
        &self.measurement_features
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.binary_search_by(|c| c.as_str().cmp(name)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
