use crate::error::{AppError, Result};
use crate::risk::models::FeatureRow;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::io::BufReader;
use std::path::Path;

/// A loaded risk-model artifact.
///
/// Artifacts are JSON documents exported by the training workflow. Each one
/// answers two questions: which feature names it requires, and, given a
/// matrix with exactly those columns in that order, the per-row
/// positive-class probability. The variant is explicit in the document's
/// `kind` tag; dispatch happens by matching it, never by probing structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelBundle {
    /// Single classifier pipeline
    Classifier(PipelineModel),

    /// Weighted blend of two classifier pipelines, used for the outcome risk
    Blend(BlendBundle),
}

impl ModelBundle {
    /// Load and validate a bundle from a JSON artifact on disk.
    ///
    /// Any failure here must abort startup: serving with a partially loaded
    /// model set silently changes clinical output.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::ModelLoad(format!(
                "artifact not found: {}",
                path.display()
            )));
        }

        let file = std::fs::File::open(path)
            .map_err(|e| AppError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        let bundle: ModelBundle = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        bundle.validate()?;
        Ok(bundle)
    }

    /// Structural validation of a deserialized bundle
    pub fn validate(&self) -> Result<()> {
        match self {
            ModelBundle::Classifier(model) => model.validate(),
            ModelBundle::Blend(bundle) => {
                if !(0.0..=1.0).contains(&bundle.alpha) {
                    return Err(AppError::ModelLoad(format!(
                        "blend weight {} outside [0, 1]",
                        bundle.alpha
                    )));
                }
                bundle.primary.validate()?;
                bundle.secondary.validate()
            }
        }
    }

    /// Feature names this bundle requires. For a blend this is the union of
    /// both sub-models' requirements.
    pub fn required_features(&self) -> Vec<&str> {
        match self {
            ModelBundle::Classifier(model) => {
                model.feature_names.iter().map(String::as_str).collect()
            }
            ModelBundle::Blend(bundle) => {
                let mut names: Vec<&str> = bundle
                    .primary
                    .feature_names
                    .iter()
                    .chain(bundle.secondary.feature_names.iter())
                    .map(String::as_str)
                    .collect();
                names.sort_unstable();
                names.dedup();
                names
            }
        }
    }

    /// Positive-class probability for one catalog-aligned row
    pub fn predict(&self, row: &FeatureRow) -> Result<f64> {
        match self {
            ModelBundle::Classifier(model) => model.predict_row(row),
            ModelBundle::Blend(bundle) => {
                // Each sub-model sees the row in its own training column
                // order, not the union order.
                let primary = bundle.primary.predict_row(row)?;
                let secondary = bundle.secondary.predict_row(row)?;
                Ok(bundle.alpha * primary + (1.0 - bundle.alpha) * secondary)
            }
        }
    }
}

/// A serialized classifier pipeline: missing-value imputation,
/// standardization, and a logistic model, applied in the column order the
/// pipeline was trained with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineModel {
    /// Human-readable model name
    pub name: String,

    /// When the pipeline was trained
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,

    /// Required feature names, in training column order
    pub feature_names: Vec<String>,

    /// Fill value substituted for the NaN missing marker, per feature
    pub impute_values: Vec<f64>,

    /// Standardization offsets, per feature
    pub center: Vec<f64>,

    /// Standardization divisors, per feature
    pub scale: Vec<f64>,

    /// Logistic coefficients, per feature
    pub coefficients: Vec<f64>,

    /// Logistic intercept
    pub intercept: f64,
}

impl PipelineModel {
    fn validate(&self) -> Result<()> {
        if self.feature_names.is_empty() {
            return Err(AppError::ModelLoad(format!(
                "model '{}' declares zero required features",
                self.name
            )));
        }

        let n = self.feature_names.len();
        let stages = [
            ("impute_values", self.impute_values.len()),
            ("center", self.center.len()),
            ("scale", self.scale.len()),
            ("coefficients", self.coefficients.len()),
        ];
        for (stage, len) in stages {
            if len != n {
                return Err(AppError::ModelLoad(format!(
                    "model '{}': {} has {} entries for {} features",
                    self.name, stage, len, n
                )));
            }
        }

        if self.scale.iter().any(|s| *s == 0.0) {
            return Err(AppError::ModelLoad(format!(
                "model '{}' has a zero standardization scale",
                self.name
            )));
        }

        Ok(())
    }

    /// Positive-class probability per row of `x`, whose columns must be
    /// `feature_names` in declaration order.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.feature_names.len() {
            return Err(AppError::ModelConsistency(format!(
                "model '{}' expects {} columns, got {}",
                self.name,
                self.feature_names.len(),
                x.ncols()
            )));
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                let mut z = self.intercept;
                for (j, &raw) in row.iter().enumerate() {
                    let value = if raw.is_nan() {
                        self.impute_values[j]
                    } else {
                        raw
                    };
                    z += self.coefficients[j] * (value - self.center[j]) / self.scale[j];
                }
                sigmoid(z)
            })
            .collect())
    }

    /// Predict a single catalog-aligned row, restricted to this model's own
    /// feature names in its own order
    pub(crate) fn predict_row(&self, row: &FeatureRow) -> Result<f64> {
        let x = row.select(&self.feature_names)?;
        let probabilities = self.predict_proba(&x)?;
        probabilities
            .first()
            .copied()
            .ok_or_else(|| AppError::Internal("empty prediction batch".to_string()))
    }
}

/// Two-stage blended ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendBundle {
    /// Blend weight applied to the primary sub-model, in [0, 1]
    pub alpha: f64,

    /// Decision threshold shipped with the artifact. Kept for downstream
    /// interpretation; never applied to the returned probability.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Primary sub-model
    pub primary: PipelineModel,

    /// Secondary sub-model
    pub secondary: PipelineModel,
}

fn default_threshold() -> f64 {
    0.5
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
