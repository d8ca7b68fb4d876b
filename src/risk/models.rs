use crate::error::{AppError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Risk categories scored by the service
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskCategory {
    /// Intra-abdominal bleeding
    Bleeding,

    /// Intra-abdominal infection
    Infection,

    /// Adverse surgical outcome
    Outcome,
}

impl RiskCategory {
    /// All categories, in stable order
    pub const ALL: [RiskCategory; 3] = [
        RiskCategory::Bleeding,
        RiskCategory::Infection,
        RiskCategory::Outcome,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Bleeding => "Bleeding",
            RiskCategory::Infection => "Infection",
            RiskCategory::Outcome => "Outcome",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog-aligned feature vector for a single request.
///
/// Holds exactly the catalog's column set in lexicographic column order.
/// Missing measurements carry the NaN marker; the trained pipelines impute
/// them, so the marker must survive untouched until model invocation.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    values: BTreeMap<String, f64>,
}

impl FeatureRow {
    pub(crate) fn new(values: BTreeMap<String, f64>) -> Self {
        Self { values }
    }

    /// Value for a column, if the column exists
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Column names in row order (lexicographic)
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Project the row onto `columns`, in that exact order, as a 1×n matrix.
    ///
    /// The catalog is derived from the same registry the models come from, so
    /// a missing column is an internal consistency failure, not a request
    /// problem.
    pub fn select(&self, columns: &[String]) -> Result<Array2<f64>> {
        let mut values = Vec::with_capacity(columns.len());
        for name in columns {
            match self.values.get(name) {
                Some(&value) => values.push(value),
                None => {
                    return Err(AppError::ModelConsistency(format!(
                        "feature '{}' required by a model is absent from the assembled row",
                        name
                    )))
                }
            }
        }
        Array2::from_shape_vec((1, values.len()), values)
            .map_err(|e| AppError::Internal(format!("failed to shape feature matrix: {}", e)))
    }
}

/// NaN markers compare equal here so that identical requests assemble into
/// equal rows.
impl PartialEq for FeatureRow {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|((name_a, a), (name_b, b))| {
                    name_a == name_b && (a == b || (a.is_nan() && b.is_nan()))
                })
    }
}

/// Rounded per-category probabilities for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionResult {
    /// Probability per risk category, rounded to 4 decimal places
    pub probabilities: BTreeMap<RiskCategory, f64>,
}

impl PredictionResult {
    pub fn get(&self, category: RiskCategory) -> Option<f64> {
        self.probabilities.get(&category).copied()
    }
}
