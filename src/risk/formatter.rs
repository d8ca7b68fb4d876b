use crate::error::{AppError, Result};
use crate::risk::models::{PredictionResult, RiskCategory};
use std::collections::BTreeMap;

/// Rounds and packages raw model probabilities for downstream consumers.
pub struct ResultFormatter;

impl ResultFormatter {
    /// Round each probability to 4 decimal places.
    ///
    /// A value outside [0, 1] breaks the classifier contract and indicates a
    /// defective model artifact; it is reported, never clamped.
    pub fn format(raw: &BTreeMap<RiskCategory, f64>) -> Result<PredictionResult> {
        let mut probabilities = BTreeMap::new();
        for (&category, &probability) in raw {
            if !(0.0..=1.0).contains(&probability) {
                return Err(AppError::ModelConsistency(format!(
                    "{} model returned probability {} outside [0, 1]",
                    category, probability
                )));
            }
            probabilities.insert(category, round4(probability)?);
        }
        Ok(PredictionResult { probabilities })
    }
}

/// Round to 4 decimal places on the value's exact decimal expansion.
///
/// Scaling by 1e4 and rounding the product misrounds values whose scaled
/// form lands on .5 (0.12345 must become 0.1235); the decimal formatter
/// rounds the exact binary value instead, matching how the artifacts'
/// training pipeline reported its own probabilities.
fn round4(probability: f64) -> Result<f64> {
    format!("{probability:.4}")
        .parse()
        .map_err(|e| AppError::Internal(format!("rounding failed for {probability}: {e}")))
}
