use crate::error::Result;
use crate::risk::models::{FeatureRow, RiskCategory};
use crate::risk::registry::ModelRegistry;
use std::collections::BTreeMap;

/// Runs every loaded risk model over one catalog-aligned row.
pub struct EnsemblePredictor;

impl EnsemblePredictor {
    /// Raw (unrounded) probability per risk category.
    ///
    /// Categories are mutually independent: no category's inference observes
    /// another's result, and the registry is read-only, so evaluation order
    /// never matters.
    pub fn predict_all(
        row: &FeatureRow,
        registry: &ModelRegistry,
    ) -> Result<BTreeMap<RiskCategory, f64>> {
        let mut raw = BTreeMap::new();
        for category in registry.categories() {
            raw.insert(category, registry.predict(category, row)?);
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::risk::bundle::{BlendBundle, ModelBundle, PipelineModel};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap as Map;

    fn constant_model(name: &str, features: &[&str], probability: f64) -> PipelineModel {
        let n = features.len();
        PipelineModel {
            name: name.to_string(),
            trained_at: None,
            feature_names: features.iter().map(|f| f.to_string()).collect(),
            impute_values: vec![0.0; n],
            center: vec![0.0; n],
            scale: vec![1.0; n],
            coefficients: vec![0.0; n],
            intercept: (probability / (1.0 - probability)).ln(),
        }
    }

    fn test_registry() -> ModelRegistry {
        let mut bundles = Map::new();
        bundles.insert(
            RiskCategory::Bleeding,
            ModelBundle::Classifier(constant_model("bleeding", &["age"], 0.3)),
        );
        bundles.insert(
            RiskCategory::Infection,
            ModelBundle::Classifier(constant_model("infection", &["weight"], 0.2)),
        );
        bundles.insert(
            RiskCategory::Outcome,
            ModelBundle::Blend(BlendBundle {
                alpha: 0.6,
                threshold: 0.2,
                primary: constant_model("outcome-primary", &["age", "weight"], 0.8),
                secondary: constant_model("outcome-secondary", &["age", "weight"], 0.4),
            }),
        );
        ModelRegistry::from_bundles(bundles)
    }

    fn row(pairs: &[(&str, f64)]) -> FeatureRow {
        FeatureRow::new(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        )
    }

    #[test]
    fn test_one_probability_per_category() {
        let registry = test_registry();
        let row = row(&[("age", 60.0), ("weight", 70.0)]);

        let raw = EnsemblePredictor::predict_all(&row, &registry).unwrap();

        assert_eq!(raw.len(), 3);
        assert_relative_eq!(raw[&RiskCategory::Bleeding], 0.3, max_relative = 1e-12);
        assert_relative_eq!(raw[&RiskCategory::Infection], 0.2, max_relative = 1e-12);
        assert_relative_eq!(
            raw[&RiskCategory::Outcome],
            0.6 * 0.8 + 0.4 * 0.4,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_batch_matches_single_category_inference() {
        let registry = test_registry();
        let row = row(&[("age", 60.0), ("weight", 70.0)]);

        let raw = EnsemblePredictor::predict_all(&row, &registry).unwrap();

        for category in RiskCategory::ALL {
            assert_eq!(
                raw[&category],
                registry.predict(category, &row).unwrap(),
                "{category} inference must not depend on the other categories"
            );
        }
    }

    #[test]
    fn test_missing_required_column_is_consistency_error() {
        let registry = test_registry();
        let row = row(&[("age", 60.0)]);

        let err = EnsemblePredictor::predict_all(&row, &registry).unwrap_err();
        assert!(matches!(err, AppError::ModelConsistency(_)));
    }
}
