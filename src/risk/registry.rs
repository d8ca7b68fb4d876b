use crate::config::ModelsConfig;
use crate::error::{AppError, Result};
use crate::risk::bundle::ModelBundle;
use crate::risk::models::{FeatureRow, RiskCategory};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Process-wide set of loaded risk models.
///
/// Built once at startup and shared read-only for the process lifetime, so
/// concurrent request handling needs no locking. Loading is all-or-nothing:
/// any missing or malformed artifact aborts startup.
#[derive(Debug)]
pub struct ModelRegistry {
    bundles: BTreeMap<RiskCategory, ModelBundle>,
    required: BTreeMap<RiskCategory, Vec<String>>,
}

impl ModelRegistry {
    /// Load every artifact declared in the configuration
    pub fn load(config: &ModelsConfig) -> Result<Self> {
        Self::load_from_paths([
            (RiskCategory::Bleeding, config.bleeding.clone()),
            (RiskCategory::Infection, config.infection.clone()),
            (RiskCategory::Outcome, config.outcome.clone()),
        ])
    }

    /// Load one artifact per category; any failure is fatal
    pub fn load_from_paths(paths: [(RiskCategory, PathBuf); 3]) -> Result<Self> {
        let mut bundles = BTreeMap::new();
        for (category, path) in paths {
            let bundle = ModelBundle::load(&path).map_err(|e| match e {
                AppError::ModelLoad(msg) => {
                    AppError::ModelLoad(format!("{} model: {}", category, msg))
                }
                other => other,
            })?;

            info!(
                category = %category,
                path = %path.display(),
                features = bundle.required_features().len(),
                "Risk model loaded"
            );
            bundles.insert(category, bundle);
        }

        Ok(Self::from_bundles(bundles))
    }

    /// Build a registry from already-validated bundles. Disk loading goes
    /// through [`ModelRegistry::load`]; this seam exists for embedding and
    /// tests.
    pub fn from_bundles(bundles: BTreeMap<RiskCategory, ModelBundle>) -> Self {
        let required = bundles
            .iter()
            .map(|(category, bundle)| {
                let mut names: Vec<String> = bundle
                    .required_features()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                names.sort_unstable();
                (*category, names)
            })
            .collect();

        Self { bundles, required }
    }

    /// Lexicographically ordered feature names the category's model requires
    pub fn required_features(&self, category: RiskCategory) -> &[String] {
        self.required
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Run the category's model over one catalog-aligned row
    pub fn predict(&self, category: RiskCategory, row: &FeatureRow) -> Result<f64> {
        let bundle = self.bundles.get(&category).ok_or_else(|| {
            AppError::ModelConsistency(format!("no model loaded for category {}", category))
        })?;
        bundle.predict(row)
    }

    /// Loaded categories, in stable order
    pub fn categories(&self) -> impl Iterator<Item = RiskCategory> + '_ {
        self.bundles.keys().copied()
    }

    /// The bundle backing a category, if loaded
    pub fn bundle(&self, category: RiskCategory) -> Option<&ModelBundle> {
        self.bundles.get(&category)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::bundle::{BlendBundle, PipelineModel};
    use std::path::Path;

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

    fn write_artifact(dir: &Path, file: &str, bundle: &ModelBundle) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, serde_json::to_string_pretty(bundle).unwrap()).unwrap();
        path
    }

    fn artifact_set(dir: &Path) -> [(RiskCategory, PathBuf); 3] {
        let bleeding = ModelBundle::Classifier(constant_model("bleeding", &["age", "icd_A"], 0.3));
        let infection =
            ModelBundle::Classifier(constant_model("infection", &["weight", "icd_B"], 0.2));
        let outcome = ModelBundle::Blend(BlendBundle {
            alpha: 0.6,
            threshold: 0.2,
            primary: constant_model("outcome-primary", &["age", "weight"], 0.8),
            secondary: constant_model("outcome-secondary", &["age", "weight"], 0.4),
        });

        [
            (
                RiskCategory::Bleeding,
                write_artifact(dir, "bleeding.json", &bleeding),
            ),
            (
                RiskCategory::Infection,
                write_artifact(dir, "infection.json", &infection),
            ),
            (
                RiskCategory::Outcome,
                write_artifact(dir, "outcome.json", &outcome),
            ),
        ]
    }

    #[test]
    fn test_load_full_set() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::load_from_paths(artifact_set(dir.path())).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.categories().collect::<Vec<_>>(),
            RiskCategory::ALL.to_vec()
        );
    }

    #[test]
    fn test_missing_artifact_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = artifact_set(dir.path());
        std::fs::remove_file(&paths[2].1).unwrap();

        let err = ModelRegistry::load_from_paths(paths).unwrap_err();
        assert!(matches!(err, AppError::ModelLoad(_)));
        assert!(err.to_string().contains("Outcome"));
    }

    #[test]
    fn test_malformed_artifact_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = artifact_set(dir.path());
        std::fs::write(&paths[0].1, "{\"kind\": \"classifier\"}").unwrap();

        let err = ModelRegistry::load_from_paths(paths).unwrap_err();
        assert!(matches!(err, AppError::ModelLoad(_)));
    }

    #[test]
    fn test_required_features_sorted_union() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::load_from_paths(artifact_set(dir.path())).unwrap();

        assert_eq!(
            registry.required_features(RiskCategory::Bleeding),
            &["age".to_string(), "icd_A".to_string()]
        );
        // Blend requirement is the union over both sub-models.
        assert_eq!(
            registry.required_features(RiskCategory::Outcome),
            &["age".to_string(), "weight".to_string()]
        );
    }
}
