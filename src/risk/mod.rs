/// Risk prediction core.
///
/// The pipeline: a ModelRegistry loads the three model artifacts once at
/// startup, a FeatureCatalog derives the fixed feature universe from them,
/// the FeatureAssembler turns each raw request into one catalog-aligned row,
/// the EnsemblePredictor runs every model over it, and the ResultFormatter
/// rounds the probabilities.
pub mod assembler;
pub mod bundle;
pub mod catalog;
pub mod formatter;
pub mod models;
pub mod predictor;
pub mod registry;

pub use assembler::FeatureAssembler;
pub use bundle::{BlendBundle, ModelBundle, PipelineModel};
pub use catalog::{FeatureCatalog, DIAGNOSIS_PREFIX};
pub use formatter::ResultFormatter;
pub use models::{FeatureRow, PredictionResult, RiskCategory};
pub use predictor::EnsemblePredictor;
pub use registry::ModelRegistry;
