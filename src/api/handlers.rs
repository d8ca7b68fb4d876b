use crate::api::AppState;
use crate::assistant::Intent;
use crate::error::{AppError, Result};
use crate::risk::{EnsemblePredictor, FeatureAssembler, PredictionResult, ResultFormatter};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use validator::Validate;

/// Shown in place of a narrative summary when the assistant is not
/// configured or unavailable
const FALLBACK_SUMMARY: &str =
    "Risk estimates are attached. A narrative interpretation is currently unavailable; \
     please consult the treating clinician.";

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness endpoint. The process only starts with the full model set
/// loaded, so a responding process is by construction a ready one; the
/// payload describes what that set looks like.
pub async fn readiness(State(state): State<AppState>) -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready".to_string(),
        models: state.registry.categories().map(|c| c.to_string()).collect(),
        catalog_features: state.catalog.len(),
        assistant_enabled: state.assistant.is_some(),
    })
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub models: Vec<String>,
    pub catalog_features: usize,
    pub assistant_enabled: bool,
}

/// Run the risk models over one patient payload
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>> {
    let (icd_codes, measurements) = request.into_parts()?;

    let row = FeatureAssembler::assemble(&icd_codes, &measurements, &state.catalog)?;
    let raw = EnsemblePredictor::predict_all(&row, &state.registry)?;
    let result = ResultFormatter::format(&raw)?;

    // The summary is a courtesy; its failure must never fail the prediction.
    let message = match &state.assistant {
        Some(assistant) => match assistant.summarize_prediction(&result).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Prediction summary unavailable");
                FALLBACK_SUMMARY.to_string()
            }
        },
        None => FALLBACK_SUMMARY.to_string(),
    };

    Ok(Json(PredictResponse { result, message }))
}

/// Prediction request payload. The two top-level shapes are validated
/// before feature assembly; anything else inside them is the assembler's
/// concern.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub icd_codes: Value,
    #[serde(default)]
    pub features: Value,
}

impl PredictRequest {
    fn into_parts(self) -> Result<(Vec<String>, serde_json::Map<String, Value>)> {
        let icd_codes = match self.icd_codes {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(code) => Ok(code),
                    other => Err(AppError::Validation(format!(
                        "icd_codes entries must be strings, got {}",
                        json_type_name(&other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(AppError::Validation(format!(
                    "icd_codes must be a list of strings, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let measurements = match self.features {
            Value::Null => serde_json::Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(AppError::Validation(format!(
                    "features must be an object of measurements, got {}",
                    json_type_name(&other)
                )))
            }
        };

        Ok((icd_codes, measurements))
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub result: PredictionResult,
    pub message: String,
}

/// Classify a free-text question and dispatch the matching reply
pub async fn intent(
    State(state): State<AppState>,
    Json(request): Json<IntentRequest>,
) -> Result<Json<IntentResponse>> {
    request.validate()?;
    let question = request.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("question must not be blank".to_string()));
    }

    let intent = match &state.assistant {
        Some(assistant) => match assistant.detect_intent(question).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "Intent classification unavailable");
                Intent::Unclassified
            }
        },
        None => Intent::Unclassified,
    };

    let response = match (&state.assistant, intent) {
        (_, Intent::Introduction) => IntentResponse::introduction(),
        (_, Intent::Prediction) => IntentResponse::prediction_form(),
        (Some(assistant), Intent::Chat) => IntentResponse {
            intent: Intent::Chat,
            message: assistant.answer_question(question).await?,
            require_form: None,
        },
        (_, other_intent) => IntentResponse::fallback(other_intent),
    };

    Ok(Json(response))
}

#[derive(Debug, Deserialize, Validate)]
pub struct IntentRequest {
    #[validate(length(min = 1, message = "question must not be blank"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent: Intent,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_form: Option<bool>,
}

impl IntentResponse {
    fn introduction() -> Self {
        Self {
            intent: Intent::Introduction,
            message: "Hello, I am HygieAI, an intelligent pancreatic clinic assistant. \
                      I can answer medical questions, and I can take clinical features \
                      and estimate the risks of intra-abdominal bleeding, infection, \
                      and an adverse surgical outcome."
                .to_string(),
            require_form: None,
        }
    }

    fn prediction_form() -> Self {
        Self {
            intent: Intent::Prediction,
            message: "I can help estimate those risks. Please fill in the structured \
                      clinical form."
                .to_string(),
            require_form: Some(true),
        }
    }

    fn fallback(intent: Intent) -> Self {
        Self {
            intent,
            message: "Sorry, I could not relate your question to anything I can help with."
                .to_string(),
            require_form: None,
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
