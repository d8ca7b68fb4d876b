use crate::assistant::intent::Intent;
use crate::config::AssistantConfig;
use crate::error::{AppError, Result};
use crate::risk::{PredictionResult, RiskCategory};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const QA_SYSTEM_PROMPT: &str = "You are a gastroenterology assistant specializing in \
infected pancreatic necrosis and related pancreatic disease. Answer medical questions \
accurately, professionally, and briefly.";

const INTENT_SYSTEM_PROMPT: &str = "You are an intent classification model. Reply with \
exactly one label: `introduction`, `prediction`, `chat`, or `other`.\n\
- introduction: the user asks what you can do or how to use you.\n\
- prediction: the user wants to supply clinical features for a local risk model.\n\
- chat: general medical or pancreatic-disease question answering.\n\
- other: anything unrelated to medicine, or that you should refuse.\n\
Output the label only, with no explanation.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a clinical assistant skilled in patient \
communication and risk assessment.";

/// Chat-completions client backing intent routing, medical Q&A, and
/// prediction summaries.
#[derive(Clone, Debug)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl AssistantClient {
    /// Create a new assistant client; fails when no API key is configured
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::Configuration("assistant API key is not configured".to_string())
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    /// Answer a free-text medical question
    pub async fn answer_question(&self, question: &str) -> Result<String> {
        self.chat(QA_SYSTEM_PROMPT, question, 0.7, self.max_tokens)
            .await
    }

    /// Classify a question into an [`Intent`]. Off-label classifier output
    /// maps to `Intent::Unclassified` rather than erroring.
    pub async fn detect_intent(&self, question: &str) -> Result<Intent> {
        // Temperature 0 keeps classification reproducible.
        let label = self.chat(INTENT_SYSTEM_PROMPT, question, 0.0, 8).await?;
        let intent = Intent::from_label(&label);
        debug!(label = %label.trim(), intent = ?intent, "Intent classified");
        Ok(intent)
    }

    /// Turn the three rounded probabilities into a narrative interpretation
    /// for patients and non-specialist staff
    pub async fn summarize_prediction(&self, result: &PredictionResult) -> Result<String> {
        let prompt = build_summary_prompt(result);
        self.chat(SUMMARY_SYSTEM_PROMPT, &prompt, 0.7, self.max_tokens)
            .await
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Assistant(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Assistant(format!(
                "upstream returned {}: {}",
                status, body
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Assistant(format!("malformed completion: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Assistant("completion contained no choices".to_string()))
    }
}

/// Build the summarization prompt. Probabilities appear at 4 decimal places,
/// matching what the formatter produced.
fn build_summary_prompt(result: &PredictionResult) -> String {
    let probability = |category| result.get(category).unwrap_or(f64::NAN);
    format!(
        "A model has estimated three risk probabilities for a prospective pancreatic \
         intervention. Write a short interpretation for patients and non-specialist staff, \
         in plain language, as bullet points, with initial recommendations.\n\n\
         Model estimates:\n\
         - Intra-abdominal bleeding (Bleeding): {:.4}\n\
         - Intra-abdominal infection (Infection): {:.4}\n\
         - Adverse surgical outcome (Outcome): {:.4}\n\n\
         Note that an Outcome value above 0.2 already carries meaningful risk.",
        probability(RiskCategory::Bleeding),
        probability(RiskCategory::Infection),
        probability(RiskCategory::Outcome),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn test_config(base_url: &str) -> AssistantConfig {
        AssistantConfig {
            enabled: true,
            base_url: base_url.to_string(),
            model: "qwen-turbo".to_string(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 5,
            max_tokens: 64,
        }
    }

    fn completion_body(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    fn test_result() -> PredictionResult {
        PredictionResult {
            probabilities: BTreeMap::from([
                (RiskCategory::Bleeding, 0.1235),
                (RiskCategory::Infection, 0.2),
                (RiskCategory::Outcome, 0.64),
            ]),
        }
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let mut config = test_config("http://localhost");
        config.api_key = None;
        assert!(matches!(
            AssistantClient::new(&config).unwrap_err(),
            AppError::Configuration(_)
        ));

        config.api_key = Some("   ".to_string());
        assert!(AssistantClient::new(&config).is_err());
    }

    #[test]
    fn test_summary_prompt_formats_four_decimals() {
        let prompt = build_summary_prompt(&test_result());

        assert!(prompt.contains("(Bleeding): 0.1235"));
        assert!(prompt.contains("(Infection): 0.2000"));
        assert!(prompt.contains("(Outcome): 0.6400"));
    }

    #[tokio::test]
    async fn test_answer_question_returns_completion() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("Necrosectomy is usually delayed."))
            .create_async()
            .await;

        let client = AssistantClient::new(&test_config(&server.url())).unwrap();
        let answer = client.answer_question("When is necrosectomy done?").await;

        mock.assert_async().await;
        assert_eq!(answer.unwrap(), "Necrosectomy is usually delayed.");
    }

    #[tokio::test]
    async fn test_detect_intent_maps_label() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("prediction\n"))
            .create_async()
            .await;

        let client = AssistantClient::new(&test_config(&server.url())).unwrap();
        let intent = client.detect_intent("please assess my risk").await.unwrap();

        assert_eq!(intent, Intent::Prediction);
    }

    #[tokio::test]
    async fn test_detect_intent_off_label_is_unclassified() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion_body("that depends on the context"))
            .create_async()
            .await;

        let client = AssistantClient::new(&test_config(&server.url())).unwrap();
        let intent = client.detect_intent("hmm").await.unwrap();

        assert_eq!(intent, Intent::Unclassified);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_assistant_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("overloaded")
            .create_async()
            .await;

        let client = AssistantClient::new(&test_config(&server.url())).unwrap();
        let err = client.summarize_prediction(&test_result()).await.unwrap_err();

        assert!(matches!(err, AppError::Assistant(_)));
        assert!(err.to_string().contains("500"));
    }
}
