//! Zero-shot text classification collaborator.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("classification request failed: {0}")]
    RequestFailed(String),
    #[error("classification response missing score for label '{0}'")]
    MissingScore(String),
}

/// Scores how well a text matches a candidate label, in `[0, 1]`.
#[async_trait::async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    async fn classify(&self, text: &str, label: &str) -> Result<f32, ClassifierError>;
}

/// HTTP client for a hosted zero-shot classification endpoint
/// (HuggingFace inference wire format: `inputs` + `candidate_labels`).
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest {
    model: String,
    inputs: String,
    parameters: ClassifyParameters,
}

#[derive(Debug, Serialize)]
struct ClassifyParameters {
    candidate_labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    labels: Vec<String>,
    scores: Vec<f32>,
}

#[async_trait::async_trait]
impl ZeroShotClassifier for HttpClassifier {
    async fn classify(&self, text: &str, label: &str) -> Result<f32, ClassifierError> {
        let url = format!("{}/classify", self.base_url);
        let body = ClassifyRequest {
            model: self.model.clone(),
            inputs: text.to_string(),
            parameters: ClassifyParameters {
                candidate_labels: vec![label.to_string()],
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::RequestFailed(format!("{status} {text}")));
        }

        let payload: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::RequestFailed(e.to_string()))?;

        payload
            .labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| payload.scores.get(i).copied())
            .ok_or_else(|| ClassifierError::MissingScore(label.to_string()))
    }
}
