//! Provider trait for abstracting the language-model collaborator.

/// Provider error types
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The model service could not be reached at all. The session
    /// degrades the whole turn to a fixed user-facing message.
    #[error("model service unreachable: {0}")]
    Unavailable(String),
    #[error("API error: {message}")]
    Api { message: String },
    #[error("No content in response")]
    NoContent,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A completion-capable language model backend.
///
/// The reasoning loop, the relevance oracle, and the answer composer all
/// talk to the model exclusively through this trait, so control flow is
/// testable with scripted fakes.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Current model
    fn model(&self) -> &str;

    /// Send a single prompt and return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
