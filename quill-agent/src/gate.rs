//! Relevance gates: domain scope and history usefulness.

use std::sync::Arc;

use tracing::{debug, warn};

use quill_core::ConversationTurn;

use crate::classifier::ZeroShotClassifier;
use crate::provider::{Provider, ProviderError};

/// Domain-scope gate backed by the zero-shot classifier.
pub struct DomainGate {
    classifier: Arc<dyn ZeroShotClassifier>,
    threshold: f32,
}

impl DomainGate {
    pub fn new(classifier: Arc<dyn ZeroShotClassifier>, threshold: f32) -> Self {
        Self {
            classifier,
            threshold,
        }
    }

    /// Whether the query is inside the configured domain.
    ///
    /// No domain means no gating. Classifier failures fail open — a
    /// broken classifier must not lock the user out — and are logged.
    pub async fn is_in_domain(&self, domain: Option<&str>, query: &str) -> bool {
        let Some(domain) = domain else {
            return true;
        };

        match self.classifier.classify(query, domain).await {
            Ok(score) => {
                debug!(domain, score, threshold = self.threshold, "domain check");
                score > self.threshold
            }
            Err(e) => {
                warn!(error = %e, "domain classifier unavailable, letting query through");
                true
            }
        }
    }
}

/// Ask the model whether the recent conversation helps answer the query.
///
/// Strict yes/no oracle; empty history is irrelevant by definition and
/// never reaches the model. Callers replace irrelevant history with
/// "No previous conversation." so stale turns cannot pollute the prompt.
pub async fn history_is_relevant(
    provider: &dyn Provider,
    query: &str,
    context: &str,
    sources: &[String],
    history: &[&ConversationTurn],
) -> Result<bool, ProviderError> {
    if history.is_empty() {
        return Ok(false);
    }

    let prompt = build_history_prompt(query, context, sources, history);
    let response = provider.complete(&prompt).await?;
    Ok(response.trim().to_lowercase().starts_with("yes"))
}

fn build_history_prompt(
    query: &str,
    context: &str,
    sources: &[String],
    history: &[&ConversationTurn],
) -> String {
    let mut parts = Vec::new();

    parts.push(
        "You decide whether earlier conversation is useful for answering a new \
         question. Answer strictly with 'yes' or 'no' only."
            .to_string(),
    );

    if !sources.is_empty() {
        parts.push("Indexed documents:".to_string());
        for source in sources {
            parts.push(format!("- {source}"));
        }
        parts.push(String::new());
    }

    if !context.trim().is_empty() {
        parts.push(format!("Retrieved context:\n{context}\n"));
    }

    parts.push("Conversation so far:".to_string());
    for turn in history {
        parts.push(format!("{}: {}", turn.role.label(), turn.text));
    }
    parts.push(String::new());

    parts.push(format!("New question: {query}\n"));
    parts.push("Is the conversation above useful for answering it? ".to_string());

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::TurnRole;

    #[test]
    fn history_prompt_includes_turns_and_question() {
        let turns = [
            ConversationTurn::user("what is a bond?"),
            ConversationTurn::assistant("a bond is a debt instrument"),
        ];
        let refs: Vec<&ConversationTurn> = turns.iter().collect();
        let sources = vec!["finance.txt".to_string()];
        let prompt = build_history_prompt("and a stock?", "bond basics", &sources, &refs);

        assert!(prompt.contains("- finance.txt"));
        assert!(prompt.contains("User: what is a bond?"));
        assert!(prompt.contains("Assistant: a bond is a debt instrument"));
        assert!(prompt.contains("New question: and a stock?"));
        assert!(prompt.contains("'yes' or 'no'"));
        assert_eq!(turns[0].role, TurnRole::User);
    }
}
