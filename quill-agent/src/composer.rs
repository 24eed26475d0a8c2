//! Tiered answer fallback.
//!
//! The reasoning loop's answer is the local-context tier. When the model
//! reports insufficient knowledge ("I don't know"), one web-augmented
//! completion runs, and if that also comes up empty, one
//! general-knowledge completion. Each fallback answer carries a
//! disclosure prefix; no tier is retried.

use std::sync::Arc;

use tracing::info;

use crate::provider::{Provider, ProviderError};
use crate::tools::WebSearchTool;

pub const WEB_ANSWER_NOTE: &str = "Note: this answer is based on web search results. ";
pub const GENERAL_ANSWER_NOTE: &str =
    "Note: this answer is based on the model's general knowledge. ";

const DONT_KNOW: &str = "i don't know";

pub struct AnswerComposer {
    provider: Arc<dyn Provider>,
    web: Option<Arc<WebSearchTool>>,
}

impl AnswerComposer {
    pub fn new(provider: Arc<dyn Provider>, web: Option<Arc<WebSearchTool>>) -> Self {
        Self { provider, web }
    }

    /// Run the fallback tiers over the loop's draft answer.
    pub async fn compose(&self, query: &str, draft: String) -> Result<String, ProviderError> {
        if !contains_dont_know(&draft) {
            return Ok(draft);
        }

        if let Some(web) = &self.web {
            match web.search_text(query).await {
                Ok(results) => {
                    info!("local answer insufficient, trying web results");
                    let answer = self
                        .provider
                        .complete(&web_prompt(query, &results))
                        .await?;
                    if !contains_dont_know(&answer) {
                        return Ok(format!("{WEB_ANSWER_NOTE}{answer}"));
                    }
                }
                Err(e) => {
                    info!(error = %e, "web search unavailable, falling through");
                }
            }
        }

        info!("falling back to general knowledge");
        let answer = self.provider.complete(&general_prompt(query)).await?;
        Ok(format!("{GENERAL_ANSWER_NOTE}{answer}"))
    }
}

fn contains_dont_know(text: &str) -> bool {
    text.to_lowercase().contains(DONT_KNOW)
}

fn web_prompt(query: &str, results: &str) -> String {
    format!(
        "You are a highly knowledgeable assistant for question-answering tasks. \
         Use the following web search results to answer the question. If you \
         don't know the answer, strictly answer with \"I don't know\" only. \
         Provide a concise answer in four sentences maximum.\n\n\
         Question: {query}\nWeb results:\n{results}\nAnswer: "
    )
}

fn general_prompt(query: &str) -> String {
    format!(
        "You are a highly knowledgeable assistant for question-answering tasks. \
         Provide a concise answer in four sentences maximum, using your own \
         knowledge.\n\nQuestion: {query}\nAnswer: "
    )
}
