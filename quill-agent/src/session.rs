//! High-level chat session.
//!
//! One session serves one user, strictly sequentially: domain gate →
//! query normalization → history gate → reasoning loop → answer
//! composition. Nothing below this layer surfaces an error to the UI;
//! an unreachable model degrades the turn to a fixed message.

use std::sync::Arc;

use tracing::{error, info};

use quill_core::{ConversationTurn, Settings};
use quill_index::ContentStore;

use crate::agent::ToolLoop;
use crate::classifier::ZeroShotClassifier;
use crate::composer::AnswerComposer;
use crate::context::build_context;
use crate::gate::{DomainGate, history_is_relevant};
use crate::memory::ConversationMemory;
use crate::normalize::normalize_numbers;
use crate::provider::{Provider, ProviderError};
use crate::tools::{LocalSearchTool, ToolSet, WebSearchTool};

pub const OUT_OF_DOMAIN_MESSAGE: &str = "I am afraid your query is not related to the \
     domain you specified. Please change either the domain or the question.";

pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "There was an issue connecting to the \
     model service. Please make sure it is running and try again later.";

pub const NO_HISTORY: &str = "No previous conversation.";

/// Tunables for one session, resolved from [`Settings`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub domain: Option<String>,
    pub domain_threshold: f32,
    pub top_k: usize,
    pub tool_top_k: usize,
    pub history_window: usize,
    pub memory_token_limit: u32,
    pub max_iterations: usize,
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            domain: None,
            domain_threshold: settings.gate.domain_threshold,
            top_k: settings.search.top_k,
            tool_top_k: settings.search.tool_top_k,
            history_window: settings.agent.history_window,
            memory_token_limit: settings.agent.memory_token_limit,
            max_iterations: settings.agent.max_iterations,
        }
    }
}

pub struct ChatSession {
    provider: Arc<dyn Provider>,
    store: Arc<ContentStore>,
    gate: DomainGate,
    tool_loop: ToolLoop,
    composer: AnswerComposer,
    memory: ConversationMemory,
    domain: Option<String>,
    top_k: usize,
    history_window: usize,
}

impl ChatSession {
    pub fn new(
        config: SessionConfig,
        provider: Arc<dyn Provider>,
        classifier: Arc<dyn ZeroShotClassifier>,
        store: Arc<ContentStore>,
        web: Option<Arc<WebSearchTool>>,
    ) -> Self {
        let gate = DomainGate::new(classifier, config.domain_threshold);
        let tools = ToolSet::new(
            LocalSearchTool::new(store.clone(), config.tool_top_k),
            web.clone(),
        );
        let tool_loop = ToolLoop::new(provider.clone(), tools, config.max_iterations);
        let composer = AnswerComposer::new(provider.clone(), web);

        Self {
            provider,
            store,
            gate,
            tool_loop,
            composer,
            memory: ConversationMemory::new(config.memory_token_limit),
            domain: config.domain,
            top_k: config.top_k,
            history_window: config.history_window,
        }
    }

    /// Set or clear the topic scope for this session.
    pub fn set_domain(&mut self, domain: Option<String>) {
        self.domain = domain;
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Answer one query. Never returns an error to the caller: an
    /// unreachable model service degrades to a fixed message.
    pub async fn ask(&mut self, query: &str) -> String {
        match self.ask_inner(query).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(error = %e, "turn aborted, model service unavailable");
                SERVICE_UNAVAILABLE_MESSAGE.to_string()
            }
        }
    }

    async fn ask_inner(&mut self, query: &str) -> Result<String, ProviderError> {
        if !self.gate.is_in_domain(self.domain.as_deref(), query).await {
            info!("query rejected by domain gate");
            return Ok(OUT_OF_DOMAIN_MESSAGE.to_string());
        }

        // Normalization runs once, before the loop, never per tool call.
        let normalized = normalize_numbers(query);

        let preview = self.store.similarity_search(&normalized, self.top_k).await;
        let context = build_context(&preview);

        let history_text = if self.memory.is_empty() {
            NO_HISTORY.to_string()
        } else {
            let sources = self.store.list_sources().await.unwrap_or_default();
            let recent = self.memory.recent(self.history_window);
            let relevant = history_is_relevant(
                self.provider.as_ref(),
                &normalized,
                &context,
                &sources,
                &recent,
            )
            .await?;
            if relevant {
                self.memory.transcript()
            } else {
                info!("conversation history judged irrelevant for this query");
                NO_HISTORY.to_string()
            }
        };

        let draft = self.tool_loop.run(&normalized, &history_text).await?;
        let answer = self.composer.compose(&normalized, draft).await?;

        self.memory.push(ConversationTurn::user(query));
        self.memory.push(ConversationTurn::assistant(answer.clone()));

        Ok(answer)
    }
}
