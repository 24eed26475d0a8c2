use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::web::cache::TimedCache;

pub mod brave;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchQuery {
    pub query: String,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResponse {
    pub provider: String,
    pub results: Vec<WebSearchResult>,
}

impl WebSearchResponse {
    /// Flatten results into the single text blob consumed by prompts.
    pub fn as_text(&self) -> String {
        self.results
            .iter()
            .map(|result| match &result.snippet {
                Some(snippet) => format!("{} ({})\n{}", result.title, result.url, snippet),
                None => format!("{} ({})", result.title, result.url),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("web search is disabled")]
    Disabled,
    #[error("unsupported web search provider: {0}")]
    UnsupportedProvider(String),
    #[error("missing API key ({0})")]
    MissingApiKey(&'static str),
    #[error("rate limited, retry after {0:?}")]
    RateLimited(Duration),
    #[error("request failed: {0}")]
    RequestFailed(String),
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &WebSearchQuery) -> Result<WebSearchResponse, SearchError>;
}

/// Provider wrapper with a per-service response cache.
pub struct WebSearchService {
    provider: Box<dyn SearchProvider>,
    cache: TimedCache<String, WebSearchResponse>,
}

impl WebSearchService {
    pub fn new(provider: Box<dyn SearchProvider>, cache_ttl: Duration) -> Self {
        Self {
            provider,
            cache: TimedCache::new(cache_ttl),
        }
    }

    pub async fn search(&self, query: WebSearchQuery) -> Result<WebSearchResponse, SearchError> {
        let cache_key = format!("{}|{:?}", query.query, query.count);

        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        let response = self.provider.search(&query).await?;
        self.cache.set(cache_key, response.clone()).await;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_flattens_to_text() {
        let response = WebSearchResponse {
            provider: "test".to_string(),
            results: vec![
                WebSearchResult {
                    title: "First".to_string(),
                    url: "https://a.example".to_string(),
                    snippet: Some("snippet one".to_string()),
                },
                WebSearchResult {
                    title: "Second".to_string(),
                    url: "https://b.example".to_string(),
                    snippet: None,
                },
            ],
        };

        let text = response.as_text();
        assert!(text.contains("First (https://a.example)\nsnippet one"));
        assert!(text.contains("Second (https://b.example)"));
    }
}
