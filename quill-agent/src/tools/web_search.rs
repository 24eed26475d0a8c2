use serde::Deserialize;
use serde_json::{Value, json};

use crate::tools::Tool;
use crate::web::search::{SearchError, WebSearchQuery, WebSearchService};

#[derive(Debug, Deserialize)]
struct WebSearchInput {
    query: String,
    count: Option<usize>,
}

/// Web search via the configured provider, flattened to a text blob.
pub struct WebSearchTool {
    service: WebSearchService,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(service: WebSearchService, max_results: usize) -> Self {
        Self {
            service,
            max_results,
        }
    }

    fn format_error(err: SearchError) -> String {
        match err {
            SearchError::Disabled => "web_search is disabled in configuration".to_string(),
            SearchError::UnsupportedProvider(provider) => {
                format!("web_search provider '{}' is not supported", provider)
            }
            SearchError::MissingApiKey(key_name) => {
                format!("{key_name} is not set (required for web_search)")
            }
            SearchError::RateLimited(delay) => {
                format!("web search rate limited. Wait {:?} before retrying.", delay)
            }
            SearchError::RequestFailed(msg) => format!("web_search request failed: {}", msg),
        }
    }

    /// Run a search outside the loop (used by the answer composer).
    pub async fn search_text(&self, query: &str) -> Result<String, String> {
        let query = WebSearchQuery {
            query: query.to_string(),
            count: Some(self.max_results),
        };
        let response = self
            .service
            .search(query)
            .await
            .map_err(Self::format_error)?;
        if response.results.is_empty() {
            return Ok("No web results found.".to_string());
        }
        Ok(response.as_text())
    }
}

#[async_trait::async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Only allowed after local_search \
         has been tried for the same question."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "count": {"type": "integer", "minimum": 1}
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: WebSearchInput = serde_json::from_value(args).map_err(|e| e.to_string())?;

        let count = input
            .count
            .map(|c| c.clamp(1, self.max_results))
            .or(Some(self.max_results));
        let query = WebSearchQuery {
            query: input.query,
            count,
        };

        let response = self
            .service
            .search(query)
            .await
            .map_err(Self::format_error)?;
        if response.results.is_empty() {
            return Ok("No web results found.".to_string());
        }
        Ok(response.as_text())
    }
}
