use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use quill_index::ContentStore;

use crate::context::build_context;
use crate::tools::Tool;

#[derive(Debug, Deserialize)]
struct LocalSearchInput {
    query: String,
}

/// Similarity search over the local document index.
pub struct LocalSearchTool {
    store: Arc<ContentStore>,
    top_k: usize,
}

impl LocalSearchTool {
    pub fn new(store: Arc<ContentStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }
}

#[async_trait::async_trait]
impl Tool for LocalSearchTool {
    fn name(&self) -> &str {
        "local_search"
    }

    fn description(&self) -> &str {
        "Search the local document index and return the most relevant passages. \
         Always try this before web_search."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"}
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let input: LocalSearchInput = serde_json::from_value(args).map_err(|e| e.to_string())?;

        let results = self.store.similarity_search(&input.query, self.top_k).await;
        if results.is_empty() {
            return Ok("No matching passages in the local index.".to_string());
        }
        Ok(build_context(&results))
    }
}
