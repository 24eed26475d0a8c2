//! The bounded tool-use reasoning loop.
//!
//! Each iteration sends the transcript so far to the model and parses
//! one step back: either an action (tool name + JSON input) or a final
//! answer. Observations — including tool failures — go back into the
//! transcript; only an unreachable model ends the turn.

use std::sync::Arc;

use tracing::{debug, info};

use crate::provider::{Provider, ProviderError};
use crate::tools::{ToolKind, ToolSet};

const LOOP_PROMPT: &str = "\
You are an assistant answering questions from custom data stored in a local \
document index. Combine retrieved context with your own reasoning. Format \
numbers without thousand separators and with a period as the decimal \
separator; never round unless the question asks for it.

You may break the question into subtasks and use one tool per step.

Available tools:
{tool_desc}

Whenever you need more information, ALWAYS call local_search before \
web_search. web_search is allowed only after local_search has been tried. \
Use calculator only when the question requires arithmetic. When the answer \
is ready, do not call any tool.

Respond in exactly one of these two formats.

To use a tool:
Thought: why this tool is needed
Action: tool name (one of {tool_names})
Action Input: JSON arguments for the tool, e.g. {\"query\": \"...\"}

To finish:
Thought: I can answer now.
Answer: the answer, in the same language as the question

The tool result will come back as:
Observation: tool response

When a calculator observation is available, reuse its exact value; never \
invent numbers.";

/// One parsed model step.
#[derive(Debug, Clone, PartialEq)]
enum Step {
    Action { tool: String, input: String },
    Answer(String),
}

pub struct ToolLoop {
    provider: Arc<dyn Provider>,
    tools: ToolSet,
    max_iterations: usize,
}

impl ToolLoop {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolSet, max_iterations: usize) -> Self {
        Self {
            provider,
            tools,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Drive the loop for one query. `history` is the (already filtered)
    /// conversation transcript or "No previous conversation.".
    pub async fn run(&self, query: &str, history: &str) -> Result<String, ProviderError> {
        let mut transcript: Vec<String> = Vec::new();
        let mut local_search_tried = false;

        for iteration in 0..self.max_iterations {
            let prompt = self.render_prompt(query, history, &transcript);
            let output = self.provider.complete(&prompt).await?;
            debug!(iteration, output = %output, "loop step");

            match parse_step(&output) {
                Step::Answer(answer) => {
                    info!(iterations = iteration + 1, "loop answered");
                    return Ok(answer);
                }
                Step::Action { tool, input } => {
                    transcript.push(output.trim().to_string());
                    let observation = self
                        .observe(&tool, &input, &mut local_search_tried)
                        .await;
                    transcript.push(format!("Observation: {observation}"));
                }
            }
        }

        // Iteration cap hit: one final completion with tools withheld.
        info!(max_iterations = self.max_iterations, "iteration cap reached, forcing answer");
        let prompt = format!(
            "{}\n\nNo more tool calls are allowed. Give your best final answer now.\nAnswer: ",
            self.render_prompt(query, history, &transcript)
        );
        self.provider.complete(&prompt).await.map(|out| {
            match parse_step(&out) {
                Step::Answer(answer) => answer,
                Step::Action { .. } => out.trim().to_string(),
            }
        })
    }

    async fn observe(&self, tool: &str, input: &str, local_search_tried: &mut bool) -> String {
        let Some(kind) = ToolKind::from_name(tool) else {
            return format!(
                "Error: unknown tool '{tool}'. Available tools: local_search, web_search, calculator."
            );
        };

        if kind == ToolKind::WebSearch && !*local_search_tried {
            return "Error: web_search is not allowed yet. Try local_search for this \
                    question first."
                .to_string();
        }

        let args = match serde_json::from_str(input) {
            Ok(value) => value,
            Err(e) => return format!("Error: Action Input is not valid JSON ({e})"),
        };

        if kind == ToolKind::LocalSearch {
            *local_search_tried = true;
        }

        info!(tool = kind.name(), "executing tool");
        match self.tools.execute(kind, args).await {
            Ok(output) => output,
            Err(e) => format!("Error: {e}"),
        }
    }

    fn render_prompt(&self, query: &str, history: &str, transcript: &[String]) -> String {
        let system = LOOP_PROMPT
            .replace("{tool_desc}", &self.tools.describe())
            .replace(
                "{tool_names}",
                &ToolKind::ALL
                    .iter()
                    .map(|k| k.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            );

        let mut prompt = format!(
            "{system}\n\nPrevious conversation:\n{history}\n\nQuestion: {query}\n"
        );
        for entry in transcript {
            prompt.push('\n');
            prompt.push_str(entry);
        }
        prompt.push_str("\nThought: ");
        prompt
    }
}

/// Parse one model step from raw output.
///
/// An `Answer:` line wins when it appears before any `Action:`; output
/// with neither is treated as a bare answer.
fn parse_step(output: &str) -> Step {
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("Answer:") {
            // The answer spans from the marker to the next protocol
            // marker (if any), across lines.
            let rest = output
                .split_once("Answer:")
                .map(|(_, rest)| rest)
                .unwrap_or_default();
            let mut answer_lines = Vec::new();
            for answer_line in rest.lines() {
                let t = answer_line.trim();
                if t.starts_with("Action:")
                    || t.starts_with("Action Input:")
                    || t.starts_with("Thought:")
                    || t.starts_with("Observation:")
                {
                    break;
                }
                answer_lines.push(answer_line);
            }
            return Step::Answer(answer_lines.join("\n").trim().to_string());
        }
        if let Some(name) = trimmed.strip_prefix("Action:") {
            let input = output
                .split_once("Action Input:")
                .map(|(_, rest)| rest.trim().to_string())
                .unwrap_or_default();
            return Step::Action {
                tool: clean_tool_name(name),
                input,
            };
        }
    }

    Step::Answer(output.trim().to_string())
}

/// Tool names sometimes arrive decorated ("`local_search`", "local_search tool").
fn clean_tool_name(raw: &str) -> String {
    raw.trim()
        .trim_matches('`')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches('`')
        .to_string()
}
