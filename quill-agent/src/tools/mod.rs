pub mod calculator;
pub mod local_search;
pub mod web_search;

pub use calculator::CalculatorTool;
pub use local_search::LocalSearchTool;
pub use web_search::WebSearchTool;

use serde_json::Value;

/// Trait that all tools must implement
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Name of the tool (must match regex `^[a-zA-Z0-9_-]{1,64}$`)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// Errors are plain strings: the loop folds them back into the
    /// transcript as observations, they are never fatal.
    async fn execute(&self, args: Value) -> Result<String, String>;
}

/// The closed set of actions the reasoning loop can take.
///
/// Dispatch goes through this enum rather than tool-name strings so the
/// compiler checks every arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    LocalSearch,
    WebSearch,
    Calculator,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [
        ToolKind::LocalSearch,
        ToolKind::WebSearch,
        ToolKind::Calculator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::LocalSearch => "local_search",
            ToolKind::WebSearch => "web_search",
            ToolKind::Calculator => "calculator",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "local_search" => Some(ToolKind::LocalSearch),
            "web_search" => Some(ToolKind::WebSearch),
            "calculator" => Some(ToolKind::Calculator),
            _ => None,
        }
    }
}

/// Owns the tool instances and dispatches by [`ToolKind`].
pub struct ToolSet {
    local: LocalSearchTool,
    web: Option<std::sync::Arc<WebSearchTool>>,
    calculator: CalculatorTool,
}

impl ToolSet {
    pub fn new(local: LocalSearchTool, web: Option<std::sync::Arc<WebSearchTool>>) -> Self {
        Self {
            local,
            web,
            calculator: CalculatorTool,
        }
    }

    /// Execute one tool. Unavailable or failing tools report through the
    /// error string, never through a panic or a typed error.
    pub async fn execute(&self, kind: ToolKind, args: Value) -> Result<String, String> {
        match kind {
            ToolKind::LocalSearch => self.local.execute(args).await,
            ToolKind::WebSearch => match &self.web {
                Some(tool) => tool.execute(args).await,
                None => Err("web_search is disabled in configuration".to_string()),
            },
            ToolKind::Calculator => self.calculator.execute(args).await,
        }
    }

    /// Render names, descriptions and schemas for the loop prompt.
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        for kind in ToolKind::ALL {
            let (name, description, schema) = match kind {
                ToolKind::LocalSearch => (
                    self.local.name(),
                    self.local.description(),
                    self.local.input_schema(),
                ),
                ToolKind::WebSearch => match &self.web {
                    Some(tool) => (tool.name(), tool.description(), tool.input_schema()),
                    None => continue,
                },
                ToolKind::Calculator => (
                    self.calculator.name(),
                    self.calculator.description(),
                    self.calculator.input_schema(),
                ),
            };
            lines.push(format!("- {name}: {description}\n  Input schema: {schema}"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("unknown"), None);
        assert_eq!(ToolKind::from_name(" calculator "), Some(ToolKind::Calculator));
    }
}
