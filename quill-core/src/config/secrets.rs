//! Secrets loaded from environment variables.

/// API keys and other sensitive values, never read from the TOML file.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Brave Search API key (`BRAVE_API_KEY`)
    pub brave_api_key: Option<String>,
}

impl Secrets {
    /// Read all known secrets from the environment.
    ///
    /// Empty values are treated as unset.
    pub fn from_env() -> Self {
        Self {
            brave_api_key: read_env("BRAVE_API_KEY"),
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
