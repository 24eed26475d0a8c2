//! Configuration management for quill.
//!
//! Separates secrets (environment variables) from settings (TOML file).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `BRAVE_API_KEY` - Brave Search API key (only needed when web search is enabled)
//!
//! ## Settings (TOML File)
//! Located at `~/.config/quill/config.toml`:
//! ```toml
//! [model]
//! base_url = "http://127.0.0.1:11434"
//! model = "llama3.1"
//!
//! [index]
//! data_dir = "data"
//! unused_dir = "unused_data"
//!
//! [gate]
//! domain_threshold = 0.1
//! ```

mod secrets;
mod settings;

pub use secrets::Secrets;
pub use settings::{
    AgentSettings, GateSettings, IndexSettings, ModelSettings, SearchDefaults, Settings,
    SettingsError, ToolsSettings, WebSearchSettings, WebToolsSettings,
};

/// Combined configuration containing both secrets and settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from the TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Web search is enabled but BRAVE_API_KEY is not set")]
    WebSearchKeyMissing,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Secrets come from environment variables, settings from the TOML
    /// file (falling back to defaults when no file exists).
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let secrets = Secrets::from_env();
        let settings = Settings::load()?;

        if settings.tools.web.search.enabled && secrets.brave_api_key.is_none() {
            return Err(ConfigError::WebSearchKeyMissing);
        }

        Ok(Self { secrets, settings })
    }

    /// Get the Brave Search API key (if configured).
    pub fn brave_api_key(&self) -> Option<&str> {
        self.secrets.brave_api_key.as_deref()
    }

    /// Whether web search can actually run (enabled and keyed).
    pub fn web_search_available(&self) -> bool {
        self.settings.tools.web.search.enabled && self.secrets.brave_api_key.is_some()
    }
}

/// Load .env file if it exists (for development convenience).
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
