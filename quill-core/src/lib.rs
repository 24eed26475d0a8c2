//! Shared configuration and message types for quill.

pub mod config;
pub mod message;

pub use config::{
    AgentSettings, Config, ConfigError, GateSettings, IndexSettings, ModelSettings,
    SearchDefaults, Secrets, Settings, SettingsError, WebSearchSettings, load_dotenv,
};
pub use message::{ConversationTurn, TurnRole};
