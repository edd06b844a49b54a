//! focuscoach-providers — content generator backends.
//!
//! Implements the `ContentGenerator` trait for Google Gemini, Ollama and an
//! offline mock, plus the TOML configuration that selects between them.

pub mod config;
pub mod error;
pub mod gemini;
pub mod mock;
pub mod ollama;

pub use config::{
    create_provider, load_config, load_config_from, CoachConfig, ProviderConfig, GEMINI_KEY_VAR,
};
pub use error::ProviderError;
