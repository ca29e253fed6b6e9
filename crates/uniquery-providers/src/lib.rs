//! uniquery-providers: text-generation backends and configuration.
//!
//! Implements the `LlmProvider` trait for any OpenAI-compatible
//! chat-completions endpoint (Groq by default) and an offline mock, and
//! loads `uniquery.toml`.

pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, ProviderConfig, UniqueryConfig};
pub use error::ProviderError;
