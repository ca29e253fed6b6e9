//! Configuration loading and the provider factory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use uniquery_core::traits::{GenerateRequest, LlmProvider};
use uniquery_render::document::{PageConfig, DEFAULT_FOOTER};

use crate::mock::{MockProvider, DEFAULT_MOCK_RESPONSE};
use crate::openai::{OpenAiProvider, DEFAULT_TIMEOUT_SECS};

/// Environment variable that overrides the API key of the default provider.
pub const API_KEY_ENV: &str = "UNIQUERY_API_KEY";

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat-completions endpoint. Groq when `base_url` is unset.
    #[serde(rename = "openai")]
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        /// Model ids to advertise instead of the built-in list.
        #[serde(default)]
        models: Vec<String>,
    },
    /// Offline provider. `responses` maps prompt substrings to replies;
    /// `response` answers everything else.
    Mock {
        #[serde(default)]
        response: Option<String>,
        #[serde(default)]
        responses: BTreeMap<String, String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                models,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("models", models)
                .finish(),
            ProviderConfig::Mock {
                response,
                responses,
            } => f
                .debug_struct("Mock")
                .field("response_len", &response.as_ref().map(String::len))
                .field("prompts", &responses.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Top-level uniquery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniqueryConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature, 0.0 to 1.0.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default)]
    pub page: PageConfig,
    /// Line stamped at the bottom of every rendered page.
    #[serde(default = "default_footer")]
    pub footer: String,
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_model() -> String {
    "llama3-8b-8192".to_string()
}
fn default_temperature() -> f64 {
    uniquery_core::traits::DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    uniquery_core::traits::DEFAULT_MAX_TOKENS
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_top_p() -> f64 {
    uniquery_core::traits::DEFAULT_TOP_P
}
fn default_footer() -> String {
    DEFAULT_FOOTER.to_string()
}

impl Default for UniqueryConfig {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
            top_p: default_top_p(),
            page: PageConfig::default(),
            footer: default_footer(),
        }
    }
}

impl UniqueryConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.temperature) {
            anyhow::bail!("temperature must be between 0.0 and 1.0, got {}", self.temperature);
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            anyhow::bail!("top_p must be in (0.0, 1.0], got {}", self.top_p);
        }
        if self.max_tokens == 0 {
            anyhow::bail!("max_tokens must be positive");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be positive");
        }
        if self.page.height_budget <= 0.0 {
            anyhow::bail!("page.height_budget must be positive");
        }
        Ok(())
    }

    /// Instantiate the named provider, or the default one.
    pub fn provider(&self, name: Option<&str>) -> Result<Box<dyn LlmProvider>> {
        let name = name.unwrap_or(&self.default_provider);
        let config = self.providers.get(name).with_context(|| {
            format!(
                "provider '{name}' is not configured (set {API_KEY_ENV} or add [providers.{name}] to uniquery.toml)"
            )
        })?;
        create_provider(name, config, self.timeout_secs)
    }

    /// A generation request carrying the configured sampling parameters.
    pub fn request(&self, model: Option<&str>, prompt: impl Into<String>) -> GenerateRequest {
        let mut request = GenerateRequest::new(model.unwrap_or(&self.default_model), prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request.top_p = self.top_p;
        request
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            models,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            models: models.clone(),
        },
        ProviderConfig::Mock { .. } => config.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `uniquery.toml` in the current directory
/// 2. `~/.config/uniquery/config.toml`
///
/// `UNIQUERY_API_KEY` overrides the key of the default provider.
pub fn load_config() -> Result<UniqueryConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<UniqueryConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("uniquery.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<UniqueryConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => UniqueryConfig::default(),
    };

    if let Ok(key) = std::env::var(API_KEY_ENV) {
        apply_api_key(&mut config, key);
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    config.validate()?;
    tracing::debug!(
        path = ?config_path,
        default_provider = %config.default_provider,
        "loaded config"
    );
    Ok(config)
}

fn apply_api_key(config: &mut UniqueryConfig, key: String) {
    let entry = config
        .providers
        .entry(config.default_provider.clone())
        .or_insert(ProviderConfig::OpenAI {
            api_key: String::new(),
            base_url: None,
            models: Vec::new(),
        });
    if let ProviderConfig::OpenAI { api_key, .. } = entry {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("uniquery"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
    timeout_secs: u64,
) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            models,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("provider '{name}' has an empty api_key");
            }
            let provider = OpenAiProvider::new(name, api_key, base_url.clone(), timeout_secs)?
                .with_models(models.clone());
            Ok(Box::new(provider))
        }
        ProviderConfig::Mock {
            response,
            responses,
        } => {
            let provider = MockProvider::new(responses.clone().into_iter().collect())
                .with_default_response(response.as_deref().unwrap_or(DEFAULT_MOCK_RESPONSE));
            Ok(Box::new(provider))
        }
    }
}

/// Starter config written by `uniquery init`.
pub const SAMPLE_CONFIG: &str = r#"# uniquery configuration

default_provider = "groq"
default_model = "llama3-8b-8192"
temperature = 0.7
max_tokens = 4000
timeout_secs = 30
top_p = 0.9
footer = "Generated with Uniquery AI"

[providers.groq]
type = "openai"
api_key = "${GROQ_API_KEY}"
# base_url = "https://api.groq.com/openai"

# Offline provider for trying things out.
[providers.mock]
type = "mock"

[page]
height_budget = 257.0
"#;
