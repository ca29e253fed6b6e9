pub mod chat;
pub mod extract;
pub mod init;
pub mod list_models;
pub mod quiz;
pub mod render;
pub mod study;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use uniquery_core::traits::{generate_text, GenerateRequest, LlmProvider};
use uniquery_providers::UniqueryConfig;

/// Read a file, or stdin when the path is `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

/// Run one generation call, turning "no text" into an error for the command.
pub(crate) async fn generate(
    config: &UniqueryConfig,
    provider: &dyn LlmProvider,
    model: Option<&str>,
    prompt: String,
) -> Result<String> {
    send(provider, &config.request(model, prompt)).await
}

/// Like [`generate`], for a request the caller has already built.
pub(crate) async fn send(provider: &dyn LlmProvider, request: &GenerateRequest) -> Result<String> {
    eprintln!("Generating with {} / {}...", provider.name(), request.model);
    generate_text(provider, request).await.with_context(|| {
        format!(
            "{} returned no text (check your API key, network and model name)",
            provider.name()
        )
    })
}
