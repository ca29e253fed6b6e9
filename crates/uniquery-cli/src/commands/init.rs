//! The `uniquery init` command.

use anyhow::{Context, Result};

use uniquery_providers::config::SAMPLE_CONFIG;

pub fn execute() -> Result<()> {
    let path = std::path::Path::new("uniquery.toml");
    if path.exists() {
        println!("uniquery.toml already exists, skipping.");
        return Ok(());
    }

    std::fs::write(path, SAMPLE_CONFIG).context("failed to write uniquery.toml")?;
    println!("Created uniquery.toml");

    println!("\nNext steps:");
    println!("  1. Export GROQ_API_KEY (or set UNIQUERY_API_KEY)");
    println!("  2. Run: uniquery quiz --topic \"Photosynthesis\"");
    println!("  3. Run: uniquery study --topic \"Photosynthesis\" --kind \"key concepts\"");

    Ok(())
}
