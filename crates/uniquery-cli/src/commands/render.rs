//! The `uniquery render` command.

use std::path::PathBuf;

use anyhow::Result;

use uniquery_providers::load_config_from;
use uniquery_render::writer::{render_html, render_json, render_text, write_document};
use uniquery_render::{DocumentRenderer, OutputFormat};

use super::read_input;

/// Parse a format list such as `"text,html"`. `all` expands to every format
/// when `allow_all` is set.
pub(crate) fn parse_formats(spec: &str, allow_all: bool) -> Result<Vec<OutputFormat>> {
    if allow_all && spec.trim().eq_ignore_ascii_case("all") {
        return Ok(OutputFormat::ALL.to_vec());
    }
    let mut formats = Vec::new();
    for part in spec.split(',') {
        let format: OutputFormat = part.trim().parse().map_err(|e: String| anyhow::anyhow!(e))?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    Ok(formats)
}

pub fn execute(
    input: PathBuf,
    title: Option<String>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let formats = parse_formats(&format, false)?;
    anyhow::ensure!(formats.len() == 1, "render takes exactly one format");
    let format = formats[0];

    let config = load_config_from(config_path.as_deref())?;
    let text = read_input(&input)?;

    let renderer = DocumentRenderer::new(config.page.clone()).with_footer(&config.footer);
    let document = renderer.render(title.as_deref(), &text);

    match output {
        Some(path) => {
            write_document(&document, format, &path)?;
            eprintln!(
                "Rendered {} blocks on {} page(s): {}",
                document.block_count(),
                document.pages.len(),
                path.display()
            );
        }
        None => {
            let rendered = match format {
                OutputFormat::Text => render_text(&document),
                OutputFormat::Html => render_html(&document),
                OutputFormat::Json => render_json(&document)?,
            };
            print!("{rendered}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_lists() {
        assert_eq!(parse_formats("all", true).unwrap(), OutputFormat::ALL.to_vec());
        assert!(parse_formats("all", false).is_err());
        assert_eq!(
            parse_formats("html, text,html", false).unwrap(),
            vec![OutputFormat::Html, OutputFormat::Text]
        );
        assert!(parse_formats("pdf", true).is_err());
    }
}
