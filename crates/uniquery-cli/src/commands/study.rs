//! The `uniquery study` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use uniquery_core::extract::Extractor;
use uniquery_core::model::ExtractionMode;
use uniquery_core::prompts::{
    material_quiz_label, material_quiz_prompt, DetailLevel, MaterialKind, MaterialRequest,
};
use uniquery_providers::load_config_from;
use uniquery_render::writer::{document_file_name, markdown_file_name, write_document};
use uniquery_render::DocumentRenderer;

use super::{generate, render::parse_formats};

pub struct StudyArgs {
    pub topic: String,
    pub kind: MaterialKind,
    pub detail: DetailLevel,
    pub include_examples: bool,
    pub suggest_diagrams: bool,
    pub quiz: bool,
    pub output: PathBuf,
    pub format: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: StudyArgs) -> Result<()> {
    let topic = args.topic.trim();
    anyhow::ensure!(!topic.is_empty(), "topic must not be empty");
    let formats = parse_formats(&args.format, true)?;

    let config = load_config_from(args.config.as_deref())?;
    let provider = config.provider(args.provider.as_deref())?;

    let mut request = MaterialRequest::new(topic, args.kind);
    request.detail = args.detail;
    request.include_examples = args.include_examples;
    request.suggest_diagrams = args.suggest_diagrams;

    let material = generate(&config, provider.as_ref(), args.model.as_deref(), request.prompt()).await?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let kind = args.kind.to_string();

    let markdown = args.output.join(markdown_file_name(topic, &kind));
    std::fs::write(&markdown, &material)
        .with_context(|| format!("failed to write {}", markdown.display()))?;
    eprintln!("Markdown: {}", markdown.display());

    let renderer = DocumentRenderer::new(config.page.clone()).with_footer(&config.footer);
    let document = renderer.render_material(&kind, topic, &material);
    for format in formats {
        let path = args.output.join(document_file_name(topic, &kind, format));
        write_document(&document, format, &path)?;
        eprintln!("{} ({} pages): {}", format.extension(), document.pages.len(), path.display());
    }

    if args.quiz {
        let raw = generate(
            &config,
            provider.as_ref(),
            args.model.as_deref(),
            material_quiz_prompt(topic, &material),
        )
        .await?;
        let questions = Extractor::new(ExtractionMode::Lenient)
            .extract(&raw)
            .context("no usable practice questions in the model output")?;

        let path = args
            .output
            .join(format!("{}_quiz.json", markdown_file_name(topic, &kind).trim_end_matches(".md")));
        std::fs::write(&path, serde_json::to_string_pretty(&questions)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!(
            "Practice quiz '{}' ({} questions): {}",
            material_quiz_label(topic),
            questions.len(),
            path.display()
        );
        eprintln!(
            "Take it with: uniquery quiz --questions {} --topic \"{}\"",
            path.display(),
            material_quiz_label(topic)
        );
    }

    Ok(())
}
