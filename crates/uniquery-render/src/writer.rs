//! Page writers.
//!
//! Text and HTML output is written as Latin-1 bytes. JSON output is UTF-8.

use anyhow::{Context, Result};
use std::path::Path;

use crate::document::{DocumentBlock, Page, RenderedDocument};
use crate::glyph::encode_latin1;
use crate::markup::LineKind;

/// Separates pages in plain-text output (form feed).
pub const PAGE_BREAK: char = '\u{0C}';

/// Output format for a rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Html,
    Json,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Text, OutputFormat::Html, OutputFormat::Json];

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unknown output format '{other}', expected one of: text, html, json"
            )),
        }
    }
}

/// Footer line for one page.
fn footer_line(doc: &RenderedDocument, page: &Page) -> String {
    format!("{} | Page {} of {}", doc.footer, page.number, doc.pages.len())
}

fn block_markup(block: &DocumentBlock) -> String {
    let body: String = block
        .runs()
        .iter()
        .map(|run| {
            if run.bold {
                format!("**{}**", run.text)
            } else {
                run.text.clone()
            }
        })
        .collect();

    match block.kind() {
        LineKind::Heading1 => format!("# {body}"),
        LineKind::Heading2 => format!("## {body}"),
        LineKind::Heading3 => format!("### {body}"),
        LineKind::Bullet => format!("- {body}"),
        LineKind::NumberedItem | LineKind::Paragraph => body,
        LineKind::BlankLine => String::new(),
    }
}

/// Render a document as plain text, one section per page.
pub fn render_text(doc: &RenderedDocument) -> String {
    let mut out = String::new();
    for page in &doc.pages {
        if page.number > 1 {
            out.push(PAGE_BREAK);
        }
        for block in &page.blocks {
            out.push_str(&block_markup(block));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&footer_line(doc, page));
        out.push('\n');
    }
    out
}

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn html_runs(block: &DocumentBlock) -> String {
    block
        .runs()
        .iter()
        .map(|run| {
            let text = html_escape(&run.text);
            if run.bold {
                format!("<strong>{text}</strong>")
            } else {
                text
            }
        })
        .collect()
}

/// Render a document as a standalone HTML page.
pub fn render_html(doc: &RenderedDocument) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"iso-8859-1\">\n");
    html.push_str(&format!(
        "<title>{}</title>\n",
        html_escape(doc.title.as_deref().unwrap_or("Uniquery"))
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n");

    for page in &doc.pages {
        html.push_str(&format!("<section class=\"page\" id=\"page-{}\">\n", page.number));
        let mut in_list = false;
        for block in &page.blocks {
            let is_bullet = block.kind() == LineKind::Bullet;
            if is_bullet && !in_list {
                html.push_str("<ul>\n");
            } else if !is_bullet && in_list {
                html.push_str("</ul>\n");
            }
            in_list = is_bullet;

            let runs = html_runs(block);
            match block.kind() {
                LineKind::Heading1 => html.push_str(&format!("<h1>{runs}</h1>\n")),
                LineKind::Heading2 => html.push_str(&format!("<h2>{runs}</h2>\n")),
                LineKind::Heading3 => html.push_str(&format!("<h3>{runs}</h3>\n")),
                LineKind::Bullet => html.push_str(&format!("<li>{runs}</li>\n")),
                LineKind::NumberedItem => {
                    html.push_str(&format!("<p class=\"numbered\">{runs}</p>\n"))
                }
                LineKind::Paragraph => html.push_str(&format!("<p>{runs}</p>\n")),
                LineKind::BlankLine => html.push_str("<div class=\"gap\"></div>\n"),
            }
        }
        if in_list {
            html.push_str("</ul>\n");
        }
        html.push_str(&format!(
            "<footer>{}</footer>\n</section>\n",
            html_escape(&footer_line(doc, page))
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Serialize the paginated document as pretty JSON.
pub fn render_json(doc: &RenderedDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).context("failed to serialize document")
}

/// Render `doc` in `format` and write it to `path`.
pub fn write_document(doc: &RenderedDocument, format: OutputFormat, path: &Path) -> Result<()> {
    let bytes = match format {
        OutputFormat::Text => latin1(&render_text(doc))?,
        OutputFormat::Html => latin1(&render_html(doc))?,
        OutputFormat::Json => render_json(doc)?.into_bytes(),
    };
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), pages = doc.pages.len(), "wrote document");
    Ok(())
}

fn latin1(text: &str) -> Result<Vec<u8>> {
    encode_latin1(text).context("rendered text contains characters outside Latin-1")
}

/// File name for the markdown export of study material.
pub fn markdown_file_name(topic: &str, kind: &str) -> String {
    format!("{}_{}.md", file_stem(topic), file_stem(kind))
}

/// File name for a rendered document.
pub fn document_file_name(topic: &str, kind: &str, format: OutputFormat) -> String {
    format!("{}_{}.{}", file_stem(topic), file_stem(kind), format.extension())
}

fn file_stem(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect()
}

const CSS: &str = r#"
body { font-family: Arial, Helvetica, sans-serif; margin: 0; padding: 2rem; background: #f3f4f6; color: #1a1a1a; }
.page { background: #fff; max-width: 210mm; min-height: 257mm; margin: 0 auto 2rem; padding: 10mm 15mm; box-shadow: 0 1px 4px rgba(0,0,0,.15); position: relative; }
h1 { font-size: 16pt; }
h2 { font-size: 14pt; }
h3 { font-size: 12pt; }
.gap { height: 5mm; }
footer { position: absolute; bottom: 8mm; left: 0; right: 0; text-align: center; font-size: 8pt; font-style: italic; color: #6b7280; }
@media print { body { background: none; padding: 0; } .page { box-shadow: none; page-break-after: always; margin: 0; } }
"#;
