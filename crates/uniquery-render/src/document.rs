//! Block construction and pagination.
//!
//! Text is sanitized first, then split into lines, classified and turned into
//! immutable [`DocumentBlock`]s. Pagination only groups blocks into pages.

use serde::{Deserialize, Serialize};

use crate::glyph::sanitize;
use crate::markup::{classify, split_bold_runs, strip_bold_markers, LineKind};

/// Footer stamped on every page unless configured otherwise.
pub const DEFAULT_FOOTER: &str = "Generated with Uniquery AI";

/// A span of text with uniform weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn new(text: impl Into<String>, bold: bool) -> Self {
        Self {
            text: text.into(),
            bold,
        }
    }
}

/// One classified, styled unit of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBlock {
    kind: LineKind,
    runs: Vec<TextRun>,
}

impl DocumentBlock {
    /// Build a block from one line of already-sanitized markup.
    fn from_line(line: &str) -> Self {
        let (kind, content) = classify(line);
        let runs = match kind {
            LineKind::BlankLine => Vec::new(),
            k if k.is_heading() => {
                let text = strip_bold_markers(content);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![TextRun::new(text, false)]
                }
            }
            _ => split_bold_runs(content),
        };
        Self { kind, runs }
    }

    /// A heading1 title block for arbitrary text.
    pub fn title(text: &str) -> Self {
        let text = sanitize(text.trim());
        Self {
            kind: LineKind::Heading1,
            runs: vec![TextRun::new(text, false)],
        }
    }

    pub fn kind(&self) -> LineKind {
        self.kind
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Concatenated text of all runs.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Vertical metrics used to estimate block heights, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Usable height of one page.
    pub height_budget: f64,
    pub heading1: f64,
    pub heading2: f64,
    pub heading3: f64,
    pub bullet: f64,
    pub numbered: f64,
    pub paragraph: f64,
    pub blank: f64,
    /// Height added for every wrapped line after the first.
    pub line_height: f64,
    /// Characters that fit on one line before wrapping.
    pub chars_per_line: usize,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            height_budget: 257.0,
            heading1: 13.0,
            heading2: 10.0,
            heading3: 10.0,
            bullet: 7.0,
            numbered: 7.0,
            paragraph: 8.0,
            blank: 5.0,
            line_height: 6.0,
            chars_per_line: 90,
        }
    }
}

impl PageConfig {
    /// Estimated height of `block`.
    pub fn block_height(&self, block: &DocumentBlock) -> f64 {
        let base = match block.kind {
            LineKind::Heading1 => self.heading1,
            LineKind::Heading2 => self.heading2,
            LineKind::Heading3 => self.heading3,
            LineKind::Bullet => self.bullet,
            LineKind::NumberedItem => self.numbered,
            LineKind::Paragraph => self.paragraph,
            LineKind::BlankLine => return self.blank,
        };
        let chars: usize = block.runs.iter().map(|r| r.text.chars().count()).sum();
        let lines = chars.div_ceil(self.chars_per_line.max(1)).max(1);
        base + self.line_height * (lines - 1) as f64
    }
}

/// A group of blocks that fits within the page height budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub blocks: Vec<DocumentBlock>,
    /// Sum of the estimated block heights.
    pub used_height: f64,
}

/// Group blocks into pages.
///
/// A block that does not fit on a non-empty page starts a new page. A block
/// taller than the whole budget gets a page of its own.
pub fn paginate(blocks: Vec<DocumentBlock>, config: &PageConfig) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page {
        number: 1,
        blocks: Vec::new(),
        used_height: 0.0,
    };

    for block in blocks {
        let height = config.block_height(&block);
        if !current.blocks.is_empty() && current.used_height + height > config.height_budget {
            let number = current.number + 1;
            pages.push(std::mem::replace(
                &mut current,
                Page {
                    number,
                    blocks: Vec::new(),
                    used_height: 0.0,
                },
            ));
        }
        current.used_height += height;
        current.blocks.push(block);
    }

    if !current.blocks.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

/// A paginated document ready for a page writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub title: Option<String>,
    pub footer: String,
    pub pages: Vec<Page>,
}

impl RenderedDocument {
    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.blocks.len()).sum()
    }
}

/// Turns markup text into blocks and pages.
#[derive(Debug, Clone)]
pub struct DocumentRenderer {
    config: PageConfig,
    footer: String,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(PageConfig::default())
    }
}

impl DocumentRenderer {
    pub fn new(config: PageConfig) -> Self {
        Self {
            config,
            footer: DEFAULT_FOOTER.to_string(),
        }
    }

    /// Replace the footer stamped on every page.
    pub fn with_footer(mut self, footer: impl AsRef<str>) -> Self {
        self.footer = sanitize(footer.as_ref());
        self
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Classify every line of `text` into a block, in input order.
    pub fn blocks(&self, text: &str) -> Vec<DocumentBlock> {
        let clean = sanitize(text);
        clean.lines().map(DocumentBlock::from_line).collect()
    }

    /// Render `text` into pages, optionally preceded by a title block.
    pub fn render(&self, title: Option<&str>, text: &str) -> RenderedDocument {
        let mut blocks = Vec::new();
        if let Some(title) = title {
            blocks.push(DocumentBlock::title(title));
        }
        blocks.extend(self.blocks(text));

        let pages = paginate(blocks, &self.config);
        tracing::debug!(pages = pages.len(), "rendered document");

        RenderedDocument {
            title: title.map(|t| sanitize(t.trim())),
            footer: self.footer.clone(),
            pages,
        }
    }

    /// Render study material under a `"{kind}: {topic}"` title.
    pub fn render_material(&self, kind: &str, topic: &str, text: &str) -> RenderedDocument {
        self.render(Some(&format!("{kind}: {topic}")), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::is_encodable;

    #[test]
    fn heading_block() {
        let blocks = DocumentRenderer::default().blocks("## Key Concepts");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), LineKind::Heading2);
        assert_eq!(blocks[0].runs(), &[TextRun::new("Key Concepts", false)]);
    }

    #[test]
    fn padded_markers_leave_no_leading_space() {
        let blocks = DocumentRenderer::default().blocks("##   Key Concepts\n-    item **bold**");
        assert_eq!(blocks[0].runs(), &[TextRun::new("Key Concepts", false)]);
        assert_eq!(
            blocks[1].runs(),
            &[TextRun::new("item ", false), TextRun::new("bold", true)]
        );
    }

    #[test]
    fn paragraph_with_bold() {
        let blocks = DocumentRenderer::default().blocks("This is **important** now");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind(), LineKind::Paragraph);
        assert_eq!(
            blocks[0].runs(),
            &[
                TextRun::new("This is ", false),
                TextRun::new("important", true),
                TextRun::new(" now", false),
            ]
        );
    }

    #[test]
    fn bold_does_not_carry_across_lines() {
        let blocks = DocumentRenderer::default().blocks("open **bold\nnext line");
        assert_eq!(blocks[1].runs(), &[TextRun::new("next line", false)]);
    }

    #[test]
    fn mixed_document_in_order() {
        let text = "# Photosynthesis\n\n## Inputs\n- Light\n* Water\n1. Absorb\n2. Convert\nPlants are **green**.";
        let kinds: Vec<_> = DocumentRenderer::default()
            .blocks(text)
            .iter()
            .map(DocumentBlock::kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Heading1,
                LineKind::BlankLine,
                LineKind::Heading2,
                LineKind::Bullet,
                LineKind::Bullet,
                LineKind::NumberedItem,
                LineKind::NumberedItem,
                LineKind::Paragraph,
            ]
        );
    }

    #[test]
    fn text_is_sanitized_before_classification() {
        let blocks = DocumentRenderer::default().blocks("• π ≈ 3.14");
        assert_eq!(blocks[0].kind(), LineKind::Bullet);
        assert_eq!(blocks[0].plain_text(), "pi ~= 3.14");
    }

    #[test]
    fn every_run_is_encodable() {
        let doc = DocumentRenderer::default()
            .with_footer("Built with ♥")
            .render(Some("Ωhm’s law"), "## Über → 日本\n- **Σ** of ∞");
        assert!(is_encodable(&doc.footer));
        for page in &doc.pages {
            for block in &page.blocks {
                for run in block.runs() {
                    assert!(is_encodable(&run.text), "{:?}", run.text);
                }
            }
        }
    }

    #[test]
    fn material_title() {
        let doc = DocumentRenderer::default().render_material("Study Guide", "Rust", "body");
        let first = &doc.pages[0].blocks[0];
        assert_eq!(first.kind(), LineKind::Heading1);
        assert_eq!(first.plain_text(), "Study Guide: Rust");
        assert_eq!(doc.title.as_deref(), Some("Study Guide: Rust"));
        assert_eq!(doc.block_count(), 2);
    }

    #[test]
    fn heights_by_kind() {
        let config = PageConfig::default();
        let renderer = DocumentRenderer::new(config.clone());
        let blocks = renderer.blocks("# H\n\nshort");
        assert_eq!(config.block_height(&blocks[0]), 13.0);
        assert_eq!(config.block_height(&blocks[1]), 5.0);
        assert_eq!(config.block_height(&blocks[2]), 8.0);

        let long = renderer.blocks(&"word ".repeat(40));
        assert_eq!(config.block_height(&long[0]), 8.0 + 6.0 * 2.0);
    }

    #[test]
    fn pagination_respects_budget() {
        let config = PageConfig {
            height_budget: 30.0,
            ..PageConfig::default()
        };
        let renderer = DocumentRenderer::new(config.clone());
        let blocks = renderer.blocks("a\nb\nc\nd\ne");
        let pages = paginate(blocks, &config);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), 3);
        assert_eq!(pages[1].blocks.len(), 2);
        assert_eq!(pages[1].number, 2);
        for page in &pages {
            assert!(page.used_height <= config.height_budget);
        }
    }

    #[test]
    fn oversized_block_gets_its_own_page() {
        let config = PageConfig {
            height_budget: 10.0,
            ..PageConfig::default()
        };
        let renderer = DocumentRenderer::new(config.clone());
        let blocks = renderer.blocks("# Big heading\nsmall");
        let pages = paginate(blocks, &config);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks[0].kind(), LineKind::Heading1);
    }

    #[test]
    fn pagination_is_deterministic() {
        let renderer = DocumentRenderer::default();
        let text = "## Section\n- item\n\nParagraph text.\n".repeat(30);
        let a = renderer.render(None, &text);
        let b = renderer.render(None, &text);
        assert_eq!(a, b);
        assert!(a.pages.len() > 1);
    }

    #[test]
    fn empty_text_has_one_empty_page() {
        let doc = DocumentRenderer::default().render(None, "");
        assert_eq!(doc.pages.len(), 1);
        assert!(doc.pages[0].blocks.is_empty());
    }
}
