//! Line classification for the markup-lite dialect.

use serde::{Deserialize, Serialize};

use crate::document::TextRun;

const BOLD_DELIMITER: &str = "**";

/// The closed set of line kinds, in classification precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    Heading3,
    Heading2,
    Heading1,
    Bullet,
    NumberedItem,
    BlankLine,
    Paragraph,
}

impl LineKind {
    /// Kinds in the order they are tried.
    pub const PRECEDENCE: [LineKind; 7] = [
        LineKind::Heading3,
        LineKind::Heading2,
        LineKind::Heading1,
        LineKind::Bullet,
        LineKind::NumberedItem,
        LineKind::BlankLine,
        LineKind::Paragraph,
    ];

    /// Content of `line` if it is of this kind, with the marker removed.
    ///
    /// `line` must already be trimmed. Numbered items keep their number.
    fn strip<'a>(self, line: &'a str) -> Option<&'a str> {
        match self {
            LineKind::Heading3 => line.strip_prefix("### ").map(str::trim_start),
            LineKind::Heading2 => line.strip_prefix("## ").map(str::trim_start),
            LineKind::Heading1 => line.strip_prefix("# ").map(str::trim_start),
            LineKind::Bullet => line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .map(str::trim_start),
            LineKind::NumberedItem => is_numbered(line).then_some(line),
            LineKind::BlankLine => line.is_empty().then_some(""),
            LineKind::Paragraph => Some(line),
        }
    }

    pub fn is_heading(self) -> bool {
        matches!(
            self,
            LineKind::Heading1 | LineKind::Heading2 | LineKind::Heading3
        )
    }
}

impl std::fmt::Display for LineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LineKind::Heading1 => "heading1",
            LineKind::Heading2 => "heading2",
            LineKind::Heading3 => "heading3",
            LineKind::Bullet => "bullet",
            LineKind::NumberedItem => "numberedItem",
            LineKind::BlankLine => "blankLine",
            LineKind::Paragraph => "paragraph",
        };
        write!(f, "{name}")
    }
}

/// `^\d+\.`
fn is_numbered(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && line.as_bytes().get(digits) == Some(&b'.')
}

/// Classify one line, returning its kind and content without the marker.
pub fn classify(line: &str) -> (LineKind, &str) {
    let line = line.trim();
    LineKind::PRECEDENCE
        .iter()
        .find_map(|kind| kind.strip(line).map(|content| (*kind, content)))
        .unwrap_or((LineKind::Paragraph, line))
}

/// Split a line into alternating plain and bold runs on `**`.
///
/// An unmatched trailing `**` makes the rest of the line bold. Empty runs
/// are dropped.
pub fn split_bold_runs(content: &str) -> Vec<TextRun> {
    content
        .split(BOLD_DELIMITER)
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(i, part)| TextRun::new(part, i % 2 == 1))
        .collect()
}

/// Drop bold markers, for headings which are rendered as one run.
pub fn strip_bold_markers(content: &str) -> String {
    content.replace(BOLD_DELIMITER, "")
}
