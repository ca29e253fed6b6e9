//! Rendering for uniquery study material.
//!
//! Turns markup-lite text into paginated [`document::DocumentBlock`]s whose
//! text is guaranteed to fit the Latin-1 repertoire, and writes the pages as
//! plain text, HTML or JSON.

pub mod document;
pub mod glyph;
pub mod markup;
pub mod writer;

pub use document::{DocumentBlock, DocumentRenderer, Page, PageConfig, RenderedDocument, TextRun};
pub use glyph::sanitize;
pub use markup::LineKind;
pub use writer::OutputFormat;
