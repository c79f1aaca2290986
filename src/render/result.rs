//! Typesetting result with statistics.

use serde::{Deserialize, Serialize};

use super::{to_json, to_text, JsonFormat, RecordedPage};
use crate::error::Result;
use crate::layout::PageSummary;
use crate::model::Paragraph;

/// Result of typesetting a document: page summaries, the recorded drawing
/// and statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypesetOutput {
    /// One summary per page
    pub pages: Vec<PageSummary>,

    /// Recorded drawing operations per page
    pub drawing: Vec<RecordedPage>,

    /// Run statistics
    pub stats: TypesetStats,
}

impl TypesetOutput {
    /// Plain text of the drawn pages.
    pub fn to_text(&self) -> String {
        to_text(&self.drawing)
    }

    /// The whole output as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        to_json(self, format)
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Statistics collected while typesetting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypesetStats {
    /// Tokens produced by the lexer
    pub token_count: usize,

    /// Paragraphs built from the tokens
    pub paragraph_count: usize,

    /// Body lines laid out
    pub line_count: usize,

    /// Pieces across all body lines
    pub piece_count: usize,

    /// Pages produced
    pub page_count: usize,

    /// Footnotes attached to body text
    pub footnote_count: usize,

    /// Cross-reference blocks attached to body text
    pub crossref_count: usize,

    /// Penalty accumulated over all pages
    pub total_penalty: f32,
}

impl TypesetStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count lines, pieces, footnotes and cross-references in built paragraphs.
    pub fn count_paragraphs(&mut self, paragraphs: &[Paragraph]) {
        self.paragraph_count += paragraphs.len();
        for para in paragraphs {
            self.line_count += para.line_count();
            for piece in para.pieces() {
                self.piece_count += 1;
                if piece.footnote.is_some() {
                    self.footnote_count += 1;
                }
                if piece.crossrefs.is_some() {
                    self.crossref_count += 1;
                }
            }
        }
    }

    /// Count pages and their penalties.
    pub fn count_pages(&mut self, pages: &[PageSummary]) {
        self.page_count += pages.len();
        self.total_penalty += pages.iter().map(|p| p.penalty).sum::<f32>();
    }
}
