//! The smallest measured unit of line content.

use std::sync::Arc;

use super::{CrossReferenceBlock, FontFace, FontRole, Paragraph};
use crate::layout::FontMetrics;

/// Non-breaking space.
pub const NBSP: char = '\u{00A0}';

/// A word, space or punctuation run with its font and measured width.
///
/// A piece owns its text; cloning a piece copies the text. Fonts are shared.
#[derive(Debug, Clone)]
pub struct Piece {
    /// Text to draw
    pub text: String,

    /// Face the text is drawn in
    pub font: Arc<FontFace>,

    /// Size in points
    pub size: f32,

    /// Width as measured by the font metrics
    pub natural_width: f32,

    /// Current width, after hanging and justification adjustments
    pub width: f32,

    /// Offset subtracted from the line baseline when drawing
    pub baseline: f32,

    /// Whether justification may stretch this piece
    pub elastic: bool,

    /// Footnote text anchored at this piece (footnote marks only)
    pub footnote: Option<Box<Paragraph>>,

    /// Cross-references anchored at this piece
    pub crossrefs: Option<Box<CrossReferenceBlock>>,
}

impl Piece {
    /// Create a piece with an explicit width.
    ///
    /// Only pieces starting with a space or a non-breaking space are elastic.
    pub fn new(
        text: impl Into<String>,
        font: Arc<FontFace>,
        size: f32,
        natural_width: f32,
        baseline: f32,
    ) -> Self {
        let text = text.into();
        let elastic = text.starts_with(' ') || text.starts_with(NBSP);
        Self {
            text,
            font,
            size,
            natural_width,
            width: natural_width,
            baseline,
            elastic,
            footnote: None,
            crossrefs: None,
        }
    }

    /// Create a piece measured with the face's own size and baseline shift.
    pub fn measured(text: impl Into<String>, font: &Arc<FontFace>, metrics: &dyn FontMetrics) -> Self {
        let text = text.into();
        let width = metrics.text_width(font, font.size, &text);
        Self::new(text, Arc::clone(font), font.size, width, font.baseline_shift)
    }

    /// Attach footnote text.
    pub fn with_footnote(mut self, footnote: Paragraph) -> Self {
        self.footnote = Some(Box::new(footnote));
        self
    }

    /// Attach a cross-reference block.
    pub fn with_crossrefs(mut self, block: CrossReferenceBlock) -> Self {
        self.crossrefs = Some(Box::new(block));
        self
    }

    /// Layout role of the piece's face.
    pub fn role(&self) -> FontRole {
        self.font.role()
    }

    /// Check if the piece is a plain space or empty.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty() || self.text == " "
    }

    /// Check if the piece starts with an ordinary space.
    pub fn is_space(&self) -> bool {
        self.text.starts_with(' ')
    }

    /// Check if the piece starts with a non-breaking space.
    pub fn is_nbsp(&self) -> bool {
        self.text.starts_with(NBSP)
    }

    /// Height of any attached cross-reference block.
    pub fn crossref_height(&self) -> f32 {
        self.crossrefs.as_ref().map_or(0.0, |b| b.total_height)
    }

    /// Numeric value of the leading digits, as used for verse and chapter
    /// numbers; zero when the text does not start with a digit.
    pub fn number(&self) -> u32 {
        let digits = self
            .text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.text.len());
        self.text[..digits].parse().unwrap_or(0)
    }
}
