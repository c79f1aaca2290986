//! A single line of measured pieces.

use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{CrossReferenceBlock, FontRole, Paragraph, Piece};
use crate::layout::unicode::{hangable_prefix_len, hangable_suffix_start, low_punctuation_start};
use crate::layout::{FontMetrics, LayoutConfig};
use crate::render::Renderer;

/// Verse numbers below this value hang into the left margin.
pub const VERSE_HANG_CEILING: u32 = 999;

/// Horizontal alignment of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment
    Left,
    /// Right alignment
    Right,
    /// Centred
    Centered,
    /// Justified (default for body text)
    #[default]
    Justified,
    /// No alignment; drawn at the left margin
    None,
}

/// An ordered run of pieces plus its measurements.
///
/// A line without pieces is an explicit vertical space whose height is
/// preset in `line_height`.
#[derive(Debug, Clone)]
pub struct Line {
    pieces: Vec<Piece>,

    /// Alignment
    pub alignment: Alignment,

    /// Indent from the text column's left edge
    pub left_margin: f32,

    /// Width available to the line
    pub max_width: f32,

    /// Width used so far, excluding hung material
    pub width_so_far: f32,

    /// Height above the baseline
    pub ascent: f32,

    /// Depth below the baseline
    pub descent: f32,

    /// Distance to the next baseline
    pub line_height: f32,

    /// Width hung into the left margin
    pub left_hang: f32,

    /// Width hung into the right margin
    pub right_hang: f32,

    /// Number of pieces that may stay on this line if it has to be broken
    pub checkpoint: usize,

    /// Keep this line on the same page as the next one
    pub tied_to_next_line: bool,

    /// Vertical page position the line was emitted at
    pub on_page_y: f32,
}

impl Line {
    /// Create an empty line.
    pub fn new(alignment: Alignment, left_margin: f32, max_width: f32) -> Self {
        Self {
            pieces: Vec::new(),
            alignment,
            left_margin,
            max_width,
            width_so_far: 0.0,
            ascent: 0.0,
            descent: 0.0,
            line_height: 0.0,
            left_hang: 0.0,
            right_hang: 0.0,
            checkpoint: 0,
            tied_to_next_line: false,
            on_page_y: 0.0,
        }
    }

    /// Create an explicit vertical space of `height` points.
    pub fn vspace(height: f32) -> Self {
        let mut line = Self::new(Alignment::None, 0.0, 0.0);
        line.line_height = height;
        line.ascent = height;
        line
    }

    /// Pieces in reading order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Mutable access to the pieces.
    pub fn pieces_mut(&mut self) -> &mut [Piece] {
        &mut self.pieces
    }

    /// Number of pieces.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Check if the line has no pieces.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Append a piece.
    pub fn push(&mut self, piece: Piece) {
        self.width_so_far += piece.width;
        self.pieces.push(piece);
    }

    /// Remove and return the pieces from `at` onwards.
    pub fn split_off(&mut self, at: usize) -> Vec<Piece> {
        let at = at.min(self.pieces.len());
        let tail = self.pieces.split_off(at);
        self.width_so_far = self.pieces.iter().map(|p| p.width).sum();
        self.checkpoint = self.checkpoint.min(self.pieces.len());
        tail
    }

    /// Concatenated text of all pieces.
    pub fn text(&self) -> String {
        self.pieces.iter().map(|p| p.text.as_str()).collect()
    }

    /// Cross-reference blocks anchored in this line.
    pub fn crossref_blocks(&self) -> impl Iterator<Item = &CrossReferenceBlock> {
        self.pieces.iter().filter_map(|p| p.crossrefs.as_deref())
    }

    /// Footnotes anchored in this line.
    pub fn footnotes(&self) -> impl Iterator<Item = &Paragraph> {
        self.pieces.iter().filter_map(|p| p.footnote.as_deref())
    }

    /// Vertical distance the page cursor moves past this line.
    pub fn advance(&self, line_spacing: f32) -> f32 {
        if self.pieces.is_empty() {
            self.line_height * line_spacing
        } else {
            self.line_height
        }
    }

    /// Compute ascent, descent and line height from the pieces' faces.
    ///
    /// Drop-cap faces are ignored; their extra lines are covered by the
    /// lines that follow.
    pub fn calculate_height(&mut self, metrics: &dyn FontMetrics, line_spacing: f32) {
        if self.pieces.is_empty() {
            self.ascent = self.line_height;
            self.descent = 0.0;
            return;
        }

        let mut ascent: f32 = 0.0;
        let mut descent: f32 = 0.0;
        let mut line_gap: f32 = 0.0;
        for piece in self.pieces.iter().filter(|p| !p.font.is_drop_cap()) {
            let vm = metrics.vertical_metrics(&piece.font, piece.size);
            ascent = ascent.max(vm.ascender - piece.baseline);
            descent = descent.max(vm.descender + piece.baseline);
            line_gap = line_gap.max(vm.line_gap);
        }

        self.ascent = ascent;
        self.descent = descent;
        self.line_height = line_gap * line_spacing;
    }

    /// Width of the hangable run at the start of piece `index`.
    fn leading_hang(&self, index: usize, metrics: &dyn FontMetrics) -> f32 {
        let Some(piece) = self.pieces.get(index) else {
            return 0.0;
        };
        let len = hangable_prefix_len(&piece.text);
        if len == 0 {
            return 0.0;
        }
        let width = metrics.text_width(&piece.font, piece.size, &piece.text[..len]);
        trace!("hanging {:?} on the left ({:.1}pt)", &piece.text[..len], width);
        width
    }

    /// Recompute piece widths, hangs and the effective line width.
    pub fn recalculate_width(&mut self, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        for piece in &mut self.pieces {
            piece.width = piece.natural_width;
        }

        for i in 1..self.pieces.len() {
            if self.pieces[i].role() == FontRole::FootnoteMark {
                // Draw the mark above trailing low punctuation of the
                // preceding piece instead of after it.
                let (head, tail) = self.pieces.split_at_mut(i);
                let prev = &mut head[i - 1];
                let mark = &mut tail[0];
                let start = low_punctuation_start(&prev.text);
                let hang = metrics.text_width(&prev.font, prev.size, &prev.text[start..]);
                prev.width = prev.natural_width - hang;
                if hang > mark.width {
                    mark.width = hang;
                }
            }

            if i == 1 && self.pieces[0].font.is_drop_cap() {
                let mut next = 1;
                let mut discount = 0.0;
                if self.pieces[1].role() == FontRole::FootnoteMark {
                    discount += self.pieces[1].natural_width;
                    next = 2;
                }
                discount += self.leading_hang(next, metrics);
                self.pieces[0].width = self.pieces[0].natural_width - discount;
            }
        }

        self.width_so_far = self.pieces.iter().map(|p| p.width).sum();
        self.left_hang = 0.0;
        self.right_hang = 0.0;

        if self.pieces.is_empty() {
            return;
        }

        let mut first = 0;
        let lead = &self.pieces[0];
        if lead.role() == FontRole::VerseNumber && lead.number() < VERSE_HANG_CEILING {
            self.left_hang = lead.width;
            first = 1;
            debug!(
                "hanging verse number {:?} in left margin ({:.1}pt)",
                lead.text, self.left_hang
            );
        }
        self.left_hang += self.leading_hang(first, metrics);

        // Trailing white space does not take part in right hanging.
        let mut end = self.pieces.len();
        while end > 0 && self.pieces[end - 1].is_space() {
            end -= 1;
        }

        let mut note_width = 0.0;
        if end > 0 && self.pieces[end - 1].role() == FontRole::FootnoteMark {
            note_width = self.pieces[end - 1].natural_width;
            self.right_hang = self.pieces[end - 1].width;
            end -= 1;
        }

        if end > 0 {
            let piece = &self.pieces[end - 1];
            let start = hangable_suffix_start(&piece.text);
            if start < piece.text.len() {
                let hang_width = metrics.text_width(&piece.font, piece.size, &piece.text[start..])
                    - (piece.natural_width - piece.width);
                if hang_width + note_width <= config.max_right_hang() {
                    self.right_hang = note_width + hang_width;
                    trace!(
                        "hanging {:?} in right margin ({:.1}pt)",
                        &piece.text[start..],
                        hang_width
                    );
                } else {
                    self.right_hang = note_width;
                }
            }
        }

        self.width_so_far -= self.left_hang + self.right_hang;
    }

    /// Drop blank pieces from the end of the line.
    pub fn remove_trailing_space(&mut self) {
        while let Some(last) = self.pieces.last() {
            if !last.is_blank() {
                break;
            }
            self.width_so_far -= last.width;
            self.pieces.pop();
        }
        self.checkpoint = self.checkpoint.min(self.pieces.len());
    }

    /// Drop blank pieces from the start of the line.
    pub fn remove_leading_space(&mut self) {
        let count = self.pieces.iter().take_while(|p| p.is_blank()).count();
        if count == 0 {
            return;
        }
        for piece in self.pieces.drain(..count) {
            self.width_so_far -= piece.width;
        }
        self.checkpoint = self.checkpoint.saturating_sub(count);
    }

    /// Spread the remaining width evenly over the elastic pieces.
    ///
    /// Returns whether the line was stretched.
    pub fn justify(&mut self) -> bool {
        let extra = self.max_width - self.width_so_far;
        if extra <= 0.0 {
            return false;
        }
        let elastic = self.pieces.iter().filter(|p| p.elastic).count();
        if elastic == 0 {
            return false;
        }

        let slice = extra / elastic as f32;
        for piece in self.pieces.iter_mut().filter(|p| p.elastic) {
            piece.width += slice;
        }
        self.width_so_far = self.max_width;
        true
    }

    /// Mark the current end of the line as the last safe break point.
    ///
    /// The checkpoint never leaves a verse number, a footnote mark or a
    /// non-breaking space as the last item before a break.
    pub fn set_checkpoint(&mut self) {
        if self.pieces.is_empty() {
            return;
        }

        let mut checkpoint = self.pieces.len();
        while checkpoint > 0 {
            let prev = &self.pieces[checkpoint - 1];
            let role = prev.role();
            if role == FontRole::VerseNumber || role.is_footnote_family() {
                checkpoint -= 1;
            } else if prev.is_nbsp() {
                checkpoint = checkpoint.saturating_sub(2);
            } else {
                break;
            }
        }
        self.checkpoint = checkpoint;
    }

    /// Indent the line for a poem at `level`.
    pub fn apply_poetry_margin(&mut self, level: u8, continuation: bool, config: &LayoutConfig) {
        if level == 0 {
            return;
        }
        self.left_margin = config.poetry_left_margin
            + f32::from(level - 1) * config.poetry_level_indent
            + if continuation {
                config.poetry_wrap_indent
            } else {
                0.0
            };
        self.max_width = config.text_width() - self.left_margin;
    }

    /// Horizontal position of the first piece, relative to the text column.
    pub fn start_x(&self) -> f32 {
        let x = match self.alignment {
            Alignment::Left | Alignment::Justified | Alignment::None => self.left_margin,
            Alignment::Centered => (self.max_width - self.width_so_far) / 2.0,
            Alignment::Right => self.max_width - self.width_so_far,
        };
        x - self.left_hang
    }

    /// Draw the pieces with the text column at `origin_x` and the baseline at `y`.
    pub fn draw(&self, renderer: &mut dyn Renderer, origin_x: f32, y: f32) {
        renderer.begin_text();
        let mut x = self.start_x();
        for piece in &self.pieces {
            let px = origin_x + x;
            let py = y - piece.baseline;
            renderer.set_font(&piece.font, piece.size);
            renderer.draw_text(px, py, &piece.text);
            renderer.record_text(&piece.font, piece.size, &piece.text, px, py);
            x += piece.width;
        }
        renderer.end_text();
    }
}

impl fmt::Display for Line {
    /// `[piece][piece]`, with width adjustments printed between pieces.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.left_margin != 0.0 {
            write!(f, "{:+} ", self.left_margin)?;
        }
        for (i, piece) in self.pieces.iter().enumerate() {
            if i > 0 {
                let prev = &self.pieces[i - 1];
                if prev.width != prev.natural_width {
                    write!(f, "{:.1}", prev.width - prev.natural_width)?;
                }
            }
            write!(f, "[{}]", piece.text)?;
        }
        Ok(())
    }
}
