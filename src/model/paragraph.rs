//! Paragraphs: lines filled greedily from a stream of pieces.

use std::fmt;

use log::{debug, trace};

use super::{Alignment, Line, Piece};
use crate::layout::{FontMetrics, LayoutConfig};

/// A paragraph of laid-out lines plus the line currently being filled.
///
/// The same type serves as the page's footnote accumulator: pieces are
/// appended raw with [`Paragraph::append_raw`] and the whole buffer is
/// broken into lines on demand with [`Paragraph::layout`].
#[derive(Debug, Clone)]
pub struct Paragraph {
    lines: Vec<Line>,
    current: Option<Line>,

    /// Alignment for lines opened from now on
    pub alignment: Alignment,

    /// Whether this is body text (footnotes and cross-references apply)
    pub is_body: bool,

    /// Poetry nesting level (0 = prose)
    pub poem_level: u8,

    /// The next line continues the current poetry line
    pub poem_subsequent_line: bool,

    break_allowed: bool,
}

impl Paragraph {
    /// Create an empty body paragraph.
    pub fn new(alignment: Alignment) -> Self {
        Self {
            lines: Vec::new(),
            current: None,
            alignment,
            is_body: true,
            poem_level: 0,
            poem_subsequent_line: false,
            break_allowed: false,
        }
    }

    /// Create an empty footnote accumulator.
    pub fn footnotes() -> Self {
        let mut p = Self::new(Alignment::Justified);
        p.is_body = false;
        p
    }

    /// Finished lines.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// A finished line.
    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// Mutable access to a finished line.
    pub fn line_mut(&mut self, index: usize) -> Option<&mut Line> {
        self.lines.get_mut(index)
    }

    /// Number of finished lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The line being filled, if any.
    pub fn current_line(&self) -> Option<&Line> {
        self.current.as_ref()
    }

    /// Move a finished line out of the paragraph.
    pub fn take_line(&mut self, index: usize) -> Option<Line> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    /// Check if the paragraph holds no pieces and no vertical space.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.current.as_ref().map_or(true, Line::is_empty)
    }

    /// All pieces, finished lines first.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.lines
            .iter()
            .chain(self.current.iter())
            .flat_map(|l| l.pieces().iter())
    }

    /// The most recently appended piece, if it is still on the current line.
    pub fn last_piece_mut(&mut self) -> Option<&mut Piece> {
        self.current.as_mut()?.pieces_mut().last_mut()
    }

    /// Allow a line break before the next piece.
    pub fn allow_break(&mut self) {
        self.break_allowed = true;
    }

    fn open_line(&mut self, config: &LayoutConfig) -> Line {
        let mut line = Line::new(self.alignment, 0.0, config.text_width());
        if self.poem_level > 0 {
            line.apply_poetry_margin(self.poem_level, self.poem_subsequent_line, config);
            self.poem_subsequent_line = true;
        }
        line
    }

    /// Append a piece, breaking the line at its checkpoint when it overflows.
    pub fn append_piece(&mut self, piece: Piece, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        let opportunity = self.break_allowed
            || self
                .current
                .as_ref()
                .and_then(|l| l.pieces().last())
                .is_some_and(is_break_after);
        self.break_allowed = false;

        let mut line = match self.current.take() {
            Some(line) => line,
            None => self.open_line(config),
        };
        if opportunity {
            line.set_checkpoint();
        }
        // A trailing space never forces a break; it is trimmed before drawing.
        let fills = !piece.is_space();
        line.push(piece);
        line.recalculate_width(metrics, config);

        if fills && line.width_so_far > line.max_width && line.checkpoint > 0 {
            let tail = line.split_off(line.checkpoint);
            debug!(
                "line overfull ({:.1}pt > {:.1}pt), breaking before {} pieces",
                line.width_so_far,
                line.max_width,
                tail.len()
            );
            self.current = Some(line);
            self.finish_line(metrics, config, false);
            for piece in tail.into_iter().skip_while(Piece::is_blank) {
                self.append_piece(piece, metrics, config);
            }
        } else {
            self.current = Some(line);
        }
    }

    /// Append a piece to the current line without measuring or breaking.
    pub fn append_raw(&mut self, piece: Piece) {
        self.current
            .get_or_insert_with(|| Line::new(self.alignment, 0.0, 0.0))
            .push(piece);
    }

    /// Append all pieces of another paragraph raw, separated by a space.
    pub fn append_paragraph(&mut self, other: &Paragraph, metrics: &dyn FontMetrics) {
        let mut pieces = other.pieces().peekable();
        if let Some(first) = pieces.peek() {
            if self.pieces().next().is_some() {
                let font = std::sync::Arc::clone(&first.font);
                let width = metrics.text_width(&font, first.size, " ");
                self.append_raw(Piece::new(" ", font, first.size, width, 0.0));
            }
        }
        for piece in pieces {
            self.append_raw(piece.clone());
        }
    }

    fn finish_line(&mut self, metrics: &dyn FontMetrics, config: &LayoutConfig, forced: bool) {
        let Some(mut line) = self.current.take() else {
            return;
        };
        if line.is_empty() {
            return;
        }
        if forced && line.alignment == Alignment::Justified {
            line.alignment = Alignment::Left;
        }
        line.recalculate_width(metrics, config);
        line.calculate_height(metrics, config.line_spacing);
        trace!("finished line {}: {}", self.lines.len(), line);
        self.lines.push(line);
    }

    /// End the current line at a forced line break.
    pub fn break_line(&mut self, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        self.finish_line(metrics, config, true);
        self.poem_subsequent_line = false;
    }

    /// Finish the current line, if it has any pieces.
    pub fn flush(&mut self, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        self.finish_line(metrics, config, false);
    }

    /// Finish the current line and add explicit vertical space.
    pub fn push_vspace(&mut self, height: f32, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        self.flush(metrics, config);
        self.lines.push(Line::vspace(height));
    }

    /// Tie every finished line from `start` onwards to the line after it.
    pub fn tie_lines_from(&mut self, start: usize) {
        for line in self.lines.iter_mut().skip(start) {
            line.tied_to_next_line = true;
        }
    }

    /// Break all pieces into lines afresh.
    ///
    /// The receiver is left untouched, so this is safe to run on a
    /// speculative copy.
    pub fn layout(&self, metrics: &dyn FontMetrics, config: &LayoutConfig) -> Paragraph {
        let mut laid = Paragraph::new(self.alignment);
        laid.is_body = self.is_body;
        for piece in self.pieces() {
            if laid.current.as_ref().map_or(true, Line::is_empty) && piece.is_blank() {
                continue;
            }
            laid.append_piece(piece.clone(), metrics, config);
        }
        laid.flush(metrics, config);
        laid
    }

    /// Total height of the finished lines.
    pub fn height(&self, line_spacing: f32) -> f32 {
        self.lines.iter().map(|l| l.advance(line_spacing)).sum()
    }

    /// Trim, re-measure and (except on the last line) justify a line
    /// ready for drawing.
    pub fn prepare_line(&mut self, index: usize, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        let last = index + 1 >= self.lines.len();
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        line.remove_trailing_space();
        if line.alignment == Alignment::Justified {
            line.remove_leading_space();
        }
        line.recalculate_width(metrics, config);
        if line.alignment == Alignment::Justified && !last {
            line.justify();
        }
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new(Alignment::default())
    }
}

impl fmt::Display for Paragraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            let tie = if line.tied_to_next_line { " +" } else { "" };
            writeln!(f, "{:3}{}: {}", i, tie, line)?;
        }
        if let Some(line) = self.current.as_ref().filter(|l| !l.is_empty()) {
            writeln!(f, "  *: {}", line)?;
        }
        Ok(())
    }
}

/// Check if a line may break after this piece.
fn is_break_after(piece: &Piece) -> bool {
    piece.is_space()
        || piece.text == "\u{2009}"
        || piece
            .text
            .ends_with([',', '-', '\u{2013}', '\u{2014}'])
}
