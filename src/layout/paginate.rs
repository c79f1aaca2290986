//! Page fitting and line emission.
//!
//! Every candidate line (or group of tied lines) is measured against the
//! space left on the page for body text, the footnotes it would bring along,
//! and the cross-references it would add to the side column. Overflow is not
//! an error: it is reported with a penalty so the caller can decide where to
//! cut the page.

use std::sync::Arc;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::{FontMetrics, LayoutConfig};
use crate::model::{CrossReferenceQueue, FontFace, FontRole, Paragraph};
use crate::render::Renderer;

/// Horizontal position of the vertical-space debug bars.
const DEBUG_VSPACE_X: f32 = 32.0;

/// Width of a vertical-space debug bar.
const DEBUG_VSPACE_WIDTH: f32 = 8.0;

/// What a candidate line would overfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    /// Body text runs past the bottom margin
    Body,
    /// Body text plus footnotes runs past the bottom margin
    Footnotes,
    /// Cross-references no longer fit in the side column
    CrossReferences,
}

/// Measurement of a candidate line against the current page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitReport {
    /// Last line of the tied group starting at the candidate
    pub last_tied_line: usize,

    /// Combined height of the tied group
    pub group_height: f32,

    /// Projected baseline (from the page top), including footnotes
    pub projected_y: f32,

    /// Height of the footnote block including its separator, or zero
    pub footnote_height: f32,

    /// Height of all cross-references on the page, including spacing
    pub crossref_height: f32,

    /// Conditions that overflowed
    pub overflows: Vec<Overflow>,

    /// Penalty for placing the candidate on this page
    pub penalty: f32,
}

impl FitReport {
    /// Check if the candidate fits.
    pub fn fits(&self) -> bool {
        self.overflows.is_empty()
    }
}

/// Result of emitting a line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LineOutcome {
    /// The page overflowed; the caller should break before this line
    pub break_page: bool,

    /// Penalty added for this line
    pub penalty: f32,
}

/// Summary of a finished page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// Page number (1-indexed)
    pub number: u32,

    /// Body lines emitted on the page
    pub line_count: usize,

    /// Last verse number seen up to the end of the page
    pub last_verse: Option<u32>,

    /// Last chapter number seen up to the end of the page
    pub last_chapter: Option<u32>,

    /// Height of the footnote block
    pub footnote_height: f32,

    /// Cross-reference blocks placed in the side column
    pub crossref_count: usize,

    /// Penalty accumulated on the page
    pub penalty: f32,
}

/// Mutable pagination state, reset at each page boundary.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Current page number (1-indexed)
    pub page_number: u32,

    /// Vertical cursor, in points from the page top
    pub page_y: f32,

    /// Footnotes committed to this page
    pub footnotes: Paragraph,

    /// Cross-references committed to this page
    pub crossrefs: CrossReferenceQueue,

    /// Penalty accumulated over the whole run
    pub total_penalty: f32,

    /// Penalty accumulated on this page
    pub page_penalty: f32,

    /// Last verse number emitted so far
    pub last_verse: Option<u32>,

    /// Last chapter number emitted so far
    pub last_chapter: Option<u32>,

    /// Lines emitted on this page
    pub lines_on_page: usize,

    debug_vspace_offset: f32,
}

impl PageContext {
    /// Create the context for page 1.
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            page_number: 1,
            page_y: config.top_margin,
            footnotes: Paragraph::footnotes(),
            crossrefs: CrossReferenceQueue::new(),
            total_penalty: 0.0,
            page_penalty: 0.0,
            last_verse: None,
            last_chapter: None,
            lines_on_page: 0,
            debug_vspace_offset: 0.0,
        }
    }

    /// Move to the next page. Verse and chapter tracking carries over.
    pub fn next_page(&mut self, config: &LayoutConfig) {
        self.page_number += 1;
        self.page_y = config.top_margin;
        self.footnotes = Paragraph::footnotes();
        self.crossrefs = CrossReferenceQueue::new();
        self.page_penalty = 0.0;
        self.lines_on_page = 0;
    }

    /// Add a penalty to the page and run totals.
    pub fn add_penalty(&mut self, penalty: f32) {
        self.page_penalty += penalty;
        self.total_penalty += penalty;
    }
}

/// Places lines on pages.
pub struct Paginator<'a> {
    config: &'a LayoutConfig,
    metrics: &'a dyn FontMetrics,
    crossref_font: Arc<FontFace>,
    ctx: PageContext,
}

impl<'a> Paginator<'a> {
    /// Create a paginator positioned at the top of page 1.
    pub fn new(config: &'a LayoutConfig, metrics: &'a dyn FontMetrics) -> Self {
        Self {
            config,
            metrics,
            crossref_font: Arc::new(FontFace::new("crossref", config.body_font_size * 0.7)),
            ctx: PageContext::new(config),
        }
    }

    /// Set the face cross-reference entries are drawn in.
    pub fn with_crossref_font(mut self, font: Arc<FontFace>) -> Self {
        self.crossref_font = font;
        self
    }

    /// Current pagination state.
    pub fn context(&self) -> &PageContext {
        &self.ctx
    }

    /// Mutable pagination state.
    pub fn context_mut(&mut self) -> &mut PageContext {
        &mut self.ctx
    }

    /// Check if nothing has been emitted on the current page.
    pub fn page_is_empty(&self) -> bool {
        self.ctx.lines_on_page == 0
    }

    /// Add a penalty for a break decision taken by the caller.
    pub fn add_penalty(&mut self, penalty: f32) {
        self.ctx.add_penalty(penalty);
    }

    /// Measure whether line `line_num` of `para`, with every line tied to
    /// it, fits on the current page.
    pub fn check_fit(&self, para: &Paragraph, line_num: usize) -> FitReport {
        let config = self.config;
        let lines = para.lines();
        if line_num >= lines.len() {
            return FitReport::default();
        }

        let spacing = config.line_spacing;
        let per_pt = config.overfull_page_penalty_per_pt;
        let bottom = config.bottom_limit();

        let mut last = line_num;
        let mut group_height = lines[line_num].advance(spacing);
        while last + 1 < lines.len() && lines[last].tied_to_next_line {
            last += 1;
            group_height += lines[last].advance(spacing);
        }
        let group = &lines[line_num..=last];

        let mut report = FitReport {
            last_tied_line: last,
            group_height,
            ..Default::default()
        };

        let mut baseline = self.ctx.page_y + group_height;
        if baseline > bottom {
            report.overflows.push(Overflow::Body);
            report.penalty += (baseline - bottom) * per_pt;
        }

        if para.is_body {
            // Probe on a copy so the committed footnotes stay untouched.
            let mut probe = self.ctx.footnotes.clone();
            for note in group.iter().flat_map(|l| l.footnotes()) {
                probe.append_paragraph(note, self.metrics);
            }
            let notes_height = probe.layout(self.metrics, config).height(spacing);
            if notes_height > 0.0 {
                report.footnote_height = notes_height + config.footnote_sep_vspace;
                baseline += report.footnote_height;
                if baseline > bottom {
                    report.overflows.push(Overflow::Footnotes);
                    report.penalty += (baseline - bottom) * per_pt;
                }
            }

            let mut crossref_height = self.ctx.crossrefs.total_height();
            let mut crossref_count = self.ctx.crossrefs.len();
            for block in group.iter().flat_map(|l| l.crossref_blocks()) {
                crossref_height += block.total_height;
                crossref_count += 1;
            }
            let needed = crossref_height + (crossref_count + 1) as f32 * config.crossref_min_vspace;
            let available = config.body_height() - report.footnote_height;
            report.crossref_height = needed;
            if needed > available {
                report.overflows.push(Overflow::CrossReferences);
                report.penalty += (needed - available) * per_pt;
            }
        }

        if !report.fits() {
            report.penalty += config.break_penalty();
        }
        report.projected_y = baseline;
        report
    }

    /// Measure, draw and commit line `line_num` of `para`.
    ///
    /// The line is emitted even when it overflows; the outcome tells the
    /// caller the page should have been broken before it.
    pub fn emit_line(
        &mut self,
        para: &mut Paragraph,
        line_num: usize,
        renderer: &mut dyn Renderer,
    ) -> LineOutcome {
        let report = self.check_fit(para, line_num);
        self.emit_line_with(para, line_num, &report, renderer)
    }

    /// Draw and commit line `line_num` of `para` using a report already
    /// computed against the current page state.
    ///
    /// The report's penalty is charged as is. Lines following the head of a
    /// tied group are emitted with `FitReport::default()`.
    pub fn emit_line_with(
        &mut self,
        para: &mut Paragraph,
        line_num: usize,
        report: &FitReport,
        renderer: &mut dyn Renderer,
    ) -> LineOutcome {
        if line_num >= para.line_count() {
            return LineOutcome::default();
        }
        if !report.fits() {
            debug!(
                "page {}: line {} overflows {:?} at {:.1}pt (penalty {:.0})",
                self.ctx.page_number, line_num, report.overflows, report.projected_y, report.penalty
            );
        }
        self.ctx.add_penalty(report.penalty);

        let config = self.config;
        let metrics = self.metrics;
        para.prepare_line(line_num, metrics, config);
        let Some(line) = para.line_mut(line_num) else {
            return LineOutcome::default();
        };

        let ctx = &mut self.ctx;
        line.on_page_y = ctx.page_y;
        let y = (config.page_height - ctx.page_y) - line.line_height;
        line.draw(renderer, config.left_margin, y);
        trace!("page {} y={:.1}: {}", ctx.page_number, ctx.page_y, line);

        for piece in line.pieces() {
            if let Some(block) = piece.crossrefs.as_deref() {
                ctx.crossrefs.push(block.clone(), ctx.page_y);
            }
            if let Some(note) = piece.footnote.as_deref() {
                ctx.footnotes.append_paragraph(note, metrics);
            }
            match piece.role() {
                FontRole::VerseNumber => ctx.last_verse = Some(piece.number()),
                FontRole::ChapterNumber => ctx.last_chapter = Some(piece.number()),
                _ => {}
            }
        }

        let advance = line.advance(config.line_spacing);
        if config.debug_vspace {
            ctx.debug_vspace_offset = DEBUG_VSPACE_WIDTH - ctx.debug_vspace_offset;
            renderer.fill_rect(
                DEBUG_VSPACE_X + ctx.debug_vspace_offset,
                y,
                DEBUG_VSPACE_WIDTH,
                advance,
            );
        }
        ctx.page_y += advance;
        ctx.lines_on_page += 1;

        LineOutcome {
            break_page: !report.fits(),
            penalty: report.penalty,
        }
    }

    /// Announce the current page to the renderer.
    pub fn begin_page(&mut self, renderer: &mut dyn Renderer) {
        renderer.begin_page(
            self.ctx.page_number,
            self.config.page_width,
            self.config.page_height,
        );
    }

    /// Draw the page's footnotes and cross-references, then move to the
    /// next page.
    pub fn finish_page(&mut self, renderer: &mut dyn Renderer) -> PageSummary {
        let footnote_height = self.draw_footnotes(renderer);
        let crossref_count = self.draw_crossrefs(renderer);
        renderer.end_page(self.ctx.page_number);

        let summary = PageSummary {
            number: self.ctx.page_number,
            line_count: self.ctx.lines_on_page,
            last_verse: self.ctx.last_verse,
            last_chapter: self.ctx.last_chapter,
            footnote_height,
            crossref_count,
            penalty: self.ctx.page_penalty,
        };
        debug!(
            "finished page {} ({} lines, penalty {:.0})",
            summary.number, summary.line_count, summary.penalty
        );

        self.ctx.next_page(self.config);
        summary
    }

    /// Draw the footnote block against the bottom margin.
    fn draw_footnotes(&mut self, renderer: &mut dyn Renderer) -> f32 {
        if self.ctx.footnotes.is_empty() {
            return 0.0;
        }
        let config = self.config;
        let mut laid = self.ctx.footnotes.layout(self.metrics, config);
        let height = laid.height(config.line_spacing);

        let mut page_y = config.bottom_limit() - height;
        for i in 0..laid.line_count() {
            laid.prepare_line(i, self.metrics, config);
            if let Some(line) = laid.line(i) {
                let y = (config.page_height - page_y) - line.line_height;
                line.draw(renderer, config.left_margin, y);
                page_y += line.advance(config.line_spacing);
            }
        }
        height
    }

    /// Draw queued cross-references in the side column, each next to the
    /// line that introduced it and below the previous block.
    fn draw_crossrefs(&mut self, renderer: &mut dyn Renderer) -> usize {
        let config = self.config;
        let font = Arc::clone(&self.crossref_font);
        let queued = self.ctx.crossrefs.drain();
        let x = config.crossref_x();

        let mut next_free = config.top_margin;
        for entry in &queued {
            let top = entry.page_y.max(next_free);
            let step = entry.block.entry_height();
            for (i, text) in entry.block.entries.iter().enumerate() {
                let y = config.page_height - (top + (i + 1) as f32 * step);
                renderer.begin_text();
                renderer.set_font(&font, font.size);
                renderer.draw_text(x, y, text);
                renderer.record_text(&font, font.size, text, x, y);
                renderer.end_text();
            }
            next_free = top + entry.block.total_height + config.crossref_min_vspace;
        }
        queued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::UniformMetrics;
    use crate::model::{Alignment, CrossReferenceBlock, FontBook, Piece};
    use crate::render::{NullRenderer, RecordingRenderer};

    fn one_line(book: &FontBook, config: &LayoutConfig, text: &str) -> Paragraph {
        let metrics = UniformMetrics::default();
        let mut p = Paragraph::new(Alignment::Justified);
        p.append_piece(
            Piece::measured(text, &book.get("body").unwrap(), &metrics),
            &metrics,
            config,
        );
        p.flush(&metrics, config);
        p
    }

    #[test]
    fn test_exact_fit_has_no_penalty() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let para = one_line(&book, &config, "word");
        let height = para.lines()[0].line_height;

        let mut paginator = Paginator::new(&config, &metrics);
        paginator.context_mut().page_y = config.bottom_limit() - height;

        let report = paginator.check_fit(&para, 0);
        assert!(report.fits());
        assert_eq!(report.penalty, 0.0);
    }

    #[test]
    fn test_overfull_penalty() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let mut para = one_line(&book, &config, "word");
        let height = para.lines()[0].line_height;

        let mut paginator = Paginator::new(&config, &metrics);
        paginator.context_mut().page_y = config.bottom_limit() - height + 3.0;

        let outcome = paginator.emit_line(&mut para, 0, &mut NullRenderer);
        assert!(outcome.break_page);
        let expected = 3.0 * config.overfull_page_penalty_per_pt + config.break_penalty();
        assert!((outcome.penalty - expected).abs() < 1.0);
        assert!((paginator.context().total_penalty - expected).abs() < 1.0);
    }

    #[test]
    fn test_emit_with_report_charges_it_once() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let mut para = one_line(&book, &config, "word");
        let height = para.lines()[0].line_height;

        let mut paginator = Paginator::new(&config, &metrics);
        paginator.context_mut().page_y = config.bottom_limit() - height + 3.0;

        let report = paginator.check_fit(&para, 0);
        assert!(!report.fits());
        let outcome = paginator.emit_line_with(&mut para, 0, &report, &mut NullRenderer);
        assert!(outcome.break_page);
        assert_eq!(outcome.penalty, report.penalty);
        assert_eq!(paginator.context().total_penalty, report.penalty);
    }

    #[test]
    fn test_emit_with_default_report_skips_fit_check() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let mut para = one_line(&book, &config, "word");

        let mut paginator = Paginator::new(&config, &metrics);
        paginator.context_mut().page_y = config.bottom_limit();

        let outcome =
            paginator.emit_line_with(&mut para, 0, &FitReport::default(), &mut NullRenderer);
        assert!(!outcome.break_page);
        assert_eq!(paginator.context().total_penalty, 0.0);
        assert_eq!(paginator.context().lines_on_page, 1);
    }

    #[test]
    fn test_tied_group_measured_together() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let body = book.get("body").unwrap();

        let mut para = Paragraph::new(Alignment::Centered);
        para.append_piece(Piece::measured("Heading", &body, &metrics), &metrics, &config);
        para.break_line(&metrics, &config);
        para.tie_lines_from(0);
        para.append_piece(Piece::measured("text", &body, &metrics), &metrics, &config);
        para.flush(&metrics, &config);

        let mut paginator = Paginator::new(&config, &metrics);
        // Room for one line but not two
        paginator.context_mut().page_y = config.bottom_limit() - 13.0;

        let report = paginator.check_fit(&para, 0);
        assert_eq!(report.last_tied_line, 1);
        assert!((report.group_height - 24.0).abs() < 1e-3);
        assert_eq!(report.overflows, vec![Overflow::Body]);

        // The second line alone fits
        assert!(paginator.check_fit(&para, 1).fits());
    }

    #[test]
    fn test_footnote_probe_does_not_commit() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let footnote_face = book.get("footnote").unwrap();

        let mut note = Paragraph::footnotes();
        note.append_raw(Piece::measured("A note.", &footnote_face, &metrics));
        let mark = Piece::measured("a", &book.get("footnotemark").unwrap(), &metrics)
            .with_footnote(note);

        let mut para = Paragraph::new(Alignment::Justified);
        para.append_piece(Piece::measured("word", &book.get("body").unwrap(), &metrics), &metrics, &config);
        para.append_piece(mark, &metrics, &config);
        para.flush(&metrics, &config);

        let mut paginator = Paginator::new(&config, &metrics);
        let report = paginator.check_fit(&para, 0);
        // One 9.6pt footnote line plus the 6pt separator
        assert!((report.footnote_height - 15.6).abs() < 1e-3);
        assert!(paginator.context().footnotes.is_empty());

        paginator.emit_line(&mut para, 0, &mut NullRenderer);
        assert!(!paginator.context().footnotes.is_empty());
    }

    #[test]
    fn test_crossref_overflow() {
        let config = LayoutConfig::default();
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);
        let piece = Piece::measured("word", &book.get("body").unwrap(), &metrics)
            .with_crossrefs(CrossReferenceBlock::new("x", vec!["y".into()], 500.0));

        let mut para = Paragraph::new(Alignment::Justified);
        para.append_piece(piece, &metrics, &config);
        para.flush(&metrics, &config);

        let mut paginator = Paginator::new(&config, &metrics);
        paginator
            .context_mut()
            .crossrefs
            .push(CrossReferenceBlock::new("z", vec!["w".into()], 100.0), 40.0);

        let report = paginator.check_fit(&para, 0);
        assert_eq!(report.overflows, vec![Overflow::CrossReferences]);
        // 600 + 3 * 2 needed, 576 available
        let expected = 30.0 * config.overfull_page_penalty_per_pt + config.break_penalty();
        assert!((report.penalty - expected).abs() < 1.0);
    }

    #[test]
    fn test_emit_tracks_verses_and_draws() {
        let config = LayoutConfig::default().with_debug_vspace(true);
        let metrics = UniformMetrics::default();
        let book = FontBook::with_defaults(10.0);

        let mut para = Paragraph::new(Alignment::Justified);
        para.append_piece(Piece::measured("7", &book.get("versenum").unwrap(), &metrics), &metrics, &config);
        para.append_piece(Piece::measured("Then", &book.get("body").unwrap(), &metrics), &metrics, &config);
        para.flush(&metrics, &config);

        let mut renderer = RecordingRenderer::new();
        let mut paginator = Paginator::new(&config, &metrics);
        paginator.begin_page(&mut renderer);
        paginator.emit_line(&mut para, 0, &mut renderer);
        assert_eq!(paginator.context().last_verse, Some(7));
        assert!(paginator.context().page_y > config.top_margin);

        let summary = paginator.finish_page(&mut renderer);
        assert_eq!(summary.number, 1);
        assert_eq!(summary.line_count, 1);
        assert_eq!(summary.last_verse, Some(7));
        assert_eq!(paginator.context().page_number, 2);
        assert_eq!(paginator.context().page_y, config.top_margin);

        let page = &renderer.pages()[0];
        assert_eq!(page.lines(), vec!["7Then".to_string()]);
        assert_eq!(page.rect_count(), 1);
    }
}
