//! The page assembly loop.

use std::sync::Arc;

use log::{debug, info, warn};

use super::{FitReport, FontMetrics, LayoutConfig, PageSummary, Paginator};
use crate::model::{FontFace, Paragraph};
use crate::render::Renderer;

/// Drives paragraphs through the paginator and cuts pages where it
/// signals a break.
pub struct Typesetter<'a> {
    config: &'a LayoutConfig,
    metrics: &'a dyn FontMetrics,
    crossref_font: Option<Arc<FontFace>>,
}

impl<'a> Typesetter<'a> {
    /// Create a typesetter.
    pub fn new(config: &'a LayoutConfig, metrics: &'a dyn FontMetrics) -> Self {
        Self {
            config,
            metrics,
            crossref_font: None,
        }
    }

    /// Draw cross-reference entries in `font`.
    pub fn with_crossref_font(mut self, font: Arc<FontFace>) -> Self {
        self.crossref_font = Some(font);
        self
    }

    /// Lay out every line of `paragraphs` onto pages.
    ///
    /// A tied group that does not fit moves to a fresh page as a whole. A
    /// line that overflows an empty page is emitted anyway, since breaking
    /// again would not help.
    pub fn run(&self, paragraphs: &mut [Paragraph], renderer: &mut dyn Renderer) -> Vec<PageSummary> {
        let mut paginator = Paginator::new(self.config, self.metrics);
        if let Some(font) = &self.crossref_font {
            paginator = paginator.with_crossref_font(Arc::clone(font));
        }

        let mut pages = Vec::new();
        paginator.begin_page(renderer);

        for (p, para) in paragraphs.iter_mut().enumerate() {
            let mut line_num = 0;
            while line_num < para.line_count() {
                let mut report = paginator.check_fit(para, line_num);
                if !report.fits() && !paginator.page_is_empty() {
                    debug!(
                        "breaking page {} before paragraph {} line {}",
                        paginator.context().page_number,
                        p,
                        line_num
                    );
                    // The rejected candidate is charged to the page it would have overfilled.
                    paginator.add_penalty(report.penalty);
                    pages.push(paginator.finish_page(renderer));
                    paginator.begin_page(renderer);
                    report = paginator.check_fit(para, line_num);
                }

                let last = report.last_tied_line;
                for i in line_num..=last {
                    let outcome = if i == line_num {
                        paginator.emit_line_with(para, i, &report, renderer)
                    } else {
                        paginator.emit_line_with(para, i, &FitReport::default(), renderer)
                    };
                    if outcome.break_page {
                        warn!(
                            "page {}: paragraph {} line {} does not fit on an empty page",
                            paginator.context().page_number,
                            p,
                            i
                        );
                    }
                }
                line_num = last + 1;
            }
        }

        if !paginator.page_is_empty() || pages.is_empty() {
            pages.push(paginator.finish_page(renderer));
        }

        info!(
            "typeset {} pages (total penalty {:.0})",
            pages.len(),
            paginator.context().total_penalty
        );
        pages
    }
}
