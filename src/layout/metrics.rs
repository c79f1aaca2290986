//! Font measurement.

use crate::model::FontFace;

/// Vertical metrics of a face at a size, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalMetrics {
    /// Height above the baseline
    pub ascender: f32,
    /// Depth below the baseline (positive)
    pub descender: f32,
    /// Distance between successive baselines
    pub line_gap: f32,
}

/// Source of glyph measurements.
///
/// Widths and vertical metrics must share one unit system (points).
pub trait FontMetrics {
    /// Rendered width of `text` in `font` at `size`.
    fn text_width(&self, font: &FontFace, size: f32, text: &str) -> f32;

    /// Ascender, descender and line gap of `font` at `size`.
    fn vertical_metrics(&self, font: &FontFace, size: f32) -> VerticalMetrics {
        VerticalMetrics {
            ascender: font.ascender * size,
            descender: font.descender.abs() * size,
            line_gap: font.line_gap,
        }
    }
}

/// Monospaced metrics: every character advances a fixed fraction of the size.
///
/// Useful where real font files are not available, such as tests and
/// quick previews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformMetrics {
    /// Advance per character as a fraction of the size
    pub advance: f32,
}

impl UniformMetrics {
    /// Create uniform metrics with the given advance.
    pub fn new(advance: f32) -> Self {
        Self { advance }
    }
}

impl Default for UniformMetrics {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl FontMetrics for UniformMetrics {
    fn text_width(&self, _font: &FontFace, size: f32, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance * size
    }
}
