//! Page geometry and layout tuning.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// White space kept between hung punctuation and the cross-reference column.
pub const HANG_CLEARANCE: f32 = 2.0;

/// Layout configuration, in points (1 point = 1/72 inch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Page width
    pub page_width: f32,

    /// Page height
    pub page_height: f32,

    /// Top margin
    pub top_margin: f32,

    /// Bottom margin
    pub bottom_margin: f32,

    /// Left margin (inner edge of the text column)
    pub left_margin: f32,

    /// Right margin; holds the cross-reference column
    pub right_margin: f32,

    /// Gap between the text column and the cross-reference column
    pub crossref_margin_width: f32,

    /// Width of the cross-reference column
    pub crossref_column_width: f32,

    /// Minimum vertical space around each cross-reference block
    pub crossref_min_vspace: f32,

    /// Line spacing multiplier (1.0 = the fonts' own line gap)
    pub line_spacing: f32,

    /// Body font size
    pub body_font_size: f32,

    /// Left margin of first-level poetry
    pub poetry_left_margin: f32,

    /// Extra indent for each nested poetry level
    pub poetry_level_indent: f32,

    /// Extra indent for wrapped continuation lines of a poetry line
    pub poetry_wrap_indent: f32,

    /// Gap between body text and the footnote block
    pub footnote_sep_vspace: f32,

    /// Penalty for each point a page is overfull
    pub overfull_page_penalty_per_pt: f32,

    /// Fixed break penalty, as a multiple of the per-point penalty
    pub break_penalty_multiplier: f32,

    /// Draw a bar beside every line showing the vertical space it used
    pub debug_vspace: bool,
}

impl LayoutConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the page size.
    pub fn with_page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Set all four margins.
    pub fn with_margins(mut self, top: f32, bottom: f32, left: f32, right: f32) -> Self {
        self.top_margin = top;
        self.bottom_margin = bottom;
        self.left_margin = left;
        self.right_margin = right;
        self
    }

    /// Set the line spacing multiplier.
    pub fn with_line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Set the body font size.
    pub fn with_body_font_size(mut self, size: f32) -> Self {
        self.body_font_size = size;
        self
    }

    /// Set the per-point overfull penalty.
    pub fn with_overfull_penalty(mut self, per_pt: f32) -> Self {
        self.overfull_page_penalty_per_pt = per_pt;
        self
    }

    /// Enable or disable vertical space markers.
    pub fn with_debug_vspace(mut self, enabled: bool) -> Self {
        self.debug_vspace = enabled;
        self
    }

    /// Width of the body text column.
    pub fn text_width(&self) -> f32 {
        self.page_width - self.left_margin - self.right_margin
    }

    /// Lowest baseline position (measured from the top) body text may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.page_height - self.bottom_margin
    }

    /// Vertical space available between the margins.
    pub fn body_height(&self) -> f32 {
        self.page_height - self.top_margin - self.bottom_margin
    }

    /// Widest right hang that still clears the cross-reference column.
    pub fn max_right_hang(&self) -> f32 {
        self.right_margin - self.crossref_margin_width - self.crossref_column_width - HANG_CLEARANCE
    }

    /// Page x coordinate of the cross-reference column.
    pub fn crossref_x(&self) -> f32 {
        self.page_width - self.right_margin + self.crossref_margin_width
    }

    /// Fixed penalty added whenever a line would overfill the page.
    pub fn break_penalty(&self) -> f32 {
        self.overfull_page_penalty_per_pt * self.break_penalty_multiplier
    }

    /// Check that the geometry leaves room for text.
    pub fn validate(&self) -> Result<()> {
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(Error::Config(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        if self.text_width() <= 0.0 {
            return Err(Error::Config(
                "left and right margins leave no text column".to_string(),
            ));
        }
        if self.body_height() <= 0.0 {
            return Err(Error::Config(
                "top and bottom margins leave no body height".to_string(),
            ));
        }
        if self.line_spacing <= 0.0 {
            return Err(Error::Config("line spacing must be positive".to_string()));
        }
        if self.body_font_size <= 0.0 {
            return Err(Error::Config("body font size must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    /// A 6x9 inch trade page with a cross-reference column in the outer margin.
    fn default() -> Self {
        Self {
            page_width: 432.0,
            page_height: 648.0,
            top_margin: 36.0,
            bottom_margin: 36.0,
            left_margin: 36.0,
            right_margin: 72.0,
            crossref_margin_width: 4.0,
            crossref_column_width: 56.0,
            crossref_min_vspace: 2.0,
            line_spacing: 1.0,
            body_font_size: 10.0,
            poetry_left_margin: 18.0,
            poetry_level_indent: 12.0,
            poetry_wrap_indent: 24.0,
            footnote_sep_vspace: 6.0,
            overfull_page_penalty_per_pt: 1000.0,
            break_penalty_multiplier: 20.0,
            debug_vspace: false,
        }
    }
}
