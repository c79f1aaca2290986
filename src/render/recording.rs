//! A renderer that keeps every drawing operation.

use serde::{Deserialize, Serialize};

use super::Renderer;
use crate::model::{Color, FontFace};

/// A single drawing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    /// Start of a text scope (one per drawn line)
    BeginText,
    /// End of a text scope
    EndText,
    /// Font change
    SetFont {
        font: String,
        size: f32,
        color: Color,
    },
    /// Text run
    Text { x: f32, y: f32, text: String },
    /// Filled rectangle
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

/// Text recorded for indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    /// Font nickname
    pub font: String,
    /// Font size in points
    pub size: f32,
    /// Recorded text
    pub text: String,
    /// Left edge of the text
    pub x: f32,
    /// Baseline position
    pub y: f32,
}

/// Everything drawn on one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedPage {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Drawing operations in order
    pub ops: Vec<DrawOp>,

    /// Recorded text runs
    pub text: Vec<TextRecord>,
}

impl RecordedPage {
    /// Text of each text scope, in drawing order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current: Option<String> = None;
        for op in &self.ops {
            match op {
                DrawOp::BeginText => current = Some(String::new()),
                DrawOp::Text { text, .. } => {
                    current.get_or_insert_with(String::new).push_str(text);
                }
                DrawOp::EndText => {
                    if let Some(line) = current.take() {
                        lines.push(line);
                    }
                }
                _ => {}
            }
        }
        if let Some(line) = current {
            lines.push(line);
        }
        lines
    }

    /// Number of filled rectangles.
    pub fn rect_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Rect { .. }))
            .count()
    }
}

/// Renderer that records operations per page.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pages: Vec<RecordedPage>,
}

impl RecordingRenderer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded pages.
    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    /// Consume the recorder, returning its pages.
    pub fn into_pages(self) -> Vec<RecordedPage> {
        self.pages
    }

    fn page_mut(&mut self) -> &mut RecordedPage {
        if self.pages.is_empty() {
            self.pages.push(RecordedPage::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push(&mut self, op: DrawOp) {
        self.page_mut().ops.push(op);
    }
}

impl Renderer for RecordingRenderer {
    fn begin_page(&mut self, number: u32, width: f32, height: f32) {
        self.pages.push(RecordedPage {
            number,
            width,
            height,
            ..Default::default()
        });
    }

    fn begin_text(&mut self) {
        self.push(DrawOp::BeginText);
    }

    fn end_text(&mut self) {
        self.push(DrawOp::EndText);
    }

    fn set_font(&mut self, font: &FontFace, size: f32) {
        self.push(DrawOp::SetFont {
            font: font.nickname.clone(),
            size,
            color: font.color,
        });
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str) {
        self.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.push(DrawOp::Rect {
            x,
            y,
            width,
            height,
        });
    }

    fn record_text(&mut self, font: &FontFace, size: f32, text: &str, x: f32, y: f32) {
        self.page_mut().text.push(TextRecord {
            font: font.nickname.clone(),
            size,
            text: text.to_string(),
            x,
            y,
        });
    }
}
