//! The drawing surface lines are emitted onto.

use crate::model::FontFace;

/// A drawing surface with PDF-style coordinates (y = 0 at the page bottom,
/// text positioned by its baseline).
///
/// Only the text scope, font, text and rectangle operations are required;
/// page boundaries and text recording are optional.
pub trait Renderer {
    /// Start a new page.
    fn begin_page(&mut self, _number: u32, _width: f32, _height: f32) {}

    /// Finish the current page.
    fn end_page(&mut self, _number: u32) {}

    /// Open a text drawing scope.
    fn begin_text(&mut self);

    /// Close the text drawing scope.
    fn end_text(&mut self);

    /// Set the active font, size and fill colour.
    fn set_font(&mut self, font: &FontFace, size: f32);

    /// Draw a text run with its baseline at (x, y).
    fn draw_text(&mut self, x: f32, y: f32, text: &str);

    /// Draw a filled rectangle.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Record drawn text for downstream indexing.
    fn record_text(&mut self, _font: &FontFace, _size: f32, _text: &str, _x: f32, _y: f32) {}
}

/// A renderer that draws nothing, for measure-only runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn begin_text(&mut self) {}

    fn end_text(&mut self) {}

    fn set_font(&mut self, _font: &FontFace, _size: f32) {}

    fn draw_text(&mut self, _x: f32, _y: f32, _text: &str) {}

    fn fill_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {}
}
