//! Type faces and the font registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An RGB fill colour with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Black.
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    /// Create a colour from components.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// Layout role of a face, derived from its nickname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontRole {
    /// Ordinary running text
    Body,
    /// Verse numbers in the body
    VerseNumber,
    /// Chapter numbers (usually drop caps)
    ChapterNumber,
    /// Footnote marks in the body
    FootnoteMark,
    /// Footnote marks repeated at the start of the footnote text
    FootnoteMarkInFootnote,
    /// Verse numbers inside footnote text
    FootnoteVerseNumber,
}

impl FontRole {
    /// Classify a font nickname.
    pub fn from_nickname(nickname: &str) -> Self {
        match nickname.to_ascii_lowercase().as_str() {
            "versenum" => FontRole::VerseNumber,
            "chapternum" => FontRole::ChapterNumber,
            "footnotemark" => FontRole::FootnoteMark,
            "footnotemarkinfootnote" => FontRole::FootnoteMarkInFootnote,
            "footnoteversenum" => FontRole::FootnoteVerseNumber,
            _ => FontRole::Body,
        }
    }

    /// Check if this role belongs to the footnote mark family.
    pub fn is_footnote_family(self) -> bool {
        matches!(
            self,
            FontRole::FootnoteMark | FontRole::FootnoteMarkInFootnote | FontRole::FootnoteVerseNumber
        )
    }
}

/// A type face: a font at a size, with its vertical metrics.
///
/// Faces are registered once in a [`FontBook`] and shared by every piece
/// that uses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFace {
    /// Name the markup and style map refer to
    pub nickname: String,

    /// Size in points
    pub size: f32,

    /// Ascender height as a fraction of the size
    pub ascender: f32,

    /// Descender depth as a fraction of the size (positive)
    pub descender: f32,

    /// Line gap in points
    pub line_gap: f32,

    /// Number of text lines the face spans (more than one for drop caps)
    pub line_count: u32,

    /// Offset subtracted from the baseline when drawing; negative raises
    pub baseline_shift: f32,

    /// Fill colour
    pub color: Color,
}

impl FontFace {
    /// Create a single-line face with typical Latin proportions.
    pub fn new(nickname: impl Into<String>, size: f32) -> Self {
        Self {
            nickname: nickname.into(),
            size,
            ascender: 0.8,
            descender: 0.2,
            line_gap: size * 1.2,
            line_count: 1,
            baseline_shift: 0.0,
            color: Color::BLACK,
        }
    }

    /// Set the line gap.
    pub fn with_line_gap(mut self, line_gap: f32) -> Self {
        self.line_gap = line_gap;
        self
    }

    /// Set the number of lines the face spans.
    pub fn with_line_count(mut self, line_count: u32) -> Self {
        self.line_count = line_count.max(1);
        self
    }

    /// Set the baseline shift.
    pub fn with_baseline_shift(mut self, shift: f32) -> Self {
        self.baseline_shift = shift;
        self
    }

    /// Set the fill colour.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Layout role of this face.
    pub fn role(&self) -> FontRole {
        FontRole::from_nickname(&self.nickname)
    }

    /// Check if this face spans several lines.
    pub fn is_drop_cap(&self) -> bool {
        self.line_count > 1
    }
}

/// Registry of faces by nickname.
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    faces: HashMap<String, Arc<FontFace>>,
}

impl FontBook {
    /// Create an empty font book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a font book with the faces the piece builder expects.
    pub fn with_defaults(body_size: f32) -> Self {
        let s = body_size;
        let raised = -0.35 * s;
        let mut book = Self::new();

        book.register(FontFace::new("body", s));
        book.register(FontFace::new("italic", s));
        book.register(FontFace::new("bold", s));
        book.register(FontFace::new("heading", s * 1.3));
        book.register(
            FontFace::new("versenum", s * 0.6)
                .with_line_gap(s * 1.2)
                .with_baseline_shift(raised)
                .with_color(Color::rgb(0.6, 0.0, 0.0)),
        );
        book.register(
            FontFace::new("chapternum", s * 2.4)
                .with_line_count(2)
                .with_color(Color::rgb(0.6, 0.0, 0.0)),
        );
        book.register(FontFace::new("footnotemark", s * 0.6).with_baseline_shift(raised));
        book.register(FontFace::new("footnote", s * 0.8));
        book.register(
            FontFace::new("footnotemarkinfootnote", s * 0.5).with_baseline_shift(raised * 0.8),
        );
        book.register(FontFace::new("footnoteversenum", s * 0.5).with_baseline_shift(raised * 0.8));
        book.register(FontFace::new("crossref", s * 0.7));
        book
    }

    /// Register a face, replacing any face with the same nickname.
    pub fn register(&mut self, face: FontFace) -> Arc<FontFace> {
        let face = Arc::new(face);
        self.faces.insert(face.nickname.clone(), Arc::clone(&face));
        face
    }

    /// Look up a face by nickname.
    pub fn get(&self, nickname: &str) -> Result<Arc<FontFace>> {
        self.faces
            .get(nickname)
            .cloned()
            .ok_or_else(|| Error::UnknownFont(nickname.to_string()))
    }

    /// Check if a nickname is registered.
    pub fn contains(&self, nickname: &str) -> bool {
        self.faces.contains_key(nickname)
    }

    /// Number of registered faces.
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Check if no faces are registered.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}
