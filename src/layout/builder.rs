//! Turns the token stream into paragraphs of measured pieces.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, trace, warn};

use super::{FontMetrics, LayoutConfig};
use crate::error::Result;
use crate::lexer::{Token, TokenKind};
use crate::model::{
    Alignment, CrossReferenceBlock, CrossReferenceSource, FontBook, FontFace, Line, Paragraph,
    Piece, NBSP,
};

/// Markup for an em dash, set as U+2014.
const EM_DASH_MARKUP: &str = "---";

/// What a tag does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagStyle {
    /// Plain group; keeps the surrounding font
    Group,
    /// Switch to the named font
    Font(String),
    /// Verse number
    VerseNumber,
    /// Chapter number, set as a drop cap at the start of a paragraph
    Chapter,
    /// Footnote; the braced text becomes the note
    Footnote,
    /// Cross-reference citation for the preceding word
    CrossReference,
    /// Centred heading kept with the following line
    Heading,
    /// Poetry block (nestable)
    Poem,
    /// Vertical space; the braced text is the height in points
    VSpace,
    /// Permit a line break here
    AllowBreak,
    /// Paragraph break
    Paragraph,
    /// Tag without effect on layout
    Ignore,
}

static GROUP: TagStyle = TagStyle::Group;

/// Mapping from tag names to their layout effect.
#[derive(Debug, Clone)]
pub struct StyleMap {
    tags: HashMap<String, TagStyle>,
}

impl StyleMap {
    /// Create an empty style map.
    pub fn empty() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    /// Map a tag name to a style.
    pub fn insert(&mut self, tag: impl Into<String>, style: TagStyle) {
        self.tags.insert(tag.into(), style);
    }

    /// Map a tag name to a font nickname.
    pub fn with_font(mut self, tag: impl Into<String>, nickname: impl Into<String>) -> Self {
        self.insert(tag, TagStyle::Font(nickname.into()));
        self
    }

    /// Look up a tag. The empty name is always a plain group.
    pub fn get(&self, tag: &str) -> Option<&TagStyle> {
        if tag.is_empty() {
            return Some(&GROUP);
        }
        self.tags.get(tag)
    }
}

impl Default for StyleMap {
    fn default() -> Self {
        let mut map = Self::empty();
        for (tags, style) in [
            (&["v", "verse", "versenum"][..], TagStyle::VerseNumber),
            (&["chapter", "chapternum"][..], TagStyle::Chapter),
            (&["fn", "footnote"][..], TagStyle::Footnote),
            (&["xref", "crossref"][..], TagStyle::CrossReference),
            (&["heading", "section"][..], TagStyle::Heading),
            (&["poem", "poetry"][..], TagStyle::Poem),
            (&["vspace"][..], TagStyle::VSpace),
            (&["allowbreak"][..], TagStyle::AllowBreak),
            (&["par"][..], TagStyle::Paragraph),
            (&["em", "emph", "textit", "it"][..], TagStyle::Font("italic".into())),
            (&["textbf", "bf"][..], TagStyle::Font("bold".into())),
            (&["noindent", "relax"][..], TagStyle::Ignore),
        ] {
            for tag in tags {
                map.insert(*tag, style.clone());
            }
        }
        map
    }
}

enum FrameKind {
    Root,
    Group,
    Number { verse: bool },
    Footnote { note: Paragraph, label: String },
    CrossReference { citation: String },
    Heading { first_line: usize },
    Poem,
    VSpace { amount: String },
}

struct Frame {
    kind: FrameKind,
    font: Arc<FontFace>,
}

/// Builds paragraphs from tokens.
pub struct PieceBuilder<'a> {
    fonts: &'a FontBook,
    metrics: &'a dyn FontMetrics,
    config: &'a LayoutConfig,
    styles: StyleMap,
    crossrefs: Option<&'a dyn CrossReferenceSource>,
}

impl<'a> PieceBuilder<'a> {
    /// Create a builder with the default style map.
    pub fn new(fonts: &'a FontBook, metrics: &'a dyn FontMetrics, config: &'a LayoutConfig) -> Self {
        Self {
            fonts,
            metrics,
            config,
            styles: StyleMap::default(),
            crossrefs: None,
        }
    }

    /// Use a custom style map.
    pub fn with_styles(mut self, styles: StyleMap) -> Self {
        self.styles = styles;
        self
    }

    /// Look up cross-reference citations in `source`.
    pub fn with_crossrefs(mut self, source: &'a dyn CrossReferenceSource) -> Self {
        self.crossrefs = Some(source);
        self
    }

    /// Build paragraphs from a token stream.
    pub fn build(&self, tokens: &[Token]) -> Result<Vec<Paragraph>> {
        let mut state = BuildState {
            builder: self,
            paragraphs: Vec::new(),
            current: Paragraph::new(Alignment::Justified),
            frames: vec![Frame {
                kind: FrameKind::Root,
                font: self.fonts.get("body")?,
            }],
            footnote_count: 0,
            pending_crossrefs: Vec::new(),
            glue_next_space: false,
            keep_with_next: false,
        };

        for token in tokens {
            trace!("building from {}", token);
            state.token(token)?;
        }
        state.finish()
    }
}

struct BuildState<'b, 'a> {
    builder: &'b PieceBuilder<'a>,
    paragraphs: Vec<Paragraph>,
    current: Paragraph,
    frames: Vec<Frame>,
    footnote_count: usize,
    pending_crossrefs: Vec<CrossReferenceBlock>,
    /// A verse or chapter number was just set; bind it to the next word
    glue_next_space: bool,
    /// A heading just ended; keep the following text in the same paragraph
    keep_with_next: bool,
}

impl BuildState<'_, '_> {
    fn token(&mut self, token: &Token) -> Result<()> {
        match token.kind {
            TokenKind::Text => self.text(token.as_str()),
            TokenKind::Space => self.space(" "),
            TokenKind::NonBreakingSpace => self.space(&NBSP.to_string()),
            TokenKind::ThinSpace => self.space("\u{2009}"),
            TokenKind::ParagraphBreak => {
                if self.in_footnote() {
                    self.space(" ");
                } else if !self.keep_with_next {
                    self.end_paragraph();
                }
            }
            TokenKind::Tag => return self.tag(token),
            TokenKind::EndTag => self.end_tag(token.line),
        }
        Ok(())
    }

    fn font(&self) -> Arc<FontFace> {
        // The root frame is never popped.
        Arc::clone(&self.frames[self.frames.len() - 1].font)
    }

    fn in_footnote(&self) -> bool {
        self.frames
            .iter()
            .any(|f| matches!(f.kind, FrameKind::Footnote { .. }))
    }

    fn footnote_mut(&mut self) -> Option<&mut Paragraph> {
        self.frames.iter_mut().rev().find_map(|f| match &mut f.kind {
            FrameKind::Footnote { note, .. } => Some(note),
            _ => None,
        })
    }

    /// Text collector of the innermost frame, if it collects raw text.
    fn collector_mut(&mut self) -> Option<&mut String> {
        match &mut self.frames.last_mut()?.kind {
            FrameKind::CrossReference { citation } => Some(citation),
            FrameKind::VSpace { amount } => Some(amount),
            _ => None,
        }
    }

    fn target_line_is_empty(&self) -> bool {
        let para = self
            .frames
            .iter()
            .rev()
            .find_map(|f| match &f.kind {
                FrameKind::Footnote { note, .. } => Some(note),
                _ => None,
            })
            .unwrap_or(&self.current);
        para.current_line().map_or(true, Line::is_empty)
    }

    fn text(&mut self, text: &str) {
        if let Some(collector) = self.collector_mut() {
            collector.push_str(text);
            return;
        }
        let text = if text.contains(EM_DASH_MARKUP) {
            Cow::Owned(text.replace(EM_DASH_MARKUP, "\u{2014}"))
        } else {
            Cow::Borrowed(text)
        };
        for (i, segment) in text.split('\r').enumerate() {
            if i > 0 {
                self.forced_break();
            }
            if !segment.is_empty() {
                self.glue_next_space = false;
                self.emit(segment);
            }
        }
    }

    fn space(&mut self, text: &str) {
        if let Some(collector) = self.collector_mut() {
            collector.push(' ');
            return;
        }
        if self.target_line_is_empty() {
            return;
        }
        if self.glue_next_space && text == " " {
            self.glue_next_space = false;
            self.emit(&NBSP.to_string());
        } else {
            self.emit(text);
        }
    }

    fn emit(&mut self, text: &str) {
        let font = self.font();
        let builder = self.builder;
        let mut piece = Piece::measured(text, &font, builder.metrics);
        if !self.pending_crossrefs.is_empty() && !piece.is_blank() {
            piece = piece.with_crossrefs(self.pending_crossrefs.remove(0));
        }
        self.push_piece(piece);
    }

    fn push_piece(&mut self, piece: Piece) {
        let builder = self.builder;
        if let Some(note) = self.footnote_mut() {
            note.append_raw(piece);
        } else {
            self.keep_with_next = false;
            self.current
                .append_piece(piece, builder.metrics, builder.config);
        }
    }

    fn forced_break(&mut self) {
        if self.in_footnote() {
            self.space(" ");
            return;
        }
        let builder = self.builder;
        self.current.break_line(builder.metrics, builder.config);
    }

    fn allow_break(&mut self) {
        if !self.in_footnote() {
            self.current.allow_break();
        }
    }

    fn end_paragraph(&mut self) {
        if self.keep_with_next {
            return;
        }
        let builder = self.builder;
        self.current.flush(builder.metrics, builder.config);
        if self.current.is_empty() {
            return;
        }

        let mut next = Paragraph::new(self.current.alignment);
        next.poem_level = self.current.poem_level;
        let finished = std::mem::replace(&mut self.current, next);
        debug!(
            "paragraph {} finished with {} lines",
            self.paragraphs.len(),
            finished.line_count()
        );
        self.paragraphs.push(finished);
    }

    fn tag(&mut self, token: &Token) -> Result<()> {
        let name = token.as_str();
        let style = match self.builder.styles.get(name) {
            Some(style) => style.clone(),
            None => {
                warn!("line {}: unknown tag \\{}", token.line, name);
                TagStyle::Group
            }
        };

        if !token.braced {
            match style {
                TagStyle::Font(nickname) => {
                    let font = self.builder.fonts.get(&nickname)?;
                    if let Some(top) = self.frames.last_mut() {
                        top.font = font;
                    }
                }
                TagStyle::AllowBreak => self.allow_break(),
                TagStyle::Paragraph => self.end_paragraph(),
                TagStyle::Group | TagStyle::Ignore => {}
                other => warn!(
                    "line {}: \\{} ({:?}) needs a braced argument",
                    token.line, name, other
                ),
            }
            return Ok(());
        }

        let fonts = self.builder.fonts;
        let inherited = self.font();
        let frame = match style {
            TagStyle::Group | TagStyle::Ignore => Frame {
                kind: FrameKind::Group,
                font: inherited,
            },
            TagStyle::AllowBreak => {
                self.allow_break();
                Frame {
                    kind: FrameKind::Group,
                    font: inherited,
                }
            }
            TagStyle::Paragraph => {
                self.end_paragraph();
                Frame {
                    kind: FrameKind::Group,
                    font: inherited,
                }
            }
            TagStyle::Font(nickname) => Frame {
                kind: FrameKind::Group,
                font: fonts.get(&nickname)?,
            },
            TagStyle::VerseNumber => {
                let nickname = if self.in_footnote() {
                    "footnoteversenum"
                } else {
                    "versenum"
                };
                Frame {
                    kind: FrameKind::Number { verse: true },
                    font: fonts.get(nickname)?,
                }
            }
            TagStyle::Chapter => {
                self.end_paragraph();
                Frame {
                    kind: FrameKind::Number { verse: false },
                    font: fonts.get("chapternum")?,
                }
            }
            TagStyle::Footnote => {
                let label = footnote_label(self.footnote_count);
                self.footnote_count += 1;
                let mut note = Paragraph::footnotes();
                let mark = fonts.get("footnotemarkinfootnote")?;
                let note_font = fonts.get("footnote")?;
                note.append_raw(Piece::measured(label.as_str(), &mark, self.builder.metrics));
                note.append_raw(Piece::measured(" ", &note_font, self.builder.metrics));
                Frame {
                    kind: FrameKind::Footnote { note, label },
                    font: note_font,
                }
            }
            TagStyle::CrossReference => Frame {
                kind: FrameKind::CrossReference {
                    citation: String::new(),
                },
                font: inherited,
            },
            TagStyle::Heading => {
                self.end_paragraph();
                self.current.alignment = Alignment::Centered;
                Frame {
                    kind: FrameKind::Heading {
                        first_line: self.current.line_count(),
                    },
                    font: fonts.get("heading")?,
                }
            }
            TagStyle::Poem => {
                let builder = self.builder;
                self.current.break_line(builder.metrics, builder.config);
                self.current.poem_level += 1;
                self.current.alignment = Alignment::Left;
                Frame {
                    kind: FrameKind::Poem,
                    font: inherited,
                }
            }
            TagStyle::VSpace => Frame {
                kind: FrameKind::VSpace {
                    amount: String::new(),
                },
                font: inherited,
            },
        };
        self.frames.push(frame);
        Ok(())
    }

    fn end_tag(&mut self, line: u32) {
        if self.frames.len() <= 1 {
            warn!("line {}: unbalanced closing brace", line);
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };
        let builder = self.builder;

        match frame.kind {
            FrameKind::Root | FrameKind::Group => {}
            FrameKind::Number { .. } => self.glue_next_space = true,
            FrameKind::Footnote { note, label } => {
                let nickname = if self.in_footnote() {
                    "footnotemarkinfootnote"
                } else {
                    "footnotemark"
                };
                match builder.fonts.get(nickname) {
                    Ok(font) => {
                        let mark = Piece::measured(label, &font, builder.metrics).with_footnote(note);
                        self.push_piece(mark);
                    }
                    Err(e) => warn!("line {}: footnote dropped: {}", line, e),
                }
            }
            FrameKind::CrossReference { citation } => self.attach_crossref(citation.trim(), line),
            FrameKind::Heading { first_line } => {
                self.current.break_line(builder.metrics, builder.config);
                self.current.tie_lines_from(first_line);
                self.current.alignment = Alignment::Justified;
                self.keep_with_next = true;
            }
            FrameKind::Poem => {
                self.current.break_line(builder.metrics, builder.config);
                self.current.poem_level = self.current.poem_level.saturating_sub(1);
                if self.current.poem_level == 0 {
                    self.current.alignment = Alignment::Justified;
                }
            }
            FrameKind::VSpace { amount } => {
                let amount = amount.trim();
                match amount.trim_end_matches("pt").trim().parse::<f32>() {
                    Ok(height) if height > 0.0 => {
                        self.current
                            .push_vspace(height, builder.metrics, builder.config);
                    }
                    _ => warn!("line {}: bad vertical space {:?}", line, amount),
                }
            }
        }
    }

    fn attach_crossref(&mut self, citation: &str, line: u32) {
        let Some(source) = self.builder.crossrefs else {
            return;
        };
        let Some(block) = source.lookup(citation) else {
            debug!("line {}: no cross-references for {:?}", line, citation);
            return;
        };
        let target = if self.in_footnote() {
            None
        } else {
            self.current
                .last_piece_mut()
                .filter(|p| !p.is_blank() && p.crossrefs.is_none())
        };
        match target {
            Some(piece) => piece.crossrefs = Some(Box::new(block)),
            None => self.pending_crossrefs.push(block),
        }
    }

    fn finish(mut self) -> Result<Vec<Paragraph>> {
        if self.frames.len() > 1 {
            warn!("{} unclosed groups at end of input", self.frames.len() - 1);
        }
        if !self.pending_crossrefs.is_empty() {
            warn!(
                "{} cross-reference blocks had no text to attach to",
                self.pending_crossrefs.len()
            );
        }
        self.keep_with_next = false;
        self.end_paragraph();
        Ok(self.paragraphs)
    }
}

/// Footnote labels: a..z, then aa, ab, ...
fn footnote_label(index: usize) -> String {
    let mut n = index;
    let mut label = Vec::new();
    loop {
        label.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}
