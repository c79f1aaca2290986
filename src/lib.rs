//! # versepage
//!
//! Line breaking, hanging punctuation and page breaking for
//! verse-structured books.
//!
//! The library reads a LaTeX-flavoured markup source, splits it into tokens,
//! builds paragraphs of measured pieces, and lays them out onto pages with
//! footnotes at the page foot and cross-references in a side column.
//!
//! ## Quick Start
//!
//! ```
//! use versepage::Versepage;
//!
//! let output = Versepage::new()
//!     .typeset_str("\\v{1} In the beginning God created the heaven and the earth.")?;
//! assert_eq!(output.page_count(), 1);
//! println!("{}", output.to_text());
//! # Ok::<(), versepage::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Lexer**: escapes, comments, punctuation splitting, Unicode normalization
//! - **Hanging punctuation**: verse numbers and punctuation hang into the margins
//! - **Justification** with safe break checkpoints
//! - **Pagination**: tied headings, footnotes and cross-references measured
//!   against the page with an overflow penalty
//! - **Pluggable metrics and renderers**

pub mod error;
pub mod layout;
pub mod lexer;
pub mod model;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result, SourceLocation};
pub use layout::{
    FontMetrics, LayoutConfig, PageSummary, Paginator, PieceBuilder, StyleMap, TagStyle,
    Typesetter, UniformMetrics,
};
pub use lexer::{Lexer, LexerOptions, Token, TokenKind};
pub use model::{
    Alignment, CrossReferenceBlock, CrossReferenceSource, CrossReferenceTable, FontBook, FontFace,
    FontRole, Line, Paragraph, Piece,
};
pub use render::{
    JsonFormat, RecordedPage, RecordingRenderer, Renderer, TypesetOutput, TypesetStats,
};

use std::path::Path;

use log::debug;

/// Tokenize a markup string with default options.
///
/// # Example
///
/// ```
/// use versepage::{tokenize, TokenKind};
///
/// let tokens = tokenize("Hello, {\\b world}!").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Text);
/// ```
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    lexer::tokenize_str(src, &LexerOptions::default())
}

/// Typeset a markup string with the default configuration.
pub fn typeset(src: &str) -> Result<TypesetOutput> {
    Versepage::new().typeset_str(src)
}

/// Read and typeset a markup file with the default configuration.
///
/// # Example
///
/// ```no_run
/// use versepage::typeset_file;
///
/// let output = typeset_file("genesis.tex").unwrap();
/// println!("{} pages", output.page_count());
/// ```
pub fn typeset_file<P: AsRef<Path>>(path: P) -> Result<TypesetOutput> {
    Versepage::new().typeset_file(path)
}

/// Builder for tokenizing and typesetting.
///
/// # Example
///
/// ```
/// use versepage::{CrossReferenceTable, LayoutConfig, Versepage};
///
/// let mut xrefs = CrossReferenceTable::new(8.4);
/// xrefs.insert("Gen 1:1", vec!["John 1:1".to_string()]);
///
/// let output = Versepage::new()
///     .with_config(LayoutConfig::default().with_line_spacing(1.1))
///     .with_crossrefs(xrefs)
///     .typeset_str("In the beginning\\xref{Gen 1:1} God")?;
/// assert_eq!(output.stats.crossref_count, 1);
/// # Ok::<(), versepage::Error>(())
/// ```
pub struct Versepage {
    config: LayoutConfig,
    lexer_options: LexerOptions,
    fonts: Option<FontBook>,
    metrics: Box<dyn FontMetrics>,
    crossrefs: Option<Box<dyn CrossReferenceSource>>,
    styles: StyleMap,
}

impl Versepage {
    /// Create a builder with default configuration, the default font book
    /// and uniform metrics.
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
            lexer_options: LexerOptions::default(),
            fonts: None,
            metrics: Box::new(UniformMetrics::default()),
            crossrefs: None,
            styles: StyleMap::default(),
        }
    }

    /// Set the layout configuration.
    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the lexer options.
    pub fn with_lexer_options(mut self, options: LexerOptions) -> Self {
        self.lexer_options = options;
        self
    }

    /// Lex in reference mode (citation-style spacing).
    pub fn references(mut self) -> Self {
        self.lexer_options = self.lexer_options.references();
        self
    }

    /// Use a custom font book instead of the defaults for the body size.
    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = Some(fonts);
        self
    }

    /// Measure text with `metrics`.
    pub fn with_metrics(mut self, metrics: impl FontMetrics + 'static) -> Self {
        self.metrics = Box::new(metrics);
        self
    }

    /// Look up cross-reference citations in `source`.
    pub fn with_crossrefs(mut self, source: impl CrossReferenceSource + 'static) -> Self {
        self.crossrefs = Some(Box::new(source));
        self
    }

    /// Use a custom tag style map.
    pub fn with_styles(mut self, styles: StyleMap) -> Self {
        self.styles = styles;
        self
    }

    /// Draw vertical-space debug bars beside every line.
    pub fn debug_vspace(mut self) -> Self {
        self.config = self.config.with_debug_vspace(true);
        self
    }

    /// The layout configuration in use.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Tokenize a markup string.
    pub fn tokenize(&self, src: &str) -> Result<Vec<Token>> {
        lexer::tokenize_str(src, &self.lexer_options)
    }

    /// Typeset a markup string.
    pub fn typeset_str(&self, src: &str) -> Result<TypesetOutput> {
        self.typeset_bytes(src.as_bytes())
    }

    /// Typeset a markup buffer.
    pub fn typeset_bytes(&self, src: &[u8]) -> Result<TypesetOutput> {
        let tokens = lexer::tokenize(src, &self.lexer_options)?;
        self.typeset_tokens(&tokens)
    }

    /// Read and typeset a markup file.
    pub fn typeset_file<P: AsRef<Path>>(&self, path: P) -> Result<TypesetOutput> {
        let tokens = lexer::tokenize_file(path, &self.lexer_options)?;
        self.typeset_tokens(&tokens)
    }

    /// Build paragraphs from tokens and lay them out onto pages.
    pub fn typeset_tokens(&self, tokens: &[Token]) -> Result<TypesetOutput> {
        self.config.validate()?;

        let defaults;
        let fonts = match &self.fonts {
            Some(fonts) => fonts,
            None => {
                defaults = FontBook::with_defaults(self.config.body_font_size);
                &defaults
            }
        };
        let metrics = self.metrics.as_ref();

        let mut builder =
            PieceBuilder::new(fonts, metrics, &self.config).with_styles(self.styles.clone());
        if let Some(source) = &self.crossrefs {
            builder = builder.with_crossrefs(source.as_ref());
        }
        let mut paragraphs = builder.build(tokens)?;
        debug!("built {} paragraphs", paragraphs.len());

        let mut stats = TypesetStats::new();
        stats.token_count = tokens.len();
        stats.count_paragraphs(&paragraphs);

        let mut typesetter = Typesetter::new(&self.config, metrics);
        if let Ok(font) = fonts.get("crossref") {
            typesetter = typesetter.with_crossref_font(font);
        }
        let mut renderer = RecordingRenderer::new();
        let pages = typesetter.run(&mut paragraphs, &mut renderer);
        stats.count_pages(&pages);

        Ok(TypesetOutput {
            pages,
            drawing: renderer.into_pages(),
            stats,
        })
    }
}

impl Default for Versepage {
    fn default() -> Self {
        Self::new()
    }
}
