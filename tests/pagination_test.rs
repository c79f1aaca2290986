//! Integration tests for page breaking.

use std::sync::Arc;

use versepage::model::FontFace;
use versepage::render::NullRenderer;
use versepage::{
    FontBook, LayoutConfig, LexerOptions, PieceBuilder, Renderer, Typesetter, UniformMetrics,
    Versepage,
};

/// Renderer that only counts what it is asked to do.
#[derive(Default)]
struct CountingRenderer {
    pages_begun: u32,
    pages_ended: u32,
    text_scopes: usize,
    open_scope: bool,
}

impl Renderer for CountingRenderer {
    fn begin_page(&mut self, _number: u32, _width: f32, _height: f32) {
        self.pages_begun += 1;
    }

    fn end_page(&mut self, _number: u32) {
        self.pages_ended += 1;
    }

    fn begin_text(&mut self) {
        assert!(!self.open_scope, "text scopes must not nest");
        self.open_scope = true;
        self.text_scopes += 1;
    }

    fn end_text(&mut self) {
        assert!(self.open_scope);
        self.open_scope = false;
    }

    fn set_font(&mut self, _font: &FontFace, _size: f32) {}

    fn draw_text(&mut self, _x: f32, _y: f32, _text: &str) {}

    fn fill_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32) {}
}

fn paragraphs(count: usize, text: impl Fn(usize) -> String) -> String {
    (1..=count).map(text).collect::<Vec<_>>().join("\n\n")
}

#[test]
fn test_verses_flow_across_pages() {
    let src = paragraphs(120, |v| format!("\\v{{{}}} word", v));
    let output = Versepage::new().typeset_str(&src).unwrap();

    // 48 lines of 12pt fill the 576pt body
    let counts: Vec<usize> = output.pages.iter().map(|p| p.line_count).collect();
    assert_eq!(counts, vec![48, 48, 24]);
    let verses: Vec<Option<u32>> = output.pages.iter().map(|p| p.last_verse).collect();
    assert_eq!(verses, vec![Some(48), Some(96), Some(120)]);
    assert_eq!(output.stats.page_count, 3);
    assert_eq!(output.drawing.len(), 3);
}

#[test]
fn test_exact_fit_has_no_penalty() {
    let output = Versepage::new()
        .typeset_str(&paragraphs(48, |i| format!("line{}", i)))
        .unwrap();
    assert_eq!(output.page_count(), 1);
    assert_eq!(output.stats.total_penalty, 0.0);
}

#[test]
fn test_one_line_over_is_penalised() {
    let config = LayoutConfig::default();
    let output = Versepage::new()
        .typeset_str(&paragraphs(49, |i| format!("line{}", i)))
        .unwrap();
    assert_eq!(output.page_count(), 2);

    let expected = 12.0 * config.overfull_page_penalty_per_pt + config.break_penalty();
    assert!((output.pages[0].penalty - expected).abs() < 1.0);
    assert_eq!(output.pages[1].penalty, 0.0);
    assert!((output.stats.total_penalty - expected).abs() < 1.0);
}

#[test]
fn test_heading_never_ends_a_page() {
    let mut src = paragraphs(47, |i| format!("line{}", i));
    src.push_str("\n\n\\heading{Psalm 1}\n\nBlessed is the man");
    let output = Versepage::new().typeset_str(&src).unwrap();

    assert_eq!(output.page_count(), 2);
    assert_eq!(output.pages[0].line_count, 47);
    assert_eq!(output.pages[1].line_count, 2);
    assert_eq!(
        output.drawing[1].lines(),
        vec!["Psalm 1".to_string(), "Blessed is the man".to_string()]
    );
}

#[test]
fn test_footnotes_take_body_space() {
    let mut src = String::from("First\\fn{A note.}\n\n");
    src.push_str(&paragraphs(47, |i| format!("line{}", i)));
    let output = Versepage::new().typeset_str(&src).unwrap();

    // 9.6pt of footnote and a 6pt gap leave room for 46 lines
    assert_eq!(output.pages[0].line_count, 46);
    assert!((output.pages[0].footnote_height - 9.6).abs() < 1e-3);
    assert_eq!(output.pages[1].line_count, 2);
    assert_eq!(output.pages[1].footnote_height, 0.0);

    let lines = output.drawing[0].lines();
    assert_eq!(lines.last().map(String::as_str), Some("a A note."));
}

#[test]
fn test_chapter_carries_over() {
    let mut src = String::from("\\chapter{3}In the beginning\n\n");
    src.push_str(&paragraphs(60, |i| format!("line{}", i)));
    let output = Versepage::new().typeset_str(&src).unwrap();

    assert_eq!(output.page_count(), 2);
    assert_eq!(output.pages[0].last_chapter, Some(3));
    assert_eq!(output.pages[1].last_chapter, Some(3));
}

#[test]
fn test_custom_renderer_sees_every_page() {
    let config = LayoutConfig::default();
    let metrics = UniformMetrics::default();
    let fonts = FontBook::with_defaults(config.body_font_size);
    let src = paragraphs(100, |i| format!("verse {}", i));
    let tokens = versepage::lexer::tokenize_str(&src, &LexerOptions::default()).unwrap();

    let mut paras = PieceBuilder::new(&fonts, &metrics, &config)
        .build(&tokens)
        .unwrap();
    let mut renderer = CountingRenderer::default();
    let pages = Typesetter::new(&config, &metrics).run(&mut paras, &mut renderer);

    assert_eq!(pages.len(), 3);
    assert_eq!(renderer.pages_begun, 3);
    assert_eq!(renderer.pages_ended, 3);
    assert_eq!(renderer.text_scopes, 100);
    assert!(!renderer.open_scope);
}

#[test]
fn test_tall_line_on_empty_page_is_still_emitted() {
    let config = LayoutConfig::default().with_page_size(432.0, 80.0);
    let metrics = UniformMetrics::default();
    let fonts = FontBook::with_defaults(config.body_font_size);
    let crossref = fonts.get("crossref").unwrap();
    let tokens = versepage::lexer::tokenize_str("one\n\ntwo", &LexerOptions::default()).unwrap();
    let mut paras = PieceBuilder::new(&fonts, &metrics, &config)
        .build(&tokens)
        .unwrap();

    // 8pt of body height cannot hold a 12pt line
    let pages = Typesetter::new(&config, &metrics)
        .with_crossref_font(Arc::clone(&crossref))
        .run(&mut paras, &mut NullRenderer);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| p.line_count == 1));
    assert!(pages.iter().all(|p| p.penalty > 0.0));
}
