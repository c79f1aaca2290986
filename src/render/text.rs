//! Plain text rendering of recorded pages.

use crate::model::NBSP;

use super::RecordedPage;

/// Page separator in text output.
const PAGE_BREAK: char = '\u{000C}';

/// Convert recorded pages to plain text, one drawn line per text line and
/// pages separated by a form feed.
pub fn to_text(pages: &[RecordedPage]) -> String {
    let mut output = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            output.push(PAGE_BREAK);
            output.push('\n');
        }
        for line in page.lines() {
            let line = line.replace(NBSP, " ");
            output.push_str(line.trim_end());
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontFace;
    use crate::render::{RecordingRenderer, Renderer};

    #[test]
    fn test_to_text() {
        let face = FontFace::new("body", 10.0);
        let mut r = RecordingRenderer::new();
        r.begin_page(1, 432.0, 648.0);
        r.begin_text();
        r.set_font(&face, 10.0);
        r.draw_text(36.0, 600.0, "3");
        r.draw_text(41.0, 600.0, "\u{a0}And ");
        r.end_text();
        r.begin_page(2, 432.0, 648.0);
        r.begin_text();
        r.draw_text(36.0, 600.0, "God");
        r.end_text();

        let text = to_text(r.pages());
        assert_eq!(text, "3 And\n\u{c}\nGod\n");
    }

    #[test]
    fn test_to_text_empty() {
        assert_eq!(to_text(&[]), "");
    }
}
