//! Byte-level tokenizer for the book markup.
//!
//! The markup is a LaTeX dialect: `\name{...}` opens a tag, `{` alone opens an
//! anonymous tag, `}` closes the innermost one, `%` at the start of a token
//! comments out the rest of the line and blank lines separate paragraphs.

use log::{trace, warn};

use super::normalize::normalize_token;
use super::options::LexerOptions;
use super::token::{Token, TokenKind};
use crate::error::{Error, Result, SourceLocation};

/// Bare command that is recognised as soon as its name is complete.
const ALLOW_BREAK: &[u8] = b"allowbreak";

/// Three hyphens make an em dash.
const EM_DASH_RUN: &[u8] = b"---";

const CURLY_QUOTES: [&str; 4] = ["\u{2018}", "\u{2019}", "\u{201C}", "\u{201D}"];

const CLOSING_QUOTES: [&str; 2] = ["\u{2019}", "\u{201D}"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Escape,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Text,
    TagName,
}

/// Markup tokenizer.
///
/// Bytes accumulate into a pending buffer that is flushed as a TEXT token (or
/// a bare TAG token while a command name is being read) whenever a structural
/// character is seen.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    options: LexerOptions,
    state: State,
    pending: Vec<u8>,
    pending_kind: Pending,
    tokens: Vec<Token>,
    line: u32,
    line_start: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over a source buffer.
    pub fn new(src: &'a [u8], options: LexerOptions) -> Self {
        Self {
            src,
            pos: 0,
            options,
            state: State::Normal,
            pending: Vec::with_capacity(64),
            pending_kind: Pending::Text,
            tokens: Vec::new(),
            line: 1,
            line_start: 0,
        }
    }

    /// Run the lexer to completion.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        while let Some(&b) = self.src.get(self.pos) {
            match self.state {
                State::Comment => self.step_comment(b),
                State::Escape => self.step_escape(b)?,
                State::Normal => self.step_normal(b)?,
            }
        }

        if self.state == State::Escape {
            warn!("{}: dangling escape at end of input", self.location());
        }
        self.flush()?;

        Ok(self.tokens)
    }

    fn step_comment(&mut self, b: u8) {
        // The newline is left for the whitespace rule so blank lines after a
        // comment still separate paragraphs.
        if b == b'\n' || b == b'\r' {
            self.state = State::Normal;
        } else {
            self.pos += 1;
        }
    }

    fn step_normal(&mut self, b: u8) -> Result<()> {
        match b {
            b'\\' => {
                self.state = State::Escape;
                self.pos += 1;
            }
            b' ' | b'\t' | b'\r' | b'\n' => self.whitespace_run()?,
            b'{' => {
                self.open_tag()?;
                self.pos += 1;
            }
            b'}' => {
                self.flush()?;
                self.push(Token::end_tag(self.line))?;
                self.pos += 1;
            }
            b'%' if self.pending.is_empty() => {
                self.state = State::Comment;
                self.pos += 1;
            }
            b'~' => {
                self.flush()?;
                self.push(Token::new(TokenKind::NonBreakingSpace, self.line))?;
                self.pos += 1;
            }
            // Command names are letters only; anything else ends the name
            // and is then read again as text.
            _ if self.pending_kind == Pending::TagName && !is_tag_byte(b) => self.flush()?,
            b',' => self.comma()?,
            b'-' if self.src[self.pos..].starts_with(EM_DASH_RUN) => self.em_dash()?,
            _ => {
                self.append(b)?;
                self.pos += 1;
            }
        }
        Ok(())
    }

    fn step_escape(&mut self, b: u8) -> Result<()> {
        self.state = State::Normal;
        match b {
            b'@' | b'&' | b'%' | b'#' | b'$' | b'_' | b'{' | b'}' => {
                self.end_tag_name()?;
                self.append(b)?;
            }
            // Forced line break travels inside the text run.
            b'\\' => {
                self.end_tag_name()?;
                self.append(b'\r')?;
            }
            b',' => {
                self.flush()?;
                self.push(Token::new(TokenKind::ThinSpace, self.line))?;
            }
            _ if b.is_ascii_alphabetic() => {
                self.flush()?;
                self.pending_kind = Pending::TagName;
                self.append(b)?;
            }
            _ => {
                self.end_tag_name()?;
                self.append(b)?;
            }
        }
        self.pos += 1;
        Ok(())
    }

    fn whitespace_run(&mut self) -> Result<()> {
        if self.keeps_citation_together() {
            let run = self.src[self.pos..]
                .iter()
                .take_while(|&&c| c == b' ' || c == b'\t')
                .count();
            let continues = self
                .src
                .get(self.pos + run)
                .is_some_and(|c| !matches!(c, b'\r' | b'\n'));
            if run > 0 && continues {
                self.append(b' ')?;
                self.pos += run;
                return Ok(());
            }
        }

        self.flush()?;

        let mut newlines = 0;
        while let Some(&c) = self.src.get(self.pos) {
            match c {
                b' ' | b'\t' => {}
                b'\n' => {
                    newlines += 1;
                    self.new_line();
                }
                b'\r' => {
                    if self.src.get(self.pos + 1) != Some(&b'\n') {
                        newlines += 1;
                        self.new_line();
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }

        if newlines >= 2 {
            self.push_paragraph_break()
        } else {
            self.push_space()
        }
    }

    fn keeps_citation_together(&self) -> bool {
        self.options.reference_mode
            && self.pending_kind == Pending::Text
            && self.pending.last().is_some_and(u8::is_ascii_alphabetic)
    }

    fn open_tag(&mut self) -> Result<()> {
        let token = if self.pending_kind == Pending::TagName && !self.pending.is_empty() {
            let bytes = std::mem::take(&mut self.pending);
            let name = normalize_token(&bytes, false, self.location())?;
            Token::tag(name, true, self.line)
        } else {
            self.flush()?;
            Token::tag("", true, self.line)
        };
        self.pending_kind = Pending::Text;
        self.push(token)
    }

    fn comma(&mut self) -> Result<()> {
        if self.starts_cluster(self.pos + 1) || self.pending.ends_with(EM_DASH_RUN) {
            self.append(b',')?;
        } else {
            self.flush()?;
            self.push(Token::text(",", self.line))?;
        }
        self.pos += 1;
        Ok(())
    }

    /// A comma followed by a quote, comma, period or em dash stays with its
    /// neighbours.
    fn starts_cluster(&self, at: usize) -> bool {
        let rest = self.src.get(at..).unwrap_or_default();
        match rest.first() {
            Some(b'\'' | b'"' | b'`' | b',' | b'.') => true,
            Some(_) => {
                rest.starts_with(EM_DASH_RUN)
                    || CURLY_QUOTES.iter().any(|q| rest.starts_with(q.as_bytes()))
            }
            None => false,
        }
    }

    /// Closing punctuation and tag ends stay attached to a preceding dash.
    fn closes_dash(&self, at: usize) -> bool {
        let rest = self.src.get(at..).unwrap_or_default();
        match rest.first() {
            Some(b',' | b'.' | b';' | b':' | b'!' | b'?' | b')' | b'\'' | b'"' | b'}') => true,
            Some(_) => CLOSING_QUOTES.iter().any(|q| rest.starts_with(q.as_bytes())),
            None => false,
        }
    }

    /// The run is kept as `---` in the token; the glyph is chosen at layout.
    fn em_dash(&mut self) -> Result<()> {
        if !self.options.reference_mode {
            let after_space = self.pending.is_empty()
                && self.tokens.last().map_or(true, |t| t.kind.is_whitespace());
            if !after_space {
                self.flush()?;
                self.push(Token::new(TokenKind::NonBreakingSpace, self.line))?;
            }
        }
        self.flush()?;
        self.pos += EM_DASH_RUN.len();

        if self.closes_dash(self.pos) {
            for &b in EM_DASH_RUN {
                self.append(b)?;
            }
            return Ok(());
        }

        self.push(Token::text("---", self.line))?;
        let spaced = self
            .src
            .get(self.pos)
            .map_or(true, |c| matches!(c, b' ' | b'\t' | b'\r' | b'\n'));
        if !spaced {
            self.push_space()?;
        }
        Ok(())
    }

    fn append(&mut self, b: u8) -> Result<()> {
        if self.pending.len() >= self.options.max_token_len {
            return Err(Error::TokenTooLong {
                limit: self.options.max_token_len,
                location: self.location(),
            });
        }
        self.pending.push(b);

        if self.pending_kind == Pending::TagName && self.pending == ALLOW_BREAK {
            self.flush()?;
        }
        Ok(())
    }

    fn end_tag_name(&mut self) -> Result<()> {
        if self.pending_kind == Pending::TagName {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let kind = std::mem::replace(&mut self.pending_kind, Pending::Text);
        if self.pending.is_empty() {
            return Ok(());
        }

        let location = self.location();
        let bytes = std::mem::take(&mut self.pending);

        match kind {
            Pending::TagName => {
                let name = normalize_token(&bytes, false, location)?;
                self.push(Token::tag(name, false, self.line))
            }
            Pending::Text => {
                let mut text = normalize_token(&bytes, self.options.normalize_unicode, location)?;
                let trailing_space = self.options.reference_mode && text.ends_with(' ');
                if trailing_space {
                    let len = text.trim_end_matches(' ').len();
                    text.truncate(len);
                }
                if !text.is_empty() {
                    self.push(Token::text(text, self.line))?;
                }
                if trailing_space {
                    self.push_space()?;
                }
                Ok(())
            }
        }
    }

    fn push_space(&mut self) -> Result<()> {
        match self.tokens.last().map(|t| t.kind) {
            Some(TokenKind::Space | TokenKind::ParagraphBreak) => Ok(()),
            _ => self.push(Token::new(TokenKind::Space, self.line)),
        }
    }

    fn push_paragraph_break(&mut self) -> Result<()> {
        match self.tokens.last().map(|t| t.kind) {
            Some(TokenKind::ParagraphBreak) => return Ok(()),
            Some(TokenKind::Space) => {
                self.tokens.pop();
            }
            _ => {}
        }
        self.push(Token::new(TokenKind::ParagraphBreak, self.line))
    }

    fn push(&mut self, token: Token) -> Result<()> {
        if self.tokens.len() >= self.options.max_tokens {
            return Err(Error::TooManyTokens {
                limit: self.options.max_tokens,
                location: self.location(),
            });
        }
        trace!("token {}", token);
        self.tokens.push(token);
        Ok(())
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.line_start = self.pos + 1;
    }

    fn location(&self) -> SourceLocation {
        let column = self.pos.saturating_sub(self.line_start) + 1;
        SourceLocation::new(self.line, u32::try_from(column).unwrap_or(u32::MAX))
    }
}

fn is_tag_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'*'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::token::text_content;

    fn lex(src: &str) -> Vec<String> {
        lex_with(src, LexerOptions::default())
    }

    fn lex_with(src: &str, options: LexerOptions) -> Vec<String> {
        Lexer::new(src.as_bytes(), options)
            .tokenize()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_words_and_spaces() {
        assert_eq!(lex("In  the\tbeginning"), [
            "TEXT(\"In\")",
            "SPACE",
            "TEXT(\"the\")",
            "SPACE",
            "TEXT(\"beginning\")",
        ]);
    }

    #[test]
    fn test_comma_gets_own_token() {
        assert_eq!(lex("Hello, world"), [
            "TEXT(\"Hello\")",
            "TEXT(\",\")",
            "SPACE",
            "TEXT(\"world\")",
        ]);
        assert_eq!(lex("a,b"), ["TEXT(\"a\")", "TEXT(\",\")", "TEXT(\"b\")"]);
    }

    #[test]
    fn test_comma_clusters_stay_together() {
        assert_eq!(lex("said,' he"), ["TEXT(\"said,'\")", "SPACE", "TEXT(\"he\")"]);
        assert_eq!(lex("so,."), ["TEXT(\"so,.\")"]);
        assert_eq!(lex("so,,"), ["TEXT(\"so,\")", "TEXT(\",\")"]);
        assert_eq!(lex("said,\u{201D}"), ["TEXT(\"said,\u{201D}\")"]);
    }

    #[test]
    fn test_braced_tags() {
        assert_eq!(lex("Hello, \\textbf{world}!"), [
            "TEXT(\"Hello\")",
            "TEXT(\",\")",
            "SPACE",
            "TAG(textbf{)",
            "TEXT(\"world\")",
            "ENDTAG",
            "TEXT(\"!\")",
        ]);
        assert_eq!(lex("{x}"), ["TAG({)", "TEXT(\"x\")", "ENDTAG"]);
    }

    #[test]
    fn test_text_before_brace_is_flushed() {
        assert_eq!(lex("ab{c}"), ["TEXT(\"ab\")", "TAG({)", "TEXT(\"c\")", "ENDTAG"]);
    }

    #[test]
    fn test_bare_tags() {
        assert_eq!(lex("\\noindent Text"), ["TAG(noindent)", "SPACE", "TEXT(\"Text\")"]);
        assert_eq!(lex("\\foo\\bar{x}"), [
            "TAG(foo)",
            "TAG(bar{)",
            "TEXT(\"x\")",
            "ENDTAG",
        ]);
        // Names stop at the first non-letter, so `\ldots.` keeps its period
        // as text instead of reading `ldots.` as the tag name.
        assert_eq!(lex("\\ldots."), ["TAG(ldots)", "TEXT(\".\")"]);
        assert_eq!(lex("\\ldots,x"), ["TAG(ldots)", "TEXT(\",\")", "TEXT(\"x\")"]);
    }

    #[test]
    fn test_paragraph_breaks() {
        assert_eq!(lex("a\n\nb"), ["TEXT(\"a\")", "PARAGRAPH_BREAK", "TEXT(\"b\")"]);
        assert_eq!(lex("a \n \n\n b"), ["TEXT(\"a\")", "PARAGRAPH_BREAK", "TEXT(\"b\")"]);
        assert_eq!(lex("a\r\n\r\nb"), ["TEXT(\"a\")", "PARAGRAPH_BREAK", "TEXT(\"b\")"]);
        assert_eq!(lex("a\nb"), ["TEXT(\"a\")", "SPACE", "TEXT(\"b\")"]);
        assert_eq!(lex("a\r\nb"), ["TEXT(\"a\")", "SPACE", "TEXT(\"b\")"]);
    }

    #[test]
    fn test_comments() {
        assert_eq!(lex("a\n% note\nb"), ["TEXT(\"a\")", "SPACE", "TEXT(\"b\")"]);
        assert_eq!(lex("a\n% note\n\nb"), ["TEXT(\"a\")", "PARAGRAPH_BREAK", "TEXT(\"b\")"]);
        assert_eq!(lex("50% off"), ["TEXT(\"50%\")", "SPACE", "TEXT(\"off\")"]);
    }

    #[test]
    fn test_escaped_literals() {
        assert_eq!(lex("R\\&D \\@ 100\\%"), [
            "TEXT(\"R&D\")",
            "SPACE",
            "TEXT(\"@\")",
            "SPACE",
            "TEXT(\"100%\")",
        ]);
    }

    #[test]
    fn test_forced_line_break() {
        assert_eq!(lex("line\\\\next"), ["TEXT(\"line\\rnext\")"]);
    }

    #[test]
    fn test_thin_and_non_breaking_space() {
        assert_eq!(lex("a\\,b"), ["TEXT(\"a\")", "THIN_SPACE", "TEXT(\"b\")"]);
        assert_eq!(lex("Fig.~3"), ["TEXT(\"Fig.\")", "NON_BREAKING_SPACE", "TEXT(\"3\")"]);
    }

    #[test]
    fn test_em_dash_between_words() {
        assert_eq!(lex("word---word"), [
            "TEXT(\"word\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---\")",
            "SPACE",
            "TEXT(\"word\")",
        ]);
    }

    #[test]
    fn test_em_dash_already_spaced() {
        assert_eq!(lex("word --- word"), [
            "TEXT(\"word\")",
            "SPACE",
            "TEXT(\"---\")",
            "SPACE",
            "TEXT(\"word\")",
        ]);
    }

    #[test]
    fn test_em_dash_after_tag() {
        assert_eq!(lex("\\em{x}---y"), [
            "TAG(em{)",
            "TEXT(\"x\")",
            "ENDTAG",
            "NON_BREAKING_SPACE",
            "TEXT(\"---\")",
            "SPACE",
            "TEXT(\"y\")",
        ]);
    }

    #[test]
    fn test_em_dash_in_reference_mode() {
        let options = LexerOptions::new().references();
        assert_eq!(lex_with("a---b", options), [
            "TEXT(\"a\")",
            "TEXT(\"---\")",
            "SPACE",
            "TEXT(\"b\")",
        ]);
    }

    #[test]
    fn test_em_dash_before_comma() {
        assert_eq!(lex("word---, he"), [
            "TEXT(\"word\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---,\")",
            "SPACE",
            "TEXT(\"he\")",
        ]);
    }

    #[test]
    fn test_comma_before_em_dash() {
        assert_eq!(lex("said,---and"), [
            "TEXT(\"said,\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---\")",
            "SPACE",
            "TEXT(\"and\")",
        ]);
    }

    #[test]
    fn test_em_dash_before_closing_quote() {
        assert_eq!(lex("`I was---'"), [
            "TEXT(\"`I\")",
            "SPACE",
            "TEXT(\"was\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---'\")",
        ]);
        assert_eq!(lex("was---\u{201D} he"), [
            "TEXT(\"was\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---\u{201D}\")",
            "SPACE",
            "TEXT(\"he\")",
        ]);
    }

    #[test]
    fn test_em_dash_before_end_tag() {
        assert_eq!(lex("\\em{end---}"), [
            "TAG(em{)",
            "TEXT(\"end\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---\")",
            "ENDTAG",
        ]);
    }

    #[test]
    fn test_em_dash_before_period() {
        assert_eq!(lex("so---."), [
            "TEXT(\"so\")",
            "NON_BREAKING_SPACE",
            "TEXT(\"---.\")",
        ]);
    }

    #[test]
    fn test_em_dash_at_end_of_input() {
        assert_eq!(lex("so---"), ["TEXT(\"so\")", "NON_BREAKING_SPACE", "TEXT(\"---\")"]);
    }

    #[test]
    fn test_two_hyphens_are_text() {
        assert_eq!(lex("1--3"), ["TEXT(\"1--3\")"]);
    }

    #[test]
    fn test_reference_mode_keeps_citations() {
        let options = LexerOptions::new().references();
        assert_eq!(lex_with("Gen 1:3, Exod 2:4", options.clone()), [
            "TEXT(\"Gen 1:3\")",
            "TEXT(\",\")",
            "SPACE",
            "TEXT(\"Exod 2:4\")",
        ]);
        assert_eq!(lex("Gen 1:3"), ["TEXT(\"Gen\")", "SPACE", "TEXT(\"1:3\")"]);
        assert_eq!(lex_with("see Ps\n23", options), [
            "TEXT(\"see Ps\")",
            "SPACE",
            "TEXT(\"23\")",
        ]);
    }

    #[test]
    fn test_allowbreak() {
        assert_eq!(lex("some\\allowbreak thing"), [
            "TEXT(\"some\")",
            "TAG(allowbreak)",
            "SPACE",
            "TEXT(\"thing\")",
        ]);
        assert_eq!(lex("x\\allowbreaky"), ["TEXT(\"x\")", "TAG(allowbreak)", "TEXT(\"y\")"]);
    }

    #[test]
    fn test_unicode_normalization() {
        assert_eq!(lex("cafe\u{0301}"), ["TEXT(\"caf\u{e9}\")"]);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = Lexer::new(b"a\nb\n\nc", LexerOptions::default())
            .tokenize()
            .unwrap();
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, [1, 2, 2, 4, 4]);
    }

    #[test]
    fn test_too_many_tokens() {
        let options = LexerOptions::new().with_max_tokens(3);
        let err = Lexer::new(b"a b c d", options).tokenize().unwrap_err();
        assert!(matches!(err, Error::TooManyTokens { limit: 3, .. }));
    }

    #[test]
    fn test_token_too_long() {
        let options = LexerOptions::new().with_max_token_len(4);
        let err = Lexer::new(b"ok\nabcdefgh", options).tokenize().unwrap_err();
        assert!(matches!(err, Error::TokenTooLong { limit: 4, .. }));
        assert_eq!(err.location(), Some(SourceLocation::new(2, 5)));
    }

    #[test]
    fn test_text_content_preserved() {
        let sources = [
            "Hello, \\textbf{world}!",
            "In the beginning, God created the heavens and the earth.",
            "a,b,,c,'d' {e}f\n\ng",
            "\\v{12} \\fn{Or \\em{heavens}} text",
            "a---b",
            "word---, he said,---and `I was---' \\em{end---}.",
        ];
        for src in sources {
            let tokens = Lexer::new(src.as_bytes(), LexerOptions::default())
                .tokenize()
                .unwrap();
            let expected: String = strip_markup(src);
            assert_eq!(text_content(&tokens), expected, "source: {:?}", src);
        }
    }

    fn strip_markup(src: &str) -> String {
        let mut out = String::new();
        let mut chars = src.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    while chars.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
                        chars.next();
                    }
                }
                '{' | '}' => {}
                c if c.is_whitespace() => {}
                c => out.push(c),
            }
        }
        out
    }
}
