//! Token types produced by the lexer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// A run of literal text
    Text,
    /// Start of a tag; the text is the tag name (possibly empty)
    Tag,
    /// End of the innermost braced tag
    EndTag,
    /// Inter-word space
    Space,
    /// Two or more consecutive newlines
    ParagraphBreak,
    /// A thin space (`\,`)
    ThinSpace,
    /// A non-breaking space (`~`, or forced before an em dash)
    NonBreakingSpace,
}

impl TokenKind {
    /// Check if this kind stands for horizontal or vertical white space.
    pub fn is_whitespace(self) -> bool {
        matches!(
            self,
            TokenKind::Space
                | TokenKind::ParagraphBreak
                | TokenKind::ThinSpace
                | TokenKind::NonBreakingSpace
        )
    }
}

/// A single lexer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token kind
    pub kind: TokenKind,

    /// Text for TEXT tokens, tag name for TAG tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// For TAG tokens: whether a `{` opened a group
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub braced: bool,

    /// Source line the token ended on
    pub line: u32,
}

impl Token {
    /// Create a token without text.
    pub fn new(kind: TokenKind, line: u32) -> Self {
        Self {
            kind,
            text: None,
            braced: false,
            line,
        }
    }

    /// Create a TEXT token.
    pub fn text(text: impl Into<String>, line: u32) -> Self {
        Self {
            kind: TokenKind::Text,
            text: Some(text.into()),
            braced: false,
            line,
        }
    }

    /// Create a TAG token.
    pub fn tag(name: impl Into<String>, braced: bool, line: u32) -> Self {
        Self {
            kind: TokenKind::Tag,
            text: Some(name.into()),
            braced,
            line,
        }
    }

    /// Create an ENDTAG token.
    pub fn end_tag(line: u32) -> Self {
        Self::new(TokenKind::EndTag, line)
    }

    /// Token text, or the empty string.
    pub fn as_str(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Check if this is a TEXT token.
    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }

    /// Check if this is a TAG token with the given name.
    pub fn is_tag(&self, name: &str) -> bool {
        self.kind == TokenKind::Tag && self.as_str() == name
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Text => write!(f, "TEXT({:?})", self.as_str()),
            TokenKind::Tag if self.braced => write!(f, "TAG({}{{)", self.as_str()),
            TokenKind::Tag => write!(f, "TAG({})", self.as_str()),
            TokenKind::EndTag => f.write_str("ENDTAG"),
            TokenKind::Space => f.write_str("SPACE"),
            TokenKind::ParagraphBreak => f.write_str("PARAGRAPH_BREAK"),
            TokenKind::ThinSpace => f.write_str("THIN_SPACE"),
            TokenKind::NonBreakingSpace => f.write_str("NON_BREAKING_SPACE"),
        }
    }
}

/// Concatenate the contents of all TEXT tokens.
pub fn text_content(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.is_text())
        .map(Token::as_str)
        .collect()
}
