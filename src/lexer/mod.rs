//! Markup lexer.
//!
//! Turns the LaTeX-flavoured book source into a flat stream of [`Token`]s.
//! Tag nesting is not tracked here; the piece builder pairs TAG and ENDTAG.

mod normalize;
mod options;
mod token;
mod tokenizer;

use std::path::Path;

use log::debug;

pub use normalize::normalize_token;
pub use options::{LexerOptions, DEFAULT_MAX_TOKENS, DEFAULT_MAX_TOKEN_LEN};
pub use token::{text_content, Token, TokenKind};
pub use tokenizer::Lexer;

use crate::error::Result;

/// Tokenize a markup buffer.
pub fn tokenize(src: &[u8], options: &LexerOptions) -> Result<Vec<Token>> {
    let tokens = Lexer::new(src, options.clone()).tokenize()?;
    debug!("tokenized {} bytes into {} tokens", src.len(), tokens.len());
    Ok(tokens)
}

/// Tokenize a markup string.
pub fn tokenize_str(src: &str, options: &LexerOptions) -> Result<Vec<Token>> {
    tokenize(src.as_bytes(), options)
}

/// Read and tokenize a markup file.
pub fn tokenize_file<P: AsRef<Path>>(path: P, options: &LexerOptions) -> Result<Vec<Token>> {
    let data = std::fs::read(path.as_ref())?;
    tokenize(&data, options)
}
