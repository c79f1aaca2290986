//! Lexer options and capacity limits.

/// Default upper bound on the number of tokens in one source.
pub const DEFAULT_MAX_TOKENS: usize = 1_000_000;

/// Default upper bound on the byte length of one token.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 1023;

/// Options for tokenizing markup sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerOptions {
    /// Maximum number of tokens before tokenizing fails
    pub max_tokens: usize,

    /// Maximum byte length of a single token before tokenizing fails
    pub max_token_len: usize,

    /// Keep "Book Chapter:Verse" citations together: a space that follows
    /// an alphabetic character does not end the current token
    pub reference_mode: bool,

    /// Apply NFC normalization to every text token
    pub normalize_unicode: bool,
}

impl LexerOptions {
    /// Create new lexer options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the token count limit.
    pub fn with_max_tokens(mut self, limit: usize) -> Self {
        self.max_tokens = limit;
        self
    }

    /// Set the token byte length limit.
    pub fn with_max_token_len(mut self, limit: usize) -> Self {
        self.max_token_len = limit;
        self
    }

    /// Enable citation-style tokenizing.
    pub fn references(mut self) -> Self {
        self.reference_mode = true;
        self
    }

    /// Enable or disable Unicode normalization.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            reference_mode: false,
            normalize_unicode: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexer_options_builder() {
        let options = LexerOptions::new()
            .with_max_tokens(64)
            .with_max_token_len(16)
            .references()
            .with_normalization(false);

        assert_eq!(options.max_tokens, 64);
        assert_eq!(options.max_token_len, 16);
        assert!(options.reference_mode);
        assert!(!options.normalize_unicode);
    }

    #[test]
    fn test_default_options() {
        let options = LexerOptions::default();
        assert_eq!(options.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(options.max_token_len, DEFAULT_MAX_TOKEN_LEN);
        assert!(!options.reference_mode);
        assert!(options.normalize_unicode);
    }
}
