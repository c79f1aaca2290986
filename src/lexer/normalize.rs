//! Unicode normalization of token text.

use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

use crate::error::{Error, Result, SourceLocation};

/// Decode accumulated token bytes and normalize them to NFC.
///
/// Multi-byte sequences are only complete at a flush point, so normalization
/// runs on the whole token rather than byte by byte.
pub fn normalize_token(bytes: &[u8], normalize: bool, location: SourceLocation) -> Result<String> {
    let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidUtf8 { location })?;

    if !normalize || is_nfc_quick(text.chars()) == IsNormalized::Yes {
        return Ok(text.to_string());
    }

    Ok(text.nfc().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composes_decomposed_text() {
        // "e" + combining acute accent
        let text = normalize_token("cafe\u{0301}".as_bytes(), true, SourceLocation::default())
            .unwrap();
        assert_eq!(text, "caf\u{00e9}");
    }

    #[test]
    fn test_normalization_disabled() {
        let text = normalize_token("cafe\u{0301}".as_bytes(), false, SourceLocation::default())
            .unwrap();
        assert_eq!(text, "cafe\u{0301}");
    }

    #[test]
    fn test_invalid_utf8() {
        let err = normalize_token(&[0x66, 0xff], true, SourceLocation::new(2, 5)).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { .. }));
        assert_eq!(err.location(), Some(SourceLocation::new(2, 5)));
    }

    #[test]
    fn test_forced_line_break_survives() {
        let text = normalize_token(b"end\r", true, SourceLocation::default()).unwrap();
        assert_eq!(text, "end\r");
    }
}
