//! Code point helpers for hanging punctuation.

/// Decode the code point starting at byte offset `pos`.
///
/// Returns the character and its encoded length, or `None` at the end of
/// the text or when `pos` is not on a character boundary.
pub fn decode_at(text: &str, pos: usize) -> Option<(char, usize)> {
    let c = text.get(pos..)?.chars().next()?;
    Some((c, c.len_utf8()))
}

/// Decode the code point ending at byte offset `end`.
///
/// Returns the character and the byte offset where it starts.
pub fn decode_before(text: &str, end: usize) -> Option<(char, usize)> {
    let c = text.get(..end)?.chars().next_back()?;
    Some((c, end - c.len_utf8()))
}

/// Check if a code point may hang into the margin.
pub fn is_hangable(c: char) -> bool {
    matches!(
        c,
        '.' | ','
            | ';'
            | ':'
            | '!'
            | '?'
            | '\''
            | '"'
            | '-'
            | '\u{2013}' // en dash
            | '\u{2014}' // em dash
            | '\u{2018}'..='\u{201F}' // curly quotes
            | '\u{00AB}' // «
            | '\u{00BB}' // »
            | '\u{2039}' // ‹
            | '\u{203A}' // ›
    )
}

/// Byte length of the hangable run at the start of `text`.
pub fn hangable_prefix_len(text: &str) -> usize {
    let mut pos = 0;
    while let Some((c, len)) = decode_at(text, pos) {
        if !is_hangable(c) {
            break;
        }
        pos += len;
    }
    pos
}

/// Byte offset where the hangable run at the end of `text` starts.
pub fn hangable_suffix_start(text: &str) -> usize {
    let mut end = text.len();
    while let Some((c, start)) = decode_before(text, end) {
        if !is_hangable(c) {
            break;
        }
        end = start;
    }
    end
}

/// Byte offset where trailing low punctuation (`. , -` and space) starts.
///
/// A footnote mark following such text is drawn above the punctuation.
pub fn low_punctuation_start(text: &str) -> usize {
    text.trim_end_matches(['.', ',', '-', ' ']).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_at() {
        let text = "a\u{201C}b";
        assert_eq!(decode_at(text, 0), Some(('a', 1)));
        assert_eq!(decode_at(text, 1), Some(('\u{201C}', 3)));
        assert_eq!(decode_at(text, 4), Some(('b', 1)));
        assert_eq!(decode_at(text, 5), None);
        // Inside a multi-byte sequence
        assert_eq!(decode_at(text, 2), None);
    }

    #[test]
    fn test_decode_before() {
        let text = "a\u{201D}";
        assert_eq!(decode_before(text, 4), Some(('\u{201D}', 1)));
        assert_eq!(decode_before(text, 1), Some(('a', 0)));
        assert_eq!(decode_before(text, 0), None);
    }

    #[test]
    fn test_hangable_runs() {
        assert_eq!(hangable_prefix_len("\u{201C}Hello"), 3);
        assert_eq!(hangable_prefix_len("Hello"), 0);
        assert_eq!(hangable_prefix_len(","), 1);

        let text = "said.\u{201D}";
        assert_eq!(&text[hangable_suffix_start(text)..], ".\u{201D}");
        assert_eq!(hangable_suffix_start("word"), 4);
        assert_eq!(hangable_suffix_start(".,"), 0);
    }

    #[test]
    fn test_low_punctuation() {
        let text = "earth.";
        assert_eq!(&text[low_punctuation_start(text)..], ".");
        assert_eq!(low_punctuation_start("light"), 5);
        // Question marks are not low punctuation
        assert_eq!(low_punctuation_start("why?"), 4);
    }

    #[test]
    fn test_letters_do_not_hang() {
        assert!(!is_hangable('a'));
        assert!(!is_hangable('1'));
        assert!(!is_hangable(' '));
        assert!(is_hangable('\u{2019}'));
    }
}
