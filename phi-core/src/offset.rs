//! Byte ↔ character offset conversion.
//!
//! Every span in this crate is a UTF-8 byte range, which is what `regex` and
//! `str` slicing speak. Consumers that count Unicode scalar values (most
//! JavaScript/Python callers) convert with [`char_range`].
//!
//! ```text
//! "Zoë 12345"
//!  bytes: Z=0 o=1 ë=2..4 ' '=4 1=5 … 5=9   → ZIP at 5..10
//!  chars: Z=0 o=1 ë=2    ' '=3 1=4 … 5=8   → ZIP at 4..9
//! ```

use std::ops::Range;

/// Converts a byte offset into a char offset.
///
/// `byte` must lie on a char boundary (offsets produced by this crate always
/// do); a mid-char offset counts the partial char as preceding it.
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    let byte = byte.min(text.len());
    text.char_indices().take_while(|(i, _)| *i < byte).count()
}

/// Converts a byte range into a char range.
pub fn char_range(text: &str, range: Range<usize>) -> Range<usize> {
    let start = byte_to_char(text, range.start);
    let len = text
        .get(range.start.min(text.len())..range.end.min(text.len()))
        .map(|s| s.chars().count())
        .unwrap_or(0);
    start..start + len
}

/// `true` when `range` is non-empty, in bounds and both ends are char boundaries.
pub fn is_valid_span(text: &str, range: &Range<usize>) -> bool {
    range.start < range.end
        && range.end <= text.len()
        && text.is_char_boundary(range.start)
        && text.is_char_boundary(range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_offsets_are_identical() {
        let text = "SSN 123-45-6789";
        assert_eq!(char_range(text, 4..15), 4..15);
    }

    #[test]
    fn test_multibyte_prefix_shifts_char_offsets() {
        let text = "Zoë 12345";
        let start = text.find("12345").unwrap();
        assert_eq!(start, 5);
        assert_eq!(char_range(text, start..start + 5), 4..9);
    }

    #[test]
    fn test_span_validity() {
        let text = "ë1";
        assert!(is_valid_span(text, &(0..2)));
        assert!(!is_valid_span(text, &(1..3)));
        assert!(!is_valid_span(text, &(2..2)));
        assert!(!is_valid_span(text, &(0..4)));
    }
}
