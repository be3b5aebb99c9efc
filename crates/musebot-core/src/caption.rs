// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caption truncation for the publish surface.
//!
//! Telegram caps media-group captions at 1024 characters. The limit counts
//! characters, not bytes, so truncation must land on a char boundary.

/// Truncate `text` to at most `max_chars` characters.
///
/// Returns the original slice when it already fits.
pub fn truncate_caption(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Whether `text` exceeds `max_chars` characters (i.e. truncation would cut).
pub fn exceeds_caption_limit(text: &str, max_chars: usize) -> bool {
    text.chars().count() > max_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_caption("hello", 1024), "hello");
        assert!(!exceeds_caption_limit("hello", 1024));
    }

    #[test]
    fn long_text_is_cut_to_exactly_the_limit() {
        let text = "a".repeat(2000);
        let cut = truncate_caption(&text, 1024);
        assert_eq!(cut.chars().count(), 1024);
        assert!(exceeds_caption_limit(&text, 1024));
    }

    #[test]
    fn truncation_is_char_safe_on_multibyte_text() {
        // Cyrillic chars are two bytes each; a byte slice at 1024 would panic
        // or split a char. Truncation must count chars instead.
        let text = "ж".repeat(1500);
        let cut = truncate_caption(&text, 1024);
        assert_eq!(cut.chars().count(), 1024);
        assert!(cut.is_char_boundary(cut.len()));
    }

    #[test]
    fn exact_limit_is_not_truncated() {
        let text = "b".repeat(1024);
        assert_eq!(truncate_caption(&text, 1024), text.as_str());
        assert!(!exceeds_caption_limit(&text, 1024));
    }
}
