//! Text utilities shared across stages.

/// Returns a preview of at most `max_chars` characters, appending "..." when
/// the input was cut.
///
/// Counts characters rather than bytes so multi-byte text (the scripts are
/// Chinese) is never split mid-character.
pub fn preview_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_unchanged() {
        assert_eq!(preview_snippet("hello", 10), "hello");
        assert_eq!(preview_snippet("", 5), "");
        assert_eq!(preview_snippet("exact", 5), "exact");
    }

    #[test]
    fn long_text_truncated() {
        assert_eq!(preview_snippet("hello world", 5), "hello...");
    }

    #[test]
    fn multibyte_boundaries() {
        assert_eq!(preview_snippet("早上好，今天是星期五", 3), "早上好...");
        assert_eq!(preview_snippet("早上好", 3), "早上好");
    }
}
