//! Markup cleanup and paragraph splitting.
//!
//! Generated scripts occasionally carry markdown markers that a synthesis
//! backend would read aloud literally. Cleanup is a pure text transform;
//! paragraph structure (blank-line separated) is preserved for chunking.

use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#+\s*").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n+").unwrap());

/// Strip emphasis, heading and inline-code markers, keeping their content.
pub fn clean_markup(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    text.trim().to_string()
}

/// Split on blank-line paragraph boundaries, dropping empty paragraphs and
/// preserving order.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
