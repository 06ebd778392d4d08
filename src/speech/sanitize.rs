//! Markdown-to-prose sanitization for speech synthesis.
//!
//! Assistant replies are markdown; spoken aloud they must read as natural
//! prose. Emphasis, heading and code markers are stripped, link syntax is
//! reduced to its label, list markers are removed, and newlines become
//! sentence-ending punctuation.

use regex::Regex;

/// Compiled sanitization rules.
pub struct Sanitizer {
    markers: Regex,
    links: Regex,
    list_items: Regex,
    newlines: Regex,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self {
            markers: Regex::new(r"[*#_`]").expect("valid marker pattern"),
            links: Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid link pattern"),
            list_items: Regex::new(r"(?m)^- ").expect("valid list pattern"),
            newlines: Regex::new(r"\n+").expect("valid newline pattern"),
        }
    }

    /// Reduce markdown text to speakable prose.
    pub fn sanitize(&self, text: &str) -> String {
        let text = self.markers.replace_all(text, "");
        let text = self.links.replace_all(&text, "$1");
        let text = self.list_items.replace_all(&text, "");
        let text = self.newlines.replace_all(&text, ". ");
        text.trim().to_string()
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_emphasis_and_list_markers() {
        let sanitizer = Sanitizer::new();
        let spoken = sanitizer.sanitize("**Bold** and *italic*\n- item");

        assert!(!spoken.contains('*'));
        assert!(!spoken.contains('#'));
        assert!(!spoken.contains('_'));
        assert!(!spoken.contains('`'));
        assert!(!spoken.contains("- item"));
        assert!(!spoken.contains('\n'));
        assert_eq!(spoken, "Bold and italic. item");
    }

    #[test]
    fn reduces_links_to_their_label() {
        let sanitizer = Sanitizer::new();
        assert_eq!(
            sanitizer.sanitize("Lihat [standar ISA](https://example.com/isa)."),
            "Lihat standar ISA."
        );
    }

    #[test]
    fn headings_and_code_become_plain_text() {
        let sanitizer = Sanitizer::new();
        let spoken = sanitizer.sanitize("## Risiko Audit\nGunakan `vouching` dan _tracing_.");
        assert_eq!(spoken, "Risiko Audit. Gunakan vouching dan tracing.");
    }

    #[test]
    fn collapses_blank_lines_into_one_pause() {
        let sanitizer = Sanitizer::new();
        assert_eq!(sanitizer.sanitize("satu\n\n\ndua"), "satu. dua");
    }

    #[test]
    fn plain_prose_is_untouched() {
        let sanitizer = Sanitizer::new();
        assert_eq!(
            sanitizer.sanitize("Saldo piutang wajar."),
            "Saldo piutang wajar."
        );
    }
}
