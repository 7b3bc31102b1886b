//! Normalization and directional marks.

use super::direction::{is_rtl, runs};
use unicode_normalization::UnicodeNormalization;

/// Right-to-left mark.
pub const RLM: char = '\u{200F}';
/// Left-to-right mark.
pub const LRM: char = '\u{200E}';
/// Arabic letter mark.
pub const ALM: char = '\u{061C}';
/// Right-to-left isolate.
pub const RLI: char = '\u{2067}';
/// Pop directional isolate.
pub const PDI: char = '\u{2069}';

/// NFC-compose text and drop stray directional marks left by extraction.
pub fn normalize_rtl_text(text: &str) -> String {
    text.nfc()
        .filter(|c| !matches!(*c, LRM | RLM | ALM))
        .collect()
}

/// RLM for RTL text, LRM otherwise.
pub fn direction_marker(rtl: bool) -> char {
    if rtl {
        RLM
    } else {
        LRM
    }
}

/// Wrap RTL text in an RLI ... PDI isolate; LTR text is returned unchanged.
pub fn isolate(text: &str) -> String {
    if is_rtl(text) {
        format!("{RLI}{text}{PDI}")
    } else {
        text.to_string()
    }
}

/// Surround RTL runs with RLM and, in mixed text, LTR runs with LRM.
pub fn mark_runs(text: &str) -> String {
    let runs = runs(text);
    let mixed = runs.iter().any(|r| r.rtl);
    let mut out = String::with_capacity(text.len() + runs.len() * 6);
    for run in &runs {
        if run.rtl {
            out.push(RLM);
            out.push_str(run.text);
            out.push(RLM);
        } else if mixed {
            out.push(LRM);
            out.push_str(run.text);
            out.push(LRM);
        } else {
            out.push_str(run.text);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_marks() {
        assert_eq!(normalize_rtl_text("\u{200F}שלום\u{200E}"), "שלום");
        assert_eq!(normalize_rtl_text("a\u{061C}b"), "ab");
    }

    #[test]
    fn test_normalize_composes() {
        // e + combining acute
        assert_eq!(normalize_rtl_text("e\u{0301}"), "\u{00E9}");
    }

    #[test]
    fn test_isolate() {
        assert_eq!(isolate("hello"), "hello");
        assert_eq!(isolate("שלום"), "\u{2067}שלום\u{2069}");
    }

    #[test]
    fn test_mark_runs() {
        assert_eq!(mark_runs("abc"), "abc");
        assert_eq!(
            mark_runs("ab שלום"),
            "\u{200E}ab \u{200E}\u{200F}שלום\u{200F}"
        );
    }

    #[test]
    fn test_direction_marker() {
        assert_eq!(direction_marker(true), RLM);
        assert_eq!(direction_marker(false), LRM);
    }
}
