//! Display reordering of bidirectional text.

use super::direction::{is_rtl, runs};

/// How display reordering is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidiCapability {
    /// Full Unicode Bidirectional Algorithm (requires the `bidi` feature)
    UnicodeBidi,
    /// Reverse each RTL run in place; not UBA compliant
    RunReversal,
}

impl BidiCapability {
    /// Best capability compiled into this build.
    pub fn detect() -> Self {
        if cfg!(feature = "bidi") {
            BidiCapability::UnicodeBidi
        } else {
            BidiCapability::RunReversal
        }
    }

    /// Whether this capability can run in this build.
    pub fn is_available(self) -> bool {
        match self {
            BidiCapability::UnicodeBidi => cfg!(feature = "bidi"),
            BidiCapability::RunReversal => true,
        }
    }
}

/// Reverse the characters of every RTL run, keeping run order.
///
/// Applying this twice does not in general give back the input.
pub fn reverse_rtl_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for run in runs(text) {
        if run.rtl {
            out.extend(run.text.chars().rev());
        } else {
            out.push_str(run.text);
        }
    }
    out
}

/// Reorder each line (split on `\n`) from logical to visual order with UAX#9.
#[cfg(feature = "bidi")]
pub fn reorder_uba(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for chunk in text.split_inclusive('\n') {
        let (line, has_newline) = match chunk.strip_suffix('\n') {
            Some(prefix) => (prefix, true),
            None => (chunk, false),
        };
        if !line.is_empty() {
            out.push_str(&reorder_line(line));
        }
        if has_newline {
            out.push('\n');
        }
    }
    out
}

#[cfg(feature = "bidi")]
fn reorder_line(line: &str) -> String {
    use unicode_bidi::BidiInfo;

    let info = BidiInfo::new(line, None);
    if info.paragraphs.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    for para in &info.paragraphs {
        out.push_str(&info.reorder_line(para, para.range.clone()));
    }
    out
}

/// Reverse a word list when the joined words read right to left.
pub fn reorder_words<T: AsRef<str>>(mut words: Vec<T>) -> Vec<T> {
    let joined = words
        .iter()
        .map(|w| w.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    if is_rtl(&joined) {
        words.reverse();
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_rtl_runs() {
        assert_eq!(reverse_rtl_runs("abc אבג def"), "abc גבא def");
        assert_eq!(reverse_rtl_runs("plain"), "plain");
    }

    #[test]
    fn test_reorder_words() {
        let words = vec!["שלום", "עולם"];
        assert_eq!(reorder_words(words), vec!["עולם", "שלום"]);

        let words = vec!["hello".to_string(), "world".to_string()];
        assert_eq!(reorder_words(words), vec!["hello", "world"]);
    }

    #[test]
    fn test_capability_detect_is_available() {
        assert!(BidiCapability::detect().is_available());
        assert!(BidiCapability::RunReversal.is_available());
    }

    #[cfg(feature = "bidi")]
    #[test]
    fn test_uba_keeps_newlines_and_ltr() {
        assert_eq!(reorder_uba("abc 123"), "abc 123");
        let out = reorder_uba("abc\n\u{05D0}\u{05D1}\u{05D2}\n");
        assert_eq!(out, "abc\n\u{05D2}\u{05D1}\u{05D0}\n");
    }
}
