//! Character and text direction classification.

use std::fmt;

/// Code-point ranges of right-to-left scripts.
const RTL_RANGES: &[(u32, u32)] = &[
    (0x0590, 0x05FF),   // Hebrew
    (0x0600, 0x06FF),   // Arabic
    (0x0700, 0x074F),   // Syriac
    (0x0750, 0x077F),   // Arabic Supplement
    (0x0780, 0x07BF),   // Thaana
    (0x07C0, 0x07FF),   // NKo
    (0x0800, 0x083F),   // Samaritan
    (0x0840, 0x085F),   // Mandaic
    (0x08A0, 0x08FF),   // Arabic Extended-A
    (0xFB1D, 0xFB4F),   // Hebrew presentation forms
    (0xFB50, 0xFDFF),   // Arabic Presentation Forms-A
    (0xFE70, 0xFEFF),   // Arabic Presentation Forms-B
    (0x10800, 0x10FFF), // historic RTL scripts
];

/// ISO 639 codes of languages written right to left.
const RTL_LANGUAGES: &[&str] = &[
    "ar", "arc", "dv", "fa", "ha", "he", "khw", "ks", "ku", "ps", "ur", "yi",
];

/// Share of RTL characters at which text counts as RTL.
pub const RTL_THRESHOLD: f64 = 0.3;

/// Text direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if a character belongs to an RTL script.
pub fn is_rtl_char(c: char) -> bool {
    let code = c as u32;
    RTL_RANGES
        .iter()
        .any(|&(start, end)| code >= start && code <= end)
}

/// Check if any character of the text is RTL.
pub fn contains_rtl(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

/// RTL characters divided by non-whitespace characters.
pub fn rtl_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut rtl = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        total += 1;
        if is_rtl_char(c) {
            rtl += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        rtl as f64 / total as f64
    }
}

/// Check if text is predominantly RTL.
pub fn is_rtl(text: &str) -> bool {
    is_rtl_with_threshold(text, RTL_THRESHOLD)
}

/// Check if text is RTL using a custom threshold.
pub fn is_rtl_with_threshold(text: &str, threshold: f64) -> bool {
    contains_rtl(text) && rtl_ratio(text) >= threshold
}

/// Overall direction of a text.
pub fn text_direction(text: &str) -> Direction {
    if is_rtl(text) {
        Direction::Rtl
    } else {
        Direction::Ltr
    }
}

/// Check if a language code names an RTL language (`"ar"`, `"he-IL"`, ...).
pub fn is_rtl_language(code: &str) -> bool {
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    RTL_LANGUAGES.contains(&primary.as_str())
}

/// A maximal run of characters with the same RTL classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run<'a> {
    pub rtl: bool,
    pub text: &'a str,
}

/// Split text into maximal RTL / non-RTL runs, in logical order.
pub fn runs(text: &str) -> Vec<Run<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let rtl = is_rtl_char(c);
        match current {
            Some(dir) if dir != rtl => {
                result.push(Run {
                    rtl: dir,
                    text: &text[start..i],
                });
                start = i;
                current = Some(rtl);
            }
            None => current = Some(rtl),
            _ => {}
        }
    }
    if let Some(dir) = current {
        result.push(Run {
            rtl: dir,
            text: &text[start..],
        });
    }
    result
}
