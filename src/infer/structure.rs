//! Title, paragraph and heading heuristics over raw lines.

use super::{
    HeadingCandidate, InferenceConfig, PageStructure, ParagraphCandidate, StructurePredictor,
    TitleCandidate, TitleKind,
};
use crate::model::RawLine;

/// Line-based structure detector.
#[derive(Debug, Clone, Default)]
pub struct StructureDetector {
    config: InferenceConfig,
}

impl StructureDetector {
    /// Create a detector with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom thresholds.
    pub fn with_config(config: InferenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Short lines among the first non-empty lines of the page.
    pub fn detect_titles(&self, lines: &[RawLine]) -> Vec<TitleCandidate> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| !line.is_blank())
            .take(self.config.max_title_lines)
            .filter(|(_, line)| line.text.split_whitespace().count() < self.config.max_title_words)
            .map(|(index, line)| {
                let (kind, confidence) = if index == 0 {
                    (TitleKind::MainTitle, self.config.main_title_confidence)
                } else {
                    (TitleKind::Subtitle, self.config.subtitle_confidence)
                };
                TitleCandidate {
                    text: line.text.trim().to_string(),
                    line_index: index,
                    kind,
                    confidence,
                }
            })
            .collect()
    }

    /// Runs of non-empty lines separated by blank lines.
    pub fn detect_paragraphs(&self, lines: &[RawLine]) -> Vec<ParagraphCandidate> {
        let mut paragraphs = Vec::new();
        let mut run_start: Option<usize> = None;

        for (index, line) in lines.iter().enumerate() {
            match (line.is_blank(), run_start) {
                (false, None) => run_start = Some(index),
                (true, Some(start)) => {
                    paragraphs.push(self.paragraph(lines, start, index - 1));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            paragraphs.push(self.paragraph(lines, start, lines.len() - 1));
        }
        paragraphs
    }

    fn paragraph(&self, lines: &[RawLine], first: usize, last: usize) -> ParagraphCandidate {
        let text = lines[first..=last]
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        ParagraphCandidate {
            text,
            first_line: first,
            last_line: last,
            confidence: self.config.paragraph_confidence,
        }
    }

    /// Lines with a numbered prefix or a section keyword.
    pub fn detect_headings(&self, lines: &[RawLine]) -> Vec<HeadingCandidate> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                let level = self.heading_level(&line.text)?;
                Some(HeadingCandidate {
                    text: line.text.trim().to_string(),
                    line_index: index,
                    level,
                    confidence: self.config.heading_confidence,
                })
            })
            .collect()
    }

    /// Heading level of a line, or `None` if it is not a heading.
    pub fn heading_level(&self, text: &str) -> Option<u8> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        let keyword = self
            .config
            .heading_keywords
            .iter()
            .any(|k| lower.starts_with(k.as_str()));
        if !keyword && !has_section_number(trimmed) {
            return None;
        }
        let level_one = self
            .config
            .level_one_keywords
            .iter()
            .any(|k| lower.starts_with(k.as_str()));
        Some(if level_one { 1 } else { 2 })
    }
}

impl StructurePredictor for StructureDetector {
    fn predict(&self, lines: &[RawLine]) -> PageStructure {
        PageStructure {
            titles: self.detect_titles(lines),
            paragraphs: self.detect_paragraphs(lines),
            headings: self.detect_headings(lines),
            tables: Vec::new(),
        }
    }
}

/// `"1."`, `"12."`, `"IV."` and similar prefixes.
fn has_section_number(text: &str) -> bool {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        return text[digits..].starts_with('.');
    }
    let numerals = text
        .chars()
        .take_while(|c| matches!(c, 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
        .count();
    numerals > 0 && text[numerals..].starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<RawLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| RawLine::new(*t, [50.0, 20.0 * i as f64, 400.0, 20.0 * i as f64 + 12.0]))
            .collect()
    }

    #[test]
    fn test_titles() {
        let detector = StructureDetector::new();
        let page = lines(&[
            "Deep Layout Analysis",
            "A Study of Documents",
            "This opening line has far too many words to be any kind of title here",
            "Short",
        ]);
        let titles = detector.detect_titles(&page);
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0].kind, TitleKind::MainTitle);
        assert_eq!(titles[0].confidence, 0.7);
        assert_eq!(titles[1].kind, TitleKind::Subtitle);
        assert_eq!(titles[1].confidence, 0.5);
    }

    #[test]
    fn test_title_skips_blank_leading_line() {
        let detector = StructureDetector::new();
        let titles = detector.detect_titles(&lines(&["", "Heading Only"]));
        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].line_index, 1);
        assert_eq!(titles[0].kind, TitleKind::Subtitle);
    }

    #[test]
    fn test_paragraph_runs() {
        let detector = StructureDetector::new();
        let page = lines(&["one", "two", "", "  ", "three", "four", "five"]);
        let paragraphs = detector.detect_paragraphs(&page);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].text, "one\ntwo");
        assert_eq!((paragraphs[1].first_line, paragraphs[1].last_line), (4, 6));
        assert_eq!(paragraphs[1].confidence, 0.8);
    }

    #[test]
    fn test_heading_levels() {
        let detector = StructureDetector::new();
        assert_eq!(detector.heading_level("Abstract"), Some(1));
        assert_eq!(detector.heading_level("INTRODUCTION"), Some(1));
        assert_eq!(detector.heading_level("Methods and data"), Some(2));
        assert_eq!(detector.heading_level("2. Related Work"), Some(2));
        assert_eq!(detector.heading_level("IV. Experiments"), Some(2));
        assert_eq!(detector.heading_level("It was a dark night"), None);
        assert_eq!(detector.heading_level("12 apples"), None);
        assert_eq!(detector.heading_level(""), None);
    }

    #[test]
    fn test_detect_headings_confidence() {
        let detector = StructureDetector::new();
        let headings = detector.detect_headings(&lines(&["Conclusion", "We did it."]));
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].confidence, 0.6);
        assert_eq!(headings[0].level, 1);
    }
}
