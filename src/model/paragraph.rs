//! Text items and their nested sentences and words.

use super::Metadata;
use serde::{Deserialize, Serialize};

/// A text item on a source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    /// Text content
    #[serde(default)]
    pub text: String,

    /// Layout category such as "paragraph" or "heading"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Heading level (1-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,

    /// `[x0, y0, x1, y1]` on the page
    #[serde(default)]
    pub bbox: [f64; 4],

    /// Page number (1-indexed, 0 = the containing page)
    #[serde(default)]
    pub page: u32,

    /// Sentences with offsets relative to this item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sentences: Vec<Sentence>,

    /// Extra backend metadata
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl TextItem {
    /// Create an uncategorized text item.
    pub fn new(text: impl Into<String>, bbox: [f64; 4], page: u32) -> Self {
        Self {
            text: text.into(),
            category: None,
            level: None,
            bbox,
            page,
            sentences: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Create a paragraph.
    pub fn paragraph(text: impl Into<String>, bbox: [f64; 4], page: u32) -> Self {
        Self::new(text, bbox, page).with_category("paragraph")
    }

    /// Create a heading.
    pub fn heading(text: impl Into<String>, level: u8, bbox: [f64; 4], page: u32) -> Self {
        let mut item = Self::new(text, bbox, page).with_category("heading");
        item.level = Some(level);
        item
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add a sentence.
    pub fn with_sentence(mut self, sentence: Sentence) -> Self {
        self.sentences.push(sentence);
        self
    }

    /// Resolved category.
    pub fn kind(&self) -> TextCategory {
        TextCategory::parse(self.category.as_deref())
    }
}

/// Layout category of a text item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCategory {
    Paragraph,
    Heading,
    Equation,
    Reference,
    /// Anything else, including a missing category
    Other,
}

impl TextCategory {
    /// Parse a category name, case-insensitively.
    pub fn parse(category: Option<&str>) -> Self {
        match category.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("paragraph") => TextCategory::Paragraph,
            Some("heading") => TextCategory::Heading,
            Some("equation") => TextCategory::Equation,
            Some("reference") => TextCategory::Reference,
            _ => TextCategory::Other,
        }
    }
}

/// A sentence nested in a text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(default)]
    pub text: String,

    /// Start offset relative to the parent item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,

    /// End offset relative to the parent item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,

    /// Own geometry, if the backend provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,

    /// Words with offsets relative to this sentence
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<Word>,
}

impl Sentence {
    /// Create a sentence starting at `start` within its parent.
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + text.chars().count();
        Self {
            text,
            start: Some(start),
            end: Some(end),
            bbox: None,
            words: Vec::new(),
        }
    }

    /// Add a word.
    pub fn with_word(mut self, word: Word) -> Self {
        self.words.push(word);
        self
    }

    /// Split the text on whitespace into words with relative offsets.
    pub fn with_words_from_text(mut self) -> Self {
        self.words = Word::split(&self.text);
        self
    }
}

/// A word nested in a sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub text: String,

    /// Start offset relative to the parent sentence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,

    /// End offset relative to the parent sentence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl Word {
    pub fn new(text: impl Into<String>, start: usize) -> Self {
        let text = text.into();
        let end = start + text.chars().count();
        Self {
            text,
            start: Some(start),
            end: Some(end),
            bbox: None,
        }
    }

    /// Whitespace-delimited words of `text` with char offsets.
    pub fn split(text: &str) -> Vec<Word> {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut start = 0;
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                if !current.is_empty() {
                    words.push(Word::new(std::mem::take(&mut current), start));
                }
            } else {
                if current.is_empty() {
                    start = i;
                }
                current.push(ch);
            }
        }
        if !current.is_empty() {
            words.push(Word::new(current, start));
        }
        words
    }
}
