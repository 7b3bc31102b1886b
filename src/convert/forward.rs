//! Hierarchical source document to layered document.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{ConversionReport, ConvertOptions, Converted, Format, InferenceMode};
use crate::error::{Error, Result};
use crate::infer::{PageStructure, Predictors};
use crate::model::{
    layers, BoundingBox, ContentItem, Document, Entity, FigureItem, KeyValueItem, PageInfo,
    RawLine, Sentence, SourceDocument, SourcePage, Span, TableItem, TextCategory, TextItem,
};
use crate::rtl::RtlProcessor;

/// Numeric citation markers such as `[1]` or `[2, 5]`.
fn citation_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\[(\d+(,\s*\d+)*)\]").ok())
        .as_ref()
}

/// Converts source documents into layered documents.
///
/// The walk is a pure function of the source and the options: the same
/// input always yields byte-identical text and offsets.
#[derive(Debug, Clone)]
pub struct ForwardConverter {
    options: ConvertOptions,
    predictors: Predictors,
    rtl: RtlProcessor,
}

impl ForwardConverter {
    /// Create a converter with heuristic predictors configured from `options`.
    pub fn new(options: ConvertOptions) -> Self {
        let predictors = Predictors::heuristic(&options.inference);
        Self {
            options,
            predictors,
            rtl: RtlProcessor::new(),
        }
    }

    /// Validate `options`, then create a converter.
    pub fn try_new(options: ConvertOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::new(options))
    }

    /// Use specific predictors for pages without typed items.
    pub fn with_predictors(mut self, predictors: Predictors) -> Self {
        self.predictors = predictors;
        self
    }

    /// Use a specific RTL processor.
    pub fn with_rtl_processor(mut self, rtl: RtlProcessor) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a source document.
    pub fn convert(&self, source: &SourceDocument) -> Result<Document> {
        self.convert_with_report(source).map(Converted::into_output)
    }

    /// Convert a source document and keep the report.
    pub fn convert_with_report(&self, source: &SourceDocument) -> Result<Converted<Document>> {
        self.walk(source).map_err(|err| {
            log::error!(
                "Forward conversion of document '{}' failed: {}",
                source.id,
                err
            );
            Error::conversion(Format::Hierarchical.name(), Format::Layered.name(), err)
        })
    }

    fn walk(&self, source: &SourceDocument) -> Result<Converted<Document>> {
        let mut state = WalkState::default();
        let mut pages = Vec::with_capacity(source.pages.len());

        for (page_index, page) in source.pages.iter().enumerate() {
            let (width, height) = page.dimensions(
                self.options.default_page_width,
                self.options.default_page_height,
            );
            let page_start = state.pos;

            if page.needs_inference() {
                let infer = self.options.infer_structure == InferenceMode::WhenAbsent;
                self.emit_lines(&mut state, page, page_index, width, height, infer)?;
            } else {
                for item in &page.content {
                    self.emit_item(&mut state, item, page_index)?;
                }
            }

            let span = if state.pos > page_start {
                Span::new(page_start, state.pos - 1)
            } else {
                Span::new(page_start, page_start)
            };
            let number = page_index as u32 + 1;
            let entity = Entity::new(
                span,
                BoundingBox::page_box(width, height, page_index),
                "",
            )
            .with_meta("number", number)
            .with_meta("width", width)
            .with_meta("height", height)
            .with_meta("rotation", page.rotation);
            state.push(layers::PAGES, entity);

            let mut info = PageInfo::new(number, width, height);
            info.rotation = page.rotation;
            pages.push(info);
            state.report.stats.page_count += 1;
        }

        log::debug!(
            "Forward: {} pages, {} chars, {} layers",
            pages.len(),
            state.pos,
            state.layers.len()
        );

        let mut doc = Document::new(source.id.clone());
        doc.metadata = source.metadata.clone();
        if state.has_bibliography {
            doc.metadata.insert("has_bibliography".into(), Value::Bool(true));
        }
        let stats = &state.report.stats;
        if stats.rtl_item_count > 0 {
            doc.metadata.insert("has_rtl".into(), Value::Bool(true));
            doc.metadata.insert("rtl_items".into(), stats.rtl_item_count.into());
        }
        if stats.inferred_page_count > 0 {
            doc.metadata.insert("inferred_structure".into(), Value::Bool(true));
        }
        doc.pages = pages;
        doc.symbols = state.symbols;
        for (name, entities) in state.layers {
            doc.add_layer(name, entities);
        }
        Ok(Converted::new(doc, state.report))
    }

    fn emit_item(&self, state: &mut WalkState, item: &ContentItem, page_index: usize) -> Result<()> {
        let page = item_page(item.page(), page_index);
        let bbox = BoundingBox::from_array(item.bbox(), page);
        state.report.stats.item_count += 1;
        match item {
            ContentItem::Text(text) => self.emit_text(state, text, bbox),
            ContentItem::Table(table) => self.emit_table(state, table, bbox),
            ContentItem::Figure(figure) => {
                self.emit_figure(state, figure, bbox);
                Ok(())
            }
            ContentItem::KeyValue(kv) => {
                self.emit_key_value(state, kv, bbox);
                Ok(())
            }
        }
    }

    fn emit_text(&self, state: &mut WalkState, item: &TextItem, bbox: BoundingBox) -> Result<()> {
        let span = state.append(&item.text);
        let entity = self.text_entity(span, bbox, &item.text);
        state.count_rtl(&entity);
        let mut entity = entity.with_metadata(&item.metadata);

        let opens_bibliography =
            !state.has_bibliography && self.options.is_bibliography_marker(&item.text);
        if opens_bibliography {
            log::debug!("Forward: bibliography starts at offset {}", span.start);
            state.has_bibliography = true;
        }

        match item.kind() {
            TextCategory::Paragraph => {
                state.report.stats.paragraph_count += 1;
                state.push(layers::PARAGRAPHS, entity.clone());
                state.push(layers::BLOCKS, entity);
            }
            TextCategory::Heading => {
                let level = item.level.unwrap_or(1);
                let entity = entity
                    .with_meta("is_heading", true)
                    .with_meta("level", level)
                    .with_meta("heading_level", level);
                state.push(layers::BLOCKS, entity);
            }
            TextCategory::Equation => state.push(layers::EQUATIONS, entity),
            TextCategory::Reference if state.has_bibliography && !opens_bibliography => {
                state.push(layers::BIBLIOGRAPHY, entity)
            }
            _ => state.push(layers::BLOCKS, entity),
        }

        let item_len = item.text.chars().count();
        let mut cursor = 0;
        for sentence in &item.sentences {
            cursor = self.emit_sentence(state, sentence, span.start, item_len, cursor, bbox)?;
        }
        Ok(())
    }

    /// Emit a sentence and its words; returns the next free relative offset.
    fn emit_sentence(
        &self,
        state: &mut WalkState,
        sentence: &Sentence,
        parent_start: usize,
        parent_len: usize,
        cursor: usize,
        parent_box: BoundingBox,
    ) -> Result<usize> {
        let relative = relative_span(
            sentence.start,
            sentence.end,
            &sentence.text,
            cursor,
            parent_len,
        )?;
        let span = shifted(relative, parent_start)?;
        let bbox = sentence
            .bbox
            .map(|b| BoundingBox::from_array(b, parent_box.page))
            .unwrap_or(parent_box);
        state.push(layers::SENTENCES, Entity::new(span, bbox, &sentence.text));

        let mut word_cursor = 0;
        for word in &sentence.words {
            let word_relative = relative_span(
                word.start,
                word.end,
                &word.text,
                word_cursor,
                relative.len(),
            )?;
            word_cursor = word_relative.end + 1;
            let word_box = word
                .bbox
                .map(|b| BoundingBox::from_array(b, parent_box.page))
                .unwrap_or(bbox);
            let entity = Entity::new(shifted(word_relative, span.start)?, word_box, &word.text);
            state.push(layers::WORDS, entity.clone());
            state.push(layers::TOKENS, entity);
        }

        if self.options.extract_citations {
            self.emit_citations(state, sentence, span, bbox);
        }
        Ok(relative.end + 1)
    }

    fn emit_citations(&self, state: &mut WalkState, sentence: &Sentence, span: Span, bbox: BoundingBox) {
        let Some(pattern) = citation_pattern() else {
            return;
        };
        for captures in pattern.captures_iter(&sentence.text) {
            let (Some(whole), Some(ids)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let start = span.start + sentence.text[..whole.start()].chars().count();
            let citation_span = Span::new(start, start + whole.as_str().chars().count());
            if !span.contains(&citation_span) {
                log::debug!(
                    "Forward: citation '{}' falls outside its sentence span",
                    whole.as_str()
                );
                continue;
            }
            let ids: Vec<Value> = ids
                .as_str()
                .split(',')
                .map(|id| Value::String(id.trim().to_string()))
                .collect();
            let entity = Entity::new(citation_span, bbox, whole.as_str())
                .with_meta("citation_ids", ids)
                .with_meta("type", "numerical");
            state.report.stats.citation_count += 1;
            state.push(layers::CITATIONS, entity);
        }
    }

    fn emit_table(&self, state: &mut WalkState, table: &TableItem, bbox: BoundingBox) -> Result<()> {
        let text = table.display_text();
        let span = state.append(&text);
        let entity = Entity::new(span, bbox, text)
            .with_meta("num_rows", table.num_rows)
            .with_meta("num_cols", table.num_cols)
            .with_meta("cells", Value::Array(table.cells.clone()))
            .with_metadata(&table.metadata);
        state.report.stats.table_count += 1;
        state.push(layers::TABLES, entity.clone());
        state.push(layers::BLOCKS, entity.with_meta("is_table", true));
        Ok(())
    }

    fn emit_figure(&self, state: &mut WalkState, figure: &FigureItem, bbox: BoundingBox) {
        let text = figure.display_text();
        let span = state.append(&text);
        let entity = Entity::new(span, bbox, text)
            .with_meta("has_caption", figure.caption.is_some())
            .with_meta("image_data", figure.image_data.clone().unwrap_or(Value::Null))
            .with_metadata(&figure.metadata);
        state.report.stats.figure_count += 1;
        state.push(layers::FIGURES, entity.clone());
        state.push(layers::BLOCKS, entity.with_meta("is_figure", true));
    }

    fn emit_key_value(&self, state: &mut WalkState, kv: &KeyValueItem, bbox: BoundingBox) {
        let text = kv.display_text();
        let span = state.append(&text);
        let entity = Entity::new(span, bbox, text)
            .with_meta("is_key_value", true)
            .with_meta("key", kv.key.as_str())
            .with_meta("value", kv.value.as_str());
        state.push(layers::BLOCKS, entity);
    }

    /// Entity for a piece of text, flagged when it reads right to left.
    fn text_entity(&self, span: Span, bbox: BoundingBox, text: &str) -> Entity {
        let mut entity = Entity::new(span, bbox, text);
        if self.options.detect_rtl && self.rtl.is_rtl(text) {
            entity = entity
                .with_meta("is_rtl", true)
                .with_meta("direction", "rtl");
            if self.options.display_reordering {
                entity = entity.with_meta("display_text", self.rtl.process_paragraph(text));
            }
        }
        entity
    }

    /// Emit raw lines as rows and, when `infer` is set, attach inferred structure.
    fn emit_lines(
        &self,
        state: &mut WalkState,
        page: &SourcePage,
        page_index: usize,
        width: f64,
        height: f64,
        infer: bool,
    ) -> Result<()> {
        let lines = &page.lines;
        let mut line_spans = Vec::with_capacity(lines.len());
        for line in lines {
            let span = state.append(&line.text);
            line_spans.push(span);
            if line.is_blank() {
                continue;
            }
            state.report.stats.item_count += 1;
            let bbox = BoundingBox::from_array(line.bbox, page_index);
            let entity = self.text_entity(span, bbox, &line.text);
            state.count_rtl(&entity);
            state.push(layers::ROWS, entity);
        }

        if !infer {
            return Ok(());
        }
        let structure = self.predictors.infer_page(lines, width, height);
        state.report.stats.inferred_page_count += 1;
        self.attach_structure(state, lines, &line_spans, page_index, structure)
    }

    fn attach_structure(
        &self,
        state: &mut WalkState,
        lines: &[RawLine],
        line_spans: &[Span],
        page_index: usize,
        structure: PageStructure,
    ) -> Result<()> {
        let gate = self.options.min_confidence;
        let line_box = |i: usize| BoundingBox::from_array(lines[i].bbox, page_index);
        let range_box = |first: usize, last: usize| {
            (first..=last)
                .filter(|&i| !lines[i].is_blank())
                .map(line_box)
                .reduce(|acc, b| acc.union(&b))
                .unwrap_or_else(|| line_box(first))
        };

        for title in structure.titles.iter().filter(|t| t.confidence >= gate) {
            let entity = Entity::new(line_spans[title.line_index], line_box(title.line_index), &lines[title.line_index].text)
                .with_meta("type", title.kind.as_str())
                .with_meta("confidence", title.confidence)
                .with_meta("inferred", true);
            state.push(layers::TITLES, entity);
        }

        for paragraph in structure.paragraphs.iter().filter(|p| p.confidence >= gate) {
            let span = Span::new(
                line_spans[paragraph.first_line].start,
                line_spans[paragraph.last_line].end,
            );
            let bbox = range_box(paragraph.first_line, paragraph.last_line);
            // Rows already counted this text as right to left.
            let entity = self
                .text_entity(span, bbox, &paragraph.text)
                .with_meta("confidence", paragraph.confidence)
                .with_meta("inferred", true);
            state.report.stats.paragraph_count += 1;
            state.push(layers::PARAGRAPHS, entity.clone());
            state.push(layers::BLOCKS, entity);
        }

        for heading in structure.headings.iter().filter(|h| h.confidence >= gate) {
            let entity = Entity::new(line_spans[heading.line_index], line_box(heading.line_index), &lines[heading.line_index].text)
                .with_meta("is_heading", true)
                .with_meta("level", heading.level)
                .with_meta("heading_level", heading.level)
                .with_meta("confidence", heading.confidence)
                .with_meta("inferred", true);
            state.push(layers::BLOCKS, entity);
        }

        for region in structure.tables.into_iter().filter(|t| t.confidence >= gate) {
            let (Some(&first), Some(&last)) = (region.line_indices.first(), region.line_indices.last())
            else {
                continue;
            };
            let span = Span::new(line_spans[first].start, line_spans[last].end);
            let text = lines[first..=last]
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let mut bbox = region.bbox;
            bbox.page = page_index;
            let mut entity = Entity::new(span, bbox, text)
                .with_meta("num_rows", region.num_rows)
                .with_meta("num_cols", region.num_cols)
                .with_meta("cells", serde_json::to_value(&region.cells)?)
                .with_meta("confidence", region.confidence)
                .with_meta("inferred", true);
            if let Some(caption) = region.caption {
                entity = entity.with_meta("caption", caption);
            }
            state.report.stats.table_count += 1;
            state.push(layers::TABLES, entity.clone());
            state.push(layers::BLOCKS, entity.with_meta("is_table", true));
        }
        Ok(())
    }
}

impl Default for ForwardConverter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

/// Mutable state of one forward walk.
#[derive(Default)]
struct WalkState {
    symbols: String,
    /// Current offset in chars
    pos: usize,
    layers: BTreeMap<&'static str, Vec<Entity>>,
    has_bibliography: bool,
    report: ConversionReport,
}

impl WalkState {
    /// Append `text` plus a newline; the span covers `text` only.
    fn append(&mut self, text: &str) -> Span {
        let start = self.pos;
        self.symbols.push_str(text);
        self.symbols.push('\n');
        self.pos += text.chars().count() + 1;
        Span::new(start, self.pos - 1)
    }

    fn push(&mut self, layer: &'static str, entity: Entity) {
        self.layers.entry(layer).or_default().push(entity);
    }

    fn count_rtl(&mut self, entity: &Entity) {
        if entity.flag("is_rtl") {
            self.report.stats.rtl_item_count += 1;
        }
    }
}

/// 0-indexed page of an item; `0` means "the containing page".
fn item_page(page: u32, containing: usize) -> usize {
    if page == 0 {
        containing
    } else {
        page as usize - 1
    }
}

/// Move a relative span to absolute offsets.
fn shifted(relative: Span, parent_start: usize) -> Result<Span> {
    relative.offset(parent_start).ok_or(Error::InvalidSpan {
        start: relative.start,
        end: relative.end,
        len: parent_start,
    })
}

/// Resolve a nested relative span, defaulting to the running cursor.
fn relative_span(
    start: Option<usize>,
    end: Option<usize>,
    text: &str,
    cursor: usize,
    parent_len: usize,
) -> Result<Span> {
    let start = start.unwrap_or(cursor);
    let end = match end {
        Some(end) => end,
        None => start
            .checked_add(text.chars().count())
            .ok_or(Error::InvalidSpan {
                start,
                end: usize::MAX,
                len: parent_len,
            })?,
    };
    let span = Span::new(start, end);
    if !span.fits(parent_len) {
        return Err(Error::InvalidSpan {
            start,
            end,
            len: parent_len,
        });
    }
    Ok(span)
}
