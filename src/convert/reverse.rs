//! Layered document back to a hierarchical source document.
//!
//! This direction is lossy: only paragraphs (with their sentences and words),
//! equations, bibliography entries, tables, figures and key-value blocks come
//! back. Other blocks are dropped.

use serde_json::Value;

use super::{ConversionReport, ConvertOptions, Converted, Format};
use crate::error::{Error, Result};
use crate::model::{
    layers, BoundingBox, ContentItem, Document, Entity, FigureItem, KeyValueItem, Metadata,
    Sentence, SourceDocument, SourcePage, Span, TableItem, TextItem, Word,
};

/// Metadata keys written by the forward walk that are not copied back.
const DERIVED_KEYS: &[&str] = &[
    "is_rtl",
    "direction",
    "display_text",
    "confidence",
    "inferred",
    "is_table",
    "is_figure",
];

const TABLE_KEYS: &[&str] = &["num_rows", "num_cols", "cells"];
const FIGURE_KEYS: &[&str] = &["has_caption", "image_data"];

/// Text layers whose entities become text items, in parent lookup order.
const TEXT_LAYERS: [(&str, &str); 3] = [
    (layers::PARAGRAPHS, "paragraph"),
    (layers::EQUATIONS, "equation"),
    (layers::BIBLIOGRAPHY, "reference"),
];

/// Converts layered documents back into source documents.
#[derive(Debug, Clone, Default)]
pub struct ReverseConverter {
    options: ConvertOptions,
}

impl ReverseConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Validate `options`, then create a converter.
    pub fn try_new(options: ConvertOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::new(options))
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert a layered document.
    pub fn convert(&self, doc: &Document) -> Result<SourceDocument> {
        self.convert_with_report(doc).map(Converted::into_output)
    }

    /// Convert a layered document and keep the report, including skipped entities.
    pub fn convert_with_report(&self, doc: &Document) -> Result<Converted<SourceDocument>> {
        self.walk(doc).map_err(|err| {
            log::error!("Reverse conversion of document '{}' failed: {}", doc.id, err);
            Error::conversion(Format::Layered.name(), Format::Hierarchical.name(), err)
        })
    }

    fn walk(&self, doc: &Document) -> Result<Converted<SourceDocument>> {
        let mut walk = ReverseWalk {
            doc,
            len: doc.symbol_count(),
            page_limit: page_limit(doc),
            items: Vec::new(),
            text_parents: Vec::new(),
            sentence_parents: Vec::new(),
            report: ConversionReport::new(),
        };

        for (layer, category) in TEXT_LAYERS {
            walk.collect_text(layer, category)?;
        }
        walk.nest_sentences()?;
        walk.nest_words()?;
        walk.collect_tables()?;
        walk.collect_figures()?;
        walk.collect_key_values()?;

        let ReverseWalk {
            mut items,
            mut report,
            ..
        } = walk;

        let page_count = items
            .iter()
            .map(|p| p.page + 1)
            .chain([doc.pages.len(), doc.get_layer(layers::PAGES).len()])
            .max()
            .unwrap_or(0);

        let mut pages: Vec<SourcePage> = (0..page_count).map(|i| self.page_shell(doc, i)).collect();

        // Stable: items sharing a start keep their collection order.
        items.sort_by_key(|p| (p.page, p.start));
        for pending in items {
            pages[pending.page].add_item(pending.item);
        }

        report.stats.page_count = page_count;
        log::debug!(
            "Reverse: {} pages, {} items, {} skipped",
            page_count,
            report.stats.item_count,
            report.stats.skipped_count
        );

        let mut source = SourceDocument::new(doc.id.clone());
        source.metadata = doc.metadata.clone();
        for page in pages {
            source.add_page(page);
        }
        Ok(Converted::new(source, report))
    }

    /// Empty page carrying the recovered geometry of page `index`.
    fn page_shell(&self, doc: &Document, index: usize) -> SourcePage {
        if let Some(info) = doc.pages.get(index) {
            let mut page = SourcePage::new(info.width, info.height);
            page.rotation = info.rotation;
            return page;
        }
        let Some(entity) = doc.get_layer(layers::PAGES).get(index) else {
            return SourcePage::default();
        };
        let number = |key: &str| entity.metadata.get(key).and_then(Value::as_f64);
        let width = number("width").or_else(|| entity.bbox().map(|b| b.x1));
        let height = number("height").or_else(|| entity.bbox().map(|b| b.y1));
        SourcePage {
            width,
            height,
            rotation: entity
                .metadata
                .get("rotation")
                .and_then(Value::as_i64)
                .unwrap_or(0) as i32,
            ..Default::default()
        }
    }
}

/// An item waiting to be placed on its page.
struct Pending {
    page: usize,
    start: usize,
    item: ContentItem,
}

struct ReverseWalk<'a> {
    doc: &'a Document,
    /// Length of `symbols` in chars
    len: usize,
    /// Number of pages entities may sit on
    page_limit: usize,
    items: Vec<Pending>,
    /// Span of each text item and its index in `items`
    text_parents: Vec<(Span, usize)>,
    /// Span of each placed sentence with its item and sentence index
    sentence_parents: Vec<(Span, usize, usize)>,
    report: ConversionReport,
}

impl ReverseWalk<'_> {
    /// Span and box of an entity, or a recorded warning when it has none.
    fn geometry(&mut self, layer: &str, index: usize, entity: &Entity) -> Result<Option<(Span, BoundingBox)>> {
        let (Some(span), Some(bbox)) = (entity.span(), entity.bbox()) else {
            self.report.warn(Error::MissingGeometry {
                layer: layer.to_string(),
                index,
            });
            return Ok(None);
        };
        if !span.fits(self.len) {
            return Err(Error::InvalidSpan {
                start: span.start,
                end: span.end,
                len: self.len,
            });
        }
        if bbox.page >= self.page_limit {
            self.report.warn(Error::PageOutOfRange {
                layer: layer.to_string(),
                index,
                page: bbox.page,
                page_count: self.page_limit,
            });
            return Ok(None);
        }
        Ok(Some((*span, *bbox)))
    }

    fn text(&self, entity: &Entity, span: &Span) -> String {
        if !entity.text.is_empty() {
            return entity.text.clone();
        }
        self.doc.text_of(span).unwrap_or_default().to_string()
    }

    fn place(&mut self, bbox: &BoundingBox, start: usize, item: ContentItem) -> usize {
        self.report.stats.item_count += 1;
        self.items.push(Pending {
            page: bbox.page,
            start,
            item,
        });
        self.items.len() - 1
    }

    fn collect_text(&mut self, layer: &str, category: &str) -> Result<()> {
        let doc = self.doc;
        for (index, entity) in doc.get_layer(layer).iter().enumerate() {
            let Some((span, bbox)) = self.geometry(layer, index, entity)? else {
                continue;
            };
            let mut item = TextItem::new(self.text(entity, &span), bbox.to_array(), page_number(&bbox))
                .with_category(category);
            item.metadata = copy_metadata(&entity.metadata, &[]);
            if layer == layers::PARAGRAPHS {
                self.report.stats.paragraph_count += 1;
            }
            let slot = self.place(&bbox, span.start, item.into());
            self.text_parents.push((span, slot));
        }
        Ok(())
    }

    /// Attach each sentence to the first text item whose span contains it.
    fn nest_sentences(&mut self) -> Result<()> {
        let doc = self.doc;
        for (index, entity) in doc.get_layer(layers::SENTENCES).iter().enumerate() {
            let Some(span) = entity.span().copied() else {
                continue;
            };
            let Some(&(parent, slot)) = self.text_parents.iter().find(|(p, _)| p.contains(&span)) else {
                log::debug!("Reverse: sentence {} has no containing text item", index);
                continue;
            };
            check_fits(&span, self.len)?;
            let sentence = Sentence {
                text: self.text(entity, &span),
                start: Some(span.start - parent.start),
                end: Some(span.end - parent.start),
                bbox: entity.bbox().map(BoundingBox::to_array),
                words: Vec::new(),
            };
            if let ContentItem::Text(item) = &mut self.items[slot].item {
                item.sentences.push(sentence);
                let position = item.sentences.len() - 1;
                self.sentence_parents.push((span, slot, position));
            }
        }
        Ok(())
    }

    /// Attach each word to the first sentence whose span contains it.
    fn nest_words(&mut self) -> Result<()> {
        let doc = self.doc;
        for entity in doc.get_layer(layers::WORDS) {
            let Some(span) = entity.span().copied() else {
                continue;
            };
            let Some(&(parent, slot, position)) =
                self.sentence_parents.iter().find(|(p, _, _)| p.contains(&span))
            else {
                continue;
            };
            check_fits(&span, self.len)?;
            let word = Word {
                text: self.text(entity, &span),
                start: Some(span.start - parent.start),
                end: Some(span.end - parent.start),
                bbox: entity.bbox().map(BoundingBox::to_array),
            };
            if let ContentItem::Text(item) = &mut self.items[slot].item {
                if let Some(sentence) = item.sentences.get_mut(position) {
                    sentence.words.push(word);
                }
            }
        }
        Ok(())
    }

    fn collect_tables(&mut self) -> Result<()> {
        let doc = self.doc;
        for (index, entity) in doc.get_layer(layers::TABLES).iter().enumerate() {
            let Some((span, bbox)) = self.geometry(layers::TABLES, index, entity)? else {
                continue;
            };
            let cells = match entity.metadata.get("cells") {
                Some(Value::Array(cells)) => cells.clone(),
                _ => Vec::new(),
            };
            let mut table = TableItem::new((index + 1).to_string(), bbox.to_array(), page_number(&bbox))
                .with_caption(self.text(entity, &span))
                .with_grid(entity.meta_usize("num_rows"), entity.meta_usize("num_cols"), cells);
            table.metadata = copy_metadata(&entity.metadata, TABLE_KEYS);
            self.report.stats.table_count += 1;
            self.place(&bbox, span.start, table.into());
        }
        Ok(())
    }

    fn collect_figures(&mut self) -> Result<()> {
        let doc = self.doc;
        for (index, entity) in doc.get_layer(layers::FIGURES).iter().enumerate() {
            let Some((span, bbox)) = self.geometry(layers::FIGURES, index, entity)? else {
                continue;
            };
            let text = self.text(entity, &span);
            let captioned = entity
                .metadata
                .get("has_caption")
                .and_then(Value::as_bool)
                .unwrap_or(true);
            let mut figure = if captioned {
                FigureItem::new((index + 1).to_string(), bbox.to_array(), page_number(&bbox))
                    .with_caption(text)
            } else {
                let id = text.strip_prefix("Figure ").unwrap_or(&text).to_string();
                FigureItem::new(id, bbox.to_array(), page_number(&bbox))
            };
            match entity.metadata.get("image_data") {
                Some(Value::Null) | None => {}
                Some(data) => figure = figure.with_image_data(data.clone()),
            }
            figure.metadata = copy_metadata(&entity.metadata, FIGURE_KEYS);
            self.report.stats.figure_count += 1;
            self.place(&bbox, span.start, figure.into());
        }
        Ok(())
    }

    fn collect_key_values(&mut self) -> Result<()> {
        let doc = self.doc;
        for (index, entity) in doc.get_layer(layers::BLOCKS).iter().enumerate() {
            if !entity.flag("is_key_value") {
                continue;
            }
            let Some((span, bbox)) = self.geometry(layers::BLOCKS, index, entity)? else {
                continue;
            };
            let (key, value) = match (entity.metadata.get("key"), entity.metadata.get("value")) {
                (Some(_), _) | (_, Some(_)) => (
                    entity.meta_str("key").to_string(),
                    entity.meta_str("value").to_string(),
                ),
                _ => {
                    let text = self.text(entity, &span);
                    let (k, v) = text.split_once(": ").unwrap_or((text.as_str(), ""));
                    (k.to_string(), v.to_string())
                }
            };
            let kv = KeyValueItem::new(key, value, bbox.to_array(), page_number(&bbox));
            self.place(&bbox, span.start, kv.into());
        }
        Ok(())
    }
}

/// Pages recorded on the document; one when it records none.
fn page_limit(doc: &Document) -> usize {
    doc.pages
        .len()
        .max(doc.get_layer(layers::PAGES).len())
        .max(1)
}

/// 1-indexed page number of a box whose page is within [`page_limit`].
fn page_number(bbox: &BoundingBox) -> u32 {
    u32::try_from(bbox.page).map_or(u32::MAX, |page| page.saturating_add(1))
}

fn check_fits(span: &Span, len: usize) -> Result<()> {
    if span.fits(len) {
        Ok(())
    } else {
        Err(Error::InvalidSpan {
            start: span.start,
            end: span.end,
            len,
        })
    }
}

/// Entity metadata minus derived keys and the given `reserved` keys.
fn copy_metadata(metadata: &Metadata, reserved: &[&str]) -> Metadata {
    metadata
        .iter()
        .filter(|(k, _)| !DERIVED_KEYS.contains(&k.as_str()) && !reserved.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
