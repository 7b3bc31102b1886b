//! Integration tests for forward conversion.

use std::sync::Arc;

use doclayer::convert::{ConvertOptions, ForwardConverter};
use doclayer::infer::{PageStructure, ParagraphCandidate, Predictors, StructurePredictor};
use doclayer::model::{
    layers, Document, FigureItem, KeyValueItem, RawLine, Sentence, SourceDocument, SourcePage,
    TableItem, TextItem, Word,
};
use doclayer::render::{source_from_json_str, to_json, JsonFormat};
use doclayer::Error;
use serde_json::json;

const BOX: [f64; 4] = [72.0, 100.0, 540.0, 130.0];

fn reference(text: &str, page: u32) -> TextItem {
    TextItem::new(text, BOX, page).with_category("reference")
}

fn rich_source() -> SourceDocument {
    let intro = TextItem::paragraph("Layouts matter [1]. Offsets too.", BOX, 1)
        .with_sentence(Sentence::new("Layouts matter [1].", 0).with_words_from_text())
        .with_sentence(Sentence::new("Offsets too.", 20).with_words_from_text());

    SourceDocument::new("rich")
        .with_page(
            SourcePage::letter()
                .with_item(TextItem::heading("1. Introduction", 1, BOX, 1))
                .with_item(intro)
                .with_item(TextItem::new("a^2 + b^2 = c^2", BOX, 1).with_category("equation"))
                .with_item(
                    TableItem::new("1", BOX, 1)
                        .with_caption("Table 1: Results")
                        .with_grid(2, 2, vec![json!({"row": 0, "col": 0, "text": "x"})]),
                ),
        )
        .with_page(
            SourcePage::new(595.0, 842.0)
                .with_item(FigureItem::new("2", BOX, 2).with_caption("Figure 2: Pipeline"))
                .with_item(KeyValueItem::new("Received", "2024-01-05", BOX, 2))
                .with_item(TextItem::new("References", BOX, 2).with_category("heading"))
                .with_item(reference("[1] Doe, J. Layouts.", 2)),
        )
}

#[test]
fn test_offset_invariant_holds_for_every_layer() {
    let doc = ForwardConverter::default().convert(&rich_source()).unwrap();
    let len = doc.symbol_count();
    for (name, entities) in doc.layers() {
        for entity in entities {
            for span in &entity.spans {
                assert!(span.start <= span.end && span.end <= len, "{name}: {span:?}");
            }
            if name != layers::PAGES {
                assert_eq!(
                    doc.text_of(&entity.spans[0]),
                    Some(entity.text.as_str()),
                    "layer {name}"
                );
            }
        }
    }
    assert!(doc.validate().is_ok());
}

#[test]
fn test_forward_is_idempotent() {
    let source = rich_source();
    let converter = ForwardConverter::default();
    let first = converter.convert(&source).unwrap();
    let second = converter.convert(&source).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        to_json(&first, JsonFormat::Compact).unwrap(),
        to_json(&second, JsonFormat::Compact).unwrap()
    );
}

#[test]
fn test_layers_of_rich_document() {
    let doc = ForwardConverter::default().convert(&rich_source()).unwrap();
    assert_eq!(doc.get_layer(layers::PAGES).len(), 2);
    assert_eq!(doc.get_layer(layers::PARAGRAPHS).len(), 1);
    assert_eq!(doc.get_layer(layers::SENTENCES).len(), 2);
    assert_eq!(doc.get_layer(layers::WORDS).len(), 5);
    assert_eq!(doc.get_layer(layers::CITATIONS).len(), 1);
    assert_eq!(doc.get_layer(layers::EQUATIONS).len(), 1);
    assert_eq!(doc.get_layer(layers::TABLES).len(), 1);
    assert_eq!(doc.get_layer(layers::FIGURES).len(), 1);
    assert_eq!(doc.get_layer(layers::BIBLIOGRAPHY).len(), 1);

    // heading, paragraph, table, figure, key-value, "References" heading
    let blocks = doc.get_layer(layers::BLOCKS);
    assert_eq!(blocks.len(), 6);
    assert!(blocks[0].flag("is_heading"));
    assert!(blocks[2].flag("is_table"));
    assert!(blocks[3].flag("is_figure"));
    assert!(blocks[4].flag("is_key_value"));

    let second_page = &doc.get_layer(layers::PAGES)[1];
    assert_eq!(second_page.metadata["width"], json!(595.0));
    assert_eq!(second_page.metadata["number"], json!(2));
    assert_eq!(doc.pages[1].height, 842.0);
    assert_eq!(doc.get_layer(layers::FIGURES)[0].boxes[0].page, 1);
}

#[test]
fn test_bibliography_flag_is_sticky_across_pages() {
    let source = SourceDocument::new("bib")
        .with_page(
            SourcePage::letter()
                .with_item(reference("[0] Before the marker.", 1))
                .with_item(TextItem::new("  REFERENCES  ", BOX, 1)),
        )
        .with_page(SourcePage::letter().with_item(TextItem::paragraph("Appendix text.", BOX, 2)))
        .with_page(
            SourcePage::letter()
                .with_item(reference("[1] First.", 3))
                .with_item(reference("[2] Second.", 3)),
        );
    let doc = ForwardConverter::default().convert(&source).unwrap();

    let entries: Vec<&str> = doc
        .get_layer(layers::BIBLIOGRAPHY)
        .iter()
        .map(|e| e.text.as_str())
        .collect();
    assert_eq!(entries, vec!["[1] First.", "[2] Second."]);
    assert_eq!(doc.metadata["has_bibliography"], json!(true));

    // the early reference and the marker itself go to blocks
    let blocks = doc.get_layer(layers::BLOCKS);
    assert_eq!(blocks[0].text, "[0] Before the marker.");
    assert_eq!(blocks[1].text, "  REFERENCES  ");
}

#[test]
fn test_citation_extraction() {
    let item = TextItem::paragraph("See [1, 2] and [5]", BOX, 1)
        .with_sentence(Sentence::new("See [1, 2] and [5]", 0));
    let source = SourceDocument::new("c").with_page(SourcePage::letter().with_item(item));
    let doc = ForwardConverter::default().convert(&source).unwrap();

    let citations = doc.get_layer(layers::CITATIONS);
    assert_eq!(citations.len(), 2);
    assert_eq!(citations[0].metadata["citation_ids"], json!(["1", "2"]));
    assert_eq!(citations[1].metadata["citation_ids"], json!(["5"]));
}

#[test]
fn test_citations_can_be_disabled() {
    let item = TextItem::paragraph("See [3].", BOX, 1).with_sentence(Sentence::new("See [3].", 0));
    let source = SourceDocument::new("c").with_page(SourcePage::letter().with_item(item));
    let options = ConvertOptions::default().with_citations(false);
    let doc = ForwardConverter::new(options).convert(&source).unwrap();
    assert!(!doc.has_layer(layers::CITATIONS));
}

#[test]
fn test_empty_layers_are_omitted() {
    let source = SourceDocument::new("e")
        .with_page(SourcePage::letter().with_item(TextItem::paragraph("Only text.", BOX, 1)));
    let doc = ForwardConverter::default().convert(&source).unwrap();
    let value = serde_json::to_value(&doc).unwrap();
    let entities = value["entities"].as_object().unwrap();
    assert!(!entities.contains_key("figures"));
    assert!(!entities.contains_key("citations"));

    let empty = ForwardConverter::default()
        .convert(&SourceDocument::new("none"))
        .unwrap();
    let value = serde_json::to_value(&empty).unwrap();
    for name in ["pages", "paragraphs", "blocks"] {
        assert_eq!(value["entities"][name], json!([]), "{name}");
    }
    assert_eq!(value["symbols"], "");
}

#[test]
fn test_empty_page_gets_point_span() {
    let source = SourceDocument::new("p")
        .with_page(SourcePage::letter().with_item(TextItem::paragraph("abc", BOX, 1)))
        .with_page(SourcePage::letter());
    let doc = ForwardConverter::default().convert(&source).unwrap();
    let pages = doc.get_layer(layers::PAGES);
    assert_eq!(pages[1].spans[0].start, 4);
    assert_eq!(pages[1].spans[0].end, 4);
}

#[test]
fn test_degenerate_page_size_uses_defaults() {
    let source = SourceDocument::new("p").with_page(SourcePage::new(1.0, 0.0));
    let options = ConvertOptions::default().with_default_page_size(595.0, 842.0);
    let doc = ForwardConverter::new(options).convert(&source).unwrap();
    assert_eq!(doc.pages[0].width, 595.0);
    assert_eq!(doc.pages[0].height, 842.0);
}

#[test]
fn test_words_without_offsets_follow_a_cursor() {
    let sentence = Sentence {
        text: "one two".into(),
        start: None,
        end: None,
        bbox: None,
        words: vec![
            Word { text: "one".into(), start: None, end: None, bbox: None },
            Word { text: "two".into(), start: Some(4), end: None, bbox: None },
        ],
    };
    let source = SourceDocument::new("w").with_page(
        SourcePage::letter().with_item(TextItem::paragraph("one two", BOX, 1).with_sentence(sentence)),
    );
    let doc = ForwardConverter::default().convert(&source).unwrap();
    let words = doc.get_layer(layers::WORDS);
    assert_eq!(doc.text_of(&words[0].spans[0]), Some("one"));
    assert_eq!(doc.text_of(&words[1].spans[0]), Some("two"));
}

#[test]
fn test_rtl_document_metadata() {
    let source = SourceDocument::new("rtl").with_page(
        SourcePage::letter()
            .with_item(TextItem::paragraph("هذا نص باللغة العربية", BOX, 1))
            .with_item(TextItem::paragraph("This is English text", BOX, 1)),
    );
    let doc = ForwardConverter::default().convert(&source).unwrap();
    assert_eq!(doc.metadata["has_rtl"], json!(true));
    assert_eq!(doc.metadata["rtl_items"], json!(1));

    let paragraphs = doc.get_layer(layers::PARAGRAPHS);
    assert!(paragraphs[0].flag("is_rtl"));
    assert!(!paragraphs[1].flag("is_rtl"));
    assert!(!paragraphs[0].metadata.contains_key("display_text"));
}

#[test]
fn test_extreme_nested_offsets_fail_cleanly() {
    let sentence_json = r#"{"id": "x", "pages": [{"content": [
        {"type": "text", "text": "x", "bbox": [0, 0, 10, 10], "page": 1,
         "sentences": [{"text": "x", "start": 18446744073709551615}]}
    ]}]}"#;
    let word_json = r#"{"id": "x", "pages": [{"content": [
        {"type": "text", "text": "xy", "bbox": [0, 0, 10, 10], "page": 1,
         "sentences": [{"text": "xy", "start": 0,
                        "words": [{"text": "y", "start": 18446744073709551615}]}]}
    ]}]}"#;

    for json in [sentence_json, word_json] {
        let source = source_from_json_str(json).unwrap();
        let err = ForwardConverter::default().convert(&source).unwrap_err();
        let Error::Conversion { source, .. } = err else {
            panic!("expected a conversion error, got {err:?}");
        };
        assert!(
            matches!(*source, Error::InvalidSpan { start: usize::MAX, .. }),
            "{source:?}"
        );
    }
}

struct EveryLineParagraph;

impl StructurePredictor for EveryLineParagraph {
    fn predict(&self, lines: &[RawLine]) -> PageStructure {
        PageStructure {
            paragraphs: lines
                .iter()
                .enumerate()
                .filter(|(_, l)| !l.is_blank())
                .map(|(i, l)| ParagraphCandidate {
                    text: l.text.clone(),
                    first_line: i,
                    last_line: i,
                    confidence: 0.9,
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[test]
fn test_injected_predictor_is_used() {
    let page = SourcePage::letter()
        .with_line(RawLine::new("first", [0.0, 0.0, 30.0, 10.0]))
        .with_line(RawLine::new("second", [0.0, 12.0, 36.0, 22.0]));
    let source = SourceDocument::new("i").with_page(page);
    let predictors = Predictors::default().with_structure(Arc::new(EveryLineParagraph));
    let doc: Document = ForwardConverter::default()
        .with_predictors(predictors)
        .convert(&source)
        .unwrap();

    let paragraphs = doc.get_layer(layers::PARAGRAPHS);
    assert_eq!(paragraphs.len(), 2);
    assert_eq!(paragraphs[1].text, "second");
    assert_eq!(paragraphs[1].metadata["confidence"], json!(0.9));
    assert!(!doc.has_layer(layers::TITLES));
}

#[test]
fn test_inferred_rtl_text_is_counted_once() {
    let page = SourcePage::letter()
        .with_line(RawLine::new("هذا نص عربي", [0.0, 0.0, 60.0, 10.0]))
        .with_line(RawLine::new("سطر ثان بالعربية", [0.0, 12.0, 90.0, 22.0]));
    let source = SourceDocument::new("rtl-lines").with_page(page);
    let predictors = Predictors::default().with_structure(Arc::new(EveryLineParagraph));
    let converted = ForwardConverter::default()
        .with_predictors(predictors)
        .convert_with_report(&source)
        .unwrap();

    let doc = &converted.output;
    assert_eq!(converted.report.stats.rtl_item_count, 2);
    assert_eq!(doc.metadata["rtl_items"], json!(2));
    assert!(doc.get_layer(layers::ROWS).iter().all(|row| row.flag("is_rtl")));
    assert!(doc.get_layer(layers::PARAGRAPHS).iter().all(|p| p.flag("is_rtl")));
}

#[test]
fn test_report_counts() {
    let converted = ForwardConverter::default()
        .convert_with_report(&rich_source())
        .unwrap();
    let stats = &converted.report.stats;
    assert_eq!(stats.page_count, 2);
    assert_eq!(stats.item_count, 8);
    assert_eq!(stats.table_count, 1);
    assert_eq!(stats.figure_count, 1);
    assert_eq!(stats.citation_count, 1);
    assert!(!converted.report.has_warnings());
}
