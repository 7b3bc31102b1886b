//! Integration tests for structural inference and RTL classification.

use std::sync::Arc;

use doclayer::convert::{ConvertOptions, ForwardConverter, InferenceMode};
use doclayer::infer::{
    InferenceConfig, Predictors, StructureDetector, TableDetector, TablePredictor, TableRegion,
    TitleKind,
};
use doclayer::model::{layers, RawLine, SourceDocument, SourcePage};
use doclayer::rtl::{self, RtlProcessor};
use serde_json::json;

fn make_line(text: &str, x: f64, y: f64) -> RawLine {
    let width = text.chars().count() as f64 * 6.0;
    RawLine::new(text, [x, y, x + width, y + 10.0])
}

fn staff_lines() -> Vec<RawLine> {
    vec![
        make_line("Staff Directory", 50.0, 40.0),
        RawLine::new("", [0.0, 0.0, 0.0, 0.0]),
        make_line("Table 1: Staff", 50.0, 80.0),
        make_line("Name  Age  City", 50.0, 100.0),
        make_line("Alice  30  Paris", 50.0, 115.0),
        make_line("Bob  25  Rome", 50.0, 130.0),
    ]
}

#[test]
fn test_three_regular_rows_form_a_table() {
    let lines = staff_lines();
    let regions = TableDetector::new().detect(&lines, 612.0, 792.0);

    assert_eq!(regions.len(), 1);
    let region = &regions[0];
    assert_eq!((region.num_rows, region.num_cols), (3, 3));
    assert_eq!(region.cells.len(), 9);
    assert_eq!(region.line_indices, vec![3, 4, 5]);
    assert_eq!(region.cells[4].text, "30");
    assert_eq!(region.confidence, 0.8);
    assert_eq!(region.caption.as_deref(), Some("Table 1: Staff"));
    assert_eq!(region.caption_line, Some(2));
}

#[test]
fn test_single_regular_row_is_not_a_table() {
    let lines = vec![
        make_line("Name  Age  City", 50.0, 100.0),
        make_line("Just a sentence of prose.", 50.0, 115.0),
    ];
    assert!(TableDetector::new().detect(&lines, 612.0, 792.0).is_empty());
}

#[test]
fn test_caption_out_of_reach_is_ignored() {
    let mut lines = staff_lines();
    lines[2] = make_line("Table 1: Staff", 50.0, 20.0);
    // 70pt above the table is beyond 5% of the page height
    let regions = TableDetector::new().detect(&lines, 612.0, 792.0);
    assert_eq!(regions[0].caption, None);

    let config = InferenceConfig::default().with_caption_vertical_ratio(0.2);
    let regions = TableDetector::with_config(config).detect(&lines, 612.0, 792.0);
    assert_eq!(regions[0].caption.as_deref(), Some("Table 1: Staff"));
}

#[test]
fn test_structure_detector_titles_and_headings() {
    let lines = vec![
        make_line("Layered Documents", 50.0, 40.0),
        make_line("A practical survey", 50.0, 60.0),
        RawLine::new("", [0.0, 0.0, 0.0, 0.0]),
        make_line("Abstract", 50.0, 100.0),
        make_line("We describe offsets and layers in some detail here.", 50.0, 115.0),
        RawLine::new("  ", [0.0, 0.0, 0.0, 0.0]),
        make_line("2. Methods", 50.0, 150.0),
        make_line("Results and discussion", 50.0, 170.0),
    ];
    let detector = StructureDetector::new();

    let titles = detector.detect_titles(&lines);
    assert_eq!(titles.len(), 3);
    assert_eq!(titles[0].kind, TitleKind::MainTitle);
    assert_eq!(titles[0].confidence, 0.7);
    assert_eq!(titles[1].kind, TitleKind::Subtitle);
    assert_eq!(titles[2].line_index, 3);

    let headings = detector.detect_headings(&lines);
    let levels: Vec<(&str, u8)> = headings.iter().map(|h| (h.text.as_str(), h.level)).collect();
    assert_eq!(
        levels,
        vec![("Abstract", 1), ("2. Methods", 2), ("Results and discussion", 2)]
    );

    let paragraphs = detector.detect_paragraphs(&lines);
    assert_eq!(paragraphs.len(), 3);
    assert_eq!((paragraphs[1].first_line, paragraphs[1].last_line), (3, 4));
    assert_eq!(paragraphs[2].text, "2. Methods\nResults and discussion");
}

#[test]
fn test_forward_attaches_inferred_structure() {
    let mut page = SourcePage::letter();
    page.lines = staff_lines();
    let source = SourceDocument::new("staff").with_page(page);
    let converted = ForwardConverter::default()
        .convert_with_report(&source)
        .unwrap();
    let doc = converted.output;

    assert_eq!(converted.report.stats.inferred_page_count, 1);
    assert_eq!(doc.metadata["inferred_structure"], json!(true));
    assert_eq!(doc.get_layer(layers::ROWS).len(), 5);

    let titles = doc.get_layer(layers::TITLES);
    assert_eq!(titles[0].text, "Staff Directory");
    assert_eq!(titles[0].metadata["type"], json!("main_title"));

    let tables = doc.get_layer(layers::TABLES);
    assert_eq!(tables.len(), 1);
    let table = &tables[0];
    assert_eq!(doc.text_of(&table.spans[0]), Some(table.text.as_str()));
    assert!(table.text.starts_with("Name  Age  City\n"));
    assert_eq!(table.metadata["num_cols"], json!(3));
    assert_eq!(table.metadata["caption"], json!("Table 1: Staff"));
    assert_eq!(table.metadata["inferred"], json!(true));
    assert_eq!(table.metadata["cells"].as_array().map(Vec::len), Some(9));
    assert!(doc.get_layer(layers::BLOCKS).iter().any(|b| b.flag("is_table")));
}

#[test]
fn test_stricter_gate_drops_low_confidence_candidates() {
    let mut page = SourcePage::letter();
    page.lines = staff_lines();
    let source = SourceDocument::new("staff").with_page(page);
    let options = ConvertOptions::default().with_min_confidence(0.75);
    let doc = ForwardConverter::new(options).convert(&source).unwrap();

    // only the paragraphs (0.8) and the table (0.8) survive
    assert!(!doc.has_layer(layers::TITLES));
    assert_eq!(doc.get_layer(layers::PARAGRAPHS).len(), 2);
    assert_eq!(doc.get_layer(layers::TABLES).len(), 1);
}

#[test]
fn test_inference_mode_never_keeps_rows_only() {
    let mut page = SourcePage::letter();
    page.lines = staff_lines();
    let source = SourceDocument::new("staff").with_page(page);
    let options = ConvertOptions::default().with_inference_mode(InferenceMode::Never);
    let doc = ForwardConverter::new(options).convert(&source).unwrap();

    assert_eq!(doc.get_layer(layers::ROWS).len(), 5);
    assert!(!doc.has_layer(layers::TABLES));
    assert!(doc.get_layer(layers::PARAGRAPHS).is_empty());
}

struct FixedTable;

impl TablePredictor for FixedTable {
    fn predict(&self, lines: &[RawLine], _: f64, _: f64) -> Vec<TableRegion> {
        let first = lines.iter().position(|l| !l.is_blank()).unwrap_or(0);
        vec![TableRegion {
            bbox: doclayer::model::BoundingBox::from_array(lines[first].bbox, 0),
            num_rows: 1,
            num_cols: 1,
            cells: Vec::new(),
            line_indices: vec![first],
            caption: None,
            caption_line: None,
            confidence: 0.95,
        }]
    }
}

#[test]
fn test_custom_table_predictor() {
    let page = SourcePage::letter().with_line(make_line("anything at all", 10.0, 10.0));
    let source = SourceDocument::new("custom").with_page(page);
    let predictors = Predictors::default().with_tables(Arc::new(FixedTable));
    let doc = ForwardConverter::default()
        .with_predictors(predictors)
        .convert(&source)
        .unwrap();

    let tables = doc.get_layer(layers::TABLES);
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].text, "anything at all");
    assert_eq!(tables[0].metadata["confidence"], json!(0.95));
    assert!(!tables[0].metadata.contains_key("caption"));
}

#[test]
fn test_rtl_threshold() {
    // 5 of 20 letters are Hebrew
    let quarter = "אבגדהabcdefghijklmno";
    // 7 of 20
    let more = "אבגדהוזabcdefghijklm";

    assert!(rtl::contains_rtl(quarter));
    assert!(!rtl::is_rtl(quarter));
    assert!(rtl::is_rtl(more));
    assert_eq!(rtl::text_direction(more), rtl::Direction::Rtl);

    let strict = RtlProcessor::new().with_threshold(0.5);
    assert!(!strict.is_rtl(more));
    assert!(RtlProcessor::new().with_threshold(0.2).is_rtl(quarter));
}

#[test]
fn test_mixed_text_keeps_ltr_runs() {
    let processor = RtlProcessor::new();
    let mixed = "Version 2 of שלום";
    let processed = processor.process_mixed_text(mixed);
    assert!(processed.starts_with("Version 2 of "));
    assert_eq!(processed.chars().filter(|c| rtl::is_rtl_char(*c)).count(), 4);
}
