//! Benchmarks for doclayer conversion performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks convert synthetic documents of increasing size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use doclayer::model::{
    RawLine, Sentence, SourceDocument, SourcePage, TableItem, TextItem,
};
use doclayer::{ForwardConverter, ReverseConverter};

/// Creates a source document with typed items on every page.
fn create_source(page_count: usize) -> SourceDocument {
    let mut source = SourceDocument::new("bench");
    for p in 0..page_count {
        let page_number = p as u32 + 1;
        let mut page = SourcePage::letter();
        for i in 0..20 {
            let y = 72.0 + i as f64 * 30.0;
            let text = format!(
                "Paragraph {} on page {} cites prior work [{}]. It has a second sentence.",
                i, page_number, i + 1
            );
            let first_len = text.find(']').map(|i| i + 2).unwrap_or(0);
            let item = TextItem::paragraph(text.as_str(), [72.0, y, 540.0, y + 24.0], page_number)
                .with_sentence(Sentence::new(&text[..first_len], 0).with_words_from_text());
            page.add_item(item);
        }
        page.add_item(TableItem::new(page_number.to_string(), [72.0, 700.0, 540.0, 760.0], page_number));
        source.add_page(page);
    }
    source
}

/// Creates a source document whose pages carry raw lines only.
fn create_raw_source(page_count: usize) -> SourceDocument {
    let mut source = SourceDocument::new("raw");
    for _ in 0..page_count {
        let mut page = SourcePage::letter();
        page.lines.push(RawLine::new("Benchmark Title", [72.0, 40.0, 162.0, 52.0]));
        for i in 0..30 {
            let y = 80.0 + i as f64 * 15.0;
            let text = if i % 10 < 4 {
                format!("Item {}  {}  {}", i, i * 3, i * 7)
            } else {
                format!("Line {} of running prose text.", i)
            };
            let width = text.chars().count() as f64 * 6.0;
            page.lines.push(RawLine::new(text, [72.0, y, 72.0 + width, y + 10.0]));
        }
        source.add_page(page);
    }
    source
}

/// Benchmark forward conversion at various sizes.
fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward");
    let converter = ForwardConverter::default();

    for page_count in [1, 10, 50].iter() {
        let source = create_source(*page_count);
        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| converter.convert(black_box(&source)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark forward conversion with structural inference.
fn bench_inference(c: &mut Criterion) {
    let source = create_raw_source(10);
    let converter = ForwardConverter::default();

    c.bench_function("forward_inferred_10_pages", |b| {
        b.iter(|| converter.convert(black_box(&source)).unwrap());
    });
}

/// Benchmark reverse conversion.
fn bench_reverse(c: &mut Criterion) {
    let doc = ForwardConverter::default().convert(&create_source(10)).unwrap();
    let converter = ReverseConverter::default();

    c.bench_function("reverse_10_pages", |b| {
        b.iter(|| converter.convert(black_box(&doc)).unwrap());
    });
}

criterion_group!(benches, bench_forward, bench_inference, bench_reverse);
criterion_main!(benches);
