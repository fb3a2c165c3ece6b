//! Benchmarks for layout reconstruction.
//!
//! Run with: cargo bench
//!
//! Pages are synthetic: prose paragraphs, a ruled table and a gutter table.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pdfword::layout::{structure_pages, FlowBuilder};
use pdfword::model::{
    Color, ColorSpaceKind, FontRef, GlyphRun, Metadata, Page, PathSegment, PathStyle, Point,
    Primitive, Rect,
};
use pdfword::{CancellationToken, LayoutConfig, TableDetectionMode};

fn glyph(text: &str, x: f32, baseline: f32, size: f32) -> Primitive {
    let width = text.chars().count() as f32 * size * 0.5;
    Primitive::Glyph(GlyphRun {
        bbox: Rect::new(x, baseline - 0.8 * size, x + width, baseline + 0.2 * size),
        baseline,
        text: text.to_string(),
        font: FontRef {
            resource: "F1".to_string(),
            base_font: Some("Helvetica".to_string()),
            descriptor: None,
        },
        size,
        color: Color::BLACK,
        color_space: ColorSpaceKind::DeviceGray,
        rotation: 0.0,
    })
}

fn rule(x0: f32, y0: f32, x1: f32, y1: f32) -> Primitive {
    Primitive::Path(PathSegment {
        points: vec![Point::new(x0, y0), Point::new(x1, y1)],
        closed: false,
        style: PathStyle {
            stroke: Some(Color::BLACK),
            fill: None,
            line_width: 0.5,
        },
    })
}

/// A letter page with a heading, prose, a 4x3 ruled table and a gutter table.
fn create_test_page(number: u32) -> Page {
    let mut prims = vec![glyph(&format!("Section {}", number), 72.0, 72.0, 18.0)];

    let mut y = 110.0;
    for paragraph in 0..4 {
        for line in 0..5 {
            let text = format!(
                "Paragraph {} line {} carries enough words to look like prose.",
                paragraph, line
            );
            prims.push(glyph(&text, 72.0, y, 10.0));
            y += 12.0;
        }
        y += 10.0;
    }

    let (top, bottom) = (y + 10.0, y + 130.0);
    for row in 0..=4 {
        let ry = top + row as f32 * 30.0;
        prims.push(rule(72.0, ry, 472.0, ry));
    }
    for col in 0..=3 {
        let cx = 72.0 + col as f32 * (400.0 / 3.0);
        prims.push(rule(cx, top, cx, bottom));
    }
    for row in 0..4 {
        for col in 0..3 {
            let x = 77.0 + col as f32 * (400.0 / 3.0);
            prims.push(glyph(&format!("r{}c{}", row, col), x, top + 20.0 + row as f32 * 30.0, 10.0));
        }
    }

    let mut gy = bottom + 30.0;
    for row in 0..6 {
        prims.push(glyph(&format!("Item {}", row), 72.0, gy, 10.0));
        prims.push(glyph(&format!("{}.00", row * 3), 250.0, gy, 10.0));
        prims.push(glyph("ok", 400.0, gy, 10.0));
        gy += 14.0;
    }

    let mut page = Page::letter(number);
    page.primitives = prims;
    page
}

/// Benchmark page structuring and flow building at various sizes.
fn bench_layout(c: &mut Criterion) {
    let config = LayoutConfig::default();
    let mut group = c.benchmark_group("layout");

    for page_count in [1u32, 10, 50].iter() {
        let pages: Vec<Page> = (1..=*page_count).map(create_test_page).collect();

        group.bench_function(format!("{}_pages", page_count), |b| {
            b.iter(|| {
                let layouts = structure_pages(
                    black_box(&pages),
                    &config,
                    TableDetectionMode::Both,
                    true,
                    &CancellationToken::new(),
                )
                .unwrap();
                FlowBuilder::new(&config).build(Metadata::default(), layouts)
            });
        });
    }

    group.finish();
}

/// Benchmark the sequential path for comparison with the parallel one.
fn bench_layout_sequential(c: &mut Criterion) {
    let config = LayoutConfig::default();
    let pages: Vec<Page> = (1..=10).map(create_test_page).collect();

    c.bench_function("layout_sequential_10_pages", |b| {
        b.iter(|| {
            structure_pages(
                black_box(&pages),
                &config,
                TableDetectionMode::Both,
                false,
                &CancellationToken::new(),
            )
            .unwrap()
        });
    });
}

/// Benchmark DOCX serialization of an already built flow document.
fn bench_docx_writer(c: &mut Criterion) {
    let config = LayoutConfig::default();
    let pages: Vec<Page> = (1..=10).map(create_test_page).collect();
    let layouts = structure_pages(
        &pages,
        &config,
        TableDetectionMode::Both,
        true,
        &CancellationToken::new(),
    )
    .unwrap();
    let doc = FlowBuilder::new(&config).build(Metadata::default(), layouts);
    let options = pdfword::ConvertOptions::default();

    c.bench_function("docx_writer_10_pages", |b| {
        b.iter(|| pdfword::write_document(black_box(&doc), &options).unwrap());
    });
}

criterion_group!(
    benches,
    bench_layout,
    bench_layout_sequential,
    bench_docx_writer,
);
criterion_main!(benches);
