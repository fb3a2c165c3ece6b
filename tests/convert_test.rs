//! End-to-end conversion of generated PDFs.

mod common;

use std::fs;

use common::{encrypted_bytes, simple_document, PdfBuilder};
use pdfword::{
    build_flow_document, build_flow_document_from_bytes, convert, convert_batch, CancellationToken,
    ConvertOptions, DocumentNode, Error, PageSelection, TableDetectionMode,
};

#[test]
fn test_convert_writes_docx() {
    let dir = tempfile::tempdir().unwrap();
    let input = simple_document().write(dir.path(), "report.pdf");
    let output = dir.path().join("out").join("report.docx");

    let result = convert(&input, &output, &ConvertOptions::default()).unwrap();
    assert!(result.is_success());
    assert_eq!(result.output, output);

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"PK"));
    assert_eq!(result.stats.output_bytes, bytes.len() as u64);
    assert_eq!(result.stats.page_count, 1);
    assert_eq!(result.stats.paragraph_count, 3);
    assert_eq!(result.stats.heading_count, 1);
}

#[test]
fn test_flow_document_content() {
    let dir = tempfile::tempdir().unwrap();
    let input = simple_document().write(dir.path(), "report.pdf");
    let doc = build_flow_document(&input, &ConvertOptions::default()).unwrap();

    assert_eq!(doc.metadata.title.as_deref(), Some("Quarterly Report"));
    let texts: Vec<String> = doc.nodes.iter().map(DocumentNode::plain_text).collect();
    assert_eq!(
        texts,
        vec![
            "Quarterly Report",
            "Revenue grew in every region during the third quarter.",
            "Costs stayed flat.",
        ]
    );
    let DocumentNode::Paragraph(heading) = &doc.nodes[0] else {
        panic!("expected a heading paragraph");
    };
    assert_eq!(heading.style.heading_level, Some(1));
    assert!(heading.runs.iter().all(|r| r.style.bold));
}

#[test]
fn test_ruled_table_from_pdf() {
    let data = PdfBuilder::new()
        .page()
        .grid(72.0, 300.0, 272.0, 360.0, &[330.0], &[172.0])
        .text("F1", 10.0, 77.0, 320.0, "Item")
        .text("F1", 10.0, 177.0, 320.0, "Price")
        .text("F1", 10.0, 77.0, 350.0, "Tea")
        .text("F1", 10.0, 177.0, 350.0, "4.50")
        .to_bytes();

    let options = ConvertOptions::default().with_table_detection(TableDetectionMode::RulesOnly);
    let doc = build_flow_document_from_bytes(&data, &options).unwrap();
    assert_eq!(doc.table_count(), 1);
    let DocumentNode::Table(table) = &doc.nodes[0] else {
        panic!("expected a table");
    };
    assert!(table.ruled);
    assert_eq!(table.plain_text(), "Item\tPrice\nTea\t4.50");
}

#[test]
fn test_images_follow_option() {
    let data = PdfBuilder::new()
        .page()
        .text("F1", 12.0, 72.0, 100.0, "Caption above the picture")
        .image(72.0, 120.0, 100.0, 100.0)
        .to_bytes();

    let with = build_flow_document_from_bytes(&data, &ConvertOptions::default()).unwrap();
    assert_eq!(with.image_count(), 1);
    assert!(matches!(with.nodes.last(), Some(DocumentNode::Image(_))));

    let without =
        build_flow_document_from_bytes(&data, &ConvertOptions::default().with_images(false))
            .unwrap();
    assert_eq!(without.image_count(), 0);
    assert_eq!(without.paragraph_count(), 1);
}

#[test]
fn test_page_selection() {
    let data = PdfBuilder::new()
        .page()
        .text("F1", 12.0, 72.0, 100.0, "First page")
        .page()
        .text("F1", 12.0, 72.0, 100.0, "Second page")
        .page()
        .text("F1", 12.0, 72.0, 100.0, "Third page")
        .to_bytes();

    let options = ConvertOptions::default().with_pages(PageSelection::Pages(vec![2, 3]));
    let doc = build_flow_document_from_bytes(&data, &options).unwrap();
    assert_eq!(doc.plain_text(), "Second page\n\nThird page");
    assert_eq!(
        doc.origins.iter().map(|o| o.page).collect::<Vec<_>>(),
        vec![2, 3]
    );
}

#[test]
fn test_pipeline_is_idempotent() {
    let data = simple_document().to_bytes();
    let options = ConvertOptions::default();
    let first = build_flow_document_from_bytes(&data, &options).unwrap();
    let second = build_flow_document_from_bytes(&data, &options).unwrap();
    assert_eq!(first, second);

    let sequential = build_flow_document_from_bytes(&data, &options.clone().sequential()).unwrap();
    assert_eq!(first, sequential);
}

#[test]
fn test_encrypted_input_is_unreadable() {
    let result = build_flow_document_from_bytes(&encrypted_bytes(), &ConvertOptions::default());
    assert!(matches!(result, Err(Error::UnreadableDocument(_))));
}

#[test]
fn test_non_pdf_input_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.pdf");
    fs::write(&input, "<html><body>not a pdf</body></html>").unwrap();
    let output = dir.path().join("page.docx");

    let err = convert(&input, &output, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, Error::UnreadableDocument(_)));
    assert!(err.is_fatal());
    assert!(!output.exists());
}

#[test]
fn test_cancelled_job_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = simple_document().write(dir.path(), "report.pdf");
    let output = dir.path().join("report.docx");

    let token = CancellationToken::new();
    let options = ConvertOptions::default().with_cancellation(token.clone());
    token.cancel();

    let err = convert(&input, &output, &options).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(!output.exists());
}

#[test]
fn test_batch_continues_past_corrupt_input() {
    let dir = tempfile::tempdir().unwrap();
    let good_a = simple_document().write(dir.path(), "a.pdf");
    let corrupt = dir.path().join("broken.pdf");
    fs::write(&corrupt, b"\x00\x01 truncated download").unwrap();
    let good_b = PdfBuilder::new()
        .page()
        .text("F1", 12.0, 72.0, 100.0, "Another file")
        .write(dir.path(), "b.pdf");
    let out_dir = dir.path().join("out");

    let inputs = vec![good_a.clone(), corrupt.clone(), good_b.clone()];
    let options = ConvertOptions::default().with_workers(2);
    let results = convert_batch(&inputs, &out_dir, &options);

    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|r| r.input.clone()).collect::<Vec<_>>(),
        inputs
    );
    assert!(results[0].is_success());
    assert!(!results[1].is_success());
    assert!(results[2].is_success());
    assert!(out_dir.join("a.docx").exists());
    assert!(out_dir.join("b.docx").exists());
    assert!(!out_dir.join("broken.docx").exists());

    let summary = results[1].summary();
    assert!(!summary.success);
    assert!(summary.error.is_some());
}
