//! Re-read produced DOCX packages and compare with the flow document.

mod common;

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use common::PdfBuilder;
use pdfword::{build_flow_document_from_bytes, convert_bytes, ConvertOptions, DocumentNode};

/// A run as read back from `word/document.xml`.
#[derive(Debug, Default, Clone, PartialEq)]
struct RunProps {
    text: String,
    bold: bool,
    italic: bool,
    half_points: Option<u32>,
    font: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Default)]
struct Package {
    /// Runs grouped by paragraph, paragraphs without text dropped
    paragraphs: Vec<Vec<RunProps>>,
    tables: usize,
    grid_spans: Vec<u32>,
    page_breaks: usize,
}

fn document_xml(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    xml
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[derive(Default)]
struct State {
    package: Package,
    paragraph: Vec<RunProps>,
    run: Option<RunProps>,
    in_text: bool,
}

impl State {
    fn open(&mut self, e: &BytesStart<'_>, has_body: bool) {
        match e.name().as_ref() {
            b"w:p" => self.paragraph.clear(),
            b"w:r" => self.run = Some(RunProps::default()),
            b"w:t" => self.in_text = has_body,
            b"w:tbl" => self.package.tables += 1,
            b"w:gridSpan" => {
                if let Some(v) = attr(e, b"w:val").and_then(|v| v.parse().ok()) {
                    self.package.grid_spans.push(v);
                }
            }
            b"w:br" => {
                if attr(e, b"w:type").as_deref() == Some("page") {
                    self.package.page_breaks += 1;
                }
            }
            name => {
                let Some(r) = self.run.as_mut() else {
                    return;
                };
                match name {
                    b"w:b" => r.bold = true,
                    b"w:i" => r.italic = true,
                    b"w:sz" => r.half_points = attr(e, b"w:val").and_then(|v| v.parse().ok()),
                    b"w:rFonts" => r.font = attr(e, b"w:ascii"),
                    b"w:color" => r.color = attr(e, b"w:val"),
                    _ => {}
                }
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => {
                if let Some(r) = self.run.take().filter(|r| !r.text.is_empty()) {
                    self.paragraph.push(r);
                }
            }
            b"w:p" => {
                if !self.paragraph.is_empty() {
                    let paragraph = std::mem::take(&mut self.paragraph);
                    self.package.paragraphs.push(paragraph);
                }
            }
            _ => {}
        }
    }
}

fn read_package(docx: &[u8]) -> Package {
    let xml = document_xml(docx);
    let mut reader = Reader::from_str(&xml);
    let mut state = State::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => state.open(&e, true),
            Ok(Event::Empty(e)) => state.open(&e, false),
            Ok(Event::Text(t)) => {
                if state.in_text {
                    if let (Some(r), Ok(text)) = (state.run.as_mut(), t.unescape()) {
                        r.text.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => state.close(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => panic!("invalid document.xml: {}", e),
            _ => {}
        }
    }
    state.package
}

fn paragraph_text(runs: &[RunProps]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

#[test]
fn test_single_style_paragraph_round_trips() {
    let data = PdfBuilder::new()
        .page()
        .text("F2", 14.0, 72.0, 100.0, "Round trip text stays intact")
        .to_bytes();
    let options = ConvertOptions::default();

    let doc = build_flow_document_from_bytes(&data, &options).unwrap();
    let DocumentNode::Paragraph(source) = &doc.nodes[0] else {
        panic!("expected a paragraph");
    };
    let style = &source.runs[0].style;

    let (docx, report) = convert_bytes(&data, &options).unwrap();
    let package = read_package(&docx);

    assert_eq!(package.paragraphs.len(), 1);
    let runs = &package.paragraphs[0];
    assert_eq!(paragraph_text(runs), source.plain_text());
    for run in runs {
        assert_eq!(run.bold, style.bold);
        assert_eq!(run.italic, style.italic);
        assert_eq!(run.half_points, Some(u32::from(style.size_half_points)));
        assert_eq!(run.font.as_deref(), Some(style.font_family.as_str()));
        assert_eq!(run.color, Some(style.color.to_hex()));
    }
    assert!(style.bold);
    assert_eq!(style.size_half_points, 28);
    assert_eq!(style.font_family, "Arial");
    // Helvetica is replaced by an installed family.
    assert!(!report.is_empty());
}

#[test]
fn test_merged_cell_becomes_grid_span() {
    let data = PdfBuilder::new()
        .page()
        .line(72.0, 300.0, 272.0, 300.0)
        .line(72.0, 360.0, 272.0, 360.0)
        .line(72.0, 300.0, 72.0, 360.0)
        .line(272.0, 300.0, 272.0, 360.0)
        .line(172.0, 330.0, 172.0, 360.0)
        .text("F1", 10.0, 82.0, 320.0, "Spanning header")
        .text("F1", 10.0, 77.0, 350.0, "Left")
        .text("F1", 10.0, 177.0, 350.0, "Right")
        .to_bytes();

    let (docx, _) = convert_bytes(&data, &ConvertOptions::default()).unwrap();
    let package = read_package(&docx);
    assert_eq!(package.tables, 1);
    assert_eq!(package.grid_spans, vec![2]);
    let texts: Vec<String> = package.paragraphs.iter().map(|p| paragraph_text(p)).collect();
    assert_eq!(texts, vec!["Spanning header", "Left", "Right"]);
}

#[test]
fn test_pages_are_separated_by_breaks() {
    let data = PdfBuilder::new()
        .page()
        .text("F1", 12.0, 72.0, 100.0, "Page one")
        .page()
        .text("F1", 12.0, 72.0, 100.0, "Page two")
        .to_bytes();

    let (docx, _) = convert_bytes(&data, &ConvertOptions::default()).unwrap();
    let package = read_package(&docx);
    assert_eq!(package.page_breaks, 1);
    let texts: Vec<String> = package.paragraphs.iter().map(|p| paragraph_text(p)).collect();
    assert_eq!(texts, vec!["Page one", "Page two"]);

    let (docx, _) =
        convert_bytes(&data, &ConvertOptions::default().with_page_breaks(false)).unwrap();
    assert_eq!(read_package(&docx).page_breaks, 0);
}
